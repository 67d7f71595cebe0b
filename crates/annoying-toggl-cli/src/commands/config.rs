use annoying_toggl_core::storage::{CHECK_INTERVAL_OPTIONS, MUTE_DURATION_OPTIONS};
use annoying_toggl_core::Config;
use clap::Subcommand;

use super::CliResult;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "check_interval_minutes", "api.timeout_secs")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults (the stored token is kept)
    Reset,
}

pub fn run(action: ConfigAction) -> CliResult {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            if key == "api_token" {
                println!("{}", config.masked_token());
                return Ok(());
            }
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            if let Some(hint) = unusual_choice(&key, &config) {
                eprintln!("{hint}");
            }
            println!("ok");
        }
        ConfigAction::List => {
            let mut config = Config::load()?;
            config.api_token = config.masked_token();
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        ConfigAction::Reset => {
            let previous = Config::load()?;
            let config = Config {
                api_token: previous.api_token,
                ..Config::default()
            };
            config.save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}

/// Values outside the usual menu still work; just point it out.
fn unusual_choice(key: &str, config: &Config) -> Option<String> {
    let (value, options): (u32, &[u32]) = match key {
        "check_interval_minutes" => (config.check_interval_minutes, &CHECK_INTERVAL_OPTIONS),
        "mute_duration_minutes" => (config.mute_duration_minutes, &MUTE_DURATION_OPTIONS),
        _ => return None,
    };
    (!options.contains(&value)).then(|| format!("note: usual choices are {options:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_values_outside_the_menu() {
        let mut config = Config::default();
        assert!(unusual_choice("check_interval_minutes", &config).is_none());
        config.check_interval_minutes = 7;
        assert!(unusual_choice("check_interval_minutes", &config).is_some());
        assert!(unusual_choice("api.timeout_secs", &config).is_none());
    }
}
