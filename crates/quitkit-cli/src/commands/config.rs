use clap::Subcommand;
use quitkit_core::AppConfig;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the full configuration
    Show,
    /// Get a value by dot-separated key (e.g. stroop.trials)
    Get { key: String },
    /// Set a value by dot-separated key and persist
    Set { key: String, value: String },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            let config = AppConfig::load_or_default();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Get { key } => {
            let config = AppConfig::load_or_default();
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown config key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = AppConfig::load_or_default();
            config.set(&key, &value)?;
            println!("{key} = {}", config.get(&key).unwrap_or_default());
        }
    }
    Ok(())
}
