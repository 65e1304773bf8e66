//! Preference command implementations.

use crate::cli::PrefsCommands;
use crate::config::{preferences_path, Preferences};
use crate::error::{Error, Result};

/// Execute prefs commands.
pub fn execute(command: &PrefsCommands, json: bool) -> Result<()> {
    let path = preferences_path()
        .ok_or_else(|| Error::Config("Could not determine the cavemon directory".to_string()))?;
    let mut prefs = Preferences::load(&path)?;

    match command {
        PrefsCommands::Get { key } => {
            let value = prefs.get(key).cloned().unwrap_or(serde_json::Value::Null);
            if json {
                println!("{}", serde_json::json!({ "key": key, "value": value }));
            } else if let serde_json::Value::String(s) = value {
                println!("{s}");
            } else {
                println!("{value}");
            }
        }
        PrefsCommands::Set { key, value } => {
            prefs.set(key, value);
            prefs.save(&path)?;
            if json {
                println!("{}", serde_json::json!({ "key": key, "value": prefs.get(key) }));
            }
        }
        PrefsCommands::Unset { key } => {
            let removed = prefs.unset(key);
            if removed {
                prefs.save(&path)?;
            }
            if json {
                println!("{}", serde_json::json!({ "key": key, "removed": removed }));
            }
        }
        PrefsCommands::List => {
            if json {
                let map: serde_json::Map<String, serde_json::Value> =
                    prefs.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                println!("{}", serde_json::Value::Object(map));
            } else {
                for (key, value) in prefs.iter() {
                    println!("{key} = {value}");
                }
            }
        }
    }

    Ok(())
}
