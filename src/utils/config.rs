use crate::models::Config;
use anyhow::Result;
use std::path::PathBuf;

pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    let timebill_dir = config_dir.join(".timebill");
    std::fs::create_dir_all(&timebill_dir)?;

    Ok(timebill_dir)
}

pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let config_path = get_config_path()?;

    if config_path.exists() {
        let contents = std::fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&contents).map_err(|e| {
            anyhow::anyhow!(
                "Failed to parse config file: {}. Please check the file format.",
                e
            )
        })?;

        config.validate()?;
        Ok(config)
    } else {
        let default_config = Config::default();
        save_config(&default_config)?;
        Ok(default_config)
    }
}

pub fn save_config(config: &Config) -> Result<()> {
    config.validate()?;

    let config_path = get_config_path()?;
    let contents = toml::to_string_pretty(config)?;

    std::fs::write(&config_path, contents)?;

    Ok(())
}
