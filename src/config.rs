use crate::log_buffer::DEFAULT_LOG_DIR;
use anyhow::{anyhow, Result};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

const CONFIG_PATH_REL_HOME: &str = ".config/cmdbot/config.toml";

/// Bot configuration
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Config {
    pub general: General,
    #[serde(default)]
    pub embeds: Embeds,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct General {
    pub discord_token: Option<String>,
    pub command_prefix: String,
    /// Number of buffered log entries which triggers a flush to disk
    pub log_limit: Option<NonZeroUsize>,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// Module manifest narrowing which built-in commands and events are loaded.  Relative paths
    /// are resolved against the configuration directory.
    pub manifest: Option<PathBuf>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Embeds {
    pub color: u32,
    pub error_color: u32,
}

impl Default for Embeds {
    fn default() -> Self {
        Self {
            color: 0x3264FF,
            error_color: 0xFF3232,
        }
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_DIR)
}

impl Config {
    fn config_path() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|p| p.join(CONFIG_PATH_REL_HOME))
            .ok_or(anyhow!("Could not find home directory"))
    }

    pub async fn load() -> Result<Self> {
        let path = Self::config_path()?;

        let mut file = tokio::fs::File::open(&path).await.map_err(|e| {
            anyhow!(
                "Could not open configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents).await.map_err(|e| {
            anyhow!(
                "Could not read configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        let mut config = Self::parse(&contents).map_err(|e| {
            anyhow!(
                "Could not parse configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        if let (Some(manifest), Some(dir)) = (&config.general.manifest, path.parent()) {
            config.general.manifest = Some(dir.join(manifest));
        }

        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(Into::into)
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests(prefix: &str) -> Self {
        Self {
            general: General {
                discord_token: None,
                command_prefix: prefix.to_owned(),
                log_limit: None,
                log_dir: default_log_dir(),
                manifest: None,
            },
            embeds: Embeds::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_fills_defaults() {
        let config = Config::parse(
            r#"
            [general]
            command_prefix = "!"
            "#,
        )
        .unwrap();

        assert_eq!(config.general.command_prefix, "!");
        assert!(config.general.discord_token.is_none());
        assert!(config.general.log_limit.is_none());
        assert_eq!(config.general.log_dir, PathBuf::from("log"));
        assert_eq!(config.embeds.error_color, 0xFF3232);
    }

    #[test]
    fn full_config_parses() {
        let config = Config::parse(
            r#"
            [general]
            discord_token = "secret"
            command_prefix = ";"
            log_limit = 200
            log_dir = "/var/log/cmdbot"
            manifest = "modules.toml"

            [embeds]
            color = 1
            error_color = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.general.discord_token.as_deref(), Some("secret"));
        assert_eq!(config.general.log_limit.map(NonZeroUsize::get), Some(200));
        assert_eq!(config.general.manifest, Some(PathBuf::from("modules.toml")));
        assert_eq!(config.embeds.color, 1);
    }

    #[test]
    fn zero_log_limit_is_rejected() {
        let parsed = Config::parse("[general]\ncommand_prefix = \"!\"\nlog_limit = 0\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn missing_prefix_is_rejected() {
        assert!(Config::parse("[general]\n").is_err());
    }
}
