use anyhow::{Context, Result, bail};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::solver::GeneratorOptions;

pub const BIND_ADDR_VAR: &str = "TIMETABLE_BIND_ADDR";
pub const DATA_DIR_VAR: &str = "TIMETABLE_DATA_DIR";
pub const ENFORCE_MAX_HOURS_VAR: &str = "TIMETABLE_ENFORCE_MAX_HOURS";

/// Service settings, read from `TIMETABLE_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: Option<SocketAddr>,
    pub data_dir: Option<PathBuf>,
    pub enforce_max_hours: Option<bool>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config = AppConfig::default();
        for (key, value) in vars {
            let value = value.trim();
            match key.as_str() {
                BIND_ADDR_VAR => {
                    config.bind_addr = Some(
                        value
                            .parse::<SocketAddr>()
                            .with_context(|| format!("{BIND_ADDR_VAR} is not a socket address: {value}"))?,
                    );
                }
                DATA_DIR_VAR => config.data_dir = Some(PathBuf::from(value)),
                ENFORCE_MAX_HOURS_VAR => config.enforce_max_hours = Some(parse_flag(value)?),
                _ => {}
            }
        }
        Ok(config)
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8080)))
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| PathBuf::from("data"))
    }

    pub fn generator_options(&self) -> GeneratorOptions {
        GeneratorOptions {
            enforce_max_hours: self.enforce_max_hours.unwrap_or(false),
        }
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("{ENFORCE_MAX_HOURS_VAR} must be true or false, got {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = AppConfig::from_vars(vars(&[("HOME", "/root")])).unwrap();
        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.data_dir(), PathBuf::from("data"));
        assert!(!config.generator_options().enforce_max_hours);
    }

    #[test]
    fn reads_timetable_variables() {
        let config = AppConfig::from_vars(vars(&[
            (BIND_ADDR_VAR, "0.0.0.0:9000"),
            (DATA_DIR_VAR, "/var/lib/timetable"),
            (ENFORCE_MAX_HOURS_VAR, "Yes"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr().port(), 9000);
        assert_eq!(config.data_dir(), PathBuf::from("/var/lib/timetable"));
        assert!(config.generator_options().enforce_max_hours);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(AppConfig::from_vars(vars(&[(BIND_ADDR_VAR, "localhost")])).is_err());
        assert!(AppConfig::from_vars(vars(&[(ENFORCE_MAX_HOURS_VAR, "maybe")])).is_err());
    }
}
