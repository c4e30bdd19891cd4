use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub workload: WorkloadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub database: String,
    /// Full connection URL; overrides the discrete MySQL settings when present.
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    MySql,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadConfig {
    pub workers: usize,
    pub inserts: usize,
    pub startup_delay_ms: u64,
    pub hot_temperature_threshold: f64,
    pub humidity_step: f64,
    pub humidity_cap: f64,
    pub humid_locations: Vec<String>,
    pub summary_format: SummaryFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryFormat {
    Text,
    Json,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            inserts: 15,
            startup_delay_ms: 1000,
            hot_temperature_threshold: 20.0,
            humidity_step: 5.0,
            humidity_cap: 100.0,
            humid_locations: vec!["Ottawa".to_string(), "Toronto".to_string()],
            summary_format: SummaryFormat::Text,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::from_lookup(|key| env::var(key).ok()))
    }

    /// Builds the configuration from an arbitrary key lookup. Unparseable
    /// values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = WorkloadConfig::default();

        Self {
            database: DatabaseConfig {
                host: lookup("MYSQL_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
                port: lookup("MYSQL_PORT")
                    .unwrap_or_else(|| "3307".to_string())
                    .parse()
                    .unwrap_or(3307),
                user: lookup("MYSQL_USER").unwrap_or_else(|| "root".to_string()),
                password: lookup("MYSQL_PASSWORD").unwrap_or_else(|| "Secret5555".to_string()),
                database: lookup("MYSQL_DB").unwrap_or_else(|| "project_db".to_string()),
                url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            },
            workload: WorkloadConfig {
                workers: lookup("WORKLOAD_WORKERS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.workers),
                inserts: lookup("WORKLOAD_INSERTS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.inserts),
                startup_delay_ms: lookup("WORKLOAD_STARTUP_DELAY_MS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.startup_delay_ms),
                summary_format: match lookup("WORKLOAD_SUMMARY_FORMAT").as_deref() {
                    Some(v) if v.eq_ignore_ascii_case("json") => SummaryFormat::Json,
                    _ => SummaryFormat::Text,
                },
                ..defaults
            },
        }
    }
}

impl DatabaseConfig {
    pub fn backend(&self) -> Backend {
        match &self.url {
            Some(url) if url.starts_with("sqlite:") => Backend::Sqlite,
            _ => Backend::MySql,
        }
    }

    /// Connection target with the password left out, safe to log.
    pub fn display_target(&self) -> String {
        match &self.url {
            Some(url) if self.backend() == Backend::Sqlite => url.clone(),
            Some(_) => "DATABASE_URL".to_string(),
            None => format!("mysql://{}@{}:{}/{}", self.user, self.host, self.port, self.database),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);

        assert_eq!(config.database.host, "127.0.0.1");
        assert_eq!(config.database.port, 3307);
        assert_eq!(config.database.user, "root");
        assert_eq!(config.database.password, "Secret5555");
        assert_eq!(config.database.database, "project_db");
        assert_eq!(config.database.backend(), Backend::MySql);

        assert_eq!(config.workload.workers, 8);
        assert_eq!(config.workload.inserts, 15);
        assert_eq!(config.workload.startup_delay_ms, 1000);
        assert_eq!(config.workload.humid_locations, vec!["Ottawa", "Toronto"]);
        assert_eq!(config.workload.summary_format, SummaryFormat::Text);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("MYSQL_HOST", "db.internal"),
            ("MYSQL_PORT", "3306"),
            ("WORKLOAD_WORKERS", "2"),
            ("WORKLOAD_INSERTS", "40"),
            ("WORKLOAD_STARTUP_DELAY_MS", "0"),
            ("WORKLOAD_SUMMARY_FORMAT", "JSON"),
        ]);

        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 3306);
        assert_eq!(config.workload.workers, 2);
        assert_eq!(config.workload.inserts, 40);
        assert_eq!(config.workload.startup_delay_ms, 0);
        assert_eq!(config.workload.summary_format, SummaryFormat::Json);
    }

    #[test]
    fn test_unparseable_values_fall_back() {
        let config = config_from(&[("MYSQL_PORT", "not-a-port"), ("WORKLOAD_WORKERS", "-3")]);

        assert_eq!(config.database.port, 3307);
        assert_eq!(config.workload.workers, 8);
    }

    #[test]
    fn test_database_url_selects_backend() {
        let config = config_from(&[("DATABASE_URL", "sqlite:/tmp/climate.db")]);
        assert_eq!(config.database.backend(), Backend::Sqlite);
        assert_eq!(config.database.display_target(), "sqlite:/tmp/climate.db");

        let config = config_from(&[("DATABASE_URL", "mysql://u:secret@h/db")]);
        assert_eq!(config.database.backend(), Backend::MySql);
        assert!(!config.database.display_target().contains("secret"));
    }
}
