use groups::config::Config as GroupsConfig;
use serde::Deserialize;
use std::fs::File;

#[derive(Deserialize, Debug)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
}

fn default_level() -> String {
    "info".into()
}

#[derive(Deserialize, Debug)]
pub struct LoggingConfig {
    pub sentry_dsn: Option<String>,
    #[serde(default = "default_level")]
    pub level: String,
}

#[derive(Deserialize, Debug)]
pub struct CommonConfig {
    pub metrics: Option<MetricsConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(flatten)]
    pub common: CommonConfig,
    #[serde(default)]
    pub groups: GroupsConfig,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use groups::config::FallbackStoreType;
    use std::io::Write;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    #[test]
    fn groups_config() {
        let yaml = r#"
            logging:
                sentry_dsn: https://public@sentry.example.com/1
            metrics:
                statsd_host: 127.0.0.1
                statsd_port: 8125
            groups:
                listener:
                    host: 0.0.0.0
                    port: 8080
                enabled: true
                store:
                    path: /var/lib/webui/db.sqlite3
                fallback:
                    type: filesystem
                    path: /var/lib/webui/groups.json
                auth:
                    bearer_tokens: [secret]
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        let logging = config.common.logging.expect("logging config");
        assert_eq!(logging.level, "info");
        assert_eq!(config.common.metrics.expect("metrics").statsd_port, 8125);

        assert!(config.groups.enabled);
        assert_eq!(config.groups.listener.port, 8080);
        assert_eq!(config.groups.store.path, "/var/lib/webui/db.sqlite3");
        assert_eq!(
            config.groups.fallback,
            FallbackStoreType::Filesystem {
                path: "/var/lib/webui/groups.json".into()
            }
        );
    }

    #[test]
    fn minimal_config() {
        let tmp = write_tmp_file("groups:\n  enabled: false\n");
        let config = Config::from_file(tmp.path()).expect("load config");
        assert!(config.common.logging.is_none());
        assert!(config.common.metrics.is_none());
        assert_eq!(config.groups.store.path, groups::config::DEFAULT_STORE_PATH);
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_file(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)));
    }
}
