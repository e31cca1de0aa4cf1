use serde::Deserialize;

pub const DEFAULT_STORE_PATH: &str = "/data/db.sqlite3";
pub const DEFAULT_FALLBACK_PATH: &str = "/data/groups.json";

/// Environment variable that switches the endpoint on or off. It is read
/// once at startup and overrides `enabled` from the config file.
pub const ENABLE_ENV_VAR: &str = "ENABLE_GROUPS_API";

#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type")]
pub enum FallbackStoreType {
    Filesystem { path: String },
    None,
}

impl Default for FallbackStoreType {
    fn default() -> Self {
        FallbackStoreType::Filesystem {
            path: DEFAULT_FALLBACK_PATH.into(),
        }
    }
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct Store {
    pub path: String,
}

impl Default for Store {
    fn default() -> Self {
        Store {
            path: DEFAULT_STORE_PATH.into(),
        }
    }
}

#[derive(Clone, Deserialize, Debug, Default, PartialEq)]
pub struct Auth {
    #[serde(default)]
    pub bearer_tokens: Vec<String>,
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct Listener {
    pub host: String,
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 3000,
        }
    }
}

#[derive(Deserialize, Debug, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub listener: Listener,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub store: Store,
    #[serde(default)]
    pub fallback: FallbackStoreType,
    #[serde(default)]
    pub auth: Auth,
}

impl Config {
    /// Applies the value of `ENABLE_GROUPS_API`, if it was set.
    pub fn with_enabled_override(mut self, env_value: Option<&str>) -> Self {
        if let Some(value) = env_value {
            self.enabled = flag_enabled(value);
        }
        self
    }
}

/// `1`, `true` and `yes` enable, case-insensitively; anything else disables.
pub fn flag_enabled(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.listener, Listener::default());
        assert!(!config.enabled);
        assert_eq!(config.store.path, "/data/db.sqlite3");
        assert_eq!(
            config.fallback,
            FallbackStoreType::Filesystem {
                path: "/data/groups.json".into()
            }
        );
        assert!(config.auth.bearer_tokens.is_empty());
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
            listener:
                host: 0.0.0.0
                port: 8080
            enabled: true
            store:
                path: /srv/webui.db
            fallback:
                type: none
            auth:
                bearer_tokens: [abc, def]
            "#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.listener.port, 8080);
        assert!(config.enabled);
        assert_eq!(config.store.path, "/srv/webui.db");
        assert_eq!(config.fallback, FallbackStoreType::None);
        assert_eq!(config.auth.bearer_tokens, vec!["abc", "def"]);
    }

    #[test]
    fn test_flag_enabled() {
        for value in ["1", "true", "TRUE", "Yes", " yes "] {
            assert!(flag_enabled(value), "{value}");
        }
        for value in ["0", "false", "no", "on", "", "enabled"] {
            assert!(!flag_enabled(value), "{value}");
        }
    }

    #[test]
    fn test_enabled_override() {
        let config = Config {
            enabled: true,
            ..Default::default()
        };
        let config = config.with_enabled_override(Some("false"));
        assert!(!config.enabled);

        let config = config.with_enabled_override(None);
        assert!(!config.enabled);

        let config = config.with_enabled_override(Some("1"));
        assert!(config.enabled);
    }
}
