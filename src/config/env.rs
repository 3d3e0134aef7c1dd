use super::HiveConfig;

pub const USER_ID: &str = "HIVEWATCH_USER_ID";
pub const HIVE_ID: &str = "HIVEWATCH_HIVE_ID";
pub const REMOTE_URL: &str = "HIVEWATCH_REMOTE_URL";
pub const REMOTE_TOKEN: &str = "HIVEWATCH_REMOTE_TOKEN";

/// Overlay environment values. Empty values are ignored.
pub(super) fn apply(config: &mut HiveConfig, lookup: impl Fn(&str) -> Option<String>) {
    let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = var(USER_ID) {
        config.hive.user_id = v;
    }
    if let Some(v) = var(HIVE_ID) {
        config.hive.hive_id = v;
    }
    if let Some(v) = var(REMOTE_URL) {
        config.remote.base_url = Some(v);
    }
    if let Some(v) = var(REMOTE_TOKEN) {
        config.remote.api_token = Some(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = HiveConfig::default();
        config.hive.user_id = "from-file".to_string();

        let vars: HashMap<&str, &str> = [
            (USER_ID, "from-env"),
            (HIVE_ID, "hive-9"),
            (REMOTE_URL, "http://localhost:8080"),
        ]
        .into_iter()
        .collect();

        apply(&mut config, |key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.hive.user_id, "from-env");
        assert_eq!(config.hive.hive_id, "hive-9");
        assert_eq!(config.remote.base_url.as_deref(), Some("http://localhost:8080"));
        assert!(config.remote.api_token.is_none());
    }

    #[test]
    fn test_empty_env_value_ignored() {
        let mut config = HiveConfig::default();
        config.hive.hive_id = "keep".to_string();

        apply(&mut config, |key| (key == HIVE_ID).then(|| "  ".to_string()));

        assert_eq!(config.hive.hive_id, "keep");
    }
}
