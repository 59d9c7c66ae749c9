use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("MOVIERATE_").split("_"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    validate(&config)?;
    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    let config: Config =
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.tmdb.api_key.is_empty() {
        return Err(ConfigError::ValidationError(
            "tmdb.api_key must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[tmdb]
api_key = "k123"
region = "FR"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.tmdb.api_key, "k123");
        assert_eq!(config.tmdb.region.as_deref(), Some("FR"));
        assert_eq!(config.storage.path.to_str(), Some("movierate.json"));
    }

    #[test]
    fn test_load_config_from_str_missing_tmdb() {
        let toml = r#"
[storage]
path = "data.json"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_empty_api_key_rejected() {
        let toml = r#"
[tmdb]
api_key = ""
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[tmdb]
api_key = "k123"
language = "en-US"

[storage]
path = "/tmp/movierate.json"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.tmdb.api_key, "k123");
        assert_eq!(config.storage.path.to_str(), Some("/tmp/movierate.json"));
    }

    #[test]
    fn test_env_override_wins() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[tmdb]
api_key = "k123"
language = "en-US"
"#
        )
        .unwrap();

        std::env::set_var("MOVIERATE_TMDB_LANGUAGE", "fr-FR");
        let config = load_config(temp_file.path()).unwrap();
        std::env::remove_var("MOVIERATE_TMDB_LANGUAGE");

        assert_eq!(config.tmdb.language.as_deref(), Some("fr-FR"));
        assert_eq!(config.tmdb.api_key, "k123");
    }

    #[test]
    fn test_sanitized_redacts_api_key() {
        let config = load_config_from_str(
            r#"
[tmdb]
api_key = "secret"
"#,
        )
        .unwrap();
        let json = serde_json::to_string(&config.sanitized()).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("***"));
    }
}
