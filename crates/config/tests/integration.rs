//! Integration tests for config

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;
    use vendr_config::*;
    use vendr_types::{ColorChoice, OutputFormat};

    // Mutex to ensure env var tests don't run concurrently
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 6] = [
        "VENDR_OUTPUT",
        "VENDR_COLOR",
        "VENDR_HOME",
        "VENDR_WORKERS",
        "VENDR_USE_CACHE",
        "VENDR_SOURCE_PATH",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[general]
default_output = "plain"
color = "never"

[install]
workers = 4
operation_timeout = 120
delete_unused = true

[cache]
home = "/srv/vendr"
use_cache = false
        "#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.general.default_output, OutputFormat::Plain);
        assert_eq!(config.general.color, ColorChoice::Never);
        assert_eq!(config.install.workers, 4);
        assert_eq!(config.install.operation_timeout, 120);
        assert!(config.install.delete_unused);
        assert!(!config.install.force);
        assert!(!config.cache.use_cache);
        assert_eq!(config.home(), PathBuf::from("/srv/vendr"));
    }

    #[tokio::test]
    async fn test_partial_file_keeps_defaults() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[install]\nforce = true").unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert!(config.install.force);
        assert_eq!(config.install.workers, 20);
        assert!(config.cache.use_cache);
    }

    #[tokio::test]
    async fn test_invalid_toml_is_a_parse_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[install\nworkers = ").unwrap();

        let err = Config::load_from_file(temp_file.path()).await.unwrap_err();
        assert!(matches!(
            err,
            vendr_errors::Error::Config(vendr_errors::ConfigError::ParseError { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let err = Config::load_from_file(std::path::Path::new("/nonexistent/vendr.toml"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            vendr_errors::Error::Config(vendr_errors::ConfigError::NotFound { .. })
        ));
    }

    #[test]
    fn test_merge_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("VENDR_OUTPUT", "json");
        std::env::set_var("VENDR_COLOR", "always");
        std::env::set_var("VENDR_WORKERS", "7");
        std::env::set_var("VENDR_USE_CACHE", "no");
        std::env::set_var("VENDR_HOME", "/opt/vendr-home");

        let mut config = Config::default();
        config.merge_env().unwrap();

        assert_eq!(config.general.default_output, OutputFormat::Json);
        assert_eq!(config.general.color, ColorChoice::Always);
        assert_eq!(config.install.workers, 7);
        assert!(!config.cache.use_cache);
        assert_eq!(
            config.cache_dir(),
            PathBuf::from("/opt/vendr-home/cache/src")
        );

        clear_env();
    }

    #[test]
    fn test_merge_env_rejects_bad_values() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("VENDR_WORKERS", "0");
        let mut config = Config::default();
        assert!(config.merge_env().is_err());

        clear_env();
        std::env::set_var("VENDR_WORKERS", "many");
        assert!(config.merge_env().is_err());

        clear_env();
        std::env::set_var("VENDR_OUTPUT", "yaml");
        assert!(config.merge_env().is_err());

        clear_env();
    }

    #[test]
    fn test_source_path_prefers_config() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        let mut config = Config::default();
        config.cache.source_path = Some(PathBuf::from("/work/go"));
        assert_eq!(config.source_path(), Some(PathBuf::from("/work/go")));
    }

    #[test]
    fn test_source_path_falls_back_to_gopath() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();
        let previous = std::env::var_os("GOPATH");

        std::env::set_var("GOPATH", "/home/dev/go");
        let config = Config::default();
        assert_eq!(config.source_path(), Some(PathBuf::from("/home/dev/go")));

        match previous {
            Some(value) => std::env::set_var("GOPATH", value),
            None => std::env::remove_var("GOPATH"),
        }
    }
}
