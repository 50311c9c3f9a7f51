// Configuration module entry point
// Loads layered configuration and holds the shared runtime state

mod state;
mod types;

use config::builder::{ConfigBuilder, DefaultState};
use config::ConfigError;
use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{Config, CorsConfig, FramesConfig, HealthConfig, SearchConfig};

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// Sources, lowest priority first: built-in defaults, the optional file,
    /// `FRAME_`-prefixed environment variables (`FRAME_SERVER__PORT=9000`).
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let settings = with_defaults(config::Config::builder())?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("FRAME")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        let target = format!("{}:{}", self.server.host, self.server.port);
        // `localhost` is not a socket address literal, resolve it
        std::net::ToSocketAddrs::to_socket_addrs(&target)
            .map_err(|e| format!("Invalid address '{target}': {e}"))?
            .next()
            .ok_or_else(|| format!("Address '{target}' did not resolve"))
    }
}

fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    builder
        .set_default("server.host", "localhost")?
        .set_default("server.port", 4126)?
        .set_default("logging.level", "info")?
        .set_default("logging.access_log", true)?
        .set_default("performance.keep_alive_timeout", 75)?
        .set_default("performance.read_timeout", 30)?
        .set_default("performance.write_timeout", 30)?
        .set_default("http.server_name", "frame_server/0.1")?
        .set_default("http.max_body_size", 1_048_576)? // 1MB
        .set_default("frames.root_dir", "static_asset_dir")
}

#[cfg(test)]
impl Config {
    /// Defaults only, with the frame root pointed at `root_dir`
    pub fn for_root_dir(root_dir: &std::path::Path) -> Self {
        with_defaults(config::Config::builder())
            .and_then(|b| b.set_override("frames.root_dir", root_dir.to_string_lossy().as_ref()))
            .and_then(|b| b.build())
            .and_then(|c| c.try_deserialize())
            .expect("default configuration must deserialize")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::for_root_dir(std::path::Path::new("/srv/frames"));
        assert_eq!(cfg.server.host, "localhost");
        assert_eq!(cfg.server.port, 4126);
        assert_eq!(cfg.frames.root_dir, "/srv/frames");
        assert!(cfg.frames.files.is_empty());
        assert_eq!(cfg.cors, CorsConfig::default());
        assert_eq!(cfg.cors.allow_origin, "*");
        assert!(cfg.search.base_url.is_none());
        assert_eq!(cfg.search.timeout_secs, 10);
        assert!(cfg.health.enabled);
        assert_eq!(cfg.logging.access_log_format, "combined");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 9100

[frames]
root_dir = "/data/frames"

[frames.files]
weapon = "weapons_v2.json"

[cors]
allow_origin = "https://example.com"

[search]
base_url = "http://127.0.0.1:9117/api"
trusted_users = ["alice"]
"#,
        )
        .unwrap();

        let stem = dir.path().join("server");
        let cfg = Config::load_from(stem.to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 9100);
        assert_eq!(cfg.server.host, "localhost");
        assert_eq!(cfg.frames.root_dir, "/data/frames");
        assert_eq!(
            cfg.frames.files.get("weapon").map(String::as_str),
            Some("weapons_v2.json")
        );
        assert_eq!(cfg.cors.allow_origin, "https://example.com");
        // Unset CORS values keep their defaults
        assert_eq!(cfg.cors.allow_methods, "GET, POST, PUT, OPTIONS");
        assert_eq!(cfg.search.trusted_users, vec!["alice".to_string()]);
        assert_eq!(cfg.search.timeout_secs, 10);
    }

    #[test]
    fn test_socket_addr() {
        let mut cfg = Config::for_root_dir(std::path::Path::new("."));
        cfg.server.host = "127.0.0.1".to_string();
        cfg.server.port = 4126;
        assert_eq!(
            cfg.get_socket_addr().unwrap(),
            "127.0.0.1:4126".parse::<SocketAddr>().unwrap()
        );

        cfg.server.host = "not a host".to_string();
        assert!(cfg.get_socket_addr().is_err());
    }
}
