use std::path::PathBuf;

use clap::Parser;

#[derive(Clone, Debug, Parser)]
#[command(name = "icomment", about = "Self-hosted comment service for static sites")]
pub struct AppConfig {
    /// SQLite database file (or a full `sqlite:` url)
    #[arg(long = "db", env = "ICOMMENT_DB_PATH", default_value = "./comments.db")]
    pub db_path: String,

    /// Public API port
    #[arg(long = "port", env = "ICOMMENT_PORT", default_value_t = 7001)]
    pub public_port: u16,

    /// Admin panel port
    #[arg(long = "admin-port", env = "ICOMMENT_ADMIN_PORT", default_value_t = 7002)]
    pub admin_port: u16,

    /// Interface both listeners bind to
    #[arg(long = "bind", env = "ICOMMENT_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    /// Bark device key, notifications are disabled when empty
    #[arg(long = "bark-device-key", env = "BARK_DEVICE_KEY")]
    pub bark_device_key: Option<String>,

    #[arg(long = "bark-server", env = "BARK_SERVER", default_value = "https://api.day.app")]
    pub bark_server: String,

    /// Directory served under /static/ on the public listener
    #[arg(long = "static-dir", env = "ICOMMENT_STATIC_DIR", default_value = "./static")]
    pub static_dir: PathBuf,

    /// HTML layout for the admin page, must contain `{{content}}`
    #[arg(long = "admin-template", env = "ICOMMENT_ADMIN_TEMPLATE")]
    pub admin_template: Option<PathBuf>,
}

impl AppConfig {
    pub fn database_url(&self) -> String {
        let path = self.db_path.trim();
        if path.starts_with("sqlite:") {
            return path.to_string();
        }
        format!("sqlite://{}?mode=rwc", path)
    }

    pub fn bark_device_key(&self) -> Option<&str> {
        self.bark_device_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, FromArgMatches};

    /// Parses flags only; `ICOMMENT_*`/`BARK_*` in the test environment are ignored.
    fn parse_flags(args: &[&str]) -> AppConfig {
        let cmd = AppConfig::command().mut_args(|arg| arg.env(None::<&'static str>));
        AppConfig::from_arg_matches(&cmd.get_matches_from(args)).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse_flags(&["icomment"]);
        assert_eq!(config.public_port, 7001);
        assert_eq!(config.admin_port, 7002);
        assert_eq!(config.bind, "0.0.0.0");
        assert_eq!(config.bark_server, "https://api.day.app");
        assert_eq!(config.static_dir, PathBuf::from("./static"));
        assert!(config.admin_template.is_none());
        assert!(config.bark_device_key().is_none());
        assert_eq!(config.database_url(), "sqlite://./comments.db?mode=rwc");
    }

    #[test]
    fn test_flags_override() {
        let config = parse_flags(&[
            "icomment",
            "--db",
            "/tmp/c.db",
            "--port",
            "8080",
            "--admin-port",
            "8081",
            "--bark-device-key",
            "  ",
        ]);
        assert_eq!(config.public_port, 8080);
        assert_eq!(config.admin_port, 8081);
        assert_eq!(config.database_url(), "sqlite:///tmp/c.db?mode=rwc");
        assert!(config.bark_device_key().is_none());

        let config = parse_flags(&["icomment", "--bark-device-key", "abc"]);
        assert_eq!(config.bark_device_key(), Some("abc"));
    }

    #[test]
    fn test_database_url_passthrough() {
        let config = parse_flags(&["icomment", "--db", "sqlite::memory:"]);
        assert_eq!(config.database_url(), "sqlite::memory:");
    }
}
