//! Configuration management for the RAX tree server
//!
//! Settings are layered: built-in defaults, then `config.toml`, then
//! `RAX_TREE_*` environment variables, then command-line flags. Everything is
//! read once at startup and is immutable afterwards.

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

use crate::error::ServerError;
use crate::storage::{FilterConfig, normalize_lexically};

const DEFAULT_CONFIG_FILE: &str = "config";
const ENV_PREFIX: &str = "RAX_TREE";

/// Command-line flags. Every flag is optional and overrides the config file.
#[derive(Debug, Default, Parser)]
#[command(name = "rax-tree-server", about = "Browse and manage a directory tree over TCP")]
pub struct Cli {
    /// Directory to serve (takes precedence over --path)
    pub dir: Option<String>,

    /// Directory to serve
    #[arg(long)]
    pub path: Option<String>,

    /// Address to bind
    #[arg(long)]
    pub bind: Option<String>,

    /// Port to serve on
    #[arg(long)]
    pub port: Option<u16>,

    /// Show hidden files and directories
    #[arg(long)]
    pub hidden: bool,

    /// Comma-separated list of directory names to ignore
    #[arg(long)]
    pub ignore: Option<String>,

    /// Config file to load, without extension
    #[arg(long)]
    pub config: Option<String>,
}

/// Complete server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// IP address to bind the control connection
    pub bind_address: String,

    /// Port for the control connection
    pub port: u16,

    /// Directory exposed to clients
    pub root: String,

    /// Include entries whose name starts with `.`
    pub show_hidden: bool,

    /// Comma-separated directory names excluded from every listing
    pub ignore: String,

    /// Maximum concurrent clients
    pub max_clients: usize,

    /// Maximum request line length in bytes
    pub max_command_length: usize,
}

/// Resolved values shared read-only by every session.
#[derive(Debug, Clone)]
pub struct ServeContext {
    pub root: PathBuf,
    pub filter: FilterConfig,
    pub max_command_length: usize,
}

impl ServerConfig {
    /// Load configuration from defaults, config file, environment and CLI flags
    pub fn load(cli: &Cli) -> Result<Self, config::ConfigError> {
        let config_file = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_FILE);

        let settings = Config::builder()
            .set_default("bind_address", "127.0.0.1")?
            .set_default("port", 8080)?
            .set_default("root", ".")?
            .set_default("show_hidden", false)?
            .set_default("ignore", "")?
            .set_default("max_clients", 10)?
            .set_default("max_command_length", 4096)?
            .add_source(File::with_name(config_file).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .set_override_option("root", cli.dir.clone().or_else(|| cli.path.clone()))?
            .set_override_option("bind_address", cli.bind.clone())?
            .set_override_option("port", cli.port.map(i64::from))?
            .set_override_option("show_hidden", cli.hidden.then_some(true))?
            .set_override_option("ignore", cli.ignore.clone())?
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.port == 0 {
            return Err(config::ConfigError::Message("port cannot be 0".into()));
        }

        if self.root.trim().is_empty() {
            return Err(config::ConfigError::Message("root cannot be empty".into()));
        }

        if self.max_clients == 0 {
            return Err(config::ConfigError::Message(
                "max_clients must be greater than 0".into(),
            ));
        }

        if self.max_command_length == 0 {
            return Err(config::ConfigError::Message(
                "max_command_length must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Get bind address and port as socket address
    pub fn control_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn filter_config(&self) -> FilterConfig {
        FilterConfig::new(self.show_hidden, FilterConfig::parse_ignore_list(&self.ignore))
    }

    /// Absolute, lexically normalized root. Fails unless it is an existing directory.
    pub fn resolve_root(&self) -> Result<PathBuf, ServerError> {
        let absolute = std::path::absolute(&self.root)
            .map_err(|e| ServerError::InvalidRoot(format!("{}: {}", self.root, e)))?;
        let root = normalize_lexically(&absolute);

        if !root.is_dir() {
            return Err(ServerError::InvalidRoot(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        Ok(root)
    }

    pub fn serve_context(&self) -> Result<ServeContext, ServerError> {
        Ok(ServeContext {
            root: self.resolve_root()?,
            filter: self.filter_config(),
            max_command_length: self.max_command_length,
        })
    }
}

impl ServeContext {
    pub fn new(root: PathBuf, filter: FilterConfig) -> Self {
        Self {
            root,
            filter,
            max_command_length: 4096,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn base_config(root: &str) -> ServerConfig {
        ServerConfig {
            bind_address: "127.0.0.1".into(),
            port: 8080,
            root: root.into(),
            show_hidden: false,
            ignore: "node_modules, .git".into(),
            max_clients: 10,
            max_command_length: 4096,
        }
    }

    #[test]
    fn test_load_file_then_cli_override() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("server.toml");
        std::fs::File::create(&file)
            .unwrap()
            .write_all(b"port = 9191\nignore = \"dist\"\nmax_clients = 3\n")
            .unwrap();

        let cli = Cli {
            config: Some(file.to_string_lossy().to_string()),
            path: Some("/from/flag".into()),
            dir: Some("/from/positional".into()),
            hidden: true,
            ..Cli::default()
        };
        let config = ServerConfig::load(&cli).unwrap();

        assert_eq!(config.port, 9191);
        assert_eq!(config.max_clients, 3);
        assert_eq!(config.ignore, "dist");
        assert_eq!(config.root, "/from/positional");
        assert!(config.show_hidden);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = base_config(".");
        config.port = 0;
        assert!(config.validate().is_err());

        let mut config = base_config(" ");
        assert!(config.validate().is_err());
        config.root = ".".into();
        config.max_clients = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_filter_config() {
        let filter = base_config(".").filter_config();
        assert!(!filter.show_hidden);
        assert!(filter.ignored_dir_names.contains("node_modules"));
        assert!(filter.ignored_dir_names.contains(".git"));
    }

    #[test]
    fn test_resolve_root() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a");
        std::fs::create_dir(&nested).unwrap();

        let config = base_config(&format!("{}/a/../a/.", dir.path().display()));
        let root = config.resolve_root().unwrap();
        assert!(root.is_absolute());
        assert_eq!(root, nested);

        let config = base_config(&format!("{}/missing", dir.path().display()));
        assert!(matches!(
            config.resolve_root(),
            Err(ServerError::InvalidRoot(_))
        ));
    }
}
