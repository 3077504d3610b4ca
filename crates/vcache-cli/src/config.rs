//! # Server Configuration
//!
//! Command-line flags, the optional JSON config file, and the rules that
//! merge them into one [`AppConfig`].
//!
//! Precedence, highest first: flags given on the command line, the config
//! file named by `--conf`, built-in defaults. A positional `STORE` given on
//! the command line replaces the file's `store`.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vcache_api::Access;
use vcache_core::{StoreConfig, StoreConfigError};

/// Listen address used when none is configured.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Listen port used when none is configured.
pub const DEFAULT_PORT: u16 = 15151;

const STORE_HELP: &str = "\
Store:
  Location of the binary cache, in the format

    kind[:[path][,opt[=val]]...]

  Available stores:

    files:[vcpkg-cache]
      Directory tree at the given path, one directory per name and
      version. This is the default store.

    archives:[$HOME/.cache/vcpkg/archives]
      Share the directory layout of the vcpkg \"files\" provider.

  Options:

    work=<dir>
      Directory for in-progress uploads; must be on the same
      filesystem as the store. Defaults to <path>/.work.";

/// HTTP binary cache server for vcpkg.
#[derive(Parser, Debug)]
#[command(name = "vcache", version, about, after_help = STORE_HELP)]
pub struct Args {
    /// Path to a JSON config file.
    #[arg(long, value_name = "FILE")]
    pub conf: Option<PathBuf>,

    /// Host to listen on [default: 0.0.0.0].
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on [default: 15151].
    #[arg(long)]
    pub port: Option<u16>,

    /// Disable colored logs; set by default if stdout is not a terminal.
    #[arg(long)]
    pub no_color: bool,

    /// Log in JSON format.
    #[arg(long)]
    pub log_json: bool,

    /// Serve downloads only; uploads answer 405.
    #[arg(long)]
    pub read_only: bool,

    /// Accept uploads only; downloads answer 405.
    #[arg(long)]
    pub write_only: bool,

    /// Store selector; see "Store" below.
    #[arg(value_name = "STORE")]
    pub store: Option<String>,
}

/// Effective server configuration; also the config-file schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreConfig>,
    pub no_color: bool,
    pub log_json: bool,
    pub read_only: bool,
    pub write_only: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            store: None,
            no_color: !std::io::stdout().is_terminal(),
            log_json: false,
            read_only: false,
            write_only: false,
        }
    }
}

impl AppConfig {
    /// Read a config file. Fields it omits keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reject flag combinations that leave nothing to serve.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.read_only && self.write_only {
            return Err(ConfigError::Exclusive);
        }
        Ok(())
    }

    /// Operations the handler serves under this configuration.
    pub fn access(&self) -> Access {
        if self.read_only {
            Access::READ_ONLY
        } else if self.write_only {
            Access::WRITE_ONLY
        } else {
            Access::READ_WRITE
        }
    }
}

impl Args {
    /// Merge flags over the config file (if any) over the defaults.
    /// Does not validate; see [`Args::load`].
    pub fn merge(self) -> Result<AppConfig, ConfigError> {
        let store = self
            .store
            .as_deref()
            .map(str::parse::<StoreConfig>)
            .transpose()
            .map_err(ConfigError::Store)?;

        let mut config = match &self.conf {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };

        if store.is_some() {
            config.store = store;
        }
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        config.no_color |= self.no_color;
        config.log_json |= self.log_json;
        config.read_only |= self.read_only;
        config.write_only |= self.write_only;
        Ok(config)
    }

    /// Merge and validate.
    pub fn load(self) -> Result<AppConfig, ConfigError> {
        let config = self.merge()?;
        config.validate()?;
        Ok(config)
    }
}

/// Reasons the server configuration could not be assembled.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config at {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to unmarshal config at {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("parse store config")]
    Store(#[source] StoreConfigError),

    #[error("read-only and write-only cannot be set together")]
    Exclusive,
}
