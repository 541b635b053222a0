//! Daemon configuration from environment variables
//!
//! | Variable                    | Default              |
//! |-----------------------------|----------------------|
//! | `EDUQUEUE_DATA_DIR`         | `~/.eduqueue/queues` |
//! | `EDUQUEUE_RPC_PORT`         | `9630`               |
//! | `EDUQUEUE_AUTOSAVE_SECS`    | `300` (0 disables)   |
//! | `EDUQUEUE_OUTBOX_CAPACITY`  | `1024`               |
//! | `EDUQUEUE_LOG_FORMAT`       | `pretty` (or `json`) |
//! | `EDUQUEUE_LOG_DIR`          | unset (stderr only)  |

use eduqueue_api_rpc::server::DEFAULT_RPC_PORT;
use eduqueue_core::error::{AppError, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_DATA_DIR: &str = "~/.eduqueue/queues";
const DEFAULT_AUTOSAVE_SECS: u64 = 300;
const DEFAULT_OUTBOX_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub data_dir: PathBuf,
    pub rpc_port: u16,
    /// Zero disables periodic saves; shutdown still saves
    pub autosave: Duration,
    pub outbox_capacity: usize,
    pub log_format: LogFormat,
    /// Daily-rolling log file directory, in addition to stderr
    pub log_dir: Option<PathBuf>,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let data_dir = lookup("EDUQUEUE_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());

        let log_format = match lookup("EDUQUEUE_LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(AppError::Config(format!(
                    "EDUQUEUE_LOG_FORMAT must be 'pretty' or 'json', got '{other}'"
                )))
            }
        };

        Ok(Self {
            data_dir: expand(&data_dir),
            rpc_port: parse_var(&lookup, "EDUQUEUE_RPC_PORT", DEFAULT_RPC_PORT)?,
            autosave: Duration::from_secs(parse_var(
                &lookup,
                "EDUQUEUE_AUTOSAVE_SECS",
                DEFAULT_AUTOSAVE_SECS,
            )?),
            outbox_capacity: parse_var(&lookup, "EDUQUEUE_OUTBOX_CAPACITY", DEFAULT_OUTBOX_CAPACITY)?,
            log_format,
            log_dir: lookup("EDUQUEUE_LOG_DIR").map(|dir| expand(&dir)),
        })
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{key} has an invalid value '{raw}'"))),
    }
}
