use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {path} could not be read: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config file {path} is not valid TOML: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Failure to run an OS command at all.
///
/// A command that runs and exits non-zero is not an error; see the runner's output type.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("command '{0}' not found")]
    NotFound(String),
    #[error("command '{program}' timed out after {}s", timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },
    #[error("command '{program}' failed to start: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Conditions that prevent the monitor from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("no usable network interface found")]
    NoInterface,
    #[error("no supported network backend found (tried {0})")]
    NoBackend(String),
    #[error("requested network backend '{0}' is not available on this host")]
    BackendUnavailable(String),
    #[error("HTTP client could not be initialised: {0}")]
    HttpClient(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
