use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::Error;

/// Matches the socket timeout used by the classic Redis clients.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Redis' own `proto-max-bulk-len` default.
pub const DEFAULT_MAX_BULK_LEN: usize = 512 * 1024 * 1024;

pub const DEFAULT_MAX_ARRAY_LEN: usize = 1024 * 1024;

pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Upper bounds the decoder enforces on what a peer declares, before reading or allocating.
#[derive(Clone, Debug, PartialEq)]
pub struct Limits {
    pub max_bulk_len: usize,
    pub max_array_len: usize,
    /// How many arrays may be nested inside each other.
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_bulk_len: DEFAULT_MAX_BULK_LEN,
            max_array_len: DEFAULT_MAX_ARRAY_LEN,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Per-connection settings.
///
/// Timeouts apply to every single read or write on the transport, measured from the moment
/// that operation starts. `None` waits forever.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
    pub limits: Limits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            read_timeout: Some(DEFAULT_TIMEOUT),
            write_timeout: Some(DEFAULT_TIMEOUT),
            limits: Limits::default(),
        }
    }
}

impl Config {
    /// Defaults overridden by `RESPLINE_*` environment variables.
    ///
    /// A timeout of `0` milliseconds disables that timeout. A variable that does not parse is an
    /// error rather than being ignored.
    pub fn from_env() -> Result<Self, Error> {
        let mut config = Config::default();

        if let Some(ms) = env_var::<u64>("RESPLINE_READ_TIMEOUT_MS")? {
            config.read_timeout = millis(ms);
        }
        if let Some(ms) = env_var::<u64>("RESPLINE_WRITE_TIMEOUT_MS")? {
            config.write_timeout = millis(ms);
        }
        if let Some(len) = env_var("RESPLINE_MAX_BULK_LEN")? {
            config.limits.max_bulk_len = len;
        }
        if let Some(len) = env_var("RESPLINE_MAX_ARRAY_LEN")? {
            config.limits.max_array_len = len;
        }
        if let Some(depth) = env_var("RESPLINE_MAX_DEPTH")? {
            config.limits.max_depth = depth;
        }

        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self.write_timeout = timeout;
        self
    }
}

fn millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

fn env_var<T: FromStr>(key: &str) -> Result<Option<T>, Error> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{} must be a number, got {:?}", key, value))),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => {
            Err(Error::Config(format!("{} is not valid unicode", key)))
        }
    }
}
