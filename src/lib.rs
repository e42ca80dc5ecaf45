//! Client side of the RESP wire protocol: framing commands, pipelining them, and decoding the
//! replies into [`Value`]s.
//!
//! ```no_run
//! use respline::{Command, Connection, Value};
//! use tokio::net::TcpStream;
//!
//! # async fn run() -> respline::Result<()> {
//! let stream = TcpStream::connect("127.0.0.1:6379").await?;
//! let mut conn = Connection::new(stream);
//!
//! let reply = conn.send(&Command::new("GET").arg("missing-key")).await?;
//! assert_eq!(reply, Value::BulkString(None));
//! # Ok(())
//! # }
//! ```

pub mod arg;
pub mod codec;
pub mod command;
pub mod config;
pub mod connection;
pub mod value;

use std::time::Duration;

use thiserror::Error as ThisError;

pub use arg::Arg;
pub use codec::ValueCodec;
pub use command::Command;
pub use config::{Config, Limits};
pub use connection::Connection;
pub use value::Value;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, ThisError)]
pub enum Error {
    /// The peer sent something that is not RESP. The stream can not be resynchronized.
    #[error("protocol error; {0}")]
    Protocol(#[from] value::Error),
    #[error("io error; {0}")]
    Io(#[from] std::io::Error),
    /// A single read or write did not complete in time. Part of a frame may have been
    /// transferred already.
    #[error("{op} timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },
    #[error("connection closed by peer")]
    ConnectionClosed,
    /// A `-` reply, only produced when a caller asks for it via [`Value::into_result`].
    #[error("server error; {0}")]
    Server(String),
    #[error("unexpected reply; expected {expected}, got {actual}")]
    UnexpectedReply {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("invalid configuration; {0}")]
    Config(String),
}

impl Error {
    /// Whether the connection that produced this error has to be dropped.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Protocol(_) | Error::Io(_) | Error::Timeout { .. } | Error::ConnectionClosed
        )
    }
}
