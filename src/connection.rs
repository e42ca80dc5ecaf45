//! Writing commands to and reading replies from one duplex byte stream.
//!
//! # Pipelining
//!
//! RESP carries no request ids: replies come back in exactly the order the commands were
//! written. [`Connection::pipe`] may be called any number of times before a
//! [`Connection::flush`], and each piped command owes exactly one later
//! [`Connection::receive_one`]. Keeping those two counts equal is up to the caller; the
//! connection does not track it. [`Connection::pipeline`] does the bookkeeping for a batch
//! known upfront.
//!
//! A `Connection` takes `&mut self` everywhere, so one task drives it at a time. Sharing it
//! between tasks needs an outer lock held across a whole write/read exchange, otherwise
//! frames of different callers interleave. One connection per concurrent caller is simpler.
//!
//! After any fatal error (see [`Error::is_fatal`]) the stream may sit in the middle of a frame
//! and the connection must be dropped.

use std::future::Future;
use std::io::{self, Cursor};
use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tracing::{debug, instrument, trace, warn};
use uuid::Uuid;

use crate::command::Command;
use crate::config::Config;
use crate::value::{self, Scanner, Value};
use crate::{Error, Result};

pub struct Connection<S = TcpStream> {
    pub id: Uuid,
    stream: BufWriter<S>,
    // Data is read from the stream into the read buffer. When a value is parsed, the
    // corresponding data is removed from the buffer.
    buffer: BytesMut,
    // Remembers how far into the buffer a partially received reply has been validated.
    scanner: Scanner,
    // Scratch space a command is framed in before it is handed to the stream in one write.
    frame: BytesMut,
    // Bytes written since the last flush, for logging only.
    unflushed: usize,
    config: Config,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Connection<S> {
        Connection::with_config(stream, Config::default())
    }

    pub fn with_config(stream: S, config: Config) -> Connection<S> {
        Connection {
            id: Uuid::new_v4(),
            stream: BufWriter::new(stream),
            // Allocate the buffer with 4kb of capacity.
            buffer: BytesMut::with_capacity(4096),
            scanner: Scanner::default(),
            frame: BytesMut::new(),
            unflushed: 0,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Pipes `cmd`, flushes, and reads its reply: one synchronous round trip.
    ///
    /// Replies to commands piped earlier and not yet received are still ahead in the stream, so
    /// this must only be called with no receives outstanding.
    #[instrument(
        name = "send",
        skip(self, cmd),
        fields(connection_id = %self.id, command = cmd.name())
    )]
    pub async fn send(&mut self, cmd: &Command) -> Result<Value> {
        self.pipe(cmd).await?;
        self.flush().await?;
        self.receive_one().await
    }

    /// Buffers the framed command. Bytes reach the transport in call order, but only
    /// [`flush`](Self::flush) guarantees all of them were handed over.
    ///
    /// A failed write may leave part of the frame on the wire.
    pub async fn pipe(&mut self, cmd: &Command) -> Result<()> {
        self.frame.clear();
        cmd.write_to(&mut self.frame);

        debug!(
            command = cmd.name(),
            args = cmd.arguments().len(),
            bytes = self.frame.len(),
            "pipe"
        );

        deadline(
            self.config.write_timeout,
            "write",
            self.stream.write_all(&self.frame),
        )
        .await?;
        self.unflushed += self.frame.len();

        Ok(())
    }

    pub async fn flush(&mut self) -> Result<()> {
        debug!(bytes = self.unflushed, "flush");

        deadline(self.config.write_timeout, "flush", self.stream.flush()).await?;
        self.unflushed = 0;

        Ok(())
    }

    /// Reads exactly one reply, nested arrays included, blocking until it is complete.
    ///
    /// A `-` reply is returned as [`Value::Error`], not as an `Err`.
    pub async fn receive_one(&mut self) -> Result<Value> {
        loop {
            if let Some(value) = self.parse_value()? {
                trace!(kind = value.kind(), "received");
                return Ok(value);
            }

            let read = deadline(
                self.config.read_timeout,
                "read",
                self.stream.read_buf(&mut self.buffer),
            )
            .await?;

            // The peer closed the stream. With bytes left in the buffer it did so in the
            // middle of a reply.
            if read == 0 {
                debug!(buffered = self.buffer.len(), "connection closed by peer");
                return Err(Error::ConnectionClosed);
            }
        }
    }

    /// Pipes every command, flushes once, then reads one reply per command, in order.
    ///
    /// Replies that are `-` errors stay in the returned list; only transport and protocol
    /// faults abort the batch.
    pub async fn pipeline(&mut self, cmds: &[Command]) -> Result<Vec<Value>> {
        for cmd in cmds {
            self.pipe(cmd).await?;
        }
        self.flush().await?;

        let mut replies = Vec::with_capacity(cmds.len());
        for _ in cmds {
            replies.push(self.receive_one().await?);
        }

        Ok(replies)
    }

    /// Flushes whatever is still buffered and shuts the write half down.
    pub async fn close(mut self) -> Result<()> {
        deadline(self.config.write_timeout, "close", self.stream.shutdown()).await
    }

    /// Gives back the transport. Buffered but unflushed writes are lost.
    pub fn into_inner(self) -> S {
        self.stream.into_inner()
    }

    fn parse_value(&mut self) -> Result<Option<Value>> {
        // Only build the value once all of it is buffered.
        let end = match self.scanner.scan(&self.buffer, &self.config.limits) {
            Ok(end) => end,
            Err(value::Error::Incomplete) => return Ok(None),
            Err(err) => {
                warn!(connection_id = %self.id, %err, "protocol error");
                return Err(err.into());
            }
        };

        let mut cursor = Cursor::new(&self.buffer[..end]);
        let value = Value::parse(&mut cursor, &self.config.limits)?;
        self.buffer.advance(end);

        Ok(Some(value))
    }
}

/// Runs one transport operation under its own timeout.
async fn deadline<F, T>(limit: Option<Duration>, op: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    let Some(after) = limit else {
        return Ok(fut.await?);
    };

    match tokio::time::timeout(after, fut).await {
        Ok(res) => Ok(res?),
        Err(_) => {
            warn!(op, ?after, "timed out");
            Err(Error::Timeout { op, after })
        }
    }
}
