use bytes::{Buf, BytesMut};
use std::io::Cursor;
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::command::Command;
use crate::config::Limits;
use crate::value::{self, Scanner, Value};
use crate::Error;

/// Drives the RESP parser and serializers through `tokio_util`'s `Framed` machinery, for
/// code that sits on the other side of the wire (echo servers, proxies, test doubles).
#[derive(Debug, Default, Clone)]
pub struct ValueCodec {
    limits: Limits,
    scanner: Scanner,
}

impl ValueCodec {
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            scanner: Scanner::default(),
        }
    }
}

impl Decoder for ValueCodec {
    type Item = Value;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let end = match self.scanner.scan(src, &self.limits) {
            Ok(end) => end,
            // Not enough data to parse a value.
            Err(value::Error::Incomplete) => return Ok(None),
            Err(err) => {
                warn!(%err, "invalid value");
                return Err(err.into());
            }
        };

        let mut cursor = Cursor::new(&src[..end]);
        let value = Value::parse(&mut cursor, &self.limits)?;

        // Remove the parsed value from the buffer.
        src.advance(end);

        Ok(Some(value))
    }
}

impl Encoder<Value> for ValueCodec {
    type Error = Error;

    fn encode(&mut self, item: Value, dst: &mut BytesMut) -> Result<(), Self::Error> {
        item.write_to(dst);
        Ok(())
    }
}

impl Encoder<Command> for ValueCodec {
    type Error = Error;

    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<(), Self::Error> {
        item.write_to(dst);
        Ok(())
    }
}
