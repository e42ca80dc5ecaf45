use std::{str, vec};

use bytes::{Bytes, BytesMut};
use thiserror::Error as ThisError;

use crate::arg::Arg;
use crate::value::{write_bulk, write_line, DataType, Value};

/// A command name plus its arguments, framed as `*<1+n>\r\n` followed by one bulk string for
/// the name and one per argument, in order.
///
/// ```
/// use respline::Command;
///
/// let cmd = Command::new("SET").arg("greeting").arg("hi");
/// assert_eq!(cmd.serialize(), b"*3\r\n$3\r\nSET\r\n$8\r\ngreeting\r\n$2\r\nhi\r\n");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    name: String,
    args: Vec<Arg>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Arg>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arguments(&self) -> &[Arg] {
        &self.args
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut dst = BytesMut::new();
        self.write_to(&mut dst);
        dst.to_vec()
    }

    pub fn write_to(&self, dst: &mut BytesMut) {
        let len = 1 + self.args.len();
        write_line(dst, DataType::Array, len.to_string().as_bytes());
        write_bulk(dst, self.name.as_bytes());
        for arg in &self.args {
            arg.write_to(dst);
        }
    }
}

impl TryFrom<Value> for Command {
    type Error = CommandParserError;

    /// Reads a command back from the array a client sent. Arguments come back as raw bytes.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let values = match value {
            Value::Array(Some(values)) => values,
            value => {
                return Err(CommandParserError::InvalidValue {
                    expected: "array",
                    actual: value.kind(),
                })
            }
        };

        let mut parser = CommandParser {
            parts: values.into_iter(),
        };

        let name = parser.next_string()?;
        let mut cmd = Command::new(name);
        while let Some(bytes) = parser.next_bytes()? {
            cmd.args.push(Arg::Bytes(bytes));
        }

        Ok(cmd)
    }
}

struct CommandParser {
    parts: vec::IntoIter<Value>,
}

impl CommandParser {
    fn next_string(&mut self) -> Result<String, CommandParserError> {
        let bytes = self.next_bytes()?.ok_or(CommandParserError::EndOfStream)?;
        Ok(str::from_utf8(&bytes)?.to_string())
    }

    fn next_bytes(&mut self) -> Result<Option<Bytes>, CommandParserError> {
        match self.parts.next() {
            None => Ok(None),
            // Clients should only send bulk strings, simple strings are tolerated.
            Some(Value::SimpleString(s)) => Ok(Some(Bytes::from(s))),
            Some(Value::BulkString(Some(bytes))) => Ok(Some(bytes)),
            Some(value) => Err(CommandParserError::InvalidValue {
                expected: "bulk_string",
                actual: if value.is_null() { "null" } else { value.kind() },
            }),
        }
    }
}

#[derive(Debug, ThisError, PartialEq)]
pub enum CommandParserError {
    #[error("protocol error; invalid command, expected {expected}, got {actual}")]
    InvalidValue {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("protocol error; invalid UTF-8 command name")]
    InvalidUtf8(#[from] str::Utf8Error),
    #[error("protocol error; empty command")]
    EndOfStream,
}
