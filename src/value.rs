// https://redis.io/docs/reference/protocol-spec

use std::fmt;
use std::io::Cursor;
use std::str;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use strum_macros::IntoStaticStr;
use thiserror::Error as ThisError;

use crate::config::Limits;

pub(crate) static CRLF: &[u8; 2] = b"\r\n";

#[derive(Debug, ThisError, PartialEq)]
pub enum Error {
    #[error("not enough data is available to parse an entire value")]
    Incomplete,
    #[error("invalid data type: {0:?}")]
    InvalidDataType(char),
    #[error("invalid length: {0:?}")]
    InvalidLength(String),
    #[error("invalid integer: {0:?}")]
    InvalidInteger(String),
    #[error("invalid UTF-8 string")]
    InvalidUtf8(#[from] str::Utf8Error),
    #[error("line is not terminated by CRLF")]
    MissingTerminator,
    #[error("bulk string of {len} bytes exceeds the limit of {max}")]
    BulkTooLarge { len: usize, max: usize },
    #[error("array of {len} elements exceeds the limit of {max}")]
    ArrayTooLarge { len: usize, max: usize },
    #[error("arrays nested deeper than {0} levels")]
    TooDeep(usize),
}

/// A single decoded reply.
///
/// A null bulk string and a null array are kept apart from their zero-length counterparts:
/// `BulkString(None)` is "no such key" while `BulkString(Some(""))` is a key holding an empty
/// string.
#[derive(Clone, Debug, PartialEq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Value {
    SimpleString(String),
    /// A `-` reply. This is data, the decoder never turns it into an `Err`.
    Error(String),
    Integer(i64),
    BulkString(Option<Bytes>),
    Array(Option<Vec<Value>>),
}

impl Value {
    /// Parses one complete value from `src`, advancing the cursor past it.
    ///
    /// Returns `Error::Incomplete` when the buffer ends before the value does; the cursor
    /// position is meaningless in that case and the caller retries once more bytes arrived.
    pub fn parse(src: &mut Cursor<&[u8]>, limits: &Limits) -> Result<Self, Error> {
        parse_value(src, limits, 0)
    }

    /// Name of the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        self.into()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::BulkString(None) | Value::Array(None))
    }

    /// Serializes the value the way a server would send it.
    pub fn serialize(&self) -> Vec<u8> {
        let mut dst = BytesMut::new();
        self.write_to(&mut dst);
        dst.to_vec()
    }

    pub fn write_to(&self, dst: &mut BytesMut) {
        match self {
            Value::SimpleString(s) => write_line(dst, DataType::SimpleString, s.as_bytes()),
            Value::Error(s) => write_line(dst, DataType::SimpleError, s.as_bytes()),
            Value::Integer(i) => write_line(dst, DataType::Integer, i.to_string().as_bytes()),
            Value::BulkString(None) => write_line(dst, DataType::BulkString, b"-1"),
            Value::BulkString(Some(bytes)) => write_bulk(dst, bytes),
            Value::Array(None) => write_line(dst, DataType::Array, b"-1"),
            Value::Array(Some(values)) => {
                write_line(dst, DataType::Array, values.len().to_string().as_bytes());
                for value in values {
                    value.write_to(dst);
                }
            }
        }
    }

    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let values = match self {
            Value::Array(Some(values)) if !values.is_empty() => values,
            Value::SimpleString(s) => return f.write_str(s),
            Value::Error(s) => return write!(f, "(error) {}", s),
            Value::Integer(i) => return write!(f, "(integer) {}", i),
            Value::BulkString(Some(bytes)) => {
                return write!(f, "\"{}\"", String::from_utf8_lossy(bytes).escape_debug())
            }
            Value::BulkString(None) | Value::Array(None) => return f.write_str("(nil)"),
            Value::Array(Some(_)) => return f.write_str("(empty array)"),
        };

        let width = values.len().to_string().len();
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                write!(f, "\n{:indent$}", "")?;
            }
            let prefix = format!("{:>width$}) ", i + 1);
            f.write_str(&prefix)?;
            value.fmt_nested(f, indent + prefix.len())?;
        }
        Ok(())
    }
}

// Renders values the way `redis-cli` prints replies.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_nested(f, 0)
    }
}

// Typed views over a reply. A server error always surfaces as `crate::Error::Server`, any
// other mismatch as `crate::Error::UnexpectedReply`.
impl Value {
    /// Turns a `-` reply into `Err(crate::Error::Server)` and passes anything else through.
    pub fn into_result(self) -> crate::Result<Value> {
        match self {
            Value::Error(msg) => Err(crate::Error::Server(msg)),
            value => Ok(value),
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::SimpleString(s) => Some(s.as_bytes()),
            Value::BulkString(Some(bytes)) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|bytes| str::from_utf8(bytes).ok())
    }

    /// `Integer` replies, or string replies holding base-10 digits.
    pub fn into_integer(self) -> crate::Result<i64> {
        match self.into_result()? {
            Value::Integer(i) => Ok(i),
            value => value
                .as_str()
                .and_then(|s| s.parse::<i64>().ok())
                .ok_or_else(|| value.unexpected("integer")),
        }
    }

    /// String replies holding a floating point number, e.g. what `INCRBYFLOAT` answers.
    pub fn into_float(self) -> crate::Result<f64> {
        match self.into_result()? {
            Value::Integer(i) => Ok(i as f64),
            value => value
                .as_str()
                .and_then(|s| s.parse::<f64>().ok())
                .ok_or_else(|| value.unexpected("float")),
        }
    }

    /// A simple or bulk string reply. A null bulk string is `None`.
    pub fn into_string(self) -> crate::Result<Option<String>> {
        match self.into_result()? {
            Value::SimpleString(s) => Ok(Some(s)),
            Value::BulkString(None) => Ok(None),
            Value::BulkString(Some(bytes)) => String::from_utf8(bytes.to_vec())
                .map(Some)
                .map_err(|_| crate::Error::UnexpectedReply {
                    expected: "string",
                    actual: "binary bulk_string",
                }),
            value => Err(value.unexpected("string")),
        }
    }

    /// An array of strings, e.g. a `MGET` reply. Null elements are kept as `None`.
    pub fn into_strings(self) -> crate::Result<Vec<Option<String>>> {
        match self.into_result()? {
            Value::Array(Some(values)) => values.into_iter().map(Value::into_string).collect(),
            value => Err(value.unexpected("array")),
        }
    }

    fn unexpected(&self, expected: &'static str) -> crate::Error {
        crate::Error::UnexpectedReply {
            expected,
            actual: self.kind(),
        }
    }
}

impl From<Value> for Vec<u8> {
    fn from(value: Value) -> Self {
        value.serialize()
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::BulkString(Some(Bytes::copy_from_slice(s.as_bytes())))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

fn parse_value(src: &mut Cursor<&[u8]>, limits: &Limits, depth: usize) -> Result<Value, Error> {
    // The first byte identifies the type, the rest of the line is its header payload.
    let data_type = DataType::try_from(get_byte(src)?)?;
    let line = get_line(src)?;

    match data_type {
        DataType::SimpleString => Ok(Value::SimpleString(str::from_utf8(line)?.to_string())),
        DataType::SimpleError => Ok(Value::Error(str::from_utf8(line)?.to_string())),
        DataType::Integer => Ok(Value::Integer(parse_integer(line)?)),
        // $<length>\r\n<data>\r\n
        DataType::BulkString => match parse_length(line)? {
            None => Ok(Value::BulkString(None)),
            Some(len) => {
                let data = get_bulk(src, len, limits)?;
                Ok(Value::BulkString(Some(Bytes::copy_from_slice(data))))
            }
        },
        // *<number-of-elements>\r\n<element-1>...<element-n>
        DataType::Array => {
            let Some(len) = parse_length(line)? else {
                return Ok(Value::Array(None));
            };
            check_array(len, depth, limits)?;

            // Every element takes at least three bytes, so a declared count can not reserve
            // more than what is already buffered.
            let mut values = Vec::with_capacity(len.min(src.remaining() / 3));
            for _ in 0..len {
                values.push(parse_value(src, limits, depth + 1)?);
            }

            Ok(Value::Array(Some(values)))
        }
    }
}

/// Finds the end of the next complete value in a buffer without building it.
///
/// Progress survives `Error::Incomplete`, so a reply that trickles in over many reads has
/// each of its bytes scanned once. Between calls the buffer may only grow at the back; once a
/// length is returned the scanner starts over at offset zero.
#[derive(Debug, Default, Clone)]
pub(crate) struct Scanner {
    // Offset of the first header not scanned yet.
    position: usize,
    // Elements still owed by each open array, innermost last.
    pending: Vec<usize>,
}

impl Scanner {
    pub(crate) fn scan(&mut self, buf: &[u8], limits: &Limits) -> Result<usize, Error> {
        let mut src = Cursor::new(buf);
        src.set_position(self.position as u64);

        loop {
            let opened = match scan_header(&mut src, limits, self.pending.len()) {
                Ok(opened) => opened,
                Err(Error::Incomplete) => return Err(Error::Incomplete),
                Err(err) => {
                    self.reset();
                    return Err(err);
                }
            };

            match opened {
                Some(len) => self.pending.push(len),
                None => loop {
                    let Some(remaining) = self.pending.last_mut() else {
                        self.reset();
                        return Ok(src.position() as usize);
                    };
                    *remaining -= 1;
                    if *remaining > 0 {
                        break;
                    }
                    self.pending.pop();
                },
            }

            self.position = src.position() as usize;
        }
    }

    fn reset(&mut self) {
        self.position = 0;
        self.pending.clear();
    }
}

/// Validates one header (and a bulk payload) at `src`. Returns the element count of a
/// non-empty array, `None` for anything that is complete on its own.
fn scan_header(
    src: &mut Cursor<&[u8]>,
    limits: &Limits,
    depth: usize,
) -> Result<Option<usize>, Error> {
    let data_type = DataType::try_from(get_byte(src)?)?;
    let line = get_line(src)?;

    match data_type {
        DataType::SimpleString | DataType::SimpleError => {
            str::from_utf8(line)?;
        }
        DataType::Integer => {
            parse_integer(line)?;
        }
        DataType::BulkString => {
            if let Some(len) = parse_length(line)? {
                get_bulk(src, len, limits)?;
            }
        }
        DataType::Array => {
            if let Some(len) = parse_length(line)? {
                check_array(len, depth, limits)?;
                if len > 0 {
                    return Ok(Some(len));
                }
            }
        }
    }

    Ok(None)
}

fn parse_integer(line: &[u8]) -> Result<i64, Error> {
    str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| Error::InvalidInteger(lossy(line)))
}

/// Returns the `len` payload bytes of a bulk string and moves the cursor past their CRLF.
fn get_bulk<'a>(
    src: &mut Cursor<&'a [u8]>,
    len: usize,
    limits: &Limits,
) -> Result<&'a [u8], Error> {
    if len > limits.max_bulk_len {
        return Err(Error::BulkTooLarge {
            len,
            max: limits.max_bulk_len,
        });
    }
    if src.remaining() < len + CRLF.len() {
        return Err(Error::Incomplete);
    }

    let buf: &'a [u8] = *src.get_ref();
    let start = src.position() as usize;
    if &buf[start + len..start + len + CRLF.len()] != CRLF {
        return Err(Error::MissingTerminator);
    }
    src.advance(len + CRLF.len());

    Ok(&buf[start..start + len])
}

fn check_array(len: usize, depth: usize, limits: &Limits) -> Result<(), Error> {
    if len > limits.max_array_len {
        return Err(Error::ArrayTooLarge {
            len,
            max: limits.max_array_len,
        });
    }
    if len > 0 && depth >= limits.max_depth {
        return Err(Error::TooDeep(limits.max_depth));
    }
    Ok(())
}

/// Parses a bulk string or array header. `-1` is the null marker.
fn parse_length(line: &[u8]) -> Result<Option<usize>, Error> {
    let length = str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| Error::InvalidLength(lossy(line)))?;

    match length {
        -1 => Ok(None),
        n if n < 0 => Err(Error::InvalidLength(n.to_string())),
        n => usize::try_from(n)
            .map(Some)
            .map_err(|_| Error::InvalidLength(n.to_string())),
    }
}

/// Returns the bytes up to the next CRLF and moves the cursor past it.
fn get_line<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], Error> {
    let start = src.position() as usize;
    let buf: &'a [u8] = *src.get_ref();

    let lf = buf[start..]
        .iter()
        .position(|b| *b == b'\n')
        .map(|index| start + index)
        .ok_or(Error::Incomplete)?;

    if lf == start || buf[lf - 1] != b'\r' {
        return Err(Error::MissingTerminator);
    }

    src.set_position((lf + 1) as u64);
    Ok(&buf[start..lf - 1])
}

fn get_byte(src: &mut Cursor<&[u8]>) -> Result<u8, Error> {
    if !src.has_remaining() {
        return Err(Error::Incomplete);
    }
    Ok(src.get_u8())
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

pub(crate) fn write_line(dst: &mut BytesMut, data_type: DataType, payload: &[u8]) {
    dst.reserve(1 + payload.len() + CRLF.len());
    dst.put_u8(u8::from(data_type));
    dst.put_slice(payload);
    dst.put_slice(CRLF);
}

/// Writes `$<len>\r\n<bytes>\r\n`.
pub(crate) fn write_bulk(dst: &mut BytesMut, bytes: &[u8]) {
    write_line(dst, DataType::BulkString, bytes.len().to_string().as_bytes());
    dst.reserve(bytes.len() + CRLF.len());
    dst.put_slice(bytes);
    dst.put_slice(CRLF);
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum DataType {
    SimpleString, // '+'
    SimpleError,  // '-'
    Integer,      // ':'
    BulkString,   // '$'
    Array,        // '*'
}

impl TryFrom<u8> for DataType {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            b'+' => Ok(Self::SimpleString),
            b'-' => Ok(Self::SimpleError),
            b':' => Ok(Self::Integer),
            b'$' => Ok(Self::BulkString),
            b'*' => Ok(Self::Array),
            _ => Err(Error::InvalidDataType(char::from(byte))),
        }
    }
}

impl From<DataType> for u8 {
    fn from(value: DataType) -> Self {
        match value {
            DataType::SimpleString => b'+',
            DataType::SimpleError => b'-',
            DataType::Integer => b':',
            DataType::BulkString => b'$',
            DataType::Array => b'*',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(data: &[u8]) -> Result<Value, Error> {
        let mut cursor = Cursor::new(data);
        Value::parse(&mut cursor, &Limits::default())
    }

    fn bulk(s: &str) -> Value {
        Value::from(s)
    }

    #[test]
    fn parse_simple_string() {
        assert_eq!(parse(b"+OK\r\n"), Ok(Value::SimpleString("OK".to_string())));
    }

    #[test]
    fn parse_error_is_a_value() {
        assert_eq!(
            parse(b"-ERR unknown command 'FOO'\r\n"),
            Ok(Value::Error("ERR unknown command 'FOO'".to_string()))
        );
    }

    fn parse_integer(data: &[u8], expected: i64) {
        assert_eq!(parse(data), Ok(Value::Integer(expected)));
    }

    #[test]
    fn parse_integer_positive() {
        parse_integer(b":1000\r\n", 1000);
    }

    #[test]
    fn parse_integer_negative() {
        parse_integer(b":-1000\r\n", -1000);
    }

    #[test]
    fn parse_integer_zero() {
        parse_integer(b":0\r\n", 0);
    }

    #[test]
    fn parse_integer_positive_signed() {
        parse_integer(b":+1000\r\n", 1000);
    }

    #[test]
    fn parse_integer_malformed() {
        assert_eq!(
            parse(b":12a\r\n"),
            Err(Error::InvalidInteger("12a".to_string()))
        );
    }

    #[test]
    fn parse_bulk_string() {
        assert_eq!(parse(b"$6\r\nfoobar\r\n"), Ok(bulk("foobar")));
    }

    #[test]
    fn parse_bulk_string_binary_safe() {
        let value = parse(b"$4\r\n\r\n\0\n\r\n").unwrap();

        assert_eq!(
            value,
            Value::BulkString(Some(Bytes::from_static(b"\r\n\0\n")))
        );
    }

    #[test]
    fn null_and_empty_bulk_strings_are_distinct() {
        let null = parse(b"$-1\r\n").unwrap();
        let empty = parse(b"$0\r\n\r\n").unwrap();

        assert_eq!(null, Value::BulkString(None));
        assert_eq!(empty, Value::BulkString(Some(Bytes::new())));
        assert_ne!(null, empty);
    }

    #[test]
    fn null_and_empty_arrays_are_distinct() {
        let null = parse(b"*-1\r\n").unwrap();
        let empty = parse(b"*0\r\n").unwrap();

        assert_eq!(null, Value::Array(None));
        assert_eq!(empty, Value::Array(Some(vec![])));
        assert_ne!(null, empty);
    }

    #[test]
    fn parse_array() {
        assert_eq!(
            parse(b"*2\r\n$5\r\nhello\r\n$5\r\nworld\r\n"),
            Ok(Value::Array(Some(vec![bulk("hello"), bulk("world")])))
        );
    }

    #[test]
    fn parse_array_nested() {
        let data = b"*2\r\n*3\r\n:1\r\n:2\r\n:3\r\n*2\r\n+Hello\r\n-World\r\n";

        assert_eq!(
            parse(data),
            Ok(Value::Array(Some(vec![
                Value::Array(Some(vec![
                    Value::Integer(1),
                    Value::Integer(2),
                    Value::Integer(3)
                ])),
                Value::Array(Some(vec![
                    Value::SimpleString("Hello".to_string()),
                    Value::Error("World".to_string())
                ])),
            ])))
        );
    }

    #[test]
    fn parse_array_with_null_elements() {
        assert_eq!(
            parse(b"*2\r\n*1\r\n:1\r\n$-1\r\n"),
            Ok(Value::Array(Some(vec![
                Value::Array(Some(vec![Value::Integer(1)])),
                Value::BulkString(None),
            ])))
        );
    }

    #[test]
    fn parse_leaves_following_bytes_untouched() {
        let data = b":1\r\n:2\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let first = Value::parse(&mut cursor, &Limits::default()).unwrap();

        assert_eq!(first, Value::Integer(1));
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn parse_unknown_data_type() {
        assert_eq!(parse(b"Zoops\r\n"), Err(Error::InvalidDataType('Z')));
    }

    #[test]
    fn parse_incomplete() {
        assert_eq!(parse(b""), Err(Error::Incomplete));
        assert_eq!(parse(b"+OK"), Err(Error::Incomplete));
        assert_eq!(parse(b"$5\r\nhel"), Err(Error::Incomplete));
        assert_eq!(parse(b"$5\r\nhello"), Err(Error::Incomplete));
        assert_eq!(parse(b"*2\r\n:1\r\n"), Err(Error::Incomplete));
    }

    #[test]
    fn parse_bare_line_feed() {
        assert_eq!(parse(b"+OK\n"), Err(Error::MissingTerminator));
    }

    #[test]
    fn parse_bulk_string_with_wrong_terminator() {
        assert_eq!(parse(b"$2\r\nhello\r\n"), Err(Error::MissingTerminator));
    }

    #[test]
    fn parse_malformed_lengths() {
        assert_eq!(
            parse(b"$abc\r\n"),
            Err(Error::InvalidLength("abc".to_string()))
        );
        assert_eq!(
            parse(b"*-2\r\n"),
            Err(Error::InvalidLength("-2".to_string()))
        );
        assert_eq!(parse(b"$\r\n"), Err(Error::InvalidLength("".to_string())));
    }

    #[test]
    fn parse_respects_limits() {
        let limits = Limits {
            max_bulk_len: 4,
            max_array_len: 2,
            max_depth: 2,
        };
        let parse = |data: &[u8]| Value::parse(&mut Cursor::new(data), &limits);

        assert_eq!(
            parse(b"$5\r\nhello\r\n"),
            Err(Error::BulkTooLarge { len: 5, max: 4 })
        );
        assert_eq!(
            parse(b"*3\r\n:1\r\n:2\r\n:3\r\n"),
            Err(Error::ArrayTooLarge { len: 3, max: 2 })
        );
        assert_eq!(parse(b"*1\r\n*1\r\n*1\r\n:1\r\n"), Err(Error::TooDeep(2)));
        assert_eq!(
            parse(b"*1\r\n*1\r\n*0\r\n"),
            Ok(Value::Array(Some(vec![Value::Array(Some(vec![
                Value::Array(Some(vec![]))
            ]))])))
        );
    }

    #[test]
    fn huge_declared_array_does_not_preallocate() {
        // Declares a million elements but only carries one.
        assert_eq!(parse(b"*1000000\r\n:1\r\n"), Err(Error::Incomplete));
    }

    #[test]
    fn data_type_tags() {
        for tag in [b'+', b'-', b':', b'$', b'*'] {
            assert_eq!(u8::from(DataType::try_from(tag).unwrap()), tag);
        }
        assert!(matches!(
            DataType::try_from(b'-'),
            Ok(DataType::SimpleError)
        ));
    }

    #[test]
    fn scan_finds_the_end_of_each_value() {
        let data = b"*2\r\n$3\r\nfoo\r\n*1\r\n:7\r\n+OK\r\n";
        let mut scanner = Scanner::default();

        let end = scanner.scan(data, &Limits::default()).unwrap();
        assert_eq!(end, data.len() - 5);
        assert_eq!(
            scanner.scan(&data[end..], &Limits::default()),
            Ok(5)
        );
    }

    #[test]
    fn scan_resumes_across_partial_buffers() {
        let value = Value::Array(Some(vec![
            bulk("hello"),
            Value::Array(Some(vec![Value::Integer(1), Value::BulkString(None)])),
            Value::Array(Some(vec![])),
            Value::SimpleString("OK".to_string()),
        ]));
        let data = value.serialize();
        let mut scanner = Scanner::default();

        // Feed one more byte at a time, the way reads grow a connection buffer.
        for len in 0..data.len() {
            assert_eq!(
                scanner.scan(&data[..len], &Limits::default()),
                Err(Error::Incomplete)
            );
        }
        assert_eq!(scanner.scan(&data, &Limits::default()), Ok(data.len()));
        assert!(scanner.pending.is_empty());
        assert_eq!(scanner.position, 0);
    }

    #[test]
    fn scan_agrees_with_parse_on_errors() {
        let limits = Limits {
            max_bulk_len: 4,
            max_array_len: 2,
            max_depth: 2,
        };
        let cases: [&[u8]; 6] = [
            b"Zoops\r\n",
            b":12a\r\n",
            b"$5\r\nhello\r\n",
            b"*3\r\n:1\r\n:2\r\n:3\r\n",
            b"*1\r\n*1\r\n*1\r\n:1\r\n",
            b"$2\r\nhello\r\n",
        ];

        for data in cases {
            let mut scanner = Scanner::default();
            let scanned = scanner.scan(data, &limits).unwrap_err();
            let parsed = Value::parse(&mut Cursor::new(data), &limits).unwrap_err();
            assert_eq!(scanned, parsed);
        }
    }

    #[test]
    fn serialize_then_parse() {
        let value = Value::Array(Some(vec![
            Value::SimpleString("OK".to_string()),
            Value::Error("ERR nope".to_string()),
            Value::Integer(-3),
            Value::BulkString(None),
            Value::BulkString(Some(Bytes::new())),
            Value::Array(None),
            Value::Array(Some(vec![bulk("nested")])),
        ]));

        assert_eq!(parse(&value.serialize()), Ok(value));
    }

    #[test]
    fn serialize_null_markers() {
        assert_eq!(Value::BulkString(None).serialize(), b"$-1\r\n");
        assert_eq!(Value::Array(None).serialize(), b"*-1\r\n");
        assert_eq!(Value::Array(Some(vec![])).serialize(), b"*0\r\n");
    }

    #[test]
    fn display_like_redis_cli() {
        assert_eq!(Value::SimpleString("OK".into()).to_string(), "OK");
        assert_eq!(Value::Integer(42).to_string(), "(integer) 42");
        assert_eq!(Value::BulkString(None).to_string(), "(nil)");
        assert_eq!(bulk("a\"b").to_string(), "\"a\\\"b\"");
        assert_eq!(Value::Array(Some(vec![])).to_string(), "(empty array)");

        let nested = Value::Array(Some(vec![
            Value::Array(Some(vec![Value::Integer(1), bulk("x")])),
            Value::Error("ERR bad".into()),
        ]));
        assert_eq!(
            nested.to_string(),
            "1) 1) (integer) 1\n   2) \"x\"\n2) (error) ERR bad"
        );
    }

    #[test]
    fn kind_names() {
        assert_eq!(Value::BulkString(None).kind(), "bulk_string");
        assert_eq!(Value::Integer(1).kind(), "integer");
    }
    #[test]
    fn typed_views() {
        assert_eq!(Value::Integer(42).into_integer().unwrap(), 42);
        assert_eq!(bulk("17").into_integer().unwrap(), 17);
        assert_eq!(bulk("10.5").into_float().unwrap(), 10.5);
        assert_eq!(bulk("hi").into_string().unwrap(), Some("hi".to_string()));
        assert_eq!(Value::BulkString(None).into_string().unwrap(), None);
        assert_eq!(
            Value::SimpleString("PONG".into()).as_str(),
            Some("PONG")
        );
        assert_eq!(
            Value::Array(Some(vec![bulk("a"), Value::BulkString(None)]))
                .into_strings()
                .unwrap(),
            vec![Some("a".to_string()), None]
        );
    }

    #[test]
    fn typed_views_surface_server_errors() {
        let err = Value::Error("WRONGTYPE nope".into())
            .into_integer()
            .unwrap_err();

        assert!(matches!(err, crate::Error::Server(ref msg) if msg == "WRONGTYPE nope"));
    }

    #[test]
    fn typed_views_reject_mismatches() {
        let err = Value::Array(None).into_integer().unwrap_err();

        assert!(matches!(
            err,
            crate::Error::UnexpectedReply {
                expected: "integer",
                actual: "array"
            }
        ));
        assert!(bulk("x").into_strings().is_err());
    }
}
