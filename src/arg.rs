use std::fmt;

use bytes::{Bytes, BytesMut};

use crate::value::write_bulk;

/// One command argument. Every variant has a bulk string encoding, so marshaling never fails.
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    Text(String),
    Bytes(Bytes),
    Integer(i64),
    Float(f64),
    /// `"1"` or `"0"`.
    Bool(bool),
    /// Sent as a zero-length bulk string. RESP has no null for command arguments.
    Nil,
    /// Anything else, already rendered as text.
    Other(String),
}

impl Arg {
    /// Fallback for values with no dedicated variant: their `Display` text is sent.
    pub fn other(value: impl fmt::Display) -> Self {
        Arg::Other(value.to_string())
    }

    /// The payload of the bulk string this argument is sent as.
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Arg::Text(s) | Arg::Other(s) => Bytes::copy_from_slice(s.as_bytes()),
            Arg::Bytes(bytes) => bytes.clone(),
            Arg::Integer(i) => Bytes::from(i.to_string()),
            Arg::Float(f) => Bytes::from(format_float(*f)),
            Arg::Bool(true) => Bytes::from_static(b"1"),
            Arg::Bool(false) => Bytes::from_static(b"0"),
            Arg::Nil => Bytes::new(),
        }
    }

    /// Appends `$<len>\r\n<payload>\r\n` to `dst`.
    pub fn write_to(&self, dst: &mut BytesMut) {
        match self {
            Arg::Text(s) | Arg::Other(s) => write_bulk(dst, s.as_bytes()),
            Arg::Bytes(bytes) => write_bulk(dst, bytes),
            arg => write_bulk(dst, &arg.to_bytes()),
        }
    }
}

/// Shortest text that parses back to the same `f64`, in `%g` form: plain decimal notation for
/// exponents in `-4..6`, otherwise scientific notation with a signed exponent of at least two
/// digits (`1e+06`, `1.5e-07`).
fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let scientific = format!("{:e}", f);
    let Some((mantissa, exponent)) = scientific
        .split_once('e')
        .and_then(|(mantissa, exp)| Some((mantissa, exp.parse::<i32>().ok()?)))
    else {
        return f.to_string();
    };

    if (-4..6).contains(&exponent) {
        return f.to_string();
    }

    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{}e{}{:02}", mantissa, sign, exponent.unsigned_abs())
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Text(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Text(s)
    }
}

impl From<&String> for Arg {
    fn from(s: &String) -> Self {
        Arg::Text(s.clone())
    }
}

impl From<&[u8]> for Arg {
    fn from(bytes: &[u8]) -> Self {
        Arg::Bytes(Bytes::copy_from_slice(bytes))
    }
}

impl<const N: usize> From<&[u8; N]> for Arg {
    fn from(bytes: &[u8; N]) -> Self {
        Arg::Bytes(Bytes::copy_from_slice(bytes))
    }
}

impl From<Vec<u8>> for Arg {
    fn from(bytes: Vec<u8>) -> Self {
        Arg::Bytes(Bytes::from(bytes))
    }
}

impl From<Bytes> for Arg {
    fn from(bytes: Bytes) -> Self {
        Arg::Bytes(bytes)
    }
}

macro_rules! from_lossless {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Arg {
                fn from(i: $ty) -> Self {
                    Arg::Integer(i64::from(i))
                }
            }
        )*
    };
}

from_lossless!(i8, i16, i32, i64, u8, u16, u32);

// Pointer-sized and `u64` values may not fit an `i64`; their decimal text is the same either way.
macro_rules! from_wide {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Arg {
                fn from(i: $ty) -> Self {
                    i64::try_from(i).map_or_else(|_| Arg::other(i), Arg::Integer)
                }
            }
        )*
    };
}

from_wide!(isize, usize, u64);

impl From<f64> for Arg {
    fn from(f: f64) -> Self {
        Arg::Float(f)
    }
}

impl From<f32> for Arg {
    fn from(f: f32) -> Self {
        Arg::Float(f64::from(f))
    }
}

impl From<bool> for Arg {
    fn from(b: bool) -> Self {
        Arg::Bool(b)
    }
}

impl<T: Into<Arg>> From<Option<T>> for Arg {
    fn from(value: Option<T>) -> Self {
        value.map_or(Arg::Nil, Into::into)
    }
}
