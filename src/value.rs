use std::fmt;
use std::mem;
use std::num::IntErrorKind;
use std::str;

/// The conversion kind of a bound field, for diagnostics and descriptor
/// introspection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    /// UTF-8 text.
    Str,
    /// Signed integer of the given bit width.
    Int(u8),
    /// Unsigned integer of the given bit width.
    Uint(u8),
    /// Floating point of the given bit width.
    Float(u8),
    /// Boolean.
    Bool,
    /// An optional value; an empty cell maps to `None`.
    Optional,
    /// A separator-joined list.
    List,
    /// A user-defined conversion.
    Custom,
}

/// A failed conversion between a CSV field and a typed value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValueError {
    target: &'static str,
    kind: ValueErrorKind,
}

/// The category of a [`ValueError`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ValueErrorKind {
    /// The bytes do not parse as the target type.
    Syntax,
    /// The value parses but does not fit the target width.
    Overflow,
    /// The bytes are not valid UTF-8.
    Utf8,
    /// A user-defined conversion failed.
    Message(String),
}

impl ValueError {
    pub(crate) fn syntax(target: &'static str) -> ValueError {
        ValueError { target, kind: ValueErrorKind::Syntax }
    }

    pub(crate) fn overflow(target: &'static str) -> ValueError {
        ValueError { target, kind: ValueErrorKind::Overflow }
    }

    pub(crate) fn utf8(target: &'static str) -> ValueError {
        ValueError { target, kind: ValueErrorKind::Utf8 }
    }

    /// Build an error for a user-defined conversion.
    pub fn message<S: Into<String>>(
        target: &'static str,
        msg: S,
    ) -> ValueError {
        ValueError { target, kind: ValueErrorKind::Message(msg.into()) }
    }

    /// The name of the target type.
    pub fn target(&self) -> &'static str {
        self.target
    }

    /// The failure category.
    pub fn kind(&self) -> &ValueErrorKind {
        &self.kind
    }
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            ValueErrorKind::Syntax => {
                write!(f, "invalid {} value", self.target)
            }
            ValueErrorKind::Overflow => {
                write!(f, "value out of range for {}", self.target)
            }
            ValueErrorKind::Utf8 => {
                write!(f, "invalid UTF-8 in {} value", self.target)
            }
            ValueErrorKind::Message(ref msg) => {
                write!(f, "cannot convert to {}: {}", self.target, msg)
            }
        }
    }
}

impl std::error::Error for ValueError {}

/// Decoding half of the mapper's conversion surface.
///
/// Implement this (and [`FieldEncode`]) on your own types to bind them as
/// CSV fields; the built-in impls cover the primitive surface.
pub trait FieldDecode: Sized {
    /// The conversion kind, for descriptor introspection.
    const KIND: Kind = Kind::Custom;

    /// Decode a field's bytes (escapes already resolved) into a value.
    fn decode_field(raw: &[u8]) -> Result<Self, ValueError>;
}

/// Encoding half of the mapper's conversion surface.
pub trait FieldEncode {
    /// Append the field representation of `self` to `out`.
    fn encode_field(&self, out: &mut Vec<u8>);

    /// True when the value renders as nothing; `omit_empty` consults this.
    fn is_empty_field(&self) -> bool {
        false
    }
}

impl FieldDecode for String {
    const KIND: Kind = Kind::Str;

    fn decode_field(raw: &[u8]) -> Result<String, ValueError> {
        match str::from_utf8(raw) {
            Ok(s) => Ok(s.to_string()),
            Err(_) => Err(ValueError::utf8("string")),
        }
    }
}

impl FieldEncode for String {
    fn encode_field(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.as_bytes());
    }

    fn is_empty_field(&self) -> bool {
        self.is_empty()
    }
}

macro_rules! int_value {
    ($($ty:ty => $kind:ident, $name:expr;)*) => {
        $(
            impl FieldDecode for $ty {
                const KIND: Kind =
                    Kind::$kind((mem::size_of::<$ty>() * 8) as u8);

                fn decode_field(raw: &[u8]) -> Result<$ty, ValueError> {
                    if raw.is_empty() {
                        return Ok(0);
                    }
                    let s = str::from_utf8(raw)
                        .map_err(|_| ValueError::syntax($name))?;
                    s.parse::<$ty>().map_err(|err| match err.kind() {
                        IntErrorKind::PosOverflow
                        | IntErrorKind::NegOverflow => {
                            ValueError::overflow($name)
                        }
                        _ => ValueError::syntax($name),
                    })
                }
            }

            impl FieldEncode for $ty {
                fn encode_field(&self, out: &mut Vec<u8>) {
                    let mut buf = itoa::Buffer::new();
                    out.extend_from_slice(buf.format(*self).as_bytes());
                }

                fn is_empty_field(&self) -> bool {
                    *self == 0
                }
            }
        )*
    };
}

int_value! {
    i8 => Int, "i8";
    i16 => Int, "i16";
    i32 => Int, "i32";
    i64 => Int, "i64";
    u8 => Uint, "u8";
    u16 => Uint, "u16";
    u32 => Uint, "u32";
    u64 => Uint, "u64";
}

impl FieldDecode for f64 {
    const KIND: Kind = Kind::Float(64);

    fn decode_field(raw: &[u8]) -> Result<f64, ValueError> {
        if raw.is_empty() {
            return Ok(0.0);
        }
        let s =
            str::from_utf8(raw).map_err(|_| ValueError::syntax("f64"))?;
        s.parse::<f64>().map_err(|_| ValueError::syntax("f64"))
    }
}

impl FieldEncode for f64 {
    fn encode_field(&self, out: &mut Vec<u8>) {
        let mut buf = ryu::Buffer::new();
        out.extend_from_slice(buf.format(*self).as_bytes());
    }

    fn is_empty_field(&self) -> bool {
        *self == 0.0
    }
}

impl FieldDecode for f32 {
    const KIND: Kind = Kind::Float(32);

    fn decode_field(raw: &[u8]) -> Result<f32, ValueError> {
        let wide = f64::decode_field(raw)
            .map_err(|_| ValueError::syntax("f32"))?;
        // A finite f64 that collapses to infinity in f32 is an overflow,
        // not a round.
        if wide.is_finite() && wide.abs() > f64::from(f32::MAX) {
            return Err(ValueError::overflow("f32"));
        }
        Ok(wide as f32)
    }
}

impl FieldEncode for f32 {
    fn encode_field(&self, out: &mut Vec<u8>) {
        let mut buf = ryu::Buffer::new();
        out.extend_from_slice(buf.format(*self).as_bytes());
    }

    fn is_empty_field(&self) -> bool {
        *self == 0.0
    }
}

impl FieldDecode for bool {
    const KIND: Kind = Kind::Bool;

    fn decode_field(raw: &[u8]) -> Result<bool, ValueError> {
        if raw.is_empty() {
            return Ok(false);
        }
        const TRUE: &[&str] = &["true", "1", "t", "yes", "y", "on"];
        const FALSE: &[&str] = &["false", "0", "f", "no", "n", "off"];
        let s =
            str::from_utf8(raw).map_err(|_| ValueError::syntax("bool"))?;
        if TRUE.iter().any(|t| s.eq_ignore_ascii_case(t)) {
            return Ok(true);
        }
        if FALSE.iter().any(|t| s.eq_ignore_ascii_case(t)) {
            return Ok(false);
        }
        Err(ValueError::syntax("bool"))
    }
}

impl FieldEncode for bool {
    fn encode_field(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(if *self { b"true" } else { b"false" });
    }

    fn is_empty_field(&self) -> bool {
        !*self
    }
}

impl<V: FieldDecode> FieldDecode for Option<V> {
    const KIND: Kind = Kind::Optional;

    fn decode_field(raw: &[u8]) -> Result<Option<V>, ValueError> {
        if raw.is_empty() {
            return Ok(None);
        }
        V::decode_field(raw).map(Some)
    }
}

impl<V: FieldEncode> FieldEncode for Option<V> {
    fn encode_field(&self, out: &mut Vec<u8>) {
        if let Some(ref value) = *self {
            value.encode_field(out);
        }
    }

    fn is_empty_field(&self) -> bool {
        self.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldDecode, FieldEncode, Kind, ValueError, ValueErrorKind};

    fn encode<V: FieldEncode>(value: V) -> Vec<u8> {
        let mut out = vec![];
        value.encode_field(&mut out);
        out
    }

    #[test]
    fn string_round_trip() {
        assert_eq!(String::decode_field(b"abc").unwrap(), "abc");
        assert_eq!(encode("abc".to_string()), b"abc");
        assert!(String::decode_field(b"\xFF").is_err());
    }

    #[test]
    fn int_parses_decimal() {
        assert_eq!(i32::decode_field(b"-42").unwrap(), -42);
        assert_eq!(u8::decode_field(b"255").unwrap(), 255);
        assert_eq!(encode(-42i32), b"-42");
    }

    #[test]
    fn int_empty_is_zero() {
        assert_eq!(i64::decode_field(b"").unwrap(), 0);
        assert_eq!(u16::decode_field(b"").unwrap(), 0);
    }

    #[test]
    fn int_overflow_is_rejected() {
        let err = i8::decode_field(b"128").unwrap_err();
        assert_eq!(*err.kind(), ValueErrorKind::Overflow);
        let err = u8::decode_field(b"-1").unwrap_err();
        assert_eq!(*err.kind(), ValueErrorKind::Syntax);
        assert!(i8::decode_field(b"12a").is_err());
    }

    #[test]
    fn int_kinds_carry_width() {
        assert_eq!(i16::KIND, Kind::Int(16));
        assert_eq!(u64::KIND, Kind::Uint(64));
    }

    #[test]
    fn float_parses() {
        assert_eq!(f64::decode_field(b"1.5").unwrap(), 1.5);
        assert_eq!(f64::decode_field(b"").unwrap(), 0.0);
        assert_eq!(f32::decode_field(b"2.5").unwrap(), 2.5);
        assert_eq!(encode(1.5f64), b"1.5");
    }

    #[test]
    fn f32_overflow_is_rejected() {
        let err = f32::decode_field(b"1e300").unwrap_err();
        assert_eq!(*err.kind(), ValueErrorKind::Overflow);
    }

    #[test]
    fn bool_token_set() {
        for raw in &["true", "1", "T", "Yes", "y", "ON"] {
            assert_eq!(bool::decode_field(raw.as_bytes()).unwrap(), true);
        }
        for raw in &["false", "0", "F", "No", "n", "OFF", ""] {
            assert_eq!(bool::decode_field(raw.as_bytes()).unwrap(), false);
        }
        assert!(bool::decode_field(b"maybe").is_err());
        assert_eq!(encode(true), b"true");
        assert_eq!(encode(false), b"false");
    }

    #[test]
    fn option_maps_empty_to_none() {
        assert_eq!(Option::<i32>::decode_field(b"").unwrap(), None);
        assert_eq!(Option::<i32>::decode_field(b"7").unwrap(), Some(7));
        assert_eq!(encode(None::<i32>), b"");
        assert_eq!(encode(Some(7i32)), b"7");
        assert!(None::<i32>.is_empty_field());
        assert!(!Some(0i32).is_empty_field());
    }

    #[test]
    fn custom_message_error() {
        let err = ValueError::message("color", "unknown name");
        assert_eq!(err.target(), "color");
        assert_eq!(
            err.to_string(),
            "cannot convert to color: unknown name"
        );
    }

    #[test]
    fn empty_field_classification() {
        assert!(0i32.is_empty_field());
        assert!(!1i32.is_empty_field());
        assert!(0.0f64.is_empty_field());
        assert!(String::new().is_empty_field());
        assert!(false.is_empty_field());
        assert!(!true.is_empty_field());
    }
}
