//! Value Module
//!
//! Tagged payload stored in cache items, with the numeric arithmetic used by
//! increment and decrement.

use serde::{Deserialize, Serialize};

// == Value ==
/// A cached payload.
///
/// Numeric variants keep their native width so that increments wrap the way
/// the native type would. Non-numeric payloads are opaque to the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Value {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
    F32(#[serde(with = "f32_repr")] f32),
    F64(#[serde(with = "f64_repr")] f64),
    Bool(bool),
    Str(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
}

// == Float Encoding ==
// JSON has no NaN or infinity, so non-finite floats are written as their
// display strings ("NaN", "inf", "-inf") and parsed back on read.
macro_rules! float_repr {
    ($module:ident, $t:ty) => {
        mod $module {
            use serde::de::Error as _;
            use serde::{Deserialize, Deserializer, Serialize, Serializer};

            #[derive(Deserialize)]
            #[serde(untagged)]
            enum Repr {
                Number($t),
                Text(String),
            }

            pub fn serialize<S: Serializer>(value: &$t, serializer: S) -> Result<S::Ok, S::Error> {
                if value.is_finite() {
                    value.serialize(serializer)
                } else {
                    serializer.serialize_str(&value.to_string())
                }
            }

            pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<$t, D::Error> {
                match Repr::deserialize(deserializer)? {
                    Repr::Number(value) => Ok(value),
                    Repr::Text(text) => text
                        .parse()
                        .map_err(|_| D::Error::custom(format!("invalid float: {}", text))),
                }
            }
        }
    };
}

float_repr!(f32_repr, f32);
float_repr!(f64_repr, f64);

/// Which way a numeric mutation moves the stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increment,
    Decrement,
}

macro_rules! offset_int {
    ($v:expr, $t:ty, $delta:expr, $direction:expr) => {
        *$v = match $direction {
            Direction::Increment => $v.wrapping_add($delta as $t),
            Direction::Decrement => $v.wrapping_sub($delta as $t),
        }
    };
}

macro_rules! offset_float {
    ($v:expr, $t:ty, $delta:expr, $direction:expr) => {
        *$v = match $direction {
            Direction::Increment => *$v + $delta as $t,
            Direction::Decrement => *$v - $delta as $t,
        }
    };
}

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::Isize(_) => "isize",
            Value::U8(_) => "u8",
            Value::U16(_) => "u16",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::Usize(_) => "usize",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Bool(_) => "bool",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::Json(_) => "json",
        }
    }

    /// Returns true for integer and floating point variants.
    pub fn is_numeric(&self) -> bool {
        !matches!(
            self,
            Value::Bool(_) | Value::Str(_) | Value::Bytes(_) | Value::Json(_)
        )
    }

    // == Integer Delta ==
    /// Applies an integer delta to any numeric variant.
    ///
    /// The delta is truncated to the stored width and the result wraps on
    /// overflow. Floats receive the delta converted to their width. Returns
    /// false, leaving the value untouched, for non-numeric variants.
    pub(crate) fn offset_by_int(&mut self, delta: i64, direction: Direction) -> bool {
        match self {
            Value::I8(v) => offset_int!(v, i8, delta, direction),
            Value::I16(v) => offset_int!(v, i16, delta, direction),
            Value::I32(v) => offset_int!(v, i32, delta, direction),
            Value::I64(v) => offset_int!(v, i64, delta, direction),
            Value::Isize(v) => offset_int!(v, isize, delta, direction),
            Value::U8(v) => offset_int!(v, u8, delta, direction),
            Value::U16(v) => offset_int!(v, u16, delta, direction),
            Value::U32(v) => offset_int!(v, u32, delta, direction),
            Value::U64(v) => offset_int!(v, u64, delta, direction),
            Value::Usize(v) => offset_int!(v, usize, delta, direction),
            Value::F32(v) => offset_float!(v, f32, delta, direction),
            Value::F64(v) => offset_float!(v, f64, delta, direction),
            _ => return false,
        }
        true
    }

    // == Float Delta ==
    /// Applies a floating point delta; only `F32` and `F64` accept it.
    pub(crate) fn offset_by_float(&mut self, delta: f64, direction: Direction) -> bool {
        match self {
            Value::F32(v) => offset_float!(v, f32, delta, direction),
            Value::F64(v) => offset_float!(v, f64, delta, direction),
            _ => return false,
        }
        true
    }
}

// == Numeric Trait ==
/// Native numeric types that map onto exactly one `Value` variant.
///
/// Used by the typed `increment_by` / `decrement_by` operations, which only
/// accept a stored value of the same kind as the delta.
pub trait Numeric: Copy + Into<Value> {
    /// Extracts `Self` if the value is exactly this kind.
    fn from_value(value: &Value) -> Option<Self>;

    /// Combines `self` with `delta` using the type's native arithmetic.
    fn offset(self, delta: Self, direction: Direction) -> Self;
}

macro_rules! impl_numeric_int {
    ($($t:ty => $variant:ident),* $(,)?) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::$variant(v)
            }
        }

        impl Numeric for $t {
            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(*v),
                    _ => None,
                }
            }

            fn offset(self, delta: Self, direction: Direction) -> Self {
                match direction {
                    Direction::Increment => self.wrapping_add(delta),
                    Direction::Decrement => self.wrapping_sub(delta),
                }
            }
        }
    )*};
}

macro_rules! impl_numeric_float {
    ($($t:ty => $variant:ident),* $(,)?) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::$variant(v)
            }
        }

        impl Numeric for $t {
            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(*v),
                    _ => None,
                }
            }

            fn offset(self, delta: Self, direction: Direction) -> Self {
                match direction {
                    Direction::Increment => self + delta,
                    Direction::Decrement => self - delta,
                }
            }
        }
    )*};
}

impl_numeric_int! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
}

impl_numeric_float! {
    f32 => F32,
    f64 => F64,
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}
