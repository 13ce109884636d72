use indexmap::IndexMap;
use std::fmt;

/// Exact-precision decimal number.
///
/// DynamoDB numbers travel as strings to avoid binary floating-point
/// precision loss; this wrapper keeps that invariant on the native side too.
///
/// ```rust
/// use dynamodb_intent::value::Number;
///
/// let n = Number::from(42_u64);
/// assert_eq!(n.as_str(), "42");
/// ```
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Number(String);

impl Number {
    /// Wrap an already-rendered decimal string.
    ///
    /// The string is stored as-is; no normalization is applied, so the same
    /// input always yields the same wire form.
    pub fn new(repr: impl Into<String>) -> Self {
        Self(repr.into())
    }

    /// Build a number from a float, if it has a decimal form.
    ///
    /// Returns `None` for NaN and infinities, which have no DynamoDB number
    /// representation.
    pub fn from_f64(value: f64) -> Option<Self> {
        value.is_finite().then(|| Self(value.to_string()))
    }

    /// The decimal string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the decimal string form.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! impl_number_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Number {
                fn from(value: $ty) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

impl_number_from_integer!(i8, i16, i32, i64, i128, u8, u16, u32, u64, u128);

/// Native value, the pre-marshalling side of the attribute codec.
///
/// A closed tagged union over every value kind the wire format can carry.
/// Exactly one variant is populated; sets are semantically unordered and must
/// be non-empty and homogeneous to keep their set form on the wire (an empty
/// set degrades to a list, see [`crate::codec::marshal`]).
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Binary blob.
    Binary(Vec<u8>),
    /// Set of binary blobs.
    BinarySet(Vec<Vec<u8>>),
    /// Boolean.
    Bool(bool),
    /// Ordered list of values.
    List(Vec<Value>),
    /// String-keyed map of values.
    Map(IndexMap<String, Value>),
    /// Null marker.
    Null,
    /// Exact-precision decimal number.
    Number(Number),
    /// Set of numbers.
    NumberSet(Vec<Number>),
    /// UTF-8 string.
    String(String),
    /// Set of strings.
    StringSet(Vec<String>),
}

impl Value {
    /// Wire type descriptor of this value kind (`"S"`, `"N"`, `"BOOL"`, ...).
    pub fn type_descriptor(&self) -> &'static str {
        match self {
            Self::Binary(_) => "B",
            Self::BinarySet(_) => "BS",
            Self::Bool(_) => "BOOL",
            Self::List(_) => "L",
            Self::Map(_) => "M",
            Self::Null => "NULL",
            Self::Number(_) => "N",
            Self::NumberSet(_) => "NS",
            Self::String(_) => "S",
            Self::StringSet(_) => "SS",
        }
    }

    /// The string content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// The number content, if this is a number.
    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Self::Number(value) => Some(value),
            _ => None,
        }
    }

    /// The map content, if this is a map.
    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Map(value) => Some(value),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Self::Number(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Binary(value)
    }
}

macro_rules! impl_value_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::Number(Number::from(value))
                }
            }
        )*
    };
}

impl_value_from_integer!(i8, i16, i32, i64, i128, u8, u16, u32, u64, u128);

impl From<f64> for Value {
    /// Finite floats become numbers; NaN and infinities have no wire number
    /// form and coerce to their string rendering instead of erroring.
    fn from(value: f64) -> Self {
        match Number::from_f64(value) {
            Some(number) => Self::Number(number),
            None => {
                tracing::warn!(value, "non-finite float coerced to string");
                Self::String(value.to_string())
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(value) => Self::Bool(value),
            serde_json::Value::Number(value) => Self::Number(Number::new(value.to_string())),
            serde_json::Value::String(value) => Self::String(value),
            serde_json::Value::Array(values) => {
                Self::List(values.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

/// String-keyed map of native values, the unit of storage and retrieval.
pub type Item = IndexMap<String, Value>;
