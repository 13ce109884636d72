//! Bidirectional mapping between native values and the wire tagged union.
//!
//! Marshalling is total: every [`Value`] has a wire form, and values with no
//! exact counterpart degrade to a documented best-effort representation
//! instead of erroring. DynamoDB disallows empty sets, so an empty set
//! marshals to an empty list; this is the one representable case where
//! `unmarshal(marshal(v))` does not return `v` unchanged.

use crate::value::{Item, Number, Value};

use aws_sdk_dynamodb::{primitives::Blob, types};
use std::collections;

/// Marshal a native value into its wire representation.
///
/// ```rust
/// use aws_sdk_dynamodb::types;
/// use dynamodb_intent::{codec, value};
///
/// let wire = codec::marshal(value::Value::from(18_u64));
/// assert_eq!(wire, types::AttributeValue::N("18".to_string()));
/// ```
pub fn marshal(value: Value) -> types::AttributeValue {
    match value {
        Value::Binary(bytes) => types::AttributeValue::B(Blob::new(bytes)),
        Value::BinarySet(set) if set.is_empty() => empty_set_fallback("BS"),
        Value::BinarySet(set) => {
            types::AttributeValue::Bs(set.into_iter().map(Blob::new).collect())
        }
        Value::Bool(value) => types::AttributeValue::Bool(value),
        Value::List(values) => {
            types::AttributeValue::L(values.into_iter().map(marshal).collect())
        }
        Value::Map(map) => types::AttributeValue::M(
            map.into_iter()
                .map(|(key, value)| (key, marshal(value)))
                .collect(),
        ),
        Value::Null => types::AttributeValue::Null(true),
        Value::Number(number) => types::AttributeValue::N(number.into_string()),
        Value::NumberSet(set) if set.is_empty() => empty_set_fallback("NS"),
        Value::NumberSet(set) => {
            types::AttributeValue::Ns(set.into_iter().map(Number::into_string).collect())
        }
        Value::String(value) => types::AttributeValue::S(value),
        Value::StringSet(set) if set.is_empty() => empty_set_fallback("SS"),
        Value::StringSet(set) => types::AttributeValue::Ss(set),
    }
}

fn empty_set_fallback(kind: &'static str) -> types::AttributeValue {
    tracing::warn!(kind, "empty set marshalled as empty list");
    types::AttributeValue::L(Vec::new())
}

/// Marshal an item map, attribute by attribute.
pub fn marshal_item(item: Item) -> collections::HashMap<String, types::AttributeValue> {
    item.into_iter()
        .map(|(name, value)| (name, marshal(value)))
        .collect()
}

/// Unmarshal a wire value back into its native form.
///
/// Total: wire variants this crate does not model degrade to their debug
/// rendering as a string rather than erroring.
pub fn unmarshal(value: types::AttributeValue) -> Value {
    match value {
        types::AttributeValue::B(blob) => Value::Binary(blob.into_inner()),
        types::AttributeValue::Bool(value) => Value::Bool(value),
        types::AttributeValue::Bs(set) => {
            Value::BinarySet(set.into_iter().map(Blob::into_inner).collect())
        }
        types::AttributeValue::L(values) => {
            Value::List(values.into_iter().map(unmarshal).collect())
        }
        types::AttributeValue::M(map) => Value::Map(
            map.into_iter()
                .map(|(key, value)| (key, unmarshal(value)))
                .collect(),
        ),
        types::AttributeValue::N(number) => Value::Number(Number::new(number)),
        types::AttributeValue::Ns(set) => {
            Value::NumberSet(set.into_iter().map(Number::new).collect())
        }
        types::AttributeValue::Null(_) => Value::Null,
        types::AttributeValue::S(value) => Value::String(value),
        types::AttributeValue::Ss(set) => Value::StringSet(set),
        other => {
            tracing::warn!(?other, "unmodeled wire variant coerced to string");
            Value::String(format!("{other:?}"))
        }
    }
}

/// Unmarshal an item map, attribute by attribute.
pub fn unmarshal_item(item: collections::HashMap<String, types::AttributeValue>) -> Item {
    item.into_iter()
        .map(|(name, value)| (name, unmarshal(value)))
        .collect()
}
