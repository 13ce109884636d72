//! Composite key derivation for single-table layouts.
//!
//! Keys are built by concatenating literal segment prefixes and item
//! attribute values (`"USER#" + id`), never by hashing, so range queries on a
//! sort-key prefix stay possible. Derivation is pure and deterministic.

use crate::codec;
use crate::error::{Error, Result};
use crate::value::{Item, Value};

use aws_sdk_dynamodb::types;
use indexmap::IndexMap;
use std::{collections, fmt};

/// One piece of a composite key string.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Segment {
    /// Item attribute whose value is spliced in.
    Attribute(String),
    /// Fixed text copied verbatim.
    Literal(String),
}

impl Segment {
    /// Literal segment from anything string-like.
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    /// Attribute segment from anything string-like.
    pub fn attribute(name: impl Into<String>) -> Self {
        Self::Attribute(name.into())
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attribute(name) => write!(f, "{{{name}}}"),
            Self::Literal(text) => f.write_str(text),
        }
    }
}

/// Mapping from item attributes to one physical key attribute.
///
/// ```rust
/// use dynamodb_intent::key;
///
/// let spec = key::KeySpec {
///     attribute: "pk".to_string(),
///     segments: vec![
///         key::Segment::literal("USER#"),
///         key::Segment::attribute("id"),
///     ],
/// };
/// assert_eq!(spec.to_string(), "USER#{id}");
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeySpec {
    /// Physical attribute the derived string is stored under.
    pub attribute: String,
    /// Segments concatenated, in order, to form the key string.
    pub segments: Vec<Segment>,
}

impl fmt::Display for KeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            segment.fmt(f)?;
        }
        Ok(())
    }
}

impl KeySpec {
    pub(crate) fn render(&self, attributes: &Item) -> Result<String> {
        let mut rendered = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Attribute(name) => {
                    let value =
                        attributes
                            .get(name)
                            .ok_or_else(|| Error::MissingKeyAttribute {
                                attribute: name.clone(),
                                pattern: self.to_string(),
                            })?;
                    match value {
                        Value::String(text) => rendered.push_str(text),
                        Value::Number(number) => rendered.push_str(number.as_str()),
                        other => {
                            return Err(Error::UnsupportedKeyAttribute {
                                attribute: name.clone(),
                                kind: other.type_descriptor(),
                            });
                        }
                    }
                }
            }
        }
        Ok(rendered)
    }
}

/// Partition and optional sort key mapping for one table or index.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyPattern {
    /// Partition key specification (required).
    pub partition: KeySpec,
    /// Sort key specification, for composite primary keys.
    pub sort: Option<KeySpec>,
}

/// Single derived partition/sort key pair.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DerivedKey {
    /// The derived partition key string.
    pub partition_key: String,
    /// The derived sort key string, when the pattern has one.
    pub sort_key: Option<String>,
}

/// Per-entity-type key configuration: the table key pattern plus zero or more
/// secondary-index key patterns, keyed by index name.
///
/// Constructed once at startup and reused; derivation itself allocates only
/// the output strings.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EntityPattern {
    /// Primary key pattern for the table itself.
    pub key: KeyPattern,
    /// Secondary-index key patterns, keyed by index name.
    pub indexes: IndexMap<String, KeyPattern>,
}

/// Every key derived for one item: the primary key plus whichever index keys
/// the item's attributes could populate.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DerivedKeys {
    /// The derived primary partition key.
    pub partition_key: String,
    /// The derived primary sort key, when the pattern has one.
    pub sort_key: Option<String>,
    /// Derived secondary-index keys, keyed by index name.
    pub index_keys: IndexMap<String, DerivedKey>,
}

impl EntityPattern {
    /// Entity with a primary key pattern and no secondary indexes.
    pub fn new(key: KeyPattern) -> Self {
        Self {
            key,
            indexes: IndexMap::new(),
        }
    }

    /// Derive every key for `attributes`.
    ///
    /// The primary key is mandatory: a missing or non-scalar attribute fails
    /// with an error naming the attribute and the pattern, before any request
    /// is assembled. Index keys are sparse — an index whose attributes are
    /// absent is skipped, not an error.
    pub fn derive_keys(&self, attributes: &Item) -> Result<DerivedKeys> {
        let partition_key = self.key.partition.render(attributes)?;
        let sort_key = match &self.key.sort {
            Some(spec) => Some(spec.render(attributes)?),
            None => None,
        };
        let mut index_keys = IndexMap::with_capacity(self.indexes.len());
        for (name, pattern) in &self.indexes {
            let partition_key = match pattern.partition.render(attributes) {
                Ok(rendered) => rendered,
                Err(Error::MissingKeyAttribute { .. }) => continue,
                Err(error) => return Err(error),
            };
            let sort_key = match &pattern.sort {
                Some(spec) => match spec.render(attributes) {
                    Ok(rendered) => Some(rendered),
                    Err(Error::MissingKeyAttribute { .. }) => continue,
                    Err(error) => return Err(error),
                },
                None => None,
            };
            index_keys.insert(
                name.clone(),
                DerivedKey {
                    partition_key,
                    sort_key,
                },
            );
        }
        Ok(DerivedKeys {
            partition_key,
            sort_key,
            index_keys,
        })
    }

    /// Derive the primary key and marshal it into the wire key map.
    pub fn key_attribute_map(
        &self,
        attributes: &Item,
    ) -> Result<collections::HashMap<String, types::AttributeValue>> {
        let derived = self.derive_keys(attributes)?;
        let mut map = collections::HashMap::from([(
            self.key.partition.attribute.clone(),
            codec::marshal(Value::String(derived.partition_key)),
        )]);
        if let (Some(spec), Some(sort_key)) = (&self.key.sort, derived.sort_key) {
            map.insert(
                spec.attribute.clone(),
                codec::marshal(Value::String(sort_key)),
            );
        }
        Ok(map)
    }

    /// Stamp the derived primary and index key attributes into `item`.
    ///
    /// Used on the put path so a stored item always carries the attributes
    /// its keys were derived from plus the derived key columns themselves.
    pub fn stamp(&self, item: &mut Item) -> Result<()> {
        let derived = self.derive_keys(item)?;
        item.insert(
            self.key.partition.attribute.clone(),
            Value::String(derived.partition_key),
        );
        if let (Some(spec), Some(sort_key)) = (&self.key.sort, derived.sort_key) {
            item.insert(spec.attribute.clone(), Value::String(sort_key));
        }
        for (name, keys) in derived.index_keys {
            let pattern = &self.indexes[&name];
            item.insert(
                pattern.partition.attribute.clone(),
                Value::String(keys.partition_key),
            );
            if let (Some(spec), Some(sort_key)) = (&pattern.sort, keys.sort_key) {
                item.insert(spec.attribute.clone(), Value::String(sort_key));
            }
        }
        Ok(())
    }
}
