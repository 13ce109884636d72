use crate::error::{Error, Result};
use crate::expression::{CompiledExpression, ExpressionKind};

use aws_sdk_dynamodb::types;
use serde::Serialize;
use serde_dynamo::to_attribute_value;
use std::collections;

/// Separator for attribute path components.
const PATH_SEPARATOR: &str = ".";

/// SET clause action on one attribute path.
///
/// ```rust
/// use dynamodb_intent::expression::update;
///
/// let assign = update::SetAction::Assign("Jane".to_string());
/// let bump = update::SetAction::Increment(1);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum SetAction<T> {
    /// Assign a new value, replacing any existing one.
    Assign(T),
    /// Decrement a numeric attribute by the value.
    Decrement(T),
    /// Assign the value only if the attribute does not yet exist.
    IfNotExists(T),
    /// Increment a numeric attribute by the value.
    Increment(T),
    /// Append the value to the end of a list attribute.
    ListAppend(T),
    /// Prepend the value to the beginning of a list attribute.
    ListPrepend(T),
}

impl<T> SetAction<T> {
    fn lower(self, path: &str, placeholder: &str) -> (T, String) {
        match self {
            Self::Assign(value) => (value, format!("{path} = {placeholder}")),
            Self::Decrement(value) => (value, format!("{path} = {path} - {placeholder}")),
            Self::IfNotExists(value) => {
                (value, format!("{path} = if_not_exists({path}, {placeholder})"))
            }
            Self::Increment(value) => (value, format!("{path} = {path} + {placeholder}")),
            Self::ListAppend(value) => {
                (value, format!("{path} = list_append({path}, {placeholder})"))
            }
            Self::ListPrepend(value) => {
                (value, format!("{path} = list_append({placeholder}, {path})"))
            }
        }
    }
}

/// Structured update: four independent clause sets compiled in the fixed
/// keyword order SET, REMOVE, ADD, DELETE.
///
/// An attribute path may appear in at most one clause set. A spec with no
/// clauses at all compiles to the empty expression, which the write layer
/// rejects as [`Error::EmptyUpdate`] before any request is assembled.
///
/// ```rust
/// use dynamodb_intent::expression::update;
///
/// let spec = update::UpdateSpec::default()
///     .set("name", update::SetAction::Assign("Jane".to_string()))
///     .remove("legacy_flag");
/// let compiled = spec.compile().unwrap();
/// assert_eq!(compiled.expression, "SET #u0 = :u0 REMOVE #u1");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateSpec<T> {
    /// ADD clauses: numeric delta or set union per path.
    pub add: Vec<(String, T)>,
    /// DELETE clauses: set difference per path.
    pub delete: Vec<(String, T)>,
    /// REMOVE clauses: attribute paths to drop.
    pub remove: Vec<String>,
    /// SET clauses: action per path.
    pub set: Vec<(String, SetAction<T>)>,
}

impl<T> Default for UpdateSpec<T> {
    fn default() -> Self {
        Self {
            add: Vec::new(),
            delete: Vec::new(),
            remove: Vec::new(),
            set: Vec::new(),
        }
    }
}

impl<T> UpdateSpec<T> {
    /// Append a SET clause.
    pub fn set(mut self, path: impl Into<String>, action: SetAction<T>) -> Self {
        self.set.push((path.into(), action));
        self
    }

    /// Append a REMOVE clause.
    pub fn remove(mut self, path: impl Into<String>) -> Self {
        self.remove.push(path.into());
        self
    }

    /// Append an ADD clause.
    pub fn add(mut self, path: impl Into<String>, value: T) -> Self {
        self.add.push((path.into(), value));
        self
    }

    /// Append a DELETE clause.
    pub fn delete(mut self, path: impl Into<String>, value: T) -> Self {
        self.delete.push((path.into(), value));
        self
    }

    /// Whether every clause set is empty.
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.delete.is_empty() && self.remove.is_empty() && self.set.is_empty()
    }

    fn check_unique_paths(&self) -> Result<()> {
        let mut seen = collections::HashSet::new();
        let paths = self
            .set
            .iter()
            .map(|(path, _)| path)
            .chain(self.remove.iter())
            .chain(self.add.iter().map(|(path, _)| path))
            .chain(self.delete.iter().map(|(path, _)| path));
        for path in paths {
            if !seen.insert(path.as_str()) {
                return Err(Error::DuplicateUpdatePath { path: path.clone() });
            }
        }
        Ok(())
    }
}

/// Placeholder allocator shared by the four clause compilers.
#[derive(Default)]
struct Bindings {
    name_counter: usize,
    names: collections::HashMap<String, String>,
    value_counter: usize,
    values: collections::HashMap<String, types::AttributeValue>,
}

impl Bindings {
    /// Placeholder each component of a dotted path, returning the joined form.
    fn bind_path(&mut self, path: &str) -> String {
        let placeholders: Vec<_> = path
            .split(PATH_SEPARATOR)
            .map(|component| {
                let placeholder = format!(
                    "{}{}",
                    ExpressionKind::Update.name_prefix(),
                    self.name_counter
                );
                self.name_counter += 1;
                self.names
                    .insert(placeholder.clone(), component.to_string());
                placeholder
            })
            .collect();
        placeholders.join(PATH_SEPARATOR)
    }

    fn next_value_placeholder(&mut self) -> String {
        let placeholder = format!(
            "{}{}",
            ExpressionKind::Update.value_prefix(),
            self.value_counter
        );
        self.value_counter += 1;
        placeholder
    }

    fn bind_value<T: Serialize>(&mut self, value: T) -> Result<String> {
        let value = to_attribute_value(value)?;
        let placeholder = self.next_value_placeholder();
        self.values.insert(placeholder.clone(), value);
        Ok(placeholder)
    }
}

impl<T: Serialize> UpdateSpec<T> {
    /// Compile into an update expression.
    ///
    /// Deterministic: clause kinds appear in the fixed order SET, REMOVE,
    /// ADD, DELETE, each keyword at most once.
    pub fn compile(self) -> Result<CompiledExpression> {
        self.check_unique_paths()?;
        let mut bindings = Bindings::default();
        let mut sections = Vec::with_capacity(4);
        if !self.set.is_empty() {
            let mut fragments = Vec::with_capacity(self.set.len());
            for (path, action) in self.set {
                let path = bindings.bind_path(&path);
                let placeholder = bindings.next_value_placeholder();
                let (value, fragment) = action.lower(&path, &placeholder);
                let value = to_attribute_value(value)?;
                bindings.values.insert(placeholder, value);
                fragments.push(fragment);
            }
            sections.push(format!("SET {}", fragments.join(", ")));
        }
        if !self.remove.is_empty() {
            let fragments: Vec<_> = self
                .remove
                .into_iter()
                .map(|path| bindings.bind_path(&path))
                .collect();
            sections.push(format!("REMOVE {}", fragments.join(", ")));
        }
        if !self.add.is_empty() {
            let mut fragments = Vec::with_capacity(self.add.len());
            for (path, value) in self.add {
                let path = bindings.bind_path(&path);
                let placeholder = bindings.bind_value(value)?;
                fragments.push(format!("{path} {placeholder}"));
            }
            sections.push(format!("ADD {}", fragments.join(", ")));
        }
        if !self.delete.is_empty() {
            let mut fragments = Vec::with_capacity(self.delete.len());
            for (path, value) in self.delete {
                let path = bindings.bind_path(&path);
                let placeholder = bindings.bind_value(value)?;
                fragments.push(format!("{path} {placeholder}"));
            }
            sections.push(format!("DELETE {}", fragments.join(", ")));
        }
        Ok(CompiledExpression {
            attribute_names: bindings.names,
            attribute_values: bindings.values,
            expression: sections.join(" "),
        })
    }
}
