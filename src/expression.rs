//! Compilation of structured predicates and updates into DynamoDB's
//! expression language.
//!
//! Every attribute name and literal value is replaced by a placeholder, which
//! uniformly sidesteps reserved-word restrictions without consulting the
//! reserved-word table on the compile path. Placeholders are counter-based
//! and namespaced per [`ExpressionKind`], so expressions compiled by
//! independent compilers merge into one request without collisions.

/// Staged condition compiler.
pub mod compiler;

/// Condition operators and clauses.
pub mod condition;

/// Projection expression building.
pub mod projection;

/// The DynamoDB reserved-keyword table.
pub mod reserved;

/// Update expression building.
pub mod update;

use aws_sdk_dynamodb::types;
use std::collections;

/// Which expression slot of a request a compiler targets.
///
/// Each kind owns a distinct placeholder namespace; merging expressions of
/// different kinds into one request can therefore never collide.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExpressionKind {
    /// Condition expression on a write.
    Condition,
    /// Filter expression on a query or scan.
    Filter,
    /// Key condition expression on a query.
    KeyCondition,
    /// Projection expression.
    Projection,
    /// Update expression.
    Update,
}

impl ExpressionKind {
    pub(crate) fn name_prefix(self) -> &'static str {
        match self {
            Self::Condition => "#n",
            Self::Filter => "#f",
            Self::KeyCondition => "#k",
            Self::Projection => "#p",
            Self::Update => "#u",
        }
    }

    pub(crate) fn value_prefix(self) -> &'static str {
        match self {
            Self::Condition => ":v",
            Self::Filter => ":f",
            Self::KeyCondition => ":k",
            Self::Projection => ":p",
            Self::Update => ":u",
        }
    }
}

/// A compiled expression: the expression string plus the two placeholder maps
/// it references.
///
/// Every placeholder appearing in `expression` has a corresponding entry in
/// `attribute_names` or `attribute_values`; placeholders are unique within
/// one compiled expression.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompiledExpression {
    /// Name placeholder to real attribute name.
    pub attribute_names: collections::HashMap<String, String>,
    /// Value placeholder to wire-format literal value.
    pub attribute_values: collections::HashMap<String, types::AttributeValue>,
    /// The expression string, referencing only placeholders.
    pub expression: String,
}

impl CompiledExpression {
    /// Whether this compiled to an empty expression (a no-op).
    pub fn is_empty(&self) -> bool {
        self.expression.is_empty()
    }

    /// Fold independently compiled expressions into the shared placeholder
    /// maps of a request, returning the expression string.
    ///
    /// Safe only across distinct [`ExpressionKind`] namespaces.
    pub(crate) fn merge_into(
        self,
        names: &mut Option<collections::HashMap<String, String>>,
        values: &mut Option<collections::HashMap<String, types::AttributeValue>>,
    ) -> String {
        if !self.attribute_names.is_empty() {
            names
                .get_or_insert_with(collections::HashMap::new)
                .extend(self.attribute_names);
        }
        if !self.attribute_values.is_empty() {
            values
                .get_or_insert_with(collections::HashMap::new)
                .extend(self.attribute_values);
        }
        self.expression
    }
}
