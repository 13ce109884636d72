use crate::error::{Error, Result};
use crate::expression::condition::{Condition, ConditionSet, LogicalOperator, WhereClause};
use crate::expression::{CompiledExpression, ExpressionKind};

use aws_sdk_dynamodb::types;
use serde::Serialize;
use serde_dynamo::to_attribute_value;
use std::collections;

/// Compiler lifecycle. The tag makes "no mutation after build" a checked
/// invariant rather than a convention.
#[derive(Clone, Debug, PartialEq)]
enum State {
    Accumulating,
    Empty,
    Finalized(CompiledExpression),
}

/// Staged condition-expression compiler.
///
/// Accumulates clauses, then finalizes into an immutable
/// [`CompiledExpression`]. Every attribute name gets a fresh name placeholder
/// and every literal a fresh value placeholder from per-instance monotonic
/// counters, so no two placeholders of the same kind collide within one
/// compiled expression.
///
/// ```rust
/// use dynamodb_intent::expression::{ExpressionKind, compiler, condition};
///
/// let mut compiler = compiler::Compiler::new(ExpressionKind::Condition);
/// compiler
///     .push(condition::WhereClause::new(
///         "status",
///         condition::Condition::Equals("active".to_string()),
///     ))
///     .unwrap();
/// let compiled = compiler.build();
/// assert_eq!(compiled.expression, "#n0 = :v0");
/// ```
#[derive(Clone, Debug)]
pub struct Compiler {
    fragments: Vec<String>,
    kind: ExpressionKind,
    name_counter: usize,
    names: collections::HashMap<String, String>,
    operator: LogicalOperator,
    state: State,
    value_counter: usize,
    values: collections::HashMap<String, types::AttributeValue>,
}

impl Compiler {
    /// Empty compiler joining clauses with AND.
    pub fn new(kind: ExpressionKind) -> Self {
        Self::with_operator(kind, LogicalOperator::And)
    }

    /// Empty compiler joining clauses with the given operator.
    pub fn with_operator(kind: ExpressionKind, operator: LogicalOperator) -> Self {
        Self {
            fragments: Vec::new(),
            kind,
            name_counter: 0,
            names: collections::HashMap::new(),
            operator,
            state: State::Empty,
            value_counter: 0,
            values: collections::HashMap::new(),
        }
    }

    /// Add one clause.
    ///
    /// Fails with [`Error::ExpressionFinalized`] after [`Self::build`] has
    /// been called, and with a serialization error if the literal value has
    /// no wire form.
    pub fn push<T: Serialize>(&mut self, clause: WhereClause<T>) -> Result<()> {
        if matches!(self.state, State::Finalized(_)) {
            return Err(Error::ExpressionFinalized);
        }
        let name_placeholder = self.bind_name(clause.name);
        let fragment = self.lower(&name_placeholder, clause.condition)?;
        self.fragments.push(fragment);
        self.state = State::Accumulating;
        Ok(())
    }

    /// Add a whole condition set, adopting its operator.
    pub fn push_set<T: Serialize>(&mut self, set: ConditionSet<T>) -> Result<()> {
        self.operator = set.operator;
        for clause in set.clauses {
            self.push(clause)?;
        }
        Ok(())
    }

    /// Finalize into an immutable compiled expression.
    ///
    /// An empty compiler builds the empty no-op expression. Repeated calls
    /// return structurally identical output; pushing afterwards is an error.
    pub fn build(&mut self) -> CompiledExpression {
        if let State::Finalized(compiled) = &self.state {
            return compiled.clone();
        }
        let compiled = CompiledExpression {
            attribute_names: std::mem::take(&mut self.names),
            attribute_values: std::mem::take(&mut self.values),
            expression: std::mem::take(&mut self.fragments).join(&*self.operator),
        };
        self.state = State::Finalized(compiled.clone());
        compiled
    }

    fn bind_name(&mut self, name: String) -> String {
        let placeholder = format!("{}{}", self.kind.name_prefix(), self.name_counter);
        self.name_counter += 1;
        self.names.insert(placeholder.clone(), name);
        placeholder
    }

    fn bind_value<T: Serialize>(&mut self, value: T) -> Result<String> {
        let value = to_attribute_value(value)?;
        Ok(self.bind_wire_value(value))
    }

    fn bind_wire_value(&mut self, value: types::AttributeValue) -> String {
        let placeholder = format!("{}{}", self.kind.value_prefix(), self.value_counter);
        self.value_counter += 1;
        self.values.insert(placeholder.clone(), value);
        placeholder
    }

    fn lower<T: Serialize>(&mut self, name: &str, condition: Condition<T>) -> Result<String> {
        let fragment = match condition {
            Condition::BeginsWith(prefix) => {
                let value = self.bind_wire_value(types::AttributeValue::S(prefix));
                format!("begins_with({name}, {value})")
            }
            Condition::Between(lower, upper) => {
                let lower = self.bind_value(lower)?;
                let upper = self.bind_value(upper)?;
                format!("{name} BETWEEN {lower} AND {upper}")
            }
            Condition::Contains(value) => {
                let value = self.bind_value(value)?;
                format!("contains({name}, {value})")
            }
            Condition::Equals(value) => {
                let value = self.bind_value(value)?;
                format!("{name} = {value}")
            }
            Condition::Exists => format!("attribute_exists({name})"),
            Condition::GreaterThan(value) => {
                let value = self.bind_value(value)?;
                format!("{name} > {value}")
            }
            Condition::GreaterThanOrEqual(value) => {
                let value = self.bind_value(value)?;
                format!("{name} >= {value}")
            }
            Condition::In(values) if values.is_empty() => {
                // an empty IN list matches nothing
                format!("(attribute_exists({name}) AND attribute_not_exists({name}))")
            }
            Condition::In(values) => {
                let mut placeholders = Vec::with_capacity(values.len());
                for value in values {
                    placeholders.push(self.bind_value(value)?);
                }
                format!("{name} IN ({})", placeholders.join(", "))
            }
            Condition::LessThan(value) => {
                let value = self.bind_value(value)?;
                format!("{name} < {value}")
            }
            Condition::LessThanOrEqual(value) => {
                let value = self.bind_value(value)?;
                format!("{name} <= {value}")
            }
            Condition::NotEqual(value) => {
                let value = self.bind_value(value)?;
                format!("{name} <> {value}")
            }
            Condition::NotExists => format!("attribute_not_exists({name})"),
            Condition::OfType(attribute_type) => {
                let value = self.bind_wire_value(types::AttributeValue::S(
                    attribute_type.code().to_string(),
                ));
                format!("attribute_type({name}, {value})")
            }
        };
        Ok(fragment)
    }
}
