use std::ops;

/// Logical operator joining the clauses of one compiled expression.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LogicalOperator {
    /// Logical AND - all clauses must hold.
    #[default]
    And,
    /// Logical OR - at least one clause must hold.
    Or,
}

impl ops::Deref for LogicalOperator {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }
}

/// Wire type tested by an `attribute_type` condition.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AttributeType {
    /// Binary.
    Binary,
    /// Binary set.
    BinarySet,
    /// Boolean.
    Bool,
    /// List.
    List,
    /// Map.
    Map,
    /// Null.
    Null,
    /// Number.
    Number,
    /// Number set.
    NumberSet,
    /// String.
    String,
    /// String set.
    StringSet,
}

impl AttributeType {
    /// The single-letter (or two-letter) wire type code.
    pub fn code(self) -> &'static str {
        match self {
            Self::Binary => "B",
            Self::BinarySet => "BS",
            Self::Bool => "BOOL",
            Self::List => "L",
            Self::Map => "M",
            Self::Null => "NULL",
            Self::Number => "N",
            Self::NumberSet => "NS",
            Self::String => "S",
            Self::StringSet => "SS",
        }
    }
}

/// Condition applied to one attribute.
///
/// ```rust
/// use dynamodb_intent::expression::condition;
///
/// let eq = condition::Condition::Equals("active".to_string());
/// let range = condition::Condition::Between(18, 65);
/// let present: condition::Condition<String> = condition::Condition::Exists;
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Condition<T> {
    /// The attribute begins with the given prefix (string attributes only).
    BeginsWith(String),
    /// The attribute is between the two values, inclusive.
    Between(T, T),
    /// The attribute contains the given value.
    Contains(T),
    /// The attribute equals the given value.
    Equals(T),
    /// The attribute exists on the item.
    Exists,
    /// The attribute is greater than the given value.
    GreaterThan(T),
    /// The attribute is greater than or equal to the given value.
    GreaterThanOrEqual(T),
    /// The attribute equals one of the given values.
    ///
    /// An empty list compiles to a trivially false expression, not an error.
    In(Vec<T>),
    /// The attribute is less than the given value.
    LessThan(T),
    /// The attribute is less than or equal to the given value.
    LessThanOrEqual(T),
    /// The attribute does not equal the given value.
    NotEqual(T),
    /// The attribute does not exist on the item.
    NotExists,
    /// The attribute's wire type matches the given type code.
    OfType(AttributeType),
}

/// A condition bound to the attribute it applies to.
#[derive(Clone, Debug, PartialEq)]
pub struct WhereClause<T> {
    /// The condition to apply.
    pub condition: Condition<T>,
    /// The attribute name the condition applies to.
    pub name: String,
}

impl<T> WhereClause<T> {
    /// Bind `condition` to the attribute `name`.
    pub fn new(name: impl Into<String>, condition: Condition<T>) -> Self {
        Self {
            condition,
            name: name.into(),
        }
    }
}

/// A set of clauses joined by one logical operator.
///
/// The operator defaults to AND; OR is selectable, which filter expressions
/// make use of.
#[derive(Clone, Debug, PartialEq)]
pub struct ConditionSet<T> {
    /// The clauses to combine.
    pub clauses: Vec<WhereClause<T>>,
    /// How the clauses are joined.
    pub operator: LogicalOperator,
}

impl<T> ConditionSet<T> {
    /// AND-joined set of clauses.
    pub fn all(clauses: Vec<WhereClause<T>>) -> Self {
        Self {
            clauses,
            operator: LogicalOperator::And,
        }
    }

    /// OR-joined set of clauses.
    pub fn any(clauses: Vec<WhereClause<T>>) -> Self {
        Self {
            clauses,
            operator: LogicalOperator::Or,
        }
    }
}
