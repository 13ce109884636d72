use crate::expression::{CompiledExpression, ExpressionKind};

use std::collections;

/// Separator for attribute path components.
const PATH_SEPARATOR: &str = ".";

/// Attribute selection for projection expressions.
///
/// Paths may be dotted to reach into nested maps; every component is
/// placeholdered.
///
/// ```rust
/// use dynamodb_intent::expression::projection;
///
/// let compiled = projection::Projection::new(["id", "address.zip"]).compile();
/// assert_eq!(compiled.expression, "#p0, #p1.#p2");
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Projection {
    /// The attribute paths to retrieve.
    pub paths: Vec<String>,
}

impl Projection {
    /// Projection over the given attribute paths.
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Compile into a names-only expression.
    pub fn compile(self) -> CompiledExpression {
        let mut counter = 0;
        let mut names = collections::HashMap::new();
        let fragments: Vec<_> = self
            .paths
            .into_iter()
            .map(|path| {
                let placeholders: Vec<_> = path
                    .split(PATH_SEPARATOR)
                    .map(|component| {
                        let placeholder =
                            format!("{}{}", ExpressionKind::Projection.name_prefix(), counter);
                        counter += 1;
                        names.insert(placeholder.clone(), component.to_string());
                        placeholder
                    })
                    .collect();
                placeholders.join(PATH_SEPARATOR)
            })
            .collect();
        CompiledExpression {
            attribute_names: names,
            attribute_values: collections::HashMap::new(),
            expression: fragments.join(", "),
        }
    }
}
