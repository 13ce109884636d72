use crate::error::Result;
use crate::expression::compiler::Compiler;
use crate::expression::condition::ConditionSet;
use crate::expression::{CompiledExpression, ExpressionKind};

use serde::Serialize;

/// Compile an optional condition set into a condition expression, dropping
/// conditions that compile to nothing.
pub(crate) fn compile_condition<T: Serialize>(
    condition: Option<ConditionSet<T>>,
) -> Result<Option<CompiledExpression>> {
    let Some(condition) = condition else {
        return Ok(None);
    };
    let mut compiler = Compiler::new(ExpressionKind::Condition);
    compiler.push_set(condition)?;
    let compiled = compiler.build();
    Ok((!compiled.is_empty()).then_some(compiled))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::expression::condition::{Condition, WhereClause};
    use rstest::rstest;

    #[rstest]
    fn test_absent_condition_compiles_to_nothing() {
        assert_eq!(compile_condition::<String>(None).unwrap(), None);
    }

    #[rstest]
    fn test_empty_condition_set_compiles_to_nothing() {
        let condition = ConditionSet::<String>::all(Vec::new());
        assert_eq!(compile_condition(Some(condition)).unwrap(), None);
    }

    #[rstest]
    fn test_condition_compiles_into_its_own_namespace() {
        let condition = ConditionSet::all(vec![WhereClause::new(
            "version",
            Condition::Equals(3),
        )]);
        let compiled = compile_condition(Some(condition)).unwrap().unwrap();
        assert_eq!(compiled.expression, "#n0 = :v0");
        assert_eq!(compiled.attribute_names["#n0"], "version");
    }
}
