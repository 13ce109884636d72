use crate::error::{Error, Result};
use crate::expression::condition::ConditionSet;
use crate::expression::update::UpdateSpec;
use crate::value::Item;
use crate::{client, codec, key, transport, write};

use serde::Serialize;

/// Update item operation.
///
/// The primary key is derived from the entity's key pattern; the update
/// specification compiles into a single update expression with its clauses in
/// SET, REMOVE, ADD, DELETE order. An empty specification is rejected before
/// any request is sent.
///
/// ```rust,no_run
/// use dynamodb_intent::expression::update;
/// use dynamodb_intent::{client, write};
///
/// # async fn example(client: &client::Client) -> dynamodb_intent::error::Result<()> {
/// let update_item = write::update_item::UpdateItem {
///     attributes: [("user_id".to_string(), "42".into())].into_iter().collect(),
///     entity: "user".to_string(),
///     update: update::UpdateSpec::default()
///         .set("name", update::SetAction::Assign(serde_json::json!("John")))
///         .set("login_count", update::SetAction::Increment(serde_json::json!(1))),
///     ..Default::default()
/// };
/// update_item.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateItem<T> {
    /// Attributes the primary key is derived from.
    pub attributes: Item,
    /// Condition that must hold for the update to be accepted.
    pub condition: Option<ConditionSet<T>>,
    /// The registered entity type to update.
    pub entity: String,
    /// The modifications to apply.
    pub update: UpdateSpec<T>,
}

impl<T: Serialize> UpdateItem<T> {
    fn into_request(
        self,
        pattern: &key::EntityPattern,
        table_name: &str,
    ) -> Result<transport::UpdateItemRequest> {
        if self.update.is_empty() {
            return Err(Error::EmptyUpdate);
        }
        let key = pattern.key_attribute_map(&self.attributes)?;
        let mut expression_attribute_names = None;
        let mut expression_attribute_values = None;
        let update_expression = self.update.compile()?.merge_into(
            &mut expression_attribute_names,
            &mut expression_attribute_values,
        );
        let condition_expression = write::common::compile_condition(self.condition)?
            .map(|compiled| {
                compiled.merge_into(
                    &mut expression_attribute_names,
                    &mut expression_attribute_values,
                )
            });
        Ok(transport::UpdateItemRequest {
            condition_expression,
            expression_attribute_names,
            expression_attribute_values,
            key,
            table_name: table_name.to_string(),
            update_expression,
        })
    }

    /// Execute the update item operation.
    ///
    /// Resolves to the item's previous attributes when the transport reports
    /// them, `None` otherwise.
    #[tracing::instrument(name = "dynamodb_intent.update_item", skip_all, err)]
    pub async fn send(self, client: &client::Client) -> Result<Option<Item>> {
        let pattern = client.entity(&self.entity)?;
        let request = self.into_request(pattern, client.table_name())?;
        let response = client.send(transport::Request::UpdateItem(request)).await?;
        Ok(response.attributes.map(codec::unmarshal_item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::expression::condition::{Condition, WhereClause};
    use crate::expression::update::SetAction;
    use aws_sdk_dynamodb::types;
    use rstest::rstest;

    fn user_pattern() -> key::EntityPattern {
        key::EntityPattern::new(key::KeyPattern {
            partition: key::KeySpec {
                attribute: "pk".to_string(),
                segments: vec![
                    key::Segment::literal("USER#"),
                    key::Segment::attribute("user_id"),
                ],
            },
            sort: Some(key::KeySpec {
                attribute: "sk".to_string(),
                segments: vec![key::Segment::literal("PROFILE")],
            }),
        })
    }

    fn user_attributes() -> Item {
        [("user_id".to_string(), "42".into())].into_iter().collect()
    }

    #[rstest]
    fn test_empty_update_is_rejected_before_key_derivation() {
        let update_item = UpdateItem::<String> {
            entity: "user".to_string(),
            ..Default::default()
        };
        // no key attributes either: the empty update must win
        let error = update_item
            .into_request(&user_pattern(), "app-table")
            .unwrap_err();
        assert_eq!(error, Error::EmptyUpdate);
    }

    #[rstest]
    fn test_update_and_condition_share_the_placeholder_maps() {
        let update_item = UpdateItem {
            attributes: user_attributes(),
            condition: Some(ConditionSet::all(vec![WhereClause::new(
                "version",
                Condition::Equals(3),
            )])),
            entity: "user".to_string(),
            update: UpdateSpec::default()
                .set("version", SetAction::Increment(1))
                .remove("draft"),
        };
        let request = update_item
            .into_request(&user_pattern(), "app-table")
            .unwrap();
        assert_eq!(
            request.update_expression,
            "SET #u0 = #u0 + :u0 REMOVE #u1"
        );
        assert_eq!(request.condition_expression, Some("#n0 = :v0".to_string()));
        let names = request.expression_attribute_names.unwrap();
        assert_eq!(names["#u0"], "version");
        assert_eq!(names["#u1"], "draft");
        assert_eq!(names["#n0"], "version");
        let values = request.expression_attribute_values.unwrap();
        assert_eq!(values[":u0"], types::AttributeValue::N("1".to_string()));
        assert_eq!(values[":v0"], types::AttributeValue::N("3".to_string()));
        assert_eq!(
            request.key["pk"],
            types::AttributeValue::S("USER#42".to_string())
        );
    }
}
