use crate::error::Result;
use crate::value::Item;
use crate::{client, codec, key, read, transport};

/// Get item operation.
///
/// The primary key is derived from the entity's key pattern and the given
/// attributes; derivation failures surface before any request is sent.
///
/// ```rust,no_run
/// use dynamodb_intent::{client, read};
///
/// # async fn example(client: &client::Client) -> dynamodb_intent::error::Result<()> {
/// let get_item = read::get_item::GetItem {
///     attributes: [("user_id".to_string(), "42".into())].into_iter().collect(),
///     entity: "user".to_string(),
///     ..Default::default()
/// };
/// get_item.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GetItem {
    /// Attributes the primary key is derived from.
    pub attributes: Item,
    /// The registered entity type to read.
    pub entity: String,
    /// Additional read arguments (consistency, projection).
    pub single_read_args: read::common::SingleReadArgs,
}

impl GetItem {
    fn into_request(
        self,
        pattern: &key::EntityPattern,
        table_name: &str,
    ) -> Result<transport::GetItemRequest> {
        let key = pattern.key_attribute_map(&self.attributes)?;
        let (expression_attribute_names, projection_expression) =
            read::common::compile_projection(self.single_read_args.projection);
        Ok(transport::GetItemRequest {
            consistent_read: self.single_read_args.consistent_read,
            expression_attribute_names,
            key,
            projection_expression,
            table_name: table_name.to_string(),
        })
    }

    /// Execute the get item operation.
    ///
    /// Resolves to `None` when no item exists under the derived key.
    #[tracing::instrument(name = "dynamodb_intent.get_item", skip_all, err)]
    pub async fn send(self, client: &client::Client) -> Result<Option<Item>> {
        let pattern = client.entity(&self.entity)?;
        let request = self.into_request(pattern, client.table_name())?;
        let response = client.send(transport::Request::GetItem(request)).await?;
        Ok(response.item.map(codec::unmarshal_item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::Error;
    use aws_sdk_dynamodb::types;
    use rstest::rstest;
    use std::collections;

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

    #[rstest]
    #[case::bare(
        GetItem {
            attributes: [("user_id".to_string(), "42".into())].into_iter().collect(),
            entity: "user".to_string(),
            ..Default::default()
        },
        transport::GetItemRequest {
            key: collections::HashMap::from([
                ("pk".to_string(), types::AttributeValue::S("USER#42".to_string())),
                ("sk".to_string(), types::AttributeValue::S("PROFILE".to_string())),
            ]),
            table_name: "app-table".to_string(),
            ..Default::default()
        }
    )]
    #[case::with_args(
        GetItem {
            attributes: [("user_id".to_string(), "42".into())].into_iter().collect(),
            entity: "user".to_string(),
            single_read_args: read::common::SingleReadArgs {
                consistent_read: Some(true),
                projection: Some(vec!["name".to_string(), "email".to_string()]),
            },
        },
        transport::GetItemRequest {
            consistent_read: Some(true),
            expression_attribute_names: Some(collections::HashMap::from([
                ("#p0".to_string(), "name".to_string()),
                ("#p1".to_string(), "email".to_string()),
            ])),
            key: collections::HashMap::from([
                ("pk".to_string(), types::AttributeValue::S("USER#42".to_string())),
                ("sk".to_string(), types::AttributeValue::S("PROFILE".to_string())),
            ]),
            projection_expression: Some("#p0, #p1".to_string()),
            table_name: "app-table".to_string(),
        }
    )]
    fn test_get_item(#[case] args: GetItem, #[case] expected: transport::GetItemRequest) {
        let actual = args.into_request(&user_pattern(), "app-table").unwrap();
        assert_eq!(actual, expected);
    }

    #[rstest]
    fn test_missing_key_attribute_fails_before_send() {
        let get_item = GetItem {
            entity: "user".to_string(),
            ..Default::default()
        };
        let error = get_item
            .into_request(&user_pattern(), "app-table")
            .unwrap_err();
        assert_eq!(
            error,
            Error::MissingKeyAttribute {
                attribute: "user_id".to_string(),
                pattern: "USER#{user_id}".to_string(),
            }
        );
    }
}
