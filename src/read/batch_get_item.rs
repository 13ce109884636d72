use crate::error::Result;
use crate::value::Item;
use crate::{client, codec, key, transport};

/// Batch get item operation.
///
/// Derives one primary key per entry and retrieves the matching items in a
/// single request. Results arrive in no particular order; entries with no
/// matching item are simply absent from the output.
///
/// ```rust,no_run
/// use dynamodb_intent::{client, read};
///
/// # async fn example(client: &client::Client) -> dynamodb_intent::error::Result<()> {
/// let batch_get_item = read::batch_get_item::BatchGetItem {
///     entity: "user".to_string(),
///     keys: vec![
///         [("user_id".to_string(), "42".into())].into_iter().collect(),
///         [("user_id".to_string(), "43".into())].into_iter().collect(),
///     ],
///     ..Default::default()
/// };
/// batch_get_item.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchGetItem {
    /// Whether to read with strong consistency.
    pub consistent_read: Option<bool>,
    /// The registered entity type to read.
    pub entity: String,
    /// One attribute map per requested item, each deriving a primary key.
    pub keys: Vec<Item>,
}

impl BatchGetItem {
    fn into_request(
        self,
        pattern: &key::EntityPattern,
        table_name: &str,
    ) -> Result<transport::BatchGetItemRequest> {
        let keys = self
            .keys
            .iter()
            .map(|attributes| pattern.key_attribute_map(attributes))
            .collect::<Result<Vec<_>>>()?;
        Ok(transport::BatchGetItemRequest {
            consistent_read: self.consistent_read,
            keys,
            table_name: table_name.to_string(),
        })
    }

    /// Execute the batch get item operation.
    #[tracing::instrument(name = "dynamodb_intent.batch_get_item", skip_all, err)]
    pub async fn send(self, client: &client::Client) -> Result<Vec<Item>> {
        let pattern = client.entity(&self.entity)?;
        let request = self.into_request(pattern, client.table_name())?;
        let response = client
            .send(transport::Request::BatchGetItem(request))
            .await?;
        Ok(response
            .items
            .unwrap_or_default()
            .into_iter()
            .map(codec::unmarshal_item)
            .collect())
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
    fn test_every_entry_derives_its_own_key() {
        let batch = BatchGetItem {
            consistent_read: Some(true),
            entity: "user".to_string(),
            keys: vec![
                [("user_id".to_string(), "42".into())].into_iter().collect(),
                [("user_id".to_string(), "43".into())].into_iter().collect(),
            ],
        };
        let request = batch.into_request(&user_pattern(), "app-table").unwrap();
        assert_eq!(request.consistent_read, Some(true));
        assert_eq!(request.table_name, "app-table");
        assert_eq!(
            request.keys,
            vec![
                collections::HashMap::from([
                    (
                        "pk".to_string(),
                        types::AttributeValue::S("USER#42".to_string())
                    ),
                    (
                        "sk".to_string(),
                        types::AttributeValue::S("PROFILE".to_string())
                    ),
                ]),
                collections::HashMap::from([
                    (
                        "pk".to_string(),
                        types::AttributeValue::S("USER#43".to_string())
                    ),
                    (
                        "sk".to_string(),
                        types::AttributeValue::S("PROFILE".to_string())
                    ),
                ]),
            ]
        );
    }

    #[rstest]
    fn test_one_underivable_entry_fails_the_whole_batch() {
        let batch = BatchGetItem {
            entity: "user".to_string(),
            keys: vec![
                [("user_id".to_string(), "42".into())].into_iter().collect(),
                Item::new(),
            ],
            ..Default::default()
        };
        let error = batch
            .into_request(&user_pattern(), "app-table")
            .unwrap_err();
        assert!(matches!(error, Error::MissingKeyAttribute { .. }));
    }
}
