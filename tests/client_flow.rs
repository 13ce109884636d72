//! End-to-end flows through a scripted transport.

use dynamodb_intent::client::{Client, ClientConfig};
use dynamodb_intent::error::{Error, Result};
use dynamodb_intent::expression::condition::{Condition, ConditionSet, WhereClause};
use dynamodb_intent::expression::update::{SetAction, UpdateSpec};
use dynamodb_intent::key::{EntityPattern, KeyPattern, KeySpec, Segment};
use dynamodb_intent::value::Item;
use dynamodb_intent::{read, transport, write};

use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Transport replaying a scripted queue of responses while recording every
/// request it receives.
struct ScriptedTransport {
    requests: Mutex<Vec<transport::Request>>,
    responses: Mutex<Vec<Result<transport::Response>>>,
}

impl ScriptedTransport {
    fn new(responses: Vec<Result<transport::Response>>) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            responses: Mutex::new(responses),
        })
    }

    fn requests(&self) -> Vec<transport::Request> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl transport::Transport for ScriptedTransport {
    async fn send(&self, request: transport::Request) -> Result<transport::Response> {
        self.requests.lock().unwrap().push(request);
        let mut responses = self.responses.lock().unwrap();
        assert!(!responses.is_empty(), "transport script exhausted");
        responses.remove(0)
    }
}

fn config() -> ClientConfig {
    let user = EntityPattern::new(KeyPattern {
        partition: KeySpec {
            attribute: "pk".to_string(),
            segments: vec![Segment::literal("USER#"), Segment::attribute("user_id")],
        },
        sort: Some(KeySpec {
            attribute: "sk".to_string(),
            segments: vec![Segment::literal("PROFILE")],
        }),
    });
    ClientConfig::new("app-table").entity("user", user)
}

fn user_attributes() -> Item {
    [("user_id".to_string(), "42".into())].into_iter().collect()
}

fn stored_user() -> HashMap<String, AttributeValue> {
    HashMap::from([
        ("pk".to_string(), AttributeValue::S("USER#42".to_string())),
        ("sk".to_string(), AttributeValue::S("PROFILE".to_string())),
        ("name".to_string(), AttributeValue::S("John".to_string())),
    ])
}

#[tokio::test]
async fn get_item_round_trips_through_the_transport() {
    let transport = ScriptedTransport::new(vec![Ok(transport::Response {
        consumed_capacity: Some(transport::ConsumedCapacity {
            capacity_units: 0.5,
            table_name: "app-table".to_string(),
        }),
        item: Some(stored_user()),
        ..Default::default()
    })]);
    let client = Client::new(transport.clone(), config());

    let item = read::get_item::GetItem {
        attributes: user_attributes(),
        entity: "user".to_string(),
        ..Default::default()
    }
    .send(&client)
    .await
    .unwrap()
    .unwrap();

    assert_eq!(item["name"].as_str(), Some("John"));
    let requests = transport.requests();
    let transport::Request::GetItem(request) = &requests[0] else {
        panic!("expected a GetItem request");
    };
    assert_eq!(request.key["pk"], AttributeValue::S("USER#42".to_string()));
    assert_eq!(request.table_name, "app-table");
    assert_eq!(client.tracker().snapshot().capacity_units["app-table"], 0.5);
}

#[tokio::test]
async fn conditional_put_sends_the_compiled_guard() {
    let transport = ScriptedTransport::new(vec![Ok(transport::Response::default())]);
    let client = Client::new(transport.clone(), config());

    write::put_item::PutItem {
        attributes: [
            ("user_id".to_string(), "42".into()),
            ("name".to_string(), "John".into()),
        ]
        .into_iter()
        .collect(),
        condition: Some(ConditionSet::all(vec![WhereClause::new(
            "pk",
            Condition::<String>::NotExists,
        )])),
        entity: "user".to_string(),
    }
    .send(&client)
    .await
    .unwrap();

    let requests = transport.requests();
    let transport::Request::PutItem(request) = &requests[0] else {
        panic!("expected a PutItem request");
    };
    assert_eq!(
        request.condition_expression.as_deref(),
        Some("attribute_not_exists(#n0)")
    );
    assert_eq!(request.item["pk"], AttributeValue::S("USER#42".to_string()));
    assert_eq!(request.item["sk"], AttributeValue::S("PROFILE".to_string()));
}

#[tokio::test(start_paused = true)]
async fn throttled_update_retries_until_it_succeeds() {
    let transport = ScriptedTransport::new(vec![
        Err(Error::Throttling {
            retry_after_ms: Some(20),
        }),
        Err(Error::Throttling {
            retry_after_ms: None,
        }),
        Ok(transport::Response {
            attributes: Some(stored_user()),
            ..Default::default()
        }),
    ]);
    let client = Client::new(transport.clone(), config());

    let previous = write::update_item::UpdateItem::<i32> {
        attributes: user_attributes(),
        entity: "user".to_string(),
        update: UpdateSpec::default().set("login_count", SetAction::Increment(1)),
        ..Default::default()
    }
    .send(&client)
    .await
    .unwrap()
    .unwrap();

    assert_eq!(previous["name"].as_str(), Some("John"));
    assert_eq!(transport.requests().len(), 3);
    let snapshot = client.tracker().snapshot();
    assert_eq!(snapshot.retries, 2);
    assert_eq!(snapshot.operations["UpdateItem"].successes, 1);
}

#[tokio::test]
async fn conditional_check_failure_is_not_retried() {
    let transport = ScriptedTransport::new(vec![Err(Error::ConditionalCheckFailed {
        expected: None,
        actual: None,
    })]);
    let client = Client::new(transport.clone(), config());

    let error = write::delete_item::DeleteItem {
        attributes: user_attributes(),
        condition: Some(ConditionSet::all(vec![WhereClause::new(
            "status",
            Condition::Equals("INACTIVE"),
        )])),
        entity: "user".to_string(),
    }
    .send(&client)
    .await
    .unwrap_err();

    assert!(matches!(error, Error::ConditionalCheckFailed { .. }));
    assert_eq!(transport.requests().len(), 1);
    assert_eq!(
        client.tracker().snapshot().operations["DeleteItem"].failures,
        1
    );
}

#[tokio::test]
async fn query_compiles_key_condition_filter_and_projection_together() {
    let transport = ScriptedTransport::new(vec![Ok(transport::Response {
        items: Some(vec![stored_user()]),
        ..Default::default()
    })]);
    let client = Client::new(transport.clone(), config());

    let page = read::query::Query {
        attributes: user_attributes(),
        entity: "user".to_string(),
        filter: Some(ConditionSet::all(vec![WhereClause::new(
            "age",
            Condition::GreaterThanOrEqual(21),
        )])),
        multiple_read_args: read::common::MultipleReadArgs {
            limit: Some(10),
            projection: Some(vec!["name".to_string()]),
            ..Default::default()
        },
        ..Default::default()
    }
    .send(&client)
    .await
    .unwrap();

    assert_eq!(page.items.len(), 1);
    let requests = transport.requests();
    let transport::Request::Query(request) = &requests[0] else {
        panic!("expected a Query request");
    };
    assert_eq!(request.key_condition_expression, "#k0 = :k0");
    assert_eq!(request.filter_expression.as_deref(), Some("#f0 >= :f0"));
    assert_eq!(request.projection_expression.as_deref(), Some("#p0"));
    let names = request.expression_attribute_names.as_ref().unwrap();
    assert_eq!(names["#k0"], "pk");
    assert_eq!(names["#f0"], "age");
    assert_eq!(names["#p0"], "name");
}
