//! End-to-end lifecycle tests
//!
//! Drives the engine the way a framework adapter would - begin, record
//! request/route/query/response data in adapter order, end - and asserts on
//! the finalized `transaction_tracer` view that subscribers observe.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use vahti_agent::{
    keys, AgentConfig, AgentError, AttributeValue, Destination, FinalizedTransaction, Lifecycle,
    RequestMetadata, ResponseMetadata, Subscriber,
};

const TEST_HOST: &str = "localhost:8089";
const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

// ============================================================================
// Shared test subscribers
// ============================================================================

/// Subscriber that captures finished transactions for later inspection
struct CaptureSubscriber {
    captured: Mutex<Vec<Arc<FinalizedTransaction>>>,
}

impl CaptureSubscriber {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            captured: Mutex::new(Vec::new()),
        })
    }

    fn count(&self) -> usize {
        self.captured.lock().unwrap().len()
    }

    fn last(&self) -> Arc<FinalizedTransaction> {
        self.captured
            .lock()
            .unwrap()
            .last()
            .expect("a transaction should have finished")
            .clone()
    }

    fn tracer_view(&self) -> HashMap<String, AttributeValue> {
        self.last()
            .trace()
            .attributes()
            .get(Destination::TransactionTracer)
            .clone()
    }
}

#[async_trait]
impl Subscriber for CaptureSubscriber {
    fn name(&self) -> &'static str {
        "capture"
    }

    async fn transaction_finished(
        &self,
        transaction: Arc<FinalizedTransaction>,
    ) -> Result<(), AgentError> {
        self.captured.lock().unwrap().push(transaction);
        Ok(())
    }
}

/// Subscriber that always fails, for isolation testing
struct FailingSubscriber {
    calls: Arc<AtomicU64>,
}

#[async_trait]
impl Subscriber for FailingSubscriber {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn transaction_finished(
        &self,
        _transaction: Arc<FinalizedTransaction>,
    ) -> Result<(), AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AgentError::Subscriber {
            subscriber: "failing".to_string(),
            message: "always fails".to_string(),
        })
    }
}

// ============================================================================
// Request simulation helpers
// ============================================================================

fn agent_config() -> AgentConfig {
    let mut config = AgentConfig::default();
    config.send_request_uri_attribute = true;
    config.apdex_t = 1.0;
    config
}

fn json_response() -> ResponseMetadata {
    ResponseMetadata::new(200)
        .with_header("Content-Length", "12")
        .with_header("Content-Type", JSON_CONTENT_TYPE)
}

/// Drive one request through the lifecycle in adapter order: request
/// metadata, then route params, then query params, then the response.
async fn simulate_request(
    lifecycle: &Lifecycle,
    uri: &str,
    route_params: &[(&str, &str)],
    query_params: &[(&str, &str)],
    response: ResponseMetadata,
) -> Arc<FinalizedTransaction> {
    let txn = lifecycle.begin();
    Lifecycle::in_scope(txn.clone(), async {
        let current = Lifecycle::current().expect("transaction should be current");
        current
            .record_request_metadata(
                &RequestMetadata::new("GET", uri).with_header("Host", TEST_HOST),
            )
            .unwrap();
        for (name, value) in route_params {
            current.record_route_param(name, *value).unwrap();
        }
        for (name, value) in query_params {
            current.record_query_param(name, *value).unwrap();
        }
        current.record_response_metadata(&response).unwrap();
    })
    .await;
    lifecycle.end(&txn).await
}

fn expected_baseline(uri: &str) -> HashMap<String, AttributeValue> {
    let mut expected: HashMap<String, AttributeValue> = HashMap::new();
    expected.insert(keys::REQUEST_HEADERS_HOST.into(), TEST_HOST.into());
    expected.insert(keys::REQUEST_METHOD.into(), "GET".into());
    expected.insert(keys::RESPONSE_STATUS.into(), 200_i64.into());
    expected.insert(keys::HTTP_RESPONSE_CODE.into(), "200".into());
    expected.insert(keys::RESPONSE_CONTENT_LENGTH.into(), "12".into());
    expected.insert(keys::RESPONSE_CONTENT_TYPE.into(), JSON_CONTENT_TYPE.into());
    expected.insert(keys::REQUEST_URI.into(), uri.into());
    expected
}

// ============================================================================
// Attribute collection scenarios
// ============================================================================

/// A GET with no route or query variables produces exactly the standard
/// request/response attributes and nothing else.
#[tokio::test]
async fn no_variables_baseline() {
    let capture = CaptureSubscriber::new();
    let lifecycle = Lifecycle::new(agent_config())
        .unwrap()
        .subscriber_arc(capture.clone());

    simulate_request(&lifecycle, "/user/", &[], &[], json_response()).await;

    assert_eq!(capture.count(), 1);
    assert_eq!(capture.tracer_view(), expected_baseline("/user/"));
}

/// Route pattern `/user/:id` hit as `/user/5?name=bob`: both parameters are
/// present simultaneously since their keys differ.
#[tokio::test]
async fn route_and_query_variables_combine() {
    let capture = CaptureSubscriber::new();
    let lifecycle = Lifecycle::new(agent_config())
        .unwrap()
        .subscriber_arc(capture.clone());

    simulate_request(
        &lifecycle,
        "/user/5",
        &[("id", "5")],
        &[("name", "bob")],
        json_response(),
    )
    .await;

    let mut expected = expected_baseline("/user/5");
    expected.insert("id".into(), "5".into());
    expected.insert("name".into(), "bob".into());
    assert_eq!(capture.tracer_view(), expected);
}

/// `/user/5?id=6` on route pattern `/user/:id`: the query parameter recorded
/// after the route parameter masks it on the shared key.
#[tokio::test]
async fn query_param_masks_route_param_on_collision() {
    let capture = CaptureSubscriber::new();
    let lifecycle = Lifecycle::new(agent_config())
        .unwrap()
        .subscriber_arc(capture.clone());

    simulate_request(
        &lifecycle,
        "/user/5",
        &[("id", "5")],
        &[("id", "6")],
        json_response(),
    )
    .await;

    let mut expected = expected_baseline("/user/5");
    expected.insert("id".into(), "6".into());
    assert_eq!(capture.tracer_view(), expected);
}

/// `httpResponseMessage` appears iff the transport supplied a status
/// message, without perturbing any other attribute.
#[tokio::test]
async fn status_message_is_optional() {
    let capture = CaptureSubscriber::new();
    let lifecycle = Lifecycle::new(agent_config())
        .unwrap()
        .subscriber_arc(capture.clone());

    simulate_request(&lifecycle, "/user/", &[], &[], json_response()).await;
    assert!(!capture.tracer_view().contains_key(keys::HTTP_RESPONSE_MESSAGE));

    simulate_request(
        &lifecycle,
        "/user/",
        &[],
        &[],
        json_response().with_status_message("OK"),
    )
    .await;

    let mut expected = expected_baseline("/user/");
    expected.insert(keys::HTTP_RESPONSE_MESSAGE.into(), "OK".into());
    assert_eq!(capture.tracer_view(), expected);
}

/// With the engine disabled, every destination's finalized view is empty no
/// matter how much was recorded.
#[tokio::test]
async fn disabled_attributes_yield_empty_views() {
    let mut config = agent_config();
    config.attributes.enabled = false;

    let capture = CaptureSubscriber::new();
    let lifecycle = Lifecycle::new(config).unwrap().subscriber_arc(capture.clone());

    simulate_request(
        &lifecycle,
        "/user/5",
        &[("id", "5")],
        &[("name", "bob")],
        json_response(),
    )
    .await;

    let finished = capture.last();
    for destination in Destination::ALL {
        assert!(finished.trace().attributes().get(destination).is_empty());
    }
}

/// Exclude rules configured for the tracer destination prune the view.
#[tokio::test]
async fn destination_rules_prune_the_tracer_view() {
    let config = AgentConfig::from_json(
        r#"{
            "attributes": {
                "destination_rules": {
                    "transaction_tracer": {"exclude": ["request.headers.*"]}
                }
            },
            "send_request_uri_attribute": true
        }"#,
    )
    .unwrap();

    let capture = CaptureSubscriber::new();
    let lifecycle = Lifecycle::new(config).unwrap().subscriber_arc(capture.clone());

    simulate_request(&lifecycle, "/user/", &[], &[], json_response()).await;

    let mut expected = expected_baseline("/user/");
    expected.remove(keys::REQUEST_HEADERS_HOST);
    assert_eq!(capture.tracer_view(), expected);
}

// ============================================================================
// Lifecycle guarantees
// ============================================================================

/// Ending twice notifies subscribers once and returns the same frozen result.
#[tokio::test]
async fn double_end_notifies_once() {
    let capture = CaptureSubscriber::new();
    let lifecycle = Lifecycle::new(agent_config())
        .unwrap()
        .subscriber_arc(capture.clone());

    let txn = lifecycle.begin();
    txn.record_route_param("id", "5").unwrap();

    let first = lifecycle.end(&txn).await;
    let second = lifecycle.end(&txn).await;

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(capture.count(), 1);
}

/// A failing subscriber does not prevent later subscribers from observing
/// the finished transaction.
#[tokio::test]
async fn failing_subscriber_is_isolated() {
    let calls = Arc::new(AtomicU64::new(0));
    let capture = CaptureSubscriber::new();
    let lifecycle = Lifecycle::new(agent_config())
        .unwrap()
        .subscriber(FailingSubscriber {
            calls: calls.clone(),
        })
        .subscriber_arc(capture.clone());

    simulate_request(&lifecycle, "/user/", &[], &[], json_response()).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(capture.count(), 1);
    assert_eq!(capture.tracer_view(), expected_baseline("/user/"));
}

/// A request that errors out still finalizes with whatever was recorded.
#[tokio::test]
async fn errored_request_still_finalizes() {
    let capture = CaptureSubscriber::new();
    let lifecycle = Lifecycle::new(agent_config())
        .unwrap()
        .subscriber_arc(capture.clone());

    let txn = lifecycle.begin();
    txn.record_request_metadata(&RequestMetadata::new("GET", "/boom").with_header("Host", TEST_HOST))
        .unwrap();
    // The handler blew up before a response was written; no response
    // metadata arrives, the transaction is never left dangling.
    lifecycle.end(&txn).await;

    let view = capture.tracer_view();
    assert_eq!(view.get(keys::REQUEST_METHOD).unwrap(), "GET");
    assert!(!view.contains_key(keys::RESPONSE_STATUS));
}

/// Many in-flight requests keep their transactions fully isolated.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_do_not_cross_contaminate() {
    let capture = CaptureSubscriber::new();
    let lifecycle = Arc::new(
        Lifecycle::new(agent_config())
            .unwrap()
            .subscriber_arc(capture.clone()),
    );

    let mut tasks = Vec::new();
    for i in 0..16 {
        let lifecycle = Arc::clone(&lifecycle);
        tasks.push(tokio::spawn(async move {
            let id = i.to_string();
            let finished = simulate_request(
                &lifecycle,
                &format!("/user/{}", id),
                &[("id", id.as_str())],
                &[],
                json_response(),
            )
            .await;

            let view = finished.trace().attributes().get(Destination::TransactionTracer);
            assert_eq!(view.get("id").unwrap(), id.as_str());
            assert_eq!(
                view.get(keys::REQUEST_URI).unwrap(),
                format!("/user/{}", id).as_str()
            );
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    assert_eq!(capture.count(), 16);
}

/// Transaction duration is exposed for the apdex collaborator.
#[tokio::test]
async fn finished_transaction_exposes_timing() {
    let capture = CaptureSubscriber::new();
    let lifecycle = Lifecycle::new(agent_config())
        .unwrap()
        .subscriber_arc(capture.clone());

    simulate_request(&lifecycle, "/user/", &[], &[], json_response()).await;

    let finished = capture.last();
    let apdex_t = std::time::Duration::from_secs_f64(lifecycle.config().apdex_t);
    assert!(finished.duration() < apdex_t);
}
