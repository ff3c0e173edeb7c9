//! Integration tests driving the MCP front end with in-memory discovery and
//! a scripted downstream.

mod support;

use std::sync::Arc;

use mockable::DefaultClock;
use rest_mcp_gateway::invocation::{
    adapters::ScriptedUpstreamClient, domain::HttpOutcome, domain::TransportFailure,
    domain::TransportFailureKind, services::ToolInvoker,
};
use rest_mcp_gateway::mcp::{
    McpFrontEnd,
    jsonrpc::{INVALID_PARAMS, JsonRpcId, JsonRpcRequest, JsonRpcResponse},
};
use rest_mcp_gateway::tool_registry::{adapters::InMemorySchemaFetcher, domain::HttpMethod};
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use support::{
    InMemoryRegistry, customer_schema, in_memory_registry, order_generation_schema, order_schema,
    service_name,
};

type TestFrontEnd = McpFrontEnd<InMemorySchemaFetcher, DefaultClock, ScriptedUpstreamClient>;

struct Gateway {
    fetcher: Arc<InMemorySchemaFetcher>,
    registry: Arc<InMemoryRegistry>,
    upstream: Arc<ScriptedUpstreamClient>,
    front_end: TestFrontEnd,
}

impl Gateway {
    async fn call(&self, method: &str, params: Value) -> JsonRpcResponse {
        self.front_end
            .handle(JsonRpcRequest::new(JsonRpcId::Number(1), method, Some(params)))
            .await
            .expect("requests with an id are answered")
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Value {
        self.call("tools/call", json!({"name": name, "arguments": arguments}))
            .await
            .result
            .expect("tool calls answer with a result")
    }
}

#[fixture]
fn gateway() -> Gateway {
    let fetcher = Arc::new(InMemorySchemaFetcher::new());
    fetcher.set_document(&service_name("customer"), customer_schema());
    fetcher.set_document(&service_name("order"), order_schema(2));
    let registry = Arc::new(in_memory_registry(&fetcher));
    let upstream = Arc::new(ScriptedUpstreamClient::new());
    let front_end = McpFrontEnd::new(
        Arc::clone(&registry),
        ToolInvoker::new(Arc::clone(&upstream)),
    );
    Gateway {
        fetcher,
        registry,
        upstream,
        front_end,
    }
}

async fn discovered(gateway: Gateway) -> Gateway {
    for (service, result) in gateway.registry.refresh_all().await {
        assert!(result.is_ok(), "refresh of {service} failed: {result:?}");
    }
    gateway
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tools_are_listed_by_service_then_operation(gateway: Gateway) {
    let gateway = discovered(gateway).await;

    let result = gateway
        .call("tools/list", json!({}))
        .await
        .result
        .expect("list result");
    let names: Vec<&str> = result
        .get("tools")
        .and_then(Value::as_array)
        .expect("tools array")
        .iter()
        .filter_map(|tool| tool.get("name").and_then(Value::as_str))
        .collect();

    assert_eq!(
        names,
        vec![
            "customer_listCustomers",
            "customer_createCustomer",
            "customer_getCustomer",
            "order_listOrders0",
            "order_listOrders1",
        ]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn get_customer_targets_the_declared_path(gateway: Gateway) {
    let gateway = discovered(gateway).await;
    gateway
        .upstream
        .push_json(200, &json!({"id": "42", "name": "Ada Lovelace"}));

    let result = gateway
        .call_tool("customer_getCustomer", json!({"id": "42"}))
        .await;
    let calls = gateway.upstream.calls();
    let request = calls.first().expect("one downstream call");

    assert_eq!(request.method, HttpMethod::Get);
    assert_eq!(request.url.as_str(), "http://customer.test:8001/customers/42");
    assert_eq!(result.pointer("/isError"), Some(&json!(false)));
    assert_eq!(
        result.pointer("/structuredContent"),
        Some(&json!({"id": "42", "name": "Ada Lovelace"}))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn downstream_404_is_an_upstream_rejection(gateway: Gateway) {
    let gateway = discovered(gateway).await;
    gateway
        .upstream
        .push_json(404, &json!({"detail": "Customer not found"}));

    let result = gateway
        .call_tool("customer_getCustomer", json!({"id": "999"}))
        .await;

    assert_eq!(result.pointer("/isError"), Some(&json!(true)));
    assert_eq!(
        result.pointer("/structuredContent/kind"),
        Some(&json!("UpstreamRejected"))
    );
    assert_eq!(result.pointer("/structuredContent/status"), Some(&json!(404)));
    assert_eq!(result.pointer("/_meta/statusCode"), Some(&json!(404)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn transport_failures_are_upstream_unreachable(gateway: Gateway) {
    let gateway = discovered(gateway).await;
    gateway
        .upstream
        .push_outcome(HttpOutcome::Failed(TransportFailure::new(
            TransportFailureKind::Timeout,
            "operation timed out",
        )));

    let result = gateway
        .call_tool("customer_listCustomers", json!({}))
        .await;

    assert_eq!(
        result.pointer("/structuredContent/kind"),
        Some(&json!("UpstreamUnreachable"))
    );
    assert_eq!(result.pointer("/_meta/statusCode"), Some(&Value::Null));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_required_argument_makes_no_call(gateway: Gateway) {
    let gateway = discovered(gateway).await;

    let result = gateway
        .call_tool("customer_createCustomer", json!({"email": "ada@example.com"}))
        .await;

    assert_eq!(
        result.pointer("/structuredContent/kind"),
        Some(&json!("MissingRequiredArgument"))
    );
    assert!(gateway.upstream.calls().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_argument_makes_no_call(gateway: Gateway) {
    let gateway = discovered(gateway).await;

    let result = gateway
        .call_tool("customer_getCustomer", json!({"id": "1", "verbose": true}))
        .await;

    assert_eq!(
        result.pointer("/structuredContent/kind"),
        Some(&json!("UnknownArgument"))
    );
    assert!(gateway.upstream.calls().is_empty());
}

#[rstest]
#[case(json!({"id": ".."}))]
#[case(json!({"id": "."}))]
#[tokio::test(flavor = "multi_thread")]
async fn dot_segments_cannot_retarget_the_request(gateway: Gateway, #[case] arguments: Value) {
    let gateway = discovered(gateway).await;

    let result = gateway.call_tool("customer_getCustomer", arguments).await;

    assert_eq!(
        result.pointer("/structuredContent/kind"),
        Some(&json!("TypeMismatch"))
    );
    assert!(gateway.upstream.calls().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn ghost_tool_is_a_protocol_error(gateway: Gateway) {
    let gateway = discovered(gateway).await;

    let response = gateway
        .call("tools/call", json!({"name": "ghost_tool", "arguments": {}}))
        .await;
    let error = response.error.expect("protocol error");

    assert!(response.result.is_none());
    assert_eq!(error.code, INVALID_PARAMS);
    assert_eq!(
        error.data.as_ref().and_then(|data| data.get("kind")),
        Some(&json!("ToolNotFound"))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_refresh_keeps_tools_callable(gateway: Gateway) {
    let gateway = discovered(gateway).await;
    gateway
        .fetcher
        .set_unreachable(&service_name("customer"), "connection refused");
    gateway.upstream.push_json(200, &json!([]));

    let refresh = gateway.registry.refresh("customer").await;
    let result = gateway
        .call_tool("customer_listCustomers", json!({}))
        .await;

    assert!(refresh.is_err());
    assert_eq!(result.pointer("/isError"), Some(&json!(false)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn listing_during_refresh_never_sees_a_partial_slice(gateway: Gateway) {
    let gateway = discovered(gateway).await;
    let order = service_name("order");
    let registry = Arc::clone(&gateway.registry);
    let fetcher = Arc::clone(&gateway.fetcher);

    let writer = tokio::spawn(async move {
        for (generation, count) in [("A", 3), ("B", 2)].into_iter().cycle().take(50) {
            fetcher.set_document(&order, order_generation_schema(generation, count));
            registry.refresh("order").await.expect("refresh succeeds");
        }
    });

    let generation_names = |generation: &str, count: usize| -> Vec<String> {
        (0..count)
            .map(|index| format!("order_listOrders{generation}{index}"))
            .collect()
    };
    let complete_views = [
        generation_names("", 2),
        generation_names("A", 3),
        generation_names("B", 2),
    ];

    for _ in 0..200 {
        let order_tools: Vec<String> = gateway
            .registry
            .list()
            .iter()
            .filter(|tool| tool.service().name().as_str() == "order")
            .map(|tool| tool.name().to_string())
            .collect();
        assert!(
            complete_views.contains(&order_tools),
            "order slice mixes generations: {order_tools:?}"
        );
        tokio::task::yield_now().await;
    }
    writer.await.expect("writer task completes");

    let snapshot = gateway.registry.snapshot();
    let slice = snapshot.slice("order").expect("order slice");
    let names: Vec<String> = slice.tools().iter().map(|tool| tool.name().to_string()).collect();
    assert_eq!(names, generation_names("B", 2));
}
