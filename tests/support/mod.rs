//! Shared schema documents and registry wiring for integration tests.

use std::sync::Arc;

use mockable::DefaultClock;
use rest_mcp_gateway::tool_registry::{
    adapters::InMemorySchemaFetcher,
    domain::{ServiceDescriptor, ServiceName},
    services::ToolRegistry,
};
use serde_json::{Value, json};

pub type InMemoryRegistry = ToolRegistry<InMemorySchemaFetcher, DefaultClock>;

pub fn service_name(raw: &str) -> ServiceName {
    ServiceName::new(raw).expect("valid service name")
}

pub fn descriptor(raw: &str, base_url: &str) -> ServiceDescriptor {
    ServiceDescriptor::new(service_name(raw), base_url).expect("valid descriptor")
}

/// OpenAPI 3 document of the demo customer service.
pub fn customer_schema() -> Value {
    json!({
        "openapi": "3.0.0",
        "info": {"title": "Customer Service", "version": "1.0.0"},
        "paths": {
            "/customers": {
                "get": {
                    "operationId": "listCustomers",
                    "summary": "List customers",
                    "parameters": [
                        {"name": "limit", "in": "query", "schema": {"type": "integer", "default": 10}}
                    ],
                    "responses": {"200": {"description": "Customers"}}
                },
                "post": {
                    "operationId": "createCustomer",
                    "summary": "Create a customer",
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": {"$ref": "#/components/schemas/CustomerInput"}
                            }
                        }
                    },
                    "responses": {"201": {"description": "Created"}}
                }
            },
            "/customers/{id}": {
                "get": {
                    "operationId": "getCustomer",
                    "summary": "Fetch one customer",
                    "parameters": [
                        {"name": "id", "in": "path", "required": true, "schema": {"type": "string"}}
                    ],
                    "responses": {
                        "200": {"description": "Customer"},
                        "404": {"description": "Not found"}
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "CustomerInput": {
                    "type": "object",
                    "required": ["name"],
                    "properties": {
                        "name": {"type": "string"},
                        "email": {"type": "string"}
                    }
                }
            }
        }
    })
}

/// Swagger 2 document of the demo order service with `count` list
/// operations.
pub fn order_schema(count: usize) -> Value {
    order_generation_schema("", count)
}

/// Order document whose operation ids carry a `generation` marker, so tools
/// of different generations never share a name.
pub fn order_generation_schema(generation: &str, count: usize) -> Value {
    let paths: serde_json::Map<String, Value> = (0..count)
        .map(|index| {
            (
                format!("/orders/{generation}view{index}"),
                json!({
                    "get": {
                        "operationId": format!("listOrders{generation}{index}"),
                        "responses": {"200": {"description": "Orders"}}
                    }
                }),
            )
        })
        .collect();
    json!({"swagger": "2.0", "basePath": "/", "paths": paths})
}

/// Registry over the customer and order services backed by an in-memory
/// fetcher.
pub fn in_memory_registry(fetcher: &Arc<InMemorySchemaFetcher>) -> InMemoryRegistry {
    ToolRegistry::new(
        vec![
            descriptor("customer", "http://customer.test:8001"),
            descriptor("order", "http://order.test:8002"),
        ],
        Arc::clone(fetcher),
        Arc::new(DefaultClock),
    )
    .expect("unique services")
}
