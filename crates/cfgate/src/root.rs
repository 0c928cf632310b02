//! API discovery documents served at `/` and `/v3`.

use std::sync::Arc;

use cfgate_core::{handler_fn, ApiResponse, RequestContext};
use cfgate_server::{Route, RouteSet};
use serde_json::{json, Map, Value};

/// Cloud Controller API version advertised at `/`.
pub const CC_API_VERSION: &str = "3.117.0+cf-k8s";

/// Collections linked from `/v3`.
pub const V3_RESOURCES: &[&str] = &[
    "apps",
    "buildpacks",
    "builds",
    "deployments",
    "domains",
    "droplets",
    "jobs",
    "organizations",
    "packages",
    "processes",
    "roles",
    "routes",
    "service_brokers",
    "service_credential_bindings",
    "service_instances",
    "service_offerings",
    "service_plans",
    "spaces",
    "tasks",
    "users",
];

/// Serves the discovery documents. Both routes skip authentication.
#[derive(Debug, Clone)]
pub struct Root {
    root: Arc<Value>,
    v3: Arc<Value>,
}

impl Root {
    /// Builds both documents for `server_url`.
    pub fn new(server_url: &str) -> Self {
        let server_url = server_url.trim_end_matches('/');
        Self {
            root: Arc::new(root_document(server_url)),
            v3: Arc::new(v3_document(server_url)),
        }
    }

    /// Body of `GET /`.
    #[must_use]
    pub fn root_document(&self) -> &Value {
        &self.root
    }

    /// Body of `GET /v3`.
    #[must_use]
    pub fn v3_document(&self) -> &Value {
        &self.v3
    }
}

fn root_document(server_url: &str) -> Value {
    json!({
        "links": {
            "self": { "href": server_url },
            "bits_service": null,
            "cloud_controller_v2": null,
            "cloud_controller_v3": {
                "href": format!("{server_url}/v3"),
                "meta": { "version": CC_API_VERSION },
            },
            "network_policy_v0": null,
            "network_policy_v1": null,
            "login": { "href": server_url },
            "uaa": null,
            "credhub": null,
            "routing": null,
            "logging": null,
            "log_cache": { "href": server_url },
            "log_stream": null,
            "app_ssh": null,
        },
        "cf_on_k8s": true,
    })
}

fn v3_document(server_url: &str) -> Value {
    let mut links = Map::new();
    links.insert("self".to_string(), json!({ "href": format!("{server_url}/v3") }));
    for resource in V3_RESOURCES {
        links.insert(
            (*resource).to_string(),
            json!({ "href": format!("{server_url}/v3/{resource}") }),
        );
    }
    json!({ "links": links })
}

impl RouteSet for Root {
    fn unauthenticated_routes(&self) -> Vec<Route> {
        let root = Arc::clone(&self.root);
        let v3 = Arc::clone(&self.v3);
        vec![
            Route::get(
                "/",
                handler_fn(move |_ctx: RequestContext| {
                    let body = Arc::clone(&root);
                    async move { Ok(ApiResponse::ok(body.as_ref().clone())) }
                }),
            ),
            Route::get(
                "/v3",
                handler_fn(move |_ctx: RequestContext| {
                    let body = Arc::clone(&v3);
                    async move { Ok(ApiResponse::ok(body.as_ref().clone())) }
                }),
            ),
        ]
    }
}
