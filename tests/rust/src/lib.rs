//! Shared helpers for Restmux integration tests
//!
//! Builds a real gateway router wired to wiremock backends, exercised
//! in-process via `tower::ServiceExt::oneshot`.


use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use axum::Router;
use restmux_core::ServiceConfigStore;
use restmux_gateway::{DependenciesBuilder, GatewayConfig, GatewayServer, RouteTable};
use tempfile::TempDir;
use tower::ServiceExt;

/// A gateway router plus the temp directory backing its config store.
pub struct TestGateway {
    router: Router,
    _specs_dir: TempDir,
}

impl TestGateway {
    pub fn builder() -> TestGatewayBuilder {
        TestGatewayBuilder::default()
    }

    pub async fn get(&self, path_and_query: &str) -> Response {
        self.request("GET", path_and_query, None).await
    }

    pub async fn get_with_accept(&self, path_and_query: &str, accept: &str) -> Response {
        self.request("GET", path_and_query, Some(accept)).await
    }

    pub async fn request(
        &self,
        method: &str,
        path_and_query: &str,
        accept: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(path_and_query);
        if let Some(accept) = accept {
            builder = builder.header(header::ACCEPT, accept);
        }
        self.oneshot(builder.body(Body::empty()).unwrap()).await
    }

    /// Drive an arbitrary request through the router.
    pub async fn oneshot(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

#[derive(Default)]
pub struct TestGatewayBuilder {
    backends: Vec<(String, String)>,
    configs: Vec<(String, String)>,
}

impl TestGatewayBuilder {
    /// Route an API name to a backend base URL (usually a wiremock server).
    pub fn backend(mut self, api_name: &str, base_url: &str) -> Self {
        self.backends
            .push((api_name.to_string(), base_url.to_string()));
        self
    }

    /// Write a `service.yaml` for an API into the gateway's specs directory.
    pub fn service_config(mut self, api_name: &str, yaml: &str) -> Self {
        self.configs.push((api_name.to_string(), yaml.to_string()));
        self
    }

    pub fn build(self) -> TestGateway {
        let specs_dir = TempDir::new().unwrap();
        for (api_name, yaml) in &self.configs {
            let api_dir = specs_dir.path().join(api_name);
            std::fs::create_dir_all(&api_dir).unwrap();
            std::fs::write(api_dir.join("service.yaml"), yaml).unwrap();
        }

        let mut routes = RouteTable::new();
        for (api_name, base_url) in &self.backends {
            routes.register(api_name, base_url);
        }

        let config = GatewayConfig::default();
        let dependencies = DependenciesBuilder::new()
            .with_routes(routes)
            .with_config_store(ServiceConfigStore::new(specs_dir.path()))
            .build(&config);
        let server = GatewayServer::new(config, dependencies);

        TestGateway {
            router: server.build_router(),
            _specs_dir: specs_dir,
        }
    }
}

/// Collect a response body as parsed JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Collect a response body as raw bytes.
pub async fn body_bytes(response: Response) -> Vec<u8> {
    use http_body_util::BodyExt;
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

/// The response's `Content-Type`, for negotiation assertions.
pub fn content_type(response: &Response) -> String {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
