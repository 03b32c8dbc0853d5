//! HTTP edge of the server: wraps module routers in the shared middleware
//! stack, adds health and documentation routes and serves them.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use axum::body::Bytes;
use axum::http::{header, HeaderValue};
use axum::{middleware::from_fn, routing::get, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

mod config;
pub mod openapi;
pub mod request_id;
mod web;

pub use config::ApiIngressConfig;

/// Owns the edge configuration; turns module routes into the served router.
pub struct ApiIngress {
    // Lock-free config using arc-swap for read-mostly access
    config: ArcSwap<ApiIngressConfig>,
}

impl Default for ApiIngress {
    fn default() -> Self {
        Self::new(ApiIngressConfig::default())
    }
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
        }
    }

    pub fn get_config(&self) -> ApiIngressConfig {
        (**self.config.load()).clone()
    }

    pub fn set_config(&self, config: ApiIngressConfig) {
        self.config.store(Arc::new(config));
    }

    /// Wrap the module routes with health, docs and the middleware stack.
    pub fn build_router(&self, routes: Router, doc: utoipa::openapi::OpenApi) -> Result<Router> {
        let config = self.get_config();
        tracing::debug!("Building router");

        let mut router = routes
            .route("/health", get(web::health_check))
            .fallback(web::not_found);

        if config.enable_docs {
            let json = Bytes::from(
                serde_json::to_vec(&doc).context("Failed to serialize OpenAPI document")?,
            );
            router = router
                .route(
                    "/openapi.json",
                    get(move || {
                        let json = json.clone();
                        async move { ([(header::CONTENT_TYPE, "application/json")], json) }
                    }),
                )
                .route("/docs", get(web::serve_docs));
        }

        // Layers wrap inside-out; the request passes them from the bottom of this list up:
        // SetRequestId -> PropagateRequestId -> Trace -> push_req_id_to_extensions
        // -> stamp_problem_request_id -> Timeout -> CORS -> BodyLimit
        router = router.layer(RequestBodyLimitLayer::new(config.body_limit_bytes));

        if config.cors_enabled {
            router = router.layer(cors_layer(&config.cors_allowed_origins)?);
        }

        router = router
            .layer(TimeoutLayer::new(config.request_timeout))
            .layer(from_fn(request_id::stamp_problem_request_id))
            .layer(from_fn(request_id::push_req_id_to_extensions))
            .layer(request_id::create_trace_layer());

        let x_request_id = request_id::header();
        router = router
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId));

        Ok(router)
    }

    /// Bind `addr` and serve until `cancel` fires.
    pub async fn serve(
        &self,
        router: Router,
        addr: SocketAddr,
        cancel: CancellationToken,
    ) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        self.serve_on(listener, router, cancel).await
    }

    /// Serve on an already bound listener; graceful shutdown on cancel.
    pub async fn serve_on(
        &self,
        listener: TcpListener,
        router: Router,
        cancel: CancellationToken,
    ) -> Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!("HTTP server bound on {}", addr);

        let shutdown = async move {
            cancel.cancelled().await;
            tracing::info!("HTTP server shutting down gracefully (cancellation)");
        };

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| anyhow::anyhow!(e))
    }
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    if origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }
    let origins = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o).with_context(|| format!("Invalid CORS origin '{o}'"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any))
}
