use std::sync::Arc;

use aide::{axum::ApiRouter, openapi::OpenApi};
use axum::{Extension, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{openapi, AppState};

pub mod docs;
pub mod model;
pub mod post;

/// Builds the full application router, including the generated `OpenAPI` document.
pub fn app(state: AppState) -> Router {
	let mut api = OpenApi::default();

	ApiRouter::new()
		.nest("/api/v1/posts", post::routes())
		.nest("/docs", docs::routes())
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
		.layer(TraceLayer::new_for_http())
		.layer(CorsLayer::permissive())
		.with_state(state)
}
