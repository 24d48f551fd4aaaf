use std::sync::Arc;

use aide::{
	axum::{
		routing::{get, get_with},
		ApiRouter,
	},
	openapi::OpenApi,
	scalar::Scalar,
};
use axum::{
	response::{IntoResponse, Response},
	Extension,
};

use crate::AppState;

pub const API_URL: &str = "/docs/private/api.json";

pub fn routes() -> ApiRouter<AppState> {
	ApiRouter::new()
		.api_route(
			"/",
			get_with(
				Scalar::new(API_URL)
					.with_title("Blog Service")
					.axum_handler(),
				|op| op.description("This documentation page."),
			),
		)
		.route("/private/api.json", get(serve_docs))
}

async fn serve_docs(Extension(api): Extension<Arc<OpenApi>>) -> Response {
	axum::Json(api.as_ref()).into_response()
}
