use std::borrow::Cow;

use aide::OperationOutput;
use axum::{
	body::Body,
	extract::rejection,
	http::{Response, StatusCode},
	response::IntoResponse,
};
use schemars::JsonSchema;
use serde::Serialize;

use crate::{extract::Json, route::post::service, store};

/// A single error message sent to the client.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Message<'a> {
	/// A human-readable description of the error.
	pub content: Cow<'a, str>,
	/// The request field the error refers to, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<Cow<'a, str>>,
}

impl<'a> Message<'a> {
	pub fn new(content: impl Into<Cow<'a, str>>) -> Self {
		Self {
			content: content.into(),
			field: None,
		}
	}

	#[must_use]
	pub fn field(mut self, field: impl Into<Cow<'a, str>>) -> Self {
		self.field = Some(field.into());
		self
	}

	pub fn into_vec(self) -> Vec<Self> {
		vec![self]
	}
}

/// The body of every error response that has one.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorResponse<'a> {
	pub errors: Vec<Message<'a>>,
}

/// Describes how a route-specific error is presented to the client.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;

	/// The messages sent in the response body. An empty list sends no body at all.
	fn into_errors(self) -> Vec<Message<'static>>;
}

/// Errors shared by every route.
///
/// The Display trait is not sent to the client, so it can show
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("json error: {0}")]
	Json(#[from] rejection::JsonRejection),
	#[error("query error: {0}")]
	Query(#[from] rejection::QueryRejection),
	#[error("path error: {0}")]
	Path(#[from] rejection::PathRejection),
	#[error("store error: {0}")]
	Store(#[from] store::Error),
}

impl From<service::Error> for AppError {
	fn from(error: service::Error) -> Self {
		match error {
			service::Error::Validation(errors) => Self::Validation(errors),
			service::Error::Store(error) => Self::Store(error),
		}
	}
}

fn error_response(status: StatusCode, errors: Vec<Message<'_>>) -> Response<Body> {
	(status, Json(ErrorResponse { errors })).into_response()
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::Validation(errors) => {
				let mut messages = errors
					.field_errors()
					.into_iter()
					.flat_map(|(field, errors)| {
						errors.iter().map(move |error| {
							let content = error
								.message
								.as_ref()
								.map_or_else(|| format!("{field}: {}", error.code), ToString::to_string);

							Message::new(content).field(field.to_string())
						})
					})
					.collect::<Vec<_>>();

				// field_errors is backed by a map, keep the output stable
				messages.sort_by(|a, b| a.field.cmp(&b.field));

				error_response(StatusCode::BAD_REQUEST, messages)
			}
			Self::Json(rejection) => error_response(
				rejection.status(),
				Message::new(rejection.body_text()).into_vec(),
			),
			Self::Query(rejection) => error_response(
				rejection.status(),
				Message::new(rejection.body_text()).into_vec(),
			),
			Self::Path(rejection) => error_response(
				rejection.status(),
				Message::new(rejection.body_text()).field("id").into_vec(),
			),
			Self::Store(error) => {
				tracing::error!(%error, "store failure");

				error_response(
					StatusCode::INTERNAL_SERVER_ERROR,
					Message::new("an internal error occurred").into_vec(),
				)
			}
		}
	}
}

/// The error type returned by route handlers: either an error shared by all
/// routes, or one specific to the route module.
#[derive(Debug)]
pub enum RouteError<E> {
	App(AppError),
	Route(E),
}

impl<E: ErrorShape> From<E> for RouteError<E> {
	fn from(error: E) -> Self {
		Self::Route(error)
	}
}

impl<E> From<AppError> for RouteError<E> {
	fn from(error: AppError) -> Self {
		Self::App(error)
	}
}

impl<E> From<service::Error> for RouteError<E> {
	fn from(error: service::Error) -> Self {
		Self::App(error.into())
	}
}

impl<E: ErrorShape> IntoResponse for RouteError<E> {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::App(error) => error.into_response(),
			Self::Route(error) => {
				let status = error.status();
				let errors = error.into_errors();

				if errors.is_empty() {
					status.into_response()
				} else {
					error_response(status, errors)
				}
			}
		}
	}
}

impl<E> OperationOutput for RouteError<E> {
	type Inner = Self;
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_message_builder() {
		let message = Message::new("title is required").field("title");

		let value = serde_json::to_value(&message).unwrap();

		assert_eq!(value["content"], "title is required");
		assert_eq!(value["field"], "title");
	}

	#[test]
	fn test_message_skips_empty_fields() {
		let value = serde_json::to_value(Message::new("oops")).unwrap();

		assert_eq!(value, serde_json::json!({ "content": "oops" }));
	}

	#[test]
	fn test_store_error_hides_details() {
		let response = AppError::Store(store::Error::Unavailable).into_response();

		assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	}
}
