//! Shared helpers for tests.

pub use std::sync::Arc;

pub use axum::http::StatusCode;
pub use axum_test::TestServer;
pub use serde_json::json;
pub use uuid::Uuid;

pub use crate::{
	route::post::{
		model::{Filter, Post, Sort},
		PostService,
	},
	store::{MemoryStore, PostStore},
};

/// A service backed by a fresh in-memory store, along with the store itself.
pub fn service() -> (PostService, Arc<MemoryStore>) {
	let store = Arc::new(MemoryStore::new());

	(PostService::new(store.clone()), store)
}

/// A test server running the whole application on a fresh in-memory store.
pub fn server() -> (TestServer, Arc<MemoryStore>) {
	let (posts, store) = service();
	let app = crate::route::app(crate::State { posts });

	(TestServer::new(app).unwrap(), store)
}
