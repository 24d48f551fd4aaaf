use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::model::{CreatePostInput, Filter, Post, Sort, UpdatePostInput};
use crate::store::{self, PostStore};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error(transparent)]
	Store(#[from] store::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The outcome of [`PostService::delete_post`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Deleted {
	pub deleted: bool,
}

/// CRUD and listing of posts on top of a [`PostStore`].
///
/// Payloads are validated before the store is touched, so an invalid
/// payload never results in a write.
#[derive(Clone)]
pub struct PostService {
	store: Arc<dyn PostStore>,
}

impl PostService {
	pub fn new(store: Arc<dyn PostStore>) -> Self {
		Self { store }
	}

	#[tracing::instrument(skip_all)]
	pub async fn create_post(&self, input: CreatePostInput) -> Result<Post> {
		let post = input.into_new_post()?;
		let post = self.store.insert(post, Utc::now()).await?;

		tracing::debug!(id = %post.id, "created post");

		Ok(post)
	}

	pub async fn list_posts(&self, filter: &Filter, sort: Sort) -> Result<Vec<Post>> {
		Ok(self.store.find(filter, sort).await?)
	}

	pub async fn list_all_posts(&self, sort: Sort) -> Result<Vec<Post>> {
		self.list_posts(&Filter::All, sort).await
	}

	pub async fn list_posts_by_author(&self, author: &str, sort: Sort) -> Result<Vec<Post>> {
		self.list_posts(&Filter::Author(author.to_owned()), sort)
			.await
	}

	pub async fn list_posts_by_tag(&self, tag: &str, sort: Sort) -> Result<Vec<Post>> {
		self.list_posts(&Filter::Tag(tag.to_owned()), sort).await
	}

	/// Returns `None` if no post has the given id.
	pub async fn get_post_by_id(&self, id: Uuid) -> Result<Option<Post>> {
		Ok(self.store.find_by_id(id).await?)
	}

	/// Applies a partial update, returning `None` if no post has the given id.
	///
	/// The payload is validated first, so an invalid payload is reported
	/// even when the post does not exist.
	#[tracing::instrument(skip(self, input))]
	pub async fn update_post(&self, id: Uuid, input: UpdatePostInput) -> Result<Option<Post>> {
		let changes = input.into_changes()?;

		Ok(self.store.update(id, changes, Utc::now()).await?)
	}

	#[tracing::instrument(skip(self))]
	pub async fn delete_post(&self, id: Uuid) -> Result<Deleted> {
		let deleted = self.store.delete(id).await?;

		Ok(Deleted { deleted })
	}
}
