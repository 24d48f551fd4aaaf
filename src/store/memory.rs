use std::{
	collections::HashMap,
	sync::atomic::{AtomicBool, Ordering},
};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ConnectionState, Error, Lifecycle, PostStore, Result};
use crate::route::post::model::{Filter, NewPost, Post, PostChanges, Sort};

/// A store that keeps posts in memory.
///
/// Nothing survives a restart. Useful for running the service without a database
/// and for tests, which can also make it fail on purpose with [`MemoryStore::set_available`].
#[derive(Debug)]
pub struct MemoryStore {
	posts: RwLock<HashMap<Uuid, Post>>,
	available: AtomicBool,
	lifecycle: Lifecycle,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self {
			posts: RwLock::default(),
			available: AtomicBool::new(true),
			lifecycle: Lifecycle::default(),
		}
	}

	/// Makes every following operation fail with [`Error::Unavailable`] until re-enabled.
	pub fn set_available(&self, available: bool) {
		self.available.store(available, Ordering::Release);
	}

	fn check_available(&self) -> Result<()> {
		if self.available.load(Ordering::Acquire) {
			Ok(())
		} else {
			Err(Error::Unavailable)
		}
	}
}

impl Default for MemoryStore {
	fn default() -> Self {
		Self::new()
	}
}

#[axum::async_trait]
impl PostStore for MemoryStore {
	async fn connect(&self) -> Result<()> {
		if self.lifecycle.begin_connect() {
			self.lifecycle.finish_connect(true);
			tracing::info!("using in-memory post store");
		}

		Ok(())
	}

	async fn close(&self) {
		self.lifecycle.begin_close();
	}

	fn state(&self) -> ConnectionState {
		self.lifecycle.state()
	}

	async fn insert(&self, post: NewPost, now: DateTime<Utc>) -> Result<Post> {
		self.check_available()?;

		let post = Post {
			// v7 ids are time-ordered, so ties on timestamps still follow insertion order
			id: Uuid::now_v7(),
			title: post.title,
			author: post.author,
			contents: post.contents,
			tags: post.tags,
			created_at: now,
			updated_at: now,
		};

		self.posts.write().await.insert(post.id, post.clone());

		Ok(post)
	}

	async fn find(&self, filter: &Filter, sort: Sort) -> Result<Vec<Post>> {
		self.check_available()?;

		let mut posts = self
			.posts
			.read()
			.await
			.values()
			.filter(|post| filter.matches(post))
			.cloned()
			.collect::<Vec<_>>();

		posts.sort_by(|a, b| sort.compare(a, b));

		Ok(posts)
	}

	async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>> {
		self.check_available()?;

		Ok(self.posts.read().await.get(&id).cloned())
	}

	async fn update(
		&self,
		id: Uuid,
		changes: PostChanges,
		now: DateTime<Utc>,
	) -> Result<Option<Post>> {
		self.check_available()?;

		let mut posts = self.posts.write().await;
		let Some(post) = posts.get_mut(&id) else {
			return Ok(None);
		};

		changes.apply(post);
		post.updated_at = now.max(post.updated_at + Duration::microseconds(1));

		Ok(Some(post.clone()))
	}

	async fn delete(&self, id: Uuid) -> Result<bool> {
		self.check_available()?;

		Ok(self.posts.write().await.remove(&id).is_some())
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::route::post::model::{SortField, SortOrder};

	fn new_post(title: &str, author: &str, tags: &[&str]) -> NewPost {
		NewPost {
			title: title.into(),
			author: Some(author.into()),
			contents: None,
			tags: tags.iter().map(|&tag| tag.to_owned()).collect(),
		}
	}

	#[tokio::test]
	async fn test_insert_sets_both_timestamps() {
		let store = MemoryStore::new();
		let now = Utc::now();

		let post = store
			.insert(new_post("Hello", "Daniel Bugl", &[]), now)
			.await
			.unwrap();

		assert_eq!(post.created_at, now);
		assert_eq!(post.updated_at, now);
		assert_eq!(store.find_by_id(post.id).await.unwrap(), Some(post));
	}

	#[tokio::test]
	async fn test_same_timestamp_is_ordered_by_id() {
		let store = MemoryStore::new();
		let now = Utc::now();

		for title in ["a", "b", "c"] {
			store
				.insert(new_post(title, "Daniel Bugl", &[]), now)
				.await
				.unwrap();
		}

		let ascending = store
			.find(
				&Filter::All,
				Sort::new(SortField::CreatedAt, SortOrder::Ascending),
			)
			.await
			.unwrap();
		let mut descending = store.find(&Filter::All, Sort::default()).await.unwrap();
		descending.reverse();

		assert!(ascending.windows(2).all(|pair| pair[0].id < pair[1].id));
		assert_eq!(ascending, descending);
	}

	#[tokio::test]
	async fn test_find_filters() {
		let store = MemoryStore::new();
		let now = Utc::now();

		store
			.insert(new_post("a", "Daniel Bugl", &["react"]), now)
			.await
			.unwrap();
		store
			.insert(new_post("b", "Jane Dev", &["rust", "react"]), now)
			.await
			.unwrap();
		store
			.insert(new_post("c", "Jane Dev", &["rust"]), now)
			.await
			.unwrap();

		let by_author = store
			.find(&Filter::Author("Jane Dev".into()), Sort::default())
			.await
			.unwrap();
		let by_tag = store
			.find(&Filter::Tag("react".into()), Sort::default())
			.await
			.unwrap();

		assert_eq!(by_author.len(), 2);
		assert_eq!(by_tag.len(), 2);
		assert!(by_tag.iter().all(|p| p.tags.contains(&"react".to_owned())));
	}

	#[tokio::test]
	async fn test_update_advances_timestamp_on_same_clock() {
		let store = MemoryStore::new();
		let now = Utc::now();
		let post = store
			.insert(new_post("a", "Daniel Bugl", &[]), now)
			.await
			.unwrap();

		let updated = store
			.update(post.id, PostChanges::default(), now)
			.await
			.unwrap()
			.unwrap();

		assert!(updated.updated_at > post.updated_at);
		assert_eq!(updated.created_at, post.created_at);
	}

	#[tokio::test]
	async fn test_unknown_ids() {
		let store = MemoryStore::new();
		let id = Uuid::now_v7();

		assert_eq!(store.find_by_id(id).await.unwrap(), None);
		assert_eq!(
			store
				.update(id, PostChanges::default(), Utc::now())
				.await
				.unwrap(),
			None
		);
		assert!(!store.delete(id).await.unwrap());
	}

	#[tokio::test]
	async fn test_unavailable() {
		let store = MemoryStore::new();
		store.set_available(false);

		assert!(matches!(
			store.find(&Filter::All, Sort::default()).await,
			Err(Error::Unavailable)
		));

		store.set_available(true);
		assert!(store.find(&Filter::All, Sort::default()).await.is_ok());
	}

	#[tokio::test]
	async fn test_connect_and_close() {
		let store = MemoryStore::new();

		store.connect().await.unwrap();
		store.connect().await.unwrap();
		assert_eq!(store.state(), ConnectionState::Connected);

		store.close().await;
		assert_eq!(store.state(), ConnectionState::Disconnected);
	}
}
