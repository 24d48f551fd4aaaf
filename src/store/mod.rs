//! Persistence for posts.
//!
//! The service only talks to a [`PostStore`]. [`postgres::PgStore`] is used in
//! production, [`memory::MemoryStore`] for local development and tests.

pub mod memory;
pub mod postgres;

use std::sync::{
	atomic::{AtomicU8, Ordering},
	Arc,
};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
	config::{Config, StoreKind},
	route::post::model::{Filter, NewPost, Post, PostChanges, Sort},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Any failure coming from the underlying store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("migration error: {0}")]
	Migrate(#[from] sqlx::migrate::MigrateError),
	#[error("store is unavailable")]
	Unavailable,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[axum::async_trait]
pub trait PostStore: Send + Sync {
	/// Establishes the connection to the store.
	///
	/// Calling this while already connected or connecting is a no-op.
	async fn connect(&self) -> Result<()>;

	/// Closes the connection, waiting until it is fully shut down.
	async fn close(&self);

	fn state(&self) -> ConnectionState;

	/// Stores a new post with `created_at` and `updated_at` both set to `now`,
	/// returning it with its generated id.
	async fn insert(&self, post: NewPost, now: DateTime<Utc>) -> Result<Post>;

	async fn find(&self, filter: &Filter, sort: Sort) -> Result<Vec<Post>>;

	async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>>;

	/// Applies `changes` to the post with the given id.
	///
	/// `updated_at` becomes `now`, or one microsecond past its previous value
	/// if that is later, so it always advances.
	async fn update(&self, id: Uuid, changes: PostChanges, now: DateTime<Utc>)
		-> Result<Option<Post>>;

	/// Deletes the post with the given id, returning whether it existed.
	async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// Builds the store selected in the configuration.
///
/// The returned store is not connected yet.
pub fn from_config(config: &Config) -> Result<Arc<dyn PostStore>> {
	Ok(match config.store {
		StoreKind::Postgres => Arc::new(PgStore::new(&config.database)?),
		StoreKind::Memory => Arc::new(MemoryStore::new()),
	})
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
	Disconnected,
	Connecting,
	Connected,
}

impl ConnectionState {
	const fn into_u8(self) -> u8 {
		match self {
			Self::Disconnected => 0,
			Self::Connecting => 1,
			Self::Connected => 2,
		}
	}

	const fn from_u8(value: u8) -> Self {
		match value {
			1 => Self::Connecting,
			2 => Self::Connected,
			_ => Self::Disconnected,
		}
	}
}

/// Tracks the [`ConnectionState`] of a store.
#[derive(Debug)]
pub struct Lifecycle(AtomicU8);

impl Default for Lifecycle {
	fn default() -> Self {
		Self(AtomicU8::new(ConnectionState::Disconnected.into_u8()))
	}
}

impl Lifecycle {
	pub fn state(&self) -> ConnectionState {
		ConnectionState::from_u8(self.0.load(Ordering::Acquire))
	}

	/// Moves from disconnected to connecting.
	///
	/// Returns `false` if a connection is already established or in progress,
	/// in which case the caller must not connect again.
	pub fn begin_connect(&self) -> bool {
		self.0
			.compare_exchange(
				ConnectionState::Disconnected.into_u8(),
				ConnectionState::Connecting.into_u8(),
				Ordering::AcqRel,
				Ordering::Acquire,
			)
			.is_ok()
	}

	pub fn finish_connect(&self, connected: bool) {
		let state = if connected {
			ConnectionState::Connected
		} else {
			ConnectionState::Disconnected
		};

		self.0.store(state.into_u8(), Ordering::Release);
	}

	/// Moves to disconnected, returning `false` if it already was.
	pub fn begin_close(&self) -> bool {
		self.0.swap(ConnectionState::Disconnected.into_u8(), Ordering::AcqRel)
			!= ConnectionState::Disconnected.into_u8()
	}
}
