use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{ConnectionState, Lifecycle, PostStore, Result};
use crate::{
	config::DatabaseConfig,
	route::post::model::{Filter, NewPost, Post, PostChanges, Sort},
};

/// A store backed by the `post` table of a PostgreSQL database.
#[derive(Debug)]
pub struct PgStore {
	pool: PgPool,
	lifecycle: Lifecycle,
}

impl PgStore {
	/// Creates the store with a lazily connected pool. Nothing is opened until [`PostStore::connect`].
	pub fn new(config: &DatabaseConfig) -> Result<Self> {
		let pool = PgPoolOptions::new()
			.max_connections(config.max_connections)
			.acquire_timeout(Duration::from_secs(10))
			.connect_lazy(&config.url)?;

		Ok(Self::from_pool(pool))
	}

	pub fn from_pool(pool: PgPool) -> Self {
		Self {
			pool,
			lifecycle: Lifecycle::default(),
		}
	}

	async fn migrate(&self) -> Result<()> {
		sqlx::migrate!("./migrations").run(&self.pool).await?;

		Ok(())
	}
}

#[axum::async_trait]
impl PostStore for PgStore {
	async fn connect(&self) -> Result<()> {
		if !self.lifecycle.begin_connect() {
			tracing::debug!("database already connected or connecting, skipping");
			return Ok(());
		}

		let result = self.migrate().await;
		self.lifecycle.finish_connect(result.is_ok());

		if result.is_ok() {
			tracing::info!("successfully connected to database");
		}

		result
	}

	async fn close(&self) {
		if self.lifecycle.begin_close() {
			self.pool.close().await;
			tracing::info!("database connection closed");
		}
	}

	fn state(&self) -> ConnectionState {
		self.lifecycle.state()
	}

	async fn insert(&self, post: NewPost, now: DateTime<Utc>) -> Result<Post> {
		let post = sqlx::query_as::<_, Post>(
			r#"
				INSERT INTO post (title, author, contents, tags, created_at, updated_at)
				VALUES ($1, $2, $3, $4, $5, $5)
				RETURNING *
			"#,
		)
		.bind(post.title)
		.bind(post.author)
		.bind(post.contents)
		.bind(post.tags)
		.bind(now)
		.fetch_one(&self.pool)
		.await?;

		Ok(post)
	}

	async fn find(&self, filter: &Filter, sort: Sort) -> Result<Vec<Post>> {
		let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM post ");

		match filter {
			Filter::All => {}
			Filter::Author(author) => {
				query.push("WHERE author = ").push_bind(author).push(" ");
			}
			Filter::Tag(tag) => {
				query.push("WHERE ").push_bind(tag).push(" = ANY(tags) ");
			}
		}

		// column and direction come from closed enums, never from user input
		query.push(sort.order_by());

		let posts = query.build_query_as::<Post>().fetch_all(&self.pool).await?;

		Ok(posts)
	}

	async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>> {
		let post = sqlx::query_as::<_, Post>(
			r#"
				SELECT * FROM post
				WHERE id = $1
			"#,
		)
		.bind(id)
		.fetch_optional(&self.pool)
		.await?;

		Ok(post)
	}

	async fn update(
		&self,
		id: Uuid,
		changes: PostChanges,
		now: DateTime<Utc>,
	) -> Result<Option<Post>> {
		let post = sqlx::query_as::<_, Post>(
			r#"
				UPDATE post
				SET title = COALESCE($1, title),
					author = COALESCE($2, author),
					contents = COALESCE($3, contents),
					tags = COALESCE($4, tags),
					updated_at = GREATEST($5, updated_at + INTERVAL '1 microsecond')
				WHERE id = $6
				RETURNING *
			"#,
		)
		.bind(changes.title)
		.bind(changes.author)
		.bind(changes.contents)
		.bind(changes.tags)
		.bind(now)
		.bind(id)
		.fetch_optional(&self.pool)
		.await?;

		Ok(post)
	}

	async fn delete(&self, id: Uuid) -> Result<bool> {
		let status = sqlx::query(
			r#"
				DELETE FROM post
				WHERE id = $1
			"#,
		)
		.bind(id)
		.execute(&self.pool)
		.await?;

		Ok(status.rows_affected() > 0)
	}
}
