use axum::{
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
};
use macros::route;

use crate::{
	extract::{Json, Path, Query},
	openapi::tag,
};

use super::{model, Error, PostService, RouteError};

/// List posts
/// Returns all posts, newest first unless `sortBy`/`sortOrder` say otherwise.
/// Filters by exact `author`, or else by exact `tag`.
/// `sortBy` is one of `createdAt`, `updatedAt`, `title` or `author`; any other value is rejected with 400.
#[route(tag = tag::POST, response(status = 400, description = "Unknown `sortBy` field.", shape = "Json<crate::error::ErrorResponse<'static>>"))]
pub async fn get_posts(
	State(posts): State<PostService>,
	Query(query): Query<model::ListPostsQuery>,
) -> Result<Json<Vec<model::Post>>, RouteError> {
	let sort = query.sort();
	let posts = match query.filter() {
		model::Filter::All => posts.list_all_posts(sort).await?,
		model::Filter::Author(author) => posts.list_posts_by_author(&author, sort).await?,
		model::Filter::Tag(tag) => posts.list_posts_by_tag(&tag, sort).await?,
	};

	Ok(Json(posts))
}

/// Get single post
/// Returns a single post by its unique id.
#[route(tag = tag::POST, response(status = 404, description = "No post has this id."))]
pub async fn get_post(
	State(posts): State<PostService>,
	Path(path): Path<model::IdInput>,
) -> Result<Json<model::Post>, RouteError> {
	let post = posts.get_post_by_id(path.id).await?;

	Ok(Json(post.ok_or(Error::UnknownPost(path.id))?))
}

/// Create post
/// Creates a new post. Only the title is required.
#[route(tag = tag::POST, response(status = 201, description = "The created post.", shape = "Json<model::Post>"))]
pub async fn create_post(
	State(posts): State<PostService>,
	Json(input): Json<model::CreatePostInput>,
) -> Result<Response, RouteError> {
	let post = posts.create_post(input).await?;

	Ok((StatusCode::CREATED, Json(post)).into_response())
}

/// Update post
/// Updates the given fields of an existing post by its unique id.
#[route(tag = tag::POST, response(status = 404, description = "No post has this id."))]
pub async fn update_post(
	State(posts): State<PostService>,
	Path(path): Path<model::IdInput>,
	Json(input): Json<model::UpdatePostInput>,
) -> Result<Json<model::Post>, RouteError> {
	let post = posts.update_post(path.id, input).await?;

	Ok(Json(post.ok_or(Error::UnknownPost(path.id))?))
}

/// Delete post
/// Deletes an existing post by its unique id.
#[route(tag = tag::POST, response(status = 204, description = "The post was deleted."), response(status = 404, description = "No post has this id."))]
pub async fn delete_post(
	State(posts): State<PostService>,
	Path(path): Path<model::IdInput>,
) -> Result<Response, RouteError> {
	if !posts.delete_post(path.id).await?.deleted {
		return Err(Error::UnknownPost(path.id).into());
	}

	Ok(StatusCode::NO_CONTENT.into_response())
}
