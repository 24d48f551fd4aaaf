pub use crate::route::model::IdInput;

use std::{borrow::Cow, cmp::Ordering};

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

/// A single blog post.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
	/// The unique identifier of the post.
	pub id: Uuid,
	/// The title of the post.
	pub title: String,
	/// The author of the post.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub author: Option<String>,
	/// The contents of the post.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub contents: Option<String>,
	/// Tags attached to the post, in the order they were given.
	pub tags: Vec<String>,
	/// The creation time of the post.
	pub created_at: DateTime<Utc>,
	/// The time of the last change to the post.
	pub updated_at: DateTime<Utc>,
}

/// Rejects strings that are empty once surrounding whitespace is removed.
fn not_blank(value: &str) -> Result<(), ValidationError> {
	if value.trim().is_empty() {
		return Err(title_required());
	}

	Ok(())
}

fn title_required() -> ValidationError {
	let mut error = ValidationError::new("required");
	error.message = Some(Cow::Borrowed("title is required"));

	error
}

/// Deserializes a field that is present in the payload, so an explicit
/// `null` becomes `Some(None)` while a missing key stays `None` by default.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de>,
{
	T::deserialize(deserializer).map(Some)
}

fn trimmed(value: Option<String>) -> Option<String> {
	value.map(|value| value.trim().to_owned())
}

/// The payload used to create a post.
#[derive(Debug, Default, Deserialize, Validate, JsonSchema)]
pub struct CreatePostInput {
	/// The title of the post. Leading and trailing whitespace is removed.
	#[validate(required(message = "title is required"), custom(function = "not_blank"))]
	pub title: Option<String>,
	/// The author of the post.
	pub author: Option<String>,
	/// The contents of the post.
	pub contents: Option<String>,
	/// Tags attached to the post. Defaults to no tags.
	pub tags: Option<Vec<String>>,
}

/// A validated and normalized post that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
	pub title: String,
	pub author: Option<String>,
	pub contents: Option<String>,
	pub tags: Vec<String>,
}

impl CreatePostInput {
	/// Validates the payload and normalizes it into a [`NewPost`].
	pub fn into_new_post(self) -> Result<NewPost, ValidationErrors> {
		self.validate()?;

		Ok(NewPost {
			title: trimmed(self.title).unwrap_or_default(),
			author: trimmed(self.author),
			contents: trimmed(self.contents),
			tags: self.tags.unwrap_or_default(),
		})
	}
}

/// A partial payload used to update a post.
///
/// Only fields that are present are changed. A `null` author, contents or
/// tags is the same as leaving the key out.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct UpdatePostInput {
	/// The new title of the post. Must not be null or blank if present.
	#[serde(default, deserialize_with = "present")]
	pub title: Option<Option<String>>,
	/// The new author of the post.
	pub author: Option<String>,
	/// The new contents of the post.
	pub contents: Option<String>,
	/// The new tags of the post, replacing the old ones.
	pub tags: Option<Vec<String>>,
}

/// A validated and normalized set of changes to a post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostChanges {
	pub title: Option<String>,
	pub author: Option<String>,
	pub contents: Option<String>,
	pub tags: Option<Vec<String>>,
}

impl Validate for UpdatePostInput {
	fn validate(&self) -> Result<(), ValidationErrors> {
		let mut errors = ValidationErrors::new();

		match &self.title {
			Some(Some(title)) => {
				if let Err(error) = not_blank(title) {
					errors.add("title", error);
				}
			}
			Some(None) => errors.add("title", title_required()),
			None => {}
		}

		if errors.is_empty() {
			Ok(())
		} else {
			Err(errors)
		}
	}
}

impl UpdatePostInput {
	/// Validates the payload and normalizes it into [`PostChanges`].
	pub fn into_changes(self) -> Result<PostChanges, ValidationErrors> {
		self.validate()?;

		Ok(PostChanges {
			title: trimmed(self.title.flatten()),
			author: trimmed(self.author),
			contents: trimmed(self.contents),
			tags: self.tags,
		})
	}
}

impl PostChanges {
	/// Applies the changes to a post in place, leaving absent fields untouched.
	pub fn apply(self, post: &mut Post) {
		if let Some(title) = self.title {
			post.title = title;
		}

		if let Some(author) = self.author {
			post.author = Some(author);
		}

		if let Some(contents) = self.contents {
			post.contents = Some(contents);
		}

		if let Some(tags) = self.tags {
			post.tags = tags;
		}
	}
}

/// Which posts a listing returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Filter {
	#[default]
	All,
	/// Posts whose author is exactly the given string.
	Author(String),
	/// Posts whose tags contain exactly the given string.
	Tag(String),
}

impl Filter {
	pub fn matches(&self, post: &Post) -> bool {
		match self {
			Self::All => true,
			Self::Author(author) => post.author.as_deref() == Some(author.as_str()),
			Self::Tag(tag) => post.tags.iter().any(|t| t == tag),
		}
	}
}

/// A field posts can be sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
	#[default]
	CreatedAt,
	UpdatedAt,
	Title,
	Author,
}

impl SortField {
	pub fn column(self) -> &'static str {
		match self {
			Self::CreatedAt => "created_at",
			Self::UpdatedAt => "updated_at",
			Self::Title => "title",
			Self::Author => "author",
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
	Ascending,
	#[default]
	Descending,
}

impl SortOrder {
	/// Parses a sort order leniently: anything starting with `asc` is ascending,
	/// everything else is descending.
	pub fn parse(value: &str) -> Self {
		if value.to_ascii_lowercase().starts_with("asc") {
			Self::Ascending
		} else {
			Self::Descending
		}
	}

	pub fn keyword(self) -> &'static str {
		match self {
			Self::Ascending => "ASC",
			Self::Descending => "DESC",
		}
	}
}

/// A total ordering over posts.
///
/// Ties on the primary field are broken by `id` in the same direction as the
/// primary field, so two listings that only differ in direction are exact reverses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sort {
	pub field: SortField,
	pub order: SortOrder,
}

impl Sort {
	pub fn new(field: SortField, order: SortOrder) -> Self {
		Self { field, order }
	}

	pub fn compare(&self, a: &Post, b: &Post) -> Ordering {
		let primary = match self.field {
			SortField::CreatedAt => a.created_at.cmp(&b.created_at),
			SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
			SortField::Title => a.title.cmp(&b.title),
			// missing authors order before present ones
			SortField::Author => a.author.cmp(&b.author),
		};
		let ordering = primary.then_with(|| a.id.cmp(&b.id));

		match self.order {
			SortOrder::Ascending => ordering,
			SortOrder::Descending => ordering.reverse(),
		}
	}

	/// Renders the ordering as an SQL `ORDER BY` clause matching [`Sort::compare`].
	pub fn order_by(&self) -> String {
		let direction = self.order.keyword();
		let nulls = match self.order {
			SortOrder::Ascending => "NULLS FIRST",
			SortOrder::Descending => "NULLS LAST",
		};

		format!(
			"ORDER BY {column} {direction} {nulls}, id {direction}",
			column = self.field.column()
		)
	}
}

/// Query parameters for listing posts.
#[derive(Debug, Default, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListPostsQuery {
	/// Only return posts by this exact author. Takes precedence over `tag`.
	pub author: Option<String>,
	/// Only return posts with this exact tag.
	pub tag: Option<String>,
	/// The field to sort by, `createdAt` by default.
	pub sort_by: Option<SortField>,
	/// `ascending` or `descending` (the default).
	pub sort_order: Option<String>,
}

impl ListPostsQuery {
	pub fn filter(&self) -> Filter {
		let present = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());

		if let Some(author) = present(&self.author) {
			Filter::Author(author)
		} else if let Some(tag) = present(&self.tag) {
			Filter::Tag(tag)
		} else {
			Filter::All
		}
	}

	pub fn sort(&self) -> Sort {
		Sort::new(
			self.sort_by.unwrap_or_default(),
			self.sort_order
				.as_deref()
				.map_or_else(SortOrder::default, SortOrder::parse),
		)
	}
}
