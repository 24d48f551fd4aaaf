use schemars::JsonSchema;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// A path containing a single resource id.
#[derive(Deserialize, Validate, JsonSchema)]
pub struct IdInput {
	pub id: Uuid,
}
