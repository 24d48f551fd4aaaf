use aide::{openapi::Tag, transform::TransformOpenApi};

use crate::{error, extract::Json};

pub mod tag {
	pub const POST: &str = "Post";
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("Blog Service Open API")
		.summary("Blog post content service")
		.description(include_str!("../README.md"))
		.tag(Tag {
			name: tag::POST.into(),
			description: Some("Post management".into()),
			..Default::default()
		})
		.default_response_with::<Json<error::ErrorResponse>, _>(|res| {
			res.example(error::ErrorResponse {
				errors: error::Message::new("title is required")
					.field("title")
					.into_vec(),
			})
		})
}
