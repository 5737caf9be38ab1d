use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Sign-in with a pre-shared custom token.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CustomTokenRequest {
    #[validate(length(min = 1, max = 256))]
    pub token: String,
}

/// Session issued by a successful sign-in. `token` goes in the `Authorization: Bearer` header.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub user_id: String,
    pub anonymous: bool,
}
