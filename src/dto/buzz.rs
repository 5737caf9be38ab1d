use serde::Serialize;
use utoipa::ToSchema;

/// Current promotional message.
#[derive(Debug, Serialize, ToSchema)]
pub struct BuzzResponse {
    pub message: String,
}
