// Shared HTTP response types for the door query endpoints.

#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    // Human-readable reason, e.g. "door not found".
    pub error: String,
}
