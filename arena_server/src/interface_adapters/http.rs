// JSON body for HTTP error responses.

#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
