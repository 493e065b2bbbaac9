pub mod auth;

use serde::Serialize;

/// Body shape for every error the service returns: a stable message plus a
/// machine-checkable kind.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}
