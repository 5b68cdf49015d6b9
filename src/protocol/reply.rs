use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

const SUCCESSFUL: &str = "command successfully executed";
const INVALID_REQUEST: &str = "invalid command";
const KEY_NOT_FOUND: &str = "Key not found";
const TRY_AGAIN: &str = "try again";

/// Outcome of a command, rendered as a JSON response
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The command ran
    Success,
    /// The command produced a value
    Value(String),
    /// A field failed validation
    InvalidRequest,
    /// GET on a key that does not exist
    KeyNotFound,
    /// The store refused the operation, with its reason
    Rejected(String),
    /// The request could not be served right now
    TryAgain,
}

/// JSON body: `{"value": ...}` or `{"err": ...}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum Body<'a> {
    Value(&'a str),
    Err(&'a str),
}

impl Reply {
    pub fn status(&self) -> StatusCode {
        match self {
            Reply::Success | Reply::Value(_) => StatusCode::OK,
            Reply::InvalidRequest | Reply::KeyNotFound | Reply::Rejected(_) => {
                StatusCode::BAD_REQUEST
            }
            Reply::TryAgain => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> Body<'_> {
        match self {
            Reply::Success => Body::Value(SUCCESSFUL),
            Reply::Value(v) => Body::Value(v),
            Reply::InvalidRequest => Body::Err(INVALID_REQUEST),
            Reply::KeyNotFound => Body::Err(KEY_NOT_FOUND),
            Reply::Rejected(msg) => Body::Err(msg),
            Reply::TryAgain => Body::Err(TRY_AGAIN),
        }
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
