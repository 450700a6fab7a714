//! Defines the plain-text response for an internal server error.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

pub struct InternalServerError<'a> {
    pub description: &'a str,
}

impl Default for InternalServerError<'_> {
    fn default() -> Self {
        Self {
            description: "Sorry, something went wrong. Try again later or check the server logs.",
        }
    }
}

impl IntoResponse for InternalServerError<'_> {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.description.to_owned()).into_response()
    }
}
