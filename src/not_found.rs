use axum::{
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};

pub async fn get_404_not_found(uri: Uri) -> Response {
    tracing::debug!("No route for {uri}");
    (StatusCode::NOT_FOUND, "Not found").into_response()
}
