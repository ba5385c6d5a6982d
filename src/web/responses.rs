use axum::Json;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Serialize;
use tracing::{error, warn};

use crate::error::{LibraryError, LibraryResult};
use crate::session::Viewer;
use crate::web::templates::render_error_page;

/// Canonical JSON payload for API error responses.
#[derive(Debug, Serialize, Clone)]
pub struct ApiMessage {
    pub message: String,
}

impl ApiMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Helper for handlers that need to return `(StatusCode, Json<ApiMessage>)`.
pub fn json_error(
    status: StatusCode,
    message: impl Into<String>,
) -> (StatusCode, Json<ApiMessage>) {
    (status, Json(ApiMessage::new(message)))
}

pub fn status_for(err: &LibraryError) -> StatusCode {
    match err {
        LibraryError::NotFound { .. } => StatusCode::NOT_FOUND,
        LibraryError::Unauthorized | LibraryError::AuthFailed => StatusCode::UNAUTHORIZED,
        LibraryError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
        LibraryError::StorageUnavailable(_) | LibraryError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Message safe to show to the caller. Storage faults are logged, not echoed.
pub fn public_message(err: &LibraryError) -> String {
    match err {
        LibraryError::NotFound { entity } => {
            let mut entity = entity.to_string();
            if let Some(first) = entity.get_mut(0..1) {
                first.make_ascii_uppercase();
            }
            format!("{entity} not found.")
        }
        LibraryError::Unauthorized => "You do not have access to this page.".to_string(),
        LibraryError::AuthFailed => "Invalid username or password.".to_string(),
        LibraryError::ValidationFailed(message) => format!("Invalid request: {message}."),
        LibraryError::StorageUnavailable(_) | LibraryError::Io(_) => {
            "Something went wrong on our side. Please try again later.".to_string()
        }
    }
}

fn log_failure(err: &LibraryError, status: StatusCode) {
    if status.is_server_error() {
        error!(?err, "request failed");
    } else if matches!(err, LibraryError::Unauthorized) {
        warn!("refused request without administrator session");
    }
}

pub fn api_error(err: LibraryError) -> (StatusCode, Json<ApiMessage>) {
    let status = status_for(&err);
    log_failure(&err, status);
    json_error(status, public_message(&err))
}

/// A failed page request together with the viewer who made it, so the error
/// page keeps that viewer's navigation.
#[derive(Debug)]
pub struct PageError {
    error: LibraryError,
    viewer: Viewer,
}

impl PageError {
    pub fn new(error: LibraryError, viewer: &Viewer) -> Self {
        Self {
            error,
            viewer: viewer.clone(),
        }
    }
}

pub trait ForViewer<T> {
    fn for_viewer(self, viewer: &Viewer) -> Result<T, PageError>;
}

impl<T> ForViewer<T> for LibraryResult<T> {
    fn for_viewer(self, viewer: &Viewer) -> Result<T, PageError> {
        self.map_err(|error| PageError::new(error, viewer))
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = status_for(&self.error);
        log_failure(&self.error, status);
        let page = render_error_page(status, &public_message(&self.error), &self.viewer);
        (status, Html(page)).into_response()
    }
}

impl IntoResponse for LibraryError {
    fn into_response(self) -> Response {
        PageError::new(self, &Viewer::anonymous()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_distinct_statuses() {
        assert_eq!(
            status_for(&LibraryError::word_not_found()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&LibraryError::Unauthorized),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(&LibraryError::validation("bad")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&LibraryError::Io(std::io::Error::other("disk"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn page_error_keeps_status() {
        let response = Err::<(), _>(LibraryError::Unauthorized)
            .for_viewer(&Viewer::admin())
            .expect_err("error")
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn storage_details_are_not_exposed() {
        let err = LibraryError::Io(std::io::Error::other("/srv/secret/path"));
        assert!(!public_message(&err).contains("secret"));
        assert_eq!(
            public_message(&LibraryError::word_not_found()),
            "Word not found."
        );
    }
}
