pub mod blog;
pub mod chat;
pub mod conversation;
pub mod health;
pub mod personas;
pub mod sessions;
pub mod stock;

use axum::response::{IntoResponse, Response};
use http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};

use crate::services::report_renderer::{Download, MARKDOWN_CONTENT_TYPE};

/// Serves a rendered markdown file as an attachment.
pub(crate) fn attachment(download: Download) -> Response {
    (
        [
            (CONTENT_TYPE, MARKDOWN_CONTENT_TYPE.to_string()),
            (CONTENT_DISPOSITION, download.content_disposition()),
        ],
        download.body,
    )
        .into_response()
}
