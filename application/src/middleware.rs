//! HTTP middleware.

use axum::{extract::Request, middleware::Next, response::Response};
use http::{header, HeaderValue};
use tracing as log;

use crate::{api, view::Mode, Context};

/// Lets through only the requests made without a valid session.
///
/// Signed in users are sent home instead.
pub async fn require_logout(
    context: Context,
    request: Request,
    next: Next,
) -> Response {
    if let Some(session) = context.current_session().await {
        log::debug!(
            username = %session.username,
            "already signed in, redirecting home",
        );
        return api::redirect_home(context.mode(), Some(session.username));
    }
    next.run(request).await
}

/// Forbids caching full page responses.
///
/// Fragments are left alone, as htmx keeps its own history cache.
pub async fn cache_control(
    mode: Mode,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    if mode == Mode::Page {
        let headers = response.headers_mut();
        drop(headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        ));
        let no_cache = HeaderValue::from_static("no-cache");
        drop(headers.insert(header::PRAGMA, no_cache));
        drop(headers.insert(header::EXPIRES, HeaderValue::from_static("0")));
    }
    response
}
