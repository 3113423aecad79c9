//! HTTP API handlers.

pub mod signin;
pub mod signup;

use axum::response::{IntoResponse as _, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use secrecy::{ExposeSecret as _, SecretBox, SecretString};
use service::{command::create_user_session, domain::user};
use tracing as log;

use crate::{
    view::{Content, FormData, Mode, View},
    Context, Error,
};

/// Home page handler.
#[tracing::instrument(skip_all)]
pub async fn home(context: Context) -> View {
    let username = context.current_session().await.map(|s| s.username);
    View::new(context.mode(), Content::Home(username))
}

/// Logout handler.
///
/// Always removes the session cookie, whether there was a session or not.
#[tracing::instrument(skip_all)]
pub async fn logout(context: Context) -> (CookieJar, Response) {
    log::debug!("signing out");
    (context.end_session(), redirect_home(context.mode(), None))
}

/// Sends the client to the home page.
///
/// htmx gets the home fragment along with the URL to show, while the others
/// are redirected.
#[must_use]
pub fn redirect_home(mode: Mode, username: Option<user::Username>) -> Response {
    match mode {
        Mode::Fragment => View::new(mode, Content::Home(username))
            .pushing_url("/")
            .into_response(),
        Mode::Page => Redirect::to("/").into_response(),
    }
}

/// Sets the cookie of the created session and shows the home page to its
/// owner.
fn signed_in(
    context: &Context,
    created: create_user_session::Output,
) -> (CookieJar, View) {
    let create_user_session::Output { token, session } = created;

    log::info!(username = %session.username, "signed in");

    let cookies = context
        .start_session(&token, context.service().config().session_ttl);
    let view = View::new(context.mode(), Content::Home(Some(session.username)))
        .pushing_url("/");
    (cookies, view)
}

/// Shows the form again with the provided [`Error`] attached to it.
fn rejected(
    mode: Mode,
    err: &Error,
    form: FormData,
    content: fn(FormData) -> Content,
) -> View {
    err.log();
    View::new(mode, content(form.with_error(err.field, err.public_message())))
        .with_status(err.status_code)
}

/// Moves the submitted `password` into a [`user::Password`].
fn password(password: &SecretString) -> SecretBox<user::Password> {
    SecretBox::init_with(|| user::Password::from(password.expose_secret()))
}
