//! Server-rendered HTML views.
//!
//! Every view is a fragment. Requests made by [htmx] get the bare fragment,
//! while the rest get it wrapped into the full page layout.
//!
//! [htmx]: https://htmx.org

mod form;

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    response::{Html, IntoResponse, Response},
};
use http::{header::HeaderName, HeaderMap, StatusCode};
use service::domain::user::Username;

pub use self::form::FormData;

/// Full page layout with a `{{CONTENT}}` slot.
const LAYOUT: &str = include_str!("../../templates/layout.html");

/// Home fragment for anonymous visitors.
const HOME_GUEST: &str = include_str!("../../templates/home_guest.html");

/// Home fragment for signed in users.
const HOME_USER: &str = include_str!("../../templates/home_user.html");

/// Sign up form fragment.
const SIGNUP: &str = include_str!("../../templates/signup.html");

/// Sign in form fragment.
const SIGNIN: &str = include_str!("../../templates/signin.html");

/// Header set by htmx on every request it makes.
pub const HX_REQUEST: HeaderName = HeaderName::from_static("hx-request");

/// Header set by htmx when restoring a page missing in its history cache.
pub const HX_HISTORY_RESTORE_REQUEST: HeaderName =
    HeaderName::from_static("hx-history-restore-request");

/// Header making htmx push a new URL into the browser history.
pub const HX_PUSH_URL: HeaderName = HeaderName::from_static("hx-push-url");

/// Way a response is rendered in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Mode {
    /// Bare fragment replacing a part of an already loaded page.
    Fragment,

    /// Fragment wrapped into the full page layout.
    Page,
}

impl Mode {
    /// Detects the [`Mode`] requested by the provided `headers`.
    ///
    /// History restoration requests need the full page, even though htmx
    /// makes them.
    #[must_use]
    pub fn of(headers: &HeaderMap) -> Self {
        let is_set = |name: &HeaderName| {
            headers.get(name).is_some_and(|v| v.as_bytes() == b"true")
        };

        if is_set(&HX_REQUEST) && !is_set(&HX_HISTORY_RESTORE_REQUEST) {
            Self::Fragment
        } else {
            Self::Page
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Mode
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::of(&parts.headers))
    }
}

/// Content of a [`View`].
#[derive(Clone, Debug)]
pub enum Content {
    /// Home, greeting the signed in [`Username`] if any.
    Home(Option<Username>),

    /// Sign up form.
    Signup(FormData),

    /// Sign in form.
    Signin(FormData),
}

impl Content {
    /// Renders this [`Content`] as an HTML fragment.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Home(None) => HOME_GUEST.to_owned(),
            Self::Home(Some(username)) => {
                HOME_USER.replace("{{USERNAME}}", &escape(username.as_ref()))
            }
            Self::Signup(form) => render_form(SIGNUP, form),
            Self::Signin(form) => render_form(SIGNIN, form),
        }
    }
}

/// Fills the `template` of a form with the provided [`FormData`].
fn render_form(template: &str, form: &FormData) -> String {
    let error = |field| escape(form.error(field).unwrap_or_default());

    // Submitted values go last, so they are never scanned for placeholders.
    template
        .replace("{{FORM_ERROR}}", &error(FormData::FORM))
        .replace("{{USERNAME_ERROR}}", &error(FormData::USERNAME))
        .replace("{{PASSWORD_ERROR}}", &error(FormData::PASSWORD))
        .replace(
            "{{CONFIRM_PASSWORD_ERROR}}",
            &error(FormData::CONFIRM_PASSWORD),
        )
        .replace(
            "{{USERNAME}}",
            &escape(form.value(FormData::USERNAME).unwrap_or_default()),
        )
}

/// Escapes the provided `text` for use in HTML text and attribute values.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

/// Rendered HTML response.
#[derive(Clone, Debug)]
pub struct View {
    /// [`Mode`] to render this [`View`] in.
    mode: Mode,

    /// [`StatusCode`] of the response.
    status: StatusCode,

    /// [`Content`] to render.
    content: Content,

    /// URL to push into the browser history, if any.
    ///
    /// Only applies to [`Mode::Fragment`].
    push_url: Option<&'static str>,
}

impl View {
    /// Creates a new successful [`View`] of the provided [`Content`].
    #[must_use]
    pub fn new(mode: Mode, content: Content) -> Self {
        Self {
            mode,
            status: StatusCode::OK,
            content,
            push_url: None,
        }
    }

    /// Sets the [`StatusCode`] of this [`View`].
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Makes this [`View`] push the provided `url` into the browser history.
    #[must_use]
    pub fn pushing_url(mut self, url: &'static str) -> Self {
        self.push_url = Some(url);
        self
    }

    /// Renders this [`View`] as HTML.
    #[must_use]
    pub fn render(&self) -> String {
        let fragment = self.content.render();
        match self.mode {
            Mode::Fragment => fragment,
            Mode::Page => LAYOUT.replace("{{CONTENT}}", &fragment),
        }
    }
}

impl IntoResponse for View {
    fn into_response(self) -> Response {
        let body = Html(self.render());
        match (self.mode, self.push_url) {
            (Mode::Fragment, Some(url)) => {
                (self.status, [(HX_PUSH_URL, url)], body).into_response()
            }
            (Mode::Fragment | Mode::Page, _) => {
                (self.status, body).into_response()
            }
        }
    }
}

#[cfg(test)]
mod spec {
    use axum::response::IntoResponse as _;
    use http::{HeaderMap, HeaderValue, StatusCode};
    use service::domain::user::Username;

    use super::{
        escape, Content, FormData, Mode, View, HX_HISTORY_RESTORE_REQUEST,
        HX_PUSH_URL, HX_REQUEST,
    };

    fn headers(pairs: &[(&http::HeaderName, &'static str)]) -> HeaderMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).clone(), HeaderValue::from_static(*v)))
            .collect()
    }

    #[test]
    fn detects_mode() {
        assert_eq!(Mode::of(&headers(&[])), Mode::Page);
        assert_eq!(
            Mode::of(&headers(&[(&HX_REQUEST, "true")])),
            Mode::Fragment,
        );
        assert_eq!(Mode::of(&headers(&[(&HX_REQUEST, "false")])), Mode::Page);
        assert_eq!(
            Mode::of(&headers(&[
                (&HX_REQUEST, "true"),
                (&HX_HISTORY_RESTORE_REQUEST, "true"),
            ])),
            Mode::Page,
        );
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;",
        );
        assert_eq!(escape("alice"), "alice");
    }

    #[test]
    fn wraps_page_into_layout() {
        let content = Content::Home(None);

        let page = View::new(Mode::Page, content.clone()).render();
        let fragment = View::new(Mode::Fragment, content).render();

        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains(&fragment));
        assert!(!fragment.contains("<html"));
    }

    #[test]
    fn greets_user() {
        let username = Username::new("alice").unwrap();

        let html = Content::Home(Some(username)).render();

        assert!(html.contains("Welcome, alice"));
        assert!(html.contains("/logout"));
    }

    #[test]
    fn renders_form_errors_and_values() {
        let form = FormData::default()
            .with_value(FormData::USERNAME, "<script>")
            .with_error(FormData::CONFIRM_PASSWORD, "Password does not match")
            .with_error(FormData::FORM, "Something & more");

        let html = Content::Signup(form).render();

        assert!(html.contains(r#"value="&lt;script&gt;""#));
        assert!(html.contains("Password does not match"));
        assert!(html.contains("Something &amp; more"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn pushes_url_for_fragments_only() {
        let fragment = View::new(Mode::Fragment, Content::Home(None))
            .with_status(StatusCode::OK)
            .pushing_url("/")
            .into_response();
        let page = View::new(Mode::Page, Content::Home(None))
            .pushing_url("/")
            .into_response();

        assert_eq!(fragment.headers().get(HX_PUSH_URL).unwrap(), "/");
        assert!(page.headers().get(HX_PUSH_URL).is_none());
    }
}
