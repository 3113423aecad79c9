//! [`Context`]-related definitions.

use std::time::Duration;

use axum::{async_trait, extract::FromRequestParts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use service::{
    command::{self, Command as _},
    domain::user::{self, session},
};
use tracing as log;

use crate::{view::Mode, Error, Service};

/// Name of the cookie carrying a [`session::Token`].
pub const SESSION_COOKIE: &str = "session";

/// Request context.
#[derive(Debug)]
pub struct Context {
    /// [`Service`] instance.
    service: Service,

    /// Cookies of the HTTP request.
    cookies: CookieJar,

    /// [`Mode`] the HTTP request wants its response in.
    mode: Mode,
}

impl Context {
    /// Returns [`Service`] instance of this [`Context`].
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Returns [`Mode`] of this [`Context`].
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the current [`Session`], if the request carries a valid one.
    ///
    /// A missing, malformed, expired or foreign session is no session.
    pub async fn current_session(&self) -> Option<Session> {
        let token = self.cookies.get(SESSION_COOKIE)?.value().to_owned();

        self.service
            .execute(command::AuthorizeUserSession {
                token: token.into(),
            })
            .await
            .map(|s| Session { username: s.username })
            .map_err(|e| {
                use command::authorize_user_session::ExecutionError as E;

                match e.as_ref() {
                    E::Db(_) => log::warn!("failed to authorize session: {e}"),
                    E::JsonWebTokenDecodeError(_)
                    | E::MissingKeyId
                    | E::UnknownKeyId(_)
                    | E::UserNotExists(_) => {
                        log::debug!("rejected session: {e}");
                    }
                }
            })
            .ok()
    }

    /// Returns the cookies of this [`Context`] with the provided
    /// [`session::Token`] set, valid for the provided `ttl`.
    #[must_use]
    pub fn start_session(
        &self,
        token: &session::Token,
        ttl: Duration,
    ) -> CookieJar {
        let max_age =
            time::Duration::try_from(ttl).unwrap_or(time::Duration::MAX);

        self.cookies.clone().add(
            Cookie::build((SESSION_COOKIE, token.to_string()))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .max_age(max_age),
        )
    }

    /// Returns the cookies of this [`Context`] with the session cookie
    /// removed.
    ///
    /// The removal is sent even if there was no session cookie.
    #[must_use]
    pub fn end_session(&self) -> CookieJar {
        self.cookies.clone().add(removal_cookie())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let service = parts
            .extensions
            .get::<Service>()
            .cloned()
            .ok_or_else(|| Error::internal(&"missing `Service` extension"))?;

        Ok(Self {
            service,
            cookies: CookieJar::from_headers(&parts.headers),
            mode: Mode::of(&parts.headers),
        })
    }
}

/// Builds the cookie making a browser drop its session cookie.
fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .build();
    cookie.make_removal();
    cookie
}

/// User session.
#[derive(Clone, Debug)]
pub struct Session {
    /// [`user::Username`] of the signed in user.
    pub username: user::Username,
}
