//! Sign up handlers.

use axum::Form;
use axum_extra::extract::cookie::CookieJar;
use secrecy::SecretString;
use serde::Deserialize;
use service::{
    command::{self, Command as _, CreateUser, CreateUserSession},
    domain::user,
};

use crate::{
    define_error,
    view::{Content, FormData, Mode, View},
    AsError, Context, Error,
};

/// Submitted sign up form.
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    /// Requested username.
    pub username: String,

    /// Requested password.
    pub password: SecretString,

    /// Repeated password.
    #[serde(rename = "confirm-password")]
    pub password_confirmation: SecretString,
}

/// Sign up page handler.
#[expect(
    clippy::unused_async,
    reason = "`async` is required to match signature"
)]
pub async fn page(mode: Mode) -> View {
    View::new(mode, Content::Signup(FormData::default()))
}

/// Sign up form handler.
///
/// Registers a new user and signs them in, or shows the form again with the
/// first broken rule.
#[tracing::instrument(skip_all, fields(username = %form.username))]
pub async fn validate(
    context: Context,
    form: Form<SignupForm>,
) -> Result<(CookieJar, View), View> {
    let Form(SignupForm {
        username,
        password,
        password_confirmation,
    }) = form;

    let form = FormData::default().with_value(FormData::USERNAME, &username);
    let reject = |e: Error| {
        super::rejected(context.mode(), &e, form.clone(), Content::Signup)
    };

    let user = context
        .service()
        .execute(CreateUser {
            username,
            password: super::password(&password),
            password_confirmation: super::password(&password_confirmation),
        })
        .await
        .map_err(AsError::into_error)
        .map_err(reject)?;

    let created = context
        .service()
        .execute(CreateUserSession::ByUsername(user.username))
        .await
        .map_err(AsError::into_error)
        .map_err(reject)?;

    Ok(super::signed_in(&context, created))
}

impl AsError for command::create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use user::{PasswordViolation as P, UsernameViolation as U};

        define_error! {
            enum Error {
                #[code = "USERNAME_TOO_SHORT"]
                #[status = UNPROCESSABLE_ENTITY]
                #[field = "username"]
                #[message = "Username must be at least 3 characters long"]
                UsernameTooShort,

                #[code = "USERNAME_TOO_LONG"]
                #[status = UNPROCESSABLE_ENTITY]
                #[field = "username"]
                #[message = "Username must be at most 15 characters long"]
                UsernameTooLong,

                #[code = "USERNAME_OCCUPIED"]
                #[status = UNPROCESSABLE_ENTITY]
                #[field = "username"]
                #[message = "Username already exists"]
                UsernameOccupied,

                #[code = "USERNAME_INVALID_CHARACTERS"]
                #[status = UNPROCESSABLE_ENTITY]
                #[field = "username"]
                #[message = "Username can only contain alphabets, numbers, \
                             underscore (_) and dash (-)"]
                UsernameInvalidCharacters,

                #[code = "PASSWORD_TOO_SHORT"]
                #[status = UNPROCESSABLE_ENTITY]
                #[field = "password"]
                #[message = "Password must be at least 6 characters long"]
                PasswordTooShort,

                #[code = "PASSWORD_TOO_LONG"]
                #[status = UNPROCESSABLE_ENTITY]
                #[field = "password"]
                #[message = "Password must be at most 30 characters long"]
                PasswordTooLong,

                #[code = "PASSWORD_MISMATCH"]
                #[status = UNPROCESSABLE_ENTITY]
                #[field = "confirmPassword"]
                #[message = "Password does not match"]
                PasswordMismatch,

                #[code = "USERNAME_TAKEN"]
                #[status = UNPROCESSABLE_ENTITY]
                #[field = "username"]
                #[message = "Username taken while processing"]
                UsernameTaken,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidUsername(U::TooShort) => {
                Some(Error::UsernameTooShort.into())
            }
            Self::InvalidUsername(U::TooLong) => {
                Some(Error::UsernameTooLong.into())
            }
            Self::InvalidUsername(U::InvalidCharacters) => {
                Some(Error::UsernameInvalidCharacters.into())
            }
            Self::UsernameOccupied(_) => Some(Error::UsernameOccupied.into()),
            Self::InvalidPassword(P::TooShort) => {
                Some(Error::PasswordTooShort.into())
            }
            Self::InvalidPassword(P::TooLong) => {
                Some(Error::PasswordTooLong.into())
            }
            Self::PasswordMismatch => Some(Error::PasswordMismatch.into()),
            Self::UsernameTaken(_) => Some(Error::UsernameTaken.into()),
            Self::PasswordHash(_) | Self::HashingTask(_) => None,
        }
    }
}
