//! Sign in handlers.

use axum::Form;
use axum_extra::extract::cookie::CookieJar;
use secrecy::SecretString;
use serde::Deserialize;
use service::command::{self, Command as _, CreateUserSession};

use crate::{
    define_error,
    view::{Content, FormData, Mode, View},
    AsError, Context, Error,
};

/// Submitted sign in form.
#[derive(Debug, Deserialize)]
pub struct SigninForm {
    /// Username to sign in with.
    pub username: String,

    /// Password to sign in with.
    pub password: SecretString,
}

/// Sign in page handler.
#[expect(
    clippy::unused_async,
    reason = "`async` is required to match signature"
)]
pub async fn page(mode: Mode) -> View {
    View::new(mode, Content::Signin(FormData::default()))
}

/// Sign in form handler.
#[tracing::instrument(skip_all, fields(username = %form.username))]
pub async fn validate(
    context: Context,
    form: Form<SigninForm>,
) -> Result<(CookieJar, View), View> {
    let Form(SigninForm { username, password }) = form;

    let form = FormData::default().with_value(FormData::USERNAME, &username);

    let created = context
        .service()
        .execute(CreateUserSession::ByCredentials {
            username,
            password: super::password(&password),
        })
        .await
        .map_err(AsError::into_error)
        .map_err(|e| {
            super::rejected(context.mode(), &e, form, Content::Signin)
        })?;

    Ok(super::signed_in(&context, created))
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "USERNAME_NOT_EXISTS"]
                #[status = UNPROCESSABLE_ENTITY]
                #[field = "username"]
                #[message = "Username does not exist"]
                UsernameNotExists,

                #[code = "WRONG_PASSWORD"]
                #[status = UNPROCESSABLE_ENTITY]
                #[field = "password"]
                #[message = "Password does not match"]
                WrongPassword,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::UsernameNotExists(_) => Some(Error::UsernameNotExists.into()),
            Self::WrongPassword => Some(Error::WrongPassword.into()),
            Self::JsonWebTokenEncodeError(_)
            | Self::VerificationTask(_)
            | Self::PasswordHashMissing(_) => None,
        }
    }
}

#[cfg(test)]
mod spec {
    use http::StatusCode;
    use service::{
        command::create_user_session::ExecutionError,
        domain::user::Username,
        infra::{database, memory},
    };

    use crate::{
        api::rejected,
        view::{Content, FormData, Mode},
        AsError as _, Error,
    };

    fn assert_unexpected(err: &Error) {
        assert_eq!(err.status_code, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.field, FormData::FORM);
        assert_eq!(err.public_message(), Error::UNEXPECTED);

        let form = FormData::default().with_value(FormData::USERNAME, "alice");
        let view = rejected(Mode::Fragment, err, form, Content::Signin);
        let html = view.render();

        assert!(html.contains(Error::UNEXPECTED));
        assert!(html.contains(r#"value="alice""#));
        assert!(!html.contains("has no `PasswordHash`"));
        assert!(!html.contains("lock is poisoned"));
    }

    #[test]
    fn missing_password_hash_is_unexpected() {
        let err = tracerr::new!(ExecutionError::PasswordHashMissing(
            Username::new("alice").unwrap(),
        ))
        .into_error();

        assert_unexpected(&err);
    }

    #[test]
    fn storage_failure_is_unexpected() {
        let err = tracerr::new!(ExecutionError::Db(database::Error::from(
            memory::Error::Poisoned,
        )))
        .into_error();

        assert_unexpected(&err);
    }

    #[test]
    fn credential_errors_point_at_fields() {
        let unknown =
            ExecutionError::UsernameNotExists("bob".to_owned()).into_error();
        let wrong = ExecutionError::WrongPassword.into_error();

        assert_eq!(unknown.status_code, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(unknown.field, FormData::USERNAME);
        assert_eq!(unknown.public_message(), "Username does not exist");
        assert_eq!(wrong.status_code, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(wrong.field, FormData::PASSWORD);
        assert_eq!(wrong.public_message(), "Password does not match");
    }
}
