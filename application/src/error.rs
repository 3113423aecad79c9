//! [`Error`]-related definitions.

use std::fmt;

use axum::response::{IntoResponse, Response};
use derive_more::Error as StdError;
use itertools::Itertools as _;
use service::infra::database;
use tracerr::{Trace, Traced};
use tracing as log;

/// Defines a new error type.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_error {
    (
        enum $name:ident {
            $(
                #[code = $code:literal]
                #[status = $status_code:ident]
                #[field = $field:literal]
                #[message = $message:literal]
                $variant:ident
            ),* $(,)?
        }
    ) => {
        /// Error type.
        #[derive(
            Clone,
            Copy,
            Debug,
            ::derive_more::Display,
            ::derive_more::Error
        )]
        #[repr(u16)]
        pub enum $name {
            $(
                #[display($message)]
                #[doc = $message]
                $variant,
            )*
        }

        impl From<$name> for $crate::Error {
            fn from(err: $name) -> Self {
                match err {
                    $(
                        $name::$variant => Self {
                            code: $code,
                            status_code: ::http::StatusCode::$status_code,
                            field: $field,
                            message: $message.to_string(),
                            backtrace: None,
                        },
                    )*
                }
            }
        }
    };
}

/// HTTP API [`Error`].
#[derive(Clone, Debug, StdError)]
pub struct Error {
    /// [`Error`] code.
    pub code: Code,

    /// [`http::StatusCode`] of this [`Error`].
    pub status_code: http::StatusCode,

    /// Form field this [`Error`] is shown next to.
    ///
    /// Empty for errors concerning the whole form.
    pub field: &'static str,

    /// Backtrace of this [`Error`].
    #[error(not(backtrace))]
    pub backtrace: Option<Trace>,

    /// [`Error`] message.
    pub message: String,
}

impl Error {
    /// Message shown instead of the real one for internal errors.
    pub const UNEXPECTED: &'static str =
        "An unexpected error occurred. Please try again.";

    /// Create a new [`Error`] representing an internal server error.
    #[must_use]
    pub fn internal(msg: &impl ToString) -> Self {
        Self {
            code: "INTERNAL_SERVER_ERROR",
            status_code: http::StatusCode::INTERNAL_SERVER_ERROR,
            field: "",
            message: msg.to_string(),
            backtrace: None,
        }
    }

    /// Returns the message of this [`Error`] that is safe to show to users.
    ///
    /// Server errors are never disclosed.
    #[must_use]
    pub fn public_message(&self) -> &str {
        if self.status_code.is_server_error() {
            Self::UNEXPECTED
        } else {
            &self.message
        }
    }

    /// Logs this [`Error`] if it's a server error.
    pub fn log(&self) {
        if self.status_code.is_server_error() {
            log::error!("{self}");
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            code,
            status_code: _,
            field: _,
            backtrace,
            message,
        } = self;

        write!(
            f,
            "[{code}]: {message}{}",
            backtrace
                .iter()
                .format_with("\n", |trace, f| f(&format_args!("{trace}"))),
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        self.log();
        (self.status_code, self.public_message().to_owned()).into_response()
    }
}

/// [`Error`] code.
pub type Code = &'static str;

/// Helper trait for converting types into [`Error`]s.
pub trait AsError {
    /// Tries to convert the type into an [`Error`].
    ///
    /// [`None`] is returned if the type cannot be converted into an [`Error`].
    fn try_as_error(&self) -> Option<Error>;

    /// Converts the type into an [`Error`].
    fn as_error(&self) -> Error
    where
        Self: fmt::Display,
    {
        self.try_as_error()
            .unwrap_or_else(|| Error::internal(&self))
    }

    /// Converts the type into an [`Error`] by consuming it.
    fn into_error(self) -> Error
    where
        Self: fmt::Display + Sized,
    {
        self.as_error()
    }
}

impl<E: AsError> AsError for Traced<E> {
    fn try_as_error(&self) -> Option<Error> {
        let mut error = self.as_ref().try_as_error()?;
        error.backtrace = Some(self.trace().clone());
        Some(error)
    }

    fn as_error(&self) -> Error
    where
        Self: fmt::Display,
    {
        let mut error = self
            .as_ref()
            .try_as_error()
            .unwrap_or_else(|| Error::internal(self));
        error.backtrace = Some(self.trace().clone());
        error
    }
}

impl AsError for database::Error {
    fn try_as_error(&self) -> Option<Error> {
        None
    }
}

#[cfg(test)]
mod spec {
    use derive_more::{Display, Error as StdError};

    use super::{AsError, Error};

    #[derive(Debug, Display, StdError)]
    #[display("storage is on fire")]
    struct Unknown;

    impl AsError for Unknown {
        fn try_as_error(&self) -> Option<Error> {
            None
        }
    }

    crate::define_error! {
        enum Known {
            #[code = "TOO_SHORT"]
            #[status = UNPROCESSABLE_ENTITY]
            #[field = "username"]
            #[message = "Username is too short"]
            TooShort,
        }
    }

    #[test]
    fn unknown_errors_are_hidden() {
        let err = Unknown.into_error();

        assert_eq!(err.status_code, http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.field, "");
        assert_eq!(err.public_message(), Error::UNEXPECTED);
        assert!(err.to_string().contains("storage is on fire"));
    }

    #[test]
    fn defined_errors_are_shown() {
        let err = Error::from(Known::TooShort);

        assert_eq!(err.code, "TOO_SHORT");
        assert_eq!(err.status_code, http::StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.field, "username");
        assert_eq!(err.public_message(), "Username is too short");
    }

    #[test]
    fn traced_errors_carry_trace() {
        let err = tracerr::new!(Unknown).into_error();

        assert!(err.backtrace.is_some());
        assert_eq!(err.public_message(), Error::UNEXPECTED);
    }
}
