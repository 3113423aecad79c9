//! [`FormData`] definitions.

use std::collections::HashMap;

/// Submitted form values along with the errors found in them.
///
/// Lives for a single request.
#[derive(Clone, Debug, Default)]
pub struct FormData {
    /// Submitted values by their field names.
    values: HashMap<&'static str, String>,

    /// Error messages by their field names.
    errors: HashMap<&'static str, String>,
}

impl FormData {
    /// Field of a username.
    pub const USERNAME: &'static str = "username";

    /// Field of a password.
    pub const PASSWORD: &'static str = "password";

    /// Field of a password confirmation.
    pub const CONFIRM_PASSWORD: &'static str = "confirmPassword";

    /// Pseudo-field of errors concerning the whole form.
    pub const FORM: &'static str = "";

    /// Remembers the submitted `value` of the `field`.
    #[must_use]
    pub fn with_value(
        mut self,
        field: &'static str,
        value: impl Into<String>,
    ) -> Self {
        drop(self.values.insert(field, value.into()));
        self
    }

    /// Attaches the error `message` to the `field`.
    #[must_use]
    pub fn with_error(
        mut self,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        drop(self.errors.insert(field, message.into()));
        self
    }

    /// Returns the submitted value of the `field`, if any.
    #[must_use]
    pub fn value(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    /// Returns the error message of the `field`, if any.
    #[must_use]
    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }
}
