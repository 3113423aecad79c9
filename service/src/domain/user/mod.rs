//! [`User`] definitions.

pub mod session;

use std::{borrow::Borrow, sync::LazyLock};

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, Error, From};
use regex::Regex;
use secrecy::{zeroize::Zeroize, CloneableSecret};
use serde::{Deserialize, Serialize};

pub use self::session::Session;

/// Registered user.
#[derive(Clone, Debug)]
pub struct User {
    /// [`Username`] of this [`User`], identifying it.
    pub username: Username,

    /// [`PasswordHash`] of this [`User`].
    pub password_hash: PasswordHash,

    /// [`DateTime`] when this [`User`] was created.
    pub created_at: CreationDateTime,
}

/// Name a [`User`] signs in with.
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
#[as_ref(str)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Minimal length of a [`Username`] in bytes.
    pub const MIN_LEN: usize = 3;

    /// Maximal length of a [`Username`] in bytes.
    pub const MAX_LEN: usize = 15;

    /// Creates a new [`Username`] if the given `name` is valid.
    ///
    /// Length is checked before the allowed characters.
    ///
    /// # Errors
    ///
    /// With the first [`UsernameViolation`] the `name` has.
    pub fn new(name: impl Into<String>) -> Result<Self, UsernameViolation> {
        /// Regular expression of the allowed [`Username`] characters.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid regex")
        });

        let name = name.into();
        if name.len() < Self::MIN_LEN {
            return Err(UsernameViolation::TooShort);
        }
        if name.len() > Self::MAX_LEN {
            return Err(UsernameViolation::TooLong);
        }
        if !REGEX.is_match(&name) {
            return Err(UsernameViolation::InvalidCharacters);
        }
        Ok(Self(name))
    }
}

impl Borrow<str> for Username {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Rule a [`Username`] candidate breaks.
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum UsernameViolation {
    /// Shorter than [`Username::MIN_LEN`].
    #[display("`Username` is too short")]
    TooShort,

    /// Longer than [`Username::MAX_LEN`].
    #[display("`Username` is too long")]
    TooLong,

    /// Contains something other than ASCII letters, digits, `_` or `-`.
    #[display("`Username` contains disallowed characters")]
    InvalidCharacters,
}

/// Password of a [`User`].
#[derive(Clone, Debug, Eq, From, PartialEq)]
#[from(&str, String)]
pub struct Password(String);

impl Password {
    /// Minimal length of a [`Password`] in bytes.
    pub const MIN_LEN: usize = 6;

    /// Maximal length of a [`Password`] in bytes.
    pub const MAX_LEN: usize = 30;

    /// Creates a new [`Password`] if the given `password` is valid.
    ///
    /// # Errors
    ///
    /// With the [`PasswordViolation`] the `password` has.
    pub fn new(
        password: impl Into<String>,
    ) -> Result<Self, PasswordViolation> {
        let password = Self(password.into());
        password.validate().map(|()| password)
    }

    /// Checks whether this [`Password`] may be set for a new [`User`].
    ///
    /// [`Password`]s built via [`From`] skip this check, as the ones
    /// submitted on sign in must be compared as is.
    ///
    /// # Errors
    ///
    /// With the [`PasswordViolation`] this [`Password`] has.
    pub fn validate(&self) -> Result<(), PasswordViolation> {
        if self.0.len() < Self::MIN_LEN {
            return Err(PasswordViolation::TooShort);
        }
        if self.0.len() > Self::MAX_LEN {
            return Err(PasswordViolation::TooLong);
        }
        Ok(())
    }
}

impl AsRef<[u8]> for Password {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl CloneableSecret for Password {}
impl Zeroize for Password {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// Rule a [`Password`] candidate breaks.
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum PasswordViolation {
    /// Shorter than [`Password::MIN_LEN`].
    #[display("`Password` is too short")]
    TooShort,

    /// Longer than [`Password::MAX_LEN`].
    #[display("`Password` is too long")]
    TooLong,
}

/// Salted [bcrypt] hash of a [`Password`].
///
/// [bcrypt]: https://wikipedia.org/wiki/Bcrypt
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hashes the given [`Password`] with the provided bcrypt `cost`.
    ///
    /// # Errors
    ///
    /// If the `cost` is out of the range bcrypt accepts.
    pub fn new(
        password: &Password,
        cost: u32,
    ) -> Result<Self, bcrypt::BcryptError> {
        bcrypt::hash(password, cost).map(Self)
    }

    /// Checks whether the given [`Password`] produces this [`PasswordHash`].
    #[must_use]
    pub fn verify(&self, password: &Password) -> bool {
        bcrypt::verify(password, &self.0).unwrap_or(false)
    }
}

/// [`DateTime`] when a [`User`] was created.
pub type CreationDateTime = DateTimeOf<(User, unit::Creation)>;

#[cfg(test)]
mod spec {
    use super::{
        Password, PasswordHash, PasswordViolation, Username, UsernameViolation,
    };

    #[test]
    fn username_length_bounds() {
        assert_eq!(Username::new("ab"), Err(UsernameViolation::TooShort));
        assert_eq!(Username::new(""), Err(UsernameViolation::TooShort));
        assert!(Username::new("abc").is_ok());
        assert!(Username::new("a".repeat(15)).is_ok());
        assert_eq!(
            Username::new("a".repeat(16)),
            Err(UsernameViolation::TooLong),
        );
    }

    #[test]
    fn username_characters() {
        assert!(Username::new("Alice_01-x").is_ok());
        assert_eq!(
            Username::new("alice!"),
            Err(UsernameViolation::InvalidCharacters),
        );
        assert_eq!(
            Username::new("al ice"),
            Err(UsernameViolation::InvalidCharacters),
        );
        assert_eq!(
            Username::new("<b>bob</b>"),
            Err(UsernameViolation::InvalidCharacters),
        );
    }

    #[test]
    fn username_length_is_checked_in_bytes_first() {
        // 2 chars, 4 bytes: passes length, fails characters.
        assert_eq!(
            Username::new("éé"),
            Err(UsernameViolation::InvalidCharacters),
        );
        // 1 char, 2 bytes: too short before anything else.
        assert_eq!(Username::new("é"), Err(UsernameViolation::TooShort));
    }

    #[test]
    fn password_length_bounds() {
        assert_eq!(Password::new("12345"), Err(PasswordViolation::TooShort));
        assert!(Password::new("123456").is_ok());
        assert!(Password::new("x".repeat(30)).is_ok());
        assert_eq!(
            Password::new("x".repeat(31)),
            Err(PasswordViolation::TooLong),
        );
    }

    #[test]
    fn password_hash_verifies_only_its_password() {
        let hash =
            PasswordHash::new(&Password::from("secret1"), 4).unwrap();

        assert!(hash.verify(&Password::from("secret1")));
        assert!(!hash.verify(&Password::from("secret2")));
        assert!(!hash.verify(&Password::from("")));
    }

    #[test]
    fn password_hash_is_salted() {
        let password = Password::from("secret1");

        let first = PasswordHash::new(&password, 4).unwrap();
        let second = PasswordHash::new(&password, 4).unwrap();

        assert_ne!(first, second);
        assert!(first.verify(&password));
        assert!(second.verify(&password));
    }
}
