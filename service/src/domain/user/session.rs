//! [`Session`] definitions.

use std::collections::HashMap;

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Debug, Display, From};
use serde::{Deserialize, Serialize};

#[cfg(doc)]
use crate::domain::User;
use crate::domain::user;

/// User session.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Session {
    /// [`user::Username`] of the [`User`] this [`Session`] belongs to.
    #[serde(rename = "sub")]
    pub username: user::Username,

    /// [`DateTime`] when this [`Session`] expires.
    #[serde(rename = "exp", with = "common::datetime::serde::unix_timestamp")]
    pub expires_at: ExpirationDateTime,
}

/// Signed token carrying a [`Session`].
#[derive(AsRef, Clone, Debug, Display, From)]
#[as_ref(str)]
pub struct Token(String);

/// [`DateTime`] of a [`Session`] expiration.
pub type ExpirationDateTime = DateTimeOf<(Session, unit::Expiration)>;

/// Versioned keys signing and verifying [`Token`]s.
///
/// New [`Token`]s are always signed with the current key. Retired keys are
/// only used for verification, so rotating a key doesn't sign everybody out.
#[derive(Clone, Debug)]
pub struct Keys {
    /// ID of the current key.
    current_id: String,

    /// Current key to sign [`Token`]s with.
    #[debug(skip)]
    encoding: jsonwebtoken::EncodingKey,

    /// All keys [`Token`]s are verified with, by their IDs.
    #[debug(skip)]
    decoding: HashMap<String, jsonwebtoken::DecodingKey>,
}

impl Keys {
    /// Creates new [`Keys`] out of the current `(id, secret)` pair and the
    /// `retired` ones.
    ///
    /// A retired key with the same ID as the current one is ignored.
    #[must_use]
    pub fn new<I, S>(current: (String, S), retired: I) -> Self
    where
        I: IntoIterator<Item = (String, S)>,
        S: AsRef<[u8]>,
    {
        let (current_id, secret) = current;
        let mut decoding = retired
            .into_iter()
            .map(|(id, secret)| {
                (id, jsonwebtoken::DecodingKey::from_secret(secret.as_ref()))
            })
            .collect::<HashMap<_, _>>();
        drop(decoding.insert(
            current_id.clone(),
            jsonwebtoken::DecodingKey::from_secret(secret.as_ref()),
        ));

        Self {
            current_id,
            encoding: jsonwebtoken::EncodingKey::from_secret(secret.as_ref()),
            decoding,
        }
    }

    /// Returns the ID of the current key along with the key itself.
    #[must_use]
    pub fn current(&self) -> (&str, &jsonwebtoken::EncodingKey) {
        (&self.current_id, &self.encoding)
    }

    /// Returns the verification key with the provided `id`, if any.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&jsonwebtoken::DecodingKey> {
        self.decoding.get(id)
    }
}
