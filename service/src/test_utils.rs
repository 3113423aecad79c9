//! Helpers shared by the tests of this crate.

use std::time::Duration;

use crate::{domain::user::session, infra::Memory, Config, Service};

/// Secret of the current key used in tests.
pub(crate) const SECRET: &str = "test-secret";

/// Creates a [`Config`] cheap enough to be used in tests.
pub(crate) fn config() -> Config {
    Config {
        session_keys: session::Keys::new(
            ("v1".to_owned(), SECRET),
            [("v0".to_owned(), "retired-secret")],
        ),
        session_ttl: Duration::from_secs(7 * 24 * 60 * 60),
        // Minimum cost `bcrypt` accepts (its `MIN_COST` is private).
        password_hash_cost: 4,
    }
}

/// Creates a [`Service`] over an empty [`Memory`] database.
pub(crate) fn service() -> Service<Memory> {
    Service::new(config(), Memory::new())
}
