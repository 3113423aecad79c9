//! [`User`] read model definitions.

use derive_more::{From, Into};

#[cfg(doc)]
use crate::domain::User;

/// Whether a [`User`] is registered.
#[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
pub struct Exists(bool);

/// Total count of registered [`User`]s.
#[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
pub struct Count(usize);
