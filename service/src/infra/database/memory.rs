//! In-memory [`Database`] implementation.

use std::{
    collections::{hash_map::Entry, HashMap},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use common::operations::{By, Insert, Select};
use derive_more::{Display, Error as StdError};
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::{database, Database},
    read,
};

/// In-memory [`Database`] keeping [`User`]s until the process exits.
///
/// Clones share the same storage. A single read-write lock guards the whole
/// storage, so all writes are serialized.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Registered [`User`]s by their [`user::Username`]s.
    users: Arc<RwLock<HashMap<user::Username, User>>>,
}

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires shared access to the stored [`User`]s.
    fn read(
        &self,
    ) -> Result<
        RwLockReadGuard<'_, HashMap<user::Username, User>>,
        Traced<database::Error>,
    > {
        self.users
            .read()
            .map_err(|_| tracerr::new!(database::Error::from(Error::Poisoned)))
    }

    /// Acquires exclusive access to the stored [`User`]s.
    fn write(
        &self,
    ) -> Result<
        RwLockWriteGuard<'_, HashMap<user::Username, User>>,
        Traced<database::Error>,
    > {
        self.users
            .write()
            .map_err(|_| tracerr::new!(database::Error::from(Error::Poisoned)))
    }

    /// Poisons the storage lock, making every further operation fail.
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let users = Arc::clone(&self.users);
        _ = std::thread::spawn(move || {
            let _guard = users.write();
            panic!("poisoning `Memory`");
        })
        .join();
    }
}

/// [`Memory`] database error.
#[derive(Debug, Display, StdError)]
pub enum Error {
    /// A thread panicked while holding the storage lock.
    #[display("`Memory` storage lock is poisoned")]
    Poisoned,

    /// [`User`] with the same [`user::Username`] is stored already.
    #[display("`User(username: {_0})` already exists")]
    UsernameOccupied(#[error(not(source))] user::Username),
}

impl Error {
    /// Checks whether this [`Error`] is a unique key violation.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UsernameOccupied(_))
    }
}

impl<'l> Database<Select<By<Option<User>, &'l user::Username>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Username>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.read()?.get(by.into_inner()).cloned())
    }
}

impl<'l> Database<Select<By<read::user::Exists, &'l user::Username>>>
    for Memory
{
    type Ok = read::user::Exists;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::user::Exists, &'l user::Username>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.read()?.contains_key(by.into_inner()).into())
    }
}

impl<'l> Database<Select<By<Option<user::PasswordHash>, &'l user::Username>>>
    for Memory
{
    type Ok = Option<user::PasswordHash>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<user::PasswordHash>, &'l user::Username>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self
            .read()?
            .get(by.into_inner())
            .map(|u| u.password_hash.clone()))
    }
}

impl Database<Select<By<read::user::Count, ()>>> for Memory {
    type Ok = read::user::Count;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<read::user::Count, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.read()?.len().into())
    }
}

impl Database<Insert<User>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        // Uniqueness check and insertion happen under the same write lock.
        match self.write()?.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(tracerr::new!(database::Error::from(
                Error::UsernameOccupied(user.username)
            ))),
            Entry::Vacant(entry) => {
                _ = entry.insert(user);
                Ok(())
            }
        }
    }
}
