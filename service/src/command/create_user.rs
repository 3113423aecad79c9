//! [`Command`] for creating a new [`User`].

use common::{
    operations::{By, Insert, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret as _, SecretBox};
use tokio::task;
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::user::{Password, Username};
use crate::{
    domain::{user, User},
    infra::{database, Database},
    read, Service,
};

use super::Command;

/// [`Command`] for creating a new [`User`].
///
/// The rules are checked in a fixed order and the first broken one is
/// reported:
/// 1. [`Username`] length;
/// 2. [`Username`] allowed characters;
/// 3. [`Username`] is not occupied;
/// 4. [`Password`] length;
/// 5. [`Password`] confirmation.
///
/// Occupied [`Username`]s always satisfy the first two rules, so the result
/// is the same as if occupation were checked right after the length.
#[derive(Clone, Debug)]
pub struct CreateUser {
    /// Requested [`Username`] of a new [`User`], as submitted.
    pub username: String,

    /// [`Password`] of a new [`User`], as submitted.
    pub password: SecretBox<user::Password>,

    /// Repeated [`Password`], as submitted.
    pub password_confirmation: SecretBox<user::Password>,
}

impl<Db> Command<CreateUser> for Service<Db>
where
    Db: for<'l> Database<
            Select<By<read::user::Exists, &'l user::Username>>,
            Ok = read::user::Exists,
            Err = Traced<database::Error>,
        > + Database<Insert<User>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUser {
            username,
            password,
            password_confirmation,
        } = cmd;

        let username = user::Username::new(username)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let exists: bool = self
            .database()
            .execute(Select(By::new(&username)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .into();
        if exists {
            return Err(tracerr::new!(E::UsernameOccupied(username)));
        }

        password
            .expose_secret()
            .validate()
            .map_err(tracerr::from_and_wrap!(=> E))?;
        if password.expose_secret() != password_confirmation.expose_secret() {
            return Err(tracerr::new!(E::PasswordMismatch));
        }

        let cost = self.config().password_hash_cost;
        let password_hash = task::spawn_blocking(move || {
            user::PasswordHash::new(password.expose_secret(), cost)
        })
        .await
        .map_err(tracerr::from_and_wrap!(=> E))?
        .map_err(tracerr::from_and_wrap!(=> E))?;

        let user = User {
            username,
            password_hash,
            created_at: DateTime::now().coerce(),
        };

        match self.database().execute(Insert(user.clone())).await {
            Ok(()) => Ok(user),
            // Somebody else has taken the `Username` while the `Password`
            // was hashed.
            Err(e) if e.as_ref().is_unique_violation() => {
                log::debug!("`{}` username taken concurrently", user.username);
                Err(tracerr::new!(E::UsernameTaken(user.username)))
            }
            Err(e) => Err(e).map_err(tracerr::map_from_and_wrap!(=> E)),
        }
    }
}

/// Error of [`CreateUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Submitted [`Username`] is malformed.
    #[display("Invalid `Username`: {_0}")]
    #[from]
    InvalidUsername(user::UsernameViolation),

    /// [`Username`] is occupied by an existing [`User`].
    #[display("`{_0}` username is occupied")]
    UsernameOccupied(#[error(not(source))] user::Username),

    /// Submitted [`Password`] is malformed.
    #[display("Invalid `Password`: {_0}")]
    #[from]
    InvalidPassword(user::PasswordViolation),

    /// [`Password`] and its confirmation differ.
    #[display("`Password` confirmation does not match")]
    PasswordMismatch,

    /// Failed to hash the [`Password`].
    #[display("Failed to hash `Password`: {_0}")]
    #[from]
    PasswordHash(bcrypt::BcryptError),

    /// Blocking hashing task failed.
    #[display("`Password` hashing task failed: {_0}")]
    #[from]
    HashingTask(task::JoinError),

    /// [`Username`] has been occupied by a concurrent [`CreateUser`] after
    /// it was checked to be free.
    #[display("`{_0}` username has been taken concurrently")]
    UsernameTaken(#[error(not(source))] user::Username),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};
    use secrecy::SecretBox;

    use crate::{
        domain::user, infra::Database as _, read, test_utils, Command as _,
    };

    use super::{CreateUser, ExecutionError};

    fn cmd(username: &str, password: &str, confirmation: &str) -> CreateUser {
        let password = user::Password::from(password);
        let confirmation = user::Password::from(confirmation);
        CreateUser {
            username: username.to_owned(),
            password: SecretBox::init_with(move || password),
            password_confirmation: SecretBox::init_with(move || confirmation),
        }
    }

    async fn count(svc: &crate::Service<crate::infra::Memory>) -> usize {
        svc.database()
            .execute(Select(By::<read::user::Count, _>::new(())))
            .await
            .unwrap()
            .into()
    }

    #[tokio::test]
    async fn creates_user() {
        let svc = test_utils::service();

        let user =
            svc.execute(cmd("alice", "secret1", "secret1")).await.unwrap();

        assert_eq!(user.username.as_ref(), "alice");
        assert!(user.password_hash.verify(&user::Password::from("secret1")));
        assert_eq!(count(&svc).await, 1);
    }

    #[tokio::test]
    async fn rejects_bad_username_length() {
        let svc = test_utils::service();

        for name in ["", "ab", "abcdefghijklmnop"] {
            let err = svc
                .execute(cmd(name, "secret1", "secret1"))
                .await
                .unwrap_err();

            assert!(
                matches!(err.as_ref(), ExecutionError::InvalidUsername(
                    user::UsernameViolation::TooShort
                        | user::UsernameViolation::TooLong,
                )),
                "unexpected error for `{name}`: {err}",
            );
        }
        assert_eq!(count(&svc).await, 0);
    }

    #[tokio::test]
    async fn rejects_bad_username_characters() {
        let svc = test_utils::service();

        let err = svc
            .execute(cmd("al ice", "secret1", "secret1"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidUsername(
                user::UsernameViolation::InvalidCharacters,
            ),
        ));
    }

    #[tokio::test]
    async fn rejects_occupied_username() {
        let svc = test_utils::service();
        _ = svc.execute(cmd("alice", "secret1", "secret1")).await.unwrap();

        let err = svc
            .execute(cmd("alice", "another1", "another1"))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::UsernameOccupied(_)));
        assert_eq!(count(&svc).await, 1);
    }

    #[tokio::test]
    async fn username_is_checked_before_password() {
        let svc = test_utils::service();

        let err = svc.execute(cmd("ab", "123", "456")).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::InvalidUsername(_)));
    }

    #[tokio::test]
    async fn rejects_bad_password_length() {
        let svc = test_utils::service();

        let short = svc.execute(cmd("alice", "12345", "12345")).await;
        let long = svc
            .execute(cmd("alice", &"x".repeat(31), &"x".repeat(31)))
            .await;

        assert!(matches!(
            short.unwrap_err().as_ref(),
            ExecutionError::InvalidPassword(user::PasswordViolation::TooShort),
        ));
        assert!(matches!(
            long.unwrap_err().as_ref(),
            ExecutionError::InvalidPassword(user::PasswordViolation::TooLong),
        ));
        assert_eq!(count(&svc).await, 0);
    }

    #[tokio::test]
    async fn rejects_mismatched_confirmation() {
        let svc = test_utils::service();

        let err = svc
            .execute(cmd("alice", "secret1", "secret2"))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::PasswordMismatch));
        assert_eq!(count(&svc).await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_signups_create_one_user() {
        let svc = test_utils::service();

        let handles = (0..8)
            .map(|_| {
                let svc = svc.clone();
                tokio::spawn(async move {
                    svc.execute(cmd("alice", "secret1", "secret1")).await
                })
            })
            .collect::<Vec<_>>();
        let mut succeeded = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(e) => assert!(
                    matches!(
                        e.as_ref(),
                        ExecutionError::UsernameOccupied(_)
                            | ExecutionError::UsernameTaken(_),
                    ),
                    "unexpected error: {e}",
                ),
            }
        }

        assert_eq!(succeeded, 1);
        assert_eq!(count(&svc).await, 1);
    }

    #[tokio::test]
    async fn fails_on_broken_storage() {
        let svc = test_utils::service();
        svc.database().poison();

        let err = svc
            .execute(cmd("alice", "secret1", "secret1"))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::Db(_)));
    }
}
