//! [`Command`] for creating a [`Session`].

use common::{
    operations::{By, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret as _, SecretBox};
use tokio::task;
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{session::Token, Password, Username};
use crate::{
    domain::{
        user::{self, session, Session},
        User,
    },
    infra::{database, Database},
    read, Service,
};

use super::Command;

/// [`Command`] for creating a [`Session`].
#[derive(Clone, Debug, From)]
pub enum CreateUserSession {
    /// Create a new [`Session`] by [`User`] credentials.
    ByCredentials {
        /// [`Username`] of a [`User`], as submitted.
        username: String,

        /// [`Password`] of a [`User`], as submitted.
        password: SecretBox<user::Password>,
    },

    /// Create a new [`Session`] for the [`User`] with the provided
    /// [`Username`].
    ByUsername(user::Username),
}

/// Output of [`CreateUserSession`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// [`Token`] of the created [`Session`].
    pub token: session::Token,

    /// Created [`Session`].
    pub session: Session,
}

impl<Db> Command<CreateUserSession> for Service<Db>
where
    Db: for<'l> Database<
            Select<By<read::user::Exists, &'l user::Username>>,
            Ok = read::user::Exists,
            Err = Traced<database::Error>,
        > + for<'l> Database<
            Select<By<Option<user::PasswordHash>, &'l user::Username>>,
            Ok = Option<user::PasswordHash>,
            Err = Traced<database::Error>,
        > + for<'l> Database<
            Select<By<Option<User>, &'l user::Username>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use CreateUserSession as Cmd;
        use ExecutionError as E;

        let username = match cmd {
            Cmd::ByCredentials { username, password } => {
                // Malformed `Username`s are never registered.
                let Ok(username) = user::Username::new(username.clone()) else {
                    return Err(tracerr::new!(E::UsernameNotExists(username)));
                };

                let exists: bool = self
                    .database()
                    .execute(Select(By::<read::user::Exists, _>::new(
                        &username,
                    )))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .into();
                if !exists {
                    return Err(tracerr::new!(E::UsernameNotExists(
                        username.to_string()
                    )));
                }

                let hash = self
                    .database()
                    .execute(Select(By::<Option<user::PasswordHash>, _>::new(
                        &username,
                    )))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or_else(|| E::PasswordHashMissing(username.clone()))
                    .map_err(tracerr::wrap!())?;

                let matches = task::spawn_blocking(move || {
                    hash.verify(password.expose_secret())
                })
                .await
                .map_err(tracerr::from_and_wrap!(=> E))?;
                if !matches {
                    return Err(tracerr::new!(E::WrongPassword));
                }

                username
            }
            Cmd::ByUsername(username) => {
                self.database()
                    .execute(Select(By::<Option<User>, _>::new(&username)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or_else(|| E::UsernameNotExists(username.to_string()))
                    .map_err(tracerr::wrap!())?
                    .username
            }
        };

        let session = Session {
            username,
            expires_at: (DateTime::now() + self.config().session_ttl).coerce(),
        };

        let (key_id, key) = self.config().session_keys.current();
        let header = jsonwebtoken::Header {
            kid: Some(key_id.to_owned()),
            ..jsonwebtoken::Header::default()
        };
        let token = jsonwebtoken::encode(&header, &session, key)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        Ok(Output {
            token: token.into(),
            session,
        })
    }
}

/// Error of [`CreateUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`jsonwebtoken`] encoding error.
    #[display("Failed to encode a JSON Web Token: {_0}")]
    #[from]
    JsonWebTokenEncodeError(jsonwebtoken::errors::Error),

    /// Blocking verification task failed.
    #[display("`Password` verification task failed: {_0}")]
    #[from]
    VerificationTask(task::JoinError),

    /// [`User`] with the provided [`Username`] does not exist.
    #[display("`User(username: {_0})` does not exist")]
    UsernameNotExists(#[error(not(source))] String),

    /// Existing [`User`] has no [`user::PasswordHash`] stored.
    #[display("`User(username: {_0})` has no `PasswordHash`")]
    PasswordHashMissing(#[error(not(source))] user::Username),

    /// Provided [`Password`] does not match the [`User`]'s one.
    #[display("Wrong `Password`")]
    WrongPassword,
}
