//! [`Command`] for authorizing a [`User`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use jsonwebtoken::Validation;
use tracerr::Traced;

use crate::{
    domain::{
        user::{self, session, Session},
        User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for authorizing a [`User`].
///
/// The [`session::Token`] must be signed with one of the configured keys, be
/// unexpired, and belong to a [`User`] still registered.
#[derive(Clone, Debug, From)]
pub struct AuthorizeUserSession {
    /// [`Session`] token to authorize.
    pub token: session::Token,
}

impl<Db> Command<AuthorizeUserSession> for Service<Db>
where
    Db: for<'l> Database<
        Select<By<Option<User>, &'l user::Username>>,
        Ok = Option<User>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeUserSession { token } = cmd;

        let key_id = jsonwebtoken::decode_header(token.as_ref())
            .map_err(tracerr::from_and_wrap!(=> E))?
            .kid
            .ok_or(E::MissingKeyId)
            .map_err(tracerr::wrap!())?;
        let key = self
            .config()
            .session_keys
            .get(&key_id)
            .ok_or_else(|| E::UnknownKeyId(key_id.clone()))
            .map_err(tracerr::wrap!())?;

        let session = jsonwebtoken::decode::<Session>(
            token.as_ref(),
            key,
            &Validation::default(),
        )
        .map_err(tracerr::from_and_wrap!(=> E))?
        .claims;

        drop(
            self.database()
                .execute(Select(By::new(&session.username)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or_else(|| E::UserNotExists(session.username.clone()))
                .map_err(tracerr::wrap!())?,
        );

        Ok(session)
    }
}

/// Error of [`AuthorizeUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`jsonwebtoken`] decoding error.
    #[display("Failed to decode a JSON Web Token: {_0}")]
    JsonWebTokenDecodeError(jsonwebtoken::errors::Error),

    /// [`session::Token`] doesn't name the key it's signed with.
    #[display("JSON Web Token has no `kid`")]
    MissingKeyId,

    /// [`session::Token`] is signed with a key not configured.
    #[display("Unknown signing key `{_0}`")]
    #[from(ignore)]
    UnknownKeyId(#[error(not(source))] String),

    /// [`User`] the [`Session`] belongs to does not exist.
    #[display("`User(username: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Username),
}
