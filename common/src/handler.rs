//! [`Handler`] abstractions.

use std::future::Future;

/// Executable handler.
///
/// Serves both as a command executed by a service and as an operation
/// executed by a database, with `Args` naming what is to be done.
pub trait Handler<Args = ()> {
    /// Type of successful [`Handler`] result.
    type Ok;

    /// Type of this [`Handler`] error.
    type Err;

    /// Executes this [`Handler`] with the provided `args`.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
