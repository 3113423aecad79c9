//! Application provides HTTP API for interacting with the [`Service`].

#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod api;
pub mod args;
pub mod config;
mod context;
pub mod error;
pub mod middleware;
pub mod view;

use axum::{
    routing::{get, post},
    Extension, Router,
};
// Used in binary.
use axum_client_ip as _;
use tokio as _;
use tower_http as _;
use tracing_subscriber as _;

pub use self::{
    args::Args,
    config::Config,
    context::{Context, Session, SESSION_COOKIE},
    error::{AsError, Error},
};

/// [`Service`] with filled infrastructure dependencies.
///
/// [`Service`]: service::Service
pub type Service = service::Service<service::infra::Memory>;

/// Creates a new [`Router`] serving the HTTP API with the provided
/// [`Service`].
pub fn router(service: Service) -> Router {
    let logged_out_only = Router::new()
        .route("/signup", get(api::signup::page))
        .route("/signin", get(api::signin::page))
        .route("/signup-validator", post(api::signup::validate))
        .route("/signin-validator", post(api::signin::validate))
        .route_layer(axum::middleware::from_fn(middleware::require_logout));

    Router::new()
        .route("/", get(api::home))
        .route("/logout", post(api::logout))
        .merge(logged_out_only)
        .layer(axum::middleware::from_fn(middleware::cache_control))
        .layer(Extension(service))
}
