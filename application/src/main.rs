use std::{io, sync::OnceLock, time};

use application::{router, view::HX_REQUEST, Args, Config};
use axum::{body::Body, extract::MatchedPath};
use axum_client_ip::InsecureClientIp;
use service::{infra::Memory, Service};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing as log;
use tracing_subscriber::{
    filter::filter_fn,
    fmt::writer::BoxMakeWriter,
    layer::SubscriberExt as _,
    registry::LookupSpan,
    util::SubscriberInitExt as _,
    Layer,
};

/// Levels written to stderr, the rest go to stdout.
const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

/// Level configured by `log.level`, [`log::Level::INFO`] until it is loaded.
static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(output(false))
        .with(output(true))
        .init();

    _ = start().await;
}

/// Builds a formatting [`Layer`] writing either the stderr levels or the
/// rest.
fn output<S>(to_stderr: bool) -> impl Layer<S>
where
    S: log::Subscriber + for<'a> LookupSpan<'a>,
{
    let writer = if to_stderr {
        BoxMakeWriter::new(io::stderr)
    } else {
        BoxMakeWriter::new(io::stdout)
    };

    tracing_subscriber::fmt::layer()
        .compact()
        .with_ansi(true)
        .with_thread_names(true)
        .with_writer(writer)
        .with_filter(filter_fn(move |meta| {
            let max = LOG_LEVEL.get().copied().unwrap_or(log::Level::INFO);
            meta.is_span() || is_written(*meta.level(), max, to_stderr)
        }))
}

/// Indicates whether an event of the `level` goes to the output picked by
/// `to_stderr`, when `max` is the most verbose level enabled.
fn is_written(level: log::Level, max: log::Level, to_stderr: bool) -> bool {
    STDERR_LEVELS.contains(&level) == to_stderr && max >= level
}

async fn start() -> Result<(), ()> {
    let Args { config } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let Config {
        server,
        service,
        log,
    } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    LOG_LEVEL
        .set(log.level.into())
        .unwrap_or_else(|_| unreachable!("first initialization"));

    if service.session.uses_default_secret() {
        log::warn!(
            "sessions are signed with the default secret, \
             set `service.session.secret` to keep them unforgeable",
        );
    }

    let app = router(Service::new(service.into(), Memory::new())).layer(
        TraceLayer::new_for_http()
            .make_span_with(request_span)
            .on_response(record_response),
    );

    let addr = format!("{}:{}", server.host, server.port);
    let listener = TcpListener::bind(addr.as_str()).await.map_err(|e| {
        log::error!("failed to listen on `{addr}`: {e}");
    })?;

    log::info!("listening on `{addr}`");

    axum::serve(listener, app)
        .await
        .map_err(|e| log::error!("webserver failed: {e}"))
}

/// Opens the span of a served request.
fn request_span(req: &http::Request<Body>) -> log::Span {
    let headers = req.headers();

    log::info_span!(
        "HTTP request",
        http.client_ip = InsecureClientIp::from(headers, req.extensions())
            .map(|ip| ip.0.to_string())
            .ok(),
        http.method = req.method().as_str(),
        http.route = req
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str),
        http.target = req
            .uri()
            .path_and_query()
            .map(http::uri::PathAndQuery::as_str),
        http.user_agent = headers
            .get(http::header::USER_AGENT)
            .and_then(|h| h.to_str().ok()),
        http.htmx = headers.contains_key(HX_REQUEST),
        http.status_code = log::field::Empty,
    )
}

/// Records the outcome of a served request.
///
/// Only server errors are logged as errors.
fn record_response(
    res: &http::Response<Body>,
    took: time::Duration,
    span: &log::Span,
) {
    let status = res.status();
    _ = span.record("http.status_code", status.as_u16());

    let took = format!("{}ms", took.as_millis());
    if status.is_server_error() {
        log::error!(took, "failed with {status}");
    } else {
        log::info!(took, "responded with {status}");
    }
}

#[cfg(test)]
mod spec {
    use tracing::Level;

    use super::is_written;

    #[test]
    fn splits_levels_between_outputs() {
        for level in [Level::WARN, Level::ERROR] {
            assert!(is_written(level, Level::INFO, true));
            assert!(!is_written(level, Level::INFO, false));
        }
        for level in [Level::INFO, Level::DEBUG] {
            assert!(is_written(level, Level::TRACE, false));
            assert!(!is_written(level, Level::TRACE, true));
        }
    }

    #[test]
    fn drops_levels_above_configured() {
        assert!(!is_written(Level::DEBUG, Level::INFO, false));
        assert!(!is_written(Level::TRACE, Level::DEBUG, false));
        assert!(!is_written(Level::WARN, Level::ERROR, true));
        assert!(is_written(Level::ERROR, Level::ERROR, true));
    }
}
