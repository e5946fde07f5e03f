//! Optional Sentry error tracking for `bootproxy run`.
//!
//! Enabled by `--sentry-dsn` / `SENTRY_DSN`. Events carry the crate version
//! as release and a `service=bootproxy` tag. Hold the returned guard until
//! the server stops, or queued events are lost.

pub fn init(dsn: &str, environment: Option<&str>) -> sentry::ClientInitGuard {
    let parsed_dsn = match dsn.parse() {
        Ok(d) => Some(d),
        Err(e) => {
            tracing::warn!(error = %e, "invalid Sentry DSN, error tracking disabled");
            None
        }
    };

    let guard = sentry::init(sentry::ClientOptions {
        dsn: parsed_dsn,
        environment: environment.map(|e| e.to_string().into()),
        release: Some(env!("CARGO_PKG_VERSION").into()),
        ..Default::default()
    });
    sentry::configure_scope(|scope| scope.set_tag("service", "bootproxy"));
    guard
}
