//! `bootproxy run` — start the proxy server.
//!
//! Loads configuration from a file (explicit or auto-detected) or the
//! built-in defaults, applies CLI / env overrides, validates the result,
//! and serves until Ctrl+C or SIGTERM.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::cli::RunArgs;
use crate::config::model::Config;
use crate::config::sources;
use crate::config::validation::validate;
use crate::config::ConfigSource;
use crate::error::BootProxyError;
use crate::logging;
use crate::server::{self, AppState, LoadedConfig};

pub async fn execute(args: RunArgs) -> Result<(), BootProxyError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    #[cfg(feature = "sentry-integration")]
    let _sentry_guard = args
        .sentry_dsn
        .as_ref()
        .map(|dsn| crate::sentry_integration::init(dsn, args.sentry_environment.as_deref()));

    let source = resolve_config_source(args.config.as_deref()).await?;
    let (mut config, version) = source.load().await?;
    apply_overrides(&mut config, &args);

    if let Err(errors) = validate(&config) {
        return Err(BootProxyError::ConfigValidation { errors });
    }

    let upstream = config.upstream.base_url.clone();
    let store_uri = config.rewrite.store_uri.clone();

    let state = Arc::new(AppState::new(LoadedConfig {
        config,
        version,
        source_name: source.name().to_string(),
        loaded_at: Instant::now(),
    }));

    let router = server::build_router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        upstream = %upstream,
        store_uri = %store_uri,
        config_source = source.name(),
        "bootproxy started"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(server::shutdown_signal())
        .await?;

    tracing::info!("bootproxy stopped");
    Ok(())
}

/// CLI flags and env vars win over file values.
pub fn apply_overrides(config: &mut Config, args: &RunArgs) {
    if let Some(ref url) = args.upstream_url {
        config.upstream.base_url.clone_from(url);
    }
    if let Some(timeout) = args.timeout {
        config.upstream.timeout = timeout;
    }
    if let Some(ref uri) = args.local_boot_uri {
        config.rewrite.local_boot_uri.clone_from(uri);
    }
    if let Some(ref uri) = args.store_uri {
        config.rewrite.store_uri.clone_from(uri);
    }
}

async fn resolve_config_source(
    explicit: Option<&Path>,
) -> Result<Box<dyn ConfigSource>, BootProxyError> {
    if let Some(path) = explicit {
        return create_file_source(path);
    }

    // Auto-detect in current directory
    let candidates = [
        "bootproxy.yaml",
        "bootproxy.yml",
        "bootproxy.json",
        "bootproxy.toml",
    ];

    for name in &candidates {
        let path = PathBuf::from(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::info!(path = %path.display(), "auto-detected config file");
            return create_file_source(&path);
        }
    }

    tracing::info!("no config file found, using built-in defaults");
    Ok(Box::new(sources::defaults::DefaultSource))
}

fn create_file_source(path: &Path) -> Result<Box<dyn ConfigSource>, BootProxyError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match ext {
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => Ok(Box::new(sources::yaml::new(path.to_path_buf()))),

        #[cfg(feature = "json")]
        "json" => Ok(Box::new(sources::json::new(path.to_path_buf()))),

        #[cfg(feature = "toml")]
        "toml" => Ok(Box::new(sources::toml_source::new(path.to_path_buf()))),

        other => Err(BootProxyError::UnsupportedFormat(other.to_string())),
    }
}
