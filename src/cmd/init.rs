//! `bootproxy init` — generate a starter configuration file.
//!
//! Serializes the built-in defaults to YAML, JSON, or TOML so the file
//! documents every setting with its current default value.

use std::path::PathBuf;

use crate::cli::{ConfigFormat, InitArgs};
use crate::config::model::Config;
use crate::error::BootProxyError;

const HEADER: &str = "# bootproxy config\n#\n# All values shown are defaults.\n\n";

pub fn execute(args: &InitArgs) -> Result<(), BootProxyError> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("bootproxy.{}", args.format.extension())));

    if output.exists() {
        return Err(BootProxyError::FileExists { path: output });
    }

    let content = render(&Config::default(), &args.format)?;
    std::fs::write(&output, content)?;
    println!("Created {}", output.display());
    Ok(())
}

/// Serialize a `Config` in the given format, with a comment header where the
/// format allows one.
pub fn render(config: &Config, format: &ConfigFormat) -> Result<String, BootProxyError> {
    match format {
        #[cfg(feature = "yaml")]
        ConfigFormat::Yaml => serde_yml::to_string(config)
            .map(|body| format!("{HEADER}{body}"))
            .map_err(|e| BootProxyError::Io(std::io::Error::other(e.to_string()))),

        #[cfg(not(feature = "yaml"))]
        ConfigFormat::Yaml => Err(BootProxyError::UnsupportedFormat("yaml".into())),

        ConfigFormat::Json => serde_json::to_string_pretty(config)
            .map(|body| format!("{body}\n"))
            .map_err(|e| BootProxyError::Io(std::io::Error::other(e.to_string()))),

        #[cfg(feature = "toml")]
        ConfigFormat::Toml => toml::to_string_pretty(config)
            .map(|body| format!("{HEADER}{body}"))
            .map_err(|e| BootProxyError::Io(std::io::Error::other(e.to_string()))),

        #[cfg(not(feature = "toml"))]
        ConfigFormat::Toml => Err(BootProxyError::UnsupportedFormat("toml".into())),
    }
}
