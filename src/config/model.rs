//! Serde data structures for the bootproxy configuration file.
//!
//! [`Config`] is the root with two sections: [`UpstreamConfig`] (where boot
//! requests are forwarded) and [`RewriteConfig`] (the URLs written into the
//! rewritten document). Every field has a default, so an empty file is a
//! valid config.

use serde::{Deserialize, Serialize};

pub const DEFAULT_LOCAL_BOOT_URI: &str = "http://127.0.0.1:8080";
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://boot.getpebble.com/api/config/";
pub const DEFAULT_STORE_URI: &str = "https://store.rebble.io";

const fn default_timeout() -> u64 {
    5000
}

fn default_base_url() -> String {
    DEFAULT_UPSTREAM_BASE_URL.to_string()
}

fn default_local_boot_uri() -> String {
    DEFAULT_LOCAL_BOOT_URI.to_string()
}

fn default_store_uri() -> String {
    DEFAULT_STORE_URI.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub rewrite: RewriteConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Prefix of every upstream URL; the platform segment is appended directly.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Outbound request timeout in milliseconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RewriteConfig {
    /// Base written into `config.href`, followed by the inbound path.
    #[serde(default = "default_local_boot_uri")]
    pub local_boot_uri: String,

    /// Store used when the caller passes no `store_uri`.
    #[serde(default = "default_store_uri")]
    pub store_uri: String,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            local_boot_uri: default_local_boot_uri(),
            store_uri: default_store_uri(),
        }
    }
}
