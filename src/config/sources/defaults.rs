//! Built-in source used when no config file is found.
//!
//! Yields [`Config::default`], versioned by the hash of its JSON form so the
//! health report still shows a stable version.

use async_trait::async_trait;

use super::sha256_hex;
use crate::config::model::Config;
use crate::config::{ConfigSource, ConfigVersion};
use crate::error::BootProxyError;

pub struct DefaultSource;

#[async_trait]
impl ConfigSource for DefaultSource {
    fn name(&self) -> &'static str {
        "defaults"
    }

    async fn load(&self) -> Result<(Config, ConfigVersion), BootProxyError> {
        let config = Config::default();
        let encoded = serde_json::to_vec(&config).map_err(|e| BootProxyError::ConfigParse {
            path: "(defaults)".into(),
            source: Box::new(e),
        })?;
        Ok((config, ConfigVersion::Hash(sha256_hex(&encoded))))
    }
}
