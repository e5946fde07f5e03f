//! Configuration loading and validation.
//!
//! Defines the [`ConfigSource`] trait for pluggable config backends and the
//! [`ConfigVersion`] used to identify a loaded config. Submodules provide the
//! data model, validation logic, and concrete source implementations.

pub mod model;
pub mod sources;
pub mod validation;

use async_trait::async_trait;

use crate::error::BootProxyError;
use model::Config;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigVersion {
    Hash(String),
}

impl ConfigVersion {
    /// Short form for logs and the health report.
    #[must_use]
    pub fn short(&self) -> &str {
        match self {
            Self::Hash(h) => h.get(..8).unwrap_or(h),
        }
    }
}

// async_trait is required here because ConfigSource is used as Box<dyn ConfigSource>
// and native async fn in traits does not support dyn dispatch.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn load(&self) -> Result<(Config, ConfigVersion), BootProxyError>;
}
