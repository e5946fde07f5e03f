//! YAML config source backed by [`FileSource`].
//!
//! Picked for `bootproxy.yaml` during auto-detection and for any `--config`
//! path ending in `.yaml` or `.yml`. The `upstream` and `rewrite` sections map
//! onto [`Config`]; unknown keys fail the load.

use std::path::PathBuf;

use super::file_source::FileSource;
use crate::config::model::Config;

#[must_use]
pub fn new(path: PathBuf) -> FileSource {
    FileSource::new(path, "yaml", |content| {
        serde_yml::from_str::<Config>(content)
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
    })
}
