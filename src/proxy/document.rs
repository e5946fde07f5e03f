//! Boot document model and rewrite.
//!
//! The body is decoded as a plain [`Value`] tree; only `config.href`,
//! `config.id` and `config.webviews` are ever touched. Every other field keeps
//! its number spelling and nested key order (`serde_json` is built with
//! `arbitrary_precision` and `preserve_order`). On output the top-level,
//! `config` and `webviews` keys are sorted and indentation is a tab.

use serde::de::Error as _;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

use super::webviews::store_webviews;

const CONFIG: &str = "config";
const HREF: &str = "href";
const ID: &str = "id";
const WEBVIEWS: &str = "webviews";

#[derive(Debug, Clone, PartialEq)]
pub struct BootResponse {
    root: Map<String, Value>,
}

/// Values written into a document by [`BootResponse::rewrite`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteTarget {
    pub store_uri: String,
    pub href: String,
    pub id: String,
}

impl BootResponse {
    /// Decode a body the proxy knows how to rewrite: an object whose `config`
    /// is an object, with string `href`/`id` and a string-valued `webviews`
    /// object when those are present and not null.
    pub fn from_slice(body: &[u8]) -> serde_json::Result<Self> {
        let Value::Object(root) = serde_json::from_slice(body)? else {
            return Err(serde_json::Error::custom("boot document is not an object"));
        };
        let Some(Value::Object(config)) = root.get(CONFIG) else {
            return Err(serde_json::Error::custom("`config` is missing or not an object"));
        };

        for key in [HREF, ID] {
            if !matches!(config.get(key), None | Some(Value::Null | Value::String(_))) {
                return Err(serde_json::Error::custom(format!("`config.{key}` is not a string")));
            }
        }
        match config.get(WEBVIEWS) {
            None | Some(Value::Null) => {}
            Some(Value::Object(views)) if views.values().all(Value::is_string) => {}
            Some(_) => {
                return Err(serde_json::Error::custom(
                    "`config.webviews` is not an object of strings",
                ))
            }
        }

        Ok(Self { root })
    }

    /// The decoded `config` object.
    #[must_use]
    pub fn config(&self) -> Option<&Map<String, Value>> {
        self.root.get(CONFIG).and_then(Value::as_object)
    }

    #[must_use]
    pub fn href(&self) -> Option<&str> {
        self.config()?.get(HREF).and_then(Value::as_str)
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.config()?.get(ID).and_then(Value::as_str)
    }

    #[must_use]
    pub fn webviews(&self) -> Option<&Map<String, Value>> {
        self.config()?.get(WEBVIEWS).and_then(Value::as_object)
    }

    /// Overwrite the store webviews, `href` and `id`. Applying the same
    /// target twice gives the same document as applying it once.
    pub fn rewrite(&mut self, target: &RewriteTarget) {
        let Some(config) = self.root.get_mut(CONFIG).and_then(Value::as_object_mut) else {
            return;
        };

        let views = config
            .entry(WEBVIEWS)
            .or_insert_with(|| Value::Object(Map::new()));
        if !views.is_object() {
            *views = Value::Object(Map::new());
        }
        if let Some(views) = views.as_object_mut() {
            for (key, url) in store_webviews(&target.store_uri) {
                views.insert(key.to_string(), Value::String(url));
            }
        }

        config.insert(HREF.to_string(), Value::String(target.href.clone()));
        config.insert(ID.to_string(), Value::String(target.id.clone()));
    }

    /// Tab-indented JSON. Top-level, `config` and `webviews` keys are sorted;
    /// everything below them is written in upstream order.
    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        let mut root = sorted(&self.root);
        if let Some(Value::Object(config)) = root.get_mut(CONFIG) {
            *config = sorted(config);
            if let Some(Value::Object(views)) = config.get_mut(WEBVIEWS) {
                *views = sorted(views);
            }
        }

        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"\t"));
        root.serialize(&mut ser)?;
        Ok(buf)
    }
}

fn sorted(map: &Map<String, Value>) -> Map<String, Value> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    entries
        .into_iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
