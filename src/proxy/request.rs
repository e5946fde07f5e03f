//! Inbound boot request parsing.
//!
//! [`BootRequest::parse`] turns the raw inbound path and query into the
//! validated pieces the handler needs: the [`Platform`], the verbatim
//! sub-path, the query to forward (with `store_uri` removed) and the
//! effective store URI. Validation order matters: `store_uri` is checked
//! before the platform.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::error::BootError;

pub const STORE_URI_PARAM: &str = "store_uri";

/// Prefix stripped from the inbound path to derive `config.id`.
pub const BOOT_PREFIX: &str = "/boot/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Android => "android",
            Self::Ios => "ios",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = BootError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "android" => Ok(Self::Android),
            "ios" => Ok(Self::Ios),
            other => Err(BootError::InvalidOs(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootRequest {
    pub platform: Platform,
    /// Raw sub-path after `/boot/{os}/`, still percent-encoded.
    pub sub_path: String,
    /// Inbound query minus every `store_uri` pair.
    pub forwarded_query: String,
    pub store_uri: String,
    /// Full inbound path, percent-decoded, used for `config.href` and
    /// `config.id`.
    pub inbound_path: String,
}

impl BootRequest {
    /// Parse an inbound `/boot/{os}/{path}` request.
    ///
    /// `default_store_uri` is used when `store_uri` is absent or empty.
    pub fn parse(
        path: &str,
        query: Option<&str>,
        default_store_uri: &str,
    ) -> Result<Self, BootError> {
        let query = query.unwrap_or("");

        let store_uri = match store_uri_param(query) {
            Some(uri) if !uri.is_empty() => {
                check_store_uri(&uri)?;
                uri
            }
            _ => default_store_uri.to_string(),
        };

        let (os, sub_path) = split_boot_path(path);
        let platform: Platform = os.parse()?;

        Ok(Self {
            platform,
            sub_path: sub_path.to_string(),
            forwarded_query: strip_store_uri(query),
            store_uri,
            inbound_path: decode_path(path),
        })
    }

    /// `{base}{os}/{path}?{query}`. The `?` is always present.
    #[must_use]
    pub fn upstream_url(&self, base_url: &str) -> String {
        format!(
            "{base_url}{}/{}?{}",
            self.platform, self.sub_path, self.forwarded_query
        )
    }

    /// Value written into `config.id`.
    #[must_use]
    pub fn boot_id(&self) -> String {
        self.inbound_path.replace(BOOT_PREFIX, "")
    }
}

/// Split `/boot/{os}/{rest}` into `(os, rest)`.
fn split_boot_path(path: &str) -> (&str, &str) {
    let tail = path.strip_prefix(BOOT_PREFIX).unwrap_or(path);
    tail.split_once('/').unwrap_or((tail, ""))
}

/// Percent-decode a path. Sequences that do not decode to UTF-8 leave the
/// path as received.
fn decode_path(path: &str) -> String {
    urlencoding::decode(path).map_or_else(|_| path.to_string(), Cow::into_owned)
}

/// First decoded `store_uri` value, if the key is present.
fn store_uri_param(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == STORE_URI_PARAM)
        .map(|(_, value)| value.into_owned())
}

fn check_store_uri(uri: &str) -> Result<(), BootError> {
    // The url parser silently drops tabs and newlines, so reject control
    // characters up front.
    if uri.chars().any(char::is_control) {
        return Err(BootError::InvalidStoreUri);
    }
    url::Url::parse(uri).map_err(|_| BootError::InvalidStoreUri)?;
    Ok(())
}

/// Drop every `store_uri` pair; other pairs keep their raw encoding and order.
fn strip_store_uri(query: &str) -> String {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            url::form_urlencoded::parse(pair.as_bytes())
                .next()
                .map_or(true, |(key, _)| key != STORE_URI_PARAM)
        })
        .collect::<Vec<_>>()
        .join("&")
}
