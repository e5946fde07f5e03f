//! Store webview URL templates.
//!
//! The `$$...$$` tokens are substituted by the watch companion app, so they
//! are emitted literally.

pub const FAQ: &str = "support/faq";
pub const APPLICATION: &str = "appstore/application";
pub const APPLICATION_CHANGELOG: &str = "appstore/application_changelog";
pub const DEVELOPER_APPS: &str = "appstore/developer_apps";
pub const WATCHFACES: &str = "appstore/watchfaces";
pub const WATCHAPPS: &str = "appstore/watchapps";

const CLIENT_QUERY: &str = "pebble_color=$$pebble_color$$&hardware=$$hardware$$&uid=$$user_id$$&mid=$$phone_id$$&pid=$$pebble_id$$&$$extras$$";

/// The six webview entries pointing at `store_uri`.
#[must_use]
pub fn store_webviews(store_uri: &str) -> [(&'static str, String); 6] {
    [
        (FAQ, format!("{store_uri}/faq")),
        (
            APPLICATION,
            format!("{store_uri}/application/$$id$$?{CLIENT_QUERY}"),
        ),
        (
            APPLICATION_CHANGELOG,
            format!("{store_uri}/changelog/$$id$$?{CLIENT_QUERY}"),
        ),
        (
            DEVELOPER_APPS,
            format!("{store_uri}/developer/$$id$$?{CLIENT_QUERY}"),
        ),
        (WATCHFACES, format!("{store_uri}/watchfaces?{CLIENT_QUERY}")),
        (WATCHAPPS, format!("{store_uri}/watchapps?{CLIENT_QUERY}")),
    ]
}
