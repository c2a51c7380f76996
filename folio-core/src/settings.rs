//! Viewer settings and host environment.
//!
//! [`Settings`] is the configuration object the host page passes in: a few
//! typed keys the engine reads, plus everything else preserved verbatim so it
//! survives a `settings()` / `update_settings()` round trip. [`ViewerContext`]
//! carries facts about the embedding environment that the engine must never
//! look up itself (query string, page domain, instance count).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ViewerResult;

/// Default template for media and deep-zoom URIs: base followed by path.
pub const DEFAULT_URI_TEMPLATE: &str = "{0}{1}";

fn default_uri_template() -> String {
    DEFAULT_URI_TEMPLATE.to_string()
}

/// Viewer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Legacy section type renames (`"Volume"` -> `"Book"`).
    #[serde(default)]
    pub section_mappings: HashMap<String, String>,
    /// Allow two-page spreads for sequences that declare them.
    #[serde(default)]
    pub paging_enabled: bool,
    /// `Some(false)` hides see-also links; anything else shows them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub see_also_enabled: Option<bool>,
    /// Prefix for the document URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_base_uri: Option<String>,
    /// Prefix for media URIs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_base_uri: Option<String>,
    /// Media URI template; `{0}` is the base, `{1}` the path.
    #[serde(default = "default_uri_template")]
    pub media_uri_template: String,
    /// Prefix for deep-zoom URIs (falls back to `dataBaseUri`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dzi_base_uri: Option<String>,
    /// Deep-zoom URI template; `{0}` is the base, `{1}` the path.
    #[serde(default = "default_uri_template")]
    pub dzi_uri_template: String,
    /// Forces the dialect: `true` for IIIF, `false` for legacy packages.
    #[serde(rename = "IIIF", default, skip_serializing_if = "Option::is_none")]
    pub iiif: Option<bool>,
    /// Keys the engine does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            section_mappings: HashMap::new(),
            paging_enabled: false,
            see_also_enabled: None,
            data_base_uri: None,
            media_base_uri: None,
            media_uri_template: default_uri_template(),
            dzi_base_uri: None,
            dzi_uri_template: default_uri_template(),
            iiif: None,
            extra: Map::new(),
        }
    }
}

impl Settings {
    /// Parse settings from JSON.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the JSON is malformed or a typed key
    /// has the wrong shape.
    pub fn from_json(json: &str) -> ViewerResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize settings (typed and opaque keys) to a JSON value.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if an opaque value cannot be encoded.
    pub fn to_value(&self) -> ViewerResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Apply `sectionMappings` to a raw section type.
    #[must_use]
    pub fn map_section_type(&self, raw: &str) -> String {
        self.section_mappings
            .get(raw)
            .filter(|mapped| !mapped.is_empty())
            .cloned()
            .unwrap_or_else(|| raw.to_string())
    }

    /// Whether see-also links should be shown.
    #[must_use]
    pub fn is_see_also_enabled(&self) -> bool {
        self.see_also_enabled != Some(false)
    }

    /// `dataBaseUri + path`, or `path` alone when no base is set.
    #[must_use]
    pub fn data_uri(&self, path: &str) -> String {
        match self.data_base_uri.as_deref() {
            Some(base) if !base.is_empty() => format!("{base}{path}"),
            _ => path.to_string(),
        }
    }

    /// Media URI for `path` through `mediaUriTemplate`.
    #[must_use]
    pub fn media_uri(&self, path: &str) -> String {
        let base = self.media_base_uri.as_deref().unwrap_or_default();
        format_template(&self.media_uri_template, &[base, path])
    }

    /// Deep-zoom URI for `path` through `dziUriTemplate`.
    #[must_use]
    pub fn dzi_uri(&self, path: &str) -> String {
        let base = [self.dzi_base_uri.as_deref(), self.data_base_uri.as_deref()]
            .into_iter()
            .flatten()
            .find(|b| !b.is_empty())
            .unwrap_or_default();
        format_template(&self.dzi_uri_template, &[base, path])
    }
}

/// Substitute `{0}`, `{1}`, ... in `template` with `args`.
///
/// Placeholders without a matching argument are left as written.
#[must_use]
pub fn format_template(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len() + args.iter().map(|a| a.len()).sum::<usize>());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let substituted = after.find('}').and_then(|close| {
            let index: usize = after[..close].parse().ok()?;
            let arg = args.get(index)?;
            Some((arg, close))
        });
        match substituted {
            Some((arg, close)) => {
                out.push_str(arg);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Facts about the embedding environment.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewerContext {
    /// Document URI as given by the host (before `dataBaseUri`).
    pub data_uri: String,
    /// Domain of the page embedding the viewer.
    pub embed_domain: Option<String>,
    /// URI of the embed script.
    pub embed_script_uri: Option<String>,
    /// Domain the host reports for the viewer.
    pub domain: Option<String>,
    /// Whether the viewer runs on its home domain.
    pub is_home_domain: bool,
    /// Whether this is the only viewer instance on the page.
    pub is_only_instance: bool,
    /// Whether this instance was created by a reload.
    pub is_reload: bool,
    /// Whether the viewer runs inside a lightbox.
    pub is_lightbox: bool,
    /// Whether the host asked for JSONP transport.
    pub jsonp: bool,
    /// Whether cross-origin requests are available.
    pub cors_supported: bool,
}

impl Default for ViewerContext {
    fn default() -> Self {
        Self {
            data_uri: String::new(),
            embed_domain: None,
            embed_script_uri: None,
            domain: None,
            is_home_domain: false,
            is_only_instance: false,
            is_reload: false,
            is_lightbox: false,
            jsonp: false,
            cors_supported: true,
        }
    }
}

impl ViewerContext {
    /// Context for a document URI with default environment facts.
    #[must_use]
    pub fn new(data_uri: impl Into<String>) -> Self {
        Self {
            data_uri: data_uri.into(),
            ..Self::default()
        }
    }

    /// Cross-origin fetch is usable and JSONP was not requested.
    #[must_use]
    pub fn cors_enabled(&self) -> bool {
        self.cors_supported && !self.jsonp
    }

    /// Deep links are only honoured on the home domain with a single viewer.
    #[must_use]
    pub fn is_deep_linking_enabled(&self) -> bool {
        self.is_home_domain && self.is_only_instance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_empty_document() {
        let parsed = Settings::from_json("{}").unwrap();
        assert_eq!(parsed, Settings::default());
        assert_eq!(parsed.media_uri_template, "{0}{1}");
        assert!(parsed.is_see_also_enabled());
        assert!(!parsed.paging_enabled);
    }

    #[test]
    fn unknown_keys_survive_round_trip() {
        let settings = Settings::from_json(
            r#"{"pagingEnabled": true, "theme": "dark", "panels": {"left": false}, "IIIF": true}"#,
        )
        .unwrap();
        assert!(settings.paging_enabled);
        assert_eq!(settings.iiif, Some(true));
        assert_eq!(settings.extra.get("theme"), Some(&json!("dark")));

        let value = settings.to_value().unwrap();
        assert_eq!(value["panels"], json!({"left": false}));
        assert_eq!(value["IIIF"], json!(true));
        assert_eq!(value["pagingEnabled"], json!(true));
    }

    #[test]
    fn see_also_only_disabled_by_explicit_false() {
        let mut settings = Settings::default();
        settings.see_also_enabled = Some(true);
        assert!(settings.is_see_also_enabled());
        settings.see_also_enabled = Some(false);
        assert!(!settings.is_see_also_enabled());
    }

    #[test]
    fn section_mappings_rename_known_types() {
        let settings = Settings::from_json(r#"{"sectionMappings": {"Volume": "Book", "Part": ""}}"#).unwrap();
        assert_eq!(settings.map_section_type("Volume"), "Book");
        assert_eq!(settings.map_section_type("Part"), "Part");
        assert_eq!(settings.map_section_type("Chapter"), "Chapter");
    }

    #[test]
    fn template_substitutes_positional_arguments() {
        assert_eq!(format_template("{0}{1}", &["http://a/", "b.jpg"]), "http://a/b.jpg");
        assert_eq!(format_template("{1}?base={0}", &["x", "y"]), "y?base=x");
        assert_eq!(format_template("{0}/{2}", &["a"]), "a/{2}");
        assert_eq!(format_template("{name}", &["a"]), "{name}");
        assert_eq!(format_template("tail{", &[]), "tail{");
    }

    #[test]
    fn uri_helpers_apply_bases() {
        let settings = Settings::from_json(
            r#"{"dataBaseUri": "http://data/", "mediaBaseUri": "http://media/"}"#,
        )
        .unwrap();
        assert_eq!(settings.data_uri("pkg.js"), "http://data/pkg.js");
        assert_eq!(settings.media_uri("a.mp3"), "http://media/a.mp3");
        assert_eq!(settings.dzi_uri("a.dzi"), "http://data/a.dzi");

        let bare = Settings::default();
        assert_eq!(bare.data_uri("pkg.js"), "pkg.js");
        assert_eq!(bare.media_uri("a.mp3"), "a.mp3");
    }

    #[test]
    fn context_flags() {
        let mut ctx = ViewerContext::new("pkg.js");
        assert!(ctx.cors_enabled());
        assert!(!ctx.is_deep_linking_enabled());

        ctx.jsonp = true;
        assert!(!ctx.cors_enabled());

        ctx.is_home_domain = true;
        ctx.is_only_instance = true;
        assert!(ctx.is_deep_linking_enabled());
    }
}
