//! HTML sanitization for document-supplied markup.
//!
//! Titles, metadata values and attribution statements may carry HTML. Before
//! any of it reaches the presentation layer it is rebuilt from a parsed
//! fragment through an allow-list: permitted elements and attributes are
//! re-emitted with escaped content, other elements are unwrapped (their
//! children survive), and script-like elements are removed entirely.

use std::collections::{HashMap, HashSet};
use std::fmt;

use scraper::{ElementRef, Html, Node};

/// Pluggable HTML sanitizer.
pub trait HtmlSanitizer: fmt::Debug + Send + Sync {
    /// Return a safe rendition of `html`.
    fn sanitize(&self, html: &str) -> String;
}

/// Elements whose content is never rendered.
const DROPPED_ELEMENTS: &[&str] = &["script", "style", "template", "noscript", "iframe", "object"];

/// Elements written without a closing tag.
const VOID_ELEMENTS: &[&str] = &["br", "img"];

/// Allow-list sanitizer.
///
/// The default instance permits `a b br img p i span`, `href` on `a`,
/// `src` and `alt` on `img`, and only `http`/`https` links.
#[derive(Debug, Clone)]
pub struct AllowListSanitizer {
    elements: HashSet<String>,
    attributes: HashMap<String, Vec<String>>,
    url_schemes: HashSet<String>,
}

impl Default for AllowListSanitizer {
    fn default() -> Self {
        let elements = ["a", "b", "br", "img", "p", "i", "span"]
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut attributes = HashMap::new();
        attributes.insert("a".to_string(), vec!["href".to_string()]);
        attributes.insert("img".to_string(), vec!["src".to_string(), "alt".to_string()]);

        let url_schemes = ["http", "https"].into_iter().map(str::to_string).collect();

        Self {
            elements,
            attributes,
            url_schemes,
        }
    }
}

impl AllowListSanitizer {
    /// Whether `element` may be emitted.
    #[must_use]
    pub fn permits_element(&self, element: &str) -> bool {
        self.elements.contains(element)
    }

    /// Whether `attribute` may be emitted on `element` (value checks aside).
    #[must_use]
    pub fn permits_attribute(&self, element: &str, attribute: &str) -> bool {
        self.attributes
            .get(element)
            .is_some_and(|allowed| allowed.iter().any(|a| a == attribute))
    }

    /// Whether a link target uses a permitted scheme. Relative links have no
    /// scheme and are rejected.
    #[must_use]
    pub fn permits_url(&self, url: &str) -> bool {
        let url = url.trim();
        let Some(colon) = url.find(':') else {
            return false;
        };
        if url[..colon].contains(['/', '?', '#']) {
            return false;
        }
        self.url_schemes
            .contains(url[..colon].to_ascii_lowercase().as_str())
    }

    fn write_children(&self, element: ElementRef<'_>, out: &mut String) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => out.push_str(&html_escape::encode_text(&**text)),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.write_element(child, out);
                    }
                }
                _ => {}
            }
        }
    }

    fn write_element(&self, element: ElementRef<'_>, out: &mut String) {
        let name = element.value().name();

        if DROPPED_ELEMENTS.contains(&name) {
            return;
        }

        if !self.permits_element(name) {
            self.write_children(element, out);
            return;
        }

        out.push('<');
        out.push_str(name);
        let allowed = self.attributes.get(name).map(Vec::as_slice).unwrap_or_default();
        for attribute in allowed {
            let Some(value) = element.value().attr(attribute) else {
                continue;
            };
            if attribute == "href" && !self.permits_url(value) {
                continue;
            }
            out.push(' ');
            out.push_str(attribute);
            out.push_str("=\"");
            out.push_str(&html_escape::encode_double_quoted_attribute(value));
            out.push('"');
        }
        out.push('>');

        if VOID_ELEMENTS.contains(&name) {
            return;
        }

        self.write_children(element, out);
        out.push_str("</");
        out.push_str(name);
        out.push('>');
    }
}

impl HtmlSanitizer for AllowListSanitizer {
    fn sanitize(&self, html: &str) -> String {
        let fragment = Html::parse_fragment(html);
        let mut out = String::with_capacity(html.len());
        self.write_children(fragment.root_element(), &mut out);
        out
    }
}
