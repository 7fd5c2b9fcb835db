use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One DOM node as reported by the in-page extraction script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawNode {
    pub tag: String,
    pub id: Option<String>,
    pub class_name: Option<String>,
    pub text: Option<String>,
    pub href: Option<String>,
    pub src: Option<String>,
    pub r#type: Option<String>,
    pub value: Option<String>,
    pub placeholder: Option<String>,
    pub title: Option<String>,
    pub alt: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
    pub aria_label: Option<String>,
    /// Tag and same-tag sibling ordinal for each ancestor below `body`, e.g. `form:0>input:1`
    pub path: Option<String>,
    pub visible: bool,
    pub position: Position,
    pub attributes: BTreeMap<String, String>,
}

impl RawNode {
    pub fn new(tag: &str) -> Self {
        RawNode {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    /// Non-blank value of a named attribute, preferring the dedicated fields.
    pub fn attr(&self, name: &str) -> Option<&str> {
        let field = match name {
            "id" => self.id.as_deref(),
            "class" => self.class_name.as_deref(),
            "href" => self.href.as_deref(),
            "src" => self.src.as_deref(),
            "type" => self.r#type.as_deref(),
            "value" => self.value.as_deref(),
            "placeholder" => self.placeholder.as_deref(),
            "title" => self.title.as_deref(),
            "alt" => self.alt.as_deref(),
            "name" => self.name.as_deref(),
            "role" => self.role.as_deref(),
            "aria-label" => self.aria_label.as_deref(),
            _ => None,
        };
        field
            .or_else(|| self.attributes.get(name).map(String::as_str))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// Whether the attribute is present at all, even with an empty value.
    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name) || self.attr(name).is_some()
    }

    pub fn tag_lower(&self) -> String {
        self.tag.trim().to_lowercase()
    }

    pub fn trimmed_text(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Position {
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// A captured, classified element.
///
/// `id` is the stable key used to match the same element across scans.
/// `css_selector` and `xpath` are only ever produced by the selector synthesizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: String,
    pub tag_name: String,
    pub attributes: BTreeMap<String, String>,
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,
    pub position: Position,
    pub is_visible: bool,
    pub is_interactive: bool,
    pub css_selector: String,
    pub xpath: String,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Current value of a field the model differ tracks.
    pub fn tracked_value(&self, field: TrackedField) -> Option<&str> {
        match field {
            TrackedField::Text => self.text.as_deref(),
            TrackedField::CssSelector => Some(self.css_selector.as_str()),
            TrackedField::XPath => Some(self.xpath.as_str()),
            other => self.attributes.get(other.name()).map(String::as_str),
        }
    }
}

/// Fields whose changes make an element "modified" between two scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackedField {
    Text,
    Value,
    Href,
    Src,
    Placeholder,
    Title,
    CssSelector,
    XPath,
}

impl TrackedField {
    pub const ALL: [TrackedField; 8] = [
        TrackedField::Text,
        TrackedField::Value,
        TrackedField::Href,
        TrackedField::Src,
        TrackedField::Placeholder,
        TrackedField::Title,
        TrackedField::CssSelector,
        TrackedField::XPath,
    ];

    /// Wire name, as used in `AttributeChange::attribute`.
    pub fn name(&self) -> &'static str {
        match self {
            TrackedField::Text => "text",
            TrackedField::Value => "value",
            TrackedField::Href => "href",
            TrackedField::Src => "src",
            TrackedField::Placeholder => "placeholder",
            TrackedField::Title => "title",
            TrackedField::CssSelector => "cssSelector",
            TrackedField::XPath => "xpath",
        }
    }

    pub fn is_locator(&self) -> bool {
        matches!(self, TrackedField::CssSelector | TrackedField::XPath)
    }
}

/// Result of one scan: page metadata plus elements in DOM traversal order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageModel {
    pub title: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub elements: Vec<Element>,
}

impl PageModel {
    pub fn new(url: &str, title: &str, elements: Vec<Element>) -> Self {
        PageModel {
            title: title.to_string(),
            url: url.to_string(),
            timestamp: Utc::now(),
            elements,
        }
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn interactive(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(|e| e.is_interactive)
    }
}
