use serde::{Deserialize, Serialize};

use crate::screen::screen_model::{Element, RawNode};

/// Attribute view the synthesizer needs; implemented for raw and captured nodes.
pub trait SelectorSource {
    fn tag(&self) -> String;
    fn attr(&self, name: &str) -> Option<&str>;
}

impl SelectorSource for RawNode {
    fn tag(&self) -> String {
        self.tag_lower()
    }

    fn attr(&self, name: &str) -> Option<&str> {
        RawNode::attr(self, name)
    }
}

impl SelectorSource for Element {
    fn tag(&self) -> String {
        self.tag_name.trim().to_lowercase()
    }

    fn attr(&self, name: &str) -> Option<&str> {
        Element::attr(self, name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selectors {
    pub css_selector: String,
    pub xpath: String,
}

/// Appended after id/class, in this order, when present.
pub const SPECIFICITY_ATTRIBUTES: [&str; 3] = ["type", "placeholder", "title"];

/// Build a CSS selector and an XPath for one element.
///
/// An id short-circuits everything. Otherwise classes, then the specificity
/// attributes, narrow the bare tag. Nothing here checks uniqueness against
/// sibling nodes: two elements sharing tag and first class get the same output.
pub fn synthesize<S: SelectorSource + ?Sized>(source: &S) -> Selectors {
    let tag = source.tag();

    if let Some(id) = source.attr("id") {
        return Selectors {
            css_selector: format!("#{}", id),
            xpath: format!("//{}[@id=\"{}\"]", tag, id),
        };
    }

    let mut css = tag.clone();
    let mut xpath = format!("//{}", tag);

    if let Some(class_name) = source.attr("class") {
        let classes: Vec<&str> = class_name.split_whitespace().collect();
        for class in &classes {
            css.push('.');
            css.push_str(class);
        }
        if let Some(first) = classes.first() {
            xpath.push_str(&format!("[contains(@class,\"{}\")]", first));
        }
    }

    for name in SPECIFICITY_ATTRIBUTES {
        if let Some(value) = source.attr(name) {
            css.push_str(&format!("[{}=\"{}\"]", name, value));
            xpath.push_str(&format!("[@{}=\"{}\"]", name, value));
        }
    }

    Selectors {
        css_selector: css,
        xpath,
    }
}
