use crate::screen::screen_model::RawNode;

/// Tunable inputs for deciding which scanned nodes are worth exposing.
///
/// The free-text rule (text length plus tag or keyword) trades precision for
/// recall; `max_text_len` is the knob most worth adjusting per site.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierRules {
    pub interactive_tags: &'static [&'static str],
    pub interactive_attributes: &'static [&'static str],
    pub interactive_roles: &'static [&'static str],
    pub test_hooks: &'static [&'static str],
    pub text_tags: &'static [&'static str],
    pub text_keywords: &'static [&'static str],
    /// Exclusive upper bound on text length (in chars) for the free-text rule
    pub max_text_len: usize,
}

pub const INTERACTIVE_TAGS: &[&str] = &["button", "input", "select", "textarea", "a"];

pub const INTERACTIVE_ATTRIBUTES: &[&str] = &[
    "onclick",
    "onchange",
    "onsubmit",
    "tabindex",
    "data-testid",
    "data-cy",
    "data-selenium",
];

pub const INTERACTIVE_ROLES: &[&str] = &["button", "link", "menuitem"];

pub const TEST_HOOKS: &[&str] = &["data-testid", "data-cy", "data-selenium", "data-test-id"];

pub const TEXT_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "span", "div", "label",
];

pub const TEXT_KEYWORDS: &[&str] = &["title", "heading", "text", "content", "label"];

impl Default for ClassifierRules {
    fn default() -> Self {
        Self {
            interactive_tags: INTERACTIVE_TAGS,
            interactive_attributes: INTERACTIVE_ATTRIBUTES,
            interactive_roles: INTERACTIVE_ROLES,
            test_hooks: TEST_HOOKS,
            text_tags: TEXT_TAGS,
            text_keywords: TEXT_KEYWORDS,
            max_text_len: 100,
        }
    }
}

impl ClassifierRules {
    pub fn with_max_text_len(mut self, max_text_len: usize) -> Self {
        self.max_text_len = max_text_len;
        self
    }
}

/// Decides whether raw nodes are interactive or semantically important.
#[derive(Debug, Clone, Default)]
pub struct ElementClassifier {
    rules: ClassifierRules,
}

impl ElementClassifier {
    pub fn new(rules: ClassifierRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ClassifierRules {
        &self.rules
    }

    pub fn is_meaningful(&self, node: &RawNode) -> bool {
        self.is_interactive(node) || self.has_test_hook(node) || self.is_semantic_text(node)
    }

    /// Interactive by tag, by interaction attribute, or by ARIA role.
    pub fn is_interactive(&self, node: &RawNode) -> bool {
        let tag = node.tag_lower();
        if self.rules.interactive_tags.contains(&tag.as_str()) {
            return true;
        }

        if self
            .rules
            .interactive_attributes
            .iter()
            .any(|a| node.has_attr(a))
        {
            return true;
        }

        node.attr("role")
            .map(|r| r.to_lowercase())
            .is_some_and(|r| self.rules.interactive_roles.contains(&r.as_str()))
    }

    pub fn has_test_hook(&self, node: &RawNode) -> bool {
        self.rules.test_hooks.iter().any(|h| node.has_attr(h))
    }

    fn is_semantic_text(&self, node: &RawNode) -> bool {
        let Some(text) = node.trimmed_text() else {
            return false;
        };
        if text.chars().count() >= self.rules.max_text_len {
            return false;
        }

        let tag = node.tag_lower();
        if self.rules.text_tags.contains(&tag.as_str()) {
            return true;
        }

        let ident = format!(
            "{} {}",
            node.attr("class").unwrap_or(""),
            node.attr("id").unwrap_or("")
        )
        .to_lowercase();

        self.rules.text_keywords.iter().any(|k| ident.contains(k))
    }
}

/// Classify with default rules.
pub fn is_meaningful(node: &RawNode) -> bool {
    ElementClassifier::default().is_meaningful(node)
}
