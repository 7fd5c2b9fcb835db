use serde_json::Value;
use tracing::{debug, info, warn};

use crate::browser::driver::{Driver, Locator};
use crate::browser::wait::is_page_ready;
use crate::error::PageError;
use crate::resolver::resolver::ElementResolver;
use crate::screen::classifier::ElementClassifier;
use crate::screen::identity::IdAllocator;
use crate::screen::screen_model::{Element, PageModel, RawNode};
use crate::screen::selector::synthesize;

/// Walks `document.body` and reports one raw node per element, in document order.
pub const EXTRACT_SCRIPT: &str = r#"
function pathOf(el) {
  var parts = [];
  while (el && el !== document.body) {
    var i = 0, sib = el;
    while ((sib = sib.previousElementSibling)) { if (sib.tagName === el.tagName) i++; }
    parts.unshift(el.tagName.toLowerCase() + ':' + i);
    el = el.parentElement;
  }
  return parts.join('>');
}
var out = [];
var nodes = document.body ? document.body.querySelectorAll('*') : [];
for (var i = 0; i < nodes.length; i++) {
  var el = nodes[i];
  var rect = el.getBoundingClientRect();
  var style = window.getComputedStyle(el);
  var attrs = {};
  for (var j = 0; j < el.attributes.length; j++) {
    attrs[el.attributes[j].name] = el.attributes[j].value;
  }
  var text = (el.innerText || el.textContent || '').trim();
  out.push({
    tag: el.tagName.toLowerCase(),
    id: el.id || null,
    className: el.getAttribute('class'),
    text: text ? text.slice(0, 1000) : null,
    href: el.getAttribute('href'),
    src: el.getAttribute('src'),
    type: el.getAttribute('type'),
    value: (typeof el.value === 'string' && el.value) ? el.value : el.getAttribute('value'),
    placeholder: el.getAttribute('placeholder'),
    title: el.getAttribute('title'),
    alt: el.getAttribute('alt'),
    name: el.getAttribute('name'),
    role: el.getAttribute('role'),
    ariaLabel: el.getAttribute('aria-label'),
    path: pathOf(el),
    visible: rect.width * rect.height > 0 && style.display !== 'none' && style.visibility !== 'hidden',
    position: { x: rect.x, y: rect.y, width: rect.width, height: rect.height },
    attributes: attrs
  });
}
return out;
"#;

/// Attributes copied from dedicated raw fields onto the element's map.
const CAPTURED_FIELDS: [&str; 11] = [
    "id", "class", "href", "src", "type", "value", "placeholder", "title", "alt", "name", "role",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanOptions {
    /// Drop meaningful nodes that are not rendered
    pub visible_only: bool,
    /// Re-locate every synthesized CSS selector after the scan
    pub validate_selectors: bool,
}

/// A scan plus the selectors that failed validation (empty unless requested).
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub model: PageModel,
    pub stale_selectors: Vec<String>,
}

/// Captures a `PageModel` from the page the driver is on.
#[derive(Debug, Clone, Default)]
pub struct PageScanner {
    classifier: ElementClassifier,
    resolver: ElementResolver,
    options: ScanOptions,
}

impl PageScanner {
    pub fn new(classifier: ElementClassifier, options: ScanOptions) -> Self {
        Self {
            classifier,
            resolver: ElementResolver::default(),
            options,
        }
    }

    pub fn scan<D: Driver + ?Sized>(&self, driver: &mut D) -> Result<PageModel, PageError> {
        Ok(self.scan_with_report(driver)?.model)
    }

    pub fn scan_with_report<D: Driver + ?Sized>(&self, driver: &mut D) -> Result<ScanOutcome, PageError> {
        let ready = is_page_ready(driver)
            .map_err(|e| PageError::scan_failure_from("could not read document state", e))?;
        if !ready {
            return Err(PageError::scan_failure("page not in a stable state (readyState != complete)"));
        }

        let url = driver
            .current_url()
            .map_err(|e| PageError::scan_failure_from("could not read current url", e))?;
        let title = driver
            .title()
            .map_err(|e| PageError::scan_failure_from("could not read page title", e))?;

        let raw = driver
            .evaluate(EXTRACT_SCRIPT, &[])
            .map_err(|e| PageError::scan_failure_from("extraction script failed", e))?;
        let nodes = parse_nodes(raw)?;
        debug!("extracted {} raw nodes from {}", nodes.len(), url);

        let elements = self.build_elements(&nodes);
        info!("scanned {}: {} of {} nodes kept", url, elements.len(), nodes.len());

        let stale_selectors = if self.options.validate_selectors {
            self.validate(driver, &elements)
        } else {
            Vec::new()
        };

        Ok(ScanOutcome {
            model: PageModel::new(&url, &title, elements),
            stale_selectors,
        })
    }

    /// Classify, identify and synthesize selectors for raw nodes.
    pub fn build_elements(&self, nodes: &[RawNode]) -> Vec<Element> {
        let mut ids = IdAllocator::new();

        nodes
            .iter()
            .filter(|n| self.classifier.is_meaningful(n))
            .filter(|n| n.visible || !self.options.visible_only)
            .map(|n| {
                let selectors = synthesize(n);
                Element {
                    id: ids.allocate(n),
                    tag_name: n.tag_lower(),
                    attributes: captured_attributes(n),
                    text: n.trimmed_text().map(str::to_string),
                    children: Vec::new(),
                    position: n.position,
                    is_visible: n.visible,
                    is_interactive: self.classifier.is_interactive(n),
                    css_selector: selectors.css_selector,
                    xpath: selectors.xpath,
                }
            })
            .collect()
    }

    fn validate<D: Driver + ?Sized>(&self, driver: &mut D, elements: &[Element]) -> Vec<String> {
        elements
            .iter()
            .filter(|e| !self.resolver.probe(driver, &[Locator::css(e.css_selector.as_str())]))
            .map(|e| {
                warn!("selector for {} no longer matches: {}", e.id, e.css_selector);
                e.css_selector.clone()
            })
            .collect()
    }
}

fn parse_nodes(raw: Value) -> Result<Vec<RawNode>, PageError> {
    if !raw.is_array() {
        return Err(PageError::scan_failure(format!(
            "extraction returned {} instead of an array",
            kind_of(&raw)
        )));
    }
    serde_json::from_value(raw)
        .map_err(|e| PageError::scan_failure(format!("malformed node data: {}", e)))
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn captured_attributes(node: &RawNode) -> std::collections::BTreeMap<String, String> {
    let mut attrs = node.attributes.clone();
    for name in CAPTURED_FIELDS {
        if let Some(value) = node.attr(name) {
            attrs.insert(name.to_string(), value.to_string());
        }
    }
    attrs
}
