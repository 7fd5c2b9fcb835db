use std::collections::BTreeMap;
use std::time::Duration;

use page_model::browser::wait::Timeouts;
use page_model::screen::screen_model::{Element, PageModel, Position, RawNode};
use serde_json::{Value, json};

/// Budgets small enough that a missed wait fails the test quickly.
pub fn fast_timeouts() -> Timeouts {
    Timeouts {
        navigation: Duration::from_millis(50),
        login_redirect: Duration::from_millis(60),
        element_visibility: Duration::from_millis(20),
        poll_interval: Duration::from_millis(5),
    }
}

pub fn raw(tag: &str) -> RawNode {
    let mut node = RawNode::new(tag);
    node.visible = true;
    node.position = Position {
        x: 0.0,
        y: 0.0,
        width: 100.0,
        height: 20.0,
    };
    node
}

pub fn raw_with(tag: &str, attrs: &[(&str, &str)], text: Option<&str>) -> RawNode {
    let mut node = raw(tag);
    for (name, value) in attrs {
        node.attributes.insert(name.to_string(), value.to_string());
    }
    node.id = node.attributes.get("id").cloned();
    node.class_name = node.attributes.get("class").cloned();
    node.text = text.map(str::to_string);
    node
}

/// Minimal element with a stable id and text; selectors derive from the id.
pub fn element(id: &str, text: &str) -> Element {
    Element {
        id: id.to_string(),
        tag_name: "span".into(),
        attributes: BTreeMap::from([("id".to_string(), id.to_string())]),
        text: Some(text.to_string()),
        children: Vec::new(),
        position: Position::default(),
        is_visible: true,
        is_interactive: false,
        css_selector: format!("#{}", id),
        xpath: format!("//span[@id=\"{}\"]", id),
    }
}

pub fn model(elements: Vec<Element>) -> PageModel {
    PageModel::new("https://example.test/", "Example", elements)
}

/// Node object shaped like the extraction script's output.
pub fn node_json(tag: &str, attrs: Value, text: Option<&str>, visible: bool) -> Value {
    let get = |k: &str| attrs.get(k).cloned().unwrap_or(Value::Null);
    json!({
        "tag": tag,
        "id": get("id"),
        "className": get("class"),
        "text": text,
        "type": get("type"),
        "placeholder": get("placeholder"),
        "name": get("name"),
        "role": get("role"),
        "visible": visible,
        "position": { "x": 0, "y": 0, "width": if visible { 80 } else { 0 }, "height": if visible { 20 } else { 0 } },
        "attributes": attrs,
    })
}
