use page_model::{
    ScanSettings,
    error::PageError,
    evolution::diff::diff,
    scan_page,
    screen::{
        classifier::ElementClassifier,
        identity::{IdAllocator, base_identity, structural_fingerprint},
        scanner::{PageScanner, ScanOptions},
        screen_model::{PageModel, RawNode},
    },
};
use serde_json::{Value, json};

use crate::common::{
    fake_driver::{FakeDriver, FakeNode},
    fixtures::{fast_timeouts, node_json, raw_with},
};

mod common;

fn login_page_nodes() -> Value {
    json!([
        node_json("section", json!({ "class": "wrapper" }), Some("Welcome Sign in"), true),
        node_json("h1", json!({}), Some("Welcome"), true),
        node_json("input", json!({ "id": "email", "type": "email" }), None, true),
        node_json("input", json!({ "name": "password", "type": "password" }), None, true),
        node_json("button", json!({ "class": "cta primary", "type": "submit" }), Some("Sign in"), true),
        node_json("img", json!({ "src": "/logo.png" }), None, true),
    ])
}

fn driver_with(nodes: Value) -> FakeDriver {
    let mut driver = FakeDriver::new(vec![]);
    driver.url = "https://example.test/login".into();
    driver.title = "Sign in".into();
    driver.scan_result = nodes;
    driver
}

// =========================================================================
// Scanning
// =========================================================================

#[test]
fn scan_keeps_meaningful_elements_in_document_order() {
    let mut driver = driver_with(login_page_nodes());

    let model = PageScanner::default().scan(&mut driver).unwrap();

    let tags: Vec<&str> = model.elements.iter().map(|e| e.tag_name.as_str()).collect();
    assert_eq!(tags, vec!["h1", "input", "input", "button"], "section wrapper and img are dropped");
    assert_eq!(model.url, "https://example.test/login");
    assert_eq!(model.title, "Sign in");
}

#[test]
fn scan_assigns_stable_ids_and_selectors() {
    let mut driver = driver_with(login_page_nodes());

    let model = PageScanner::default().scan(&mut driver).unwrap();

    let email = model.element("email").expect("id attribute becomes the stable id");
    assert_eq!(email.css_selector, "#email");
    assert!(email.is_interactive);

    let password = model.element("input-password").expect("name yields tag-name id");
    assert_eq!(password.css_selector, "input[type=\"password\"]");
    assert_eq!(password.attr("name"), Some("password"));

    let button = &model.elements[3];
    assert_eq!(button.css_selector, "button.cta.primary[type=\"submit\"]");
    assert_eq!(button.xpath, "//button[contains(@class,\"cta\")][@type=\"submit\"]");
    assert_eq!(button.text.as_deref(), Some("Sign in"));

    let heading = &model.elements[0];
    assert!(!heading.is_interactive);
    assert!(heading.id.starts_with("h1-"), "fingerprint id: {}", heading.id);
}

#[test]
fn every_element_has_both_locators() {
    let mut driver = driver_with(login_page_nodes());

    let model = PageScanner::default().scan(&mut driver).unwrap();

    for el in &model.elements {
        assert!(!el.css_selector.is_empty(), "{} has no css selector", el.id);
        assert!(!el.xpath.is_empty(), "{} has no xpath", el.id);
    }
}

#[test]
fn rescanning_the_same_page_yields_the_same_ids() {
    let mut driver = driver_with(login_page_nodes());
    let scanner = PageScanner::default();

    let first = scanner.scan(&mut driver).unwrap();
    let second = scanner.scan(&mut driver).unwrap();

    let ids = |m: &PageModel| {
        m.elements.iter().map(|e| e.id.clone()).collect::<Vec<_>>()
    };
    assert_eq!(ids(&first), ids(&second));
}

#[test]
fn hidden_elements_are_kept_unless_visible_only() {
    let nodes = json!([
        node_json("button", json!({ "id": "shown" }), Some("Go"), true),
        node_json("button", json!({ "id": "hidden" }), Some("Later"), false),
    ]);

    let mut driver = driver_with(nodes.clone());
    let all = PageScanner::default().scan(&mut driver).unwrap();
    assert_eq!(all.elements.len(), 2);
    assert!(!all.element("hidden").unwrap().is_visible);

    let mut driver = driver_with(nodes);
    let options = ScanOptions {
        visible_only: true,
        ..Default::default()
    };
    let visible = PageScanner::new(ElementClassifier::default(), options)
        .scan(&mut driver)
        .unwrap();
    assert_eq!(visible.elements.len(), 1);
    assert_eq!(visible.elements[0].id, "shown");
}

#[test]
fn empty_page_scans_to_empty_model() {
    let mut driver = driver_with(json!([]));

    let model = PageScanner::default().scan(&mut driver).unwrap();

    assert!(model.elements.is_empty());
}

// =========================================================================
// Failures
// =========================================================================

#[test]
fn page_still_loading_is_a_scan_failure() {
    let mut driver = driver_with(login_page_nodes());
    driver.loading = true;

    let err = PageScanner::default().scan(&mut driver).unwrap_err();

    assert!(matches!(err, PageError::ScanFailure { .. }), "got {:?}", err);
    assert!(
        driver.calls_starting_with("evaluate extract").is_empty(),
        "extraction must not run on an unstable page"
    );
}

#[test]
fn script_error_is_a_scan_failure_with_source() {
    let mut driver = driver_with(login_page_nodes());
    driver.script_error = Some("ReferenceError: document is not defined".into());

    let err = PageScanner::default().scan(&mut driver).unwrap_err();

    match err {
        PageError::ScanFailure { source, .. } => {
            assert!(source.is_some(), "driver error must be kept as the source");
        }
        other => panic!("expected ScanFailure, got {:?}", other),
    }
}

#[test]
fn non_array_result_is_a_scan_failure() {
    let mut driver = driver_with(json!({ "nodes": [] }));

    let err = PageScanner::default().scan(&mut driver).unwrap_err();

    assert!(err.to_string().contains("instead of an array"), "got: {}", err);
}

#[test]
fn malformed_nodes_are_a_scan_failure() {
    let mut driver = driver_with(json!([{ "tag": 42 }]));

    let err = PageScanner::default().scan(&mut driver).unwrap_err();

    assert!(matches!(err, PageError::ScanFailure { .. }));
}

// =========================================================================
// Selector validation and navigation
// =========================================================================

#[test]
fn validation_reports_selectors_that_no_longer_match() {
    let nodes = json!([
        node_json("button", json!({ "id": "present" }), Some("Go"), true),
        node_json("button", json!({ "id": "gone" }), Some("Old"), true),
    ]);
    let mut driver = driver_with(nodes);
    driver.nodes = vec![FakeNode::new("button").attr("id", "present")];

    let options = ScanOptions {
        validate_selectors: true,
        ..Default::default()
    };
    let outcome = PageScanner::new(ElementClassifier::default(), options)
        .scan_with_report(&mut driver)
        .unwrap();

    assert_eq!(outcome.stale_selectors, vec!["#gone".to_string()]);
    assert_eq!(outcome.model.elements.len(), 2, "stale elements stay in the model");
}

#[test]
fn scan_page_navigates_before_scanning() {
    let mut driver = driver_with(login_page_nodes());
    let settings = ScanSettings {
        timeouts: fast_timeouts(),
        ..Default::default()
    };

    let outcome = scan_page(&mut driver, "https://example.test/other", &settings).unwrap();

    assert_eq!(driver.calls[0], "navigate https://example.test/other");
    assert_eq!(outcome.model.url, "https://example.test/other");
}

#[test]
fn navigation_that_never_settles_times_out() {
    let mut driver = driver_with(login_page_nodes());
    driver.loading = true;
    let settings = ScanSettings {
        timeouts: fast_timeouts(),
        ..Default::default()
    };

    let err = scan_page(&mut driver, "https://example.test/slow", &settings).unwrap_err();

    assert!(matches!(err, PageError::NavigationTimeout { .. }), "got {:?}", err);
}

#[test]
fn model_json_uses_camel_case_and_omits_empty_children() {
    let mut driver = driver_with(login_page_nodes());
    let model = PageScanner::default().scan(&mut driver).unwrap();

    let json = serde_json::to_value(&model).unwrap();
    let first = &json["elements"][0];

    assert!(first.get("tagName").is_some());
    assert!(first.get("cssSelector").is_some());
    assert!(first.get("isInteractive").is_some());
    assert!(first.get("children").is_none(), "empty children must be skipped");
    assert!(json.get("timestamp").is_some());
}

// =========================================================================
// Stable identity
// =========================================================================

#[test]
fn naming_attributes_are_trusted_in_order() {
    let both = raw_with("button", &[("id", "main"), ("data-testid", "cta")], None);
    let hook = raw_with("button", &[("data-testid", "cta"), ("data-cy", "other")], None);
    let cy = raw_with("button", &[("data-cy", "other")], None);

    assert_eq!(base_identity(&both), "main");
    assert_eq!(base_identity(&hook), "cta");
    assert_eq!(base_identity(&cy), "other");
}

fn at_path(mut node: RawNode, path: &str) -> RawNode {
    node.path = Some(path.to_string());
    node
}

#[test]
fn fingerprint_ignores_text_and_tracked_attributes() {
    let a = at_path(raw_with("p", &[("title", "Old")], Some("Hello")), "div:0>p:0");
    let b = at_path(raw_with("p", &[("title", "New")], Some("Goodbye")), "div:0>p:0");

    assert_eq!(structural_fingerprint(&a), structural_fingerprint(&b));
    assert_eq!(base_identity(&a).len(), "p-".len() + 12);
}

#[test]
fn fingerprint_distinguishes_position() {
    let a = at_path(raw_with("p", &[], Some("Hello")), "div:0>p:0");
    let b = at_path(raw_with("p", &[], Some("Hello")), "div:0>p:1");

    assert_ne!(base_identity(&a), base_identity(&b));
}

#[test]
fn placeholder_edit_is_a_modification_not_a_replacement() {
    let input = |placeholder: &str| {
        at_path(
            raw_with("input", &[("type", "text"), ("placeholder", placeholder)], None),
            "form:0>input:0",
        )
    };
    let scanner = PageScanner::default();
    let before = PageModel::new("https://example.test/", "Example", scanner.build_elements(&[input("Email")]));
    let after = PageModel::new("https://example.test/", "Example", scanner.build_elements(&[input("E-mail")]));

    let d = diff(&before, &after);

    assert_eq!(before.elements[0].id, after.elements[0].id, "id must survive a placeholder edit");
    assert!(d.added.is_empty() && d.removed.is_empty(), "got {}", d.summary());
    assert_eq!(d.modified.len(), 1);
    let fields: Vec<&str> = d.modified[0].changes.iter().map(|c| c.attribute.as_str()).collect();
    assert!(fields.contains(&"placeholder"), "changes: {:?}", fields);
}

#[test]
fn repeated_ids_get_numbered_suffixes() {
    let node = raw_with("li", &[("data-testid", "row")], None);
    let mut ids = IdAllocator::new();

    assert_eq!(ids.allocate(&node), "row");
    assert_eq!(ids.allocate(&node), "row-2");
    assert_eq!(ids.allocate(&node), "row-3");
}

#[test]
fn suffixed_id_never_collides_with_a_real_one() {
    let real = raw_with("li", &[("id", "row-2")], None);
    let dup = raw_with("li", &[("id", "row")], None);
    let mut ids = IdAllocator::new();

    let issued = vec![ids.allocate(&real), ids.allocate(&dup), ids.allocate(&dup)];

    assert_eq!(issued, vec!["row-2", "row", "row-3"]);
}
