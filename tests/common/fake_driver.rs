use std::collections::{BTreeMap, HashMap};

use page_model::browser::driver::{Driver, ElementRef, Locator};
use page_model::browser::error::DriverError;
use serde_json::Value;

/// One element of the fake DOM.
#[derive(Debug, Clone, Default)]
pub struct FakeNode {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub text: String,
    pub displayed: bool,
    /// Index of the iframe this node lives in; `None` is the top-level document
    pub frame: Option<usize>,
}

impl FakeNode {
    pub fn new(tag: &str) -> Self {
        FakeNode {
            tag: tag.to_string(),
            displayed: true,
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn in_frame(mut self, frame: usize) -> Self {
        self.frame = Some(frame);
        self
    }
}

/// In-memory `Driver` with a call log, for tests that must not need a browser.
#[derive(Debug, Default)]
pub struct FakeDriver {
    pub nodes: Vec<FakeNode>,
    pub current_frame: Option<usize>,
    pub calls: Vec<String>,
    pub url: String,
    pub title: String,
    pub loading: bool,
    pub scan_result: Value,
    pub script_error: Option<String>,
    pub xpath_results: HashMap<String, Vec<usize>>,
    /// Error every XPath query answers with
    pub xpath_error: Option<String>,
    pub form_submit_result: Value,
    pub fail_send_keys_with: Option<String>,
    /// URL the page moves to after any click, Enter press or form submit
    pub url_after_submit: Option<String>,
    pub typed: Vec<(usize, String)>,
    pub clicked: Vec<usize>,
    pub closed: bool,
}

impl FakeDriver {
    pub fn new(nodes: Vec<FakeNode>) -> Self {
        FakeDriver {
            nodes,
            url: "https://example.test/login".into(),
            title: "Example".into(),
            scan_result: Value::Array(vec![]),
            form_submit_result: Value::Bool(false),
            ..Default::default()
        }
    }

    pub fn el(index: usize) -> ElementRef {
        ElementRef::new(format!("n{}", index))
    }

    /// Resolve a reference; like a real session, only elements of the
    /// current frame are reachable.
    fn index_of(&self, el: &ElementRef) -> Result<usize, DriverError> {
        let index = el
            .id()
            .strip_prefix('n')
            .and_then(|n| n.parse::<usize>().ok())
            .filter(|i| *i < self.nodes.len());
        match index {
            Some(i) if self.nodes[i].frame == self.current_frame => Ok(i),
            _ => Err(DriverError::Protocol {
                command: "element".into(),
                message: format!("stale element reference {}", el.id()),
            }),
        }
    }

    fn top_level_frames(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.frame.is_none() && n.tag == "iframe")
            .map(|(i, _)| i)
            .collect()
    }

    fn matching(&self, locator: &Locator) -> Vec<usize> {
        match locator {
            Locator::Css(selector) => self
                .nodes
                .iter()
                .enumerate()
                .filter(|(_, n)| n.frame == self.current_frame && css_matches(selector, n))
                .map(|(i, _)| i)
                .collect(),
            Locator::XPath(expr) => self
                .xpath_results
                .get(expr)
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .filter(|i| self.nodes[*i].frame == self.current_frame)
                .collect(),
        }
    }

    fn submitted(&mut self) {
        if let Some(url) = self.url_after_submit.clone() {
            self.url = url;
        }
    }

    /// Calls whose log line starts with `prefix`, in order.
    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn position_of(&self, call: &str) -> Option<usize> {
        self.calls.iter().position(|c| c == call)
    }
}

impl Driver for FakeDriver {
    fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.calls.push(format!("navigate {}", url));
        self.url = url.to_string();
        Ok(())
    }

    fn evaluate(&mut self, script: &str, _args: &[Value]) -> Result<Value, DriverError> {
        if script.contains("document.readyState") {
            self.calls.push("evaluate readyState".into());
            let state = if self.loading { "loading" } else { "complete" };
            return Ok(Value::String(state.into()));
        }
        if script.contains("closest('form')") {
            self.calls.push("evaluate form-submit".into());
            if self.form_submit_result == Value::Bool(true) {
                self.submitted();
            }
            return Ok(self.form_submit_result.clone());
        }
        self.calls.push("evaluate extract".into());
        match &self.script_error {
            Some(msg) => Err(DriverError::Script(msg.clone())),
            None => Ok(self.scan_result.clone()),
        }
    }

    fn current_url(&mut self) -> Result<String, DriverError> {
        Ok(self.url.clone())
    }

    fn title(&mut self) -> Result<String, DriverError> {
        Ok(self.title.clone())
    }

    fn find_element(&mut self, locator: &Locator) -> Result<ElementRef, DriverError> {
        self.calls.push(format!("find_element {}", locator));
        self.matching(locator)
            .first()
            .map(|i| Self::el(*i))
            .ok_or_else(|| DriverError::NoSuchElement(locator.to_string()))
    }

    fn find_elements(&mut self, locator: &Locator) -> Result<Vec<ElementRef>, DriverError> {
        self.calls.push(format!("find_elements {}", locator));
        if let (Locator::XPath(_), Some(msg)) = (locator, &self.xpath_error) {
            return Err(DriverError::Protocol {
                command: "find elements".into(),
                message: msg.clone(),
            });
        }
        Ok(self.matching(locator).into_iter().map(Self::el).collect())
    }

    fn switch_to_frame(&mut self, frame: &ElementRef) -> Result<(), DriverError> {
        let index = self.index_of(frame)?;
        let position = self
            .top_level_frames()
            .iter()
            .position(|i| *i == index)
            .ok_or_else(|| DriverError::NoSuchFrame(frame.id().to_string()))?;
        self.calls.push(format!("switch_to_frame {}", position));
        self.current_frame = Some(position);
        Ok(())
    }

    fn switch_to_default(&mut self) -> Result<(), DriverError> {
        self.calls.push("switch_to_default".into());
        self.current_frame = None;
        Ok(())
    }

    fn click(&mut self, element: &ElementRef) -> Result<(), DriverError> {
        let index = self.index_of(element)?;
        self.calls.push(format!("click n{}", index));
        self.clicked.push(index);
        self.submitted();
        Ok(())
    }

    fn send_keys(&mut self, element: &ElementRef, keys: &str) -> Result<(), DriverError> {
        let index = self.index_of(element)?;
        self.calls.push(format!("send_keys n{}", index));
        if let Some(msg) = &self.fail_send_keys_with {
            if keys == "\u{E007}" {
                return Err(DriverError::Protocol {
                    command: "send keys".into(),
                    message: msg.clone(),
                });
            }
        }
        if keys == "\u{E007}" {
            self.submitted();
        }
        self.typed.push((index, keys.to_string()));
        Ok(())
    }

    fn attribute(&mut self, element: &ElementRef, name: &str) -> Result<Option<String>, DriverError> {
        let index = self.index_of(element)?;
        Ok(self.nodes[index].attrs.get(name).cloned())
    }

    fn text(&mut self, element: &ElementRef) -> Result<String, DriverError> {
        let index = self.index_of(element)?;
        Ok(self.nodes[index].text.clone())
    }

    fn is_displayed(&mut self, element: &ElementRef) -> Result<bool, DriverError> {
        let index = self.index_of(element)?;
        Ok(self.nodes[index].displayed)
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.calls.push("close".into());
        self.closed = true;
        Ok(())
    }
}

// ============================================================================
// Minimal CSS matching: selector lists of compound selectors
// (tag, #id, .class, [attr], [attr=v], [attr*=v]); no combinators.
// ============================================================================

pub fn css_matches(selector: &str, node: &FakeNode) -> bool {
    selector
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .any(|compound| compound_matches(compound, node))
}

fn compound_matches(compound: &str, node: &FakeNode) -> bool {
    let chars: Vec<char> = compound.chars().collect();
    let mut i = 0;

    let mut tag = String::new();
    while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '*' || chars[i] == '-') {
        tag.push(chars[i]);
        i += 1;
    }
    if !tag.is_empty() && tag != "*" && !tag.eq_ignore_ascii_case(&node.tag) {
        return false;
    }

    while i < chars.len() {
        match chars[i] {
            '#' | '.' => {
                let kind = chars[i];
                i += 1;
                let mut ident = String::new();
                while i < chars.len() && !matches!(chars[i], '#' | '.' | '[') {
                    ident.push(chars[i]);
                    i += 1;
                }
                let ok = if kind == '#' {
                    node.attrs.get("id").map(String::as_str) == Some(ident.as_str())
                } else {
                    node.attrs
                        .get("class")
                        .is_some_and(|c| c.split_whitespace().any(|x| x == ident))
                };
                if !ok {
                    return false;
                }
            }
            '[' => {
                let end = match chars[i..].iter().position(|c| *c == ']') {
                    Some(p) => i + p,
                    None => return false,
                };
                let body: String = chars[i + 1..end].iter().collect();
                if !attr_matches(&body, node) {
                    return false;
                }
                i = end + 1;
            }
            _ => return false,
        }
    }
    true
}

fn attr_matches(body: &str, node: &FakeNode) -> bool {
    let unquote = |v: &str| v.trim().trim_matches('"').trim_matches('\'').to_string();

    if let Some((name, value)) = body.split_once("*=") {
        let value = unquote(value);
        return node.attrs.get(name.trim()).is_some_and(|v| v.contains(&value));
    }
    if let Some((name, value)) = body.split_once('=') {
        let value = unquote(value);
        return node.attrs.get(name.trim()).is_some_and(|v| *v == value);
    }
    node.attrs.contains_key(body.trim())
}
