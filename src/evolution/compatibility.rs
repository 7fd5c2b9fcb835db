use std::collections::HashSet;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::evolution::diff::ModelDiff;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    Medium,
    High,
}

impl Effort {
    /// 0 breaking changes is low, 1 to 3 medium, more is high.
    pub fn from_breaking_count(count: usize) -> Self {
        match count {
            0 => Effort::Low,
            1..=3 => Effort::Medium,
            _ => Effort::High,
        }
    }
}

impl fmt::Display for Effort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Effort::Low => "low",
            Effort::Medium => "medium",
            Effort::High => "high",
        };
        f.write_str(s)
    }
}

/// One change that breaks consumers of the previous model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakingChange {
    ElementRemoved {
        id: String,
        css_selector: String,
    },
    SelectorChanged {
        id: String,
        attribute: String,
        old_value: String,
        new_value: String,
    },
    MethodRemoved {
        name: String,
    },
}

impl fmt::Display for BreakingChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakingChange::ElementRemoved { id, .. } => write!(f, "element {} removed", id),
            BreakingChange::SelectorChanged {
                id,
                attribute,
                old_value,
                new_value,
            } => write!(
                f,
                "element {} {} changed: {} -> {}",
                id, attribute, old_value, new_value
            ),
            BreakingChange::MethodRemoved { name } => write!(f, "method {} removed", name),
        }
    }
}

impl Serialize for BreakingChange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityReport {
    pub backward_compatible: bool,
    pub forward_compatible: bool,
    pub breaking_changes: Vec<BreakingChange>,
    pub migration_required: bool,
    pub estimated_effort: Effort,
}

impl CompatibilityReport {
    pub fn breaking_messages(&self) -> Vec<String> {
        self.breaking_changes.iter().map(ToString::to_string).collect()
    }
}

/// Breaking changes in the order: removed elements, selector changes, removed methods.
pub fn breaking_changes(
    diff: &ModelDiff,
    old_methods: &[String],
    new_methods: &[String],
) -> Vec<BreakingChange> {
    let mut out = Vec::new();

    for el in &diff.removed {
        out.push(BreakingChange::ElementRemoved {
            id: el.id.clone(),
            css_selector: el.css_selector.clone(),
        });
    }

    for m in &diff.modified {
        for change in m.changes.iter().filter(|c| c.is_locator()) {
            out.push(BreakingChange::SelectorChanged {
                id: m.element.id.clone(),
                attribute: change.attribute.clone(),
                old_value: change.old_value.clone().unwrap_or_default(),
                new_value: change.new_value.clone().unwrap_or_default(),
            });
        }
    }

    let kept: HashSet<&str> = new_methods.iter().map(String::as_str).collect();
    let mut reported: HashSet<&str> = HashSet::new();
    for name in old_methods {
        if !kept.contains(name.as_str()) && reported.insert(name.as_str()) {
            out.push(BreakingChange::MethodRemoved { name: name.clone() });
        }
    }

    out
}

/// Classify a diff plus the generated method names on both sides.
pub fn analyze(diff: &ModelDiff, old_methods: &[String], new_methods: &[String]) -> CompatibilityReport {
    let breaking = breaking_changes(diff, old_methods, new_methods);

    let previous: HashSet<&str> = old_methods.iter().map(String::as_str).collect();
    let selectors_stable = !diff
        .modified
        .iter()
        .any(|m| m.changes.iter().any(|c| c.is_locator()));
    let forward_compatible = diff.added.is_empty()
        && selectors_stable
        && new_methods.iter().all(|m| previous.contains(m.as_str()));

    CompatibilityReport {
        backward_compatible: breaking.is_empty(),
        forward_compatible,
        migration_required: !breaking.is_empty(),
        estimated_effort: Effort::from_breaking_count(breaking.len()),
        breaking_changes: breaking,
    }
}
