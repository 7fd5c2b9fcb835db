use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::screen::screen_model::{Element, PageModel, TrackedField};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeChange {
    pub attribute: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl AttributeChange {
    pub fn is_locator(&self) -> bool {
        TrackedField::ALL
            .iter()
            .any(|f| f.is_locator() && f.name() == self.attribute)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifiedElement {
    /// The element as it appears in the newer model
    pub element: Element,
    pub changes: Vec<AttributeChange>,
}

/// Element-level difference between two scans of the same page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDiff {
    pub added: Vec<Element>,
    pub removed: Vec<Element>,
    pub modified: Vec<ModifiedElement>,
}

impl ModelDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} added, {} removed, {} modified",
            self.added.len(),
            self.removed.len(),
            self.modified.len()
        )
    }
}

/// Tracked fields that differ between two versions of one element.
pub fn element_changes(before: &Element, after: &Element) -> Vec<AttributeChange> {
    TrackedField::ALL
        .iter()
        .filter_map(|field| {
            let old = before.tracked_value(*field);
            let new = after.tracked_value(*field);
            (old != new).then(|| AttributeChange {
                attribute: field.name().to_string(),
                old_value: old.map(str::to_string),
                new_value: new.map(str::to_string),
            })
        })
        .collect()
}

/// Compare two models keyed by stable element id.
///
/// `added` and `modified` follow `current`'s order, `removed` follows `previous`'s.
/// If an id repeats within one model, its first occurrence is the one compared.
pub fn diff(previous: &PageModel, current: &PageModel) -> ModelDiff {
    let mut before: HashMap<&str, &Element> = HashMap::new();
    for el in &previous.elements {
        before.entry(el.id.as_str()).or_insert(el);
    }
    let after_ids: HashSet<&str> = current.elements.iter().map(|e| e.id.as_str()).collect();

    let mut added = vec![];
    let mut modified = vec![];
    let mut visited: HashSet<&str> = HashSet::new();

    for el in &current.elements {
        if !visited.insert(el.id.as_str()) {
            continue;
        }
        match before.get(el.id.as_str()) {
            None => added.push(el.clone()),
            Some(old) => {
                let changes = element_changes(old, el);
                if !changes.is_empty() {
                    modified.push(ModifiedElement {
                        element: el.clone(),
                        changes,
                    });
                }
            }
        }
    }

    let mut seen_removed: HashSet<&str> = HashSet::new();
    let removed = previous
        .elements
        .iter()
        .filter(|e| !after_ids.contains(e.id.as_str()))
        .filter(|e| seen_removed.insert(e.id.as_str()))
        .cloned()
        .collect();

    ModelDiff {
        added,
        removed,
        modified,
    }
}
