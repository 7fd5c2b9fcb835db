use std::collections::{HashMap, HashSet};

use sha1::{Digest, Sha1};

use crate::screen::screen_model::RawNode;

/// Attributes that already name an element, in order of trust.
const NAMING_ATTRIBUTES: [&str; 5] = ["id", "data-testid", "data-test-id", "data-cy", "data-selenium"];

/// Stable key for a node: the first naming attribute, then `{tag}-{name}`,
/// then a structural fingerprint.
pub fn base_identity(node: &RawNode) -> String {
    for attr in NAMING_ATTRIBUTES {
        if let Some(value) = node.attr(attr) {
            return value.to_string();
        }
    }

    let tag = node.tag_lower();
    if let Some(name) = node.attr("name") {
        return format!("{}-{}", tag, name);
    }

    format!("{}-{}", tag, &structural_fingerprint(node)[..12])
}

/// SHA-1 over where the element sits and what role it plays.
///
/// Text and the attributes the model differ tracks (or that feed the
/// synthesized selectors) stay out, so editing them reports a modification
/// instead of a removal plus an addition.
pub fn structural_fingerprint(node: &RawNode) -> String {
    let parts = [
        node.tag_lower(),
        node.attr("role").unwrap_or("").to_lowercase(),
        node.attr("aria-label").unwrap_or("").to_string(),
        node.path.as_deref().unwrap_or("").to_string(),
    ];

    let mut hasher = Sha1::new();
    hasher.update(parts.join("\u{1f}").as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Hands out ids that are unique within one scan.
///
/// Repeats of a base id get `-2`, `-3`, ... in traversal order, so the same
/// page scanned twice yields the same ids.
#[derive(Debug, Default)]
pub struct IdAllocator {
    seen: HashMap<String, usize>,
    issued: HashSet<String>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, node: &RawNode) -> String {
        let base = base_identity(node);
        let count = self.seen.entry(base.clone()).or_insert(0);
        let mut id = base.clone();
        loop {
            *count += 1;
            if *count > 1 {
                id = format!("{}-{}", base, count);
            }
            if self.issued.insert(id.clone()) {
                return id;
            }
        }
    }
}
