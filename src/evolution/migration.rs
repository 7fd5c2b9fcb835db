use serde::Serialize;

use crate::evolution::compatibility::{BreakingChange, CompatibilityReport};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationNote {
    /// Element id or method name the note is about
    pub subject: String,
    pub message: String,
}

pub fn note_for(change: &BreakingChange) -> MigrationNote {
    match change {
        BreakingChange::ElementRemoved { id, css_selector } => MigrationNote {
            subject: id.clone(),
            message: format!(
                "Element '{}' ({}) was removed; remove or replace code that uses it.",
                id, css_selector
            ),
        },
        BreakingChange::SelectorChanged {
            id,
            attribute,
            old_value,
            new_value,
        } => MigrationNote {
            subject: id.clone(),
            message: format!(
                "Element '{}' {} changed from `{}` to `{}`; update locators that use the old value.",
                id, attribute, old_value, new_value
            ),
        },
        BreakingChange::MethodRemoved { name } => MigrationNote {
            subject: name.clone(),
            message: format!("Method '{}' was removed; migrate its callers.", name),
        },
    }
}

/// One note per breaking change; nothing when no migration is required.
pub fn generate_notes(report: &CompatibilityReport) -> Vec<MigrationNote> {
    if !report.migration_required {
        return Vec::new();
    }
    report.breaking_changes.iter().map(note_for).collect()
}

pub fn render_notes(report: &CompatibilityReport) -> String {
    let notes = generate_notes(report);
    if notes.is_empty() {
        return String::new();
    }

    let mut out = format!(
        "Migration required ({} effort, {} breaking change{}):\n",
        report.estimated_effort,
        notes.len(),
        if notes.len() == 1 { "" } else { "s" }
    );
    for note in notes {
        out.push_str("- ");
        out.push_str(&note.message);
        out.push('\n');
    }
    out
}
