use serde::Serialize;

use crate::ScanSettings;
use crate::error::PageError;
use crate::evolution::compatibility::{CompatibilityReport, analyze};
use crate::evolution::diff::{ModelDiff, diff};
use crate::evolution::migration::{MigrationNote, generate_notes, render_notes};
use crate::screen::screen_model::PageModel;

// ============================================================================
// scan subcommand
// ============================================================================

/// Scan every URL and print the models. Returns whether every scan succeeded.
pub fn cmd_scan(
    urls: &[String],
    settings: &ScanSettings,
    format: &str,
) -> Result<bool, Box<dyn std::error::Error>> {
    let results = if urls.len() == 1 {
        vec![crate::scan_url(&urls[0], settings)]
    } else {
        crate::scan_many(urls, settings)
    };

    let mut all_ok = true;
    for (url, result) in urls.iter().zip(results) {
        match result {
            Ok(outcome) => {
                match format {
                    "summary" => println!("{}", format_scan_summary(&outcome.model)),
                    _ => println!("{}", serde_json::to_string_pretty(&outcome.model)?),
                }
                for stale in &outcome.stale_selectors {
                    eprintln!("stale selector on {}: {}", url, stale);
                }
            }
            Err(e) => {
                all_ok = false;
                eprintln!("scan of {} failed: {}", url, e);
            }
        }
    }
    Ok(all_ok)
}

pub fn format_scan_summary(model: &PageModel) -> String {
    let interactive = model.interactive().count();
    let mut out = format!(
        "{} | {} ({} elements, {} interactive)\n",
        model.url,
        model.title,
        model.elements.len(),
        interactive
    );
    for el in &model.elements {
        out.push_str(&format!(
            "  [{}] {} {}\n",
            if el.is_interactive { "i" } else { " " },
            el.id,
            el.css_selector
        ));
    }
    out
}

// ============================================================================
// diff subcommand
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffOutput {
    pub diff: ModelDiff,
    pub compatibility: CompatibilityReport,
    pub migration_notes: Vec<MigrationNote>,
}

pub fn load_model(path: &str) -> Result<PageModel, PageError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| PageError::Config(format!("cannot read {}: {}", path, e)))?;
    serde_json::from_str(&content)
        .map_err(|e| PageError::Config(format!("{} is not a page model: {}", path, e)))
}

pub fn compare_models(
    previous: &PageModel,
    current: &PageModel,
    old_methods: &[String],
    new_methods: &[String],
) -> DiffOutput {
    let model_diff = diff(previous, current);
    let compatibility = analyze(&model_diff, old_methods, new_methods);
    let migration_notes = generate_notes(&compatibility);
    DiffOutput {
        diff: model_diff,
        compatibility,
        migration_notes,
    }
}

/// Print diff, compatibility report and notes. Returns whether the change is backward compatible.
pub fn cmd_diff(
    previous_path: &str,
    current_path: &str,
    old_methods: &[String],
    new_methods: &[String],
) -> Result<bool, Box<dyn std::error::Error>> {
    let previous = load_model(previous_path)?;
    let current = load_model(current_path)?;

    let output = compare_models(&previous, &current, old_methods, new_methods);
    println!("{}", serde_json::to_string_pretty(&output)?);

    let notes = render_notes(&output.compatibility);
    if !notes.is_empty() {
        eprint!("{}", notes);
    }
    Ok(output.compatibility.backward_compatible)
}
