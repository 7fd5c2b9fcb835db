use crate::browser::driver::Locator;

/// Generic username/email field selectors, most specific first.
pub const USERNAME_FALLBACKS: &[&str] = &[
    "input[type=\"email\"]",
    "input[name=\"email\"]",
    "input[name=\"username\"]",
    "input[autocomplete=\"username\"]",
    "input[type=\"text\"]",
    "[id*=\"email\"]",
    "[id*=\"user\"]",
    "[name*=\"user\"]",
    "[name*=\"login\"]",
];

pub const PASSWORD_FALLBACKS: &[&str] = &[
    "input[type=\"password\"]",
    "input[name=\"password\"]",
    "[id*=\"password\"]",
    "[name*=\"pass\"]",
];

pub const SUBMIT_FALLBACKS: &[&str] = &[
    "button[type=\"submit\"]",
    "input[type=\"submit\"]",
    "[id*=\"login\"]",
    "[id*=\"signin\"]",
    "[id*=\"submit\"]",
    "[name*=\"login\"]",
];

/// Broad tag set the scored-match strategy scans for action targets.
pub const ACTION_CANDIDATES: &str =
    "button, input[type=\"submit\"], input[type=\"button\"], [role=\"button\"]";

/// Elements the last-resort fallback may click.
pub const BUTTON_LIKE: &str =
    "button, input[type=\"submit\"], input[type=\"button\"], [role=\"button\"], a[href]";

/// Caller selector first, then the fixed fallbacks, without duplicates.
pub fn with_fallbacks(primary: Option<&str>, fallbacks: &[&str]) -> Vec<Locator> {
    let mut out: Vec<Locator> = Vec::with_capacity(fallbacks.len() + 1);
    let primary = primary.map(str::trim).filter(|p| !p.is_empty());

    for selector in primary.into_iter().chain(fallbacks.iter().copied()) {
        let locator = parse_locator(selector);
        if !out.contains(&locator) {
            out.push(locator);
        }
    }
    out
}

pub fn username(primary: Option<&str>) -> Vec<Locator> {
    with_fallbacks(primary, USERNAME_FALLBACKS)
}

pub fn password(primary: Option<&str>) -> Vec<Locator> {
    with_fallbacks(primary, PASSWORD_FALLBACKS)
}

pub fn submit(primary: Option<&str>) -> Vec<Locator> {
    with_fallbacks(primary, SUBMIT_FALLBACKS)
}

/// Expressions starting with `/` or `(` are XPath; everything else is CSS.
pub fn parse_locator(selector: &str) -> Locator {
    let s = selector.trim();
    if s.starts_with('/') || s.starts_with("(/") {
        Locator::xpath(s)
    } else {
        Locator::css(s)
    }
}
