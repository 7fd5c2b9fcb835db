use std::thread;

use tracing::{info, warn};

use crate::{
    browser::{
        driver::Driver,
        wait::{Timeouts, navigate_and_wait},
        webdriver::{WebDriverConfig, WebDriverSession},
    },
    error::PageError,
    screen::{
        classifier::{ClassifierRules, ElementClassifier},
        scanner::{PageScanner, ScanOptions, ScanOutcome},
    },
};

pub mod auth;
pub mod browser;
pub mod cli;
pub mod error;
pub mod evolution;
pub mod resolver;
pub mod screen;

/// Everything one scan session needs.
#[derive(Debug, Clone, Default)]
pub struct ScanSettings {
    pub webdriver: WebDriverConfig,
    pub timeouts: Timeouts,
    pub rules: ClassifierRules,
    pub options: ScanOptions,
}

impl ScanSettings {
    pub fn scanner(&self) -> PageScanner {
        PageScanner::new(ElementClassifier::new(self.rules.clone()), self.options.clone())
    }
}

/// Navigate an existing session to `url` and scan it.
pub fn scan_page<D: Driver + ?Sized>(
    driver: &mut D,
    url: &str,
    settings: &ScanSettings,
) -> Result<ScanOutcome, PageError> {
    navigate_and_wait(driver, url, &settings.timeouts)?;
    settings.scanner().scan_with_report(driver)
}

/// Open a session, scan one page, and release the session on every path.
pub fn scan_url(url: &str, settings: &ScanSettings) -> Result<ScanOutcome, PageError> {
    let mut session = WebDriverSession::connect(&settings.webdriver)?;
    let result = scan_page(&mut session, url, settings);

    if let Err(e) = session.close() {
        warn!("failed to close session after scanning {}: {}", url, e);
    }
    result
}

/// Scan several pages, each in its own browser session on its own thread.
///
/// Results come back in the order of `urls`.
pub fn scan_many(urls: &[String], settings: &ScanSettings) -> Vec<Result<ScanOutcome, PageError>> {
    info!("scanning {} page(s) in parallel sessions", urls.len());

    thread::scope(|s| {
        let handles: Vec<_> = urls
            .iter()
            .map(|url| s.spawn(move || scan_url(url, settings)))
            .collect();

        handles
            .into_iter()
            .zip(urls)
            .map(|(h, url)| {
                h.join().unwrap_or_else(|_| {
                    Err(PageError::scan_failure(format!("scan thread for {} panicked", url)))
                })
            })
            .collect()
    })
}
