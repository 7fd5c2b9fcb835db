use std::thread::sleep;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::browser::driver::{Driver, ElementRef, Locator};
use crate::browser::error::DriverError;
use crate::error::PageError;

/// Budgets for the bounded waits in a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timeouts {
    pub navigation: Duration,
    pub login_redirect: Duration,
    pub element_visibility: Duration,
    pub poll_interval: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation: Duration::from_secs(10),
            login_redirect: Duration::from_secs(30),
            element_visibility: Duration::from_secs(10),
            poll_interval: Duration::from_millis(250),
        }
    }
}

/// Poll `probe` until it yields `Some` or `timeout` elapses.
///
/// The probe always runs at least once. Probe errors abort the wait.
pub fn wait_until<T, F>(
    timeout: Duration,
    poll: Duration,
    mut probe: F,
) -> Result<Option<T>, DriverError>
where
    F: FnMut() -> Result<Option<T>, DriverError>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(value) = probe()? {
            return Ok(Some(value));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        sleep(poll.min(deadline - now));
    }
}

pub fn is_page_ready<D: Driver + ?Sized>(driver: &mut D) -> Result<bool, DriverError> {
    let state = driver.evaluate("return document.readyState;", &[])?;
    Ok(state.as_str() == Some("complete"))
}

pub fn wait_for_page_ready<D: Driver + ?Sized>(
    driver: &mut D,
    timeout: Duration,
    poll: Duration,
) -> Result<bool, DriverError> {
    let ready = wait_until(timeout, poll, || {
        Ok(is_page_ready(&mut *driver)?.then_some(()))
    })?;
    Ok(ready.is_some())
}

/// Navigate and block until the document reports `complete`.
pub fn navigate_and_wait<D: Driver + ?Sized>(
    driver: &mut D,
    url: &str,
    timeouts: &Timeouts,
) -> Result<(), PageError> {
    debug!("navigating to {}", url);
    driver.navigate(url)?;
    if wait_for_page_ready(driver, timeouts.navigation, timeouts.poll_interval)? {
        Ok(())
    } else {
        Err(PageError::NavigationTimeout {
            url: url.to_string(),
            timeout: timeouts.navigation,
        })
    }
}

/// Wait for an element matching `locator` to exist and be displayed.
pub fn wait_for_visible<D: Driver + ?Sized>(
    driver: &mut D,
    locator: &Locator,
    timeout: Duration,
    poll: Duration,
) -> Result<Option<ElementRef>, DriverError> {
    wait_until(timeout, poll, || match driver.find_element(locator) {
        Ok(el) => Ok(driver.is_displayed(&el)?.then_some(el)),
        Err(e) if e.is_no_such_element() => Ok(None),
        Err(e) => Err(e),
    })
}
