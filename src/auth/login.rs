use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::browser::driver::{Driver, ElementRef, FrameScope, Locator};
use crate::browser::error::DriverError;
use crate::browser::wait::{Timeouts, navigate_and_wait, wait_until};
use crate::error::PageError;
use crate::resolver::candidates;
use crate::resolver::resolver::ElementResolver;
use crate::resolver::strategies::{Resolution, ResolveOptions};

/// What proves the login went through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuccessCondition {
    /// Substring the post-login URL must contain
    pub url_fragment: Option<String>,
    /// Element that must exist after login
    pub selector: Option<String>,
}

impl SuccessCondition {
    fn describe(&self) -> String {
        match (&self.url_fragment, &self.selector) {
            (Some(f), Some(s)) => format!("url containing '{}' or element '{}'", f, s),
            (Some(f), None) => format!("url containing '{}'", f),
            (None, Some(s)) => format!("element '{}'", s),
            (None, None) => "url change".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginForm {
    pub url: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub username_selector: Option<String>,
    #[serde(default)]
    pub password_selector: Option<String>,
    #[serde(default)]
    pub submit_selector: Option<String>,
    #[serde(default)]
    pub success: SuccessCondition,
}

/// Fill and submit a login form, then wait for the success condition.
///
/// Fields may live in an iframe; the driver is back in default content when
/// this returns, whatever the outcome.
pub fn perform_login<D: Driver + ?Sized>(
    driver: &mut D,
    form: &LoginForm,
    timeouts: &Timeouts,
) -> Result<(), PageError> {
    let resolver = ElementResolver::default();
    navigate_and_wait(driver, &form.url, timeouts)?;
    let start_url = driver.current_url()?;

    {
        let mut scope = FrameScope::new(&mut *driver);

        let user = resolver.resolve_in(
            &mut scope,
            "username field",
            &candidates::username(form.username_selector.as_deref()),
            ResolveOptions::field()
                .across_frames(true)
                .visibility_wait(timeouts.element_visibility),
        )?;
        let user_el = found_element(user, "username field")?;
        scope.send_keys(&user_el, &form.username)?;

        let pass = resolver.resolve_in(
            &mut scope,
            "password field",
            &candidates::password(form.password_selector.as_deref()),
            ResolveOptions::field().across_frames(true),
        )?;
        let pass_el = found_element(pass, "password field")?;
        scope.send_keys(&pass_el, &form.password)?;
        let pass_frame = scope.context();

        let submit = resolver.resolve_in(
            &mut scope,
            "submit control",
            &candidates::submit(form.submit_selector.as_deref()),
            ResolveOptions::action()
                .across_frames(true)
                .last_filled(pass_el, pass_frame),
        )?;
        match submit {
            Resolution::Found { element, strategy, .. } => {
                debug!("clicking submit found via {}", strategy.name());
                scope.click(&element)?;
            }
            Resolution::Submitted { action, .. } => {
                debug!("submitted through fallback {:?}", action);
            }
        }

        scope.restore()?;
    }

    wait_for_success(driver, form, &start_url, timeouts)?;
    info!("login to {} completed", form.url);
    Ok(())
}

fn found_element(resolution: Resolution, target: &str) -> Result<ElementRef, PageError> {
    match resolution {
        Resolution::Found { element, .. } => Ok(element),
        Resolution::Submitted { .. } => Err(PageError::ElementNotFound {
            target: target.to_string(),
            attempted: Vec::new(),
        }),
    }
}

fn wait_for_success<D: Driver + ?Sized>(
    driver: &mut D,
    form: &LoginForm,
    start_url: &str,
    timeouts: &Timeouts,
) -> Result<(), PageError> {
    let success = &form.success;
    let selector = success.selector.as_deref().map(candidates::parse_locator);

    let reached = wait_until(timeouts.login_redirect, timeouts.poll_interval, || {
        let url = driver.current_url()?;
        if success_met(&mut *driver, &url, start_url, success, selector.as_ref())? {
            Ok(Some(()))
        } else {
            Ok(None)
        }
    })?;

    if reached.is_some() {
        return Ok(());
    }

    let observed = driver.current_url().unwrap_or_else(|_| "<unavailable>".to_string());
    Err(PageError::LoginTimeout {
        expected: success.describe(),
        observed,
        timeout: timeouts.login_redirect,
    })
}

fn success_met<D: Driver + ?Sized>(
    driver: &mut D,
    url: &str,
    start_url: &str,
    success: &SuccessCondition,
    selector: Option<&Locator>,
) -> Result<bool, DriverError> {
    if let Some(fragment) = &success.url_fragment {
        if url.contains(fragment.as_str()) {
            return Ok(true);
        }
    }
    if let Some(locator) = selector {
        match driver.find_element(locator) {
            Ok(_) => return Ok(true),
            Err(e) if e.is_no_such_element() => {}
            Err(e) => return Err(e),
        }
    }
    if success.url_fragment.is_none() && success.selector.is_none() {
        return Ok(url != start_url);
    }
    Ok(false)
}
