use std::fmt;
use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;

use crate::browser::error::DriverError;

/// W3C WebDriver key identifying an element reference in JSON payloads.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// How to find elements: by CSS selector or XPath expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "using", content = "value", rename_all = "lowercase")]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Locator::XPath(expr.into())
    }

    /// W3C `using` strategy name.
    pub fn strategy(&self) -> &'static str {
        match self {
            Locator::Css(_) => "css selector",
            Locator::XPath(_) => "xpath",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Locator::Css(v) | Locator::XPath(v) => v,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(v) => write!(f, "css={}", v),
            Locator::XPath(v) => write!(f, "xpath={}", v),
        }
    }
}

/// Opaque handle to a live element, valid in the frame it was found in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(pub String);

impl ElementRef {
    pub fn new(id: impl Into<String>) -> Self {
        ElementRef(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }

    /// Element reference object, usable as a script argument.
    pub fn to_json(&self) -> Value {
        json!({ ELEMENT_KEY: self.0 })
    }

    /// Parse a W3C element reference object.
    pub fn from_json(value: &Value) -> Option<Self> {
        value
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(ElementRef::new)
    }
}

/// The document subsequent driver calls operate against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FrameContext {
    #[default]
    Default,
    /// Index into the top-level `iframe` list at the time of the switch
    Frame { index: usize },
}

impl FrameContext {
    pub fn is_default(&self) -> bool {
        matches!(self, FrameContext::Default)
    }
}

/// Browser capability consumed by the scanner, resolver and login flow.
///
/// Every call is synchronous and operates on the session's current frame
/// context, which is why all methods take `&mut self`.
pub trait Driver {
    fn navigate(&mut self, url: &str) -> Result<(), DriverError>;

    /// Evaluate a script body in the page; `args` are exposed as `arguments[i]`.
    fn evaluate(&mut self, script: &str, args: &[Value]) -> Result<Value, DriverError>;

    fn current_url(&mut self) -> Result<String, DriverError>;

    fn title(&mut self) -> Result<String, DriverError>;

    /// First match, or `DriverError::NoSuchElement`.
    fn find_element(&mut self, locator: &Locator) -> Result<ElementRef, DriverError>;

    fn find_elements(&mut self, locator: &Locator) -> Result<Vec<ElementRef>, DriverError>;

    fn switch_to_frame(&mut self, frame: &ElementRef) -> Result<(), DriverError>;

    fn switch_to_default(&mut self) -> Result<(), DriverError>;

    fn click(&mut self, element: &ElementRef) -> Result<(), DriverError>;

    fn send_keys(&mut self, element: &ElementRef, keys: &str) -> Result<(), DriverError>;

    fn attribute(&mut self, element: &ElementRef, name: &str)
    -> Result<Option<String>, DriverError>;

    fn text(&mut self, element: &ElementRef) -> Result<String, DriverError>;

    fn is_displayed(&mut self, element: &ElementRef) -> Result<bool, DriverError>;

    /// Close all windows, then end the browser session.
    fn close(&mut self) -> Result<(), DriverError>;
}

/// Switch the driver into `context`, starting from default content.
///
/// Frame indices refer to the top-level `iframe` list, as recorded by the resolver.
pub fn enter_frame<D: Driver + ?Sized>(driver: &mut D, context: FrameContext) -> Result<(), DriverError> {
    driver.switch_to_default()?;
    let FrameContext::Frame { index } = context else {
        return Ok(());
    };
    let frames = driver.find_elements(&Locator::css("iframe"))?;
    let frame = frames
        .get(index)
        .ok_or_else(|| DriverError::NoSuchFrame(format!("iframe #{}", index)))?;
    driver.switch_to_frame(frame)
}

/// Scoped frame context: holds the driver while switched into a frame and
/// switches back to default content when dropped.
pub struct FrameScope<'a, D: Driver + ?Sized> {
    driver: &'a mut D,
    context: FrameContext,
}

impl<'a, D: Driver + ?Sized> FrameScope<'a, D> {
    /// Scope starting in default content.
    pub fn new(driver: &'a mut D) -> Self {
        FrameScope {
            driver,
            context: FrameContext::Default,
        }
    }

    pub fn context(&self) -> FrameContext {
        self.context
    }

    /// Record a context the driver has already been switched into.
    pub fn set_context(&mut self, context: FrameContext) {
        self.context = context;
    }

    /// Restore default content now, surfacing the error instead of logging it.
    pub fn restore(mut self) -> Result<(), DriverError> {
        let was_framed = !self.context.is_default();
        self.context = FrameContext::Default;
        if was_framed {
            self.driver.switch_to_default()?;
        }
        Ok(())
    }
}

impl<D: Driver + ?Sized> Deref for FrameScope<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        self.driver
    }
}

impl<D: Driver + ?Sized> DerefMut for FrameScope<'_, D> {
    fn deref_mut(&mut self) -> &mut D {
        self.driver
    }
}

impl<D: Driver + ?Sized> Drop for FrameScope<'_, D> {
    fn drop(&mut self) {
        if !self.context.is_default() {
            if let Err(e) = self.driver.switch_to_default() {
                warn!("failed to restore default content: {}", e);
            }
        }
    }
}
