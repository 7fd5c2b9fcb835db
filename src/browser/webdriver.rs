use reqwest::Method;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::browser::driver::{Driver, ElementRef, Locator};
use crate::browser::error::DriverError;

/// Connection settings for a running WebDriver endpoint (chromedriver, geckodriver, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebDriverConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_browser")]
    pub browser: String,

    #[serde(default = "default_true")]
    pub headless: bool,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            browser: default_browser(),
            headless: true,
        }
    }
}

fn default_endpoint() -> String { "http://localhost:9515".to_string() }
fn default_browser() -> String { "chrome".to_string() }
fn default_true() -> bool { true }

// ============================================================================
// Request payloads
// ============================================================================

#[derive(Debug, Serialize)]
pub struct NewSessionRequest {
    pub capabilities: Capabilities,
}

#[derive(Debug, Serialize)]
pub struct Capabilities {
    #[serde(rename = "alwaysMatch")]
    pub always_match: Value,
}

impl NewSessionRequest {
    pub fn from_config(config: &WebDriverConfig) -> Self {
        let mut caps = json!({ "browserName": config.browser });
        if config.headless {
            match config.browser.as_str() {
                "firefox" => {
                    caps["moz:firefoxOptions"] = json!({ "args": ["-headless"] });
                }
                _ => {
                    caps["goog:chromeOptions"] = json!({ "args": ["--headless=new"] });
                }
            }
        }
        NewSessionRequest {
            capabilities: Capabilities { always_match: caps },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NavigateRequest<'a> {
    pub url: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ElementQuery<'a> {
    pub using: &'static str,
    pub value: &'a str,
}

impl<'a> From<&'a Locator> for ElementQuery<'a> {
    fn from(locator: &'a Locator) -> Self {
        ElementQuery {
            using: locator.strategy(),
            value: locator.value(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ScriptRequest<'a> {
    pub script: &'a str,
    pub args: &'a [Value],
}

#[derive(Debug, Serialize)]
pub struct SendKeysRequest<'a> {
    pub text: &'a str,
}

/// Body for `POST /frame`; `id: null` selects the top-level document.
#[derive(Debug, Serialize)]
pub struct FrameSwitch {
    pub id: Value,
}

impl FrameSwitch {
    pub fn element(frame: &ElementRef) -> Self {
        FrameSwitch { id: frame.to_json() }
    }

    pub fn top_level() -> Self {
        FrameSwitch { id: Value::Null }
    }
}

#[derive(Debug, Serialize)]
pub struct WindowSwitch<'a> {
    pub handle: &'a str,
}

// ============================================================================
// Responses
// ============================================================================

/// Every WebDriver response wraps its payload in `value`.
#[derive(Debug, Deserialize)]
pub struct WireResponse {
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Deserialize)]
pub struct WireError {
    pub error: String,
    #[serde(default)]
    pub message: String,
}

/// Map a W3C error payload onto a `DriverError`.
pub fn map_wire_error(command: &str, err: WireError) -> DriverError {
    match err.error.as_str() {
        "no such element" => DriverError::NoSuchElement(err.message),
        "no such frame" => DriverError::NoSuchFrame(err.message),
        "javascript error" => DriverError::Script(err.message),
        "invalid session id" => DriverError::InvalidSession(err.message),
        _ => DriverError::Protocol {
            command: command.to_string(),
            message: format!("{}: {}", err.error, err.message),
        },
    }
}

// ============================================================================
// Session
// ============================================================================

/// A live W3C WebDriver session.
///
/// The session is released (all windows closed, then the session deleted)
/// by `close()` or, failing that, on drop.
pub struct WebDriverSession {
    client: Client,
    base: String,
    session_id: String,
    closed: bool,
}

impl WebDriverSession {
    /// Create a new browser session on an already-running driver endpoint.
    pub fn connect(config: &WebDriverConfig) -> Result<Self, DriverError> {
        let client = Client::new();
        let base = config.endpoint.trim_end_matches('/').to_string();
        let body = serde_json::to_value(NewSessionRequest::from_config(config)).map_err(|e| {
            DriverError::Json {
                context: "new session request".into(),
                source: e,
            }
        })?;

        let value = Self::call(&client, Method::POST, &format!("{}/session", base), Some(body), "new session")?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| DriverError::Protocol {
                command: "new session".into(),
                message: "response carried no sessionId".into(),
            })?
            .to_string();

        info!("opened webdriver session {} on {}", session_id, base);

        Ok(WebDriverSession {
            client,
            base,
            session_id,
            closed: false,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn call(
        client: &Client,
        method: Method,
        url: &str,
        body: Option<Value>,
        command: &str,
    ) -> Result<Value, DriverError> {
        let mut request = client.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send()?;
        let status = response.status();
        let wire: WireResponse = response.json()?;

        if status.is_success() {
            return Ok(wire.value);
        }

        let err: WireError = serde_json::from_value(wire.value).map_err(|e| DriverError::Json {
            context: format!("{} error body", command),
            source: e,
        })?;
        Err(map_wire_error(command, err))
    }

    fn send(&self, method: Method, path: &str, body: Option<Value>, command: &str) -> Result<Value, DriverError> {
        let url = format!("{}/session/{}{}", self.base, self.session_id, path);
        debug!("{} {}", command, url);
        Self::call(&self.client, method, &url, body, command)
    }

    fn post<T: Serialize>(&self, path: &str, body: &T, command: &str) -> Result<Value, DriverError> {
        let body = serde_json::to_value(body).map_err(|e| DriverError::Json {
            context: format!("{} request", command),
            source: e,
        })?;
        self.send(Method::POST, path, Some(body), command)
    }

    fn get(&self, path: &str, command: &str) -> Result<Value, DriverError> {
        self.send(Method::GET, path, None, command)
    }

    fn expect_element(value: &Value, command: &str) -> Result<ElementRef, DriverError> {
        ElementRef::from_json(value).ok_or_else(|| DriverError::Protocol {
            command: command.into(),
            message: "response was not an element reference".into(),
        })
    }

    fn expect_string(value: Value, command: &str) -> Result<String, DriverError> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(DriverError::Protocol {
                command: command.into(),
                message: format!("expected a string, got {}", other),
            }),
        }
    }
}

impl Driver for WebDriverSession {
    fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.post("/url", &NavigateRequest { url }, "navigate")?;
        Ok(())
    }

    fn evaluate(&mut self, script: &str, args: &[Value]) -> Result<Value, DriverError> {
        self.post("/execute/sync", &ScriptRequest { script, args }, "execute")
    }

    fn current_url(&mut self) -> Result<String, DriverError> {
        let value = self.get("/url", "current url")?;
        Self::expect_string(value, "current url")
    }

    fn title(&mut self) -> Result<String, DriverError> {
        let value = self.get("/title", "title")?;
        Self::expect_string(value, "title")
    }

    fn find_element(&mut self, locator: &Locator) -> Result<ElementRef, DriverError> {
        let value = self.post("/element", &ElementQuery::from(locator), "find element")?;
        Self::expect_element(&value, "find element")
    }

    fn find_elements(&mut self, locator: &Locator) -> Result<Vec<ElementRef>, DriverError> {
        let value = self.post("/elements", &ElementQuery::from(locator), "find elements")?;
        let items = value.as_array().cloned().unwrap_or_default();
        items
            .iter()
            .map(|v| Self::expect_element(v, "find elements"))
            .collect()
    }

    fn switch_to_frame(&mut self, frame: &ElementRef) -> Result<(), DriverError> {
        self.post("/frame", &FrameSwitch::element(frame), "switch to frame")?;
        Ok(())
    }

    fn switch_to_default(&mut self) -> Result<(), DriverError> {
        self.post("/frame", &FrameSwitch::top_level(), "switch to default")?;
        Ok(())
    }

    fn click(&mut self, element: &ElementRef) -> Result<(), DriverError> {
        self.post(&format!("/element/{}/click", element.id()), &json!({}), "click")?;
        Ok(())
    }

    fn send_keys(&mut self, element: &ElementRef, keys: &str) -> Result<(), DriverError> {
        self.post(
            &format!("/element/{}/value", element.id()),
            &SendKeysRequest { text: keys },
            "send keys",
        )?;
        Ok(())
    }

    fn attribute(&mut self, element: &ElementRef, name: &str) -> Result<Option<String>, DriverError> {
        let value = self.get(&format!("/element/{}/attribute/{}", element.id(), name), "get attribute")?;
        Ok(value.as_str().map(str::to_string))
    }

    fn text(&mut self, element: &ElementRef) -> Result<String, DriverError> {
        let value = self.get(&format!("/element/{}/text", element.id()), "get text")?;
        Self::expect_string(value, "get text")
    }

    fn is_displayed(&mut self, element: &ElementRef) -> Result<bool, DriverError> {
        let value = self.get(&format!("/element/{}/displayed", element.id()), "is displayed")?;
        Ok(value.as_bool().unwrap_or(false))
    }

    fn close(&mut self) -> Result<(), DriverError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        // Close every window first; a failure here must not skip session deletion
        match self.get("/window/handles", "window handles") {
            Ok(handles) => {
                for handle in handles.as_array().into_iter().flatten().filter_map(Value::as_str) {
                    let result = self
                        .post("/window", &WindowSwitch { handle }, "switch window")
                        .and_then(|_| self.send(Method::DELETE, "/window", None, "close window"));
                    if let Err(e) = result {
                        warn!("failed to close window {}: {}", handle, e);
                    }
                }
            }
            Err(e) => warn!("could not list windows: {}", e),
        }

        match self.send(Method::DELETE, "", None, "delete session") {
            // Closing the last window already ended the session
            Ok(_) | Err(DriverError::InvalidSession(_)) => {}
            Err(e) => return Err(e),
        }
        info!("closed webdriver session {}", self.session_id);
        Ok(())
    }
}

impl Drop for WebDriverSession {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("failed to release webdriver session {}: {}", self.session_id, e);
        }
    }
}
