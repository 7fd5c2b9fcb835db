use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::browser::wait::Timeouts;
use crate::browser::webdriver::WebDriverConfig;
use crate::screen::scanner::ScanOptions;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "page-model",
    version,
    about = "Capture, diff and check compatibility of web page element models"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// WebDriver endpoint (e.g. http://localhost:9515)
    #[arg(long, global = true)]
    pub webdriver: Option<String>,

    /// Path to config file (default: page-model.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan one or more pages and print their models as JSON
    Scan {
        /// URL to scan; repeat to scan several pages in parallel sessions
        #[arg(long, required = true)]
        url: Vec<String>,

        /// Keep only rendered elements
        #[arg(long)]
        visible_only: bool,

        /// Re-locate every synthesized selector after scanning
        #[arg(long)]
        validate: bool,

        /// Output format: json or summary
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Compare two saved models and report breaking changes
    Diff {
        /// Model JSON from the earlier scan
        #[arg(long)]
        previous: String,

        /// Model JSON from the later scan
        #[arg(long)]
        current: String,

        /// Comma-separated method names generated for the earlier model
        #[arg(long, value_delimiter = ',')]
        old_methods: Vec<String>,

        /// Comma-separated method names generated for the later model
        #[arg(long, value_delimiter = ',')]
        new_methods: Vec<String>,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `page-model.yaml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub webdriver: WebDriverConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_navigation_ms")]
    pub navigation_ms: u64,

    #[serde(default = "default_login_redirect_ms")]
    pub login_redirect_ms: u64,

    #[serde(default = "default_element_visibility_ms")]
    pub element_visibility_ms: u64,

    #[serde(default = "default_poll_ms")]
    pub poll_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            navigation_ms: default_navigation_ms(),
            login_redirect_ms: default_login_redirect_ms(),
            element_visibility_ms: default_element_visibility_ms(),
            poll_ms: default_poll_ms(),
        }
    }
}

impl TimeoutConfig {
    pub fn to_timeouts(&self) -> Timeouts {
        Timeouts {
            navigation: Duration::from_millis(self.navigation_ms),
            login_redirect: Duration::from_millis(self.login_redirect_ms),
            element_visibility: Duration::from_millis(self.element_visibility_ms),
            poll_interval: Duration::from_millis(self.poll_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default)]
    pub visible_only: bool,

    #[serde(default)]
    pub validate_selectors: bool,

    #[serde(default = "default_max_text_len")]
    pub max_text_len: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            visible_only: false,
            validate_selectors: false,
            max_text_len: default_max_text_len(),
        }
    }
}

impl ScanConfig {
    pub fn to_options(&self) -> ScanOptions {
        ScanOptions {
            visible_only: self.visible_only,
            validate_selectors: self.validate_selectors,
        }
    }
}

// Serde default helpers
fn default_navigation_ms() -> u64 { 10_000 }
fn default_login_redirect_ms() -> u64 { 30_000 }
fn default_element_visibility_ms() -> u64 { 10_000 }
fn default_poll_ms() -> u64 { 250 }
fn default_max_text_len() -> usize { 100 }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("page-model.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => parse_config(&content).unwrap_or_else(|e| {
            warn!("ignoring malformed config {}: {}", config_path, e);
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

pub fn parse_config(content: &str) -> Result<AppConfig, serde_yaml::Error> {
    serde_yaml::from_str(content)
}
