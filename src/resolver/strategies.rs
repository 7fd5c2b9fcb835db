//! Location strategies, tried in a fixed order.
//!
//! 1. Direct CSS/XPath candidates in the current document
//! 2. The same candidates inside each top-level iframe
//! 3. Scored text/attribute match over button-like elements (action targets)
//! 4. Behavioural submit fallback (action targets)
//!
//! Strategies 3 and 4 work in the frame of the last-filled input when one is
//! given, otherwise in the frame the resolution started in.
//!
//! Each strategy runs at most once per resolution. A driver error inside a
//! strategy ends that strategy and the chain moves on.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::browser::driver::{Driver, ElementRef, FrameContext, Locator, enter_frame};
use crate::browser::error::DriverError;
use crate::browser::wait::wait_for_visible;
use crate::resolver::candidates::{ACTION_CANDIDATES, BUTTON_LIKE};
use crate::resolver::scoring::{CandidateSignals, ScoreTable, synonym_xpath};

/// WebDriver key code for Enter.
pub const ENTER_KEY: &str = "\u{E007}";

const VISIBILITY_POLL: Duration = Duration::from_millis(100);

const SUBMIT_FORM_SCRIPT: &str = r#"
var el = arguments[0];
var form = el ? el.closest('form') : document.querySelector('form');
if (!form) { return false; }
if (typeof form.requestSubmit === 'function') { form.requestSubmit(); } else { form.submit(); }
return true;
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StrategyKind {
    DirectCss,
    CrossFrame,
    ScoredMatch,
    SubmitFallback,
}

impl StrategyKind {
    /// The strategies applicable to `options`, in evaluation order.
    pub fn chain(options: &ResolveOptions) -> Vec<StrategyKind> {
        let mut chain = vec![StrategyKind::DirectCss];
        if options.across_frames {
            chain.push(StrategyKind::CrossFrame);
        }
        if options.target == TargetKind::Action {
            chain.push(StrategyKind::ScoredMatch);
            chain.push(StrategyKind::SubmitFallback);
        }
        chain
    }

    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::DirectCss => "direct-css",
            StrategyKind::CrossFrame => "cross-frame",
            StrategyKind::ScoredMatch => "scored-match",
            StrategyKind::SubmitFallback => "submit-fallback",
        }
    }
}

/// Plain field lookup, or a control that submits/advances (enables strategies 3 and 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TargetKind {
    #[default]
    Field,
    Action,
}

#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    pub across_frames: bool,
    pub target: TargetKind,
    /// Frame the driver is currently switched into
    pub frame: FrameContext,
    /// Input the Enter-key fallback presses on, and the frame it lives in
    pub last_filled: Option<(ElementRef, FrameContext)>,
    /// Wait this long for the caller-supplied (first) candidate to be displayed
    pub visibility_wait: Option<Duration>,
}

impl ResolveOptions {
    pub fn field() -> Self {
        Self::default()
    }

    pub fn action() -> Self {
        Self {
            target: TargetKind::Action,
            ..Self::default()
        }
    }

    pub fn across_frames(mut self, across_frames: bool) -> Self {
        self.across_frames = across_frames;
        self
    }

    pub fn in_frame(mut self, frame: FrameContext) -> Self {
        self.frame = frame;
        self
    }

    pub fn last_filled(mut self, element: ElementRef, frame: FrameContext) -> Self {
        self.last_filled = Some((element, frame));
        self
    }

    /// Document strategies 3 and 4 act in: the last-filled input's frame,
    /// else the frame the resolution started in.
    pub fn action_frame(&self) -> FrameContext {
        self.last_filled
            .as_ref()
            .map_or(self.frame, |(_, frame)| *frame)
    }

    pub fn visibility_wait(mut self, wait: Duration) -> Self {
        self.visibility_wait = Some(wait);
        self
    }
}

/// What the behavioural fallback did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SubmitAction {
    EnterKey,
    FormSubmit,
    ClickedButton,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// An element was located; later calls on it must happen in `frame`.
    Found {
        element: ElementRef,
        frame: FrameContext,
        strategy: StrategyKind,
        matched: String,
    },
    /// Nothing was located, but the submit fallback acted on the page.
    /// The driver is left in `frame`.
    Submitted {
        action: SubmitAction,
        frame: FrameContext,
    },
}

impl Resolution {
    pub fn element(&self) -> Option<&ElementRef> {
        match self {
            Resolution::Found { element, .. } => Some(element),
            Resolution::Submitted { .. } => None,
        }
    }

    pub fn frame(&self) -> FrameContext {
        match self {
            Resolution::Found { frame, .. } | Resolution::Submitted { frame, .. } => *frame,
        }
    }

    pub fn strategy(&self) -> StrategyKind {
        match self {
            Resolution::Found { strategy, .. } => *strategy,
            Resolution::Submitted { .. } => StrategyKind::SubmitFallback,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AttemptOutcome {
    Found,
    Missed,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyAttempt {
    pub strategy: StrategyKind,
    pub tried: Vec<String>,
    pub outcome: AttemptOutcome,
}

/// Record of every strategy a resolution ran, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolutionTrace {
    pub attempts: Vec<StrategyAttempt>,
}

impl ResolutionTrace {
    pub fn strategies(&self) -> Vec<StrategyKind> {
        self.attempts.iter().map(|a| a.strategy).collect()
    }

    /// Every selector or action tried, first to last, without duplicates.
    pub fn attempted(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for t in self.attempts.iter().flat_map(|a| a.tried.iter()) {
            if !out.contains(t) {
                out.push(t.clone());
            }
        }
        out
    }
}

/// State of one in-flight resolution.
pub(crate) struct ResolveRun<'a, D: Driver + ?Sized> {
    pub driver: &'a mut D,
    pub candidates: &'a [Locator],
    pub options: &'a ResolveOptions,
    pub scores: &'a ScoreTable,
    pub current: FrameContext,
    pub tried: Vec<String>,
}

impl<'a, D: Driver + ?Sized> ResolveRun<'a, D> {
    pub fn new(
        driver: &'a mut D,
        candidates: &'a [Locator],
        options: &'a ResolveOptions,
        scores: &'a ScoreTable,
    ) -> Self {
        ResolveRun {
            driver,
            candidates,
            options,
            scores,
            current: options.frame,
            tried: Vec::new(),
        }
    }

    pub fn run(&mut self, kind: StrategyKind) -> Result<Option<Resolution>, DriverError> {
        match kind {
            StrategyKind::DirectCss => self.direct_css(),
            StrategyKind::CrossFrame => self.cross_frame(),
            StrategyKind::ScoredMatch => self.scored_match(),
            StrategyKind::SubmitFallback => self.submit_fallback(),
        }
    }

    fn note(&mut self, what: impl Into<String>) {
        self.tried.push(what.into());
    }

    fn found(&self, element: ElementRef, strategy: StrategyKind, matched: String) -> Resolution {
        Resolution::Found {
            element,
            frame: self.current,
            strategy,
            matched,
        }
    }

    /// Try each candidate in order in the current document.
    fn first_candidate(&mut self) -> Option<(ElementRef, String)> {
        let candidates = self.candidates;
        for (i, locator) in candidates.iter().enumerate() {
            let label = match self.current {
                FrameContext::Default => locator.to_string(),
                FrameContext::Frame { index } => format!("frame[{}] {}", index, locator),
            };
            self.note(label);

            let found = match (i, self.options.visibility_wait) {
                (0, Some(wait)) => {
                    wait_for_visible(&mut *self.driver, locator, wait, VISIBILITY_POLL)
                }
                _ => match self.driver.find_element(locator) {
                    Ok(el) => Ok(Some(el)),
                    Err(e) if e.is_no_such_element() => Ok(None),
                    Err(e) => Err(e),
                },
            };

            match found {
                Ok(Some(el)) => return Some((el, locator.to_string())),
                Ok(None) => {}
                Err(e) => debug!("candidate {} errored: {}", locator, e),
            }
        }
        None
    }

    fn direct_css(&mut self) -> Result<Option<Resolution>, DriverError> {
        Ok(self
            .first_candidate()
            .map(|(el, matched)| self.found(el, StrategyKind::DirectCss, matched)))
    }

    fn cross_frame(&mut self) -> Result<Option<Resolution>, DriverError> {
        self.driver.switch_to_default()?;
        self.current = FrameContext::Default;

        let frames = self.driver.find_elements(&Locator::css("iframe"))?;
        debug!("searching {} frame(s)", frames.len());

        for (index, frame) in frames.iter().enumerate() {
            if let Err(e) = self.driver.switch_to_frame(frame) {
                warn!("could not enter frame {}: {}", index, e);
                self.driver.switch_to_default()?;
                continue;
            }
            self.current = FrameContext::Frame { index };

            if let Some((el, matched)) = self.first_candidate() {
                // Stay in the frame: the element is only usable from here
                return Ok(Some(self.found(el, StrategyKind::CrossFrame, matched)));
            }

            self.driver.switch_to_default()?;
            self.current = FrameContext::Default;
        }
        Ok(None)
    }

    fn read_signals(&mut self, el: &ElementRef) -> Result<CandidateSignals, DriverError> {
        let text = self.driver.text(el)?;
        Ok(CandidateSignals {
            input_type: self.driver.attribute(el, "type")?,
            text: Some(text).filter(|t| !t.trim().is_empty()),
            aria_label: self.driver.attribute(el, "aria-label")?,
            value: self.driver.attribute(el, "value")?,
            id: self.driver.attribute(el, "id")?,
            class: self.driver.attribute(el, "class")?,
        })
    }

    /// Score every element `locator` finds; best positive score wins.
    fn best_scored(&mut self, locator: &Locator) -> Result<Option<(ElementRef, i32)>, DriverError> {
        self.note(locator.to_string());
        let elements = self.driver.find_elements(locator)?;

        let mut scored: Vec<(ElementRef, CandidateSignals)> = Vec::with_capacity(elements.len());
        for el in elements {
            match self.read_signals(&el) {
                Ok(signals) => scored.push((el, signals)),
                Err(e) => debug!("skipping candidate {}: {}", el.id(), e),
            }
        }

        let best = self.scores.best(scored.iter().map(|(_, s)| s));
        Ok(best.map(|(i, score)| (scored.swap_remove(i).0, score)))
    }

    /// Move into the document the action strategies work in.
    fn enter_action_frame(&mut self) -> Result<(), DriverError> {
        let target = self.options.action_frame();
        if self.current == target {
            return Ok(());
        }
        debug!("entering {:?} for action strategies", target);
        match enter_frame(&mut *self.driver, target) {
            Ok(()) => {
                self.current = target;
                Ok(())
            }
            Err(e) => {
                self.current = FrameContext::Default;
                Err(e)
            }
        }
    }

    /// `best_scored`, with a query failure treated as no match.
    fn best_scored_or_none(&mut self, locator: &Locator) -> Option<(ElementRef, i32)> {
        self.best_scored(locator).unwrap_or_else(|e| {
            debug!("{} query failed: {}", locator, e);
            None
        })
    }

    fn scored_match(&mut self) -> Result<Option<Resolution>, DriverError> {
        self.enter_action_frame()?;

        let markup = Locator::css(ACTION_CANDIDATES);
        let best = match self.best_scored_or_none(&markup) {
            Some(hit) => Some((hit, markup)),
            None => {
                let text_scan = Locator::xpath(synonym_xpath());
                self.best_scored_or_none(&text_scan).map(|hit| (hit, text_scan))
            }
        };

        Ok(best.map(|((el, score), locator)| {
            debug!("scored match {} with score {}", el.id(), score);
            self.found(el, StrategyKind::ScoredMatch, locator.to_string())
        }))
    }

    fn submitted(&self, action: SubmitAction) -> Option<Resolution> {
        Some(Resolution::Submitted {
            action,
            frame: self.current,
        })
    }

    fn submit_fallback(&mut self) -> Result<Option<Resolution>, DriverError> {
        self.enter_action_frame()?;
        let input = self.options.last_filled.as_ref().map(|(el, _)| el.clone());

        if let Some(input) = &input {
            self.note("keypress:Enter");
            match self.driver.send_keys(input, ENTER_KEY) {
                Ok(()) => return Ok(self.submitted(SubmitAction::EnterKey)),
                Err(e) => warn!("enter keypress failed: {}", e),
            }
        }

        self.note("script:form.submit");
        let arg = input.as_ref().map(ElementRef::to_json).unwrap_or(Value::Null);
        match self.driver.evaluate(SUBMIT_FORM_SCRIPT, &[arg]) {
            Ok(Value::Bool(true)) => return Ok(self.submitted(SubmitAction::FormSubmit)),
            Ok(_) => debug!("no form to submit"),
            Err(e) => warn!("form submit failed: {}", e),
        }

        self.note(format!("click:first-visible {}", BUTTON_LIKE));
        match self.click_first_visible() {
            Ok(true) => Ok(self.submitted(SubmitAction::ClickedButton)),
            Ok(false) => Ok(None),
            Err(e) => {
                warn!("clicking first visible button failed: {}", e);
                Ok(None)
            }
        }
    }

    fn click_first_visible(&mut self) -> Result<bool, DriverError> {
        for el in self.driver.find_elements(&Locator::css(BUTTON_LIKE))? {
            if self.driver.is_displayed(&el)? {
                self.driver.click(&el)?;
                return Ok(true);
            }
        }
        Ok(false)
    }
}
