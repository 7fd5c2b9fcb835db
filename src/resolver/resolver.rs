use tracing::{debug, info, warn};

use crate::browser::driver::{Driver, FrameContext, FrameScope, Locator};
use crate::error::PageError;
use crate::resolver::scoring::ScoreTable;
use crate::resolver::strategies::{
    AttemptOutcome, Resolution, ResolutionTrace, ResolveOptions, ResolveRun, StrategyAttempt,
    StrategyKind,
};

/// Finds one element through the fixed strategy chain.
#[derive(Debug, Clone, Default)]
pub struct ElementResolver {
    scores: ScoreTable,
}

impl ElementResolver {
    pub fn new(scores: ScoreTable) -> Self {
        Self { scores }
    }

    pub fn scores(&self) -> &ScoreTable {
        &self.scores
    }

    pub fn resolve<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
        candidates: &[Locator],
        options: &ResolveOptions,
    ) -> Option<Resolution> {
        self.resolve_traced(driver, candidates, options).0
    }

    /// Run the chain and report every attempt.
    ///
    /// On a miss the driver is left in default content.
    pub fn resolve_traced<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
        candidates: &[Locator],
        options: &ResolveOptions,
    ) -> (Option<Resolution>, ResolutionTrace) {
        let mut trace = ResolutionTrace::default();
        let mut run = ResolveRun::new(driver, candidates, options, &self.scores);

        for kind in StrategyKind::chain(options) {
            debug!("trying strategy {}", kind.name());
            let result = run.run(kind);
            let tried = std::mem::take(&mut run.tried);

            match result {
                Ok(Some(resolution)) => {
                    info!("resolved via {} strategy", kind.name());
                    trace.attempts.push(StrategyAttempt {
                        strategy: kind,
                        tried,
                        outcome: AttemptOutcome::Found,
                    });
                    return (Some(resolution), trace);
                }
                Ok(None) => trace.attempts.push(StrategyAttempt {
                    strategy: kind,
                    tried,
                    outcome: AttemptOutcome::Missed,
                }),
                Err(e) => {
                    warn!("strategy {} failed: {}", kind.name(), e);
                    trace.attempts.push(StrategyAttempt {
                        strategy: kind,
                        tried,
                        outcome: AttemptOutcome::Failed(e.to_string()),
                    });
                }
            }
        }

        if !run.current.is_default() || !options.frame.is_default() {
            if let Err(e) = run.driver.switch_to_default() {
                warn!("failed to restore default content: {}", e);
            }
        }

        (None, trace)
    }

    /// Like `resolve`, but a miss becomes `ElementNotFound` with every selector tried.
    pub fn resolve_or_fail<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
        target: &str,
        candidates: &[Locator],
        options: &ResolveOptions,
    ) -> Result<Resolution, PageError> {
        match self.resolve_traced(driver, candidates, options) {
            (Some(resolution), _) => Ok(resolution),
            (None, trace) => Err(PageError::ElementNotFound {
                target: target.to_string(),
                attempted: trace.attempted(),
            }),
        }
    }

    /// Resolve inside a frame scope, keeping the scope's context in step
    /// with wherever the chain left the driver.
    pub fn resolve_in<D: Driver + ?Sized>(
        &self,
        scope: &mut FrameScope<'_, D>,
        target: &str,
        candidates: &[Locator],
        options: ResolveOptions,
    ) -> Result<Resolution, PageError> {
        let options = options.in_frame(scope.context());
        let result = self.resolve_or_fail(&mut **scope, target, candidates, &options);
        match &result {
            Ok(resolution) => scope.set_context(resolution.frame()),
            Err(_) => scope.set_context(FrameContext::Default),
        }
        result
    }

    /// Whether any candidate matches directly in the current document.
    /// Runs the first strategy only; used to check synthesized selectors.
    pub fn probe<D: Driver + ?Sized>(&self, driver: &mut D, candidates: &[Locator]) -> bool {
        let options = ResolveOptions::field();
        let mut run = ResolveRun::new(driver, candidates, &options, &self.scores);
        matches!(run.run(StrategyKind::DirectCss), Ok(Some(_)))
    }
}
