//! Scroll-convergence controller for infinitely-scrolling pages.
//!
//! The controller is a small state machine: `Scrolling` until either the
//! rendered content height has stayed the same for `stagnation_threshold`
//! consecutive ticks (`Converged`) or `max_ticks` ticks have run
//! (`Exhausted`). The item count is sampled on every tick for logging only;
//! height is the sole termination input because the item count can plateau
//! while more DOM is still attaching.
//!
//! [`ScrollController::observe`] is the pure transition function and
//! [`ScrollController::run`] drives it against a live [`PageSession`].

use tracing::{debug, info};

use crate::config::{ScrollMode, ScrollPolicy};
use crate::session::PageSession;
use crate::types::{HarvestError, HarvestResult};

const SCROLL_TO_BOTTOM_JS: &str = "window.scrollTo(0, document.body.scrollHeight)";
const CONTENT_HEIGHT_JS: &str = "document.body.scrollHeight";

/// Controller state. `Converged` and `Exhausted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollState {
    Scrolling,
    Converged,
    Exhausted,
}

impl ScrollState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ScrollState::Scrolling)
    }
}

/// Signals read after one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSample {
    pub tick: u32,
    pub height: u64,
    pub item_count: usize,
}

/// Result of driving the controller to a terminal state.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollOutcome {
    pub state: ScrollState,
    pub ticks: u32,
    pub samples: Vec<TickSample>,
    /// Pause the caller should take before re-enumerating items.
    pub final_settle_ms: u64,
}

impl ScrollOutcome {
    /// Item count seen on the last tick.
    pub fn last_item_count(&self) -> usize {
        self.samples.last().map(|s| s.item_count).unwrap_or(0)
    }
}

/// Drives progressive content loading until convergence.
#[derive(Debug, Clone)]
pub struct ScrollController {
    policy: ScrollPolicy,
    item_selector: String,
    state: ScrollState,
    tick: u32,
    previous_height: u64,
    stagnation: u32,
}

impl ScrollController {
    pub fn new(policy: ScrollPolicy, item_selector: impl Into<String>) -> Self {
        Self {
            policy,
            item_selector: item_selector.into(),
            state: ScrollState::Scrolling,
            tick: 0,
            previous_height: 0,
            stagnation: 0,
        }
    }

    pub fn state(&self) -> ScrollState {
        self.state
    }

    /// Number of ticks observed so far.
    pub fn ticks(&self) -> u32 {
        self.tick
    }

    /// Consecutive ticks without height growth.
    pub fn stagnation(&self) -> u32 {
        self.stagnation
    }

    /// Record the content height read after one tick and advance the state.
    ///
    /// Has no effect once a terminal state is reached.
    pub fn observe(&mut self, height: u64) -> ScrollState {
        if self.state.is_terminal() {
            return self.state;
        }

        self.tick += 1;
        if height == self.previous_height {
            self.stagnation += 1;
        } else {
            self.stagnation = 0;
        }
        self.previous_height = height;

        self.state = match self.policy.mode {
            ScrollMode::UntilConverged => {
                if self.stagnation >= self.policy.stagnation_threshold {
                    ScrollState::Converged
                } else if self.tick >= self.policy.max_ticks {
                    ScrollState::Exhausted
                } else {
                    ScrollState::Scrolling
                }
            }
            ScrollMode::FixedSteps { steps, .. } => {
                if self.tick >= steps {
                    ScrollState::Exhausted
                } else {
                    ScrollState::Scrolling
                }
            }
        };
        self.state
    }

    fn scroll_script(&self) -> String {
        match self.policy.mode {
            ScrollMode::UntilConverged => SCROLL_TO_BOTTOM_JS.to_string(),
            ScrollMode::FixedSteps { step_px, .. } => {
                let offset = u64::from(self.tick + 1) * u64::from(step_px);
                format!("window.scrollTo(0, {offset})")
            }
        }
    }

    /// Scroll until a terminal state is reached.
    pub async fn run(mut self, session: &mut dyn PageSession) -> HarvestResult<ScrollOutcome> {
        let mut samples = Vec::new();

        if let ScrollMode::FixedSteps { steps: 0, .. } = self.policy.mode {
            self.state = ScrollState::Exhausted;
        }

        while !self.state.is_terminal() {
            session.evaluate_script(&self.scroll_script()).await?;
            session.wait(self.policy.settle_delay_ms).await?;

            let height = read_content_height(session).await?;
            let item_count = session.query_all(&self.item_selector).await?.len();

            let state = self.observe(height);
            debug!(
                tick = self.tick,
                height,
                item_count,
                stagnation = self.stagnation,
                "scroll {}: {item_count} items detected",
                self.tick
            );
            samples.push(TickSample {
                tick: self.tick,
                height,
                item_count,
            });

            if state == ScrollState::Converged {
                info!(
                    ticks = self.tick,
                    "no new content after {} ticks, stopping scroll", self.stagnation
                );
            }
        }

        if self.state == ScrollState::Exhausted {
            info!(ticks = self.tick, "scroll budget reached");
        }

        Ok(ScrollOutcome {
            state: self.state,
            ticks: self.tick,
            samples,
            final_settle_ms: self.policy.final_settle_ms,
        })
    }
}

async fn read_content_height(session: &mut dyn PageSession) -> HarvestResult<u64> {
    let value = session.evaluate_script(CONTENT_HEIGHT_JS).await?;
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|h| *h >= 0.0).map(|h| h.round() as u64))
        .ok_or_else(|| HarvestError::Script(format!("unexpected content height value: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::NodeHandle;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    fn policy(threshold: u32, max_ticks: u32) -> ScrollPolicy {
        ScrollPolicy {
            stagnation_threshold: threshold,
            max_ticks,
            ..ScrollPolicy::default()
        }
    }

    #[test]
    fn test_observe_converges_after_threshold() {
        let mut controller = ScrollController::new(policy(6, 150), "li");
        for height in [1000, 2000, 3000] {
            assert_eq!(controller.observe(height), ScrollState::Scrolling);
        }
        for _ in 0..5 {
            assert_eq!(controller.observe(3000), ScrollState::Scrolling);
        }
        assert_eq!(controller.observe(3000), ScrollState::Converged);
        assert_eq!(controller.ticks(), 3 + 6);
    }

    #[test]
    fn test_observe_growth_resets_stagnation() {
        let mut controller = ScrollController::new(policy(3, 150), "li");
        controller.observe(1000);
        controller.observe(1000);
        controller.observe(1000);
        assert_eq!(controller.stagnation(), 2);
        controller.observe(1500);
        assert_eq!(controller.stagnation(), 0);
        assert_eq!(controller.state(), ScrollState::Scrolling);
    }

    #[test]
    fn test_observe_exhausts_at_cap() {
        let mut controller = ScrollController::new(policy(6, 10), "li");
        for tick in 1..10u64 {
            assert_eq!(controller.observe(tick * 100), ScrollState::Scrolling);
        }
        assert_eq!(controller.observe(5000), ScrollState::Exhausted);
        assert_eq!(controller.ticks(), 10);
    }

    #[test]
    fn test_observe_convergence_wins_on_last_tick() {
        let mut controller = ScrollController::new(policy(2, 3), "li");
        controller.observe(100);
        controller.observe(100);
        assert_eq!(controller.observe(100), ScrollState::Converged);
    }

    #[test]
    fn test_terminal_state_is_sticky() {
        let mut controller = ScrollController::new(policy(1, 150), "li");
        controller.observe(0);
        assert_eq!(controller.state(), ScrollState::Converged);
        assert_eq!(controller.observe(9000), ScrollState::Converged);
        assert_eq!(controller.ticks(), 1);
    }

    /// Session replaying a fixed height sequence; the last height repeats.
    struct HeightScript {
        heights: Vec<u64>,
        reads: usize,
        scripts: Vec<String>,
        waits: Vec<u64>,
    }

    impl HeightScript {
        fn new(heights: Vec<u64>) -> Self {
            Self {
                heights,
                reads: 0,
                scripts: Vec::new(),
                waits: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl PageSession for HeightScript {
        async fn navigate(&mut self, _url: &str, _timeout_ms: u64) -> HarvestResult<()> {
            Ok(())
        }
        async fn wait(&mut self, ms: u64) -> HarvestResult<()> {
            self.waits.push(ms);
            Ok(())
        }
        async fn evaluate_script(&mut self, script: &str) -> HarvestResult<Value> {
            if script == CONTENT_HEIGHT_JS {
                let idx = self.reads.min(self.heights.len() - 1);
                self.reads += 1;
                return Ok(json!(self.heights[idx]));
            }
            self.scripts.push(script.to_string());
            Ok(Value::Null)
        }
        async fn query_all(&mut self, _selector: &str) -> HarvestResult<Vec<Box<dyn NodeHandle>>> {
            Ok(Vec::new())
        }
        async fn query_single(
            &mut self,
            _selector: &str,
        ) -> HarvestResult<Option<Box<dyn NodeHandle>>> {
            Ok(None)
        }
        async fn click(&mut self, _selector: &str) -> HarvestResult<bool> {
            Ok(false)
        }
        async fn content(&mut self) -> HarvestResult<String> {
            Ok(String::new())
        }
        async fn screenshot(&mut self, _path: &str) -> HarvestResult<()> {
            Ok(())
        }
        async fn close(self: Box<Self>) -> HarvestResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_run_converges() {
        let mut session = HeightScript::new(vec![1000, 2000, 3000]);
        let outcome = ScrollController::new(ScrollPolicy::default(), "li")
            .run(&mut session)
            .await
            .unwrap();

        assert_eq!(outcome.state, ScrollState::Converged);
        assert_eq!(outcome.ticks, 9);
        assert_eq!(outcome.samples.len(), 9);
        assert_eq!(outcome.final_settle_ms, 3000);
        assert!(session.waits.iter().all(|ms| *ms == 2500));
        assert!(session.scripts.iter().all(|s| s == SCROLL_TO_BOTTOM_JS));
    }

    #[tokio::test]
    async fn test_run_fixed_steps() {
        let policy = ScrollPolicy {
            mode: ScrollMode::FixedSteps {
                steps: 4,
                step_px: 1000,
            },
            settle_delay_ms: 1000,
            ..ScrollPolicy::default()
        };
        let mut session = HeightScript::new(vec![800]);
        let outcome = ScrollController::new(policy, "li")
            .run(&mut session)
            .await
            .unwrap();

        assert_eq!(outcome.state, ScrollState::Exhausted);
        assert_eq!(outcome.ticks, 4);
        assert_eq!(
            session.scripts,
            vec![
                "window.scrollTo(0, 1000)",
                "window.scrollTo(0, 2000)",
                "window.scrollTo(0, 3000)",
                "window.scrollTo(0, 4000)",
            ]
        );
    }

    #[tokio::test]
    async fn test_run_rejects_non_numeric_height() {
        struct NoHeight(HeightScript);

        #[async_trait]
        impl PageSession for NoHeight {
            async fn navigate(&mut self, url: &str, timeout_ms: u64) -> HarvestResult<()> {
                self.0.navigate(url, timeout_ms).await
            }
            async fn wait(&mut self, ms: u64) -> HarvestResult<()> {
                self.0.wait(ms).await
            }
            async fn evaluate_script(&mut self, _script: &str) -> HarvestResult<Value> {
                Ok(json!("tall"))
            }
            async fn query_all(
                &mut self,
                selector: &str,
            ) -> HarvestResult<Vec<Box<dyn NodeHandle>>> {
                self.0.query_all(selector).await
            }
            async fn query_single(
                &mut self,
                selector: &str,
            ) -> HarvestResult<Option<Box<dyn NodeHandle>>> {
                self.0.query_single(selector).await
            }
            async fn click(&mut self, selector: &str) -> HarvestResult<bool> {
                self.0.click(selector).await
            }
            async fn content(&mut self) -> HarvestResult<String> {
                self.0.content().await
            }
            async fn screenshot(&mut self, path: &str) -> HarvestResult<()> {
                self.0.screenshot(path).await
            }
            async fn close(self: Box<Self>) -> HarvestResult<()> {
                Ok(())
            }
        }

        let mut session = NoHeight(HeightScript::new(vec![0]));
        let err = ScrollController::new(ScrollPolicy::default(), "li")
            .run(&mut session)
            .await
            .unwrap_err();
        assert!(matches!(err, HarvestError::Script(_)));
    }
}
