use crate::error::Result;
use crate::session::PageSession;
use std::time::Duration;
use tracing::{debug, info};

/// CSS selector of one rendered listing tile.
pub const TILE_SELECTOR: &str = ".appx-tile.appx-tile-consultant";

/// In-page action that asks the directory for its next batch.
pub const LOAD_MORE_SCRIPT: &str = "loadMoreListingsJS();";

/// Budgets for the load-more loop
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    pub max_rounds: usize,
    pub max_polls: usize,
    pub poll_interval: Duration,
    pub tile_selector: String,
    pub load_more_script: String,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            max_rounds: 20,
            max_polls: 20,
            poll_interval: Duration::from_millis(500),
            tile_selector: TILE_SELECTOR.to_string(),
            load_more_script: LOAD_MORE_SCRIPT.to_string(),
        }
    }
}

/// Why the loop stopped. None of these is a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationOutcome {
    /// The page refused the load-more action.
    Exhausted { rounds: usize },
    /// A trigger produced no new tiles within the poll budget.
    Converged { rounds: usize },
    /// Every round grew the list; stopped at the cap.
    IterationCap { rounds: usize },
}

impl PaginationOutcome {
    pub fn rounds(&self) -> usize {
        match *self {
            PaginationOutcome::Exhausted { rounds }
            | PaginationOutcome::Converged { rounds }
            | PaginationOutcome::IterationCap { rounds } => rounds,
        }
    }
}

/// Trigger "load more" until the rendered tile count stops growing.
///
/// Only the count read at the top of a round is allowed to fail the call.
/// Reads while polling that fail count as "no growth yet".
pub async fn load_all_listings<S: PageSession>(
    session: &mut S,
    config: &PaginationConfig,
) -> Result<PaginationOutcome> {
    for round in 1..=config.max_rounds {
        let initial_count = session.evaluate_count(&config.tile_selector).await?;
        info!(
            "[{}] {} tiles rendered, triggering load more",
            round, initial_count
        );

        if let Err(e) = session.evaluate_trigger(&config.load_more_script).await {
            info!("Load more unavailable, assuming all listings are loaded ({})", e);
            return Ok(PaginationOutcome::Exhausted { rounds: round });
        }

        if !wait_for_growth(session, config, initial_count).await {
            info!("Tile count stayed at {}, pagination converged", initial_count);
            return Ok(PaginationOutcome::Converged { rounds: round });
        }
    }

    info!("Stopped after {} load-more rounds", config.max_rounds);
    Ok(PaginationOutcome::IterationCap {
        rounds: config.max_rounds,
    })
}

async fn wait_for_growth<S: PageSession>(
    session: &mut S,
    config: &PaginationConfig,
    initial_count: usize,
) -> bool {
    for poll in 1..=config.max_polls {
        session.sleep(config.poll_interval).await;
        match session.evaluate_count(&config.tile_selector).await {
            Ok(count) if count > initial_count => {
                debug!("Grew to {} tiles after {} polls", count, poll);
                return true;
            }
            Ok(_) => {}
            Err(e) => debug!("Count read failed during poll {}: {}", poll, e),
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanError;
    use std::collections::VecDeque;

    /// Scripted page: each trigger appends a batch of tiles until the batches run out.
    struct FakePage {
        rendered: usize,
        pending: VecDeque<usize>,
        refuse_trigger_after: Option<usize>,
        fail_first_count: bool,
        failing_poll_reads: usize,
        triggers: usize,
        count_reads: usize,
        sleeps: Vec<Duration>,
    }

    impl FakePage {
        fn new(rendered: usize, batches: &[usize]) -> Self {
            Self {
                rendered,
                pending: batches.iter().copied().collect(),
                refuse_trigger_after: None,
                fail_first_count: false,
                failing_poll_reads: 0,
                triggers: 0,
                count_reads: 0,
                sleeps: Vec::new(),
            }
        }
    }

    impl PageSession for FakePage {
        async fn navigate(&mut self, _url: &str) -> crate::Result<()> {
            Ok(())
        }

        async fn sleep(&mut self, duration: Duration) {
            self.sleeps.push(duration);
        }

        async fn evaluate_count(&mut self, selector: &str) -> crate::Result<usize> {
            assert_eq!(selector, TILE_SELECTOR);
            self.count_reads += 1;
            if self.fail_first_count {
                return Err(ScanError::ScriptError("page crashed".to_string()));
            }
            // Only reads made while polling can fail.
            if self.failing_poll_reads > 0 && self.triggers > 0 && !self.sleeps.is_empty() {
                self.failing_poll_reads -= 1;
                return Err(ScanError::ScriptError("detached".to_string()));
            }
            Ok(self.rendered)
        }

        async fn evaluate_trigger(&mut self, script: &str) -> crate::Result<()> {
            assert_eq!(script, LOAD_MORE_SCRIPT);
            if let Some(limit) = self.refuse_trigger_after
                && self.triggers >= limit
            {
                return Err(ScanError::ScriptError(
                    "loadMoreListingsJS is not defined".to_string(),
                ));
            }
            self.triggers += 1;
            if let Some(batch) = self.pending.pop_front() {
                self.rendered += batch;
            }
            Ok(())
        }

        async fn read_content(&mut self, _selector: &str) -> crate::Result<String> {
            Ok(String::new())
        }
    }

    fn small_config() -> PaginationConfig {
        PaginationConfig {
            max_rounds: 5,
            max_polls: 4,
            poll_interval: Duration::from_millis(500),
            ..PaginationConfig::default()
        }
    }

    #[test]
    fn test_default_budgets() {
        let config = PaginationConfig::default();
        assert_eq!(config.max_rounds, 20);
        assert_eq!(config.max_polls, 20);
        assert_eq!(config.poll_interval, Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_converges_when_count_never_grows() {
        let mut page = FakePage::new(30, &[]);
        let config = small_config();

        let outcome = load_all_listings(&mut page, &config).await.unwrap();

        assert_eq!(outcome, PaginationOutcome::Converged { rounds: 1 });
        assert_eq!(page.triggers, 1);
        assert_eq!(page.sleeps.len(), config.max_polls);
        assert!(page.sleeps.iter().all(|d| *d == config.poll_interval));
        // One opening read plus one per poll.
        assert_eq!(page.count_reads, 1 + config.max_polls);
    }

    #[tokio::test]
    async fn test_stops_after_batches_run_out() {
        let mut page = FakePage::new(30, &[10, 10]);
        let config = small_config();

        let outcome = load_all_listings(&mut page, &config).await.unwrap();

        assert_eq!(outcome, PaginationOutcome::Converged { rounds: 3 });
        assert_eq!(page.rendered, 50);
        assert_eq!(page.triggers, 3);
        // Growth is seen on the first poll of the two productive rounds.
        assert_eq!(page.sleeps.len(), 1 + 1 + config.max_polls);
    }

    #[tokio::test]
    async fn test_refused_trigger_is_exhaustion() {
        let mut page = FakePage::new(30, &[10, 10, 10]);
        page.refuse_trigger_after = Some(1);

        let outcome = load_all_listings(&mut page, &small_config())
            .await
            .unwrap();

        assert_eq!(outcome, PaginationOutcome::Exhausted { rounds: 2 });
        assert_eq!(page.rendered, 40);
        assert_eq!(page.sleeps.len(), 1);
    }

    #[tokio::test]
    async fn test_iteration_cap_while_still_growing() {
        let mut page = FakePage::new(0, &[5; 50]);
        let config = small_config();

        let outcome = load_all_listings(&mut page, &config).await.unwrap();

        assert_eq!(
            outcome,
            PaginationOutcome::IterationCap {
                rounds: config.max_rounds
            }
        );
        assert_eq!(outcome.rounds(), config.max_rounds);
        assert_eq!(page.triggers, config.max_rounds);
        assert_eq!(page.rendered, 5 * config.max_rounds);
    }

    #[tokio::test]
    async fn test_opening_count_failure_is_returned() {
        let mut page = FakePage::new(30, &[10]);
        page.fail_first_count = true;

        let result = load_all_listings(&mut page, &small_config()).await;

        assert!(matches!(result, Err(ScanError::ScriptError(_))));
        assert_eq!(page.triggers, 0);
    }

    #[tokio::test]
    async fn test_failed_poll_reads_do_not_end_the_wait() {
        let mut page = FakePage::new(30, &[10]);
        page.failing_poll_reads = 2;
        let config = small_config();

        let outcome = load_all_listings(&mut page, &config).await.unwrap();

        assert_eq!(outcome, PaginationOutcome::Converged { rounds: 2 });
        assert_eq!(page.rendered, 40);
        // Two failed polls then growth in round one, full budget in round two.
        assert_eq!(page.sleeps.len(), 3 + config.max_polls);
    }

    #[tokio::test]
    async fn test_full_budget_is_bounded() {
        let mut page = FakePage::new(0, &[]);
        let config = PaginationConfig::default();

        let outcome = load_all_listings(&mut page, &config).await.unwrap();

        assert!(matches!(outcome, PaginationOutcome::Converged { .. }));
        assert!(page.sleeps.len() <= config.max_rounds * config.max_polls);
    }
}
