use core::time::Duration;
use std::path::PathBuf;

use fantoccini::{
    Client, Locator,
    error::{CmdError, ErrorStatus},
};
use serde_json::Value;

use crate::extract::{CSV_HEADER, Extractor};

const CARDS: Locator<'static> = Locator::Css(r#"div[data-testid="tweet"]"#);
const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";
const READ_OFFSET: &str = "return window.pageYOffset;";

// Heuristic lazy-load wait after each scroll, not a readiness check.
const SCROLL_PAUSE: Duration = Duration::from_secs(2);

pub struct Context {
    pub driver: Client,
    pub extractor: Extractor,
    pub output: PathBuf,
    pub scroll_limit: u32,
}

/// Consecutive-stall detector over observed scroll offsets. Infinite-scroll
/// feeds have no end signal; `limit` unchanged observations in a row stand in
/// for one. A slow network can stall the offset long enough to end a harvest
/// early.
#[derive(Debug)]
pub struct ScrollState {
    limit: u32,
    stalls: u32,
    last: Option<Value>,
}

impl ScrollState {
    #[must_use]
    pub const fn new(limit: u32) -> Self {
        Self {
            limit,
            stalls: 0,
            last: None,
        }
    }

    #[must_use]
    pub const fn exhausted(&self) -> bool {
        self.stalls >= self.limit
    }

    pub fn observe(&mut self, position: Value) {
        if self.last.as_ref() == Some(&position) {
            self.stalls += 1;
        } else {
            self.stalls = 0;
        }
        self.last = Some(position);
    }
}

/// The scroll-and-extract loop. Streams every complete card straight into the
/// output store; holds at most one record in memory. Returns the number of
/// rows appended.
pub async fn run(ctx: &Context) -> anyhow::Result<u64> {
    let mut state = ScrollState::new(ctx.scroll_limit);
    let mut saved = 0u64;
    let mut discarded = 0u64;
    let mut stale = 0u64;

    while !state.exhausted() {
        let cards = ctx.driver.find_all(CARDS).await?;
        tracing::debug!(target: "harvest", "{} cards in view", cards.len());

        for card in cards {
            // The snapshot races against feed reflow; a card that vanished
            // between enumeration and read is skipped, not retried.
            let html = match card.html(false).await {
                Ok(html) => html,
                Err(e) if is_stale(&e) => {
                    stale += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let Some(tweet) = ctx.extractor.extract(&html) else {
                discarded += 1;
                continue;
            };
            tscr::store::append(&ctx.output, &CSV_HEADER, &tweet)?;
            saved += 1;
        }

        ctx.driver.execute(SCROLL_TO_BOTTOM, Vec::new()).await?;
        tokio::time::sleep(SCROLL_PAUSE).await;

        let position = ctx.driver.execute(READ_OFFSET, Vec::new()).await?;
        state.observe(position);
    }

    if stale > 0 {
        tracing::warn!(target: "harvest", "{stale} cards went stale mid-read and were skipped");
    }
    tracing::info!(
        target: "harvest",
        "\x1b[36mscraping complete, {saved} rows saved to {}\x1b[0m ({discarded} incomplete cards discarded)",
        ctx.output.display(),
    );
    Ok(saved)
}

fn is_stale(e: &CmdError) -> bool {
    matches!(e, CmdError::Standard(w) if matches!(w.error, ErrorStatus::StaleElementReference))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::ScrollState;

    #[test]
    fn first_observation_is_never_a_stall() {
        let mut state = ScrollState::new(1);
        state.observe(json!(0));
        assert!(!state.exhausted());
        state.observe(json!(0));
        assert!(state.exhausted());
    }

    #[test]
    fn movement_resets_the_stall_counter() {
        let mut state = ScrollState::new(2);
        state.observe(json!(100));
        state.observe(json!(100));
        assert!(!state.exhausted());
        state.observe(json!(250));
        assert!(!state.exhausted());
        state.observe(json!(250));
        state.observe(json!(250));
        assert!(state.exhausted());
    }

    #[test]
    fn stops_after_limit_consecutive_stalls() {
        // Page starts at offset 0, one scroll moves it to 100, then it stops
        // responding: exactly three scroll attempts with limit 2.
        let mut state = ScrollState::new(2);
        let mut attempts = 0;
        for position in [100, 100, 100] {
            assert!(!state.exhausted());
            attempts += 1;
            state.observe(json!(position));
        }
        assert!(state.exhausted());
        assert_eq!(attempts, 3);
    }

    #[test]
    fn zero_limit_is_exhausted_before_the_first_attempt() {
        let state = ScrollState::new(0);
        assert!(state.exhausted());
    }

    #[test]
    fn new_cards_without_movement_still_count_as_stalls() {
        // Content changing is irrelevant; only the offset feeds the detector.
        let mut state = ScrollState::new(3);
        state.observe(json!(480));
        for _ in 0..2 {
            state.observe(json!(480));
            assert!(!state.exhausted());
        }
        state.observe(json!(480));
        assert!(state.exhausted());
    }
}
