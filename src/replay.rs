//! Timed replay of the configured action sequence.
//!
//! The engine runs as a single logical task: key order and timing are the
//! whole point, so actions never overlap. It suspends only at the initial
//! delay, the per-action hold, and the per-action wait, and every suspension
//! is preemptible through a [`CancelToken`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use tokio::sync::Notify;
use tokio::time;

use crate::config::{KeyAction, ReplayConfig};
use crate::error::Result;
use crate::input::{InjectionFailure, InputSink};
use crate::key_map::{self, KeyCode};

/// Cooperative cancellation signal, cheap to clone and share across tasks.
///
/// Cancellation is polled at delay boundaries and before each action, never
/// mid-press: an action already in flight finishes its down/hold/up cycle so
/// no key is ever left in the down state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation and wake every pending [`cancelled`](Self::cancelled) wait.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once cancellation has been requested.
    pub async fn cancelled(&self) {
        use std::pin::pin;
        loop {
            let mut notified = pin!(self.inner.notify.notified());
            // Register the waiter before checking the flag so a concurrent
            // cancel() cannot slip between check and await.
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Sleep that returns early when cancellation fires.
async fn pause(ms: u64, cancel: &CancelToken) {
    if ms == 0 {
        return;
    }
    tokio::select! {
        _ = time::sleep(Duration::from_millis(ms)) => {}
        _ = cancel.cancelled() => {}
    }
}

/// Report a failed injection and move on. A single missed event is
/// recoverable by the next loop iteration; aborting a long unattended run
/// over it is not.
fn report(
    result: std::result::Result<(), InjectionFailure>,
    key: &str,
    code: KeyCode,
    direction: &'static str,
) {
    if let Err(failure) = result {
        tracing::warn!(
            key,
            vk = format_args!("{:#04x}", code.0),
            direction,
            %failure,
            "key event not delivered"
        );
    }
}

/// Executes the configured action sequence against an input sink, honoring
/// loop count, timing, and cancellation.
///
/// # Example
///
/// ```no_run
/// use key_press_replay::{CancelToken, NullSink, ReplayConfig, ReplayEngine};
///
/// # async fn demo() -> key_press_replay::Result<()> {
/// let config = ReplayConfig::from_file("config.json")?;
/// let engine = ReplayEngine::new(config);
/// let mut sink = NullSink;
/// engine.run(&mut sink, &CancelToken::new()).await?;
/// # Ok(())
/// # }
/// ```
pub struct ReplayEngine {
    config: ReplayConfig,
}

impl ReplayEngine {
    pub fn new(config: ReplayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// Run the replay until the loop count is exhausted or cancellation is
    /// requested, whichever comes first.
    ///
    /// A key resolution error aborts the run immediately; injection
    /// failures are logged and skipped.
    pub async fn run(&self, sink: &mut dyn InputSink, cancel: &CancelToken) -> Result<()> {
        println!(
            "Starting in {}ms, switch to the target window now...",
            self.config.initial_delay_ms
        );
        pause(self.config.initial_delay_ms, cancel).await;

        let infinite = self.config.loop_count <= 0;
        // u64 so an unattended infinite run can never overflow the counter
        let mut iteration: u64 = 0;

        while !cancel.is_cancelled() {
            iteration += 1;
            if !infinite && iteration > self.config.loop_count as u64 {
                break;
            }

            let label = if infinite {
                format!("Loop #{iteration} (infinite)")
            } else {
                format!("Loop {iteration}/{}", self.config.loop_count)
            };
            println!("\n--- {} ---", label.bold());

            for action in &self.config.actions {
                if cancel.is_cancelled() {
                    break;
                }

                self.press(action, sink, cancel).await?;
                println!(
                    "  Pressed: {} | Hold: {}ms | Wait: {}ms",
                    format!("{:<20}", action.key).green(),
                    action.hold_ms,
                    action.wait_after_ms
                );

                if action.wait_after_ms > 0 {
                    pause(action.wait_after_ms, cancel).await;
                }
            }
        }

        println!("\n{}", "Done.".bold());
        Ok(())
    }

    /// One press-and-release cycle: modifiers down in declared order, main
    /// key down, hold, main key up, modifiers up in reverse order. The
    /// reverse release mirrors human press nesting so applications tracking
    /// modifier state see balanced transitions.
    async fn press(
        &self,
        action: &KeyAction,
        sink: &mut dyn InputSink,
        cancel: &CancelToken,
    ) -> Result<()> {
        let parsed = key_map::parse(&action.key)?;

        for &modifier in &parsed.modifiers {
            report(sink.key_down(modifier), &action.key, modifier, "down");
        }
        report(sink.key_down(parsed.main_key), &action.key, parsed.main_key, "down");

        if action.hold_ms > 0 {
            // Even when cancellation fires mid-hold, fall through to the
            // releases: a key must never be left down on exit.
            pause(action.hold_ms, cancel).await;
        }

        report(sink.key_up(parsed.main_key), &action.key, parsed.main_key, "up");
        for &modifier in parsed.modifiers.iter().rev() {
            report(sink.key_up(modifier), &action.key, modifier, "up");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancel_token_flag() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
        // Already-cancelled tokens resolve immediately
        token.cancelled().await;
    }

    #[tokio::test]
    async fn test_cancel_token_wakes_waiter() {
        let token = CancelToken::new();
        let waiter = {
            let token = token.clone();
            tokio::spawn(async move { token.cancelled().await })
        };
        token.cancel();
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_pause_returns_early_on_cancel() {
        let token = CancelToken::new();
        token.cancel();
        let start = std::time::Instant::now();
        pause(60_000, &token).await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
