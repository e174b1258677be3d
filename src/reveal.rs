//! Timed driver for the typewriter effect.
//!
//! [`run_reveal`] calls `step` once immediately and then once per tick until
//! it reports [`RevealStep::Finished`] or [`RevealStep::Gone`]. Dropping the
//! future (e.g. when the owning view is unmounted) cancels it between ticks.

use crate::transcript::RevealStep;
use std::time::Duration;

pub const DEFAULT_TICK: Duration = Duration::from_millis(16);

#[cfg(not(target_arch = "wasm32"))]
pub async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await;
}

#[cfg(target_arch = "wasm32")]
pub async fn sleep(duration: Duration) {
    let millis = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
    gloo_timers::future::TimeoutFuture::new(millis).await;
}

pub async fn run_reveal<F>(tick: Duration, mut step: F) -> RevealStep
where
    F: FnMut() -> RevealStep,
{
    loop {
        match step() {
            RevealStep::Advanced => sleep(tick).await,
            done => return done,
        }
    }
}
