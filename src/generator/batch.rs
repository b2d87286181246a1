//! Sequential batch generation
//!
//! Requests in a batch never overlap. Remote batches pause between requests
//! to stay under the service's rate limit; offline batches never pause.

use crate::core::error::Result;
use crate::core::types::{Generated, Mode};
use std::time::Duration;

/// Largest number of items one batch may request
pub const MAX_BATCH_SIZE: u16 = 50;

/// Something that can wait between remote requests
pub trait Pause {
    fn pause(&mut self, duration: Duration);
}

/// Blocks the calling thread
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleep;

impl Pause for ThreadSleep {
    fn pause(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Parameters shared by every item of a batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchPlan {
    pub mode: Mode,
    pub count: usize,
    pub delay: Duration,
}

impl BatchPlan {
    /// Whether a pause follows item `index`
    pub fn pauses_after(&self, index: usize) -> bool {
        self.mode == Mode::Remote && index + 1 < self.count
    }
}

/// Run `generate_one` `plan.count` times in order.
///
/// `on_progress` sees every outcome as soon as it is produced; the full list
/// is returned at the end.
pub fn run_batch<G, P, F>(
    plan: BatchPlan,
    mut generate_one: G,
    pause: &mut P,
    mut on_progress: F,
) -> Vec<Result<Generated>>
where
    G: FnMut() -> Result<Generated>,
    P: Pause + ?Sized,
    F: FnMut(usize, &Result<Generated>),
{
    let mut outcomes = Vec::with_capacity(plan.count);
    for index in 0..plan.count {
        let outcome = generate_one();
        if let Err(e) = &outcome {
            tracing::warn!("Batch item {} failed: {}", index + 1, e);
        }
        on_progress(index, &outcome);
        outcomes.push(outcome);

        if plan.pauses_after(index) {
            pause.pause(plan.delay);
        }
    }
    tracing::info!("Batch of {} finished", plan.count);
    outcomes
}
