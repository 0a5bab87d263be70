//! Auto-schedule slot computation.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::Rng;
use std::time::Duration;

/// Pick the next provider-managed posting slot with bounded random jitter.
///
/// The slot lands at `base` from now, shifted up to `jitter` in either
/// direction so automated posting does not look metronomic.
pub fn next_auto_slot(base: Duration, jitter: Duration) -> DateTime<Utc> {
    let base_secs = base.as_secs() as i64;
    let jitter_secs = jitter.as_secs() as i64;

    let mut rng = rand::thread_rng();
    let offset = if jitter_secs > 0 {
        rng.gen_range(-jitter_secs..=jitter_secs)
    } else {
        0
    };

    Utc::now() + ChronoDuration::seconds((base_secs + offset).max(0))
}
