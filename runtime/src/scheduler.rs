//! Auto-play driver
//!
//! Keeps at most one delayed `go_to_next_step` pending. Every engine
//! transition calls [`reschedule`], which aborts the previous timer before
//! deciding whether a new one is due, so changes to the pointer, the steps,
//! the running/auto-play flags or the speed all invalidate stale timers.
//!
//! Timer tasks hold a weak engine handle: dropping the engine ends them.

use crate::engine::Engine;
use crate::state::{ExecutionState, PendingTimer};
use tokio::runtime::Handle;

pub(crate) fn reschedule(engine: &Engine, state: &mut ExecutionState) {
    state.cancel_timer();
    if !state.should_auto_advance() {
        return;
    }

    let Ok(runtime) = Handle::try_current() else {
        tracing::warn!("No tokio runtime on this thread; auto-play cannot schedule the next step");
        return;
    };

    let wait = state.current_step_wait();
    let id = state.next_timer_id();
    let step = state.current_step;
    let weak = engine.downgrade();

    tracing::debug!(step, timer = id, wait_ms = wait.as_millis() as u64, "Auto-advance scheduled");

    let task = runtime.spawn(async move {
        tokio::time::sleep(wait).await;
        let Some(engine) = weak.upgrade() else {
            return;
        };
        // Take ourselves out of the slot first; the advance below reschedules
        // and would otherwise abort this very task.
        if !engine.claim_timer(id) {
            return;
        }
        tracing::debug!(step, timer = id, "Auto-advance firing");
        engine.go_to_next_step().await;
    });

    state.pending_timer = Some(PendingTimer {
        id,
        handle: task.abort_handle(),
    });
}
