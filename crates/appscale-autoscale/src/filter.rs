//! Spike filter — debounces direction changes across cycles.

use tracing::trace;

use appscale_core::{Direction, SpikeFilterState};

/// Record `direction` for this cycle and report whether it may take effect.
///
/// A new direction resets the streak. The change is held back until the same
/// direction has been suppressed `threshold` times in a row; a threshold of
/// zero lets every change through.
pub fn admit(state: &mut SpikeFilterState, direction: Direction, threshold: u32) -> bool {
    if direction != state.last_direction {
        state.last_direction = direction;
        state.consecutive = 0;
    }

    if state.consecutive < threshold {
        state.consecutive += 1;
        trace!(
            direction = direction.signum(),
            consecutive = state.consecutive,
            threshold,
            "change held by spike filter"
        );
        return false;
    }

    true
}
