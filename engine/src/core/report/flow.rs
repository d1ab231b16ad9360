//! Transition flow scoring
//!
//! Rates how naturally consecutive maneuvers link together.

use crate::core::analysis::SurfAction;
use crate::core::round1;

pub const FLOW_BASE: f64 = 8.0;
pub const NATURAL_BONUS: f64 = 0.1;
pub const UNNATURAL_PENALTY: f64 = 0.2;

/// Whether `from -> to` is a natural maneuver sequence.
pub fn is_natural_transition(from: SurfAction, to: SurfAction) -> bool {
    use SurfAction::*;
    matches!(
        (from, to),
        (Takeoff, Glide | Accelerate)
            | (Glide, Turn | Cutback | Accelerate)
            | (Turn, Glide | Cutback)
            | (Cutback, Glide | Turn)
            | (Accelerate, Glide | Turn)
    )
}

/// Flow score over a sequence of actions.
///
/// Pairs where either action is unknown, or both are the same, do not count.
/// The total is rounded to one decimal, then clamped to `[0, 10]`.
pub fn flow_score(actions: impl IntoIterator<Item = SurfAction>) -> f64 {
    let mut score = FLOW_BASE;
    let mut previous: Option<SurfAction> = None;

    for action in actions {
        if let Some(prev) = previous {
            if prev.is_known() && action.is_known() && prev != action {
                if is_natural_transition(prev, action) {
                    score += NATURAL_BONUS;
                } else {
                    score -= UNNATURAL_PENALTY;
                }
            }
        }
        previous = Some(action);
    }

    round1(score).clamp(0.0, 10.0)
}
