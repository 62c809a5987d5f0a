//! Source selection policy.
//!
//! Pure functions over a [`SourceSet`]; all bookkeeping lives in the controller.

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::region::RegionHint;
use crate::source::{ContentSource, Slot, SourceSet};

/// Choose the slot to start playback from.
///
/// Priority order, first match wins:
/// 1. restricted region and a secondary source: secondary
/// 2. a primary source: primary
/// 3. a secondary source: secondary
/// 4. nothing playable: `None`
pub fn select_initial(sources: &SourceSet, hint: RegionHint) -> Option<Slot> {
    let slot = if hint.is_restricted() && sources.is_present(Slot::Secondary) {
        Some(Slot::Secondary)
    } else if sources.is_present(Slot::Primary) {
        Some(Slot::Primary)
    } else if sources.is_present(Slot::Secondary) {
        Some(Slot::Secondary)
    } else {
        None
    };

    debug!(hint = %hint, slot = ?slot, "Initial source selected");
    slot
}

/// The automatic failover target for `current`.
///
/// Returns the other slot when it holds a source that has not failed yet in
/// this session, otherwise `None`.
pub fn swap(
    sources: &SourceSet,
    current: Slot,
    attempted: &FxHashSet<ContentSource>,
) -> Option<Slot> {
    let target = current.other();
    sources
        .get(target)
        .filter(|source| !attempted.contains(*source))
        .map(|_| target)
}

/// The manual toggle target for `current`.
///
/// Same as [`swap`] but ignores failure history, so the viewer can always
/// switch back and forth while both slots exist.
pub fn toggle_target(sources: &SourceSet, current: Slot) -> Option<Slot> {
    let target = current.other();
    sources.is_present(target).then_some(target)
}
