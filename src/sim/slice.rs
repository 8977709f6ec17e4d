//! The slicing rule
//!
//! One axis at a time: the previous block occupies
//! `[prev_center - extent/2, prev_center + extent/2]`, the dropped block has
//! the same extent centered at `position`. The overlap stays on the tower, the
//! rest falls off as debris.

use super::state::Footprint;

/// Result of dropping a block along its movement axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SliceResult {
    /// Within tolerance: snap to the previous center, nothing is cut
    Perfect,
    /// Partial overlap
    Partial {
        /// New committed center (previous center + offset/2)
        center: f32,
        /// Overlap length (extent - |offset|)
        extent: f32,
        /// Center of the cut-off piece, at the outer edge
        debris_center: f32,
        /// Length of the cut-off piece (|offset|)
        debris_extent: f32,
    },
    /// No overlap at all
    Miss,
}

/// Apply the slicing rule on one axis
///
/// A drop with no overlap is a miss whatever the tolerance.
pub fn slice(prev_center: f32, extent: f32, position: f32, tolerance: f32) -> SliceResult {
    let offset = position - prev_center;
    let cut = offset.abs();

    let remaining = extent - cut;
    if remaining <= 0.0 {
        return SliceResult::Miss;
    }

    if cut < tolerance {
        return SliceResult::Perfect;
    }

    let side = offset.signum();
    SliceResult::Partial {
        center: prev_center + offset / 2.0,
        extent: remaining,
        debris_center: prev_center + side * (extent + cut) / 2.0,
        debris_extent: cut,
    }
}

/// Perfect window for a block of `extent`
///
/// Never wider than the cut that would leave `min_extent`, so a snap can not
/// hide a sliver that is too thin to keep.
pub fn perfect_window(tolerance: f32, extent: f32, min_extent: f32) -> f32 {
    tolerance.min(extent - min_extent).max(0.0)
}

/// Growth bonus: scale both axes, capped per axis
pub fn grow(footprint: Footprint, multiplier: f32, max: Footprint) -> Footprint {
    Footprint {
        width: (footprint.width * multiplier).min(max.width),
        depth: (footprint.depth * multiplier).min(max.depth),
    }
}
