//! Two-page spread arithmetic.
//!
//! Pure functions over a [`PagingContext`]. The first and last canvases are
//! always shown alone (covers); every other canvas pairs with its neighbour by
//! a fixed odd/even rule, and right-to-left reading reverses each pair.
//!
//! Spread membership does not depend on whether paging is in effect; only the
//! prev/next stepping does. Indices outside `[0, total - 1]` have no spread and
//! step to [`NO_CANVAS`].

use crate::model::{CanvasIndex, ViewingDirection, NO_CANVAS};

/// Inputs the paging rules depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingContext {
    /// Number of canvases in the active sequence.
    pub total: usize,
    /// Reading order.
    pub direction: ViewingDirection,
    /// Whether spreads are in effect (declared paged and enabled in settings).
    pub paged: bool,
}

impl PagingContext {
    fn last(self) -> CanvasIndex {
        CanvasIndex::try_from(self.total).map_or(CanvasIndex::MAX, |t| t - 1)
    }

    fn contains(self, index: CanvasIndex) -> bool {
        (0..=self.last()).contains(&index)
    }

    fn is_rtl(self) -> bool {
        self.direction == ViewingDirection::RightToLeft
    }
}

/// Whether `index` is the first canvas.
#[must_use]
pub fn is_first_canvas(index: CanvasIndex) -> bool {
    index == 0
}

/// Whether `index` is the last canvas.
#[must_use]
pub fn is_last_canvas(index: CanvasIndex, ctx: PagingContext) -> bool {
    index == ctx.last()
}

/// Always `0`.
#[must_use]
pub fn first_page_index() -> CanvasIndex {
    0
}

/// Always `total - 1` (so `-1` for an empty sequence).
#[must_use]
pub fn last_page_index(ctx: PagingContext) -> CanvasIndex {
    ctx.last()
}

/// Canvas indices displayed together with `index`, in visual order.
///
/// Empty when `index` is outside the sequence.
#[must_use]
pub fn paged_indices(index: CanvasIndex, ctx: PagingContext) -> Vec<CanvasIndex> {
    if !ctx.contains(index) {
        return Vec::new();
    }
    if is_first_canvas(index) || is_last_canvas(index, ctx) {
        return vec![index];
    }

    let mut spread = if index % 2 == 1 {
        vec![index, index + 1]
    } else {
        vec![index - 1, index]
    };

    if ctx.is_rtl() {
        spread.reverse();
    }
    spread
}

/// Index to show when stepping back from `index`.
///
/// May be negative when stepping back from the first canvas; callers guard
/// with [`is_first_canvas`]. [`NO_CANVAS`] for an index outside the sequence.
#[must_use]
pub fn prev_page_index(index: CanvasIndex, ctx: PagingContext) -> CanvasIndex {
    if !ctx.contains(index) {
        return NO_CANVAS;
    }
    if !ctx.paged {
        return index - 1;
    }

    let spread = paged_indices(index, ctx);
    let boundary = if ctx.is_rtl() {
        spread.last()
    } else {
        spread.first()
    };
    boundary.copied().unwrap_or(index) - 1
}

/// Index to show when stepping forward from `index`, or [`NO_CANVAS`] past the
/// last canvas or for an index outside the sequence.
#[must_use]
pub fn next_page_index(index: CanvasIndex, ctx: PagingContext) -> CanvasIndex {
    if !ctx.contains(index) {
        return NO_CANVAS;
    }
    let next = if ctx.paged {
        let spread = paged_indices(index, ctx);
        let boundary = if ctx.is_rtl() {
            spread.first()
        } else {
            spread.last()
        };
        boundary.copied().unwrap_or(index) + 1
    } else {
        index + 1
    };

    if next > ctx.last() {
        NO_CANVAS
    } else {
        next
    }
}
