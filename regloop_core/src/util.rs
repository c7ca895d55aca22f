//! Small timing and comparison helpers.

/// Whether `interval_ms` has passed between `since_ms` and `now_ms`.
/// A `since_ms` ahead of `now_ms` counts as zero elapsed.
#[inline]
pub fn due(now_ms: u64, since_ms: u64, interval_ms: u64) -> bool {
    now_ms.saturating_sub(since_ms) >= interval_ms
}

/// Whether `a` and `b` differ by strictly more than `tol`.
/// NaN never differs.
#[inline]
pub fn moved(a: f32, b: f32, tol: f32) -> bool {
    (a - b).abs() > tol
}
