//! Safe refresh interval arithmetic.

/// Lower bound for any computed refresh interval (seconds).
pub const MIN_REFRESH_SECONDS: u64 = 900;

/// Interval after which a player must re-fetch its descriptor.
///
/// The longer of playlist duration and baseline refresh is the cycle
/// length. A cycle that would not outlast the floor (`cycle + 1 < 900`)
/// is floored to [`MIN_REFRESH_SECONDS`]; any other cycle is doubled to
/// absorb a playlist growing between fetches.
pub fn compute(duration_seconds: u64, refresh_seconds: u64) -> u64 {
    let cycle = refresh_seconds.max(duration_seconds);
    if cycle.saturating_add(1) < MIN_REFRESH_SECONDS {
        MIN_REFRESH_SECONDS
    } else {
        cycle.saturating_mul(2)
    }
}
