//! Numeric utilities: centralized integer conversions for log and metrics fields.
//!
//! Saturating conversions are used where clamping is acceptable (durations and counts
//! written to logs); lossless widening goes through a named helper so call sites stay
//! searchable.

#[inline]
#[must_use]
pub fn usize_to_u64(v: usize) -> u64 {
    u64::try_from(v).unwrap_or(u64::MAX)
}

#[inline]
#[must_use]
pub fn u128_to_u64_saturating(v: u128) -> u64 {
    u64::try_from(v).unwrap_or(u64::MAX)
}
