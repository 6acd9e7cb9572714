//! Growth policy shared by every chunk buffer.
//!
//! Capacity starts at 0 and doubles, with a floor of 8, whenever the next
//! append would not fit. `Vec` already amortizes, but its factor is an
//! implementation detail; reserving explicitly pins the documented one.

/// Smallest non-zero capacity.
pub const MIN_CAPACITY: usize = 8;

/// Next capacity after `old` is exhausted.
pub const fn grow_capacity(old: usize) -> usize {
    if old < MIN_CAPACITY {
        MIN_CAPACITY
    } else {
        old.saturating_mul(2)
    }
}

/// Push `item`, growing `buf` by the documented policy first if it is full.
pub(crate) fn push_grow<T>(buf: &mut Vec<T>, item: T) {
    if buf.len() == buf.capacity() {
        let old = buf.capacity();
        let new = grow_capacity(old);
        buf.reserve_exact(new - buf.len());
        #[cfg(feature = "trace")]
        log::trace!("buffer grow {old} -> {}", buf.capacity());
    }
    buf.push(item);
}
