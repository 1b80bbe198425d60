//! Signed, wrap-aware sequence-number arithmetic (§9 design notes). All
//! comparisons between transport sequence numbers MUST go through here
//! instead of unsigned comparison, so a wraparound at `i32::MAX` is handled
//! the same way everywhere in the tracker.

/// `a - b`, wrapping, interpreted as a signed offset in sequence space.
#[inline]
pub fn offset(a: i32, b: i32) -> i32 {
    a.wrapping_sub(b)
}

/// `true` if `a` is strictly before `b` in sequence space.
#[inline]
pub fn before(a: i32, b: i32) -> bool {
    offset(a, b) < 0
}

/// The base sequence of the block containing `seq`, given the tracker's
/// reference point `origin` and block size `n` (§3: `base = isn + ((s-isn)/n)*n`).
#[inline]
pub fn block_base(seq: i32, origin: i32, n: i32) -> i32 {
    let delta = offset(seq, origin);
    let block_index = delta.div_euclid(n);
    origin.wrapping_add(block_index.wrapping_mul(n))
}

/// Index of `seq` within its block, given the block's base.
#[inline]
pub fn index_in_block(seq: i32, base: i32, n: i32) -> usize {
    offset(seq, base).rem_euclid(n) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn before_handles_wraparound() {
        assert!(before(i32::MAX, i32::MIN));
        assert!(!before(i32::MIN, i32::MAX));
    }

    #[test]
    fn block_base_and_index_round_trip() {
        let origin = 1000;
        let n = 6;
        for s in 1000..1030 {
            let base = block_base(s, origin, n);
            let idx = index_in_block(s, base, n);
            assert_eq!(base + idx as i32, s);
            assert!(idx < n as usize);
        }
    }

    #[test]
    fn block_base_is_contiguous() {
        let origin = 0;
        let n = 4;
        assert_eq!(block_base(0, origin, n), 0);
        assert_eq!(block_base(3, origin, n), 0);
        assert_eq!(block_base(4, origin, n), 4);
        assert_eq!(block_base(7, origin, n), 4);
        assert_eq!(block_base(8, origin, n), 8);
    }

    #[test]
    fn block_base_near_i32_wraparound() {
        let origin = i32::MAX - 1;
        let n = 4;
        let s = origin.wrapping_add(5);
        let base = block_base(s, origin, n);
        let idx = index_in_block(s, base, n);
        assert_eq!(base.wrapping_add(idx as i32), s);
    }
}
