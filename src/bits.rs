//! Bit-field helpers shared by the decoder and the instruction handlers.
//!
//! Every LC-3 operand is a contiguous run of bits inside the 16-bit
//! instruction word, and every offset or immediate is a two's-complement
//! field narrower than a word. These two functions cover both cases.

/// Extract bits `[low, high]` (inclusive) of `word`, right-justified.
///
/// Bounds are expected to satisfy `low <= high <= 15`. Inverted or
/// out-of-range bounds produce a meaningless value but never panic.
#[inline]
pub const fn extract_field(word: u16, high: u32, low: u32) -> u16 {
    // Clear everything above `high`, then drop everything below `low`.
    let mask = match 0xFFFFu16.checked_shr(15u32.saturating_sub(high)) {
        Some(mask) => mask,
        None => 0,
    };
    match (word & mask).checked_shr(low) {
        Some(field) => field,
        None => 0,
    }
}

/// Sign-extend the low `width` bits of `value` to a full 16-bit word.
///
/// Bits above `width` are ignored. A width of 16 or more returns the value
/// unchanged; a width of 0 has no significant bits and yields 0.
#[inline]
pub const fn sign_extend(value: u16, width: u32) -> u16 {
    if width == 0 {
        return 0;
    }
    if width >= 16 {
        return value;
    }
    let value = value & ((1u16 << width) - 1);
    if (value >> (width - 1)) & 1 == 1 {
        value | (0xFFFFu16 << width)
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_extract_field() {
        //  15 14 13 12 11 10  9  8  7  6  5  4  3  2  1  0
        //   1  1  1  1  1  0  1  0  1  1  0  0  1  1  1  0
        let word = 0b1111_1010_1100_1110;

        assert_eq!(extract_field(word, 15, 12), 0b1111);
        assert_eq!(extract_field(word, 9, 2), 0b1011_0011);
        assert_eq!(extract_field(word, 11, 5), 0b101_0110);
        assert_eq!(extract_field(word, 7, 7), 0b1);
        assert_eq!(extract_field(word, 15, 0), word);
    }

    #[test]
    fn test_extract_field_bad_bounds_do_not_panic() {
        let word = 0xBEEF;
        let _ = extract_field(word, 3, 9);
        let _ = extract_field(word, 20, 0);
        assert_eq!(extract_field(word, 15, 16), 0);
    }

    #[test]
    fn test_sign_extend() {
        assert_eq!(sign_extend(0b01111, 5), 0x000F);
        assert_eq!(sign_extend(0b11111, 5), 0xFFFF);
        assert_eq!(sign_extend(0b10000, 5), 0xFFF0);
        assert_eq!(sign_extend(0x1FF, 9), 0xFFFF);
        assert_eq!(sign_extend(0x100, 9), 0xFF00);
        assert_eq!(sign_extend(0x0FF, 9), 0x00FF);
        assert_eq!(sign_extend(0x400, 11), 0xFC00);
        assert_eq!(sign_extend(0x8000, 16), 0x8000);
    }

    #[test]
    fn test_sign_extend_ignores_high_bits() {
        // An opcode sitting above the field must not leak into the result.
        assert_eq!(sign_extend(0x1027, 5), 0x0007);
        assert_eq!(sign_extend(0xF03F, 6), 0xFFFF);
    }

    proptest! {
        #[test]
        fn prop_sign_extend_preserves_significant_bits(x in any::<u16>(), n in 1u32..=16) {
            let mask = if n == 16 { 0xFFFF } else { (1u16 << n) - 1 };
            prop_assert_eq!(sign_extend(x & mask, n) & mask, x & mask);
        }

        #[test]
        fn prop_sign_extend_matches_signed_widening(x in any::<u16>(), n in 1u32..16) {
            let field = x & ((1u16 << n) - 1);
            let shift = 16 - n;
            let expected = (((field << shift) as i16) >> shift) as u16;
            prop_assert_eq!(sign_extend(field, n), expected);
        }

        #[test]
        fn prop_extract_field_fits_width(x in any::<u16>(), lo in 0u32..16, span in 0u32..16) {
            let hi = (lo + span).min(15);
            let field = extract_field(x, hi, lo);
            prop_assert_eq!(field.checked_shr(hi - lo + 1).unwrap_or(0), 0);
        }
    }
}
