// Bit access into packed logic samples.
//
// Sample layout: channel N lives in bit `N % 8` of byte `N / 8`
// (LSB-first within each byte).

/// Read the logic level of absolute bit `index` from a packed sample.
///
/// Bits beyond the end of `sample` read as low.
#[inline]
pub fn get_bit(sample: &[u8], index: usize) -> bool {
    sample
        .get(index / 8)
        .is_some_and(|byte| byte & (1u8 << (index % 8)) != 0)
}

/// ASCII digit for a logic level, as written in VCD value lines.
#[inline]
pub fn level_char(level: bool) -> char {
    if level { '1' } else { '0' }
}

/// Number of bytes needed to hold `bits` packed channels.
#[inline]
pub fn bytes_for_bits(bits: usize) -> usize {
    bits.div_ceil(8)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lsb_first_within_byte() {
        let sample = [0b0000_0101u8];
        assert!(get_bit(&sample, 0));
        assert!(!get_bit(&sample, 1));
        assert!(get_bit(&sample, 2));
        assert!(!get_bit(&sample, 7));
    }

    #[test]
    fn crosses_byte_boundary() {
        let sample = [0x00, 0b1000_0001];
        assert!(!get_bit(&sample, 7));
        assert!(get_bit(&sample, 8));
        assert!(get_bit(&sample, 15));
        assert!(!get_bit(&sample, 9));
    }

    #[test]
    fn out_of_range_reads_low() {
        assert!(!get_bit(&[0xFF], 8));
        assert!(!get_bit(&[], 0));
    }

    #[test]
    fn byte_counts() {
        assert_eq!(bytes_for_bits(0), 0);
        assert_eq!(bytes_for_bits(1), 1);
        assert_eq!(bytes_for_bits(8), 1);
        assert_eq!(bytes_for_bits(9), 2);
        assert_eq!(bytes_for_bits(94), 12);
    }

    #[test]
    fn level_digits() {
        assert_eq!(level_char(true), '1');
        assert_eq!(level_char(false), '0');
    }
}
