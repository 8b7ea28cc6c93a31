/// `value!`, computed recursively.
///
/// Products wrap modulo 2^32, so inputs above 12 return the truncated
/// two's-complement result instead of failing.
pub const fn factorial(value: u32) -> u32 {
    if value == 0 {
        1
    } else {
        value.wrapping_mul(factorial(value - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_case() {
        assert_eq!(factorial(0), 1);
    }

    #[test]
    fn test_switch_range() {
        let expected = [1, 1, 2, 6, 24, 120, 720, 5040];
        for (value, want) in expected.iter().enumerate() {
            assert_eq!(factorial(value as u32), *want, "{}!", value);
        }
    }

    #[test]
    fn test_largest_exact_value() {
        assert_eq!(factorial(12), 479_001_600);
    }

    #[test]
    fn test_overflow_wraps() {
        // 13! = 6_227_020_800, truncated to 32 bits.
        assert_eq!(factorial(13), (6_227_020_800u64 & 0xFFFF_FFFF) as u32);
        assert_eq!(factorial(13), 1_932_053_504);
    }
}
