//! Low-level comparison helpers shared by the type behaviors and the index layer.

use std::cmp::Ordering;

/// Tolerance used by every float comparison
pub const EPSILON: f32 = 1E-6;

#[must_use]
pub fn compare_int(left: i32, right: i32) -> Ordering {
    left.cmp(&right)
}

/// Equal when the difference is within `EPSILON`
#[must_use]
pub fn compare_float(left: f32, right: f32) -> Ordering {
    let cmp = left - right;
    if cmp > EPSILON {
        Ordering::Greater
    } else if cmp < -EPSILON {
        Ordering::Less
    } else {
        Ordering::Equal
    }
}

/// `strncmp` over the common prefix; when the prefix matches the longer
/// buffer wins, even if the extra bytes follow a NUL.
#[must_use]
pub fn compare_string(left: &[u8], right: &[u8]) -> Ordering {
    let maxlen = left.len().min(right.len());
    for (l, r) in left[..maxlen].iter().zip(&right[..maxlen]) {
        match l.cmp(r) {
            Ordering::Equal if *l == 0 => break,
            Ordering::Equal => {}
            other => return other,
        }
    }
    left.len().cmp(&right.len())
}

/// Permissive numeric prefix scan: parses an optional sign, digits and one
/// decimal point, and stops at the first character that does not fit.
/// Never fails; a string without a numeric prefix yields `0.0`.
#[must_use]
pub fn str_to_float(text: &str) -> f32 {
    let bytes = text.trim_start().as_bytes();
    let (negative, digits) = match bytes.first() {
        Some(b'-') => (true, &bytes[1..]),
        Some(b'+') => (false, &bytes[1..]),
        _ => (false, bytes),
    };

    let mut value = 0.0f64;
    let mut entering_dot = false;
    let mut scale = 0.1f64;
    for &c in digits {
        if c.is_ascii_digit() {
            let digit = f64::from(c - b'0');
            if entering_dot {
                value += digit * scale;
                scale *= 0.1;
            } else {
                value = value * 10.0 + digit;
            }
        } else if c == b'.' && !entering_dot {
            entering_dot = true;
        } else {
            break;
        }
    }

    let value = value as f32;
    if negative { -value } else { value }
}

/// Integer flavour of the permissive scan, truncating toward zero
#[must_use]
pub fn str_to_int(text: &str) -> i32 {
    str_to_float(text) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_float_epsilon() {
        assert_eq!(compare_float(1.000_000_1, 1.0), Ordering::Equal);
        assert_eq!(compare_float(1.1, 1.0), Ordering::Greater);
        assert_eq!(compare_float(1.0, 1.1), Ordering::Less);
    }

    #[test]
    fn test_compare_int() {
        assert_eq!(compare_int(3, 2), Ordering::Greater);
        assert_eq!(compare_int(-1, -1), Ordering::Equal);
    }

    #[test]
    fn test_compare_string_longer_wins() {
        assert_eq!(compare_string(b"ab", b"ab\0c"), Ordering::Less);
        assert_eq!(compare_string(b"ab\0c", b"ab"), Ordering::Greater);
        assert_eq!(compare_string(b"abc", b"abd"), Ordering::Less);
        assert_eq!(compare_string(b"b", b"abc"), Ordering::Greater);
        assert_eq!(compare_string(b"ab", b"ab"), Ordering::Equal);
    }

    #[test]
    fn test_compare_string_stops_at_shared_nul() {
        // strncmp stops at the first NUL both sides share
        assert_eq!(compare_string(b"ab\0x", b"ab\0y"), Ordering::Equal);
    }

    #[test]
    fn test_str_to_float_prefix() {
        assert_eq!(compare_float(str_to_float("12.5abc"), 12.5), Ordering::Equal);
        assert_eq!(compare_float(str_to_float("3.1.4"), 3.1), Ordering::Equal);
        assert_eq!(compare_float(str_to_float("-7"), -7.0), Ordering::Equal);
        assert_eq!(compare_float(str_to_float("abc"), 0.0), Ordering::Equal);
        assert_eq!(str_to_int("42 apples"), 42);
        assert_eq!(str_to_int("9.99"), 9);
    }
}
