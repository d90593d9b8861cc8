//! Base64 VLQ encoding used by the `mappings` field.

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const SHIFT: u32 = 5;
const MASK: u64 = (1 << SHIFT) - 1;
const CONTINUATION: u64 = 1 << SHIFT;

/// Appends the VLQ encoding of `value` to `out`.
///
/// The sign is stored in the lowest bit, then the magnitude is emitted in
/// 5-bit groups, least significant first.
pub(crate) fn encode(value: i64, out: &mut String) {
    let mut rest = if value < 0 {
        (value.unsigned_abs() << 1) | 1
    } else {
        value.unsigned_abs() << 1
    };

    loop {
        let mut digit = rest & MASK;
        rest >>= SHIFT;
        if rest > 0 {
            digit |= CONTINUATION;
        }
        out.push(ALPHABET[digit as usize] as char);
        if rest == 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enc(value: i64) -> String {
        let mut s = String::new();
        encode(value, &mut s);
        s
    }

    #[test]
    fn small_values() {
        assert_eq!(enc(0), "A");
        assert_eq!(enc(1), "C");
        assert_eq!(enc(-1), "D");
        assert_eq!(enc(6), "M");
        assert_eq!(enc(15), "e");
    }

    #[test]
    fn multi_digit_values() {
        assert_eq!(enc(16), "gB");
        assert_eq!(enc(-16), "hB");
        assert_eq!(enc(123), "2H");
        assert_eq!(enc(1000), "w+B");
    }
}
