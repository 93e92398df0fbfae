//! Log-safe renderings of untrusted bytes.

/// Render bytes as ASCII, replacing anything non-printable with `*`.
///
/// Usernames come straight off the wire, so they are never written to the
/// log verbatim.
pub fn to_print_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '*'
            }
        })
        .collect()
}

/// Render key material as lowercase hex.
pub fn key_to_print_string(key: &[u8]) -> String {
    hex::encode(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masks_control_bytes() {
        assert_eq!(to_print_string(b"al\x00ce\n"), "al*ce*");
    }

    #[test]
    fn test_key_hex() {
        assert_eq!(key_to_print_string(&[0xab, 0x01]), "ab01");
    }
}
