// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! `unicodePwd` vendor encoding (§4.5): the plaintext wrapped in ASCII
//! double quotes, the whole quoted string encoded as UTF-16LE.

/// Encodes `plaintext` the way Active Directory requires for `unicodePwd`:
/// wrap in `"`, then UTF-16LE (one null byte per ASCII char for the common
/// case of an ASCII password; non-ASCII code points still encode correctly
/// as UTF-16LE, just wider).
pub fn encode_unicode_pwd(plaintext: &str) -> Vec<u8> {
    let quoted: String = format!("\"{plaintext}\"");
    let mut out = Vec::with_capacity(quoted.len() * 2);
    for unit in quoted.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_engineer_per_spec_vector() {
        let encoded = encode_unicode_pwd("engineer");
        let expected = [
            0x22, 0x00, 0x65, 0x00, 0x6E, 0x00, 0x67, 0x00, 0x69, 0x00, 0x6E, 0x00, 0x65, 0x00,
            0x65, 0x00, 0x72, 0x00, 0x22, 0x00,
        ];
        assert_eq!(encoded, expected);
    }

    #[test]
    fn empty_password_still_wraps_in_quotes() {
        let encoded = encode_unicode_pwd("");
        assert_eq!(encoded, vec![0x22, 0x00, 0x22, 0x00]);
    }
}
