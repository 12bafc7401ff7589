// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use rand::Rng;

/// Characters used for generated account passwords. Wide enough to satisfy
/// typical AD complexity policy without relying on any one character class.
const PASSWORD_ALPHABET: &[u8] =
    b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz23456789!@#$%^&*";

/// Generates a random password of `len` characters (§4.3: `createUser` seeds
/// new accounts with a random 22-char password before `setPassword`).
pub fn generate_password(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| {
            let idx = rng.random_range(0..PASSWORD_ALPHABET.len());
            PASSWORD_ALPHABET[idx] as char
        })
        .collect()
}

/// Escapes a `cn` value for safe use inside an RDN (`cn=<value>`), per RFC
/// 4514: `,`, `+`, `"`, `\`, `<`, `>`, `;`, a leading space/`#`, and a
/// trailing space all require a single backslash escape.
///
/// `spec.md` §9 flags that the original source emitted a doubled backslash
/// (`\\,`) before the comma; this is corrected here (see `DESIGN.md`).
pub fn escape_rdn_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let chars: Vec<char> = value.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        let needs_escape = matches!(c, ',' | '+' | '"' | '\\' | '<' | '>' | ';')
            || (i == 0 && (c == ' ' || c == '#'))
            || (i == chars.len() - 1 && c == ' ');
        if needs_escape {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escapes a value for safe inclusion in an LDAP search filter per RFC 4515.
pub fn escape_filter_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '*' => out.push_str("\\2a"),
            '(' => out.push_str("\\28"),
            ')' => out.push_str("\\29"),
            '\\' => out.push_str("\\5c"),
            '\0' => out.push_str("\\00"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_has_requested_length_and_alphabet() {
        let pw = generate_password(22);
        assert_eq!(pw.chars().count(), 22);
        assert!(pw.bytes().all(|b| PASSWORD_ALPHABET.contains(&b)));
    }

    #[test]
    fn escape_rdn_value_escapes_comma_with_single_backslash() {
        assert_eq!(escape_rdn_value("Doe, Jane"), "Doe\\, Jane");
    }

    #[test]
    fn escape_rdn_value_escapes_leading_space_and_hash() {
        // Only the leading space needs escaping here: `#` is escaped solely
        // when it is itself the first character, and here it sits at index 1.
        assert_eq!(escape_rdn_value(" #tag"), "\\ #tag");
    }

    #[test]
    fn escape_rdn_value_escapes_leading_hash() {
        assert_eq!(escape_rdn_value("#tag"), "\\#tag");
    }

    #[test]
    fn escape_filter_value_escapes_metacharacters() {
        assert_eq!(escape_filter_value("a*b(c)"), "a\\2ab\\28c\\29");
    }
}
