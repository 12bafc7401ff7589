// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Pure decoders over bit-packed directory attributes (§4.7). None of these
//! touch the network; they take already-fetched octets/integers and return
//! text. Bit catalogues are kept as data (§9 "Design Notes"), not branches.

use crate::directory::uac::Uac;

/// One entry of a bit catalogue: a label emitted when the bit is set, and
/// one emitted when it is clear. An empty label means "emit nothing".
struct BitLabel {
    mask: u32,
    if_set: &'static str,
    if_clear: &'static str,
}

const UAC_CATALOGUE: &[BitLabel] = &[
    BitLabel { mask: 0x0001, if_set: "Logon Script", if_clear: "" },
    BitLabel { mask: 0x0002, if_set: "Disabled", if_clear: "" },
    BitLabel { mask: 0x0008, if_set: "Home Directory Required", if_clear: "" },
    BitLabel { mask: 0x0010, if_set: "Locked Out", if_clear: "" },
    BitLabel { mask: 0x0020, if_set: "Password Not Required", if_clear: "" },
    BitLabel { mask: 0x0040, if_set: "Cannot Change Password", if_clear: "" },
    BitLabel {
        mask: 0x0080,
        if_set: "Encrypted Text Password Allowed",
        if_clear: "",
    },
    BitLabel {
        mask: 0x0200,
        if_set: "Normal Account",
        if_clear: "",
    },
    BitLabel {
        mask: 0x1000,
        if_set: "Workstation Trust Account",
        if_clear: "",
    },
    BitLabel {
        mask: 0x2000,
        if_set: "Server Trust Account",
        if_clear: "",
    },
    BitLabel {
        mask: 0x10000,
        if_set: "Password Never Expires",
        if_clear: "",
    },
    BitLabel {
        mask: 0x40000,
        if_set: "Smartcard Required",
        if_clear: "",
    },
    BitLabel {
        mask: 0x80000,
        if_set: "Trusted For Delegation",
        if_clear: "",
    },
    BitLabel {
        mask: 0x200000,
        if_set: "DES Key Only",
        if_clear: "",
    },
    BitLabel {
        mask: 0x800000,
        if_set: "Password Expired",
        if_clear: "",
    },
];

const GROUP_TYPE_CATALOGUE: &[BitLabel] = &[
    BitLabel { mask: 0x0000_0001, if_set: "Global", if_clear: "" },
    BitLabel { mask: 0x0000_0002, if_set: "Domain Local", if_clear: "" },
    BitLabel { mask: 0x0000_0004, if_set: "Universal", if_clear: "" },
    BitLabel {
        mask: 0x8000_0000,
        if_set: "Security Enabled",
        if_clear: "Distribution Only",
    },
];

/// `parseUAC(uac)`: one label per set/clear bit in `UAC_CATALOGUE`, catalogue order.
pub fn parse_uac(uac: u32) -> Vec<&'static str> {
    decode_catalogue(uac, UAC_CATALOGUE)
}

/// `parseGroupType(gt)`: same shape as `parse_uac`, over the group-type bits.
/// `gt` is accepted as the raw (possibly negative, per §6 `0x80000004` ==
/// -2147483640) 32-bit pattern, so callers pass `groupType as u32`.
pub fn parse_group_type(gt: u32) -> Vec<&'static str> {
    decode_catalogue(gt, GROUP_TYPE_CATALOGUE)
}

fn decode_catalogue(value: u32, catalogue: &'static [BitLabel]) -> Vec<&'static str> {
    let mut out = Vec::with_capacity(catalogue.len());
    for entry in catalogue {
        let label = if value & entry.mask != 0 {
            entry.if_set
        } else {
            entry.if_clear
        };
        if !label.is_empty() {
            out.push(label);
        }
    }
    out
}

/// `parseAccountType(val)`: fixed lookup table, default `"Unknown"` (§4.7).
pub fn parse_account_type(val: u32) -> &'static str {
    match val {
        0x1000_0000 => "Security Global Group",
        0x1000_0001 => "Distribution Global Group",
        0x2000_0000 => "Security Domain Local Group",
        0x2000_0001 => "Distribution Domain Local Group",
        0x3000_0000 => "Normal Account",
        0x3000_0001 => "Distribution Universal Group",
        0x3000_0002 => "Security Universal Group",
        0x3000_0004 => "Trust Account",
        0x3000_0005 => "Workstation Trust Account",
        0x3000_0006 => "Server Trust Account",
        _ => "Unknown",
    }
}

/// Decoded `protocolSettings` value for one of the three known schemas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolSettings {
    Pop3 { enabled: bool, login_name: Option<String> },
    Http { enabled: bool, mailbox_url: Option<String> },
    Imap4 { enabled: bool, login_name: Option<String> },
}

/// `parseProtocolSettings(blob)`: split on `0xC2 0xA7` (U+00A7 SECTION SIGN
/// in UTF-8); first field selects the schema, remaining fields are
/// schema-specific subfields (§4.7, test vectors §8).
pub fn parse_protocol_settings(blob: &[u8]) -> Option<ProtocolSettings> {
    const SEP: &[u8] = &[0xC2, 0xA7];
    let fields: Vec<&[u8]> = split_on(blob, SEP);
    let kind = fields.first()?;
    let as_str = |b: &[u8]| -> Option<String> {
        if b.is_empty() { None } else { Some(String::from_utf8_lossy(b).into_owned()) }
    };
    let enabled_of = |b: &[u8]| b == b"1";

    match *kind {
        b"POP3" => Some(ProtocolSettings::Pop3 {
            enabled: fields.get(1).is_some_and(|f| enabled_of(f)),
            login_name: fields.get(2).and_then(|f| as_str(f)),
        }),
        b"HTTP" => Some(ProtocolSettings::Http {
            enabled: fields.get(1).is_some_and(|f| enabled_of(f)),
            mailbox_url: fields.get(2).and_then(|f| as_str(f)),
        }),
        b"IMAP4" => Some(ProtocolSettings::Imap4 {
            enabled: fields.get(1).is_some_and(|f| enabled_of(f)),
            login_name: fields.get(2).and_then(|f| as_str(f)),
        }),
        _ => None,
    }
}

fn split_on<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut out = Vec::new();
    let mut rest = haystack;
    while let Some(pos) = rest
        .windows(needle.len().max(1))
        .position(|w| w == needle)
    {
        out.push(&rest[..pos]);
        rest = &rest[pos + needle.len()..];
    }
    out.push(rest);
    out
}

/// `hexSIDToText`: decode a binary SID given as a hex dump (whitespace and
/// any other non-hex characters stripped, case-insensitive) into
/// `S-rev-idAuth-sub0-...-subN-1` (§3).
pub fn hex_sid_to_text(hex_input: &str) -> anyhow::Result<String> {
    let cleaned: String = hex_input
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .collect();
    let bytes = hex::decode(&cleaned)?;
    sid_bytes_to_text(&bytes)
}

fn sid_bytes_to_text(bytes: &[u8]) -> anyhow::Result<String> {
    if bytes.len() < 8 {
        anyhow::bail!("SID blob too short: {} bytes", bytes.len());
    }
    let revision = bytes[0];
    let sub_auth_count = bytes[1] as usize;
    let mut id_auth: u64 = 0;
    for &b in &bytes[2..8] {
        id_auth = (id_auth << 8) | b as u64;
    }
    let expected_len = 8 + sub_auth_count * 4;
    if bytes.len() < expected_len {
        anyhow::bail!(
            "SID blob truncated: need {expected_len} bytes, have {}",
            bytes.len()
        );
    }

    let mut text = format!("S-{revision}-{id_auth}");
    for i in 0..sub_auth_count {
        let off = 8 + i * 4;
        let sub = u32::from_le_bytes(bytes[off..off + 4].try_into()?);
        text.push('-');
        text.push_str(&sub.to_string());
    }
    Ok(text)
}

/// `convertFiletime`: FILETIME (100ns ticks since 1601-01-01 UTC) to POSIX
/// seconds (§3). A 64-bit signed integer suffices for all realistic values
/// (§9 "Big-integer arithmetic").
pub const FILETIME_EPOCH_DELTA_SECS: i64 = 11_644_473_600;

pub fn convert_filetime(ticks: i64) -> i64 {
    ticks / 10_000_000 - FILETIME_EPOCH_DELTA_SECS
}

/// Inverse of [`convert_filetime`], used by the round-trip property test.
pub fn filetime_from_posix_secs(secs: i64) -> i64 {
    (secs + FILETIME_EPOCH_DELTA_SECS) * 10_000_000
}

pub fn uac_flags(uac: u32) -> Uac {
    Uac::from_bits_truncate(uac)
}
