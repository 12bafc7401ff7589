// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! `userAccountControl` bit constants and the composites `spec.md` §3 names.
//! Kept as `bitflags!` data, not branching code, so `decode::parse_uac` stays
//! a pure function over a table (Design Notes §9: "keep the bit catalogues
//! as data, not code").

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Uac: u32 {
        const SCRIPT                         = 0x0001;
        const DISABLED                       = 0x0002;
        const HOMEDIR_REQUIRED                = 0x0008;
        const LOCKOUT                         = 0x0010;
        const PASSWD_NOTREQD                  = 0x0020;
        const PASSWD_CANT_CHANGE              = 0x0040;
        const ENCRYPTED_TEXT_PWD_ALLOWED      = 0x0080;
        const TEMP_DUPLICATE_ACCOUNT          = 0x0100;
        const NORMAL_ACCOUNT_INITIALIZED      = 0x0200;
        const INTERDOMAIN_TRUST_ACCOUNT       = 0x0800;
        const WORKSTATION_TRUST_ACCOUNT       = 0x1000;
        const SERVER_TRUST_ACCOUNT            = 0x2000;
        const DONT_EXPIRE_PASSWORD            = 0x10000;
        const MNS_LOGON_ACCOUNT               = 0x20000;
        const SMARTCARD_REQUIRED              = 0x40000;
        const TRUSTED_FOR_DELEGATION          = 0x80000;
        const NOT_DELEGATED                   = 0x100000;
        const USE_DES_KEY_ONLY                = 0x200000;
        const DONT_REQUIRE_PREAUTH            = 0x400000;
        const PASSWORD_EXPIRED                = 0x800000;
        const TRUSTED_TO_AUTH_FOR_DELEGATION  = 0x1000000;
        const PARTIAL_SECRETS_ACCOUNT         = 0x4000000;
    }
}

/// `NORMAL = INITIALIZED|NEVER_EXPIRES` (§3).
pub const NORMAL: Uac =
    Uac::NORMAL_ACCOUNT_INITIALIZED.union(Uac::DONT_EXPIRE_PASSWORD);

/// `COMPUTER = NEVER_EXPIRES|WORKSTATION_TRUST|DES_ONLY|TRUSTED_FOR_DELEGATION` (§3).
pub const COMPUTER: Uac = Uac::DONT_EXPIRE_PASSWORD
    .union(Uac::WORKSTATION_TRUST_ACCOUNT)
    .union(Uac::USE_DES_KEY_ONLY)
    .union(Uac::TRUSTED_FOR_DELEGATION);

/// `UNIXHOST = NORMAL|TRUSTED_FOR_DELEGATION|DES_ONLY` (§3).
pub const UNIXHOST: Uac = Uac::NORMAL_ACCOUNT_INITIALIZED
    .union(Uac::DONT_EXPIRE_PASSWORD)
    .union(Uac::TRUSTED_FOR_DELEGATION)
    .union(Uac::USE_DES_KEY_ONLY);

/// Applies a read-modify-write to a raw UAC value: `(current | set) & !reset`
/// masked to 32 bits, reset taking precedence over set (§4.6, step 2).
pub fn apply_rmw(current: u32, set: u32, reset: u32) -> u32 {
    ((current | set) & !reset) & 0xFFFF_FFFF
}
