// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! LDIF 1.0 export of a filtered subtree (§6): no line wrapping, default
//! filter `(distinguishedName=*)` over `baseDN`, progress printed every 50
//! entries.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::info;

use crate::{
    directory::client::DirectoryClient,
    error::{CoreError, CoreResult},
};

const PROGRESS_INTERVAL: u64 = 50;

impl DirectoryClient {
    /// Writes an LDIF 1.0 dump of every entry matching `filter` (default
    /// `(distinguishedName=*)`) under `base` (default the client's bound
    /// `baseDN`) to `writer`. Returns the number of entries written.
    pub async fn dump_ldif<W>(
        &self,
        writer: &mut W,
        filter: Option<&str>,
        base: Option<&str>,
    ) -> CoreResult<u64>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let filter = filter.unwrap_or("(distinguishedName=*)");
        let base = base.unwrap_or(self.base_dn()).to_string();

        let mut count: u64 = 0;
        let mut pending_lines: Vec<String> = Vec::new();

        self.get_attributes_match_cb(
            filter,
            |entry| {
                let dn = entry
                    .get("distinguishedname")
                    .and_then(|v| v.first())
                    .cloned()
                    .ok_or_else(|| {
                        CoreError::SearchFailed(
                            "entry missing distinguishedName; request it explicitly".to_string(),
                        )
                    })?;

                pending_lines.push(format!("dn: {dn}"));
                let mut names: Vec<&String> = entry.keys().filter(|k| *k != "distinguishedname").collect();
                names.sort();
                for name in names {
                    for value in &entry[name] {
                        pending_lines.push(ldif_attr_line(name, value));
                    }
                }
                pending_lines.push(String::new());

                count += 1;
                if count % PROGRESS_INTERVAL == 0 {
                    info!(count, "LDIF dump progress");
                }
                Ok(())
            },
            Some(&["*", "distinguishedName"]),
            Some(&base),
            None,
        )
        .await?;

        for line in pending_lines {
            writer
                .write_all(line.as_bytes())
                .await
                .map_err(|e| CoreError::DriverError(e.to_string()))?;
            writer
                .write_all(b"\n")
                .await
                .map_err(|e| CoreError::DriverError(e.to_string()))?;
        }
        writer
            .flush()
            .await
            .map_err(|e| CoreError::DriverError(e.to_string()))?;

        Ok(count)
    }
}

/// Formats one `attr: value` (or `attr:: base64` for values needing it) line
/// per RFC 2849. LDIF 1.0 with no wrapping: the whole value stays on one
/// line regardless of length.
fn ldif_attr_line(name: &str, value: &str) -> String {
    if needs_base64(value) {
        use base64::Engine as _;
        let encoded = base64::engine::general_purpose::STANDARD.encode(value.as_bytes());
        format!("{name}:: {encoded}")
    } else {
        format!("{name}: {value}")
    }
}

fn needs_base64(value: &str) -> bool {
    let Some(first) = value.as_bytes().first() else { return false };
    if matches!(first, b' ' | b':' | b'<') {
        return true;
    }
    value.bytes().any(|b| b == 0 || b == b'\n' || b == b'\r' || b >= 0x80)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_values_are_not_base64_encoded() {
        assert_eq!(ldif_attr_line("cn", "Jane Doe"), "cn: Jane Doe");
    }

    #[test]
    fn leading_colon_forces_base64() {
        let line = ldif_attr_line("description", ":weird");
        assert!(line.starts_with("description:: "));
    }
}
