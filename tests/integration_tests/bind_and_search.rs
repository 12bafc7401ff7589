// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::{Context, Result};

use crate::integration_tests::common::{connect, load_config, test_config_path};

/// Binds against a live domain controller and resolves a known account's
/// DN (§4.1 bind-with-retry, §4.2 `findDN`). Needs `ADS_SYNC_TEST_CONFIG`
/// pointing at a YAML `DirectoryConfig` and `ADS_SYNC_TEST_PASSWORD`; skips
/// otherwise (no lab domain controller in this environment).
#[tokio::test]
async fn bind_and_find_dn() -> Result<()> {
    let Some(path) = test_config_path() else {
        eprintln!("skip: ADS_SYNC_TEST_CONFIG not set");
        return Ok(());
    };
    let cfg = load_config(&path)?;
    let probe_sam = std::env::var("ADS_SYNC_TEST_SAM").unwrap_or_else(|_| cfg.user.clone());

    let client = connect(cfg).await?;
    let dn = client.find_dn(&probe_sam).await.context("findDN failed")?;
    assert!(dn.is_some(), "expected {probe_sam} to resolve to a DN");
    Ok(())
}

/// Paged search over a broad filter exercises the `PagedResults` adapter
/// end to end (§4.4): every returned entry must carry the requested
/// attribute.
#[tokio::test]
async fn paged_search_returns_requested_attribute() -> Result<()> {
    let Some(path) = test_config_path() else {
        eprintln!("skip: ADS_SYNC_TEST_CONFIG not set");
        return Ok(());
    };
    let cfg = load_config(&path)?;
    let client = connect(cfg).await?;

    let entries = client
        .get_attributes_match("(objectClass=user)", Some(&["sAMAccountName"]), None, Some(5))
        .await
        .context("get_attributes_match failed")?;

    for entry in &entries {
        assert!(entry.contains_key("samaccountname"));
    }
    Ok(())
}
