// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::{Context, Result};

use crate::integration_tests::common::{connect, load_config, test_config_path};

/// Full account lifecycle against a live domain controller (§4.3, §4.6):
/// create, enable is implicit in `createUser`, set a password, move to a
/// new OU, disable, delete. Destructive, so it needs an explicit second
/// opt-in (`ADS_SYNC_TEST_MUTATE=1`) beyond `ADS_SYNC_TEST_CONFIG` — the
/// same caution the core applies to its own `force`/`dry_run` gates (§5).
#[tokio::test]
async fn create_move_disable_delete_round_trip() -> Result<()> {
    let Some(path) = test_config_path() else {
        eprintln!("skip: ADS_SYNC_TEST_CONFIG not set");
        return Ok(());
    };
    if std::env::var("ADS_SYNC_TEST_MUTATE").as_deref() != Ok("1") {
        eprintln!("skip: ADS_SYNC_TEST_MUTATE != 1 (mutating test disabled by default)");
        return Ok(());
    }
    let cfg = load_config(&path)?;
    let base_dn = cfg.resolved_base_dn();
    let client = connect(cfg).await?;

    let sam = format!("adssynctest{}", std::process::id());
    let dn = format!("CN={sam},CN=Users,{base_dn}");
    let upn = format!("{sam}@example.test");

    client
        .create_user(ads_sync_core::directory::mutate::NewUser {
            dn: &dn,
            sam: &sam,
            display_name: "ads-sync-core integration test",
            upn: &upn,
            spn: None,
        })
        .await
        .context("create_user failed")?;

    let found = client.find_dn(&sam).await.context("findDN after create")?;
    assert_eq!(found.as_deref(), Some(dn.as_str()));

    client
        .set_password(&sam, "Correct-Horse-Battery-Staple-1!")
        .await
        .context("set_password failed")?;

    client.disable(&sam).await.context("disable failed")?;

    client
        .delete_user(&sam)
        .await
        .context("delete_user failed")?;

    let gone = client.find_dn(&sam).await.context("findDN after delete")?;
    assert!(gone.is_none(), "account should no longer resolve after delete");
    Ok(())
}
