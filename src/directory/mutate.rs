// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Mutation primitives: create/delete/move/enable/disable/setAttributes
//! (§4.3, §4.6).

use std::collections::HashSet;

use ldap3::Mod;

use crate::{
    directory::{
        auth::AuditEvent,
        client::DirectoryClient,
        password::encode_unicode_pwd,
        uac::{self, apply_rmw},
    },
    error::{CoreError, CoreResult},
    util::{escape_rdn_value, generate_password},
};

/// Arguments for `createUser` (§4.3).
pub struct NewUser<'a> {
    pub dn: &'a str,
    pub sam: &'a str,
    pub display_name: &'a str,
    pub upn: &'a str,
    pub spn: Option<&'a str>,
}

/// Ordered attribute modification list, mirroring the source's
/// `[attr, value|[values…]]` ordering (§4.3: "`setAttributes` ... emits one
/// modify with the union of operations in the given order").
pub struct AttributeEdit<'a> {
    pub replace: Vec<(&'a str, Vec<&'a str>)>,
    pub add: Vec<(&'a str, Vec<&'a str>)>,
    pub delete: Vec<(&'a str, Vec<&'a str>)>,
}

impl<'a> AttributeEdit<'a> {
    pub fn is_empty(&self) -> bool {
        self.replace.is_empty() && self.add.is_empty() && self.delete.is_empty()
    }
}

impl DirectoryClient {
    /// `createUser{DN, SAM, DisplayName, UPN, SPN?}` (§4.3): add with
    /// `objectClass={top,person,organizationalPerson,user}`, a random
    /// 22-char password, `userAccountControl=0` (disabled); then `enable()`
    /// and set `NEVER_EXPIRES`, clear `PASSWD_NOTREQD`.
    pub async fn create_user(&self, user: NewUser<'_>) -> CoreResult<()> {
        let password = generate_password(22);
        let encoded_pwd = encode_unicode_pwd(&password);

        let object_class: HashSet<&str> =
            ["top", "person", "organizationalPerson", "user"].into_iter().collect();
        let mut attrs: Vec<(&str, HashSet<&str>)> = vec![
            ("objectClass", object_class),
            ("sAMAccountName", [user.sam].into_iter().collect()),
            ("displayName", [user.display_name].into_iter().collect()),
            ("userPrincipalName", [user.upn].into_iter().collect()),
            ("userAccountControl", ["0"].into_iter().collect()),
        ];
        if let Some(spn) = user.spn {
            attrs.push(("servicePrincipalName", [spn].into_iter().collect()));
        }

        let mut ldap = self.ldap.lock().await;
        let result = ldap
            .add(user.dn, attrs)
            .await
            .map_err(|e| CoreError::CreateFailed(e.to_string()))?
            .success();
        drop(ldap);
        result.map_err(|e| CoreError::CreateFailed(e.to_string()))?;

        self.set_password_bytes(user.sam, &encoded_pwd).await?;
        self.enable(user.sam).await?;
        self.modify_uac_bits(user.sam, uac::Uac::DONT_EXPIRE_PASSWORD.bits(), 0)
            .await?;

        self.emit_audit(AuditEvent {
            operation: "createUser",
            target: user.dn.to_string(),
            detail: format!("sam={}", user.sam),
            succeeded: true,
        });
        Ok(())
    }

    /// `createSecurityGroup{group, ou?}` (§4.3): `ou` defaults to
    /// `OU=NetGroups,<baseDN>` only when `group` matches `^ng-`; otherwise
    /// fails `NeedOU` (surfaced as `InvalidArgument`).
    pub async fn create_security_group(
        &self,
        group: &str,
        ou: Option<&str>,
    ) -> CoreResult<String> {
        let resolved_ou = match ou {
            Some(ou) => ou.to_string(),
            None if group.starts_with("ng-") => format!("OU=NetGroups,{}", self.base_dn()),
            None => {
                return Err(CoreError::InvalidArgument(format!(
                    "createSecurityGroup({group}): OU required unless name matches ^ng-"
                )));
            },
        };

        let dn = format!("CN={},{}", escape_rdn_value(group), resolved_ou);
        let object_class: HashSet<&str> = ["top", "group"].into_iter().collect();
        let attrs: Vec<(&str, HashSet<&str>)> = vec![
            ("objectClass", object_class),
            ("sAMAccountName", [group].into_iter().collect()),
            // 0x80000004, security-enabled domain-local (§6).
            ("groupType", ["-2147483640"].into_iter().collect()),
        ];

        let mut ldap = self.ldap.lock().await;
        let result = ldap
            .add(&dn, attrs)
            .await
            .map_err(|e| CoreError::CreateFailed(e.to_string()))?
            .success();
        drop(ldap);
        result.map_err(|e| CoreError::CreateFailed(e.to_string()))?;

        self.emit_audit(AuditEvent {
            operation: "createSecurityGroup",
            target: dn.clone(),
            detail: String::new(),
            succeeded: true,
        });
        Ok(dn)
    }

    /// `deleteUser(sam)` (§4.3): resolve DN then delete.
    pub async fn delete_user(&self, sam: &str) -> CoreResult<()> {
        let dn = self
            .find_dn(sam)
            .await?
            .ok_or_else(|| CoreError::NotFound(sam.to_string()))?;

        let mut ldap = self.ldap.lock().await;
        let result = ldap
            .delete(&dn)
            .await
            .map_err(|e| CoreError::DeleteFailed(e.to_string()))?
            .success();
        drop(ldap);
        result.map_err(|e| CoreError::DeleteFailed(e.to_string()))?;

        self.emit_audit(AuditEvent {
            operation: "deleteUser",
            target: dn,
            detail: String::new(),
            succeeded: true,
        });
        Ok(())
    }

    /// `setAttributes{userid, replace?, add?, delete?}` (§4.3): fails if all
    /// three are absent; emits one modify with the union of operations in
    /// the given order.
    pub async fn set_attributes(&self, userid: &str, edit: AttributeEdit<'_>) -> CoreResult<()> {
        if edit.is_empty() {
            return Err(CoreError::InvalidArgument(
                "setAttributes requires at least one of replace/add/delete".to_string(),
            ));
        }

        let dn = self
            .find_dn(userid)
            .await?
            .ok_or_else(|| CoreError::NotFound(userid.to_string()))?;

        let mut mods = Vec::with_capacity(edit.replace.len() + edit.add.len() + edit.delete.len());
        for (attr, values) in &edit.replace {
            mods.push(Mod::Replace(*attr, values.iter().copied().collect()));
        }
        for (attr, values) in &edit.add {
            mods.push(Mod::Add(*attr, values.iter().copied().collect()));
        }
        for (attr, values) in &edit.delete {
            mods.push(Mod::Delete(*attr, values.iter().copied().collect()));
        }

        let mut ldap = self.ldap.lock().await;
        let result = ldap
            .modify(&dn, mods)
            .await
            .map_err(|e| CoreError::ModifyFailed(e.to_string()))?
            .success();
        drop(ldap);
        result.map_err(|e| CoreError::ModifyFailed(e.to_string()))?;

        self.emit_audit(AuditEvent {
            operation: "setAttributes",
            target: dn,
            detail: String::new(),
            succeeded: true,
        });
        Ok(())
    }

    async fn set_password_bytes(&self, sam: &str, encoded: &[u8]) -> CoreResult<()> {
        let dn = self
            .find_dn(sam)
            .await?
            .ok_or_else(|| CoreError::NotFound(sam.to_string()))?;

        let values: HashSet<Vec<u8>> = [encoded.to_vec()].into_iter().collect();
        let mods = vec![Mod::Replace("unicodePwd", values)];

        let mut ldap = self.ldap.lock().await;
        let result = ldap
            .modify(&dn, mods)
            .await
            .map_err(|e| CoreError::ModifyFailed(e.to_string()))?
            .success();
        drop(ldap);
        result.map_err(|e| CoreError::ModifyFailed(e.to_string()))?;

        // After any password set, clear PASSWD_NOTREQD (§4.5).
        self.modify_uac_bits(sam, 0, uac::Uac::PASSWD_NOTREQD.bits())
            .await
    }

    /// `setPassword` (§2): public entry point for setting `unicodePwd` on an
    /// existing account to a caller-supplied plaintext.
    pub async fn set_password(&self, sam: &str, plaintext: &str) -> CoreResult<()> {
        let encoded = encode_unicode_pwd(plaintext);
        self.set_password_bytes(sam, &encoded).await
    }

    /// `moveUser{userid|dn, target}` (§4.3): fetches `cn`, escapes it for
    /// RDN use (§9: the source's doubled-backslash escape is corrected
    /// here, see `DESIGN.md`), then `modrdn(newrdn="cn=<cn>",
    /// newsuperior=target, deleteoldrdn=true)`.
    pub async fn move_user(&self, userid: &str, target: &str) -> CoreResult<()> {
        let dn = if userid.contains('=') {
            userid.to_string()
        } else {
            self.find_dn(userid)
                .await?
                .ok_or_else(|| CoreError::NotFound(userid.to_string()))?
        };

        let attrs = self
            .get_dn_attributes(&dn, Some(&["cn"]))
            .await?
            .ok_or_else(|| CoreError::NotFound(dn.clone()))?;
        let cn = attrs
            .get("cn")
            .and_then(|v| v.first())
            .ok_or_else(|| CoreError::MoveFailed(format!("{dn} has no cn")))?;

        let new_rdn = format!("cn={}", escape_rdn_value(cn));

        let mut ldap = self.ldap.lock().await;
        let result = ldap
            .modifydn(&dn, &new_rdn, true, Some(target))
            .await
            .map_err(|e| CoreError::MoveFailed(e.to_string()))?
            .success();
        drop(ldap);
        result.map_err(|e| CoreError::MoveFailed(e.to_string()))?;

        self.emit_audit(AuditEvent {
            operation: "moveUser",
            target: dn,
            detail: format!("new_superior={target}"),
            succeeded: true,
        });
        Ok(())
    }

    /// `enable(sam)` := `modifyUACBits(set=INITIALIZED, reset=DISABLED)` (§4.6).
    pub async fn enable(&self, sam: &str) -> CoreResult<()> {
        self.modify_uac_bits(
            sam,
            uac::Uac::NORMAL_ACCOUNT_INITIALIZED.bits(),
            uac::Uac::DISABLED.bits(),
        )
        .await
    }

    /// `disable(sam)` := `modifyUACBits(set=DISABLED)` (§4.6).
    pub async fn disable(&self, sam: &str) -> CoreResult<()> {
        self.modify_uac_bits(sam, uac::Uac::DISABLED.bits(), 0).await
    }

    /// `modifyUACBits(user, {set?, reset?})` (§4.6): read-modify-write with
    /// `reset` taking precedence over `set`.
    pub async fn modify_uac_bits(&self, sam: &str, set: u32, reset: u32) -> CoreResult<()> {
        let current_attrs = self
            .get_attributes(sam, Some(&["userAccountControl"]), None)
            .await?
            .ok_or_else(|| CoreError::NotFound(sam.to_string()))?;

        let current: u32 = current_attrs
            .get("useraccountcontrol")
            .and_then(|v| v.first())
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        let new_value = apply_rmw(current, set, reset);
        let new_value_str = new_value.to_string();

        self.set_attributes(
            sam,
            AttributeEdit {
                replace: vec![("userAccountControl", vec![new_value_str.as_str()])],
                add: vec![],
                delete: vec![],
            },
        )
        .await?;

        if self.debug() {
            tracing::debug!(sam, current, new_value, "modifyUACBits");
        }
        Ok(())
    }
}
