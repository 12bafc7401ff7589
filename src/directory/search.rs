// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Search primitives, the paged-search cursor, and range retrieval
//! (§4.2, §4.4).

use std::collections::HashMap;

use ldap3::{Scope, SearchEntry, adapters::{EntriesOnly, PagedResults}};
use tracing::debug;

use crate::{
    directory::client::DirectoryClient,
    error::{CoreError, CoreResult},
    util::escape_filter_value,
};

/// One directory entry's attributes, name (case-insensitively, lower-cased
/// on the way in) mapped to its values (§3: "an ordered list of `(attrName,
/// [value,…])`").
pub type AttributeMap = HashMap<String, Vec<String>>;

fn normalize_attrs(entry: SearchEntry) -> AttributeMap {
    let mut out = AttributeMap::with_capacity(entry.attrs.len());
    for (name, values) in entry.attrs {
        out.insert(name.to_ascii_lowercase(), values);
    }
    out
}

impl DirectoryClient {
    /// `findDN(sam)` (§4.2): sub-scope filter over `sAMAccountName`, falling
    /// back to `userPrincipalName` when the first search is empty.
    pub async fn find_dn(&self, sam: &str) -> CoreResult<Option<String>> {
        let escaped = escape_filter_value(sam);
        let filter = format!("(|(sAMAccountName={escaped}))");
        if let Some(dn) = self
            .search_single_value(&filter, "distinguishedName", &self.base_dn)
            .await?
        {
            return Ok(Some(dn));
        }

        let upn_filter = format!(
            "(|(userPrincipalName={escaped}@{}))",
            escape_filter_value(self.domain())
        );
        self.search_single_value(&upn_filter, "distinguishedName", &self.base_dn)
            .await
    }

    /// `findHostDN(host)` (§4.2).
    pub async fn find_host_dn(&self, host: &str) -> CoreResult<Option<String>> {
        let filter = format!(
            "(|(servicePrincipalName=host/{}))",
            escape_filter_value(host)
        );
        self.search_single_value(&filter, "distinguishedName", &self.base_dn)
            .await
    }

    /// `findUPN(sam)` (§4.2): returns the lowercase `userPrincipalName`.
    pub async fn find_upn(&self, sam: &str) -> CoreResult<Option<String>> {
        let escaped = escape_filter_value(sam);
        let filter = format!("(|(sAMAccountName={escaped}))");
        let upn = self
            .search_single_value(&filter, "userPrincipalName", &self.base_dn)
            .await?;
        Ok(upn.map(|v| v.to_ascii_lowercase()))
    }

    async fn search_single_value(
        &self,
        filter: &str,
        attr: &str,
        base: &str,
    ) -> CoreResult<Option<String>> {
        let entries = self
            .get_attributes_match(filter, Some(&[attr]), Some(base), Some(1))
            .await?;
        Ok(entries
            .into_iter()
            .next()
            .and_then(|mut m| m.remove(&attr.to_ascii_lowercase()))
            .and_then(|mut v| if v.is_empty() { None } else { Some(v.remove(0)) }))
    }

    /// `getAttributes(sam, {attributes?, base?})` (§4.2): a single entry
    /// looked up by `sAMAccountName`; range-marked attributes are expanded
    /// transparently (§4.4).
    pub async fn get_attributes(
        &self,
        sam: &str,
        attributes: Option<&[&str]>,
        base: Option<&str>,
    ) -> CoreResult<Option<AttributeMap>> {
        let filter = format!("(|(sAMAccountName={}))", escape_filter_value(sam));
        let base = base.unwrap_or(&self.base_dn);
        let mut entries = self
            .get_attributes_match(&filter, attributes, Some(base), Some(1))
            .await?;
        Ok(if entries.is_empty() { None } else { Some(entries.remove(0)) })
    }

    /// `getDNAttributes(dn, {attributes?})` (§4.2): base-scope `(objectClass=*)`.
    pub async fn get_dn_attributes(
        &self,
        dn: &str,
        attributes: Option<&[&str]>,
    ) -> CoreResult<Option<AttributeMap>> {
        let attrs = attributes.map(|a| a.to_vec()).unwrap_or_default();
        let mut entries = self
            .run_search(dn, Scope::Base, "(objectClass=*)", &attrs, None)
            .await?;
        if entries.is_empty() {
            return Ok(None);
        }
        let mut entry = entries.remove(0);
        self.expand_ranged_attributes(dn, &mut entry).await?;
        Ok(Some(entry))
    }

    /// `getAttributesMatch(filter, {attributes?, base?, maxrecords?})`
    /// (§4.2): paged sub-scope search, materializing every matching entry.
    /// `maxrecords`, when strictly less than `pageSize`, caps the page size
    /// and the total number of entries returned (§9 fixes the source's
    /// dangling inner-loop cap).
    pub async fn get_attributes_match(
        &self,
        filter: &str,
        attributes: Option<&[&str]>,
        base: Option<&str>,
        maxrecords: Option<u32>,
    ) -> CoreResult<Vec<AttributeMap>> {
        let mut out = Vec::new();
        self.get_attributes_match_cb(
            filter,
            |entry| {
                out.push(entry);
                Ok(())
            },
            attributes,
            base,
            maxrecords,
        )
        .await?;
        Ok(out)
    }

    /// `getAttributesMatchCB(filter, cb, ...)` (§4.2, §9): invokes `cb` once
    /// per entry instead of materializing the whole result (pull-producer
    /// rewrite of the source's re-entrant callback). `cb` must not issue
    /// mutating operations on this session (§5).
    pub async fn get_attributes_match_cb<F>(
        &self,
        filter: &str,
        mut cb: F,
        attributes: Option<&[&str]>,
        base: Option<&str>,
        maxrecords: Option<u32>,
    ) -> CoreResult<()>
    where
        F: FnMut(AttributeMap) -> CoreResult<()>,
    {
        let base = base.unwrap_or(&self.base_dn).to_string();
        let attrs: Vec<String> = attributes
            .map(|a| a.iter().map(|s| s.to_string()).collect())
            .unwrap_or_default();

        let mut page_size = self.page_size();
        if let Some(max) = maxrecords
            && max > 0
            && max < page_size
        {
            page_size = max;
        }

        let adapters: Vec<Box<dyn ldap3::adapters::Adapter<_, _>>> = vec![
            Box::new(EntriesOnly::new()),
            Box::new(PagedResults::new(page_size)),
        ];

        // Collected raw first: `streaming_search_with` borrows the connection
        // mutably for the lifetime of the stream, so the session lock stays
        // held until every page has been walked (§5: "operations on a given
        // session are serialized"). `cb` then runs, and range expansion
        // re-acquires the lock, after the lock is released below.
        let mut raw_entries = Vec::new();
        {
            let mut ldap = self.ldap.lock().await;
            let mut stream = ldap
                .streaming_search_with(adapters, &base, Scope::Subtree, filter, attrs.clone())
                .await
                .map_err(|e| CoreError::SearchFailed(e.to_string()))?;

            loop {
                if let Some(max) = maxrecords
                    && max > 0
                    && raw_entries.len() as u32 >= max
                {
                    break;
                }
                match stream.next().await.map_err(|e| CoreError::SearchFailed(e.to_string()))? {
                    Some(raw) => raw_entries.push(raw),
                    None => break,
                }
            }
            let _ = stream.finish().await;
        }

        let mut delivered: u32 = 0;
        for raw in raw_entries {
            let mut entry = normalize_attrs(SearchEntry::construct(raw));
            self.expand_ranged_attributes(&base, &mut entry).await?;
            cb(entry)?;
            delivered += 1;
        }

        debug!(filter, base, delivered, "getAttributesMatchCB complete");
        Ok(())
    }

    async fn run_search(
        &self,
        base: &str,
        scope: Scope,
        filter: &str,
        attrs: &[String],
        size_limit: Option<i32>,
    ) -> CoreResult<Vec<AttributeMap>> {
        let mut ldap = self.ldap.lock().await;
        if let Some(limit) = size_limit {
            ldap.with_search_options(ldap3::SearchOptions::new().sizelimit(limit));
        }
        let (entries, _res) = ldap
            .search(base, scope, filter, attrs)
            .await
            .map_err(|e| CoreError::SearchFailed(e.to_string()))?
            .success()
            .map_err(|e| CoreError::SearchFailed(e.to_string()))?;

        Ok(entries
            .into_iter()
            .map(|raw| normalize_attrs(SearchEntry::construct(raw)))
            .collect())
    }

    /// Range-retrieval cursor (§3, §4.4): whenever an entry holds a key of
    /// the form `attr;range=lo-hi`, fold its values into `attr` and, while
    /// `hi != '*'`, re-query base-scope for `attr;range=hi+1-*` until the
    /// terminal response arrives.
    async fn expand_ranged_attributes(&self, dn: &str, entry: &mut AttributeMap) -> CoreResult<()> {
        let ranged_keys: Vec<String> = entry
            .keys()
            .filter(|k| k.contains(";range="))
            .cloned()
            .collect();

        for key in ranged_keys {
            let Some((attr, _lo, hi)) = parse_range_key(&key) else {
                continue;
            };
            let mut values = entry.remove(&key).unwrap_or_default();
            let mut next_low = hi.checked_add(1);
            let mut terminal = hi_is_terminal(&key);

            while !terminal {
                let Some(low) = next_low else { break };
                let selector = format!("{attr};range={low}-*");
                let mut page = self
                    .run_search(dn, Scope::Base, "(objectClass=*)", &[selector], None)
                    .await?;
                let Some(mut page_entry) = page.pop() else { break };
                let found_key = page_entry
                    .keys()
                    .find(|k| k.starts_with(&format!("{attr};range=")))
                    .cloned();
                let Some(found_key) = found_key else { break };

                let more = page_entry.remove(&found_key).unwrap_or_default();
                values.extend(more);
                terminal = hi_is_terminal(&found_key);
                next_low = parse_range_key(&found_key).and_then(|(_, _, h)| h.checked_add(1));
            }

            entry.insert(attr, values);
        }

        Ok(())
    }
}

/// Parses `attr;range=lo-hi` into `(attr, lo, hi)`, treating `*` as `u32::MAX`.
fn parse_range_key(key: &str) -> Option<(String, u32, u32)> {
    let (attr, rest) = key.split_once(";range=")?;
    let (lo, hi) = rest.split_once('-')?;
    let lo: u32 = lo.parse().ok()?;
    let hi: u32 = if hi == "*" { u32::MAX } else { hi.parse().ok()? };
    Some((attr.to_string(), lo, hi))
}

fn hi_is_terminal(key: &str) -> bool {
    key.rsplit_once('-').is_some_and(|(_, hi)| hi == "*")
}
