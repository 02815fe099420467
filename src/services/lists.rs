// src/services/lists.rs

//! Curated list resolution and fetching.
//!
//! A list is read through its aggregate feed first. When no address variant
//! yields a feed, the members are read instead and each member's timeline
//! is fetched with an even share of the requested total.

use std::sync::Mutex;

use super::{FetchContext, InterestContext, Paginator, PostNormalizer, TimelineFetcher};
use crate::client::Page;
use crate::error::{AppError, Result};
use crate::models::ResultSet;
use crate::models::raw::ListItemView;
use crate::utils::text::sanitize;
use crate::utils::uri::{
    ACCEPTED_LIST_FORMATS, ListLocator, is_did, list_address, normalize_handle, parse_list_locator,
};

/// Address rewrites tried in order, each applied on top of the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressStrategy {
    /// `at://<did>/<collection>/<list_id>`
    Canonical,
    /// Drop one trailing quote
    TrimTrailingQuote,
    /// Drop the `at://` scheme
    WithoutScheme,
    /// Keep only alphanumerics in the list id
    AlphanumericListId,
}

impl AddressStrategy {
    pub const CHAIN: [AddressStrategy; 4] = [
        AddressStrategy::Canonical,
        AddressStrategy::TrimTrailingQuote,
        AddressStrategy::WithoutScheme,
        AddressStrategy::AlphanumericListId,
    ];

    fn apply(self, previous: &str, owner_did: &str, collection: &str, list_id: &str) -> String {
        match self {
            AddressStrategy::Canonical => list_address(owner_did, collection, list_id),
            AddressStrategy::TrimTrailingQuote => previous
                .strip_suffix(['"', '\''])
                .unwrap_or(previous)
                .to_string(),
            AddressStrategy::WithoutScheme => previous
                .strip_prefix("at://")
                .unwrap_or(previous)
                .to_string(),
            AddressStrategy::AlphanumericListId => match previous.rsplit_once('/') {
                Some((head, id)) => {
                    let id: String = id.chars().filter(|c| c.is_alphanumeric()).collect();
                    format!("{head}/{id}")
                }
                None => previous.to_string(),
            },
        }
    }
}

/// Distinct addresses produced by [`AddressStrategy::CHAIN`], in order.
pub(crate) fn address_candidates(owner_did: &str, collection: &str, list_id: &str) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();
    let mut address = String::new();
    for strategy in AddressStrategy::CHAIN {
        address = strategy.apply(&address, owner_did, collection, list_id);
        if !candidates.contains(&address) {
            candidates.push(address.clone());
        }
    }
    candidates
}

/// Where a list's posts came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListSource {
    /// The list's aggregate feed
    ListFeed,
    /// Individual timelines of this many members
    Members(usize),
    /// Nothing could be resolved
    Unresolved,
}

#[derive(Debug)]
pub struct ListOutcome {
    pub results: ResultSet,
    /// Every list address tried, in order
    pub attempted: Vec<String>,
    pub source: ListSource,
    /// Display name, when the list metadata was read
    pub name: Option<String>,
}

impl ListOutcome {
    fn unresolved(attempted: Vec<String>) -> Self {
        Self {
            results: ResultSet::new(),
            attempted,
            source: ListSource::Unresolved,
            name: None,
        }
    }
}

/// Members read through `getList`, with the list's display name.
struct ListMembers {
    name: Option<String>,
    items: Vec<ListItemView>,
}

/// Fetches posts from curated lists.
pub struct ListFetcher {
    ctx: FetchContext,
    paginator: Paginator,
    normalizer: PostNormalizer,
    timelines: TimelineFetcher,
}

impl ListFetcher {
    pub fn new(ctx: FetchContext) -> Self {
        Self {
            paginator: ctx.paginator(),
            normalizer: ctx.normalizer(),
            timelines: TimelineFetcher::new(ctx.clone()),
            ctx,
        }
    }

    /// Parse `locator` and fetch the list's posts.
    ///
    /// Unrecognized locators are logged with the accepted shapes and
    /// produce an empty outcome.
    pub async fn get_list_posts_from_locator(
        &self,
        locator: &str,
        requested_total: usize,
    ) -> ListOutcome {
        match parse_locator(locator) {
            Ok(ListLocator { owner, list_id }) => {
                self.get_list_posts(&owner, &list_id, requested_total).await
            }
            Err(e) => {
                log::error!("{e}");
                ListOutcome::unresolved(Vec::new())
            }
        }
    }

    /// Up to `requested_total` posts from the list `list_id` owned by `owner`.
    ///
    /// Never fails: unresolvable lists give an empty result with every
    /// attempted address listed.
    pub async fn get_list_posts(
        &self,
        owner: &str,
        list_id: &str,
        requested_total: usize,
    ) -> ListOutcome {
        if requested_total == 0 {
            return ListOutcome::unresolved(Vec::new());
        }

        let owner_did = match self.resolve_owner(owner).await {
            Ok(did) => did,
            Err(e) => {
                log::error!("{e}");
                return ListOutcome::unresolved(Vec::new());
            }
        };

        let collection = &self.ctx.config.fetch.list_collection;
        let candidates = address_candidates(&owner_did, collection, list_id);
        let mut attempted: Vec<String> = Vec::new();

        for address in &candidates {
            attempted.push(address.clone());
            let api = &self.ctx.api;
            let list = address.as_str();
            let outcome = self
                .paginator
                .paginate(requested_total, |req| async move {
                    api.get_list_feed(list, req.limit, req.cursor.as_deref())
                        .await
                })
                .await;

            if outcome.failed_outright() {
                log::debug!("List feed rejected address {address}");
                continue;
            }
            if outcome.items.is_empty() {
                log::info!("List feed for {address} is empty, reading members instead");
                break;
            }

            let posts = self
                .normalizer
                .normalize_all(&outcome.items, &InterestContext::Neutral)
                .await;
            log::info!("Retrieved {} posts from list feed {address}", posts.len());
            let name = match self.fetch_name(address).await {
                Ok(name) => name,
                Err(e) => {
                    log::debug!("getList rejected {address}: {e}");
                    None
                }
            };
            return ListOutcome {
                results: ResultSet::from_posts(posts),
                attempted,
                source: ListSource::ListFeed,
                name,
            };
        }

        self.fetch_from_members(&candidates, attempted, requested_total)
            .await
    }

    /// Display name of the list behind `locator`.
    pub async fn list_name(&self, locator: &str) -> Option<String> {
        let ListLocator { owner, list_id } = parse_locator(locator).ok()?;
        let owner_did = self.resolve_owner(&owner).await.ok()?;

        let collection = &self.ctx.config.fetch.list_collection;
        for address in address_candidates(&owner_did, collection, &list_id) {
            match self.fetch_name(&address).await {
                Ok(name) => return name,
                Err(e) => log::debug!("getList rejected {address}: {e}"),
            }
        }
        None
    }

    async fn fetch_name(&self, address: &str) -> Result<Option<String>> {
        let page = self.ctx.api.get_list(address, 1, None).await?;
        Ok(Some(page.list.name).filter(|name| !name.trim().is_empty()))
    }

    async fn fetch_from_members(
        &self,
        candidates: &[String],
        mut attempted: Vec<String>,
        requested_total: usize,
    ) -> ListOutcome {
        let Some(members) = self.list_members(candidates).await else {
            for address in candidates {
                if !attempted.contains(address) {
                    attempted.push(address.clone());
                }
            }
            let error = AppError::ListResolution {
                attempted: attempted.clone(),
            };
            log::error!("{error}");
            return ListOutcome::unresolved(attempted);
        };

        let handles: Vec<String> = members
            .items
            .iter()
            .map(|item| item.subject.handle.clone())
            .filter(|handle| !handle.trim().is_empty())
            .collect();
        if handles.is_empty() {
            log::warn!("List has no members");
            return ListOutcome {
                results: ResultSet::new(),
                attempted,
                source: ListSource::Members(0),
                name: members.name,
            };
        }

        let per_member = (requested_total / handles.len()).max(1);
        log::info!(
            "Fetching {per_member} posts from each of {} list members",
            handles.len()
        );
        let results = self
            .timelines
            .get_posts_from_users(&handles, per_member)
            .await;

        ListOutcome {
            results,
            attempted,
            source: ListSource::Members(handles.len()),
            name: members.name,
        }
    }

    /// Members from the first address that `getList` accepts.
    async fn list_members(&self, candidates: &[String]) -> Option<ListMembers> {
        let max_members = self.ctx.config.fetch.max_list_members;

        for address in candidates {
            let api = &self.ctx.api;
            let list = address.as_str();
            let name = Mutex::new(None::<String>);
            let name_slot = &name;
            let outcome = self
                .paginator
                .paginate(max_members, |req| async move {
                    let page = api.get_list(list, req.limit, req.cursor.as_deref()).await?;
                    if let Ok(mut slot) = name_slot.lock() {
                        slot.get_or_insert(page.list.name);
                    }
                    Ok::<_, AppError>(Page::new(page.items, page.cursor))
                })
                .await;

            if outcome.failed_outright() {
                log::debug!("getList rejected address {address}");
                continue;
            }
            let name = name
                .into_inner()
                .ok()
                .flatten()
                .filter(|name| !name.trim().is_empty());
            return Some(ListMembers {
                name,
                items: outcome.items,
            });
        }
        None
    }

    /// DID of a list owner given as handle or DID.
    async fn resolve_owner(&self, owner: &str) -> Result<String> {
        let owner = sanitize(&normalize_handle(owner));
        if owner.is_empty() {
            return Err(AppError::identifier(owner, "empty list owner"));
        }
        if is_did(&owner) {
            return Ok(owner);
        }

        self.ctx
            .api
            .get_profile(&owner)
            .await
            .map(|profile| profile.did)
            .map_err(|e| AppError::identifier(owner, format!("could not resolve list owner: {e}")))
    }
}

fn parse_locator(locator: &str) -> Result<ListLocator> {
    parse_list_locator(locator).ok_or_else(|| {
        AppError::identifier(
            locator,
            format!(
                "unrecognized list locator, accepted formats: {}",
                ACCEPTED_LIST_FORMATS.join(" | ")
            ),
        )
    })
}
