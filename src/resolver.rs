// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Target resolution for takedown claims.
//!
//! A claim names its target either by catalog id or by URL. An explicit id is
//! authoritative: when both are submitted the URL is never consulted, even if
//! it points at a different link.

use crate::error::StoreError;
use crate::models::{Link, LinkId, LinkStatus};
use crate::normalize::normalize_url;
use crate::store::Database;
use tracing::debug;

/// How a claim identifies its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSelector {
    ById(LinkId),
    ByUrl(String),
}

impl TargetSelector {
    /// Build a selector from the two optional submission fields, preferring
    /// the id.
    pub fn from_parts(link_id: Option<LinkId>, url: Option<&str>) -> Option<Self> {
        match (link_id, url) {
            (Some(id), _) => Some(Self::ById(id)),
            (None, Some(url)) => Some(Self::ByUrl(url.to_string())),
            (None, None) => None,
        }
    }
}

/// The resolved target of a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkRef {
    pub id: LinkId,
    pub series_id: i64,
    pub status: LinkStatus,
}

impl From<&Link> for LinkRef {
    fn from(link: &Link) -> Self {
        Self {
            id: link.id,
            series_id: link.series_id,
            status: link.status,
        }
    }
}

/// Finds the catalog link a claim refers to.
pub struct LinkResolver<'a> {
    db: &'a Database,
}

impl<'a> LinkResolver<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Resolve a selector to a link. `None` means no match, which is a valid
    /// outcome rather than an error.
    ///
    /// The catalog does not enforce unique normalized URLs. When several
    /// non-deleted links match, the lowest id wins. That choice is stable but
    /// arbitrary.
    pub async fn resolve(&self, target: &TargetSelector) -> Result<Option<LinkRef>, StoreError> {
        let resolved = match target {
            TargetSelector::ById(id) => self.db.get_link(*id).await?.as_ref().map(LinkRef::from),
            TargetSelector::ByUrl(raw) => {
                let normalized = normalize_url(raw);
                let candidates = self.db.find_links_by_normalized_url(&normalized).await?;
                if candidates.len() > 1 {
                    debug!(
                        url_normalized = %normalized,
                        matches = candidates.len(),
                        "Multiple links share a normalized URL, using lowest id"
                    );
                }
                candidates.iter().min_by_key(|link| link.id).map(LinkRef::from)
            }
        };

        debug!(?target, link_id = ?resolved.map(|link| link.id), "Target resolved");
        Ok(resolved)
    }

    /// Resolve from the raw optional fields.
    pub async fn resolve_parts(
        &self,
        link_id: Option<LinkId>,
        url: Option<&str>,
    ) -> Result<Option<LinkRef>, StoreError> {
        match TargetSelector::from_parts(link_id, url) {
            Some(target) => self.resolve(&target).await,
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn catalog() -> Database {
        let db = Database::new();
        db.insert_link(Link::new(10, 100, "https://example.com/ch/1")).await.unwrap();
        db.insert_link(Link::new(4, 200, "https://mirror.example.com/ch/1")).await.unwrap();
        db.insert_link(Link::new(7, 300, "http://example.com/ch/1/")).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_resolve_by_url_normalizes() {
        let db = catalog().await;
        let resolver = LinkResolver::new(&db);

        let found = resolver
            .resolve(&TargetSelector::ByUrl("HTTPS://Example.com/ch/1/".to_string()))
            .await
            .unwrap()
            .unwrap();
        // 7 and 10 both match; lowest id wins
        assert_eq!(found.id, 7);
        assert_eq!(found.series_id, 300);
    }

    #[tokio::test]
    async fn test_id_wins_over_conflicting_url() {
        let db = catalog().await;
        let resolver = LinkResolver::new(&db);

        let found = resolver
            .resolve_parts(Some(4), Some("https://example.com/ch/1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, 4);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_an_error() {
        let db = catalog().await;
        let resolver = LinkResolver::new(&db);

        // A matching URL is ignored when an id is given
        let found = resolver
            .resolve_parts(Some(999), Some("https://example.com/ch/1"))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_no_match_and_no_target() {
        let db = catalog().await;
        let resolver = LinkResolver::new(&db);

        assert!(resolver
            .resolve(&TargetSelector::ByUrl("https://elsewhere.org/x".to_string()))
            .await
            .unwrap()
            .is_none());
        assert!(resolver.resolve_parts(None, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let db = catalog().await;
        db.inject_fault(crate::store::Fault::ReadLink);

        let result = LinkResolver::new(&db)
            .resolve(&TargetSelector::ById(10))
            .await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
