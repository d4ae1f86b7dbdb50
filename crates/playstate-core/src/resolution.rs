use playstate_models::{ExternalIdKind, ExternalIds};
use playstate_server::{ItemQuery, MediaServer};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use crate::error::Error;
use crate::pager::ItemPager;

/// Key for external ID lookups: (kind, value)
type ExternalKey = (ExternalIdKind, String);

/// Two target items claimed the same external ID
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Collision {
    pub kind: ExternalIdKind,
    pub value: String,
    /// Item the ID pointed to before; no longer reachable through this ID
    pub replaced_item_id: String,
    pub item_id: String,
}

/// Which external ID matched a record, and the target item it maps to
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Resolution {
    pub kind: ExternalIdKind,
    pub value: String,
    pub item_id: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct IndexStats {
    pub items_seen: usize,
    pub entries: usize,
    pub collisions: usize,
}

/// Maps external IDs to item IDs of one target server.
///
/// Jellyfin can only look items up by its own ID, so restore enumerates the
/// whole catalog once and answers every record from this map. An index
/// belongs to a single restore run: item IDs are not stable across
/// installations or library rescans, and the index is never persisted.
///
/// When two items carry the same external ID, the one enumerated later wins
/// and the clash is kept in [`ResolutionIndex::collisions`].
#[derive(Debug, Default)]
pub struct ResolutionIndex {
    entries: HashMap<ExternalKey, String>,
    collisions: Vec<Collision>,
    items_seen: usize,
}

impl ResolutionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enumerate every item on the server and index its external IDs.
    /// A page that cannot be fetched aborts the build; a partial index would
    /// report resolvable records as unresolved.
    pub async fn build(server: &dyn MediaServer, query: &ItemQuery, page_size: usize) -> Result<Self, Error> {
        info!(server = %server.base_url(), "Building resolution index");
        let mut index = Self::new();
        let mut pager = ItemPager::global(server, query.clone(), page_size);
        while let Some(page) = pager.next_page().await? {
            for item in &page {
                index.insert_item(&item.id, &item.external_ids);
            }
        }

        let stats = index.stats();
        info!(
            items = stats.items_seen,
            entries = stats.entries,
            collisions = stats.collisions,
            "Resolution index ready"
        );
        Ok(index)
    }

    /// Index every external ID an item carries. Items without IDs are counted
    /// but contribute no entries.
    pub fn insert_item(&mut self, item_id: &str, external_ids: &ExternalIds) {
        self.items_seen += 1;
        if external_ids.is_empty() {
            debug!(item_id, "Item has no external IDs, not indexed");
            return;
        }
        for (kind, value) in external_ids.iter() {
            self.insert(kind, value, item_id);
        }
    }

    /// Map one external ID to an item, replacing any earlier mapping.
    /// Re-inserting the same item is not a collision.
    pub fn insert(&mut self, kind: ExternalIdKind, value: &str, item_id: &str) -> Option<Collision> {
        let previous = self
            .entries
            .insert((kind, value.to_string()), item_id.to_string())?;
        if previous == item_id {
            return None;
        }

        warn!(
            kind = %kind,
            value,
            replaced_item_id = %previous,
            item_id,
            "Duplicate external ID on target server, keeping the later item"
        );
        let collision = Collision {
            kind,
            value: value.to_string(),
            replaced_item_id: previous,
            item_id: item_id.to_string(),
        };
        self.collisions.push(collision.clone());
        Some(collision)
    }

    pub fn lookup(&self, kind: ExternalIdKind, value: &str) -> Option<&str> {
        self.entries
            .get(&(kind, value.trim().to_string()))
            .map(String::as_str)
    }

    /// First match in IMDB, TMDB, TVDB order
    pub fn resolve(&self, external_ids: &ExternalIds) -> Option<Resolution> {
        external_ids.iter().find_map(|(kind, value)| {
            self.lookup(kind, value).map(|item_id| Resolution {
                kind,
                value: value.to_string(),
                item_id: item_id.to_string(),
            })
        })
    }

    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            items_seen: self.items_seen,
            entries: self.entries.len(),
            collisions: self.collisions.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{movie, MockServer};
    use playstate_models::ServerItem;

    fn ids(pairs: &[(ExternalIdKind, &str)]) -> ExternalIds {
        pairs
            .iter()
            .fold(ExternalIds::new(), |ids, (kind, value)| ids.with(*kind, value))
    }

    #[test]
    fn test_resolves_to_indexed_item() {
        let mut index = ResolutionIndex::new();
        index.insert_item("abc123", &ids(&[(ExternalIdKind::Imdb, "tt0111161")]));

        let resolution = index.resolve(&ids(&[(ExternalIdKind::Imdb, "tt0111161")])).unwrap();
        assert_eq!(resolution.item_id, "abc123");
        assert_eq!(resolution.kind, ExternalIdKind::Imdb);
    }

    #[test]
    fn test_imdb_takes_priority_over_tmdb() {
        let mut index = ResolutionIndex::new();
        index.insert_item("via-tmdb", &ids(&[(ExternalIdKind::Tmdb, "278")]));
        index.insert_item("via-imdb", &ids(&[(ExternalIdKind::Imdb, "tt0111161")]));

        let record = ids(&[(ExternalIdKind::Imdb, "tt0111161"), (ExternalIdKind::Tmdb, "278")]);
        let resolution = index.resolve(&record).unwrap();
        assert_eq!(resolution.item_id, "via-imdb");
        assert_eq!(resolution.kind, ExternalIdKind::Imdb);
    }

    #[test]
    fn test_falls_back_to_tmdb_then_tvdb() {
        let mut index = ResolutionIndex::new();
        index.insert_item("movie", &ids(&[(ExternalIdKind::Tmdb, "278")]));
        index.insert_item("episode", &ids(&[(ExternalIdKind::Tvdb, "349232")]));

        let record = ids(&[(ExternalIdKind::Imdb, "tt0111161"), (ExternalIdKind::Tmdb, "278")]);
        let resolution = index.resolve(&record).unwrap();
        assert_eq!(resolution.item_id, "movie");
        assert_eq!(resolution.kind, ExternalIdKind::Tmdb);

        let record = ids(&[(ExternalIdKind::Imdb, "tt0959621"), (ExternalIdKind::Tvdb, "349232")]);
        assert_eq!(index.resolve(&record).unwrap().kind, ExternalIdKind::Tvdb);
    }

    #[test]
    fn test_no_match() {
        let mut index = ResolutionIndex::new();
        index.insert_item("a", &ids(&[(ExternalIdKind::Imdb, "tt1")]));
        assert!(index.resolve(&ids(&[(ExternalIdKind::Imdb, "tt2")])).is_none());
        assert!(index.resolve(&ExternalIds::new()).is_none());
    }

    #[test]
    fn test_kinds_do_not_cross_match() {
        let mut index = ResolutionIndex::new();
        index.insert_item("a", &ids(&[(ExternalIdKind::Tmdb, "1396")]));
        assert!(index.resolve(&ids(&[(ExternalIdKind::Tvdb, "1396")])).is_none());
    }

    #[test]
    fn test_collision_keeps_later_item() {
        let mut index = ResolutionIndex::new();
        index.insert_item("first", &ids(&[(ExternalIdKind::Imdb, "tt0111161")]));
        index.insert_item("second", &ids(&[(ExternalIdKind::Imdb, "tt0111161")]));

        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup(ExternalIdKind::Imdb, "tt0111161"), Some("second"));
        assert_eq!(
            index.collisions(),
            &[Collision {
                kind: ExternalIdKind::Imdb,
                value: "tt0111161".to_string(),
                replaced_item_id: "first".to_string(),
                item_id: "second".to_string(),
            }]
        );
    }

    #[test]
    fn test_reinserting_same_item_is_not_a_collision() {
        let mut index = ResolutionIndex::new();
        let item_ids = ids(&[(ExternalIdKind::Imdb, "tt1"), (ExternalIdKind::Tmdb, "1")]);
        index.insert_item("a", &item_ids);
        index.insert_item("a", &item_ids);
        assert!(index.collisions().is_empty());
        assert_eq!(index.stats(), IndexStats { items_seen: 2, entries: 2, collisions: 0 });
    }

    #[tokio::test]
    async fn test_build_enumerates_whole_catalog_once() {
        let mut server = MockServer::new();
        for i in 0..9 {
            server.add_item(movie(&format!("m{}", i), &format!("tt{}", i)));
        }
        server.add_item(ServerItem::new("no-ids", ExternalIds::new()).with_type("Movie"));
        server.add_item(movie("dup", "tt3"));

        let index = ResolutionIndex::build(&server, &ItemQuery::default(), 4).await.unwrap();
        assert_eq!(server.page_requests(), 3);
        assert_eq!(index.stats().items_seen, 11);
        assert_eq!(index.len(), 9);
        assert_eq!(index.lookup(ExternalIdKind::Imdb, "tt3"), Some("dup"));
        assert_eq!(index.collisions().len(), 1);
    }

    #[tokio::test]
    async fn test_build_fails_when_server_unreachable() {
        let server = MockServer::new();
        server.go_offline();
        let result = ResolutionIndex::build(&server, &ItemQuery::default(), 500).await;
        assert!(matches!(result, Err(Error::Connection(_))));
    }
}
