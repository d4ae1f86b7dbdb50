use playstate_models::ServerItem;
use playstate_server::{ItemQuery, MediaServer, PageRequest, ServerError};
use tracing::debug;

enum Scope {
    User(String),
    Global,
}

/// Walks a paginated item enumeration one page at a time.
///
/// Stops on an empty page or once the number of retrieved items reaches the
/// server's `TotalRecordCount`.
pub struct ItemPager<'a> {
    server: &'a dyn MediaServer,
    scope: Scope,
    query: ItemQuery,
    page_size: usize,
    retrieved: usize,
    total: Option<usize>,
    done: bool,
}

impl<'a> ItemPager<'a> {
    /// Items visible to one user, with that user's playback state
    pub fn for_user(server: &'a dyn MediaServer, user_id: &str, query: ItemQuery, page_size: usize) -> Self {
        Self::new(server, Scope::User(user_id.to_string()), query, page_size)
    }

    /// Every item the server knows about
    pub fn global(server: &'a dyn MediaServer, query: ItemQuery, page_size: usize) -> Self {
        Self::new(server, Scope::Global, query, page_size)
    }

    fn new(server: &'a dyn MediaServer, scope: Scope, query: ItemQuery, page_size: usize) -> Self {
        Self {
            server,
            scope,
            query,
            page_size: page_size.max(1),
            retrieved: 0,
            total: None,
            done: false,
        }
    }

    /// Total reported by the server, known after the first page
    pub fn total(&self) -> Option<usize> {
        self.total
    }

    /// Next page of usable items, or `None` once the enumeration is exhausted.
    ///
    /// A page can be empty while enumeration continues, when the server
    /// returned only entries that could not be mapped.
    pub async fn next_page(&mut self) -> Result<Option<Vec<ServerItem>>, ServerError> {
        if self.done {
            return Ok(None);
        }

        let request = PageRequest {
            start_index: self.retrieved,
            limit: self.page_size,
        };
        let page = match &self.scope {
            Scope::User(user_id) => self.server.list_user_items(user_id, &self.query, request).await?,
            Scope::Global => self.server.list_all_items(&self.query, request).await?,
        };

        self.total = Some(page.total_record_count);
        if page.returned == 0 {
            self.done = true;
            return Ok(None);
        }

        self.retrieved += page.returned;
        if self.retrieved >= page.total_record_count {
            self.done = true;
        }
        debug!(
            start_index = request.start_index,
            returned = page.returned,
            usable = page.items.len(),
            retrieved = self.retrieved,
            total = page.total_record_count,
            "Fetched item page"
        );
        Ok(Some(page.items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{movie, MockServer};

    async fn drain(mut pager: ItemPager<'_>) -> Vec<ServerItem> {
        let mut items = Vec::new();
        while let Some(page) = pager.next_page().await.unwrap() {
            items.extend(page);
        }
        items
    }

    #[tokio::test]
    async fn test_pages_until_total_reached() {
        let mut server = MockServer::new();
        for i in 0..7 {
            server.add_item(movie(&format!("m{}", i), &format!("tt{}", i)));
        }

        let mut pager = ItemPager::global(&server, ItemQuery::default(), 3);
        let mut sizes = Vec::new();
        while let Some(page) = pager.next_page().await.unwrap() {
            sizes.push(page.len());
        }
        assert_eq!(sizes, vec![3, 3, 1]);
        assert_eq!(pager.total(), Some(7));
        assert_eq!(server.page_requests(), 3);
    }

    #[tokio::test]
    async fn test_empty_library_stops_after_one_request() {
        let server = MockServer::new();
        let items = drain(ItemPager::global(&server, ItemQuery::default(), 500)).await;
        assert!(items.is_empty());
        assert_eq!(server.page_requests(), 1);
    }

    #[tokio::test]
    async fn test_user_scope_filters_played() {
        let mut server = MockServer::new().with_user("u1", "alice");
        server.add_item(movie("a", "tt1"));
        server.add_item(movie("b", "tt2"));
        server.set_user_state("u1", "b", playstate_models::PlaybackState::new(true, 0, false));

        let query = ItemQuery {
            played_only: true,
            ..ItemQuery::default()
        };
        let items = drain(ItemPager::for_user(&server, "u1", query, 10)).await;
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[tokio::test]
    async fn test_dropped_entries_still_advance_the_window() {
        let mut server = MockServer::new();
        for i in 0..6 {
            server.add_item(movie(&format!("m{}", i), &format!("tt{}", i)));
        }
        server.drop_from_listing("m1");
        server.drop_from_listing("m2");

        let items = drain(ItemPager::global(&server, ItemQuery::default(), 2)).await;
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        // m1 and m2 fill the whole second page; paging must go on past it
        assert_eq!(ids, vec!["m0", "m3", "m4", "m5"]);
        assert_eq!(server.page_requests(), 3);
    }
}
