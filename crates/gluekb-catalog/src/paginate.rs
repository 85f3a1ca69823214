//! Cursor pagination over listing calls
//!
//! A [`Paginator`] wraps any listing call that takes an optional continuation
//! token and returns a [`Page`]. Pages are fetched lazily, one per
//! [`Paginator::next_page`] call, strictly in order.
//!
//! ```rust,ignore
//! let source = self.source.as_ref();
//! let tables = Paginator::new(move |token| source.get_tables(database, token))
//!     .collect_all()
//!     .await?;
//! ```

use crate::source::{FetchError, Page};
use std::future::Future;
use std::marker::PhantomData;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    Start,
    Next(String),
    Exhausted,
}

/// Lazy, restartable sequence of pages
pub struct Paginator<T, F> {
    fetch: F,
    cursor: Cursor,
    pages_fetched: usize,
    _item: PhantomData<fn() -> T>,
}

impl<T, F, Fut> Paginator<T, F>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, FetchError>>,
{
    pub fn new(fetch: F) -> Self {
        Self {
            fetch,
            cursor: Cursor::Start,
            pages_fetched: 0,
            _item: PhantomData,
        }
    }

    /// Fetch the next page
    ///
    /// Returns `Ok(None)` once the source has reported no further cursor. An
    /// empty token counts as no cursor. A failed request leaves the cursor
    /// where it was, so calling again re-requests the same page.
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>, FetchError> {
        let token = match &self.cursor {
            Cursor::Exhausted => return Ok(None),
            Cursor::Start => None,
            Cursor::Next(token) => Some(token.clone()),
        };

        let page = (self.fetch)(token).await?;
        self.pages_fetched += 1;

        self.cursor = match page.next_token {
            Some(next) if !next.is_empty() => Cursor::Next(next),
            _ => Cursor::Exhausted,
        };

        Ok(Some(page.items))
    }

    /// Drain every remaining page into one vector, in page order
    pub async fn collect_all(mut self) -> Result<Vec<T>, FetchError> {
        let mut items = Vec::new();
        while let Some(page) = self.next_page().await? {
            items.extend(page);
        }
        Ok(items)
    }

    /// Go back to the first page
    pub fn restart(&mut self) {
        self.cursor = Cursor::Start;
        self.pages_fetched = 0;
    }

    /// Pages fetched since creation or the last restart
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor == Cursor::Exhausted
    }
}
