//! Paginated Fetcher
//!
//! Drives a "fetch next page" operation to exhaustion without knowing how the
//! upstream spells its continuation. The caller supplies a [`Continuation`]
//! accessor for the response shape; the fetch loop only ever sees
//! `Option<String>` cursors.

use super::context::DescribeContext;
use anyhow::Result;
use serde_json::Value;
use std::future::Future;

/// One page of listed items
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Create a page. An empty cursor counts as "no further pages".
    pub fn new(items: Vec<T>, next_cursor: Option<String>) -> Self {
        Self {
            items,
            next_cursor: next_cursor.filter(|c| !c.is_empty()),
        }
    }

    /// A terminal page
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, None)
    }

    /// Build a page from an arbitrary response, reading the cursor through
    /// `continuation` before `items` consumes the response.
    pub fn from_response<R, C, F>(response: R, continuation: &C, items: F) -> Self
    where
        C: Continuation<R> + ?Sized,
        F: FnOnce(R) -> Vec<T>,
    {
        let next_cursor = continuation.next_cursor(&response);
        Self::new(items(response), next_cursor)
    }
}

/// Reads the continuation token out of a page response
pub trait Continuation<R: ?Sized> {
    fn next_cursor(&self, response: &R) -> Option<String>;
}

impl<R: ?Sized, F> Continuation<R> for F
where
    F: Fn(&R) -> Option<String>,
{
    fn next_cursor(&self, response: &R) -> Option<String> {
        self(response)
    }
}

/// Continuation stored at a dot path inside a JSON response.
///
/// `"nextPageToken"` covers flat tokens, `"result.page.next"` covers tokens
/// nested inside an envelope. Numeric values are accepted for page-index APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPath<'a>(pub &'a str);

impl Continuation<Value> for TokenPath<'_> {
    fn next_cursor(&self, response: &Value) -> Option<String> {
        match value_at(response, self.0)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Walk a dot-notation path (object keys and array indices) into `value`
pub fn value_at<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    if path.is_empty() {
        return Some(value);
    }

    let mut current = value;
    for part in path.split('.') {
        current = match current {
            Value::Array(arr) => arr.get(part.parse::<usize>().ok()?)?,
            _ => current.get(part)?,
        };
    }
    Some(current)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ready,
    Exhausted,
}

/// Pulls pages from `fetch` until a page comes back without a cursor
pub struct Paginator<F> {
    fetch: F,
    cursor: Option<String>,
    state: State,
    pages: usize,
}

impl<F> Paginator<F> {
    pub fn new(fetch: F) -> Self {
        Self {
            fetch,
            cursor: None,
            state: State::Ready,
            pages: 0,
        }
    }

    /// Pages fetched so far
    pub fn pages_fetched(&self) -> usize {
        self.pages
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == State::Exhausted
    }
}

impl<T, F, Fut> Paginator<F>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    /// Fetch the next page.
    ///
    /// Returns `Ok(None)` once the listing is exhausted. An error ends the
    /// listing as well: later calls return `Ok(None)` without fetching.
    pub async fn next_page(&mut self, ctx: &DescribeContext) -> Result<Option<Vec<T>>> {
        if self.state == State::Exhausted {
            return Ok(None);
        }

        let cursor = self.cursor.take();
        tracing::trace!("fetching page {} (cursor: {:?})", self.pages + 1, cursor);

        let page = match ctx.run((self.fetch)(cursor)).await {
            Ok(page) => page,
            Err(err) => {
                self.state = State::Exhausted;
                return Err(err);
            }
        };

        self.pages += 1;
        match page.next_cursor {
            Some(next) => self.cursor = Some(next),
            None => self.state = State::Exhausted,
        }

        Ok(Some(page.items))
    }

    /// Drain every page into one vector
    pub async fn collect_all(mut self, ctx: &DescribeContext) -> Result<Vec<T>> {
        let mut all_items = Vec::new();
        while let Some(items) = self.next_page(ctx).await? {
            all_items.extend(items);
        }
        Ok(all_items)
    }
}
