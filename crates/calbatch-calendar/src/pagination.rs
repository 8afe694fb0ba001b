//! Accumulate token-paginated list responses.

use std::future::Future;

/// One page of a list response.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

/// Fetch pages until the service stops returning a continuation token.
///
/// `fetch` receives `None` for the first page and the previous page's token
/// afterwards. An empty token counts as "no more pages". Items are returned
/// in page order.
pub async fn collect_pages<T, E, F, Fut>(mut fetch: F) -> Result<Vec<T>, E>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    let mut items = Vec::new();
    let mut page_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = fetch(page_token.take()).await?;
        pages += 1;
        items.extend(page.items);

        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => break,
        }
    }

    tracing::debug!(pages, items = items.len(), "Collected paginated results");
    Ok(items)
}
