//! Read-only blog listing and lookup.

use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

use crate::model::{BlogPost, BlogPostDetail, BlogPostSummary, Page};

pub mod sqlite;

pub use sqlite::SqlitePostStore;

/// Posts per listing page.
pub const PAGE_SIZE: u64 = 5;

/// Maximum length of a listing excerpt, in characters.
pub const EXCERPT_CHARS: usize = 160;

/// Storage backing the blog. Slugs are unique.
#[async_trait]
pub trait PostStore: Send + Sync + Debug {
    async fn count(&self) -> Result<u64, sqlx::Error>;

    /// Posts ordered newest first.
    async fn list(&self, offset: u64, limit: u64) -> Result<Vec<BlogPost>, sqlx::Error>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, sqlx::Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum BlogError {
    #[error("Not found.")]
    NotFound,

    #[error("Invalid page.")]
    InvalidPage,

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Preview of `content`: trimmed, cut at [`EXCERPT_CHARS`] characters, with an
/// ellipsis when something was cut.
pub fn excerpt(content: &str) -> String {
    let text = content.trim();
    match text.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

/// URL-safe slug derived from a title.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' {
            pending_dash = true;
        }
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}

impl From<BlogPost> for BlogPostSummary {
    fn from(post: BlogPost) -> Self {
        Self {
            excerpt: excerpt(&post.content),
            id: post.id,
            title: post.title,
            slug: post.slug,
            created_at: post.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BlogService {
    store: Arc<dyn PostStore>,
}

impl BlogService {
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        Self { store }
    }

    /// One page of summaries. `list_url` is the absolute URL of the listing,
    /// used to build the `next`/`previous` links.
    pub async fn list_posts(
        &self,
        page: Option<&str>,
        list_url: &str,
    ) -> Result<Page<BlogPostSummary>, BlogError> {
        let count = self.store.count().await?;
        let page = resolve_page(page, count)?;
        let last = last_page(count);

        let posts = self.store.list((page - 1) * PAGE_SIZE, PAGE_SIZE).await?;

        Ok(Page {
            count,
            next: (page < last).then(|| page_link(list_url, page + 1)),
            previous: (page > 1).then(|| page_link(list_url, page - 1)),
            results: posts.into_iter().map(BlogPostSummary::from).collect(),
        })
    }

    pub async fn post_by_slug(&self, slug: &str) -> Result<BlogPostDetail, BlogError> {
        self.store
            .find_by_slug(slug)
            .await?
            .map(BlogPostDetail::from)
            .ok_or(BlogError::NotFound)
    }
}

/// An empty listing still has a first page.
fn last_page(count: u64) -> u64 {
    count.div_ceil(PAGE_SIZE).max(1)
}

fn resolve_page(raw: Option<&str>, count: u64) -> Result<u64, BlogError> {
    let last = last_page(count);
    let page = match raw.map(str::trim) {
        None | Some("") => 1,
        Some("last") => last,
        Some(s) => s.parse::<u64>().map_err(|_| BlogError::InvalidPage)?,
    };

    if page == 0 || page > last {
        return Err(BlogError::InvalidPage);
    }
    Ok(page)
}

/// `list_url` may already carry other query pairs; page 1 is the bare listing.
fn page_link(list_url: &str, page: u64) -> String {
    if page == 1 {
        return list_url.to_string();
    }
    let sep = if list_url.contains('?') { '&' } else { '?' };
    format!("{list_url}{sep}page={page}")
}
