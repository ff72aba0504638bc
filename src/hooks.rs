//! Static generation hooks: the queries that decide which pages exist and
//! fetch what each one shows. All queries go through a [`ContentSource`]
//! passed in by the caller.

use crate::prismic::{
    get_by_uid, ContentSource, Document, Error, Ordering, Predicate,
    QueryOptions, Result, SearchResponse,
};
use std::collections::HashSet;

/// The custom type articles are stored as.
pub const POST_TYPE: &str = "posts";

const PUBLICATION_DATE: &str = "document.first_publication_date";

/// Results per page when enumerating every article.
const PATHS_PAGE_SIZE: usize = 100;

/// Preview mode: staged content viewed through a preview ref instead of the
/// published master ref.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Preview {
    pub reference: Option<String>,
}

impl Preview {
    pub fn new(reference: Option<String>) -> Preview {
        Preview { reference }
    }

    pub fn is_active(&self) -> bool {
        self.reference.is_some()
    }
}

/// What the listing page is generated from.
#[derive(Clone, Debug)]
pub struct ListingProps {
    /// The first page of posts plus the cursor for the rest.
    pub first_page: SearchResponse,
    pub preview: bool,
}

/// Which article pages are pre-built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticPaths {
    pub slugs: Vec<String>,

    /// Whether slugs missing from `slugs` are generated on demand, showing a
    /// loading page meanwhile.
    pub fallback: bool,
}

/// What an article page is generated from.
#[derive(Clone, Debug)]
pub struct ArticleProps {
    pub post: Document,

    /// The nearest article published before `post`.
    pub previous: Option<Document>,

    /// The nearest article published after `post`.
    pub next: Option<Document>,

    pub preview: bool,
}

fn type_predicate() -> Predicate {
    Predicate::at("document.type", POST_TYPE)
}

/// Fetches the first page of posts, newest first.
pub async fn listing_props(
    source: &dyn ContentSource,
    page_size: usize,
    preview: &Preview,
) -> Result<ListingProps> {
    let first_page = source
        .query(
            &[type_predicate()],
            &QueryOptions {
                page_size: Some(page_size),
                orderings: vec![Ordering::desc(PUBLICATION_DATE)],
                after: None,
                reference: preview.reference.clone(),
            },
        )
        .await?;
    Ok(ListingProps {
        first_page,
        preview: preview.is_active(),
    })
}

/// Enumerates the uid of every post.
pub async fn article_paths(
    source: &dyn ContentSource,
    preview: &Preview,
) -> Result<StaticPaths> {
    let response = source
        .query(
            &[type_predicate()],
            &QueryOptions {
                page_size: Some(PATHS_PAGE_SIZE),
                reference: preview.reference.clone(),
                ..QueryOptions::default()
            },
        )
        .await?;
    let slugs = collect_uids(source, response).await?;
    Ok(StaticPaths {
        slugs,
        fallback: true,
    })
}

/// Gathers the uid of every document on `response` and the pages its cursor
/// leads to. A cursor that points back at a page already fetched is an error.
async fn collect_uids(
    source: &dyn ContentSource,
    mut response: SearchResponse,
) -> Result<Vec<String>> {
    let mut uids = Vec::with_capacity(response.total_results_size);
    let mut visited = HashSet::new();
    loop {
        uids.extend(
            response
                .results
                .iter()
                .filter_map(|doc| doc.uid.clone()),
        );
        match response.next_page.take() {
            Some(url) => {
                if !visited.insert(url.clone()) {
                    return Err(Error::RepeatedCursor { url });
                }
                response = source.fetch_page(&url).await?;
            }
            None => break,
        }
    }
    Ok(uids)
}

/// Fetches the post whose uid is `slug` along with its nearest neighbours by
/// publication date.
pub async fn article_props(
    source: &dyn ContentSource,
    slug: &str,
    preview: &Preview,
) -> Result<ArticleProps> {
    let reference = preview.reference.as_deref();
    let post = get_by_uid(source, POST_TYPE, slug, reference).await?;
    let previous = sibling(source, &post, Ordering::desc(PUBLICATION_DATE), preview).await?;
    let next = sibling(source, &post, Ordering::asc(PUBLICATION_DATE), preview).await?;
    Ok(ArticleProps {
        post,
        previous,
        next,
        preview: preview.is_active(),
    })
}

/// Returns the first post after `post` in `ordering`.
async fn sibling(
    source: &dyn ContentSource,
    post: &Document,
    ordering: Ordering,
    preview: &Preview,
) -> Result<Option<Document>> {
    let response = source
        .query(
            &[type_predicate()],
            &QueryOptions {
                page_size: Some(1),
                orderings: vec![ordering],
                after: Some(post.id.clone()),
                reference: preview.reference.clone(),
            },
        )
        .await?;
    Ok(response.results.into_iter().next())
}
