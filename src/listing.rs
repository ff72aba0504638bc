//! The listing page's view state: the posts displayed so far plus the cursor
//! for the next page of results. [`Listing::load_more`] follows the cursor
//! and merges the new posts into the displayed sequence.

use crate::post::{self, Presenter, PostSummary};
use crate::prismic::{self, ContentSource, SearchResponse};
use std::collections::{HashMap, HashSet};

/// The posts displayed on the listing page and the continuation cursor.
pub struct Listing {
    presenter: Presenter,

    /// The displayed posts, in the order the CMS returned them.
    posts: Vec<PostSummary>,

    /// Maps a post identifier to its index in `posts`.
    positions: HashMap<String, usize>,

    /// The URL of the next page of results; `None` when there are no more.
    next_page: Option<String>,

    /// Cursor URLs already followed.
    visited: HashSet<String>,
}

impl Listing {
    /// Builds a listing from the first page of results.
    pub fn new(presenter: Presenter, first_page: &SearchResponse) -> Result<Listing> {
        let mut listing = Listing {
            presenter,
            posts: Vec::with_capacity(first_page.results.len()),
            positions: HashMap::new(),
            next_page: None,
            visited: HashSet::new(),
        };
        let summaries = listing.summarize(first_page)?;
        listing.merge(summaries);
        listing.next_page = first_page.next_page.clone();
        Ok(listing)
    }

    pub fn posts(&self) -> &[PostSummary] {
        &self.posts
    }

    pub fn next_page(&self) -> Option<&str> {
        self.next_page.as_deref()
    }

    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }

    /// Fetches the next page of results and merges it into the displayed
    /// posts, returning how many posts were appended. Does nothing when there
    /// is no next page. A post whose identifier is already displayed replaces
    /// the displayed entry in place rather than appearing twice. A response
    /// whose cursor points back at a page already followed is an error. On
    /// error the listing is left unchanged.
    pub async fn load_more(&mut self, source: &dyn ContentSource) -> Result<usize> {
        let url = match &self.next_page {
            None => return Ok(0),
            Some(url) => url.clone(),
        };
        let response = source.fetch_page(&url).await?;
        if let Some(next) = &response.next_page {
            if *next == url || self.visited.contains(next) {
                return Err(Error::Fetch(prismic::Error::RepeatedCursor {
                    url: next.clone(),
                }));
            }
        }
        let summaries = self.summarize(&response)?;
        let appended = self.merge(summaries);
        self.visited.insert(url);
        self.next_page = response.next_page;
        tracing::debug!(
            appended,
            displayed = self.posts.len(),
            has_more = self.next_page.is_some(),
            "loaded more posts"
        );
        Ok(appended)
    }

    fn summarize(&self, response: &SearchResponse) -> Result<Vec<PostSummary>> {
        response
            .results
            .iter()
            .map(|doc| self.presenter.summarize(doc).map_err(Error::from))
            .collect()
    }

    fn merge(&mut self, summaries: Vec<PostSummary>) -> usize {
        let mut appended = 0;
        for summary in summaries {
            match self.positions.get(&summary.uid) {
                Some(&i) => self.posts[i] = summary,
                None => {
                    self.positions.insert(summary.uid.clone(), self.posts.len());
                    self.posts.push(summary);
                    appended += 1;
                }
            }
        }
        appended
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading listing posts.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the next page can't be fetched.
    #[error("loading more posts: {0}")]
    Fetch(#[from] prismic::Error),

    /// Returned when a fetched post can't be displayed.
    #[error("displaying post: {0}")]
    Post(#[from] post::Error),
}
