//! Support for creating Atom feeds from the list of posts.

use crate::config::Author;
use crate::post::PostSummary;
use atom_syndication::{Entry, Error as AtomError, Feed, Link, Person, Text};
use chrono::Utc;
use std::io::Write;
use url::Url;

/// Bundled configuration for creating a feed.
pub struct FeedConfig {
    pub title: String,
    pub id: String,
    pub author: Option<Author>,
    pub home_page: Url,
}

/// Creates a feed from some configuration ([`FeedConfig`]) and a list of
/// [`PostSummary`]s and writes the result to a [`std::io::Write`].
pub fn write_feed<W: Write>(config: FeedConfig, posts: &[PostSummary], w: W) -> Result<()> {
    feed(config, posts).write_to(w)?;
    Ok(())
}

fn feed(config: FeedConfig, posts: &[PostSummary]) -> Feed {
    let authors = author_to_people(config.author);
    let mut feed = Feed::default();
    feed.set_title(config.title);
    feed.set_id(config.id);
    // The newest post dates the feed; an empty feed is dated now.
    feed.set_updated(
        posts
            .iter()
            .map(|post| post.published)
            .max()
            .unwrap_or_else(|| Utc::now().into()),
    );
    feed.set_authors(authors.clone());
    feed.set_links(vec![alternate(config.home_page.to_string())]);
    feed.set_entries(
        posts
            .iter()
            .map(|post| {
                let mut entry = Entry::default();
                entry.set_id(post.url.to_string());
                entry.set_title(post.title.clone());
                entry.set_updated(post.published);
                entry.set_published(Some(post.published));
                entry.set_summary(post.subtitle.clone().map(Text::from));
                entry.set_authors(authors.clone());
                entry.set_links(vec![alternate(post.url.to_string())]);
                entry
            })
            .collect::<Vec<Entry>>(),
    );
    feed
}

fn alternate(href: String) -> Link {
    let mut link = Link::default();
    link.set_href(href);
    link.set_rel("alternate");
    link
}

fn author_to_people(author: Option<Author>) -> Vec<Person> {
    match author {
        Some(author) => {
            let mut person = Person::default();
            person.set_name(author.name);
            person.set_email(author.email);
            vec![person]
        }
        None => Vec::new(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when there is a generic I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Returned when there is an Atom-related error.
    #[error("writing feed: {0}")]
    Atom(#[from] AtomError),
}
