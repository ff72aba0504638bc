//! Defines the post data the CMS stores ([`PostData`]) and the read-only
//! projections built from it: [`PostSummary`] for listing pages and
//! [`SiblingLink`] for previous/next navigation. A [`Presenter`] carries the
//! context a projection needs (where post pages live and which time zone
//! dates are shown in).

use crate::date::{self, parse_timestamp};
use crate::htmlrenderer::escape;
use crate::prismic::Document;
use crate::richtext::RichText;
use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use gtmpl::Value;
use serde::Deserialize;
use std::collections::HashMap;
use url::Url;

/// The custom fields of a `posts` document.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PostData {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub subtitle: Option<String>,

    #[serde(default)]
    pub author: String,

    #[serde(default)]
    pub banner: Option<Image>,

    #[serde(default)]
    pub content: Vec<ContentSection>,
}

/// An image field. An empty image field comes back as `{}`, hence the
/// optional URL.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Image {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub alt: Option<String>,
}

/// One section of an article: a heading followed by rich-text body.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ContentSection {
    #[serde(default)]
    pub heading: Option<String>,

    #[serde(default)]
    pub body: RichText,
}

/// A post as shown on a listing page.
#[derive(Clone, Debug, PartialEq)]
pub struct PostSummary {
    /// The identifier the post is addressed by (see [`Document::identifier`]).
    pub uid: String,

    pub url: Url,

    /// The localized first-publication date.
    pub date: String,

    /// The first-publication instant, kept for the feed.
    pub published: DateTime<FixedOffset>,

    pub title: String,

    pub subtitle: Option<String>,

    pub author: String,
}

/// A link to a neighbouring article.
#[derive(Clone, Debug, PartialEq)]
pub struct SiblingLink {
    pub uid: String,
    pub title: String,
    pub url: Url,
}

/// Context for turning [`Document`]s into view projections.
#[derive(Clone, Debug)]
pub struct Presenter {
    /// The base URL for post pages. A post's page is
    /// `{posts_url}{uid}.html`, so this should end in a trailing slash.
    pub posts_url: Url,

    /// The time zone dates are displayed in.
    pub timezone: Tz,

    /// Whether staged content is shown. Drafts that were never published
    /// have no first-publication date and are dated by their last
    /// publication, or by the build time, instead of being rejected.
    pub preview: bool,
}

impl Presenter {
    pub fn post_url(&self, uid: &str) -> Result<Url> {
        Ok(self.posts_url.join(&format!("{}.html", uid))?)
    }

    /// The timestamp a document is dated by: its first publication. Outside
    /// preview mode an undated document is an error.
    pub fn publication_timestamp(&self, doc: &Document) -> Result<String> {
        if let Some(first) = &doc.first_publication_date {
            return Ok(first.clone());
        }
        if !self.preview {
            return Err(Error::MissingPublicationDate {
                uid: doc.identifier().to_owned(),
            });
        }
        tracing::debug!(uid = doc.identifier(), "dating unpublished draft");
        Ok(match &doc.last_publication_date {
            Some(last) => last.clone(),
            None => Utc::now().to_rfc3339(),
        })
    }

    /// Projects a document into its listing view. Fails if the document
    /// can't be dated (see [`Presenter::publication_timestamp`]) or the date
    /// can't be parsed.
    pub fn summarize(&self, doc: &Document) -> Result<PostSummary> {
        let uid = doc.identifier();
        let first = self.publication_timestamp(doc)?;
        Ok(PostSummary {
            uid: uid.to_owned(),
            url: self.post_url(uid)?,
            date: date::format_date(&first, self.timezone)?,
            published: parse_timestamp(&first)?,
            title: doc.data.title.clone(),
            subtitle: non_empty(&doc.data.subtitle),
            author: doc.data.author.clone(),
        })
    }

    pub fn sibling(&self, doc: &Document) -> Result<SiblingLink> {
        let uid = doc.identifier();
        Ok(SiblingLink {
            uid: uid.to_owned(),
            title: doc.data.title.clone(),
            url: self.post_url(uid)?,
        })
    }
}

/// Treats empty and whitespace-only strings as absent.
pub(crate) fn non_empty(s: &Option<String>) -> Option<String> {
    s.as_ref().filter(|s| !s.trim().is_empty()).cloned()
}

/// Converts an optional string into an escaped template string or `Nil`.
pub(crate) fn text_or_nil(s: &Option<String>) -> Value {
    match s {
        Some(s) => Value::String(escape(s)),
        None => Value::Nil,
    }
}

impl From<&PostSummary> for Value {
    /// Converts a [`PostSummary`] into a template value with fields `uid`,
    /// `url`, `date`, `title`, `subtitle`, and `author`. Text is HTML-escaped.
    fn from(p: &PostSummary) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("uid".to_owned(), Value::String(escape(&p.uid)));
        m.insert("url".to_owned(), Value::String(p.url.to_string()));
        m.insert("date".to_owned(), Value::String(escape(&p.date)));
        m.insert("title".to_owned(), Value::String(escape(&p.title)));
        m.insert("subtitle".to_owned(), text_or_nil(&p.subtitle));
        m.insert("author".to_owned(), Value::String(escape(&p.author)));
        Value::Object(m)
    }
}

impl From<&SiblingLink> for Value {
    fn from(link: &SiblingLink) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("uid".to_owned(), Value::String(escape(&link.uid)));
        m.insert("title".to_owned(), Value::String(escape(&link.title)));
        m.insert("url".to_owned(), Value::String(link.url.to_string()));
        Value::Object(m)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem projecting a document for display.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a document that must be dated isn't.
    #[error("post `{uid}` has no first publication date")]
    MissingPublicationDate { uid: String },

    /// Returned when a date can't be formatted.
    #[error(transparent)]
    Date(#[from] date::Error),

    /// Returned when a post URL can't be built.
    #[error("building post URL: {0}")]
    UrlParse(#[from] url::ParseError),
}
