//! Derives everything an article page shows from a single document and its
//! neighbours: the formatted publication date, an "edited" annotation when
//! the article was republished, reading time, rendered content sections,
//! sibling links, the preview-mode affordance, and the comment widget.

use crate::comments::CommentsWidget;
use crate::date::{self, format_date, format_date_with_hour, parse_timestamp, DateWithHour};
use crate::hooks::ArticleProps;
use crate::htmlrenderer::{self, escape};
use crate::post::{self, non_empty, text_or_nil, Image, Presenter, SiblingLink};
use crate::reading_time::{reading_time, Rounding};
use gtmpl::Value;
use std::collections::HashMap;
use std::io;
use url::Url;

/// Site-wide settings that affect article rendering.
#[derive(Clone, Debug, Default)]
pub struct ArticleOptions {
    pub rounding: Rounding,
    pub comments: Option<CommentsWidget>,
}

/// A content section ready for display.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedSection {
    pub heading: Option<String>,

    /// A fragment identifier for linking to the section.
    pub anchor: String,

    pub html: String,
}

/// The derived view of one article.
#[derive(Clone, Debug)]
pub struct ArticleView {
    pub uid: String,
    pub url: Url,
    pub title: String,
    pub subtitle: Option<String>,
    pub author: String,
    pub banner: Option<Image>,

    /// The localized first-publication date.
    pub date: String,

    /// Present only when the article was republished after it first went
    /// out.
    pub edited: Option<DateWithHour>,

    /// Estimated reading time in minutes.
    pub reading_time: u32,

    pub sections: Vec<RenderedSection>,

    /// The nearest earlier article.
    pub previous: Option<SiblingLink>,

    /// The nearest later article.
    pub next: Option<SiblingLink>,

    pub preview: bool,

    pub comments: Option<CommentsWidget>,
}

impl ArticleView {
    pub fn derive(
        props: &ArticleProps,
        presenter: &Presenter,
        options: &ArticleOptions,
    ) -> Result<ArticleView> {
        let doc = &props.post;
        let uid = doc.identifier();
        let first = presenter.publication_timestamp(doc)?;
        let republished = match doc.last_publication_date.as_deref() {
            Some(last) => parse_timestamp(last)? != parse_timestamp(&first)?,
            None => false,
        };
        let edited = match republished {
            true => format_date_with_hour(
                doc.last_publication_date.as_deref(),
                presenter.timezone,
            )?,
            false => None,
        };

        let mut sections = Vec::with_capacity(doc.data.content.len());
        for (i, section) in doc.data.content.iter().enumerate() {
            let heading = non_empty(&section.heading);
            let anchor = match &heading {
                Some(heading) => slug::slugify(heading),
                None => format!("section-{}", i + 1),
            };
            let mut html = String::new();
            htmlrenderer::push_html(&mut html, &section.body, &presenter.posts_url)?;
            sections.push(RenderedSection {
                heading,
                anchor,
                html,
            });
        }

        Ok(ArticleView {
            uid: uid.to_owned(),
            url: presenter.post_url(uid)?,
            title: doc.data.title.clone(),
            subtitle: non_empty(&doc.data.subtitle),
            author: doc.data.author.clone(),
            banner: doc.data.banner.clone().filter(|b| b.url.is_some()),
            date: format_date(&first, presenter.timezone)?,
            edited,
            reading_time: reading_time(&doc.data.content, options.rounding),
            sections,
            previous: props
                .previous
                .as_ref()
                .map(|d| presenter.sibling(d))
                .transpose()?,
            next: props.next.as_ref().map(|d| presenter.sibling(d)).transpose()?,
            preview: props.preview,
            comments: options.comments.clone(),
        })
    }
}

/// An article page is either waiting on on-demand generation or ready.
#[derive(Clone, Debug)]
pub enum ArticlePage {
    /// Shown while a page that wasn't pre-built is being generated.
    Loading,
    Ready(Box<ArticleView>),
}

impl ArticlePage {
    pub fn previous(&self) -> Option<&SiblingLink> {
        match self {
            ArticlePage::Loading => None,
            ArticlePage::Ready(view) => view.previous.as_ref(),
        }
    }

    pub fn next(&self) -> Option<&SiblingLink> {
        match self {
            ArticlePage::Loading => None,
            ArticlePage::Ready(view) => view.next.as_ref(),
        }
    }
}

impl From<&RenderedSection> for Value {
    fn from(section: &RenderedSection) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("heading".to_owned(), text_or_nil(&section.heading));
        m.insert("anchor".to_owned(), Value::String(escape(&section.anchor)));
        m.insert("html".to_owned(), Value::String(section.html.clone()));
        Value::Object(m)
    }
}

impl From<&ArticlePage> for Value {
    /// Converts an [`ArticlePage`] into a template value. A loading page is
    /// `{loading: true}`; a ready page carries every [`ArticleView`] field
    /// with text HTML-escaped, plus `comments` as ready-to-embed markup.
    fn from(page: &ArticlePage) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        let view = match page {
            ArticlePage::Loading => {
                m.insert("loading".to_owned(), Value::Bool(true));
                return Value::Object(m);
            }
            ArticlePage::Ready(view) => view,
        };
        m.insert("loading".to_owned(), Value::Bool(false));
        m.insert("preview".to_owned(), Value::Bool(view.preview));
        m.insert("uid".to_owned(), Value::String(escape(&view.uid)));
        m.insert("url".to_owned(), Value::String(view.url.to_string()));
        m.insert("title".to_owned(), Value::String(escape(&view.title)));
        m.insert("subtitle".to_owned(), text_or_nil(&view.subtitle));
        m.insert("author".to_owned(), Value::String(escape(&view.author)));
        m.insert(
            "banner".to_owned(),
            match &view.banner {
                Some(banner) => {
                    let mut b: HashMap<String, Value> = HashMap::new();
                    b.insert("url".to_owned(), text_or_nil(&banner.url));
                    b.insert("alt".to_owned(), text_or_nil(&banner.alt));
                    Value::Object(b)
                }
                None => Value::Nil,
            },
        );
        m.insert("date".to_owned(), Value::String(escape(&view.date)));
        m.insert(
            "edited".to_owned(),
            match &view.edited {
                Some(edited) => {
                    let mut e: HashMap<String, Value> = HashMap::new();
                    e.insert("date".to_owned(), Value::String(escape(&edited.date)));
                    e.insert("hour".to_owned(), Value::String(escape(&edited.hour)));
                    Value::Object(e)
                }
                None => Value::Nil,
            },
        );
        m.insert(
            "reading_time".to_owned(),
            Value::String(view.reading_time.to_string()),
        );
        m.insert(
            "sections".to_owned(),
            Value::Array(view.sections.iter().map(Value::from).collect()),
        );
        m.insert(
            "comments".to_owned(),
            match &view.comments {
                Some(widget) => Value::String(widget.render()),
                None => Value::Nil,
            },
        );
        Value::Object(m)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem deriving an article view.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the article or a sibling can't be projected.
    #[error(transparent)]
    Post(#[from] post::Error),

    /// Returned when a date can't be formatted.
    #[error(transparent)]
    Date(#[from] date::Error),

    /// Returned when rich text can't be rendered.
    #[error("rendering rich text: {0}")]
    Render(#[from] io::Error),
}
