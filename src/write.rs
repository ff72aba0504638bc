//! Templates listing and article pages and writes them to disk.

use crate::article::ArticlePage;
use crate::listing::Listing;
use gtmpl::{Context, Template, Value};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use url::Url;

/// The file name of the page shown while an article is generated on demand.
pub const FALLBACK_FILE: &str = "fallback.html";

/// Responsible for templating and writing listing and article pages.
pub struct Writer<'a> {
    /// The template for listing pages.
    pub listing_template: &'a Template,

    /// The template for article pages.
    pub post_template: &'a Template,

    /// The base URL for listing pages. The first page is located at
    /// `{listing_url}/index.html`, the one after it at `{listing_url}/1.html`,
    /// etc.
    pub listing_url: &'a Url,

    /// The directory in which listing pages are written.
    pub listing_output_directory: &'a Path,

    /// The directory in which article pages are written, one
    /// `{uid}.html` file per article.
    pub posts_output_directory: &'a Path,

    /// The URL for the site's home page, typically the destination for the
    /// site-header link.
    pub home_page: &'a Url,

    /// The URL for the static assets, typically for the theme's stylesheet.
    pub static_url: &'a Url,

    /// The URL for the Atom feed.
    pub atom_url: &'a Url,

    /// Whether the pages show staged content.
    pub preview: bool,

    /// Where the "exit preview" link points in preview mode.
    pub exit_preview_url: &'a str,
}

impl Writer<'_> {
    /// Takes a single [`Page`], templates it, and writes it to disk.
    fn write_page(&self, page: &Page) -> Result<()> {
        let mut value = page.to_value();
        if let Value::Object(obj) = &mut value {
            obj.insert(
                "home_page".to_owned(),
                Value::String(self.home_page.to_string()),
            );
            obj.insert(
                "static_url".to_owned(),
                Value::String(self.static_url.to_string()),
            );
            obj.insert(
                "atom_url".to_owned(),
                Value::String(self.atom_url.to_string()),
            );
            obj.insert("preview".to_owned(), Value::Bool(self.preview));
            obj.insert(
                "exit_preview_url".to_owned(),
                Value::String(self.exit_preview_url.to_owned()),
            );
        }
        if let Some(dir) = page.file_path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        page.template.execute(
            &mut std::fs::File::create(&page.file_path)?,
            &Context::from(value)?,
        )?;
        Ok(())
    }

    /// Writes the listing as it stands after `number` rounds of loading more
    /// posts. The page links to the following one while the listing still has
    /// a cursor.
    pub fn write_listing_page(&self, number: usize, listing: &Listing) -> Result<PathBuf> {
        let page = Page {
            item: Value::Array(listing.posts().iter().map(Value::from).collect()),
            file_path: self.listing_output_directory.join(listing_file_name(number)),
            prev: match number {
                0 => Value::Nil,
                n => url_value(self.listing_url, &listing_file_name(n - 1))?,
            },
            next: match listing.has_more() {
                false => Value::Nil,
                true => url_value(self.listing_url, &listing_file_name(number + 1))?,
            },
            template: self.listing_template,
        };
        self.write_page(&page)?;
        Ok(page.file_path)
    }

    /// Writes an article page. `prev` and `next` are the neighbouring
    /// articles' links (`uid`, `title`, `url`).
    pub fn write_article(&self, article: &ArticlePage, uid: &str) -> Result<PathBuf> {
        let page = Page {
            item: Value::from(article),
            file_path: self.posts_output_directory.join(format!("{}.html", uid)),
            prev: article.previous().map(Value::from).unwrap_or(Value::Nil),
            next: article.next().map(Value::from).unwrap_or(Value::Nil),
            template: self.post_template,
        };
        self.write_page(&page)?;
        Ok(page.file_path)
    }

    /// Writes the loading page served while an article that wasn't pre-built
    /// is generated.
    pub fn write_fallback(&self) -> Result<PathBuf> {
        let page = Page {
            item: Value::from(&ArticlePage::Loading),
            file_path: self.posts_output_directory.join(FALLBACK_FILE),
            prev: Value::Nil,
            next: Value::Nil,
            template: self.post_template,
        };
        self.write_page(&page)?;
        Ok(page.file_path)
    }
}

fn listing_file_name(number: usize) -> String {
    match number {
        0 => String::from("index.html"),
        n => format!("{}.html", n),
    }
}

fn url_value(base: &Url, file_name: &str) -> Result<Value> {
    Ok(Value::String(base.join(file_name)?.to_string()))
}

/// An object representing an output HTML file. A [`Page`] can be converted to a
/// [`Value`] and thus rendered in a template via [`Page::to_value`].
struct Page<'a> {
    /// The main item for the page.
    item: Value,

    /// The target location on disk for the output file.
    file_path: PathBuf,

    /// The page before this one, if any.
    prev: Value,

    /// The page after this one, if any.
    next: Value,

    /// The template with which the page will be rendered.
    template: &'a Template,
}

impl Page<'_> {
    /// Converts a [`Page`] into a [`Value`]. The result is a [`Value::Object`]
    /// with fields `item`, `prev`, and `next` (see [`Page`] for descriptions).
    fn to_value(&self) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("item".to_owned(), self.item.clone());
        m.insert("prev".to_owned(), self.prev.clone());
        m.insert("next".to_owned(), self.next.clone());
        Value::Object(m)
    }
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An error during templating.
    #[error("templating page: {0}")]
    Template(String),

    /// An error building a page URL.
    #[error("building page URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// An error writing the output files.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`]. This
    /// allows us to use the `?` operator for fallible template operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}
