//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: fetching posts through the
//! generation hooks ([`crate::hooks`]), rendering listing and article pages
//! ([`crate::write`]), copying the static source directory into the static
//! output directory, and generating the Atom feed.

use crate::article::{self, ArticlePage, ArticleView};
use crate::config::Config;
use crate::feed::{self, write_feed, FeedConfig};
use crate::hooks::{article_paths, article_props, listing_props, Preview};
use crate::listing::{self, Listing};
use crate::prismic::{self, ContentSource};
use crate::write::{self, Writer};
use gtmpl::Template;
use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Builds the site from a [`Config`], reading content from `source`. Listing
/// pages are written as the listing grows, one page per round of loading
/// more posts; every known article gets its own page plus a shared loading
/// page for articles generated on demand.
pub async fn build_site(
    config: &Config,
    source: &dyn ContentSource,
    preview: &Preview,
) -> Result<()> {
    // Parse the template files.
    let listing_template = parse_template(config.listing_template.iter())?;
    let post_template = parse_template(config.post_template.iter())?;

    // Blow away the old output directories so we don't have any collisions.
    // The root output directory is left alone in case the user passed the
    // wrong directory.
    rmdir(&config.posts_output_directory)?;
    rmdir(&config.listing_output_directory)?;
    rmdir(&config.static_output_directory)?;
    std::fs::create_dir_all(&config.root_output_directory)?;

    let writer = Writer {
        listing_template: &listing_template,
        post_template: &post_template,
        listing_url: &config.listing_url,
        listing_output_directory: &config.listing_output_directory,
        posts_output_directory: &config.posts_output_directory,
        home_page: &config.home_page,
        static_url: &config.static_url,
        atom_url: &config.atom_url,
        preview: preview.is_active(),
        exit_preview_url: &config.exit_preview_url,
    };

    // write the listing pages
    let props = listing_props(source, config.prismic.page_size, preview).await?;
    let mut listing = Listing::new(config.presenter(preview.is_active()), &props.first_page)?;
    let mut number = 0;
    loop {
        writer.write_listing_page(number, &listing)?;
        if !listing.has_more() {
            break;
        }
        listing.load_more(source).await?;
        number += 1;
    }
    tracing::info!(
        pages = number + 1,
        posts = listing.posts().len(),
        "wrote listing pages"
    );

    // copy /pages/index.html to /index.html
    let _ = std::fs::copy(
        config.listing_output_directory.join("index.html"),
        config.root_output_directory.join("index.html"),
    )?;

    // write the article pages
    let presenter = config.presenter(preview.is_active());
    let options = config.article_options();
    let paths = article_paths(source, preview).await?;
    for slug in &paths.slugs {
        let props = article_props(source, slug, preview).await?;
        let view = ArticleView::derive(&props, &presenter, &options)?;
        writer.write_article(&ArticlePage::Ready(Box::new(view)), slug)?;
    }
    if paths.fallback {
        writer.write_fallback()?;
    }
    tracing::info!(articles = paths.slugs.len(), "wrote article pages");

    // copy static directory
    copy_dir(
        &config.static_source_directory,
        &config.static_output_directory,
    )?;

    // create the atom feed
    let feed_path = config.root_output_directory.join("feed.atom");
    write_feed(
        FeedConfig {
            title: config.title.clone(),
            id: config.home_page.to_string(),
            author: config.author.clone(),
            home_page: config.home_page.clone(),
        },
        listing.posts(),
        File::create(&feed_path)?,
    )?;
    tracing::info!(path = %feed_path.display(), "wrote feed");

    Ok(())
}

fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    if !src.is_dir() {
        tracing::debug!(path = %src.display(), "no static directory to copy");
        return Ok(());
    }
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let relative = match entry.path().strip_prefix(src) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

// Loads the template file contents, concatenates them, and parses the result
// into a template.
fn parse_template<P: AsRef<Path>>(template_files: impl Iterator<Item = P>) -> Result<Template> {
    let mut contents = String::new();
    for template_file in template_files {
        use std::io::Read;
        let template_file = template_file.as_ref();
        File::open(template_file)
            .map_err(|e| Error::OpenTemplateFile {
                path: template_file.to_owned(),
                err: e,
            })?
            .read_to_string(&mut contents)?;
        contents.push(' ');
    }

    let mut template = Template::default();
    template.parse(&contents).map_err(Error::ParseTemplate)?;
    Ok(template)
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during fetching,
/// rendering, writing, cleaning output directories, parsing template files,
/// and other I/O.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when content can't be fetched from the CMS.
    #[error("fetching content: {0}")]
    Fetch(#[from] prismic::Error),

    /// Returned when the listing can't be built or extended.
    #[error(transparent)]
    Listing(#[from] listing::Error),

    /// Returned when an article page can't be derived.
    #[error("deriving article: {0}")]
    Article(#[from] article::Error),

    /// Returned for errors writing pages to disk as HTML files.
    #[error(transparent)]
    Write(#[from] write::Error),

    /// Returned for errors writing the feed.
    #[error(transparent)]
    Feed(#[from] feed::Error),

    /// Returned for I/O problems while cleaning output directories.
    #[error("cleaning directory `{}`: {err}", path.display())]
    Clean {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned for I/O problems while opening template files.
    #[error("opening template file `{}`: {err}", path.display())]
    OpenTemplateFile {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned for errors parsing template files.
    #[error("parsing template: {0}")]
    ParseTemplate(String),

    /// Returned when the static directory can't be walked.
    #[error("copying static assets: {0}")]
    CopyStatic(#[from] walkdir::Error),

    /// Returned for other I/O errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
