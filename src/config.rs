//! Loads the project configuration (`spacetraveling.yaml`) and the theme it
//! points at (`theme/theme.yaml`), resolving every URL and output path the
//! build needs.

use crate::article::ArticleOptions;
use crate::comments::CommentsWidget;
use crate::post::Presenter;
use crate::reading_time::Rounding;
use chrono_tz::Tz;
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const PROJECT_FILE: &str = "spacetraveling.yaml";

/// Overrides `prismic.access_token` when set.
pub const ACCESS_TOKEN_VAR: &str = "PRISMIC_ACCESS_TOKEN";

fn default_home_page() -> String {
    String::from("pages/index.html")
}

fn default_timezone() -> Tz {
    chrono_tz::America::Sao_Paulo
}

fn default_exit_preview_url() -> String {
    String::from("/api/exit-preview")
}

fn default_page_size() -> usize {
    2
}

#[derive(Deserialize)]
struct Project {
    site_root: Url,

    #[serde(default = "default_home_page")]
    home_page: String,

    title: String,

    #[serde(default)]
    author: Option<Author>,

    prismic: PrismicSettings,

    #[serde(default = "default_timezone")]
    timezone: Tz,

    #[serde(default = "default_exit_preview_url")]
    exit_preview_url: String,

    #[serde(default)]
    reading_time: Rounding,

    #[serde(default)]
    comments: Option<CommentsWidget>,
}

#[derive(Deserialize)]
struct Theme {
    listing_template: Vec<PathBuf>,
    post_template: Vec<PathBuf>,
}

/// The site author, credited in the feed.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Author {
    pub name: String,

    #[serde(default)]
    pub email: Option<String>,
}

/// Where and how to reach the CMS.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct PrismicSettings {
    /// The API entry point, e.g. `https://my-repo.cdn.prismic.io/api/v2`.
    pub endpoint: Url,

    #[serde(default)]
    pub access_token: Option<String>,

    /// Posts per listing page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl PrismicSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// The resolved build configuration.
pub struct Config {
    pub title: String,
    pub author: Option<Author>,
    pub home_page: Url,
    pub listing_url: Url,
    pub posts_url: Url,
    pub static_url: Url,
    pub atom_url: Url,
    pub listing_template: Vec<PathBuf>,
    pub post_template: Vec<PathBuf>,
    pub root_output_directory: PathBuf,
    pub listing_output_directory: PathBuf,
    pub posts_output_directory: PathBuf,
    pub static_source_directory: PathBuf,
    pub static_output_directory: PathBuf,
    pub prismic: PrismicSettings,
    pub timezone: Tz,
    pub exit_preview_url: String,
    pub reading_time: Rounding,
    pub comments: Option<CommentsWidget>,
}

impl Config {
    /// Searches `dir` and then each of its ancestors for the project file and
    /// loads the first one found.
    pub fn from_directory(dir: &Path, output_directory: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path, output_directory)
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, output_directory),
                None => Err(Error::ProjectNotFound),
            }
        }
    }

    pub fn from_project_file(path: &Path, output_directory: &Path) -> Result<Config> {
        let project: Project = serde_yaml::from_reader(open(path)?)?;
        let project_root = path
            .parent()
            .ok_or_else(|| Error::NoParentDirectory(path.to_owned()))?;
        let theme_dir = project_root.join("theme");
        let theme: Theme = serde_yaml::from_reader(open(&theme_dir.join("theme.yaml"))?)?;

        let site_root = with_trailing_slash(project.site_root);
        let mut prismic = project.prismic;
        if let Ok(token) = std::env::var(ACCESS_TOKEN_VAR) {
            prismic.access_token = Some(token);
        }

        Ok(Config {
            title: project.title,
            author: project.author,
            home_page: site_root.join(&project.home_page)?,
            listing_url: site_root.join("pages/")?,
            posts_url: site_root.join("posts/")?,
            static_url: site_root.join("static/")?,
            atom_url: site_root.join("feed.atom")?,
            listing_template: theme
                .listing_template
                .iter()
                .map(|relpath| theme_dir.join(relpath))
                .collect(),
            post_template: theme
                .post_template
                .iter()
                .map(|relpath| theme_dir.join(relpath))
                .collect(),
            root_output_directory: output_directory.to_owned(),
            listing_output_directory: output_directory.join("pages"),
            posts_output_directory: output_directory.join("posts"),
            static_source_directory: project_root.join("static"),
            static_output_directory: output_directory.join("static"),
            prismic,
            timezone: project.timezone,
            exit_preview_url: project.exit_preview_url,
            reading_time: project.reading_time,
            comments: project.comments,
        })
    }

    pub fn presenter(&self, preview: bool) -> Presenter {
        Presenter {
            posts_url: self.posts_url.clone(),
            timezone: self.timezone,
            preview,
        }
    }

    pub fn article_options(&self) -> ArticleOptions {
        ArticleOptions {
            rounding: self.reading_time,
            comments: self.comments.clone(),
        }
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|err| Error::Open {
        path: path.to_owned(),
        err,
    })
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when no ancestor of the start directory holds a project file.
    #[error("could not find `{}` in any parent directory", PROJECT_FILE)]
    ProjectNotFound,

    /// Returned when a configuration file can't be opened.
    #[error("opening `{}`: {err}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned when a configuration file isn't valid.
    #[error("loading configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Returned when a configured URL can't be joined.
    #[error("resolving site URLs: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Returned when the project file path has no parent directory.
    #[error("can't get parent directory for project file `{}`", .0.display())]
    NoParentDirectory(PathBuf),
}
