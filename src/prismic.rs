//! A client for the headless CMS's document search API (Prismic REST v2).
//!
//! Everything that fetches content goes through the [`ContentSource`] trait so
//! callers receive an explicitly constructed handle rather than reaching for a
//! global client. [`PrismicClient`] is the HTTP implementation.
//!
//! A query is a list of [`Predicate`]s plus [`QueryOptions`]. Every query is
//! made against a content *ref*: the repository's master ref for published
//! content, or a preview ref for staged content. Results are paginated; a
//! [`SearchResponse`] carries the URL of the next page, if any, which is
//! fetched verbatim with [`ContentSource::fetch_page`].

use crate::post::PostData;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tokio::sync::OnceCell;
use url::Url;

/// A document as returned by the search API.
#[derive(Clone, Debug, Deserialize)]
pub struct Document {
    pub id: String,

    #[serde(default)]
    pub uid: Option<String>,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub first_publication_date: Option<String>,

    #[serde(default)]
    pub last_publication_date: Option<String>,

    pub data: PostData,
}

impl Document {
    /// The identifier a post is addressed by: its uid, or its document id if
    /// it has none.
    pub fn identifier(&self) -> &str {
        self.uid.as_deref().unwrap_or(&self.id)
    }
}

/// One page of search results.
#[derive(Clone, Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub page: usize,

    #[serde(default)]
    pub results_per_page: usize,

    #[serde(default)]
    pub total_results_size: usize,

    #[serde(default)]
    pub total_pages: usize,

    /// The continuation cursor. `None` means this is the last page.
    #[serde(default)]
    pub next_page: Option<String>,

    #[serde(default)]
    pub prev_page: Option<String>,

    pub results: Vec<Document>,
}

/// A query predicate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Predicate {
    /// Matches documents whose field at `path` equals `value`, e.g.
    /// `[at(document.type, "posts")]`.
    At(String, String),
}

impl Predicate {
    pub fn at(path: &str, value: &str) -> Predicate {
        Predicate::At(path.to_owned(), value.to_owned())
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Predicate::At(path, value) => {
                write!(f, "[at({}, \"{}\")]", path, escape_value(value))
            }
        }
    }
}

fn escape_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Renders a predicate list as the `q` query parameter.
fn render_predicates(predicates: &[Predicate]) -> String {
    let mut q = String::from("[");
    for predicate in predicates {
        q.push_str(&predicate.to_string());
    }
    q.push(']');
    q
}

/// A sort key for query results.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ordering {
    pub field: String,
    pub descending: bool,
}

impl Ordering {
    pub fn asc(field: &str) -> Ordering {
        Ordering {
            field: field.to_owned(),
            descending: false,
        }
    }

    pub fn desc(field: &str) -> Ordering {
        Ordering {
            field: field.to_owned(),
            descending: true,
        }
    }
}

/// Renders orderings as the `orderings` query parameter, e.g.
/// `[document.first_publication_date desc]`.
fn render_orderings(orderings: &[Ordering]) -> String {
    let fields: Vec<String> = orderings
        .iter()
        .map(|o| match o.descending {
            true => format!("{} desc", o.field),
            false => o.field.clone(),
        })
        .collect();
    format!("[{}]", fields.join(","))
}

/// Options for a single query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Results per page; the API's default applies when unset.
    pub page_size: Option<usize>,

    pub orderings: Vec<Ordering>,

    /// Only return documents after the document with this id, in the given
    /// ordering.
    pub after: Option<String>,

    /// The content ref to query; the master ref when unset.
    pub reference: Option<String>,
}

/// A source of CMS content.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Runs a document search.
    async fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<SearchResponse>;

    /// Fetches a continuation page by its `next_page` URL.
    async fn fetch_page(&self, url: &str) -> Result<SearchResponse>;
}

/// Fetches the single document of type `kind` whose uid is `uid`.
pub async fn get_by_uid(
    source: &dyn ContentSource,
    kind: &str,
    uid: &str,
    reference: Option<&str>,
) -> Result<Document> {
    let options = QueryOptions {
        page_size: Some(1),
        reference: reference.map(str::to_owned),
        ..QueryOptions::default()
    };
    let response = source
        .query(&[Predicate::at(&format!("my.{}.uid", kind), uid)], &options)
        .await?;
    response
        .results
        .into_iter()
        .next()
        .ok_or_else(|| Error::NotFound {
            kind: kind.to_owned(),
            uid: uid.to_owned(),
        })
}

/// The HTTP [`ContentSource`].
pub struct PrismicClient {
    client: Client,

    /// The API entry point, e.g. `https://my-repo.cdn.prismic.io/api/v2`.
    endpoint: Url,

    access_token: Option<String>,

    timeout: Option<Duration>,

    /// Resolved on first use and reused for the client's lifetime.
    master_ref: OnceCell<String>,
}

#[derive(Deserialize)]
struct ApiInfo {
    refs: Vec<ApiRef>,
}

#[derive(Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,

    #[serde(default, rename = "isMasterRef")]
    is_master_ref: bool,
}

impl PrismicClient {
    pub fn new(
        endpoint: Url,
        access_token: Option<String>,
        timeout: Option<Duration>,
    ) -> PrismicClient {
        PrismicClient {
            client: Client::new(),
            endpoint,
            access_token,
            timeout,
            master_ref: OnceCell::new(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
    ) -> Result<T> {
        tracing::debug!(url = %url, "fetching");
        let mut request = self.client.get(url.clone());
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.json().await?)
    }

    fn with_token(&self, mut url: Url) -> Url {
        if let Some(token) = &self.access_token {
            url.query_pairs_mut().append_pair("access_token", token);
        }
        url
    }

    async fn master_ref(&self) -> Result<&str> {
        let reference = self
            .master_ref
            .get_or_try_init(|| async {
                let info: ApiInfo =
                    self.get_json(self.with_token(self.endpoint.clone())).await?;
                info.refs
                    .into_iter()
                    .find(|r| r.is_master_ref)
                    .map(|r| r.reference)
                    .ok_or(Error::MissingMasterRef)
            })
            .await?;
        Ok(reference)
    }

    /// Builds the search URL for a query against `reference`.
    fn search_url(
        &self,
        reference: &str,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<Url> {
        let mut base = self.endpoint.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let mut url = base.join("documents/search")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("ref", reference);
            if !predicates.is_empty() {
                pairs.append_pair("q", &render_predicates(predicates));
            }
            if let Some(page_size) = options.page_size {
                pairs.append_pair("pageSize", &page_size.to_string());
            }
            if !options.orderings.is_empty() {
                pairs.append_pair("orderings", &render_orderings(&options.orderings));
            }
            if let Some(after) = &options.after {
                pairs.append_pair("after", after);
            }
        }
        Ok(self.with_token(url))
    }
}

#[async_trait]
impl ContentSource for PrismicClient {
    async fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<SearchResponse> {
        let reference = match &options.reference {
            Some(reference) => reference.clone(),
            None => self.master_ref().await?.to_owned(),
        };
        let url = self.search_url(&reference, predicates, options)?;
        self.get_json(url).await
    }

    async fn fetch_page(&self, url: &str) -> Result<SearchResponse> {
        self.get_json(Url::parse(url)?).await
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem talking to the CMS.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the request fails or the body isn't the expected JSON.
    #[error("requesting CMS content: {0}")]
    Http(#[from] reqwest::Error),

    /// Returned when the CMS answers with a non-success status.
    #[error("CMS returned status {status} for {url}")]
    Status { url: String, status: u16 },

    /// Returned when the API entry point lists no master ref.
    #[error("CMS API lists no master ref")]
    MissingMasterRef,

    /// Returned when no document has the requested uid.
    #[error("no `{kind}` document with uid `{uid}`")]
    NotFound { kind: String, uid: String },

    /// Returned when a results page points back at a page already fetched.
    #[error("CMS cursor `{url}` repeats an earlier page")]
    RepeatedCursor { url: String },

    /// Returned when a URL can't be parsed or joined.
    #[error("invalid CMS URL: {0}")]
    UrlParse(#[from] url::ParseError),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_render_predicates() {
        assert_eq!(
            r#"[[at(document.type, "posts")]]"#,
            render_predicates(&[Predicate::at("document.type", "posts")])
        );
        assert_eq!(
            r#"[[at(my.posts.uid, "say \"hi\"")]]"#,
            render_predicates(&[Predicate::at("my.posts.uid", "say \"hi\"")])
        );
    }

    #[test]
    fn test_render_orderings() {
        assert_eq!(
            "[document.first_publication_date desc]",
            render_orderings(&[Ordering::desc("document.first_publication_date")])
        );
        assert_eq!(
            "[my.posts.title,document.first_publication_date desc]",
            render_orderings(&[
                Ordering::asc("my.posts.title"),
                Ordering::desc("document.first_publication_date"),
            ])
        );
    }

    #[test]
    fn test_search_url() -> Result<()> {
        let client = PrismicClient::new(
            Url::parse("https://blog.cdn.prismic.io/api/v2")?,
            Some(String::from("secret")),
            None,
        );
        let url = client.search_url(
            "master",
            &[Predicate::at("document.type", "posts")],
            &QueryOptions {
                page_size: Some(2),
                orderings: vec![Ordering::desc("document.first_publication_date")],
                after: Some(String::from("YAbc")),
                reference: None,
            },
        )?;
        assert_eq!("/api/v2/documents/search", url.path());
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let wanted: Vec<(String, String)> = vec![
            ("ref", "master"),
            ("q", r#"[[at(document.type, "posts")]]"#),
            ("pageSize", "2"),
            ("orderings", "[document.first_publication_date desc]"),
            ("after", "YAbc"),
            ("access_token", "secret"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();
        assert_eq!(wanted, pairs);
        Ok(())
    }

    #[test]
    fn test_document_identifier_falls_back_to_id() -> serde_json::Result<()> {
        let doc: Document = serde_json::from_str(
            r#"{"id": "YAbc", "type": "posts", "data": {"title": "Untitled"}}"#,
        )?;
        assert_eq!("YAbc", doc.identifier());
        assert_eq!(None, doc.first_publication_date);
        Ok(())
    }
}
