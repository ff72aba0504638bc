//! An in-memory [`ContentSource`] for unit tests. It understands the subset
//! of the query language the generator uses: `document.type` and
//! `my.<type>.uid` equality, ordering by first publication date, `after`, and
//! page size with continuation pages.

use crate::post::{ContentSection, PostData};
use crate::prismic::{
    ContentSource, Document, Error, Predicate, QueryOptions, Result,
    SearchResponse,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

const DEFAULT_PAGE_SIZE: usize = 20;

pub struct MemorySource {
    documents: Vec<Document>,
    pages: Mutex<HashMap<String, SearchResponse>>,
    fetched: Mutex<Vec<String>>,
    references: Mutex<Vec<Option<String>>>,
}

impl MemorySource {
    pub fn new(documents: Vec<Document>) -> MemorySource {
        MemorySource {
            documents,
            pages: Mutex::new(HashMap::new()),
            fetched: Mutex::new(Vec::new()),
            references: Mutex::new(Vec::new()),
        }
    }

    /// Registers a canned continuation page.
    pub fn add_page(&self, url: &str, response: SearchResponse) {
        self.pages.lock().unwrap().insert(url.to_owned(), response);
    }

    /// The continuation URLs fetched so far.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    /// The `ref` each query ran against, in query order.
    pub fn queried_references(&self) -> Vec<Option<String>> {
        self.references.lock().unwrap().clone()
    }

    fn matches(doc: &Document, predicate: &Predicate) -> bool {
        match predicate {
            Predicate::At(path, value) if path == "document.type" => {
                &doc.kind == value
            }
            Predicate::At(path, value) => {
                path == &format!("my.{}.uid", doc.kind)
                    && doc.uid.as_deref() == Some(value.as_str())
            }
        }
    }
}

#[async_trait]
impl ContentSource for MemorySource {
    async fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<SearchResponse> {
        self.references
            .lock()
            .unwrap()
            .push(options.reference.clone());
        let mut docs: Vec<Document> = self
            .documents
            .iter()
            .filter(|doc| predicates.iter().all(|p| Self::matches(doc, p)))
            .cloned()
            .collect();

        if let Some(ordering) = options.orderings.first() {
            docs.sort_by(|a, b| {
                a.first_publication_date.cmp(&b.first_publication_date)
            });
            if ordering.descending {
                docs.reverse();
            }
        }

        if let Some(after) = &options.after {
            docs = match docs.iter().position(|doc| &doc.id == after) {
                Some(i) => docs.split_off(i + 1),
                None => Vec::new(),
            };
        }

        let page_size = options.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        let total = docs.len();
        let chunks: Vec<Vec<Document>> =
            docs.chunks(page_size).map(|c| c.to_vec()).collect();
        let total_pages = chunks.len();

        let mut responses: Vec<SearchResponse> = chunks
            .into_iter()
            .enumerate()
            .map(|(i, results)| SearchResponse {
                page: i + 1,
                results_per_page: page_size,
                total_results_size: total,
                total_pages,
                next_page: None,
                prev_page: None,
                results,
            })
            .collect();

        let mut pages = self.pages.lock().unwrap();
        let base = pages.len();
        for i in (1..responses.len()).rev() {
            let url = format!("memory://search/{}", base + i);
            responses[i - 1].next_page = Some(url.clone());
            pages.insert(url, responses[i].clone());
        }

        Ok(responses.into_iter().next().unwrap_or(SearchResponse {
            page: 1,
            results_per_page: page_size,
            total_results_size: 0,
            total_pages: 0,
            next_page: None,
            prev_page: None,
            results: Vec::new(),
        }))
    }

    async fn fetch_page(&self, url: &str) -> Result<SearchResponse> {
        self.fetched.lock().unwrap().push(url.to_owned());
        match self.pages.lock().unwrap().get(url) {
            Some(response) => Ok(response.clone()),
            None => Err(Error::Status {
                url: url.to_owned(),
                status: 404,
            }),
        }
    }
}

/// Builds a `posts` document.
pub fn post(uid: &str, first_publication_date: &str, title: &str) -> Document {
    Document {
        id: format!("id-{}", uid),
        uid: Some(uid.to_owned()),
        kind: String::from("posts"),
        first_publication_date: Some(first_publication_date.to_owned()),
        last_publication_date: Some(first_publication_date.to_owned()),
        data: PostData {
            title: title.to_owned(),
            subtitle: Some(format!("About {}", title)),
            author: String::from("Danilo Vieira"),
            banner: None,
            content: Vec::<ContentSection>::new(),
        },
    }
}

/// Builds a page of results with the given continuation.
pub fn page(results: Vec<Document>, next_page: Option<&str>) -> SearchResponse {
    SearchResponse {
        page: 1,
        results_per_page: results.len(),
        total_results_size: results.len(),
        total_pages: 1,
        next_page: next_page.map(str::to_owned),
        prev_page: None,
        results,
    }
}
