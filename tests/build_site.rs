//! Builds the demo theme against a mock CMS and checks the written site.

use httpmock::prelude::*;
use serde_json::{json, Value};
use spacetraveling::build::build_site;
use spacetraveling::config::Config;
use spacetraveling::hooks::Preview;
use spacetraveling::prismic::PrismicClient;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

const TYPE_QUERY: &str = r#"[[at(document.type, "posts")]]"#;
const BY_DATE: &str = "document.first_publication_date";

struct Post {
    uid: &'static str,
    date: &'static str,
    title: &'static str,
}

const POSTS: [Post; 3] = [
    Post {
        uid: "criando-um-app-cra-do-zero",
        date: "2021-03-25T19:25:28+0000",
        title: "Criando um app CRA do zero",
    },
    Post {
        uid: "como-utilizar-hooks",
        date: "2021-04-01T12:00:00+0000",
        title: "Como utilizar Hooks",
    },
    Post {
        uid: "mapas-com-react",
        date: "2021-04-10T15:30:00+0000",
        title: "Mapas com React",
    },
];

fn document(post: &Post) -> Value {
    let body = vec!["palavra"; 250].join(" ");
    json!({
        "id": format!("id-{}", post.uid),
        "uid": post.uid,
        "type": "posts",
        "first_publication_date": post.date,
        "last_publication_date": post.date,
        "data": {
            "title": post.title,
            "subtitle": "Pensando em sincronização em vez de ciclos de vida",
            "author": "Joseph Oliveira",
            "banner": {"url": "https://images.prismic.io/banner.png", "alt": null},
            "content": [
                {
                    "heading": "Proin et varius",
                    "body": [{"type": "paragraph", "text": body, "spans": []}]
                }
            ]
        }
    })
}

fn results(docs: Vec<Value>, next_page: Option<String>) -> Value {
    json!({
        "page": 1,
        "results_per_page": docs.len(),
        "total_results_size": docs.len(),
        "total_pages": 1,
        "next_page": next_page,
        "prev_page": null,
        "results": docs
    })
}

/// Serves three posts, answering searches only when they run against
/// `reference`.
async fn mock_cms(server: &MockServer, reference: &str) {
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2");
            then.status(200).json_body(json!({
                "refs": [{"id": "master", "ref": "master-ref", "isMasterRef": true}]
            }));
        })
        .await;

    // listing, newest first, two per page
    let cursor = server.url("/cursor/listing/2");
    let newest_first = format!("[{} desc]", BY_DATE);
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v2/documents/search")
                .query_param("ref", reference)
                .query_param("q", TYPE_QUERY)
                .query_param("pageSize", "2")
                .query_param("orderings", newest_first.as_str());
            then.status(200).json_body(results(
                vec![document(&POSTS[2]), document(&POSTS[1])],
                Some(cursor),
            ));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/cursor/listing/2");
            then.status(200)
                .json_body(results(vec![document(&POSTS[0])], None));
        })
        .await;

    // every article
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v2/documents/search")
                .query_param("ref", reference)
                .query_param("q", TYPE_QUERY)
                .query_param("pageSize", "100");
            then.status(200)
                .json_body(results(POSTS.iter().map(document).collect(), None));
        })
        .await;

    for (i, post) in POSTS.iter().enumerate() {
        let doc = document(post);
        let by_uid = format!(r#"[[at(my.posts.uid, "{}")]]"#, post.uid);
        let after = format!("id-{}", post.uid);
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/v2/documents/search")
                    .query_param("ref", reference)
                    .query_param("q", by_uid.as_str());
                then.status(200).json_body(results(vec![doc], None));
            })
            .await;

        let previous = match i {
            0 => Vec::new(),
            _ => vec![document(&POSTS[i - 1])],
        };
        let next = match POSTS.get(i + 1) {
            Some(next) => vec![document(next)],
            None => Vec::new(),
        };
        for (orderings, sibling) in vec![
            (format!("[{} desc]", BY_DATE), previous),
            (format!("[{}]", BY_DATE), next),
        ] {
            server
                .mock_async(|when, then| {
                    when.method(GET)
                        .path("/api/v2/documents/search")
                        .query_param("ref", reference)
                        .query_param("q", TYPE_QUERY)
                        .query_param("pageSize", "1")
                        .query_param("after", after.as_str())
                        .query_param("orderings", orderings.as_str());
                    then.status(200).json_body(results(sibling, None));
                })
                .await;
        }
    }
}

/// Lays out a project using the demo theme and static assets, pointed at
/// `endpoint`.
fn project(root: &Path, endpoint: &str) -> PathBuf {
    let demo = Path::new(env!("CARGO_MANIFEST_DIR")).join("demo");
    let theme = root.join("theme");
    let assets = root.join("static");
    fs::create_dir_all(&theme).unwrap();
    fs::create_dir_all(&assets).unwrap();
    for file in &["theme.yaml", "listing.html", "post.html"] {
        fs::copy(demo.join("theme").join(file), theme.join(file)).unwrap();
    }
    fs::copy(demo.join("static").join("style.css"), assets.join("style.css")).unwrap();

    let project_file = root.join("spacetraveling.yaml");
    fs::write(
        &project_file,
        format!(
            "site_root: https://spacetraveling.example.org\n\
             title: spacetraveling.\n\
             author:\n  name: Joseph Oliveira\n\
             prismic:\n  endpoint: {}\n  page_size: 2\n\
             comments:\n  repo: davilacerda/ignite-react-challenge-05\n",
            endpoint
        ),
    )
    .unwrap();
    project_file
}

fn read(path: PathBuf) -> String {
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("reading {}: {}", path.display(), e))
}

#[tokio::test]
async fn test_build_site() {
    let server = MockServer::start_async().await;
    mock_cms(&server, "master-ref").await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("_output");
    let project_file = project(&dir.path().join("project"), &server.url("/api/v2"));
    let config = Config::from_project_file(&project_file, &output).unwrap();
    let client = PrismicClient::new(
        Url::parse(&server.url("/api/v2")).unwrap(),
        None,
        None,
    );

    build_site(&config, &client, &Preview::default())
        .await
        .unwrap();

    // the first listing page shows the newest two posts and links to the next
    let first = read(output.join("pages").join("index.html"));
    assert!(first.contains("Mapas com React"));
    assert!(first.contains("Como utilizar Hooks"));
    assert!(!first.contains("Criando um app CRA do zero"));
    assert!(first.contains("1 abr 2021"));
    assert!(first.contains(
        r#"<a class="load-more" href="https://spacetraveling.example.org/pages/1.html">Carregar mais posts</a>"#
    ));
    assert!(!first.contains("Sair do modo Preview"));
    assert_eq!(first, read(output.join("index.html")));

    // the second page holds every post and no more cursor
    let second = read(output.join("pages").join("1.html"));
    let positions: Vec<usize> = ["Mapas com React", "Como utilizar Hooks", "Criando um app CRA do zero"]
        .iter()
        .map(|title| second.find(title).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert!(!second.contains("Carregar mais posts"));
    assert!(!output.join("pages").join("2.html").exists());

    // article pages link their neighbours by publication date
    let middle = read(output.join("posts").join("como-utilizar-hooks.html"));
    assert!(middle.contains("<h1>Como utilizar Hooks</h1>"));
    assert!(middle.contains("<time>2 min</time>"));
    assert!(middle.contains(r#"<section id="proin-et-varius">"#));
    assert!(middle.contains(
        r#"<a class="previous" href="https://spacetraveling.example.org/posts/criando-um-app-cra-do-zero.html"><span>Criando um app CRA do zero</span>Post anterior</a>"#
    ));
    assert!(middle.contains(
        r#"<a class="next" href="https://spacetraveling.example.org/posts/mapas-com-react.html"><span>Mapas com React</span>Próximo post</a>"#
    ));
    assert!(middle.contains(r#"repo="davilacerda/ignite-react-challenge-05""#));
    assert!(!middle.contains("editado em"));

    let oldest = read(output.join("posts").join("criando-um-app-cra-do-zero.html"));
    assert!(!oldest.contains("Post anterior"));
    assert!(oldest.contains("Próximo post"));

    let newest = read(output.join("posts").join("mapas-com-react.html"));
    assert!(newest.contains("Post anterior"));
    assert!(!newest.contains("Próximo post"));

    assert!(read(output.join("posts").join("fallback.html")).contains("<h1>Carregando...</h1>"));

    let feed = read(output.join("feed.atom"));
    assert_eq!(3, feed.matches("<entry>").count());

    assert!(output.join("static").join("style.css").exists());
}

#[tokio::test]
async fn test_build_site_preview() {
    let server = MockServer::start_async().await;
    mock_cms(&server, "staged-ref").await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("_output");
    let project_file = project(&dir.path().join("project"), &server.url("/api/v2"));
    let config = Config::from_project_file(&project_file, &output).unwrap();
    let client = PrismicClient::new(
        Url::parse(&server.url("/api/v2")).unwrap(),
        None,
        None,
    );

    build_site(
        &config,
        &client,
        &Preview::new(Some(String::from("staged-ref"))),
    )
    .await
    .unwrap();

    let exit = r#"<a href="/api/exit-preview">Sair do modo Preview</a>"#;
    let first = read(output.join("pages").join("index.html"));
    assert!(first.contains("Mapas com React"));
    assert!(first.contains(exit));
    assert!(read(output.join("pages").join("1.html")).contains(exit));

    let middle = read(output.join("posts").join("como-utilizar-hooks.html"));
    assert!(middle.contains("<h1>Como utilizar Hooks</h1>"));
    assert!(middle.contains("Post anterior"));
    assert!(middle.contains("Próximo post"));
    assert!(middle.contains(exit));
}

#[tokio::test]
async fn test_build_fails_on_fetch_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2");
            then.status(503);
        })
        .await;

    let dir = tempfile::tempdir().unwrap();
    let project_file = project(&dir.path().join("project"), &server.url("/api/v2"));
    let config = Config::from_project_file(&project_file, &dir.path().join("_output")).unwrap();
    let client = PrismicClient::new(
        Url::parse(&server.url("/api/v2")).unwrap(),
        None,
        None,
    );

    let result = build_site(&config, &client, &Preview::default()).await;
    assert!(matches!(
        result,
        Err(spacetraveling::build::Error::Fetch(
            spacetraveling::prismic::Error::Status { status: 503, .. }
        ))
    ));
}
