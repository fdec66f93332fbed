//! End-to-end: HTTP routes -> controller -> listing crawler -> SQLite -> CSV.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use forum_harvest_core::forums::{default_registry, ForumSite, ForumSites};
use forum_harvest_core::{CookieSession, CrawlSettings, ForumId, RecordStore};
use forum_harvest_db::Database;
use forum_harvest_server::{create_app, AppState, ExportService, JobController};
use serde_json::{json, Value};
use tower::ServiceExt;

const PAGE_ONE: &str = r#"
<div class="item">
  <a class="title" href="/post/1">Vendor review, part 1</a>
  <a class="username" href="/u/alice">alice</a>
</div>
<div class="item">
  <a class="title" href="/post/2">OPSEC &amp; you</a>
</div>"#;

fn sites(base_url: &str, page_delay: Duration) -> ForumSites {
    let site = ForumSite {
        base_url: base_url.to_string(),
        session: Arc::new(CookieSession::from_header("sid=test")),
    };
    ForumSites {
        dread: site.clone(),
        cryptbb: site,
        cryptbb_fid: 2,
        crawl: CrawlSettings {
            max_pages: 10,
            page_delay,
        },
    }
}

fn app(store: Arc<dyn RecordStore>, sites: &ForumSites, exporter: ExportService) -> Router {
    let controller = Arc::new(
        JobController::new(default_registry(sites, store.clone()), store)
            .with_stop_timeout(Duration::from_secs(5)),
    );
    create_app(AppState::new(controller, exporter))
}

async fn send(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.unwrap()
}

fn start(forum: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/start_scraping")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "forum": forum }).to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn status(app: &Router) -> Value {
    serde_json::from_str(&body_text(send(app, get("/scraping_status")).await).await).unwrap()
}

async fn wait_for_rows(db: &Database, expected: i64) {
    for _ in 0..200 {
        if db.count_records(ForumId::Dread).await.unwrap() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("partition never reached {expected} rows");
}

async fn wait_idle(app: &Router) {
    for _ in 0..200 {
        if status(app).await["active"] == false {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job slot never became idle");
}

fn assert_page_one_csv(csv: &str, base_url: &str) {
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3, "header + 2 rows, got: {csv}");
    assert_eq!(lines[0], "forum,title,url,author,page,scraped_at");
    assert!(lines[1].starts_with(&format!(
        "dread,\"Vendor review, part 1\",{base_url}/post/1,alice,1,"
    )));
    assert!(lines[2].starts_with(&format!("dread,OPSEC & you,{base_url}/post/2,,1,")));
}

#[tokio::test]
async fn test_stop_mid_crawl_exports_partial_results() {
    let mut server = mockito::Server::new_async().await;
    let page = server
        .mock("GET", "/?p=1")
        .match_header("cookie", "sid=test")
        .with_body(PAGE_ONE)
        .create_async()
        .await;

    let db = Database::new_in_memory().await.unwrap();
    let store: Arc<dyn RecordStore> = Arc::new(db.clone());
    // Long delay: the crawler sits between pages until stopped.
    let sites = sites(&server.url(), Duration::from_secs(60));
    let app = app(store.clone(), &sites, ExportService::new(store.clone()));

    let response = send(&app, start("dread")).await;
    assert_eq!(response.status(), StatusCode::OK);

    wait_for_rows(&db, 2).await;
    assert_eq!(status(&app).await["forum"], "dread");

    let response = send(&app, get("/stop_scraping")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-stop-timed-out"], "false");
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"dread_scraped_data.csv\""
    );
    assert_page_one_csv(&body_text(response).await, &server.url());

    assert_eq!(status(&app).await["active"], false);
    page.assert_async().await;
}

#[tokio::test]
async fn test_finished_crawl_is_still_exportable() {
    let mut server = mockito::Server::new_async().await;
    let _p1 = server
        .mock("GET", "/?p=1")
        .with_body(PAGE_ONE)
        .create_async()
        .await;
    let _p2 = server
        .mock("GET", "/?p=2")
        .with_body("<p>end of board</p>")
        .create_async()
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let db = Database::new(&tmp.path().join("records.db")).await.unwrap();
    let store: Arc<dyn RecordStore> = Arc::new(db);
    let export_dir = tmp.path().join("exports");
    let sites = sites(&server.url(), Duration::ZERO);
    let exporter = ExportService::new(store.clone()).with_export_dir(&export_dir);
    let app = app(store, &sites, exporter);

    send(&app, start("dread")).await;

    // The crawl ends on the empty second page and releases the slot itself.
    wait_idle(&app).await;

    let response = send(&app, get("/stop_scraping")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, get("/export/dread")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let csv = body_text(response).await;
    assert_page_one_csv(&csv, &server.url());

    let on_disk = std::fs::read_to_string(export_dir.join("dread_scraped_data.csv")).unwrap();
    assert_eq!(on_disk, csv);
}

#[tokio::test]
async fn test_restart_clears_previous_run() {
    let mut server = mockito::Server::new_async().await;
    let _page = server
        .mock("GET", "/?p=1")
        .with_body(PAGE_ONE)
        .expect_at_least(2)
        .create_async()
        .await;

    let db = Database::new_in_memory().await.unwrap();
    let store: Arc<dyn RecordStore> = Arc::new(db.clone());
    let sites = sites(&server.url(), Duration::from_secs(60));
    let app = app(store.clone(), &sites, ExportService::new(store));

    for _ in 0..2 {
        send(&app, start("dread")).await;
        // Each run starts from an empty partition, so the count settles at 2.
        wait_for_rows(&db, 2).await;
        let response = send(&app, get("/stop_scraping")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_upstream_failure_releases_slot() {
    let mut server = mockito::Server::new_async().await;
    let _page = server
        .mock("GET", "/?p=1")
        .with_status(502)
        .create_async()
        .await;

    let store: Arc<dyn RecordStore> = Arc::new(Database::new_in_memory().await.unwrap());
    let sites = sites(&server.url(), Duration::ZERO);
    let app = app(store.clone(), &sites, ExportService::new(store));

    let response = send(&app, start("dread")).await;
    assert_eq!(response.status(), StatusCode::OK);

    wait_idle(&app).await;

    let response = send(&app, start("cryptbb")).await;
    assert_eq!(response.status(), StatusCode::OK);
}
