use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use sharpness_survey::clients::{MemoryStore, TableStore};
use sharpness_survey::models::{load_catalog, Catalog};
use sharpness_survey::web::{self, SurveyState};
use sharpness_survey::workflow::SessionRegistry;
use sharpness_survey::{ResultSink, Table};

const SHEET: &str = "Sheet1";

fn seeded_table() -> Table {
    Table::from_values(vec![
        vec!["User".into(), "Q01".into(), "Q02".into(), "Q03".into()],
        vec!["amy".into(), "Left".into(), "Left".into(), "Right".into()],
        vec!["bob".into(), "Right".into(), "Left".into(), "Left".into()],
    ])
    .unwrap()
}

fn write_images(dir: &Path) {
    for name in ["Q02_pair.png", "Q01_pair.png", "Q03_pair.JPG", "notes.txt"] {
        std::fs::write(dir.join(name), b"\x89PNG fake").unwrap();
    }
}

/// 在随机端口启动服务，返回根地址
async fn spawn_server(
    catalog: Catalog,
    catalog_error: Option<String>,
    store: Arc<dyn TableStore>,
) -> String {
    spawn_server_with_ttl(catalog, catalog_error, store, Duration::from_secs(600)).await
}

async fn spawn_server_with_ttl(
    catalog: Catalog,
    catalog_error: Option<String>,
    store: Arc<dyn TableStore>,
    session_ttl: Duration,
) -> String {
    let state = Arc::new(SurveyState {
        page_title: "Genfocus Sharpness Study".to_string(),
        catalog,
        catalog_error,
        sessions: SessionRegistry::new(session_ttl),
        sink: ResultSink::new(store, SHEET),
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, web::router(state)).await.unwrap();
    });
    format!("http://{}", addr)
}

fn extract_token(html: &str) -> String {
    let marker = "name=\"token\" value=\"";
    let start = html.find(marker).expect("页面中没有 token") + marker.len();
    let end = html[start..].find('"').unwrap() + start;
    html[start..end].to_string()
}

async fn start_session(client: &reqwest::Client, base: &str, user: &str) -> (String, String) {
    let html = client
        .get(format!("{}/", base))
        .query(&[("user", user)])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    (extract_token(&html), html)
}

#[tokio::test]
async fn test_full_submission_appends_one_row() {
    let tmp = tempfile::tempdir().unwrap();
    write_images(tmp.path());
    let catalog = load_catalog(tmp.path()).await.unwrap();

    let store = Arc::new(MemoryStore::new().with_table(SHEET, seeded_table()));
    let base = spawn_server(catalog, None, store.clone()).await;
    let client = reqwest::Client::new();

    let (token, html) = start_session(&client, &base, "Guest_01").await;
    let q1 = html.find("Question: Q01").unwrap();
    let q2 = html.find("Question: Q02").unwrap();
    let q3 = html.find("Question: Q03").unwrap();
    assert!(q1 < q2 && q2 < q3);
    assert!(!html.contains(" checked"));

    let response = client
        .post(format!("{}/submit", base))
        .form(&[
            ("token", token.as_str()),
            ("user", "Guest_01"),
            ("q_Q01", "Right"),
            ("q_Q02", "Left"),
            ("q_Q03", "Right"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Thank you, Guest_01! Your responses have been recorded."));

    let table = store.snapshot(SHEET).await.unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.rows()[0], seeded_table().rows()[0]);
    assert_eq!(table.rows()[1], seeded_table().rows()[1]);
    assert_eq!(
        table.rows()[2],
        vec!["Guest_01", "Right", "Left", "Right"]
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>()
    );

    // 同一会话再次提交被拒绝
    let again = client
        .post(format!("{}/submit", base))
        .form(&[
            ("token", token.as_str()),
            ("user", "Guest_01"),
            ("q_Q01", "Left"),
            ("q_Q02", "Left"),
            ("q_Q03", "Left"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), reqwest::StatusCode::CONFLICT);
    assert_eq!(store.snapshot(SHEET).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_replay_after_session_expiry_is_refused() {
    let tmp = tempfile::tempdir().unwrap();
    write_images(tmp.path());
    let catalog = load_catalog(tmp.path()).await.unwrap();

    let store = Arc::new(MemoryStore::new().with_table(SHEET, seeded_table()));
    let base =
        spawn_server_with_ttl(catalog, None, store.clone(), Duration::from_millis(200)).await;
    let client = reqwest::Client::new();

    let (token, _) = start_session(&client, &base, "amy").await;
    let form = [
        ("token", token.as_str()),
        ("user", "amy"),
        ("q_Q01", "Left"),
        ("q_Q02", "Right"),
        ("q_Q03", "Left"),
    ];

    let first = client
        .post(format!("{}/submit", base))
        .form(&form)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), reqwest::StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(400)).await;

    let replay = client
        .post(format!("{}/submit", base))
        .form(&form)
        .send()
        .await
        .unwrap();
    assert_eq!(replay.status(), reqwest::StatusCode::CONFLICT);
    assert_eq!(store.snapshot(SHEET).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_incomplete_submission_keeps_answers() {
    let tmp = tempfile::tempdir().unwrap();
    write_images(tmp.path());
    let catalog = load_catalog(tmp.path()).await.unwrap();

    let store = Arc::new(MemoryStore::new().with_table(SHEET, seeded_table()));
    let base = spawn_server(catalog, None, store.clone()).await;
    let client = reqwest::Client::new();

    let (token, _) = start_session(&client, &base, "amy").await;
    let response = client
        .post(format!("{}/submit", base))
        .form(&[
            ("token", token.as_str()),
            ("user", "amy"),
            ("q_Q01", "Left"),
            ("q_Q03", "Right"),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.text().await.unwrap();
    assert!(body.contains("Please answer all questions before submitting!"));
    assert!(body.contains("Unanswered: Q02."));
    assert!(body.contains("name=\"q_Q01\" value=\"Left\" checked"));
    assert!(body.contains("name=\"q_Q03\" value=\"Right\" checked"));
    assert_eq!(extract_token(&body), token);
    assert_eq!(store.snapshot(SHEET).await.unwrap().len(), 2);

    // 补全后可以继续提交
    let response = client
        .post(format!("{}/submit", base))
        .form(&[
            ("token", token.as_str()),
            ("user", "amy"),
            ("q_Q01", "Left"),
            ("q_Q02", "Left"),
            ("q_Q03", "Right"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(store.snapshot(SHEET).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_invalid_choice_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    write_images(tmp.path());
    let catalog = load_catalog(tmp.path()).await.unwrap();

    let store = Arc::new(MemoryStore::new().with_table(SHEET, seeded_table()));
    let base = spawn_server(catalog, None, store.clone()).await;
    let client = reqwest::Client::new();

    let (token, _) = start_session(&client, &base, "amy").await;
    let response = client
        .post(format!("{}/submit", base))
        .form(&[
            ("token", token.as_str()),
            ("user", "amy"),
            ("q_Q01", "Both"),
            ("q_Q02", "Left"),
            ("q_Q03", "Right"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(store.snapshot(SHEET).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_missing_headers_offers_csv_download() {
    let tmp = tempfile::tempdir().unwrap();
    write_images(tmp.path());
    let catalog = load_catalog(tmp.path()).await.unwrap();

    let store = Arc::new(MemoryStore::new());
    let base = spawn_server(catalog, None, store.clone()).await;
    let client = reqwest::Client::new();

    let (token, _) = start_session(&client, &base, "amy").await;
    let body = client
        .post(format!("{}/submit", base))
        .form(&[
            ("token", token.as_str()),
            ("user", "amy"),
            ("q_Q01", "Left"),
            ("q_Q02", "Right"),
            ("q_Q03", "Left"),
        ])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.contains("empty or has no header row"));
    assert!(body.contains("download=\"result_amy.csv\""));
    assert!(body.contains("href=\"data:text/csv;charset=utf-8;base64,"));
    assert!(store.snapshot(SHEET).await.is_none());
}

#[tokio::test]
async fn test_images_and_health() {
    let tmp = tempfile::tempdir().unwrap();
    write_images(tmp.path());
    let catalog = load_catalog(tmp.path()).await.unwrap();

    let store = Arc::new(MemoryStore::new().with_table(SHEET, seeded_table()));
    let base = spawn_server(catalog, None, store).await;
    let client = reqwest::Client::new();

    let image = client
        .get(format!("{}/images/Q01_pair.png", base))
        .send()
        .await
        .unwrap();
    assert_eq!(image.status(), reqwest::StatusCode::OK);
    assert_eq!(image.headers()["content-type"], "image/png");

    let not_listed = client
        .get(format!("{}/images/notes.txt", base))
        .send()
        .await
        .unwrap();
    assert_eq!(not_listed.status(), reqwest::StatusCode::NOT_FOUND);

    let health: serde_json::Value = client
        .get(format!("{}/healthz", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["questions"], 3);
    assert_eq!(health["store_backend"], "memory");
}

#[tokio::test]
async fn test_missing_image_directory_degrades() {
    let tmp = tempfile::tempdir().unwrap();
    let err = load_catalog(&tmp.path().join("images")).await.unwrap_err();

    let store = Arc::new(MemoryStore::new().with_table(SHEET, seeded_table()));
    let base = spawn_server(Catalog::empty(), Some(err.to_string()), store.clone()).await;
    let client = reqwest::Client::new();

    let body = client
        .get(format!("{}/", base))
        .query(&[("user", "amy")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("Cannot find the image folder"));
    assert!(!body.contains("name=\"token\""));

    let response = client
        .post(format!("{}/submit", base))
        .form(&[("user", "amy")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(store.snapshot(SHEET).await.unwrap().len(), 2);
}
