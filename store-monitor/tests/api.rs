mod common;

use axum::http::{StatusCode, header};
use chrono::{TimeZone, Utc};
use common::*;
use store_monitor::db::models::{ReportStatus, StatusPollCreate};
use store_monitor::db::repository::{report, status_poll, store, system_state};
use uptime_engine::StoreStatus;

async fn seed_store(env: &TestEnv, with_reference: bool) {
    let mut conn = env.pool().acquire().await.unwrap();
    store::ensure_exist(&mut conn, &[STORE_A.to_string()], "UTC")
        .await
        .unwrap();
    if with_reference {
        let reference = Utc.with_ymd_and_hms(2023, 1, 25, 18, 0, 0).unwrap();
        status_poll::insert_batch(
            &mut conn,
            &[StatusPollCreate {
                store_id: STORE_A.into(),
                timestamp: reference,
                status: StoreStatus::Active,
            }],
        )
        .await
        .unwrap();
        system_state::set_reference_time(&mut conn, reference)
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_health_reports_store_count() {
    let env = setup().await;
    seed_store(&env, true).await;

    let (response, body) = send(&env.router(), "GET", "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["stores"], 1);
    assert_eq!(body["reference_time"], "2023-01-25T18:00:00Z");
}

#[tokio::test]
async fn test_trigger_rejects_malformed_store_id() {
    let env = setup().await;

    let (response, body) = send(&env.router(), "POST", "/trigger_report/12345").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["code"], "E0002");
}

#[tokio::test]
async fn test_trigger_unknown_store_is_not_found() {
    let env = setup().await;

    let (response, body) =
        send(&env.router(), "POST", &format!("/trigger_report/{STORE_B}")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["code"], "E0003");
}

#[tokio::test]
async fn test_trigger_without_reference_time_fails() {
    let env = setup().await;
    seed_store(&env, false).await;

    let (response, body) =
        send(&env.router(), "POST", &format!("/trigger_report/{STORE_A}")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json(&body)["code"], "E9001");
}

#[tokio::test]
async fn test_trigger_accepts_and_report_is_running() {
    let env = setup().await;
    seed_store(&env, true).await;
    let app = env.router();

    // Upper-case ids are accepted and normalised
    let (response, body) = send(
        &app,
        "POST",
        &format!("/trigger_report/{}", STORE_A.to_uppercase()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let report_id = json(&body)["report_id"].as_str().unwrap().to_string();

    let stored = report::find_by_id(env.pool(), &report_id).await.unwrap().unwrap();
    assert_eq!(stored.store_id, STORE_A);
    assert_eq!(stored.status, ReportStatus::Pending);

    // No worker is running in this test: the job stays queued
    let (response, body) = send(&app, "GET", &format!("/get_report/{report_id}")).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(json(&body)["status"], "running");
}

#[tokio::test]
async fn test_get_unknown_report_is_not_found() {
    let env = setup().await;

    let (response, _) = send(&env.router(), "GET", "/get_report/does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_failed_report_is_gone() {
    let env = setup().await;
    seed_store(&env, false).await;
    report::create(env.pool(), "r-failed", STORE_A).await.unwrap();
    assert!(report::mark_failed(env.pool(), "r-failed").await.unwrap());

    let (response, body) = send(&env.router(), "GET", "/get_report/r-failed").await;

    assert_eq!(response.status(), StatusCode::GONE);
    assert_eq!(json(&body)["status"], "failed");
}

#[tokio::test]
async fn test_get_complete_report_returns_csv() {
    let env = setup().await;
    seed_store(&env, false).await;

    let path = env.config.report_file_path("r-done");
    let csv = format!(
        "store_id,uptime_last_hour,uptime_last_day,uptime_last_week,downtime_last_hour,downtime_last_day,downtime_last_week\n\
         {STORE_A},60,24.00,168.00,0,0.00,0.00\n"
    );
    std::fs::write(&path, &csv).unwrap();

    report::create(env.pool(), "r-done", STORE_A).await.unwrap();
    report::mark_running(env.pool(), "r-done").await.unwrap();
    report::mark_complete(env.pool(), "r-done", &path.to_string_lossy())
        .await
        .unwrap();

    let (response, body) = send(&env.router(), "GET", "/get_report/r-done").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    assert_eq!(response.headers()["x-report-status"], "Complete");
    assert!(
        response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("report_r-done.csv")
    );
    assert_eq!(String::from_utf8(body.to_vec()).unwrap(), csv);
}

#[tokio::test]
async fn test_get_complete_report_with_missing_file_fails() {
    let env = setup().await;
    seed_store(&env, false).await;

    report::create(env.pool(), "r-lost", STORE_A).await.unwrap();
    report::mark_running(env.pool(), "r-lost").await.unwrap();
    report::mark_complete(env.pool(), "r-lost", "/nonexistent/report_r-lost.csv")
        .await
        .unwrap();

    let (response, body) = send(&env.router(), "GET", "/get_report/r-lost").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json(&body)["code"], "E9001");
}
