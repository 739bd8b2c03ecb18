mod common;

use chrono::{TimeZone, Utc};
use common::*;
use store_monitor::db::repository::{business_hour, status_poll, store, system_state};
use store_monitor::run_full_ingestion;

fn write_inputs(env: &TestEnv) {
    write_file(
        &env.config.timezone_csv,
        &format!(
            "store_id,timezone_str\n\
             {STORE_A},America/New_York\n\
             {STORE_B},Moon/Base\n\
             not-a-uuid,UTC\n"
        ),
    );
    write_file(
        &env.config.business_hours_csv,
        &format!(
            "store_id,dayOfWeek,start_time_local,end_time_local\n\
             {STORE_A},0,09:00:00,17:00:00\n\
             {STORE_A},1,09:00,17:00\n\
             {STORE_C},8,09:00:00,17:00:00\n"
        ),
    );
    write_file(
        &env.config.status_csv,
        &format!(
            "store_id,status,timestamp_utc\n\
             {STORE_A},active,2023-01-24 09:06:42.605777 UTC\n\
             {STORE_A},inactive,2023-01-25 18:13:22.47922 UTC\n\
             {STORE_D},Active,2023-01-25 10:00:00 UTC\n\
             {STORE_A},open,2023-01-25 19:00:00 UTC\n\
             bad-id,active,2023-01-26 00:00:00 UTC\n"
        ),
    );
}

#[tokio::test]
async fn test_full_ingestion_loads_all_three_files() {
    let env = setup().await;
    write_inputs(&env);

    let summary = run_full_ingestion(env.pool(), &env.config).await.unwrap();

    assert_eq!(summary.timezones.loaded, 2);
    assert_eq!(summary.timezones.skipped, 1);

    assert_eq!(summary.business_hours.loaded, 2);
    assert_eq!(summary.business_hours.skipped, 1);
    assert_eq!(summary.business_hours.stores_created, 1);

    assert_eq!(summary.status_polls.loaded, 3);
    assert_eq!(summary.status_polls.skipped, 2);
    assert_eq!(summary.status_polls.stores_created, 1);

    let expected_reference = Utc.with_ymd_and_hms(2023, 1, 25, 18, 13, 22).unwrap()
        + chrono::Duration::microseconds(479_220);
    assert_eq!(summary.reference_time, Some(expected_reference));
    assert_eq!(
        system_state::get_reference_time(env.pool()).await.unwrap(),
        Some(expected_reference)
    );

    assert_eq!(store::count(env.pool()).await.unwrap(), 4);
    let a = store::find_by_id(env.pool(), STORE_A).await.unwrap().unwrap();
    assert_eq!(a.timezone_str, "America/New_York");
    let b = store::find_by_id(env.pool(), STORE_B).await.unwrap().unwrap();
    assert_eq!(b.timezone_str, "America/Chicago");

    let hours = business_hour::find_by_store(env.pool(), STORE_A).await.unwrap();
    assert_eq!(hours.len(), 2);
    assert_eq!(hours[1].start_time_local, "09:00:00");
    assert_eq!(hours[1].end_time_local, "17:00:00");
    // Store C only had an invalid row: known store, no rules
    assert!(business_hour::find_by_store(env.pool(), STORE_C).await.unwrap().is_empty());

    let polls = status_poll::find_in_range(
        env.pool(),
        STORE_A,
        Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
        expected_reference,
    )
    .await
    .unwrap();
    assert_eq!(polls.len(), 2);
    assert!(polls[0].timestamp_utc < polls[1].timestamp_utc);
    assert_eq!(polls[1].status, "inactive");
}

#[tokio::test]
async fn test_reingestion_replaces_instead_of_appending() {
    let env = setup().await;
    write_inputs(&env);

    run_full_ingestion(env.pool(), &env.config).await.unwrap();
    let summary = run_full_ingestion(env.pool(), &env.config).await.unwrap();

    assert_eq!(summary.status_polls.loaded, 3);
    assert_eq!(summary.status_polls.stores_created, 0);
    assert_eq!(store::count(env.pool()).await.unwrap(), 4);
    assert_eq!(
        business_hour::find_by_store(env.pool(), STORE_A).await.unwrap().len(),
        2
    );
    let polls = status_poll::find_in_range(
        env.pool(),
        STORE_A,
        Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2023, 2, 1, 0, 0, 0).unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(polls.len(), 2);
}

#[tokio::test]
async fn test_missing_files_are_skipped() {
    let env = setup().await;

    let summary = run_full_ingestion(env.pool(), &env.config).await.unwrap();

    assert!(summary.timezones.missing);
    assert!(summary.business_hours.missing);
    assert!(summary.status_polls.missing);
    assert_eq!(summary.reference_time, None);
    assert_eq!(system_state::get_reference_time(env.pool()).await.unwrap(), None);
    assert_eq!(store::count(env.pool()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_failed_reingestion_keeps_previous_data() {
    let env = setup().await;
    write_inputs(&env);
    let first = run_full_ingestion(env.pool(), &env.config).await.unwrap();

    // Second data set; store B's poll insert is made to fail halfway through
    write_file(
        &env.config.timezone_csv,
        &format!("store_id,timezone_str\n{STORE_A},Asia/Tokyo\n"),
    );
    write_file(
        &env.config.status_csv,
        &format!(
            "store_id,status,timestamp_utc\n\
             {STORE_A},active,2023-02-01 10:00:00 UTC\n\
             {STORE_B},inactive,2023-02-02 10:00:00 UTC\n"
        ),
    );
    sqlx::query(&format!(
        "CREATE TRIGGER reject_store_b BEFORE INSERT ON store_status_poll \
         WHEN NEW.store_id = '{STORE_B}' BEGIN SELECT RAISE(ABORT, 'rejected'); END"
    ))
    .execute(env.pool())
    .await
    .unwrap();

    assert!(run_full_ingestion(env.pool(), &env.config).await.is_err());

    assert_eq!(
        system_state::get_reference_time(env.pool()).await.unwrap(),
        first.reference_time
    );
    let a = store::find_by_id(env.pool(), STORE_A).await.unwrap().unwrap();
    assert_eq!(a.timezone_str, "America/New_York");
    assert_eq!(
        business_hour::find_by_store(env.pool(), STORE_A).await.unwrap().len(),
        2
    );
    let polls = status_poll::find_in_range(
        env.pool(),
        STORE_A,
        Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(polls.len(), 2);
    assert!(polls.iter().all(|p| p.timestamp_utc < 1_675_209_600_000_000));
}
