// ==========================================
// 批次 API 集成测试
// ==========================================
// 测试目标: 批次生命周期、活动批次选择、失败时快照不变
// ==========================================

mod test_helpers;

use poultry_farm_tracker::api::ApiError;
use poultry_farm_tracker::domain::{FarmCycleState, FarmCycleUpdate};
use poultry_farm_tracker::engine::ActivityAction;
use test_helpers::{at, create_test_db, open_app, sample_new_cycle};

#[tokio::test]
async fn test_active_cycle_is_latest_with_open_farm() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let (app, _) = open_app(&db_path).await;

    let first = app
        .cycle_api
        .start_new_cycle_at(sample_new_cycle("1", &[("Farm A", "2024-01-01")]), at(2024, 1, 1, 8))
        .unwrap();
    app.cycle_api
        .finish_farm_cycle(&first.id, "Farm A", "2024-02-10")
        .unwrap();
    let second = app
        .cycle_api
        .start_new_cycle_at(sample_new_cycle("2", &[("Farm A", "2024-03-01")]), at(2024, 3, 1, 8))
        .unwrap();

    let active = app.cycle_api.active_cycle().unwrap().unwrap();
    assert_eq!(active.id, second.id);
    assert_eq!(active.id, "2024-03-01T08:00:00.000Z");

    // 两个批次均未结束时仍选最新创建者
    app.cycle_api.reopen_farm_cycle(&first.id, "Farm A").unwrap();
    assert_eq!(app.cycle_api.active_cycle().unwrap().unwrap().id, second.id);

    // 全部结束后无活动批次
    app.cycle_api.finish_farm_cycle(&first.id, "Farm A", "2024-02-10").unwrap();
    app.cycle_api.finish_farm_cycle(&second.id, "Farm A", "2024-04-10").unwrap();
    assert!(app.cycle_api.active_cycle().unwrap().is_none());
}

#[tokio::test]
async fn test_reopen_restores_open_state_without_touching_details() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let (app, publisher) = open_app(&db_path).await;

    let cycle = app
        .cycle_api
        .start_new_cycle_at(
            sample_new_cycle("12", &[("Farm A", "2024-01-01"), ("Farm B", "2024-01-03")]),
            at(2024, 1, 1, 6),
        )
        .unwrap();
    app.cycle_api.finish_farm_cycle(&cycle.id, "Farm B", "2024-02-15").unwrap();
    app.cycle_api.reopen_farm_cycle(&cycle.id, "Farm B").unwrap();

    let stored = app.cycle_api.find_cycle(&cycle.id).unwrap().unwrap();
    let entry = stored.farm_entry("Farm B").unwrap();
    assert_eq!(entry.state(), FarmCycleState::Open);
    assert_eq!(entry.finish_date, None);
    assert_eq!(entry.start_date, "2024-01-03");
    assert_eq!(entry.crop_no, "2");

    assert_eq!(
        publisher.actions(),
        vec![
            ActivityAction::StartNewCycle,
            ActivityAction::FinishFarmCycle,
            ActivityAction::ReopenFarmCycle,
        ]
    );
    assert_eq!(app.admin_api.list_notifications().unwrap().len(), 3);
}

#[tokio::test]
async fn test_missing_targets_leave_snapshot_unchanged() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let (app, publisher) = open_app(&db_path).await;

    let cycle = app
        .cycle_api
        .start_new_cycle_at(sample_new_cycle("5", &[("Farm A", "2024-05-01")]), at(2024, 5, 1, 0))
        .unwrap();
    let before = app.snapshot().unwrap();

    let err = app.cycle_api.reopen_farm_cycle(&cycle.id, "Farm Z").unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let err = app
        .cycle_api
        .update_farm_cycle_details(
            "1999-01-01T00:00:00.000Z",
            "Farm A",
            FarmCycleUpdate {
                crop_no: "9".to_string(),
                start_date: "2024-05-02".to_string(),
            },
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    assert_eq!(app.snapshot().unwrap(), before);
    assert_eq!(publisher.actions(), vec![ActivityAction::StartNewCycle]);
}

#[tokio::test]
async fn test_update_details_only_touches_matching_entry() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let (app, _) = open_app(&db_path).await;

    let cycle = app
        .cycle_api
        .start_new_cycle_at(
            sample_new_cycle("3", &[("Farm A", "2024-01-01"), ("Farm B", "2024-01-02")]),
            at(2024, 1, 1, 0),
        )
        .unwrap();
    app.cycle_api
        .update_farm_cycle_details(
            &cycle.id,
            "Farm A",
            FarmCycleUpdate {
                crop_no: "44".to_string(),
                start_date: "2024-01-05".to_string(),
            },
        )
        .unwrap();

    let stored = app.cycle_api.find_cycle(&cycle.id).unwrap().unwrap();
    assert_eq!(stored.farm_entry("Farm A").unwrap().crop_no, "44");
    assert_eq!(stored.farm_entry("Farm A").unwrap().start_date, "2024-01-05");
    assert_eq!(stored.farm_entry("Farm B").unwrap(), &cycle.farms[1]);
}

#[tokio::test]
async fn test_cycles_for_farm_sorted_by_start_date_desc() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let (app, _) = open_app(&db_path).await;

    app.cycle_api
        .start_new_cycle_at(sample_new_cycle("1", &[("Farm A", "2024-06-01")]), at(2024, 1, 1, 0))
        .unwrap();
    app.cycle_api
        .start_new_cycle_at(sample_new_cycle("2", &[("Farm A", "2024-02-01")]), at(2024, 1, 2, 0))
        .unwrap();
    app.cycle_api
        .start_new_cycle_at(sample_new_cycle("3", &[("Farm B", "2024-09-01")]), at(2024, 1, 3, 0))
        .unwrap();

    let numbers: Vec<String> = app
        .cycle_api
        .cycles_for_farm("Farm A")
        .unwrap()
        .into_iter()
        .map(|c| c.cycle_no)
        .collect();
    assert_eq!(numbers, vec!["1", "2"]);
}

#[tokio::test]
async fn test_second_open_entry_allowed_newest_selected() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let (app, _) = open_app(&db_path).await;

    app.cycle_api
        .start_new_cycle_at(sample_new_cycle("1", &[("Farm A", "2024-01-01")]), at(2024, 1, 1, 0))
        .unwrap();
    let newer = app
        .cycle_api
        .start_new_cycle_at(sample_new_cycle("2", &[("Farm A", "2024-02-01")]), at(2024, 2, 1, 0))
        .unwrap();

    assert_eq!(app.cycle_api.list_cycles().unwrap().len(), 2);
    assert_eq!(
        app.cycle_api.open_cycle_for_farm("Farm A").unwrap().unwrap().id,
        newer.id
    );
    assert_eq!(
        app.snapshot().unwrap().cycles.farms_with_multiple_open_entries(),
        vec!["Farm A".to_string()]
    );
}

#[tokio::test]
async fn test_invalid_new_cycle_rejected() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let (app, publisher) = open_app(&db_path).await;

    let err = app
        .cycle_api
        .start_new_cycle(sample_new_cycle("  ", &[("Farm A", "2024-01-01")]))
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
    assert!(app.cycle_api.list_cycles().unwrap().is_empty());
    assert!(publisher.events().is_empty());
}

#[tokio::test]
async fn test_cycles_survive_restart() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let cycle_id = {
        let (app, _) = open_app(&db_path).await;
        let cycle = app
            .cycle_api
            .start_new_cycle_at(sample_new_cycle("8", &[("Farm A", "2024-08-01")]), at(2024, 8, 1, 0))
            .unwrap();
        app.cycle_api.finish_farm_cycle(&cycle.id, "Farm A", "2024-09-10").unwrap();
        cycle.id
    };

    let (reopened, _) = open_app(&db_path).await;
    let stored = reopened.cycle_api.find_cycle(&cycle_id).unwrap().unwrap();
    assert_eq!(
        stored.farm_entry("Farm A").unwrap().finish_date.as_deref(),
        Some("2024-09-10")
    );
}
