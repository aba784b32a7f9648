// ==========================================
// 备份导入导出集成测试
// ==========================================
// 测试目标: 导出/导入往返、导入时迁移与用户合并、解析失败不改数据
// ==========================================

mod test_helpers;

use poultry_farm_tracker::domain::{ChicksReceivingRecord, CycleRecord, SelectedCycle};
use poultry_farm_tracker::engine::{ActivityAction, ChicksHouseEdit};
use tempfile::Builder;
use test_helpers::{at, create_test_db, open_app, sample_new_cycle};

#[tokio::test]
async fn test_export_import_round_trip() {
    let (_source_file, source_db) = create_test_db().expect("Failed to create test db");
    let (source, _) = open_app(&source_db).await;

    let cycle = source
        .cycle_api
        .start_new_cycle_at(sample_new_cycle("1", &[("Farm A", "2024-01-01")]), at(2024, 1, 1, 0))
        .unwrap();
    source
        .record_api
        .edit_chicks_house(
            "Farm A",
            &SelectedCycle::of(&cycle),
            1,
            ChicksHouseEdit {
                no_of_box: Some(3),
                per_box_chicks: Some(100),
                ..Default::default()
            },
        )
        .unwrap();

    let backup = Builder::new().suffix(".json").tempfile().unwrap();
    source.backup_api.export_to_file(backup.path()).unwrap();

    let (_target_file, target_db) = create_test_db().expect("Failed to create test db");
    let (target, publisher) = open_app(&target_db).await;
    let result = target.backup_api.import_from_file(backup.path());

    assert!(result.success, "message: {}", result.message);
    assert_eq!(target.snapshot().unwrap(), source.snapshot().unwrap());
    assert_eq!(publisher.actions(), vec![ActivityAction::ImportBackup]);
}

#[tokio::test]
async fn test_import_migrates_legacy_and_merges_users() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let (app, _) = open_app(&db_path).await;

    let legacy = r#"{
        "users": {"farm1": {"password": "f1", "role": "user"}},
        "cycles": [{"id": "2022-02-02T00:00:00.000Z", "cycleNo": "2",
                    "farms": [{"farmName": "Farm A", "cropNo": "5", "startDate": "2022-02-02"}]}],
        "allFarmsChicksReceivingData": {
            "Farm A": {"cycleNo": "2", "cropNo": "5", "houses": []},
            "Farm B": {"cycleNo": "4", "cropNo": "1", "houses": []}
        }
    }"#;
    let result = app.backup_api.import_json(legacy);

    assert!(result.success);
    assert!(result.message.contains("1 条旧版记录未匹配"));

    let users = app.admin_api.list_users().unwrap();
    assert!(users.contains_key("admin"));
    assert!(users.contains_key("supervisor"));
    assert!(users.contains_key("farm1"));

    let matched: Option<ChicksReceivingRecord> =
        app.record_api.get("Farm A", "2022-02-02T00:00:00.000Z").unwrap();
    assert!(matched.is_some());
    let orphan = app.record_api.list_for_farm::<ChicksReceivingRecord>("Farm B").unwrap();
    assert!(orphan[0].cycle_id().is_none());
}

#[tokio::test]
async fn test_invalid_backup_keeps_current_data() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let (app, publisher) = open_app(&db_path).await;
    app.cycle_api
        .start_new_cycle_at(sample_new_cycle("1", &[("Farm A", "2024-01-01")]), at(2024, 1, 1, 0))
        .unwrap();
    let before = app.snapshot().unwrap();

    let result = app.backup_api.import_json("[1, 2, 3");
    assert!(!result.success);
    assert!(result.message.contains("解析失败"));
    assert_eq!(app.snapshot().unwrap(), before);
    assert_eq!(publisher.actions(), vec![ActivityAction::StartNewCycle]);

    let missing = app
        .backup_api
        .import_from_file(std::path::Path::new("/definitely/not/here.json"));
    assert!(!missing.success);
}

#[tokio::test]
async fn test_export_contains_all_top_level_keys() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let (app, _) = open_app(&db_path).await;

    let json: serde_json::Value = serde_json::from_str(&app.backup_api.export_json().unwrap()).unwrap();
    for key in [
        "users",
        "allFarmsData",
        "allFarmsFeedOrders",
        "allFarmsChicksReceivingData",
        "allFarmsWeeklyWeightData",
        "allFarmsChicksGradingData",
        "allFarmsFeedDeliveryData",
        "allFarmsCatchingDetailsData",
        "allFarmsSalmonellaData",
        "catchingProgramEntries",
        "dieselOrders",
        "submittedFeedOrders",
        "cycles",
        "notifications",
        "leaveRequests",
        "septicTankRequests",
        "employees",
        "feedBulkerRecords",
        "vehicleMovementLogs",
        "inChargeTimeLogs",
        "isMaintenanceMode",
    ] {
        assert!(json.get(key).is_some(), "missing key {}", key);
    }
}

#[tokio::test]
async fn test_backup_with_malformed_employee_imports_rest() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let (app, _) = open_app(&db_path).await;

    let raw = r#"{
        "cycles": [{"id": "c1", "cycleNo": "1", "farms": [{"farmName": "Farm A", "cropNo": "1", "startDate": "2024-01-01"}]}],
        "employees": [{"sapNo": "2001", "name": "Sara"}, {"sapNo": 17, "name": 5}]
    }"#;
    let result = app.backup_api.import_json(raw);

    assert!(result.success);
    assert!(result.message.contains("1 条格式错误的数据已跳过"));
    let data = app.snapshot().unwrap();
    assert_eq!(data.cycles.len(), 1);
    assert_eq!(data.employees.len(), 1);
}
