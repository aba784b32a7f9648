// ==========================================
// 旧版数据加载迁移集成测试
// ==========================================
// 测试目标: 启动加载时的旧版形态转换、孤儿记录保留、幂等、解析失败回落、
//           格式错误条目的跳过与原始数据备份
// ==========================================

mod test_helpers;

use poultry_farm_tracker::domain::{ChicksReceivingRecord, CycleRecord, SalmonellaRecord};
use serde_json::Value;
use test_helpers::{
    create_test_db, load_backup, load_backup_keys, load_raw_blob, open_app, seed_raw_blob,
};

const CYCLE_ID: &str = "2023-05-01T00:00:00.000Z";

const LEGACY_BLOB: &str = r#"{
    "cycles": [{
        "id": "2023-05-01T00:00:00.000Z",
        "cycleNo": "3",
        "farms": [
            {"farmName": "Farm A", "cropNo": "7", "startDate": "2023-05-01"},
            {"farmName": "Farm B", "cropNo": "8", "startDate": "2023-05-02"}
        ]
    }],
    "allFarmsChicksReceivingData": {
        "Farm A": {
            "cycleNo": "3", "cropNo": "7", "hatchery": "North",
            "houses": [{"houseNo": 1, "noOfBox": 10, "perBoxChicks": 100, "grossPlaced": 1000, "netPlaced": 1000}]
        },
        "Farm B": {"cycleNo": "3", "cropNo": "99", "houses": []},
        "Farm C": null
    },
    "allFarmsSalmonellaData": {
        "Farm A": [{"cycleId": "2023-05-01T00:00:00.000Z", "houses": [{"houseNo": 1, "result": "negative"}]}]
    },
    "users": {"farmA": {"password": "a", "role": "user", "farms": ["Farm A"]}},
    "dieselOrders": [{"id": 1, "litres": 200}]
}"#;

#[tokio::test]
async fn test_legacy_blob_migrated_on_load() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_raw_blob(&db_path, LEGACY_BLOB).expect("Failed to seed blob");

    let (app, _) = open_app(&db_path).await;

    assert_eq!(app.migration_report.matched, 1);
    assert_eq!(app.migration_report.orphaned, 1);
    assert_eq!(app.migration_report.empty_farms, 1);

    // 匹配成功的旧记录关联到批次
    let record: ChicksReceivingRecord = app.record_api.get("Farm A", CYCLE_ID).unwrap().unwrap();
    assert_eq!(record.hatchery.as_deref(), Some("North"));
    assert_eq!(record.houses[0].net_placed, 1000);

    // 孤儿记录保留，无 cycleId
    let orphans = app.record_api.list_for_farm::<ChicksReceivingRecord>("Farm B").unwrap();
    assert_eq!(orphans.len(), 1);
    assert!(orphans[0].cycle_id().is_none());
    assert_eq!(orphans[0].meta.crop_no.as_deref(), Some("99"));

    // 已是列表形态的类别不受影响
    let salmonella: Option<SalmonellaRecord> = app.record_api.get("Farm A", CYCLE_ID).unwrap();
    assert!(salmonella.is_some());

    // 非核心数据原样保留，用户名册按存储使用
    let data = app.snapshot().unwrap();
    assert_eq!(data.diesel_orders[0]["litres"], 200);
    assert!(data.users.contains_key("farmA"));
}

#[tokio::test]
async fn test_migrated_blob_written_back_as_arrays() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_raw_blob(&db_path, LEGACY_BLOB).expect("Failed to seed blob");

    let _ = open_app(&db_path).await;

    let raw = load_raw_blob(&db_path).unwrap().unwrap();
    let json: Value = serde_json::from_str(&raw).unwrap();
    let chicks = &json["allFarmsChicksReceivingData"];
    assert!(chicks["Farm A"].is_array());
    assert_eq!(chicks["Farm A"][0]["cycleId"], CYCLE_ID);
    assert!(chicks["Farm B"][0].get("cycleId").is_none());
    assert_eq!(chicks["Farm C"], Value::Array(Vec::new()));
}

#[tokio::test]
async fn test_second_load_is_noop() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_raw_blob(&db_path, LEGACY_BLOB).expect("Failed to seed blob");

    let first = open_app(&db_path).await.0.snapshot().unwrap();
    let (second_app, _) = open_app(&db_path).await;

    assert_eq!(second_app.migration_report.migrated(), 0);
    assert_eq!(second_app.snapshot().unwrap(), first);
}

#[tokio::test]
async fn test_unparseable_blob_falls_back_to_defaults() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_raw_blob(&db_path, "{not json").expect("Failed to seed blob");

    let (app, _) = open_app(&db_path).await;
    let data = app.snapshot().unwrap();

    assert!(data.users.contains_key("admin"));
    assert!(data.cycles.is_empty());
    assert!(!data.is_maintenance_mode);

    // 原始内容备份到独立的键，不会被后续保存覆盖
    let keys = load_backup_keys(&db_path).unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(load_backup(&db_path, &keys[0]).unwrap().as_deref(), Some("{not json"));
}

const MIXED_BLOB: &str = r#"{
    "cycles": [{
        "id": "2023-05-01T00:00:00.000Z",
        "cycleNo": "3",
        "farms": [{"farmName": "Farm A", "cropNo": "7", "startDate": "2023-05-01"}]
    }],
    "employees": [{"sapNo": "1001", "name": "Ahmed"}],
    "allFarmsChicksReceivingData": {
        "Farm A": [
            {"cycleId": "2023-05-01T00:00:00.000Z", "houses": [{"houseNo": 1, "noOfBox": "50", "perBoxChicks": 100, "doa": 20}]},
            {"cycleId": "2022-01-01T00:00:00.000Z", "houses": [{"houseNo": 1, "noOfBox": {"boxes": 5}}]}
        ]
    },
    "users": {"farmA": {"password": "a", "role": "user", "farms": ["Farm A"]}}
}"#;

#[tokio::test]
async fn test_numeric_string_in_record_keeps_whole_blob() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_raw_blob(&db_path, MIXED_BLOB).expect("Failed to seed blob");

    let (app, _) = open_app(&db_path).await;

    // "noOfBox":"50" 按数值读取，派生字段重新计算
    let record: ChicksReceivingRecord = app.record_api.get("Farm A", CYCLE_ID).unwrap().unwrap();
    assert_eq!(record.houses[0].no_of_box, 50);
    assert_eq!(record.houses[0].gross_placed, 5000);
    assert_eq!(record.houses[0].net_placed, 4980);

    let data = app.snapshot().unwrap();
    assert_eq!(data.cycles.len(), 1);
    assert_eq!(data.employees.len(), 1);
    assert!(data.users.contains_key("farmA"));
}

#[tokio::test]
async fn test_malformed_record_skipped_and_raw_backed_up() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_raw_blob(&db_path, MIXED_BLOB).expect("Failed to seed blob");

    let (app, _) = open_app(&db_path).await;
    assert_eq!(app.migration_report.skipped_malformed, 1);

    // 下一次提交后批次与员工仍在
    app.admin_api.set_maintenance_mode(true).unwrap();
    let raw = load_raw_blob(&db_path).unwrap().unwrap();
    let json: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["cycles"][0]["id"], CYCLE_ID);
    assert_eq!(json["employees"][0]["sapNo"], "1001");
    assert_eq!(json["allFarmsChicksReceivingData"]["Farm A"].as_array().unwrap().len(), 1);

    // 被跳过的记录仍可从备份中找回
    let keys = load_backup_keys(&db_path).unwrap();
    assert_eq!(keys.len(), 1);
    let backup = load_backup(&db_path, &keys[0]).unwrap().unwrap();
    assert!(backup.contains("\"boxes\": 5"));
}
