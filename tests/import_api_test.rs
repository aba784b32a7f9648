// ==========================================
// CSV 导入 API 集成测试
// ==========================================
// 测试目标: 跳过计数、表头别名、雏鸡接收写入进行中批次
// ==========================================

mod test_helpers;

use poultry_farm_tracker::domain::{ChicksReceivingRecord, SelectedCycle};
use poultry_farm_tracker::engine::ActivityAction;
use std::path::Path;
use test_helpers::{at, create_test_db, open_app, sample_new_cycle, write_csv};

#[tokio::test]
async fn test_employee_import_counts_duplicates_against_existing() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let (app, publisher) = open_app(&db_path).await;

    let seeded = app
        .import_api
        .import_employees_str("SAP,Name\n2001,Existing One\n2002,Existing Two\n");
    assert!(seeded.success);
    assert_eq!(seeded.processed_rows(), 2);

    let csv = "sap no,S.N,Name,COMP,Designation,Farm Name\n\
               1001,1,Ali,C1,Worker,Farm A\n\
               2001,2,Dup One,C2,Worker,Farm A\n\
               1002,3,Bilal,C3,Driver,Farm B\n\
               2002,4,Dup Two,C4,Worker,Farm B\n\
               1003,5,Chen,C5,Supervisor,Farm A\n";
    let response = app.import_api.import_employees_str(csv);

    assert!(response.success);
    assert_eq!(response.summary.processed_rows, 3);
    assert_eq!(response.summary.skipped_duplicates, 2);
    assert!(response.message.contains("跳过 2"), "message: {}", response.message);

    let employees = app.admin_api.list_employees().unwrap();
    assert_eq!(employees.len(), 5);
    let chen = app.admin_api.find_employee("1003").unwrap().unwrap();
    assert_eq!(chen.s_n.as_deref(), Some("5"));
    assert_eq!(chen.comp_no.as_deref(), Some("C5"));
    assert_eq!(chen.farm_name.as_deref(), Some("Farm A"));
    // 已有员工不被覆盖
    assert_eq!(app.admin_api.find_employee("2001").unwrap().unwrap().name, "Existing One");

    assert_eq!(
        publisher.actions(),
        vec![ActivityAction::ImportEmployees, ActivityAction::ImportEmployees]
    );
}

#[tokio::test]
async fn test_employee_import_without_sap_column_fails() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let (app, publisher) = open_app(&db_path).await;

    let response = app.import_api.import_employees_str("Name,Phone\nAli,123\n");

    assert!(!response.success);
    assert!(response.message.contains("sapNo"));
    assert!(app.admin_api.list_employees().unwrap().is_empty());
    assert!(publisher.events().is_empty());
}

#[tokio::test]
async fn test_chicks_receiving_import_from_file() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let (app, _) = open_app(&db_path).await;

    let cycle = app
        .cycle_api
        .start_new_cycle_at(
            sample_new_cycle("10", &[("Farm A", "2024-10-01"), ("Farm B", "2024-10-02")]),
            at(2024, 10, 1, 0),
        )
        .unwrap();
    app.cycle_api.finish_farm_cycle(&cycle.id, "Farm B", "2024-11-10").unwrap();

    let csv = write_csv(
        "Farm,House,Flock,No of Box,Per Box Chicks,Extra Chicks,DOA,Placement Date\n\
         Farm A,1,FL-1,100,102,5,20,2024-10-01\n\
         Farm A,2,FL-1,100,102,0,11000,2024-10-01\n\
         Farm A,2,FL-1,1,1,1,1,2024-10-01\n\
         Farm B,1,FL-2,90,102,0,0,2024-10-02\n",
    )
    .expect("Failed to write csv");

    let response = app.import_api.import_chicks_receiving_file(csv.path());

    assert!(response.success, "message: {}", response.message);
    assert_eq!(response.summary.processed_rows, 2);
    assert_eq!(response.summary.skipped_duplicates, 1);
    assert_eq!(response.summary.skipped_invalid, 1);
    assert_eq!(response.quality_warnings.len(), 1);
    assert_eq!(response.quality_warnings[0].house_no, 2);

    let record: ChicksReceivingRecord = app.record_api.get("Farm A", &cycle.id).unwrap().unwrap();
    assert_eq!(record.placement_date.as_deref(), Some("2024-10-01"));
    assert_eq!(record.houses[0].gross_placed, 10_205);
    assert_eq!(record.houses[0].net_placed, 10_185);
    assert_eq!(record.houses[1].net_placed, 10_200 - 11_000);
    assert_eq!(record.houses[0].flock.as_deref(), Some("FL-1"));

    // 结束的场区不写入
    assert!(app
        .record_api
        .list_for_farm::<ChicksReceivingRecord>("Farm B")
        .unwrap()
        .is_empty());

    // 导入结果与手工编辑共享同一条记录
    let warnings = app
        .record_api
        .chicks_receiving_warnings("Farm A", &SelectedCycle::of(&cycle).cycle_id)
        .unwrap();
    assert_eq!(warnings.len(), 1);
}

#[tokio::test]
async fn test_import_missing_file_reports_failure() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let (app, _) = open_app(&db_path).await;

    let response = app
        .import_api
        .import_employees_file(Path::new("/definitely/not/here.csv"));
    assert!(!response.success);
    assert_eq!(response.processed_rows(), 0);
}

#[tokio::test]
async fn test_chicks_import_skips_oversized_counts() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let (app, _) = open_app(&db_path).await;

    let cycle = app
        .cycle_api
        .start_new_cycle_at(sample_new_cycle("11", &[("Farm A", "2024-11-01")]), at(2024, 11, 1, 0))
        .unwrap();

    let response = app.import_api.import_chicks_receiving_str(
        "Farm,House,No of Box,Per Box Chicks\n\
         Farm A,1,9999999999999,9999999\n\
         Farm A,2,40,100\n",
    );

    assert!(response.success, "message: {}", response.message);
    assert_eq!(response.summary.processed_rows, 1);
    assert_eq!(response.summary.skipped_invalid, 1);
    assert!(response.summary.warnings.iter().any(|w| w.contains("noOfBox")));

    let record: ChicksReceivingRecord = app.record_api.get("Farm A", &cycle.id).unwrap().unwrap();
    assert_eq!(record.houses[0].gross_placed, 0);
    assert_eq!(record.houses[1].gross_placed, 4_000);

    // 状态句柄仍可用
    assert_eq!(app.cycle_api.list_cycles().unwrap().len(), 1);
}
