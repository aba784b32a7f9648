// ==========================================
// 禽场生产跟踪系统 - 雏鸡接收导入
// ==========================================
// 主键: 场区 + 栋号
// 目标批次: 各场区当前进行中的批次
// 跳过: 缺主键 / 批内重复 / 场区无进行中批次 / 栋号越界
// ==========================================

use crate::domain::{ChicksReceivingRecord, FarmDirectory, SelectedCycle};
use crate::engine::chicks_receiving::{apply_house_edit, quality_warnings};
use crate::engine::{CycleRecordStore, CycleRegistry, DataQualityWarning};
use crate::importer::conflict_handler::ConflictHandler;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{ChicksReceivingRow, FieldMapper, CHICKS_RECEIVING_ALIASES};
use crate::importer::file_parser::{CsvParser, ParsedCsv};
use crate::importer::summary::ImportSummary;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// 雏鸡接收导入结果
#[derive(Debug, Clone)]
pub struct ChicksReceivingImportOutcome {
    pub store: CycleRecordStore<ChicksReceivingRecord>,
    pub summary: ImportSummary,
    pub quality_warnings: Vec<DataQualityWarning>,
}

pub struct ChicksReceivingImporter<'a> {
    directory: &'a FarmDirectory,
    parser: CsvParser,
    mapper: FieldMapper,
    conflict_handler: ConflictHandler,
}

impl<'a> ChicksReceivingImporter<'a> {
    pub fn new(directory: &'a FarmDirectory) -> Self {
        Self {
            directory,
            parser: CsvParser,
            mapper: FieldMapper,
            conflict_handler: ConflictHandler,
        }
    }

    pub fn import_file(
        &self,
        path: &Path,
        registry: &CycleRegistry,
        store: &CycleRecordStore<ChicksReceivingRecord>,
    ) -> ImportResult<ChicksReceivingImportOutcome> {
        info!(file = %path.display(), "开始导入雏鸡接收数据");
        let parsed = self.parser.parse_file(path, &CHICKS_RECEIVING_ALIASES)?;
        self.import_parsed(parsed, registry, store)
    }

    pub fn import_str(
        &self,
        content: &str,
        registry: &CycleRegistry,
        store: &CycleRecordStore<ChicksReceivingRecord>,
    ) -> ImportResult<ChicksReceivingImportOutcome> {
        let parsed = self.parser.parse_str(content, &CHICKS_RECEIVING_ALIASES)?;
        self.import_parsed(parsed, registry, store)
    }

    fn import_parsed(
        &self,
        parsed: ParsedCsv,
        registry: &CycleRegistry,
        store: &CycleRecordStore<ChicksReceivingRecord>,
    ) -> ImportResult<ChicksReceivingImportOutcome> {
        parsed.require_columns(&["farm", "house"])?;

        let mut summary = ImportSummary {
            total_rows: parsed.rows.len(),
            ..Default::default()
        };

        // 1. 映射（数值错误的行跳过并告警）
        let mut rows: Vec<ChicksReceivingRow> = Vec::new();
        for (row_number, raw) in &parsed.rows {
            match self.mapper.map_chicks_receiving(raw, *row_number) {
                Ok(row) => rows.push(row),
                Err(ImportError::PrimaryKeyMissing { .. }) => summary.skipped_missing_key += 1,
                Err(e @ ImportError::TypeConversionError { .. }) => {
                    summary.skipped_invalid += 1;
                    summary.warnings.push(e.to_string());
                }
                Err(e) => return Err(e),
            }
        }

        // 2. 批内重复（场区+栋号）
        let keys: Vec<(usize, String)> = rows.iter().map(|r| (r.row_number, r.key())).collect();
        let duplicates = self.conflict_handler.rows_to_skip(&keys, &[]);
        summary.skipped_duplicates = duplicates.len();
        rows.retain(|r| !duplicates.contains_key(&r.row_number));

        // 3. 按场区写入各自进行中的批次
        let mut by_farm: BTreeMap<String, Vec<ChicksReceivingRow>> = BTreeMap::new();
        for row in rows {
            by_farm.entry(row.farm_name.clone()).or_default().push(row);
        }

        let mut next = store.clone();
        let mut warnings = Vec::new();

        for (farm_name, farm_rows) in by_farm {
            let Some(cycle) = registry.open_cycle_for_farm(&farm_name) else {
                warn!(farm = %farm_name, rows = farm_rows.len(), "场区无进行中批次，跳过");
                summary.skipped_invalid += farm_rows.len();
                summary
                    .warnings
                    .push(format!("{}: 无进行中批次，跳过 {} 行", farm_name, farm_rows.len()));
                continue;
            };
            let selected = SelectedCycle::of(cycle);
            let house_count = self.directory.house_count(&farm_name);
            let mut record = next.get_or_empty(&farm_name, &cycle.id, house_count);

            let mut applied = 0usize;
            for row in &farm_rows {
                if let Err(e) = apply_house_edit(&farm_name, &mut record, row.house_no, &row.edit) {
                    summary.skipped_invalid += 1;
                    summary.warnings.push(format!("第 {} 行: {}", row.row_number, e));
                    continue;
                }
                if let Some(date) = &row.placement_date {
                    record.placement_date = Some(date.clone());
                }
                if let Some(hatchery) = &row.hatchery {
                    record.hatchery = Some(hatchery.clone());
                }
                applied += 1;
            }

            if applied == 0 {
                continue;
            }

            record.recompute_all();
            warnings.extend(quality_warnings(&farm_name, &record));
            next.upsert_in_place(&farm_name, &selected, record);
            summary.processed_rows += applied;
        }

        for w in &warnings {
            warn!(farm = %w.farm_name, house_no = w.house_no, net_placed = w.net_placed, "净入舍为负");
        }
        info!(
            total = summary.total_rows,
            processed = summary.processed_rows,
            skipped = summary.skipped(),
            "雏鸡接收导入完成"
        );

        Ok(ChicksReceivingImportOutcome {
            store: next,
            summary,
            quality_warnings: warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Cycle, FarmCycleEntry};
    use std::collections::BTreeMap as Map;

    const CYCLE_ID: &str = "2024-03-01T08:00:00.000Z";

    fn registry() -> CycleRegistry {
        let mut finished = FarmCycleEntry::new("Farm 3", "1", "2024-03-01");
        finished.finish_date = Some("2024-04-10".to_string());
        CycleRegistry::new(vec![Cycle {
            id: CYCLE_ID.to_string(),
            cycle_no: "7".to_string(),
            farms: vec![
                FarmCycleEntry::new("Farm 1", "2", "2024-03-01"),
                FarmCycleEntry::new("Farm 2", "5", "2024-03-02"),
                finished,
            ],
        }])
    }

    fn directory() -> FarmDirectory {
        let mut counts = Map::new();
        counts.insert("Farm 2".to_string(), 12);
        FarmDirectory::new(10, counts)
    }

    #[test]
    fn test_rows_fill_open_cycle_record() {
        let csv = "Farm,House,Flock,No of Box,Per Box Chicks,Extra Chicks,DOA,Hatchery\n\
                   Farm 1,1,F1,50,100,2,10,North\n\
                   Farm 1,2,F1,40,100,0,0,\n\
                   Farm 2,12,F9,10,100,0,5,\n";
        let dir = directory();
        let outcome = ChicksReceivingImporter::new(&dir)
            .import_str(csv, &registry(), &CycleRecordStore::default())
            .unwrap();

        assert_eq!(outcome.summary.processed_rows, 3);
        let farm1 = outcome.store.get("Farm 1", CYCLE_ID).unwrap();
        assert_eq!(farm1.houses.len(), 10);
        assert_eq!(farm1.houses[0].gross_placed, 5_002);
        assert_eq!(farm1.houses[0].net_placed, 4_992);
        assert_eq!(farm1.hatchery.as_deref(), Some("North"));
        assert_eq!(farm1.meta.cycle_no.as_deref(), Some("7"));

        let farm2 = outcome.store.get("Farm 2", CYCLE_ID).unwrap();
        assert_eq!(farm2.houses.len(), 12);
        assert_eq!(farm2.houses[11].net_placed, 995);
    }

    #[test]
    fn test_skips_closed_farm_out_of_range_and_duplicates() {
        let csv = "farm,house,noofbox,perbox\n\
                   Farm 1,1,1,1\n\
                   Farm 1,1,2,2\n\
                   Farm 1,11,1,1\n\
                   Farm 3,1,1,1\n\
                   ,2,1,1\n";
        let dir = directory();
        let outcome = ChicksReceivingImporter::new(&dir)
            .import_str(csv, &registry(), &CycleRecordStore::default())
            .unwrap();

        let s = &outcome.summary;
        assert_eq!(s.processed_rows, 1);
        assert_eq!(s.skipped_duplicates, 1);
        assert_eq!(s.skipped_missing_key, 1);
        assert_eq!(s.skipped_invalid, 2);
        assert!(outcome.store.list_for_farm("Farm 3").is_empty());
        assert_eq!(outcome.store.get("Farm 1", CYCLE_ID).unwrap().houses[0].no_of_box, 1);
    }

    #[test]
    fn test_negative_net_reported_not_rejected() {
        let csv = "farm,house,noofbox,perbox,doa\nFarm 1,3,1,10,25\n";
        let dir = directory();
        let outcome = ChicksReceivingImporter::new(&dir)
            .import_str(csv, &registry(), &CycleRecordStore::default())
            .unwrap();

        assert_eq!(outcome.summary.processed_rows, 1);
        assert_eq!(outcome.quality_warnings.len(), 1);
        assert_eq!(outcome.quality_warnings[0].net_placed, -15);
    }

    #[test]
    fn test_existing_record_is_updated_in_place() {
        let dir = directory();
        let importer = ChicksReceivingImporter::new(&dir);
        let reg = registry();
        let first = importer
            .import_str("farm,house,noofbox,perbox\nFarm 1,1,10,10\n", &reg, &CycleRecordStore::default())
            .unwrap();
        let second = importer
            .import_str("farm,house,doa\nFarm 1,1,5\n", &reg, &first.store)
            .unwrap();

        assert_eq!(second.store.list_for_farm("Farm 1").len(), 1);
        let house = &second.store.get("Farm 1", CYCLE_ID).unwrap().houses[0];
        assert_eq!(house.no_of_box, 10);
        assert_eq!(house.net_placed, 95);
    }
}
