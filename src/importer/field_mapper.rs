// ==========================================
// 禽场生产跟踪系统 - 字段映射器
// ==========================================
// 职责: 表头别名归一 + 行 -> 领域对象 + 类型转换
// 表头匹配: 忽略大小写与空格/标点
// ==========================================

use crate::domain::{Employee, MAX_HOUSE_FIELD_VALUE};
use crate::engine::ChicksHouseEdit;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::RawRow;

// ==========================================
// 表头别名表
// ==========================================
pub struct HeaderAliases {
    /// (归一化别名, 标准字段名)
    entries: &'static [(&'static str, &'static str)],
}

impl HeaderAliases {
    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { entries }
    }

    /// 表头 -> 标准字段名；未知表头保留原文（去首尾空白）
    pub fn canonical(&self, header: &str) -> String {
        let normalized = normalize_header(header);
        self.entries
            .iter()
            .find(|(alias, _)| *alias == normalized)
            .map(|(_, canonical)| canonical.to_string())
            .unwrap_or_else(|| header.trim().to_string())
    }
}

/// 小写并去除非字母数字字符："SAP No." -> "sapno"
fn normalize_header(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// 员工名册
pub static EMPLOYEE_ALIASES: HeaderAliases = HeaderAliases::new(&[
    ("sap", "sapNo"),
    ("sapno", "sapNo"),
    ("sapnumber", "sapNo"),
    ("sapid", "sapNo"),
    ("sn", "sN"),
    ("serialno", "sN"),
    ("comp", "compNo"),
    ("compno", "compNo"),
    ("companyno", "compNo"),
    ("name", "name"),
    ("employeename", "name"),
    ("designation", "designation"),
    ("position", "designation"),
    ("farm", "farmName"),
    ("farmname", "farmName"),
    ("phone", "phone"),
    ("mobile", "phone"),
    ("joiningdate", "joiningDate"),
    ("doj", "joiningDate"),
]);

/// 雏鸡接收
pub static CHICKS_RECEIVING_ALIASES: HeaderAliases = HeaderAliases::new(&[
    ("farm", "farm"),
    ("farmname", "farm"),
    ("house", "house"),
    ("houseno", "house"),
    ("flock", "flock"),
    ("flockno", "flock"),
    ("box", "noOfBox"),
    ("boxes", "noOfBox"),
    ("noofbox", "noOfBox"),
    ("noofboxes", "noOfBox"),
    ("perbox", "perBoxChicks"),
    ("perboxchicks", "perBoxChicks"),
    ("chicksperbox", "perBoxChicks"),
    ("extra", "extraChicks"),
    ("extrachicks", "extraChicks"),
    ("doa", "doa"),
    ("placementdate", "placementDate"),
    ("placement", "placementDate"),
    ("hatchery", "hatchery"),
]);

// ==========================================
// 雏鸡接收导入行
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ChicksReceivingRow {
    pub row_number: usize,
    pub farm_name: String,
    pub house_no: u32,
    pub edit: ChicksHouseEdit,
    pub placement_date: Option<String>,
    pub hatchery: Option<String>,
}

impl ChicksReceivingRow {
    /// 去重键: 场区 + 栋号
    pub fn key(&self) -> String {
        format!("{}#{}", self.farm_name, self.house_no)
    }
}

// ==========================================
// FieldMapper
// ==========================================
pub struct FieldMapper;

impl FieldMapper {
    /// 行 -> 员工
    ///
    /// # 返回
    /// - Err(PrimaryKeyMissing): SAP 号为空
    pub fn map_employee(&self, row: &RawRow, row_number: usize) -> ImportResult<Employee> {
        let sap_no = self
            .get_string(row, "sapNo")
            .ok_or_else(|| ImportError::PrimaryKeyMissing {
                row: row_number,
                field: "sapNo".to_string(),
            })?;

        Ok(Employee {
            sap_no,
            s_n: self.get_string(row, "sN"),
            name: self.get_string(row, "name").unwrap_or_default(),
            designation: self.get_string(row, "designation"),
            comp_no: self.get_string(row, "compNo"),
            farm_name: self.get_string(row, "farmName"),
            phone: self.get_string(row, "phone"),
            joining_date: self.get_string(row, "joiningDate"),
        })
    }

    /// 行 -> 雏鸡接收行
    pub fn map_chicks_receiving(
        &self,
        row: &RawRow,
        row_number: usize,
    ) -> ImportResult<ChicksReceivingRow> {
        let farm_name = self
            .get_string(row, "farm")
            .ok_or_else(|| ImportError::PrimaryKeyMissing {
                row: row_number,
                field: "farm".to_string(),
            })?;
        let house_no = self
            .parse_i64(row, "house", row_number)?
            .ok_or_else(|| ImportError::PrimaryKeyMissing {
                row: row_number,
                field: "house".to_string(),
            })?;
        let house_no = u32::try_from(house_no).map_err(|_| ImportError::TypeConversionError {
            row: row_number,
            field: "house".to_string(),
            message: format!("栋号必须为正整数: {}", house_no),
        })?;

        Ok(ChicksReceivingRow {
            row_number,
            farm_name,
            house_no,
            edit: ChicksHouseEdit {
                flock: self.get_string(row, "flock"),
                no_of_box: self.parse_i64(row, "noOfBox", row_number)?,
                per_box_chicks: self.parse_i64(row, "perBoxChicks", row_number)?,
                extra_chicks: self.parse_i64(row, "extraChicks", row_number)?,
                doa: self.parse_i64(row, "doa", row_number)?,
            },
            placement_date: self.get_string(row, "placementDate"),
            hatchery: self.get_string(row, "hatchery"),
        })
    }

    // ===== 辅助方法 =====

    fn get_string(&self, row: &RawRow, key: &str) -> Option<String> {
        row.get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string())
    }

    /// 整数解析，容忍千分位逗号与 "12.0" 形式
    ///
    /// 绝对值超过 MAX_HOUSE_FIELD_VALUE 视为录入错误
    fn parse_i64(&self, row: &RawRow, key: &str, row_number: usize) -> ImportResult<Option<i64>> {
        let Some(raw) = self.get_string(row, key) else {
            return Ok(None);
        };
        let cleaned = raw.replace(',', "");

        let parsed = cleaned.parse::<i64>().ok().or_else(|| {
            cleaned
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && v.fract() == 0.0 && v.abs() <= MAX_HOUSE_FIELD_VALUE as f64)
                .map(|v| v as i64)
        });

        match parsed {
            Some(v) if v.abs() <= MAX_HOUSE_FIELD_VALUE => Ok(Some(v)),
            Some(v) => Err(ImportError::TypeConversionError {
                row: row_number,
                field: key.to_string(),
                message: format!("数值超出允许范围 (±{}): {}", MAX_HOUSE_FIELD_VALUE, v),
            }),
            None => Err(ImportError::TypeConversionError {
                row: row_number,
                field: key.to_string(),
                message: format!("无法解析为整数: {}", raw),
            }),
        }
    }
}
