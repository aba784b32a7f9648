// ==========================================
// 禽场生产跟踪系统 - CSV 解析器
// ==========================================
// 职责: 读取 CSV，表头经别名表归一为标准字段名
// 行号: 表头为第 1 行，数据从第 2 行开始
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::HeaderAliases;
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// 原始行：标准字段名 -> 值
pub type RawRow = HashMap<String, String>;

/// 解析结果
#[derive(Debug, Clone, Default)]
pub struct ParsedCsv {
    /// 归一后的表头
    pub headers: Vec<String>,
    /// (行号, 行数据)
    pub rows: Vec<(usize, RawRow)>,
}

impl ParsedCsv {
    pub fn has_column(&self, canonical: &str) -> bool {
        self.headers.iter().any(|h| h == canonical)
    }

    /// 校验必需列
    pub fn require_columns(&self, columns: &[&str]) -> ImportResult<()> {
        for column in columns {
            if !self.has_column(column) {
                return Err(ImportError::MissingRequiredColumn(column.to_string()));
            }
        }
        Ok(())
    }
}

// ==========================================
// CsvParser 实现
// ==========================================
pub struct CsvParser;

impl CsvParser {
    /// 解析 CSV 文件
    pub fn parse_file(&self, file_path: &Path, aliases: &HeaderAliases) -> ImportResult<ParsedCsv> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        if let Some(ext) = file_path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        let file = File::open(file_path)?;
        self.parse_reader(file, aliases)
    }

    /// 解析 CSV 文本（粘贴导入）
    pub fn parse_str(&self, content: &str, aliases: &HeaderAliases) -> ImportResult<ParsedCsv> {
        self.parse_reader(content.as_bytes(), aliases)
    }

    fn parse_reader<R: Read>(&self, source: R, aliases: &HeaderAliases) -> ImportResult<ParsedCsv> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .trim(csv::Trim::All)
            .from_reader(source);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| aliases.canonical(h))
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(ImportError::EmptyFile);
        }

        let mut rows = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            let record = result?;
            let mut row_map = RawRow::new();

            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    if !header.is_empty() {
                        row_map.insert(header.clone(), value.trim().to_string());
                    }
                }
            }

            // 跳过完全空白的行
            if row_map.values().all(|v| v.is_empty()) {
                continue;
            }

            rows.push((row_idx + 2, row_map));
        }

        Ok(ParsedCsv { headers, rows })
    }
}
