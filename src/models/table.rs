//! 结果表格
//!
//! 首行为表头，其余为数据行；所有行补齐到表头宽度

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// 从二维值数组构建（首行视为表头）
    ///
    /// 没有数据或首行全为空时返回 `None`
    pub fn from_values(values: Vec<Vec<String>>) -> Option<Self> {
        let mut iter = values.into_iter();
        let headers = iter.next()?;
        if headers.iter().all(|h| h.trim().is_empty()) {
            return None;
        }

        let mut table = Self::new(headers);
        for row in iter {
            table.push_raw(row);
        }
        Some(table)
    }

    /// 转回二维值数组（表头在首行）
    pub fn to_values(&self) -> Vec<Vec<String>> {
        std::iter::once(self.headers.clone())
            .chain(self.rows.iter().cloned())
            .collect()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// 数据行数（不含表头）
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col)).map(String::as_str)
    }

    fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    fn push_raw(&mut self, mut row: Vec<String>) {
        // 比表头长的行扩展表头，避免丢数据
        if self.headers.len() < row.len() {
            self.headers.resize(row.len(), String::new());
            for existing in &mut self.rows {
                existing.resize(row.len(), String::new());
            }
        }
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    /// 删除所有单元格都为空的行，返回删除的行数
    pub fn drop_empty_rows(&mut self) -> usize {
        let before = self.rows.len();
        self.rows
            .retain(|row| row.iter().any(|cell| !cell.trim().is_empty()));
        before - self.rows.len()
    }

    /// 追加一行到末尾
    ///
    /// 表头中没有的列会追加到表头末尾，已有行在新列上补空
    pub fn append_row(&mut self, columns: &[String], values: &[String]) {
        for column in columns {
            if self.column_index(column).is_none() {
                self.headers.push(column.clone());
                for row in &mut self.rows {
                    row.push(String::new());
                }
            }
        }

        let mut row = vec![String::new(); self.headers.len()];
        for (column, value) in columns.iter().zip(values) {
            if let Some(col) = self.column_index(column) {
                row[col] = value.clone();
            }
        }
        self.rows.push(row);
    }
}
