use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const RISK_PROBABILITY: &str = "risk_probability";
pub const RISK_LABEL: &str = "risk_label";

/// 解析數值儲存格；空字串、非數字與 inf/NaN 都視為缺值
pub fn parse_number(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// 整數值輸出時不帶小數點
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// A parsed CSV file. Cells stay as raw strings so the file round-trips.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl EventTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx).map(String::as_str)
    }

    /// Appends a column filled with `value`; returns its index.
    pub fn push_column(&mut self, name: &str, value: &str) -> usize {
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(value.to_string());
        }
        self.headers.len() - 1
    }

    /// Removes every column called `name`; returns how many were dropped.
    pub fn drop_column(&mut self, name: &str) -> usize {
        let indices: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| h.as_str() == name)
            .map(|(i, _)| i)
            .collect();
        for &idx in indices.iter().rev() {
            self.headers.remove(idx);
            for row in &mut self.rows {
                if idx < row.len() {
                    row.remove(idx);
                }
            }
        }
        indices.len()
    }

    /// 重新評分前移除舊的分數欄位，輸出只會有一組 risk_probability / risk_label
    pub fn without_score_columns(mut self) -> Self {
        self.drop_column(RISK_PROBABILITY);
        self.drop_column(RISK_LABEL);
        self
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> EventTable {
        EventTable {
            headers: self.headers.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    pub fn record(&self, row: usize) -> Record {
        let mut data = BTreeMap::new();
        if let Some(cells) = self.rows.get(row) {
            for (header, cell) in self.headers.iter().zip(cells) {
                data.insert(header.clone(), Record::cell_value(cell));
            }
        }
        Record { data }
    }
}

/// JSON view of a single row, used when showing alert details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: BTreeMap<String, serde_json::Value>,
}

impl Record {
    fn cell_value(cell: &str) -> serde_json::Value {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            return serde_json::Value::Null;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return serde_json::Value::Number(i.into());
        }
        match parse_number(trimmed).and_then(serde_json::Number::from_f64) {
            Some(n) => serde_json::Value::Number(n),
            None => serde_json::Value::String(cell.to_string()),
        }
    }

    /// String value of a field; null and empty strings count as absent.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.data.get(key)? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.trim().is_empty() => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.data.get(key)? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => parse_number(s),
            _ => None,
        }
    }

    pub fn insert(&mut self, key: &str, value: serde_json::Value) {
        self.data.insert(key.to_string(), value);
    }
}

/// An event table plus the scoring output columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoredTable {
    pub table: EventTable,
    pub risk_probability: Vec<f64>,
    /// Only filled by the trained-model scorer.
    pub risk_label: Option<Vec<u8>>,
}

impl ScoredTable {
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn headers(&self) -> Vec<String> {
        let mut headers = self.table.headers.clone();
        headers.push(RISK_PROBABILITY.to_string());
        if self.risk_label.is_some() {
            headers.push(RISK_LABEL.to_string());
        }
        headers
    }

    pub fn row(&self, index: usize) -> Vec<String> {
        let mut row = self.table.rows.get(index).cloned().unwrap_or_default();
        row.push(format!("{}", self.risk_probability.get(index).copied().unwrap_or(0.0)));
        if let Some(labels) = &self.risk_label {
            row.push(labels.get(index).copied().unwrap_or(0).to_string());
        }
        row
    }

    pub fn record(&self, index: usize) -> Record {
        let mut record = self.table.record(index);
        if let Some(p) = self.risk_probability.get(index) {
            record.insert(
                RISK_PROBABILITY,
                serde_json::Number::from_f64(*p)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null),
            );
        }
        if let Some(label) = self.risk_label.as_ref().and_then(|l| l.get(index)) {
            record.insert(RISK_LABEL, serde_json::Value::Number((*label).into()));
        }
        record
    }

    /// Flattens the score columns into a plain table (used for chart data).
    pub fn to_table(&self) -> EventTable {
        EventTable {
            headers: self.headers(),
            rows: (0..self.len()).map(|i| self.row(i)).collect(),
        }
    }

    pub fn head(&self, n: usize) -> ScoredTable {
        ScoredTable {
            table: self.table.head(n),
            risk_probability: self.risk_probability.iter().take(n).copied().collect(),
            risk_label: self
                .risk_label
                .as_ref()
                .map(|labels| labels.iter().take(n).copied().collect()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub row_index: usize,
    pub headline: String,
    pub risk_probability: f64,
    pub record: Record,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarPoint {
    pub metric: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarChart {
    pub points: Vec<RadarPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardView {
    ScoredEvents,
    NetworkTraffic,
}

impl DashboardView {
    pub fn title(&self) -> &'static str {
        match self {
            DashboardView::ScoredEvents => "Scored Events",
            DashboardView::NetworkTraffic => "Network Traffic Analysis",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    pub scored: ScoredTable,
    pub alerts: Vec<Alert>,
    pub radar: Option<RadarChart>,
    pub view: DashboardView,
    pub threshold: f64,
    pub scorer: String,
    pub generated_at: DateTime<Utc>,
}
