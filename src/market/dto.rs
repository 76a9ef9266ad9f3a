use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Bar size accepted by the aggregates endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timespan {
    Minute,
    Hour,
    #[default]
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Timespan {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub timespan: Timespan,
    #[serde(default = "default_from")]
    pub from_date: String,
    #[serde(default = "default_to")]
    pub to_date: String,
}

fn default_from() -> String {
    "2024-01-01".into()
}

fn default_to() -> String {
    "2025-07-10".into()
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub symbol: String,
    pub timespan: Timespan,
    pub from: String,
    pub to: String,
    pub prices: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CloseSummary {
    pub min_close: f64,
    pub max_close: f64,
    pub avg_close: f64,
}

/// `summary` is an empty object when the series has no closing prices.
#[derive(Debug, Serialize)]
pub struct HistorySummaryResponse {
    pub symbol: String,
    pub timespan: Timespan,
    pub from: String,
    pub to: String,
    pub summary: Value,
}

#[derive(Debug, Serialize)]
pub struct ChartResponse {
    pub chart_url: String,
}

#[derive(Debug, Serialize)]
pub struct GlobalNewsResponse {
    pub news: Vec<Value>,
    pub message: &'static str,
}

/// Min/max/mean of the `c` (close) field across bars; bars without a numeric close are skipped.
pub fn close_summary(bars: &[Value]) -> Option<CloseSummary> {
    let closes: Vec<f64> = bars
        .iter()
        .filter_map(|bar| bar.get("c").and_then(Value::as_f64))
        .collect();
    if closes.is_empty() {
        return None;
    }
    let min_close = closes.iter().copied().fold(f64::INFINITY, f64::min);
    let max_close = closes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let avg_close = closes.iter().sum::<f64>() / closes.len() as f64;
    Some(CloseSummary {
        min_close,
        max_close,
        avg_close,
    })
}
