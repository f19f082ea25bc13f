// Время

use chrono::{DateTime, Utc};

/// Текущее время в UTC
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Unix timestamp в секундах (с дробной частью)
pub fn current_timestamp() -> f64 {
    to_seconds(&now())
}

pub fn to_seconds(time: &DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64 / 1000.0
}
