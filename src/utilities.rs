use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

pub fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

pub fn format_millis(millis: Option<i64>) -> String {
    match millis {
        Some(millis) => millis_to_datetime(millis).to_rfc3339_opts(SecondsFormat::Millis, true),
        None => "-".to_string(),
    }
}
