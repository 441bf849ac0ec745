//! Display helpers for counts and timestamps.

use chrono::{DateTime, Utc};

const MINUTE_MS: i64 = 60_000;

/// Group digits in threes with commas, the way `en-US` renders numbers.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Compact form of a count: `9,999`, `45.6k`, `175k`.
pub fn abbreviate_num(n: u64) -> String {
    if n >= 100_000 {
        format!("{}k", (n as f64 / 1000.0).round() as u64)
    } else if n >= 10_000 {
        // exact halves (10.25) round up, not to even
        if n % 500 == 250 {
            let tenths = n / 100 + 1;
            format!("{}.{}k", tenths / 10, tenths % 10)
        } else {
            format!("{:.1}k", n as f64 / 1000.0)
        }
    } else {
        group_thousands(n)
    }
}

/// Age of an ISO-8601 timestamp relative to now: `just now`, `5m ago`, `2h ago`,
/// `10d ago`, `2mo ago`.
///
/// Unparseable input is returned unchanged.
pub fn relative_time(iso_date: &str) -> String {
    relative_time_at(iso_date, Utc::now())
}

pub fn relative_time_at(iso_date: &str, now: DateTime<Utc>) -> String {
    match DateTime::parse_from_rfc3339(iso_date) {
        Ok(then) => elapsed_label(now.timestamp_millis() - then.timestamp_millis()),
        Err(_) => iso_date.to_string(),
    }
}

fn elapsed_label(diff_ms: i64) -> String {
    let mins = diff_ms.div_euclid(MINUTE_MS);
    if mins < 1 {
        return "just now".to_string();
    }
    if mins < 60 {
        return format!("{mins}m ago");
    }
    let hrs = mins / 60;
    if hrs < 24 {
        return format!("{hrs}h ago");
    }
    let days = hrs / 24;
    if days < 30 {
        return format!("{days}d ago");
    }
    format!("{}mo ago", days / 30)
}
