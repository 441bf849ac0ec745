use http::HeaderMap;

pub const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

/// Rate-limit view of a single response, recomputed from its headers every time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RateLimitState {
    pub remaining: Option<i64>,
    pub reset_epoch_secs: Option<i64>,
}

impl RateLimitState {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            remaining: header_int(headers, RATE_LIMIT_REMAINING),
            reset_epoch_secs: header_int(headers, RATE_LIMIT_RESET),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }

    /// Whole minutes until the window resets, never less than one.
    pub fn minutes_until_reset(&self, now_ms: i64) -> Option<i64> {
        let reset_ms = self.reset_epoch_secs?.checked_mul(1000)?;
        let minutes = (reset_ms.checked_sub(now_ms)? as f64 / 60_000.0).ceil() as i64;
        Some(minutes.max(1))
    }

    /// User-facing message, only when the quota is spent and the reset time is known.
    pub fn message(&self, now_ms: i64) -> Option<String> {
        if !self.is_exhausted() {
            return None;
        }
        self.minutes_until_reset(now_ms)
            .map(|minutes| format!("Rate limited — try again in {minutes}m"))
    }
}

/// Returns a rate-limit message for an exhausted quota, or `None`.
pub fn parse_rate_limit(headers: &HeaderMap) -> Option<String> {
    RateLimitState::from_headers(headers).message(crate::now_millis())
}

fn header_int(headers: &HeaderMap, name: &str) -> Option<i64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_leading_int)
}

// Accepts the leading integer of a header value ("42", " 7 ", "0abc").
fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}
