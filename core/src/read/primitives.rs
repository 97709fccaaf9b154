//! Scalar readers.
//!
//! All of them share the permissive contract: bind what can be bound,
//! default what cannot, and always consume exactly one element.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{scalar_text, scalar_text_async, skip_and_default};
use crate::error::ScanResult;
use crate::token::TokenKind;
use crate::traits::{AsyncTokens, FromJson, FromJsonAsync, Tokens};

macro_rules! numeric_from_json {
    ($($ty:ty),* $(,)?) => {$(
        impl FromJson for $ty {
            fn from_json(tokens: &mut dyn Tokens) -> ScanResult<Self> {
                Ok(scalar_text(tokens)?
                    .and_then(|text| text.trim().parse().ok())
                    .unwrap_or_default())
            }
        }

        impl FromJsonAsync for $ty {
            async fn from_json_async<A: AsyncTokens>(tokens: &mut A) -> ScanResult<Self> {
                Ok(scalar_text_async(tokens)
                    .await?
                    .and_then(|text| text.trim().parse().ok())
                    .unwrap_or_default())
            }
        }
    )*};
}

numeric_from_json!(i8, u8, i16, u16, i32, u32, i64, u64, f32, f64, Decimal);

impl FromJson for String {
    fn from_json(tokens: &mut dyn Tokens) -> ScanResult<Self> {
        Ok(scalar_text(tokens)?.unwrap_or_default())
    }
}

impl FromJsonAsync for String {
    async fn from_json_async<A: AsyncTokens>(tokens: &mut A) -> ScanResult<Self> {
        Ok(scalar_text_async(tokens).await?.unwrap_or_default())
    }
}

impl FromJson for bool {
    fn from_json(tokens: &mut dyn Tokens) -> ScanResult<Self> {
        match tokens.kind() {
            TokenKind::True => {
                tokens.next_token()?;
                Ok(true)
            }
            TokenKind::False => {
                tokens.next_token()?;
                Ok(false)
            }
            TokenKind::String => {
                let text = tokens.read_value()?;
                Ok(text.trim().eq_ignore_ascii_case("true"))
            }
            _ => skip_and_default(tokens),
        }
    }
}

impl FromJsonAsync for bool {
    async fn from_json_async<A: AsyncTokens>(tokens: &mut A) -> ScanResult<Self> {
        match tokens.kind() {
            TokenKind::True => {
                tokens.next_token().await?;
                Ok(true)
            }
            TokenKind::False => {
                tokens.next_token().await?;
                Ok(false)
            }
            TokenKind::String => {
                let text = tokens.read_value().await?;
                Ok(text.trim().eq_ignore_ascii_case("true"))
            }
            _ => {
                tokens.skip_element().await?;
                Ok(false)
            }
        }
    }
}

/// Unix epoch, the default for unparseable datetime text.
fn epoch() -> DateTime<FixedOffset> {
    DateTime::<Utc>::UNIX_EPOCH.fixed_offset()
}

/// Parses datetime text: RFC 3339 first, then the common unzoned shapes
/// (assumed UTC), then a bare date.
pub(crate) fn parse_datetime(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc().fixed_offset());
    }
    None
}

impl FromJson for DateTime<FixedOffset> {
    fn from_json(tokens: &mut dyn Tokens) -> ScanResult<Self> {
        Ok(scalar_text(tokens)?
            .and_then(|text| parse_datetime(&text))
            .unwrap_or_else(epoch))
    }
}

impl FromJsonAsync for DateTime<FixedOffset> {
    async fn from_json_async<A: AsyncTokens>(tokens: &mut A) -> ScanResult<Self> {
        Ok(scalar_text_async(tokens)
            .await?
            .and_then(|text| parse_datetime(&text))
            .unwrap_or_else(epoch))
    }
}

/// Parses timespan text of the shape `[-][d.]hh:mm:ss[.fraction]`, or a
/// bare number of seconds.
pub(crate) fn parse_timespan(text: &str) -> Option<Duration> {
    let text = text.trim();
    let (neg, text) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let mut parts = text.split(':');
    let head = parts.next()?;
    let (days, hours) = match head.split_once('.') {
        Some((d, h)) => (d.parse::<i64>().ok()?, h.parse::<i64>().ok()?),
        None => (0, head.parse::<i64>().ok()?),
    };
    let (minutes, whole_seconds, nanos) = match (parts.next(), parts.next()) {
        (Some(m), Some(s)) => {
            let minutes = m.parse::<i64>().ok()?;
            match s.split_once('.') {
                Some((w, f)) => {
                    let scale = 10i64.checked_pow(f.len() as u32)?;
                    let nanos = f.parse::<i64>().ok()? * (1_000_000_000 / scale);
                    (minutes, w.parse::<i64>().ok()?, nanos)
                }
                None => (minutes, s.parse::<i64>().ok()?, 0),
            }
        }
        (Some(m), None) => (m.parse::<i64>().ok()?, 0, 0),
        (None, _) => {
            // A bare number is a count of seconds.
            return text
                .parse::<f64>()
                .ok()
                .and_then(|secs| Duration::try_seconds(secs as i64))
                .map(|d| if neg { -d } else { d });
        }
    };
    if parts.next().is_some() {
        return None;
    }
    let total = Duration::days(days)
        + Duration::hours(hours)
        + Duration::minutes(minutes)
        + Duration::seconds(whole_seconds)
        + Duration::nanoseconds(nanos);
    Some(if neg { -total } else { total })
}

impl FromJson for Duration {
    fn from_json(tokens: &mut dyn Tokens) -> ScanResult<Self> {
        Ok(scalar_text(tokens)?
            .and_then(|text| parse_timespan(&text))
            .unwrap_or_else(Duration::zero))
    }
}

impl FromJsonAsync for Duration {
    async fn from_json_async<A: AsyncTokens>(tokens: &mut A) -> ScanResult<Self> {
        Ok(scalar_text_async(tokens)
            .await?
            .and_then(|text| parse_timespan(&text))
            .unwrap_or_else(Duration::zero))
    }
}

impl FromJson for Uuid {
    fn from_json(tokens: &mut dyn Tokens) -> ScanResult<Self> {
        Ok(scalar_text(tokens)?
            .and_then(|text| Uuid::parse_str(text.trim()).ok())
            .unwrap_or_default())
    }
}

impl FromJsonAsync for Uuid {
    async fn from_json_async<A: AsyncTokens>(tokens: &mut A) -> ScanResult<Self> {
        Ok(scalar_text_async(tokens)
            .await?
            .and_then(|text| Uuid::parse_str(text.trim()).ok())
            .unwrap_or_default())
    }
}
