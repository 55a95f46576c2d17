//! Response header utilities: charset selection and cache-control metadata.

use chrono::{DateTime, TimeDelta, Utc};

use crate::http::{header_value, Headers, NetworkResponse};

/// Charset the transport assumes when `Content-Type` names none.
pub const DEFAULT_CONTENT_CHARSET: &str = "ISO-8859-1";

/// Freshness metadata derived from a response's headers.
///
/// `soft_ttl` is when the entry should be refreshed; `ttl` is when it must no
/// longer be served. `None` means "already stale".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub etag: Option<String>,
    pub server_date: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
    pub soft_ttl: Option<DateTime<Utc>>,
    pub ttl: Option<DateTime<Utc>>,
    pub headers: Headers,
}

impl CacheEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.ttl.is_none_or(|ttl| ttl < now)
    }

    pub fn refresh_needed(&self, now: DateTime<Utc>) -> bool {
        self.soft_ttl.is_none_or(|soft_ttl| soft_ttl < now)
    }
}

/// The `charset` parameter of the `Content-Type` header, or `default`.
pub fn parse_charset(headers: &[(String, String)], default: &str) -> String {
    header_value(headers, "Content-Type")
        .and_then(|content_type| {
            content_type.split(';').skip(1).find_map(|param| {
                let (key, value) = param.trim().split_once('=')?;
                key.trim()
                    .eq_ignore_ascii_case("charset")
                    .then(|| value.trim().trim_matches('"').to_string())
            })
        })
        .filter(|charset| !charset.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Parse an RFC 1123 HTTP-date (`Wed, 21 Oct 2015 07:28:00 GMT`).
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// Derive cache metadata from `response` relative to the current time.
///
/// Returns `None` when the server forbids caching (`no-cache` / `no-store`).
pub fn parse_cache_headers(response: &NetworkResponse) -> Option<CacheEntry> {
    parse_cache_headers_at(response, Utc::now())
}

/// [`parse_cache_headers`] with an explicit clock.
pub fn parse_cache_headers_at(response: &NetworkResponse, now: DateTime<Utc>) -> Option<CacheEntry> {
    let server_date = response.header("Date").and_then(parse_date);
    let server_expires = response.header("Expires").and_then(parse_date);
    let last_modified = response.header("Last-Modified").and_then(parse_date);
    let etag = response.header("ETag").map(str::to_string);

    let mut max_age = 0_i64;
    let mut stale_while_revalidate = 0_i64;
    let mut must_revalidate = false;

    let cache_control = response.header("Cache-Control");
    if let Some(cache_control) = cache_control {
        for token in cache_control.split(',').map(str::trim) {
            let lower = token.to_ascii_lowercase();
            if lower == "no-cache" || lower == "no-store" {
                return None;
            } else if let Some(seconds) = lower.strip_prefix("max-age=") {
                if let Ok(seconds) = seconds.parse() {
                    max_age = seconds;
                }
            } else if let Some(seconds) = lower.strip_prefix("stale-while-revalidate=") {
                if let Ok(seconds) = seconds.parse() {
                    stale_while_revalidate = seconds;
                }
            } else if lower == "must-revalidate" || lower == "proxy-revalidate" {
                must_revalidate = true;
            }
        }
    }

    let (soft_ttl, ttl) = if cache_control.is_some() {
        let soft_ttl = offset(now, TimeDelta::try_seconds(max_age));
        let ttl = if must_revalidate {
            soft_ttl
        } else {
            soft_ttl.and_then(|soft| offset(soft, TimeDelta::try_seconds(stale_while_revalidate)))
        };
        (soft_ttl, ttl)
    } else {
        match (server_date, server_expires) {
            (Some(date), Some(expires)) if expires >= date => {
                let soft_ttl = offset(now, Some(expires - date));
                (soft_ttl, soft_ttl)
            }
            _ => (None, None),
        }
    };

    Some(CacheEntry {
        etag,
        server_date,
        last_modified,
        soft_ttl,
        ttl,
        headers: response.headers.clone(),
    })
}

fn offset(base: DateTime<Utc>, delta: Option<TimeDelta>) -> Option<DateTime<Utc>> {
    base.checked_add_signed(delta?)
}
