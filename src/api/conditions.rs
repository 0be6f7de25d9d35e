//! Precondition header handling
//!
//! Assembles the If-Match / If-None-Match / If-Modified-Since /
//! If-Unmodified-Since headers into a condition collection before the
//! request reaches the service layer, and formats version headers on the
//! way out.

use axum::http::{header, HeaderMap, HeaderName};
use chrono::{DateTime, Utc};

use crate::aggregate::VersionTag;
use crate::conditional::{ConditionCollection, VersionCondition};
use crate::error::AppError;

/// Build the condition collection for a request
///
/// `is_read` softens a none-match/modified-since miss into `Unmodified`
/// instead of a precondition failure.
pub fn conditions_from_headers(
    headers: &HeaderMap,
    is_read: bool,
) -> Result<ConditionCollection<VersionTag>, AppError> {
    let mut conditions = ConditionCollection::new();

    if let Some(value) = header_str(headers, header::IF_MATCH)? {
        if value.trim() == "*" {
            conditions.push(VersionCondition::Exists);
        } else {
            // A single entity-tag; any-of composition over a tag list is not
            // representable in the condition algebra.
            conditions.push(VersionCondition::IsMatch(parse_entity_tag(value)?));
        }
    }

    if let Some(value) = header_str(headers, header::IF_NONE_MATCH)? {
        if value.trim() == "*" {
            conditions.push(VersionCondition::NotExists { is_read });
        } else {
            // "differs from every listed tag", which is plain conjunction
            for tag in value.split(',') {
                conditions.push(VersionCondition::IsDifferent {
                    tag: parse_entity_tag(tag)?,
                    is_read,
                });
            }
        }
    }

    if let Some(value) = header_str(headers, header::IF_MODIFIED_SINCE)? {
        conditions.push(VersionCondition::ModifiedSince {
            date: parse_http_date(value)?,
            is_read,
        });
    }

    if let Some(value) = header_str(headers, header::IF_UNMODIFIED_SINCE)? {
        conditions.push(VersionCondition::UnmodifiedSince(parse_http_date(value)?));
    }

    Ok(conditions)
}

fn header_str(headers: &HeaderMap, name: HeaderName) -> Result<Option<&str>, AppError> {
    match headers.get(&name) {
        Some(value) => value
            .to_str()
            .map(Some)
            .map_err(|_| AppError::InvalidCondition(format!("{name} is not valid text"))),
        None => Ok(None),
    }
}

/// Parse a quoted (optionally weak) entity-tag into a version tag
fn parse_entity_tag(value: &str) -> Result<VersionTag, AppError> {
    let value = value.trim();
    let unprefixed = value.strip_prefix("W/").unwrap_or(value);
    let inner = unprefixed
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .ok_or_else(|| AppError::InvalidCondition(format!("malformed entity-tag: {value}")))?;

    inner
        .parse()
        .map_err(|_| AppError::InvalidCondition(format!("unrecognized entity-tag: {value}")))
}

/// Format a version tag as a quoted entity-tag
pub fn format_entity_tag(tag: VersionTag) -> String {
    format!("\"{tag}\"")
}

fn parse_http_date(value: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc2822(value.trim())
        .map(|date| date.with_timezone(&Utc))
        .map_err(|_| AppError::InvalidCondition(format!("malformed HTTP date: {value}")))
}

/// Format an instant as an IMF-fixdate HTTP date, whole-second resolution
pub fn format_http_date(date: DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::TimeZone;

    fn headers(pairs: &[(HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_no_headers_yields_empty_collection() {
        let conditions = conditions_from_headers(&HeaderMap::new(), true).unwrap();
        assert!(conditions.is_empty());
    }

    #[test]
    fn test_if_match_tag() {
        let map = headers(&[(header::IF_MATCH, "\"7\"")]);
        let conditions = conditions_from_headers(&map, false).unwrap();

        assert_eq!(
            conditions.conditions(),
            &[VersionCondition::IsMatch(VersionTag::new(7))]
        );
    }

    #[test]
    fn test_if_match_wildcard() {
        let map = headers(&[(header::IF_MATCH, "*")]);
        let conditions = conditions_from_headers(&map, false).unwrap();

        assert_eq!(conditions.conditions(), &[VersionCondition::Exists]);
    }

    #[test]
    fn test_if_none_match_list() {
        let map = headers(&[(header::IF_NONE_MATCH, "\"1\", W/\"2\"")]);
        let conditions = conditions_from_headers(&map, true).unwrap();

        assert_eq!(
            conditions.conditions(),
            &[
                VersionCondition::IsDifferent {
                    tag: VersionTag::new(1),
                    is_read: true,
                },
                VersionCondition::IsDifferent {
                    tag: VersionTag::new(2),
                    is_read: true,
                },
            ]
        );
    }

    #[test]
    fn test_if_none_match_wildcard() {
        let map = headers(&[(header::IF_NONE_MATCH, "*")]);
        let conditions = conditions_from_headers(&map, false).unwrap();

        assert_eq!(
            conditions.conditions(),
            &[VersionCondition::NotExists { is_read: false }]
        );
    }

    #[test]
    fn test_malformed_entity_tag_is_rejected() {
        let map = headers(&[(header::IF_MATCH, "7")]);
        let result = conditions_from_headers(&map, false);
        assert!(matches!(result, Err(AppError::InvalidCondition(_))));
    }

    #[test]
    fn test_http_date_round_trip() {
        let date = Utc.with_ymd_and_hms(2025, 11, 2, 8, 49, 37).unwrap();
        let text = format_http_date(date);
        assert_eq!(text, "Sun, 02 Nov 2025 08:49:37 GMT");

        let map = headers(&[(header::IF_UNMODIFIED_SINCE, text.as_str())]);
        let conditions = conditions_from_headers(&map, false).unwrap();
        assert_eq!(
            conditions.conditions(),
            &[VersionCondition::UnmodifiedSince(date)]
        );
    }

    #[test]
    fn test_malformed_date_is_rejected() {
        let map = headers(&[(header::IF_MODIFIED_SINCE, "yesterday")]);
        let result = conditions_from_headers(&map, true);
        assert!(matches!(result, Err(AppError::InvalidCondition(_))));
    }

    #[test]
    fn test_format_entity_tag() {
        assert_eq!(format_entity_tag(VersionTag::new(12)), "\"12\"");
    }
}
