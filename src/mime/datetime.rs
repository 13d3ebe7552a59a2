//-
// Copyright (c) 2026, Mimetree contributors
//
// This file is part of Mimetree.
//
// Mimetree is free software: you can  redistribute it and/or modify it under
// the terms of  the GNU General Public  License as published by  the Free
// Software Foundation, either version  3 of the License, or (at  your option)
// any later version.
//
// Mimetree is distributed  in the hope that  it will be useful,  but WITHOUT
// ANY WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or
// FITNESS FOR  A PARTICULAR  PURPOSE.  See the  GNU General  Public  License
// for more details.
//
// You should have received a copy of the GNU General Public License along
// with Mimetree. If not, see <http://www.gnu.org/licenses/>.

//! Tolerant normalisation of RFC 2822 `Date` header values.

use chrono::prelude::*;
use lazy_static::lazy_static;
use regex::Regex;

use crate::support::error::Error;

lazy_static! {
    // A numeric UTC offset followed by a parenthetical zone comment at the
    // end of the value, e.g. "... 16:13:03 +0000 (CEST)".
    static ref ZONE_COMMENT: Regex =
        Regex::new(r"^(.*[+-]\d{4})\s*\([^()]*\)\s*$").unwrap();
}

/// RFC 2822 permits offsets up to fourteen hours from UTC; anything larger
/// is a malformed zone, not a real one.
const MAX_OFFSET_SECS: i32 = 14 * 3600;

/// The outcome of normalising a `Date` header.
///
/// Headers in the wild are frequently malformed beyond interpretation, so an
/// unparseable (but non-empty) value is carried verbatim rather than treated
/// as an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NormalizedDate {
    Parsed(DateTime<FixedOffset>),
    Unparsed(String),
}

impl NormalizedDate {
    /// The canonical ISO 8601 rendering, or the original string verbatim if
    /// the value never parsed.
    pub fn to_iso8601(&self) -> String {
        match *self {
            NormalizedDate::Parsed(ref dt) => dt.to_rfc3339(),
            NormalizedDate::Unparsed(ref raw) => raw.clone(),
        }
    }

    /// The UNIX timestamp, if the value parsed.
    pub fn timestamp(&self) -> Option<i64> {
        match *self {
            NormalizedDate::Parsed(ref dt) => Some(dt.timestamp()),
            NormalizedDate::Unparsed(_) => None,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(*self, NormalizedDate::Parsed(_))
    }
}

/// Normalise a `Date` header value.
///
/// Standard RFC 2822 parsing is attempted first. If that fails and the value
/// ends with a parenthetical zone comment preceded by a numeric offset (a
/// common agent habit), the comment is stripped and parsing retried. A value
/// that still fails to parse, or whose UTC offset lies outside ±14:00, is
/// returned verbatim as `Unparsed`; this never fails for non-empty input.
pub fn parse(raw: &str) -> Result<NormalizedDate, Error> {
    if raw.is_empty() {
        return Err(Error::EmptyInput("date header"));
    }

    if let Some(dt) = parse_strict(raw) {
        return Ok(NormalizedDate::Parsed(dt));
    }

    if let Some(captures) = ZONE_COMMENT.captures(raw) {
        let stripped = captures.get(1).expect("group 1 in match").as_str();
        if let Some(dt) = parse_strict(stripped) {
            return Ok(NormalizedDate::Parsed(dt));
        }
    }

    log::debug!("unparseable date header {:?}, passing through", raw);
    Ok(NormalizedDate::Unparsed(raw.to_owned()))
}

fn parse_strict(s: &str) -> Option<DateTime<FixedOffset>> {
    let dt = DateTime::parse_from_rfc2822(s.trim()).ok()?;
    if dt.offset().local_minus_utc().abs() > MAX_OFFSET_SECS {
        return None;
    }
    Some(dt)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_with_trailing_zone_comment() {
        let date = parse("Sun, 14 Aug 2005 16:13:03 +0000 (CEST)").unwrap();
        assert_eq!(Some(1124035983), date.timestamp());
    }

    #[test]
    fn parses_negative_offset() {
        let date = parse("Sun, 14 Aug 2005 16:13:03 -1000").unwrap();
        assert_eq!(Some(1124071983), date.timestamp());
    }

    #[test]
    fn out_of_range_offset_passes_through_verbatim() {
        let raw = "Sun, 14 Aug 2005 16:13:03 +9000";
        let date = parse(raw).unwrap();
        assert!(!date.is_parsed());
        assert_eq!(raw, date.to_iso8601());
    }

    #[test]
    fn offset_just_past_fourteen_hours_is_invalid() {
        let date = parse("Sun, 14 Aug 2005 16:13:03 +1401").unwrap();
        assert!(!date.is_parsed());
        let date = parse("Sun, 14 Aug 2005 16:13:03 +1400").unwrap();
        assert!(date.is_parsed());
    }

    #[test]
    fn garbage_passes_through_verbatim() {
        let date = parse("next Tuesday, probably").unwrap();
        assert_eq!("next Tuesday, probably", date.to_iso8601());
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(parse(""), Err(Error::EmptyInput(_))));
    }

    #[test]
    fn iso8601_rendering() {
        let date = parse("Sun, 14 Aug 2005 16:13:03 +0200").unwrap();
        assert_eq!("2005-08-14T16:13:03+02:00", date.to_iso8601());
    }
}
