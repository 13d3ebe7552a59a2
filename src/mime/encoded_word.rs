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

//! Decoding of RFC 2047 "encoded words" in header values.

use lazy_static::lazy_static;
use regex::Regex;

use super::charset::Charset;
use super::quoted_printable;
use super::utf7;
use crate::support::error::Error;

lazy_static! {
    static ref ENCODED_WORD: Regex =
        Regex::new(r"^=\?([!->@-~]*)\?([!->@-~]*)\?([!->@-~]*)\?=$").unwrap();
}

/// Test if `word` (in its entirety) is an RFC 2047 "encoded word".
///
/// If it is, decode it and return its decoded value.
///
/// Returns `Ok(None)` if it is not an encoded word or if it could not be
/// decoded (unknown charset, bad base-64 payload). The distinction between
/// `None` and a decoded value is significant: whitespace is supposed to be
/// deleted between adjacent encoded words, but must be left alone in all
/// other cases.
///
/// An encoded word whose declared sub-encoding is neither Q nor B is the one
/// malformation that fails instead of passing through, since silently
/// emitting the raw payload would corrupt the header text.
///
/// RFC 2047 caps an encoded word at 75 characters, but real agents produce
/// longer ones and real readers interpret them, so no length limit is
/// enforced here.
pub fn decode_word(word: &str) -> Result<Option<String>, Error> {
    let captures = match ENCODED_WORD.captures(word) {
        Some(captures) => captures,
        None => return Ok(None),
    };

    let charset_label = captures.get(1).expect("group 1 in match").as_str();
    let sub_encoding = captures.get(2).expect("group 2 in match").as_str();
    let payload = captures.get(3).expect("group 3 in match").as_str();

    // _ in the payload (before transfer decoding) stands for ASCII space
    // regardless of charset
    let payload = payload.replace('_', " ");

    let raw = match sub_encoding {
        "q" | "Q" => quoted_printable::decode(payload.as_bytes()).into_owned(),
        "b" | "B" => match base64::decode(payload.as_bytes()) {
            Ok(raw) => raw,
            Err(_) => return Ok(None),
        },
        _ => return Err(Error::MalformedEncodedWord(word.to_owned())),
    };

    if charset_label.eq_ignore_ascii_case("utf-7") {
        // encoding_rs doesn't do UTF-7...
        Ok(String::from_utf8(raw)
            .ok()
            .map(|s| utf7::TRANSFER.decode(&s).into_owned()))
    } else {
        // ... but it does everything else worth supporting
        Ok(encoding_rs::Encoding::for_label_no_replacement(
            charset_label.as_bytes(),
        )
        .map(|encoding| {
            encoding.decode_with_bom_removal(&raw).0.into_owned()
        }))
    }
}

/// Decode a header value that may contain RFC 2047 encoded words.
///
/// Encoded words may be interspersed with literal text; whitespace between
/// two adjacent encoded words is deleted per RFC 2047 §6.2, while all other
/// whitespace is preserved verbatim. Unrecognised or undecodable words pass
/// through unchanged.
///
/// `target_charset` names the charset the caller works in and must be on the
/// supported allow-list; the decoded text itself is returned as Unicode.
///
/// A blank value (empty or pure whitespace) is a degenerate decode target
/// and fails with `Error::EmptyInput`.
pub fn decode_header(raw: &str, target_charset: &str) -> Result<String, Error> {
    Charset::normalize(target_charset)?;
    if raw.trim().is_empty() {
        return Err(Error::EmptyInput("header value"));
    }

    let mut out = String::with_capacity(raw.len());
    let mut pending_ws = "";
    let mut prev_encoded = false;

    let mut rest = raw;
    while !rest.is_empty() {
        if rest.starts_with(|c: char| c.is_ascii_whitespace()) {
            let end = rest
                .find(|c: char| !c.is_ascii_whitespace())
                .unwrap_or(rest.len());
            pending_ws = &rest[..end];
            rest = &rest[end..];
            continue;
        }

        let end = rest
            .find(|c: char| c.is_ascii_whitespace())
            .unwrap_or(rest.len());
        let token = &rest[..end];
        rest = &rest[end..];

        match decode_word(token)? {
            Some(decoded) => {
                if !prev_encoded {
                    out.push_str(pending_ws);
                }
                out.push_str(&decoded);
                prev_encoded = true;
            },
            None => {
                out.push_str(pending_ws);
                out.push_str(token);
                prev_encoded = false;
            },
        }
        pending_ws = "";
    }
    out.push_str(pending_ws);

    Ok(out)
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_decode_word() {
        assert_eq!(None, decode_word("hello").unwrap());

        // Examples from RFC 2047
        assert_eq!(
            "Keith Moore",
            decode_word("=?US-ASCII?Q?Keith_Moore?=").unwrap().unwrap()
        );
        assert_eq!(
            "Keld Jørn Simonsen",
            decode_word("=?ISO-8859-1?Q?Keld_J=F8rn_Simonsen?=")
                .unwrap()
                .unwrap()
        );
        assert_eq!(
            "André",
            decode_word("=?ISO-8859-1?Q?Andr=E9?=").unwrap().unwrap()
        );
        assert_eq!(
            "If you can read this yo",
            decode_word("=?ISO-8859-1?B?SWYgeW91IGNhbiByZWFkIHRoaXMgeW8=?=")
                .unwrap()
                .unwrap()
        );
        assert_eq!(
            "םולש ןב ילטפנ",
            decode_word("=?iso-8859-8?b?7eXs+SDv4SDp7Oj08A==?=")
                .unwrap()
                .unwrap()
        );

        // Unknown charset passes through
        assert_eq!(None, decode_word("=?x-unknown?Q?foo?=").unwrap());
        // Invalid sub-encoding is an error
        assert!(matches!(
            decode_word("=?UTF-8?X?foo?="),
            Err(Error::MalformedEncodedWord(_))
        ));
    }

    #[test]
    fn decode_header_mixed_literal_and_encoded() {
        assert_eq!(
            "Sebastian Krätzig <sebastian.kraetzig@example.com>",
            decode_header(
                "=?iso-8859-1?Q?Sebastian_Kr=E4tzig?= \
                 <sebastian.kraetzig@example.com>",
                "UTF-8"
            )
            .unwrap()
        );
    }

    #[test]
    fn decode_header_is_idempotent_on_plain_text() {
        let plain = "nothing  encoded   here";
        assert_eq!(plain, decode_header(plain, "UTF-8").unwrap());
    }

    #[test]
    fn decode_header_collapses_ws_between_encoded_words() {
        assert_eq!(
            "ab",
            decode_header("=?UTF-8?Q?a?= =?UTF-8?Q?b?=", "UTF-8").unwrap()
        );
        assert_eq!(
            "ab",
            decode_header("=?UTF-8?Q?a?=   \t =?UTF-8?Q?b?=", "UTF-8")
                .unwrap()
        );
        // ...but not between an encoded word and a literal
        assert_eq!(
            "a b",
            decode_header("=?UTF-8?Q?a?= b", "UTF-8").unwrap()
        );
    }

    #[test]
    fn decode_header_rejects_blank_input() {
        assert!(matches!(
            decode_header("   ", "UTF-8"),
            Err(Error::EmptyInput(_))
        ));
        assert!(matches!(
            decode_header("", "UTF-8"),
            Err(Error::EmptyInput(_))
        ));
    }

    #[test]
    fn decode_header_rejects_bad_target_charset() {
        assert!(matches!(
            decode_header("hello", "UTF8"),
            Err(Error::UnsupportedCharset(_))
        ));
    }

    proptest! {
        #[test]
        fn decode_word_never_panics(s in r"=\?.*\?.*\?.*\?=") {
            let _ = decode_word(&s);
        }
    }
}
