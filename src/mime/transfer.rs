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

//! Content transfer encodings and their two directions of transformation.

use std::borrow::Cow;

use super::quoted_printable;

/// The `Content-Transfer-Encoding` of a body part.
///
/// Unrecognised encodings are folded into `Other`, which is handled as an
/// identity transformation like `Binary`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentTransferEncoding {
    SevenBit,
    EightBit,
    Binary,
    Base64,
    QuotedPrintable,
    Other,
}

impl Default for ContentTransferEncoding {
    fn default() -> Self {
        ContentTransferEncoding::SevenBit
    }
}

impl ContentTransferEncoding {
    /// Parse a `Content-Transfer-Encoding` token.
    ///
    /// This is tolerant: anything unrecognised becomes `Other` rather than
    /// failing.
    pub fn parse(token: &str) -> Self {
        let token = token.trim();
        if token.eq_ignore_ascii_case("7bit") {
            ContentTransferEncoding::SevenBit
        } else if token.eq_ignore_ascii_case("8bit") {
            ContentTransferEncoding::EightBit
        } else if token.eq_ignore_ascii_case("binary") {
            ContentTransferEncoding::Binary
        } else if token.eq_ignore_ascii_case("base64") {
            ContentTransferEncoding::Base64
        } else if token.eq_ignore_ascii_case("quoted-printable") {
            ContentTransferEncoding::QuotedPrintable
        } else {
            ContentTransferEncoding::Other
        }
    }

    /// The canonical header token for this encoding.
    pub fn name(self) -> &'static str {
        match self {
            ContentTransferEncoding::SevenBit => "7BIT",
            ContentTransferEncoding::EightBit => "8BIT",
            ContentTransferEncoding::Binary => "BINARY",
            ContentTransferEncoding::Base64 => "BASE64",
            ContentTransferEncoding::QuotedPrintable => "QUOTED-PRINTABLE",
            ContentTransferEncoding::Other => "OTHER",
        }
    }
}

/// Decode transfer-encoded content into its raw bytes.
///
/// Base64 ignores embedded line breaks and any other bytes outside the
/// base-64 alphabet, and drops an undecodable trailing fragment rather than
/// failing. The identity encodings return the input unchanged.
pub fn decode(
    data: &[u8],
    cte: ContentTransferEncoding,
) -> Cow<[u8]> {
    match cte {
        ContentTransferEncoding::SevenBit
        | ContentTransferEncoding::EightBit
        | ContentTransferEncoding::Binary
        | ContentTransferEncoding::Other => Cow::Borrowed(data),
        ContentTransferEncoding::QuotedPrintable => {
            quoted_printable::decode(data)
        },
        ContentTransferEncoding::Base64 => {
            Cow::Owned(decode_base64(data))
        },
    }
}

/// Encode raw bytes for transport under the given encoding.
///
/// Base64 output is wrapped at 76 columns with CRLF line endings as RFC 2045
/// requires.
pub fn encode(data: &[u8], cte: ContentTransferEncoding) -> Vec<u8> {
    match cte {
        ContentTransferEncoding::SevenBit
        | ContentTransferEncoding::EightBit
        | ContentTransferEncoding::Binary
        | ContentTransferEncoding::Other => data.to_vec(),
        ContentTransferEncoding::QuotedPrintable => {
            quoted_printable::encode(data)
        },
        ContentTransferEncoding::Base64 => encode_base64(data),
    }
}

fn decode_base64(data: &[u8]) -> Vec<u8> {
    let filtered = data
        .iter()
        .copied()
        .filter(|&b| {
            b.is_ascii_alphanumeric() || b'+' == b || b'/' == b || b'=' == b
        })
        .collect::<Vec<u8>>();

    // Decode only whole base-64 quanta; a ragged tail is CTE garbage which
    // we discard the same way an incremental decoder would.
    let usable = filtered.len() / 4 * 4;
    let mut out = Vec::with_capacity(usable / 4 * 3);
    let _ = base64::decode_config_buf(
        &filtered[..usable],
        base64::STANDARD,
        &mut out,
    );
    out
}

fn encode_base64(data: &[u8]) -> Vec<u8> {
    let encoded = base64::encode(data);
    let mut out = Vec::with_capacity(encoded.len() + encoded.len() / 38 + 2);
    for (ix, chunk) in encoded.as_bytes().chunks(76).enumerate() {
        if ix != 0 {
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(chunk);
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_tokens() {
        assert_eq!(
            ContentTransferEncoding::SevenBit,
            ContentTransferEncoding::parse("7BIT")
        );
        assert_eq!(
            ContentTransferEncoding::Base64,
            ContentTransferEncoding::parse("Base64")
        );
        assert_eq!(
            ContentTransferEncoding::QuotedPrintable,
            ContentTransferEncoding::parse(" quoted-printable ")
        );
        assert_eq!(
            ContentTransferEncoding::Other,
            ContentTransferEncoding::parse("x-uuencode")
        );
    }

    #[test]
    fn identity_encodings_pass_through() {
        for cte in &[
            ContentTransferEncoding::SevenBit,
            ContentTransferEncoding::EightBit,
            ContentTransferEncoding::Binary,
            ContentTransferEncoding::Other,
        ] {
            assert_eq!(b"foo\xFE" as &[u8], &decode(b"foo\xFE", *cte)[..]);
            assert_eq!(b"foo\xFE" as &[u8], &encode(b"foo\xFE", *cte)[..]);
        }
    }

    #[test]
    fn base64_ignores_line_breaks() {
        let decoded = decode(
            b"V\r\nGh\nhdC\nBpcy\nBub3QgZGVhZA==\r\n",
            ContentTransferEncoding::Base64,
        );
        assert_eq!(b"That is not dead" as &[u8], &decoded[..]);
    }

    #[test]
    fn base64_encode_wraps() {
        let data = vec![0u8; 100];
        let encoded = encode(&data, ContentTransferEncoding::Base64);
        for line in encoded.split(|&b| b'\n' == b) {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            assert!(line.len() <= 76);
        }
        assert_eq!(
            data,
            decode(&encoded, ContentTransferEncoding::Base64).into_owned()
        );
    }

    #[test]
    fn qp_round_trip() {
        let text = b"That is not dead which can eternal lie. \xE6";
        let encoded = encode(text, ContentTransferEncoding::QuotedPrintable);
        assert_eq!(
            text as &[u8],
            &decode(&encoded, ContentTransferEncoding::QuotedPrintable)[..]
        );
    }
}
