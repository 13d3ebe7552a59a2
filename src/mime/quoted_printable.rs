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

use std::borrow::Cow;

use memchr::memchr;

/// The RFC 2045 line length limit for quoted-printable output, excluding the
/// line terminator.
const LINE_LIMIT: usize = 76;

/// Decodes quoted-printable encoding, as described by RFC 2045.
///
/// Encoded bytes and soft line endings are both handled, the latter by
/// discarding. UNIX line endings are handled as well as DOS line endings.
///
/// This never fails. Invalid or incomplete `=` sequences are passed through
/// untransformed, including a dangling `=` at end of input. 8-bit characters
/// are passed through, including invalid UTF-8.
pub fn decode(input: &[u8]) -> Cow<[u8]> {
    let first = match memchr(b'=', input) {
        Some(ix) => ix,
        None => return Cow::Borrowed(input),
    };

    let mut out = Vec::with_capacity(input.len());
    out.extend_from_slice(&input[..first]);

    let mut ix = first;
    while ix < input.len() {
        if b'=' != input[ix] {
            let start = ix;
            ix = memchr(b'=', &input[start..])
                .map(|off| start + off)
                .unwrap_or(input.len());
            out.extend_from_slice(&input[start..ix]);
            continue;
        }

        let rest = &input[ix + 1..];
        if rest.starts_with(b"\r\n") {
            // Soft line break with DOS ending, discard
            ix += 3;
        } else if rest.starts_with(b"\n") {
            // Soft line break with UNIX ending, discard
            ix += 2;
        } else if let Some(byte) = rest
            .get(..2)
            .and_then(|pair| std::str::from_utf8(pair).ok())
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
        {
            out.push(byte);
            ix += 3;
        } else {
            // Invalid or incomplete escape, pass the '=' through
            out.push(b'=');
            ix += 1;
        }
    }

    Cow::Owned(out)
}

/// Encodes bytes into quoted-printable form, as described by RFC 2045.
///
/// Hard CRLF line breaks in the input are preserved. Lines are kept within
/// the 76-character limit by inserting soft line breaks. Space and tab are
/// encoded when they would land at the end of a line.
pub fn encode(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len() + input.len() / 8);
    let mut column = 0;

    let mut ix = 0;
    while ix < input.len() {
        let byte = input[ix];

        if b'\r' == byte && input[ix + 1..].starts_with(b"\n") {
            out.extend_from_slice(b"\r\n");
            column = 0;
            ix += 2;
            continue;
        }

        let literal = match byte {
            b'=' => false,
            b' ' | b'\t' => {
                // Encode whitespace that would end a line
                let at_line_end = input
                    .get(ix + 1)
                    .map(|&next| b'\r' == next || b'\n' == next)
                    .unwrap_or(true);
                !at_line_end
            },
            33..=126 => true,
            _ => false,
        };

        let width = if literal { 1 } else { 3 };
        // Leave room for a trailing soft-break '='
        if column + width > LINE_LIMIT - 1 {
            out.extend_from_slice(b"=\r\n");
            column = 0;
        }

        if literal {
            out.push(byte);
        } else {
            out.extend_from_slice(
                format!("={:02X}", byte).as_bytes(),
            );
        }
        column += width;
        ix += 1;
    }

    out
}
