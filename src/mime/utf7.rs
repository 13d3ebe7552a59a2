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

//! UTF-7 in its two mail-relevant flavours.
//!
//! `encoding_rs` deliberately omits UTF-7, so this is the one charset the
//! crate transcodes by hand: the RFC 2152 transfer form (seen as a declared
//! charset in bodies and encoded words) and the RFC 3501 modified form used
//! for mailbox names.

use std::borrow::Cow;
use std::str;

/// A configuration of UTF-7.
#[derive(Clone, Copy, Debug)]
pub struct Utf7 {
    shift_in: u8,
    shift_in_escaped: &'static str,
    base64: base64::Config,
    ch_63: u8,
    indirect: &'static [u8],
}

/// Standard UTF-7, as set by RFC 2152.
pub const TRANSFER: Utf7 = Utf7 {
    shift_in: b'+',
    shift_in_escaped: "+-",
    base64: base64::STANDARD_NO_PAD,
    ch_63: b'/',
    indirect: b"~\\+",
};

/// IMAP's "modified UTF-7", as set by RFC 3501, used for mailbox naming.
pub const MAILBOX: Utf7 = Utf7 {
    shift_in: b'&',
    shift_in_escaped: "&-",
    base64: base64::IMAP_MUTF7,
    ch_63: b',',
    indirect: b"&",
};

impl Utf7 {
    /// Decode the given string from UTF-7.
    ///
    /// Decoding is extremely permissive and never fails. 8-bit and other
    /// non-direct characters are passed through, unnecessary shift sequences
    /// are accepted, and a shift sequence without an explicit shift-out is
    /// terminated by the first non-base-64 character or end of input.
    /// Sequences whose base-64 payload cannot be decoded are passed through
    /// verbatim. Odd trailing bytes of the UTF-16 payload are dropped.
    pub fn decode<'a>(&self, s: &'a str) -> Cow<'a, str> {
        let bytes = s.as_bytes();
        if !bytes.contains(&self.shift_in) {
            return Cow::Borrowed(s);
        }

        let mut out = String::with_capacity(s.len());
        let mut ix = 0;
        while ix < bytes.len() {
            if bytes[ix] != self.shift_in {
                let start = ix;
                while ix < bytes.len() && bytes[ix] != self.shift_in {
                    ix += 1;
                }
                out.push_str(&s[start..ix]);
                continue;
            }

            // Shift sequence: consume the base-64 run after the shift-in.
            ix += 1;
            let start = ix;
            while ix < bytes.len() && self.is_base64_char(bytes[ix]) {
                ix += 1;
            }
            let payload = &bytes[start..ix];
            let explicit_shift_out =
                ix < bytes.len() && b'-' == bytes[ix];

            if payload.is_empty() {
                // "&-" is the escaped shift-in character; a bare shift-in
                // before a non-base-64 character passes through.
                out.push(char::from(self.shift_in));
                if explicit_shift_out {
                    ix += 1;
                }
                continue;
            }

            match base64::decode_config(
                payload,
                self.base64.decode_allow_trailing_bits(true),
            ) {
                Ok(raw) => {
                    let units = raw
                        .chunks_exact(2)
                        .map(|c| u16::from_be_bytes([c[0], c[1]]))
                        .collect::<Vec<u16>>();
                    out.push_str(&String::from_utf16_lossy(&units));
                    if explicit_shift_out {
                        ix += 1;
                    }
                },
                Err(_) => {
                    out.push(char::from(self.shift_in));
                    out.push_str(
                        str::from_utf8(payload)
                            .expect("base-64 subset is ASCII"),
                    );
                    // The shift-out (if any) is copied by the direct loop.
                },
            }
        }

        Cow::Owned(out)
    }

    /// Encode the given string into UTF-7.
    ///
    /// The encoded string is minimal (no unnecessary shift sequences) and
    /// normalised (direct characters are never encoded, the shift-in
    /// character only uses its special escape, and every encoded sequence
    /// carries an explicit shift-out).
    pub fn encode<'a>(&self, s: &'a str) -> Cow<'a, str> {
        if s.bytes().all(|b| self.is_direct(b)) {
            return Cow::Borrowed(s);
        }

        let mut out = String::with_capacity(s.len() + 8);
        let mut pending = String::new();
        for ch in s.chars() {
            if u32::from(self.shift_in) == u32::from(ch) {
                self.flush_pending(&mut out, &mut pending);
                out.push_str(self.shift_in_escaped);
            } else if ch.is_ascii() && self.is_direct(ch as u8) {
                self.flush_pending(&mut out, &mut pending);
                out.push(ch);
            } else {
                pending.push(ch);
            }
        }
        self.flush_pending(&mut out, &mut pending);

        Cow::Owned(out)
    }

    fn flush_pending(&self, out: &mut String, pending: &mut String) {
        if pending.is_empty() {
            return;
        }

        let mut utf16 = Vec::with_capacity(pending.len() * 2);
        for unit in pending.encode_utf16() {
            utf16.extend_from_slice(&unit.to_be_bytes());
        }

        out.push(char::from(self.shift_in));
        out.push_str(&base64::encode_config(&utf16, self.base64));
        out.push('-');
        pending.clear();
    }

    fn is_direct(&self, byte: u8) -> bool {
        byte >= b' ' && byte < 0x7F && !self.indirect.contains(&byte)
    }

    fn is_base64_char(&self, ch: u8) -> bool {
        ch.is_ascii_alphanumeric() || b'+' == ch || self.ch_63 == ch
    }
}
