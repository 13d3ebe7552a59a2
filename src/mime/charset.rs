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

//! Charset naming and conversion.
//!
//! Two distinct levels of strictness live here, and the distinction is
//! load-bearing:
//!
//! - `Charset` is the closed set of charsets a mailbox may be *configured*
//!   with. `normalize` matches names exactly (modulo case): "UTF-8" is
//!   accepted, "UTF8" is rejected.
//! - `decode_label` interprets whatever charset label arrives on the wire in
//!   a message, via `encoding_rs`'s label registry, defaulting to US-ASCII.
//!   Message data never fails to decode; configuration does.

use std::borrow::Cow;

use super::utf7;
use crate::support::error::Error;

/// A charset from the supported allow-list.
///
/// The byte-level semantics of the 8-bit members follow the WHATWG encoding
/// registry (so ISO-8859-1 and US-ASCII decode with the windows-1252 table,
/// the same interpretation mail readers apply in practice).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Charset {
    Utf7,
    Utf7Imap,
    Utf8,
    UsAscii,
    Iso8859_1,
    Iso8859_2,
    Iso8859_15,
    Windows1252,
}

impl Charset {
    /// Normalize and validate a charset name.
    ///
    /// Matching is case-insensitive but otherwise exact; no fuzzy aliasing
    /// is performed beyond the "ASCII"/"US-ASCII" pair.
    pub fn normalize(name: &str) -> Result<Self, Error> {
        match name.to_ascii_uppercase().as_str() {
            "UTF-7" => Ok(Charset::Utf7),
            "UTF7-IMAP" => Ok(Charset::Utf7Imap),
            "UTF-8" => Ok(Charset::Utf8),
            "ASCII" | "US-ASCII" => Ok(Charset::UsAscii),
            "ISO-8859-1" => Ok(Charset::Iso8859_1),
            "ISO-8859-2" => Ok(Charset::Iso8859_2),
            "ISO-8859-15" => Ok(Charset::Iso8859_15),
            "WINDOWS-1252" => Ok(Charset::Windows1252),
            _ => Err(Error::UnsupportedCharset(name.to_owned())),
        }
    }

    /// The canonical name of this charset.
    pub fn name(self) -> &'static str {
        match self {
            Charset::Utf7 => "UTF-7",
            Charset::Utf7Imap => "UTF7-IMAP",
            Charset::Utf8 => "UTF-8",
            Charset::UsAscii => "US-ASCII",
            Charset::Iso8859_1 => "ISO-8859-1",
            Charset::Iso8859_2 => "ISO-8859-2",
            Charset::Iso8859_15 => "ISO-8859-15",
            Charset::Windows1252 => "WINDOWS-1252",
        }
    }

    fn encoding(self) -> Option<&'static encoding_rs::Encoding> {
        match self {
            Charset::Utf7 | Charset::Utf7Imap => None,
            Charset::Utf8 => Some(encoding_rs::UTF_8),
            Charset::UsAscii
            | Charset::Iso8859_1
            | Charset::Windows1252 => Some(encoding_rs::WINDOWS_1252),
            Charset::Iso8859_2 => Some(encoding_rs::ISO_8859_2),
            Charset::Iso8859_15 => Some(encoding_rs::ISO_8859_15),
        }
    }

    /// Decode bytes in this charset into Unicode text.
    ///
    /// Never fails; undecodable sequences are replaced.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Charset::Utf7 => utf7::TRANSFER
                .decode(&String::from_utf8_lossy(bytes))
                .into_owned(),
            Charset::Utf7Imap => utf7::MAILBOX
                .decode(&String::from_utf8_lossy(bytes))
                .into_owned(),
            _ => {
                let encoding =
                    self.encoding().expect("non-UTF-7 charset has encoding");
                encoding.decode_with_bom_removal(bytes).0.into_owned()
            },
        }
    }

    /// Encode Unicode text into this charset.
    ///
    /// Characters unrepresentable in the target charset are emitted as
    /// numeric character references, per `encoding_rs` convention.
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Charset::Utf7 => {
                utf7::TRANSFER.encode(text).into_owned().into_bytes()
            },
            Charset::Utf7Imap => {
                utf7::MAILBOX.encode(text).into_owned().into_bytes()
            },
            _ => {
                let encoding =
                    self.encoding().expect("non-UTF-7 charset has encoding");
                encoding.encode(text).0.into_owned()
            },
        }
    }
}

/// Encode Unicode text into the modified UTF-7 form used for mailbox names.
pub fn to_utf7_imap(text: &str) -> String {
    utf7::MAILBOX.encode(text).into_owned()
}

/// Decode a mailbox name from modified UTF-7 into Unicode text.
pub fn from_utf7_imap(name: &str) -> String {
    utf7::MAILBOX.decode(name).into_owned()
}

/// Decode message bytes declared to be in the charset named by `label`.
///
/// This is the permissive, wire-facing counterpart of `Charset::decode`:
/// the label is looked up in the `encoding_rs` registry (with UTF-7 handled
/// separately, since `encoding_rs` omits it), and a missing or unknown label
/// falls back to US-ASCII semantics rather than failing.
pub fn decode_label<'a>(label: Option<&str>, bytes: &'a [u8]) -> Cow<'a, str> {
    if let Some(label) = label {
        if label.eq_ignore_ascii_case("utf-7") {
            let text = String::from_utf8_lossy(bytes);
            return Cow::Owned(utf7::TRANSFER.decode(&text).into_owned());
        }

        match encoding_rs::Encoding::for_label_no_replacement(
            label.as_bytes(),
        ) {
            Some(encoding) => {
                return encoding.decode_with_bom_removal(bytes).0;
            },
            None => {
                log::warn!(
                    "unknown charset label {:?}, falling back to US-ASCII",
                    label
                );
            },
        }
    }

    encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes).0
}
