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

//! Composition of RFC 822 messages from an envelope and ordered body parts.

use std::borrow::Cow;
use std::path::PathBuf;

use rand::Rng;

use super::model::TopLevelType;
use super::transfer::{self, ContentTransferEncoding};
use crate::support::error::Error;

/// The longest header line emitted before folding, per RFC 2822's "SHOULD"
/// limit.
const MAX_HEADER_LINE: usize = 78;

const BOUNDARY_ATTEMPTS: usize = 16;

/// The envelope of a message under composition: an ordered list of headers,
/// with at minimum a Subject.
#[derive(Clone, Debug)]
pub struct Envelope {
    headers: Vec<(String, String)>,
}

impl Envelope {
    pub fn new(subject: impl Into<String>) -> Self {
        Envelope {
            headers: vec![("Subject".to_owned(), subject.into())],
        }
    }

    /// Append a further header, preserving insertion order.
    pub fn add(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

/// The content source of a body part under composition.
#[derive(Clone, Debug)]
pub enum PartContent {
    /// Literal bytes supplied inline.
    Inline(Vec<u8>),
    /// Bytes read from a file at composition time.
    File(PathBuf),
}

/// A `Content-Disposition` for a part under composition.
#[derive(Clone, Debug)]
pub struct PartDisposition {
    /// The disposition type, e.g. "attachment" or "inline".
    pub disposition: String,
    pub filename: Option<String>,
}

/// One body part of a message under composition.
///
/// Transient: constructed by the caller per composition and discarded after
/// serialisation.
#[derive(Clone, Debug)]
pub struct BodyPartSpec {
    pub content_type: TopLevelType,
    pub subtype: String,
    /// The transfer encoding to apply to the content. When absent, content
    /// is emitted verbatim and no `Content-Transfer-Encoding` header is
    /// written.
    pub encoding: Option<ContentTransferEncoding>,
    /// The charset parameter. TEXT parts default to US-ASCII when this is
    /// absent.
    pub charset: Option<String>,
    pub description: Option<String>,
    pub disposition: Option<PartDisposition>,
    /// Further ordered `Content-Type` parameters, e.g. `name=`.
    pub parms: Vec<(String, String)>,
    pub content: PartContent,
}

impl BodyPartSpec {
    /// A TEXT/PLAIN part with inline content.
    pub fn plain_text(text: impl Into<String>) -> Self {
        BodyPartSpec {
            content_type: TopLevelType::Text,
            subtype: "PLAIN".to_owned(),
            encoding: None,
            charset: None,
            description: None,
            disposition: None,
            parms: Vec::new(),
            content: PartContent::Inline(text.into().into_bytes()),
        }
    }

    /// A base64-encoded APPLICATION attachment with the given file name.
    pub fn attachment(
        subtype: impl Into<String>,
        name: impl Into<String>,
        content: PartContent,
    ) -> Self {
        let name = name.into();
        BodyPartSpec {
            content_type: TopLevelType::Application,
            subtype: subtype.into(),
            encoding: Some(ContentTransferEncoding::Base64),
            charset: None,
            description: None,
            disposition: Some(PartDisposition {
                disposition: "attachment".to_owned(),
                filename: Some(name.clone()),
            }),
            parms: vec![("name".to_owned(), name)],
            content,
        }
    }
}

/// Serialise an envelope and ordered body parts into a single RFC 822
/// message, CRLF line endings throughout.
///
/// One part yields a plain single-part message. Several parts yield a
/// `multipart/mixed` message whose boundary token is guaranteed not to occur
/// inside any part's encoded content. Zero parts is a caller error.
pub fn compose(
    envelope: &Envelope,
    parts: &[BodyPartSpec],
) -> Result<Vec<u8>, Error> {
    if parts.is_empty() {
        return Err(Error::EmptyInput("body parts"));
    }

    let mut out = Vec::new();
    for (name, value) in envelope.headers() {
        write_header(&mut out, name, value);
    }
    write_header(&mut out, "MIME-Version", "1.0");

    if let [part] = parts {
        write_part_headers(&mut out, part);
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&encode_part_content(part)?);
        out.extend_from_slice(b"\r\n");
    } else {
        let contents = parts
            .iter()
            .map(encode_part_content)
            .collect::<Result<Vec<_>, Error>>()?;
        let boundary = generate_boundary(&contents)?;

        write_header(
            &mut out,
            "Content-Type",
            &format!("multipart/mixed; boundary=\"{}\"", boundary),
        );
        out.extend_from_slice(b"\r\n");

        for (part, content) in parts.iter().zip(&contents) {
            out.extend_from_slice(b"--");
            out.extend_from_slice(boundary.as_bytes());
            out.extend_from_slice(b"\r\n");
            write_part_headers(&mut out, part);
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(content);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"--");
        out.extend_from_slice(boundary.as_bytes());
        out.extend_from_slice(b"--\r\n");
    }

    Ok(out)
}

/// The fixed part-header order: Content-Type, Content-Transfer-Encoding,
/// Content-Description, Content-Disposition, absent fields omitted.
fn write_part_headers(out: &mut Vec<u8>, part: &BodyPartSpec) {
    write_header(out, "Content-Type", &content_type_value(part));

    if let Some(encoding) = part.encoding {
        write_header(out, "Content-Transfer-Encoding", encoding.name());
    }
    if let Some(ref description) = part.description {
        write_header(out, "Content-Description", description);
    }
    if let Some(ref disposition) = part.disposition {
        let mut value = disposition.disposition.clone();
        if let Some(ref filename) = disposition.filename {
            value.push_str("; filename=");
            value.push_str(&parm_quote(filename));
        }
        write_header(out, "Content-Disposition", &value);
    }
}

fn content_type_value(part: &BodyPartSpec) -> String {
    let mut value =
        format!("{}/{}", part.content_type.name(), part.subtype);

    if TopLevelType::Text == part.content_type || part.charset.is_some() {
        value.push_str("; CHARSET=");
        value.push_str(&parm_quote(
            part.charset.as_deref().unwrap_or("US-ASCII"),
        ));
    }
    for (name, parm_value) in &part.parms {
        value.push_str("; ");
        value.push_str(name);
        value.push('=');
        value.push_str(&parm_quote(parm_value));
    }

    value
}

/// Quote a parameter value only when it needs it. Values without spaces or
/// semicolons — including file names beginning or ending with a dot — are
/// emitted verbatim.
fn parm_quote(value: &str) -> Cow<str> {
    if value.contains(' ') || value.contains(';') {
        Cow::Owned(format!("\"{}\"", value))
    } else {
        Cow::Borrowed(value)
    }
}

fn encode_part_content(part: &BodyPartSpec) -> Result<Vec<u8>, Error> {
    let raw = match part.content {
        PartContent::Inline(ref bytes) => Cow::Borrowed(&bytes[..]),
        PartContent::File(ref path) => Cow::Owned(std::fs::read(path)?),
    };
    Ok(transfer::encode(
        &raw,
        part.encoding.unwrap_or_default(),
    ))
}

/// Emit one header with CRLF termination, RFC 2047-encoding non-ASCII
/// values and folding lines longer than the RFC 2822 soft limit.
fn write_header(out: &mut Vec<u8>, name: &str, value: &str) {
    let value: Cow<str> = if value.is_ascii() {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(format!("=?UTF-8?B?{}?=", base64::encode(value)))
    };

    let line = format!("{}: {}", name, value);
    if line.len() <= MAX_HEADER_LINE {
        out.extend_from_slice(line.as_bytes());
        out.extend_from_slice(b"\r\n");
        return;
    }

    let mut current = String::with_capacity(MAX_HEADER_LINE);
    for word in line.split(' ') {
        if current.is_empty() {
            current.push_str(word);
        } else if current.len() + 1 + word.len() <= MAX_HEADER_LINE {
            current.push(' ');
            current.push_str(word);
        } else {
            out.extend_from_slice(current.as_bytes());
            out.extend_from_slice(b"\r\n");
            current.clear();
            // Continuation lines carry exactly one leading space
            current.push(' ');
            current.push_str(word);
        }
    }
    out.extend_from_slice(current.as_bytes());
    out.extend_from_slice(b"\r\n");
}

/// Generate a multipart boundary token that does not occur inside any
/// part's encoded content, regenerating on collision rather than silently
/// proceeding.
fn generate_boundary(contents: &[Vec<u8>]) -> Result<String, Error> {
    let mut rng = rand::thread_rng();
    for attempt in 0..BOUNDARY_ATTEMPTS {
        let mut token = String::with_capacity(26);
        token.push_str("=_");
        for _ in 0..24 {
            token.push(rng.sample(rand::distributions::Alphanumeric));
        }

        let collides = contents.iter().any(|content| {
            memchr::memmem::find(content, token.as_bytes()).is_some()
        });
        if collides {
            log::debug!(
                "boundary candidate collided with part content \
                 (attempt {}), regenerating",
                attempt + 1
            );
            continue;
        }
        return Ok(token);
    }
    Err(Error::BoundaryCollision)
}
