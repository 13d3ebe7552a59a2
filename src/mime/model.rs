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

//! The typed model of a message's MIME body structure, as delivered by a
//! mail-store transport.

use std::fmt;

use super::transfer::ContentTransferEncoding;

/// The top-level MIME type of a body part.
///
/// Unknown or malformed types are folded into `Other` rather than failing;
/// one unclassifiable part must never abort decoding of the whole message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TopLevelType {
    Text,
    Multipart,
    Message,
    Application,
    Audio,
    Image,
    Video,
    Other,
}

impl TopLevelType {
    pub fn parse(token: &str) -> Self {
        let token = token.trim();
        if token.eq_ignore_ascii_case("text") {
            TopLevelType::Text
        } else if token.eq_ignore_ascii_case("multipart") {
            TopLevelType::Multipart
        } else if token.eq_ignore_ascii_case("message") {
            TopLevelType::Message
        } else if token.eq_ignore_ascii_case("application") {
            TopLevelType::Application
        } else if token.eq_ignore_ascii_case("audio") {
            TopLevelType::Audio
        } else if token.eq_ignore_ascii_case("image") {
            TopLevelType::Image
        } else if token.eq_ignore_ascii_case("video") {
            TopLevelType::Video
        } else {
            TopLevelType::Other
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TopLevelType::Text => "TEXT",
            TopLevelType::Multipart => "MULTIPART",
            TopLevelType::Message => "MESSAGE",
            TopLevelType::Application => "APPLICATION",
            TopLevelType::Audio => "AUDIO",
            TopLevelType::Image => "IMAGE",
            TopLevelType::Video => "VIDEO",
            TopLevelType::Other => "OTHER",
        }
    }
}

/// The address of a part within a body-structure tree: a path of 1-based
/// child indices, rendered dotted ("2.1"). The empty address denotes the
/// whole message.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct PartAddress(Vec<u32>);

impl PartAddress {
    /// The empty address, denoting the whole message.
    pub fn root() -> Self {
        PartAddress(Vec::new())
    }

    pub fn from_indices(indices: Vec<u32>) -> Self {
        PartAddress(indices)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The address of the `index`th (1-based) child of this part.
    pub fn child(&self, index: u32) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        PartAddress(indices)
    }

    pub fn indices(&self) -> &[u32] {
        &self.0
    }
}

impl fmt::Display for PartAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (ix, index) in self.0.iter().enumerate() {
            if ix != 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", index)?;
        }
        Ok(())
    }
}

/// A `Content-Disposition` and its parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Disposition {
    /// The disposition type, e.g. "attachment" or "inline".
    pub disposition: String,
    /// Ordered disposition parameters with case-insensitive names.
    pub parms: Vec<(String, String)>,
}

impl Disposition {
    pub fn new(disposition: impl Into<String>) -> Self {
        Disposition {
            disposition: disposition.into(),
            parms: Vec::new(),
        }
    }

    pub fn is_attachment(&self) -> bool {
        self.disposition.eq_ignore_ascii_case("attachment")
    }

    pub fn parm(&self, name: &str) -> Option<&str> {
        self.parms
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// One node of a parsed body-structure tree.
///
/// The tree is produced by the transport's structure query and is immutable
/// once constructed. A `Multipart` node has at least one child and no
/// directly fetchable content of its own; every other node is a leaf whose
/// content is reachable through its part address.
#[derive(Clone, Debug, Default)]
pub struct BodyStructureNode {
    /// The top-level content type of this part.
    pub content_type: TopLevelType,
    /// The content subtype, e.g. "PLAIN" or "octet-stream".
    pub subtype: String,
    /// Ordered `Content-Type` parameters with case-insensitive names.
    pub parms: Vec<(String, String)>,
    /// The declared transfer encoding of this part's content.
    pub encoding: ContentTransferEncoding,
    /// The size of the content in its encoded form, in octets.
    pub size_octets: u64,
    /// The `Content-Disposition` of this part, if set.
    pub disposition: Option<Disposition>,
    /// The `Content-Id` of this part, if set.
    pub content_id: Option<String>,
    /// The `Content-Description` of this part, if set.
    pub description: Option<String>,
    /// If this is a multipart, the parts it contains.
    pub children: Vec<BodyStructureNode>,
}

impl Default for TopLevelType {
    fn default() -> Self {
        TopLevelType::Text
    }
}

impl BodyStructureNode {
    pub fn is_multipart(&self) -> bool {
        TopLevelType::Multipart == self.content_type
    }

    pub fn is_text(&self) -> bool {
        TopLevelType::Text == self.content_type
    }

    /// Case-insensitive lookup of a `Content-Type` parameter.
    pub fn parm(&self, name: &str) -> Option<&str> {
        self.parms
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The declared charset of this part, if any.
    pub fn charset(&self) -> Option<&str> {
        self.parm("charset")
    }

    /// Whether this is a text leaf of the given subtype with no
    /// attachment-style disposition, i.e. a body-content candidate.
    pub fn is_body_text(&self, subtype: &str) -> bool {
        self.is_text()
            && self.subtype.eq_ignore_ascii_case(subtype)
            && self.content_id.is_none()
            && !self
                .disposition
                .as_ref()
                .map(Disposition::is_attachment)
                .unwrap_or(false)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn top_level_type_parse_is_tolerant() {
        assert_eq!(TopLevelType::Text, TopLevelType::parse("TEXT"));
        assert_eq!(TopLevelType::Text, TopLevelType::parse("text"));
        assert_eq!(
            TopLevelType::Application,
            TopLevelType::parse("Application")
        );
        assert_eq!(TopLevelType::Other, TopLevelType::parse("x-mystery"));
        assert_eq!(TopLevelType::Other, TopLevelType::parse(""));
    }

    #[test]
    fn part_address_display() {
        assert_eq!("", PartAddress::root().to_string());
        assert_eq!("2", PartAddress::root().child(2).to_string());
        assert_eq!(
            "2.1.3",
            PartAddress::from_indices(vec![2, 1, 3]).to_string()
        );
    }

    #[test]
    fn disposition_lookup() {
        let mut disposition = Disposition::new("ATTACHMENT");
        disposition
            .parms
            .push(("FILENAME".to_owned(), "report.pdf".to_owned()));
        assert!(disposition.is_attachment());
        assert_eq!(Some("report.pdf"), disposition.parm("filename"));
        assert_eq!(None, disposition.parm("size"));
    }

    #[test]
    fn body_text_classification() {
        let mut node = BodyStructureNode {
            content_type: TopLevelType::Text,
            subtype: "PLAIN".to_owned(),
            ..BodyStructureNode::default()
        };
        assert!(node.is_body_text("plain"));
        assert!(!node.is_body_text("html"));

        node.disposition = Some(Disposition::new("attachment"));
        assert!(!node.is_body_text("plain"));

        node.disposition = None;
        node.content_id = Some("<cid>".to_owned());
        assert!(!node.is_body_text("plain"));
    }
}
