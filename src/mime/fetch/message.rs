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

//! Walking a body-structure tree into a decoded, attachment-aware message.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::dataref::DataReference;
use crate::mime::charset::Charset;
use crate::mime::datetime;
use crate::mime::encoded_word;
use crate::mime::model::{BodyStructureNode, PartAddress, TopLevelType};
use crate::store::MessageStore;
use crate::support::error::Error;

/// The raw envelope header values of a message, as returned by the store's
/// envelope query. Values are undecoded: encoded words and loose date
/// formats are interpreted by the decoder, not the transport.
#[derive(Clone, Debug, Default)]
pub struct RawEnvelope {
    pub subject: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub date: Option<String>,
}

/// One attachment (or inline part) collected from a message.
///
/// Content is not fetched eagerly; it resolves through the bound
/// `DataReference` on first request.
#[derive(Debug)]
pub struct Attachment {
    /// The part address of this attachment, rendered dotted.
    pub id: String,
    /// The `Content-Id`, used to correlate inline images with body HTML.
    pub content_id: Option<String>,
    /// The file name, from the disposition's `filename` parameter or the
    /// `Content-Type` `name` parameter.
    pub name: Option<String>,
    /// The disposition type, if one was declared.
    pub disposition: Option<String>,
    /// The declared charset label, if any.
    pub charset: Option<String>,
    /// Whether this attachment is itself an encapsulated message.
    pub is_encapsulated_message: bool,
    data: Option<DataReference>,
    file_path: Option<PathBuf>,
}

impl Attachment {
    /// The decoded content of this attachment.
    ///
    /// Fails with `Error::DataNotYetAttached` if no data reference has been
    /// bound, e.g. on a hand-constructed attachment.
    pub fn content(
        &self,
        store: &dyn MessageStore,
        server_charset: Charset,
    ) -> Result<Arc<[u8]>, Error> {
        self.data
            .as_ref()
            .ok_or(Error::DataNotYetAttached)?
            .fetch(store, server_charset)
    }

    pub fn data_reference(&self) -> Option<&DataReference> {
        self.data.as_ref()
    }

    /// Record where this attachment's bytes were persisted.
    ///
    /// Persistence itself is the caller's concern; the attachment merely
    /// remembers the location.
    pub fn set_file_path(&mut self, path: impl Into<PathBuf>) {
        self.file_path = Some(path.into());
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn is_file_path_set(&self) -> bool {
        self.file_path.is_some()
    }
}

/// A fully decoded message, owned by the caller.
#[derive(Debug, Default)]
pub struct DecodedMessage {
    pub subject: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    /// The original `Date` header value.
    pub date: Option<String>,
    /// The normalised date: ISO 8601 when the header parsed, the original
    /// value verbatim when it did not.
    pub normalized_date: Option<String>,
    pub text_body: Option<String>,
    pub html_body: Option<String>,
    pub attachments: Vec<Attachment>,
    pub has_attachments: bool,
}

/// Whether this leaf classifies as an attachment (or inline part) rather
/// than body content.
fn is_attachment_leaf(node: &BodyStructureNode) -> bool {
    debug_assert!(!node.is_multipart());
    !node.is_body_text("PLAIN") && !node.is_body_text("HTML")
}

/// Whether the message rooted at `node` contains at least one attachment or
/// inline part. Purely structural; nothing is fetched.
pub fn has_attachments(node: &BodyStructureNode) -> bool {
    if node.is_multipart() {
        node.children.iter().any(has_attachments)
    } else {
        is_attachment_leaf(node)
    }
}

/// Translates body-structure trees into `DecodedMessage`s.
pub struct MessageDecoder<'a> {
    store: &'a dyn MessageStore,
    server_charset: Charset,
}

struct WalkState {
    text_body: Option<String>,
    html_body: Option<String>,
    attachments: Vec<Attachment>,
}

impl<'a> MessageDecoder<'a> {
    pub fn new(store: &'a dyn MessageStore, server_charset: Charset) -> Self {
        MessageDecoder {
            store,
            server_charset,
        }
    }

    /// Fetch the body structure of `message` and decode it.
    pub fn decode(
        &self,
        message: u32,
        envelope: &RawEnvelope,
    ) -> Result<DecodedMessage, Error> {
        let tree = self.store.fetch_body_structure(message)?;
        self.decode_tree(message, envelope, &tree)
    }

    /// Decode a message from an already-fetched body-structure tree.
    ///
    /// Traversal is pre-order: the first TEXT/PLAIN and first TEXT/HTML
    /// body-content leaves win, and later ones (e.g. in nested alternative
    /// branches) do not overwrite them. All attachment and inline leaves are
    /// collected regardless of multipart subtype.
    pub fn decode_tree(
        &self,
        message: u32,
        envelope: &RawEnvelope,
        tree: &BodyStructureNode,
    ) -> Result<DecodedMessage, Error> {
        let mut state = WalkState {
            text_body: None,
            html_body: None,
            attachments: Vec::new(),
        };

        if tree.is_multipart() {
            self.visit_children(message, tree, &PartAddress::root(), &mut state)?;
        } else {
            self.visit_leaf(
                message,
                tree,
                PartAddress::root().child(1),
                &mut state,
            )?;
        }

        let (date, normalized_date) = match envelope.date.as_deref() {
            Some(raw) if !raw.is_empty() => (
                Some(raw.to_owned()),
                Some(datetime::parse(raw)?.to_iso8601()),
            ),
            _ => (None, None),
        };

        let has_attachments = !state.attachments.is_empty();
        Ok(DecodedMessage {
            subject: self
                .decode_header_value(envelope.subject.as_deref())?
                .unwrap_or_default(),
            from: self.decode_header_value(envelope.from.as_deref())?,
            to: self.decode_header_value(envelope.to.as_deref())?,
            cc: self.decode_header_value(envelope.cc.as_deref())?,
            bcc: self.decode_header_value(envelope.bcc.as_deref())?,
            date,
            normalized_date,
            text_body: state.text_body,
            html_body: state.html_body,
            attachments: state.attachments,
            has_attachments,
        })
    }

    fn decode_header_value(
        &self,
        raw: Option<&str>,
    ) -> Result<Option<String>, Error> {
        match raw {
            Some(value) if !value.trim().is_empty() => Ok(Some(
                encoded_word::decode_header(value, self.server_charset.name())?,
            )),
            _ => Ok(None),
        }
    }

    fn visit_children(
        &self,
        message: u32,
        node: &BodyStructureNode,
        address: &PartAddress,
        state: &mut WalkState,
    ) -> Result<(), Error> {
        for (ix, child) in node.children.iter().enumerate() {
            let child_address = address.child(ix as u32 + 1);
            if child.is_multipart() {
                self.visit_children(message, child, &child_address, state)?;
            } else {
                self.visit_leaf(message, child, child_address, state)?;
            }
        }
        Ok(())
    }

    fn visit_leaf(
        &self,
        message: u32,
        node: &BodyStructureNode,
        address: PartAddress,
        state: &mut WalkState,
    ) -> Result<(), Error> {
        if !is_attachment_leaf(node) {
            let slot = if node.is_body_text("PLAIN") {
                &mut state.text_body
            } else {
                &mut state.html_body
            };
            if slot.is_none() {
                *slot = Some(self.fetch_body_text(message, node, address)?);
            }
            // A later body-text leaf of an already-filled kind is an
            // unselected alternative; drop it.
            return Ok(());
        }

        let disposition = node.disposition.as_ref();
        state.attachments.push(Attachment {
            id: address.to_string(),
            content_id: node.content_id.clone(),
            name: disposition
                .and_then(|d| d.parm("filename"))
                .or_else(|| node.parm("name"))
                .map(str::to_owned),
            disposition: disposition.map(|d| d.disposition.clone()),
            charset: node.charset().map(str::to_owned),
            is_encapsulated_message: TopLevelType::Message
                == node.content_type,
            data: Some(DataReference::new(
                message,
                address,
                node.encoding,
                node.charset().map(str::to_owned),
                node.is_text(),
            )),
            file_path: None,
        });
        Ok(())
    }

    fn fetch_body_text(
        &self,
        message: u32,
        node: &BodyStructureNode,
        address: PartAddress,
    ) -> Result<String, Error> {
        let data_ref = DataReference::new(
            message,
            address,
            node.encoding,
            node.charset().map(str::to_owned),
            true,
        );
        let bytes = data_ref.fetch(self.store, self.server_charset)?;
        Ok(self.server_charset.decode(&bytes))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mime::model::Disposition;
    use crate::mime::transfer::ContentTransferEncoding;
    use crate::store::MemoryStore;

    fn text_leaf(subtype: &str, charset: &str) -> BodyStructureNode {
        BodyStructureNode {
            content_type: TopLevelType::Text,
            subtype: subtype.to_owned(),
            parms: vec![("CHARSET".to_owned(), charset.to_owned())],
            ..BodyStructureNode::default()
        }
    }

    fn multipart(subtype: &str, children: Vec<BodyStructureNode>) -> BodyStructureNode {
        BodyStructureNode {
            content_type: TopLevelType::Multipart,
            subtype: subtype.to_owned(),
            children,
            ..BodyStructureNode::default()
        }
    }

    fn decoder(store: &MemoryStore) -> MessageDecoder {
        MessageDecoder::new(store, Charset::Utf8)
    }

    #[test]
    fn single_part_text_message() {
        let mut store = MemoryStore::new();
        store.insert_structure(1, text_leaf("PLAIN", "US-ASCII"));
        store.insert_part(
            1,
            &PartAddress::from_indices(vec![1]),
            b"hello there".to_vec(),
        );

        let envelope = RawEnvelope {
            subject: Some("=?ISO-8859-1?Q?Andr=E9?=".to_owned()),
            date: Some("Sun, 14 Aug 2005 16:13:03 +0000".to_owned()),
            ..RawEnvelope::default()
        };
        let message = decoder(&store).decode(1, &envelope).unwrap();

        assert_eq!("André", message.subject);
        assert_eq!(Some("hello there".to_owned()), message.text_body);
        assert_eq!(None, message.html_body);
        assert!(!message.has_attachments);
        assert!(message.attachments.is_empty());
        assert_eq!(
            Some("2005-08-14T16:13:03+00:00".to_owned()),
            message.normalized_date
        );
        assert_eq!(
            Some("Sun, 14 Aug 2005 16:13:03 +0000".to_owned()),
            message.date
        );
    }

    #[test]
    fn unparseable_date_is_passed_through() {
        let mut store = MemoryStore::new();
        store.insert_structure(1, text_leaf("PLAIN", "US-ASCII"));
        store.insert_part(
            1,
            &PartAddress::from_indices(vec![1]),
            b"x".to_vec(),
        );

        let envelope = RawEnvelope {
            date: Some("Sun, 14 Aug 2005 16:13:03 +9000".to_owned()),
            ..RawEnvelope::default()
        };
        let message = decoder(&store).decode(1, &envelope).unwrap();
        assert_eq!(
            Some("Sun, 14 Aug 2005 16:13:03 +9000".to_owned()),
            message.normalized_date
        );
    }

    #[test]
    fn mixed_message_with_attachment() {
        let attachment = BodyStructureNode {
            content_type: TopLevelType::Application,
            subtype: "octet-stream".to_owned(),
            parms: vec![("NAME".to_owned(), "data.bin".to_owned())],
            encoding: ContentTransferEncoding::Base64,
            disposition: Some(Disposition {
                disposition: "attachment".to_owned(),
                parms: vec![(
                    "FILENAME".to_owned(),
                    "data.bin".to_owned(),
                )],
            }),
            ..BodyStructureNode::default()
        };
        let tree = multipart(
            "MIXED",
            vec![text_leaf("PLAIN", "ISO-8859-1"), attachment],
        );

        let mut store = MemoryStore::new();
        store.insert_structure(7, tree);
        store.insert_part(
            7,
            &PartAddress::from_indices(vec![1]),
            b"strange \xE6ons".to_vec(),
        );
        store.insert_part(
            7,
            &PartAddress::from_indices(vec![2]),
            base64::encode(b"\x00\x01\x02\x03").into_bytes(),
        );

        let message = decoder(&store)
            .decode(7, &RawEnvelope::default())
            .unwrap();

        assert_eq!(Some("strange æons".to_owned()), message.text_body);
        assert!(message.has_attachments);
        assert_eq!(1, message.attachments.len());

        let attachment = &message.attachments[0];
        assert_eq!("2", attachment.id);
        assert_eq!(Some("data.bin"), attachment.name.as_deref());
        assert_eq!(Some("attachment"), attachment.disposition.as_deref());
        assert!(!attachment.is_encapsulated_message);

        let content = attachment.content(&store, Charset::Utf8).unwrap();
        assert_eq!(b"\x00\x01\x02\x03" as &[u8], &content[..]);
    }

    #[test]
    fn first_text_leaf_wins_across_alternatives() {
        let tree = multipart(
            "MIXED",
            vec![multipart(
                "ALTERNATIVE",
                vec![
                    text_leaf("PLAIN", "US-ASCII"),
                    multipart(
                        "ALTERNATIVE",
                        vec![
                            text_leaf("PLAIN", "US-ASCII"),
                            text_leaf("HTML", "US-ASCII"),
                        ],
                    ),
                ],
            )],
        );

        let mut store = MemoryStore::new();
        store.insert_structure(3, tree);
        store.insert_part(
            3,
            &PartAddress::from_indices(vec![1, 1]),
            b"first plain".to_vec(),
        );
        store.insert_part(
            3,
            &PartAddress::from_indices(vec![1, 2, 1]),
            b"second plain".to_vec(),
        );
        store.insert_part(
            3,
            &PartAddress::from_indices(vec![1, 2, 2]),
            b"<p>html</p>".to_vec(),
        );

        let message = decoder(&store)
            .decode(3, &RawEnvelope::default())
            .unwrap();
        assert_eq!(Some("first plain".to_owned()), message.text_body);
        assert_eq!(Some("<p>html</p>".to_owned()), message.html_body);
        assert!(!message.has_attachments);
    }

    #[test]
    fn inline_image_is_collected_as_attachment() {
        let image = BodyStructureNode {
            content_type: TopLevelType::Image,
            subtype: "png".to_owned(),
            content_id: Some("<img1@example>".to_owned()),
            ..BodyStructureNode::default()
        };
        let tree = multipart(
            "RELATED",
            vec![text_leaf("HTML", "US-ASCII"), image],
        );

        let mut store = MemoryStore::new();
        store.insert_structure(4, tree);
        store.insert_part(
            4,
            &PartAddress::from_indices(vec![1]),
            b"<img src=\"cid:img1@example\">".to_vec(),
        );
        store.insert_part(
            4,
            &PartAddress::from_indices(vec![2]),
            b"PNGBYTES".to_vec(),
        );

        let message = decoder(&store)
            .decode(4, &RawEnvelope::default())
            .unwrap();
        assert!(message.has_attachments);
        assert_eq!(
            Some("<img1@example>"),
            message.attachments[0].content_id.as_deref()
        );
    }

    #[test]
    fn encapsulated_message_sets_eml_origin() {
        let eml = BodyStructureNode {
            content_type: TopLevelType::Message,
            subtype: "RFC822".to_owned(),
            ..BodyStructureNode::default()
        };
        let tree = multipart(
            "MIXED",
            vec![text_leaf("PLAIN", "US-ASCII"), eml],
        );

        let mut store = MemoryStore::new();
        store.insert_structure(5, tree);
        store.insert_part(
            5,
            &PartAddress::from_indices(vec![1]),
            b"see attached".to_vec(),
        );

        let message = decoder(&store)
            .decode(5, &RawEnvelope::default())
            .unwrap();
        assert!(message.attachments[0].is_encapsulated_message);
    }

    #[test]
    fn unknown_top_level_type_degrades_to_attachment() {
        let strange = BodyStructureNode {
            content_type: TopLevelType::parse("x-chemical"),
            subtype: "x-pdb".to_owned(),
            ..BodyStructureNode::default()
        };
        let tree = multipart(
            "MIXED",
            vec![text_leaf("PLAIN", "US-ASCII"), strange],
        );

        let mut store = MemoryStore::new();
        store.insert_structure(6, tree);
        store.insert_part(
            6,
            &PartAddress::from_indices(vec![1]),
            b"body".to_vec(),
        );

        let message = decoder(&store)
            .decode(6, &RawEnvelope::default())
            .unwrap();
        assert_eq!(1, message.attachments.len());
        assert!(message.has_attachments);
    }

    #[test]
    fn structural_attachment_detection() {
        assert!(!has_attachments(&text_leaf("PLAIN", "US-ASCII")));
        assert!(!has_attachments(&multipart(
            "ALTERNATIVE",
            vec![
                text_leaf("PLAIN", "US-ASCII"),
                text_leaf("HTML", "US-ASCII"),
            ],
        )));

        let attachment = BodyStructureNode {
            content_type: TopLevelType::Application,
            subtype: "pdf".to_owned(),
            ..BodyStructureNode::default()
        };
        assert!(has_attachments(&attachment));
        assert!(has_attachments(&multipart(
            "MIXED",
            vec![text_leaf("PLAIN", "US-ASCII"), attachment],
        )));

        let disposed = BodyStructureNode {
            content_type: TopLevelType::Text,
            subtype: "PLAIN".to_owned(),
            disposition: Some(Disposition::new("attachment")),
            ..BodyStructureNode::default()
        };
        assert!(has_attachments(&disposed));
    }

    #[test]
    fn file_path_accessors() {
        let mut attachment = Attachment {
            id: "2".to_owned(),
            content_id: None,
            name: None,
            disposition: None,
            charset: None,
            is_encapsulated_message: false,
            data: None,
            file_path: None,
        };
        assert!(!attachment.is_file_path_set());
        assert_eq!(None, attachment.file_path());

        attachment.set_file_path("/tmp/data.bin");
        assert!(attachment.is_file_path_set());
        assert_eq!(
            Some(Path::new("/tmp/data.bin")),
            attachment.file_path()
        );
    }

    #[test]
    fn content_before_binding_is_an_error() {
        let attachment = Attachment {
            id: "2".to_owned(),
            content_id: None,
            name: None,
            disposition: None,
            charset: None,
            is_encapsulated_message: false,
            data: None,
            file_path: None,
        };
        let store = MemoryStore::new();
        assert!(matches!(
            attachment.content(&store, Charset::Utf8),
            Err(Error::DataNotYetAttached)
        ));
    }
}
