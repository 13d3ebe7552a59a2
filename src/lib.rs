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

//! Mimetree turns the body-structure trees a mail store hands out into
//! decoded, attachment-aware messages, and composes RFC 822 messages for the
//! trip back.
//!
//! The store itself is behind the [`store::MessageStore`] trait; this crate
//! never speaks a wire protocol. Decoding starts at
//! [`mime::fetch::message::MessageDecoder`], composition at
//! [`mime::compose::compose`].

pub mod mime;
pub mod store;
pub mod support;

pub use crate::mime::charset::Charset;
pub use crate::mime::compose::{compose, BodyPartSpec, Envelope, PartContent};
pub use crate::mime::fetch::message::{
    Attachment, DecodedMessage, MessageDecoder, RawEnvelope,
};
pub use crate::mime::model::{BodyStructureNode, PartAddress};
pub use crate::store::{MemoryStore, MessageStore};
pub use crate::support::error::Error;
