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

//! The transport seam between this crate and a mail store.
//!
//! Sessions, authentication, search, flags, and protocol framing all live on
//! the far side of this trait. The decoding layer only ever asks a store for
//! a parsed body-structure tree and for the raw bytes of one part, and hands
//! composed messages back for appending.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::mime::model::{BodyStructureNode, PartAddress};
use crate::support::error::Error;

/// A connected mail store, as seen by the decode/compose core.
///
/// Implementations must be deterministic within a session: fetching the same
/// part address twice yields the same bytes, and re-invoking a fetch is
/// always safe. The fetch-once cache on `DataReference` relies on this.
pub trait MessageStore {
    /// Fetch the parsed body-structure tree for the given message.
    fn fetch_body_structure(
        &self,
        message: u32,
    ) -> Result<BodyStructureNode, Error>;

    /// Fetch the raw (still transfer-encoded) bytes of one part.
    ///
    /// The root address denotes the whole message.
    fn fetch_part_bytes(
        &self,
        message: u32,
        part: &PartAddress,
    ) -> Result<Vec<u8>, Error>;

    /// Append a raw RFC 822 message, unmodified, to the named mailbox.
    fn append_raw_message(
        &self,
        mailbox: &str,
        raw: &[u8],
    ) -> Result<(), Error>;
}

/// A trivial in-memory `MessageStore`.
///
/// Used by this crate's own tests and useful as a fixture for downstream
/// code that wants to exercise decoding without a live session.
#[derive(Debug, Default)]
pub struct MemoryStore {
    structures: HashMap<u32, BodyStructureNode>,
    parts: HashMap<(u32, String), Vec<u8>>,
    appended: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn insert_structure(
        &mut self,
        message: u32,
        structure: BodyStructureNode,
    ) {
        self.structures.insert(message, structure);
    }

    pub fn insert_part(
        &mut self,
        message: u32,
        part: &PartAddress,
        bytes: Vec<u8>,
    ) {
        self.parts.insert((message, part.to_string()), bytes);
    }

    /// The messages appended so far, in order, as (mailbox, bytes) pairs.
    pub fn appended(&self) -> Vec<(String, Vec<u8>)> {
        self.appended
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }
}

impl MessageStore for MemoryStore {
    fn fetch_body_structure(
        &self,
        message: u32,
    ) -> Result<BodyStructureNode, Error> {
        self.structures
            .get(&message)
            .cloned()
            .ok_or_else(|| Error::Store(format!("no such message: {}", message)))
    }

    fn fetch_part_bytes(
        &self,
        message: u32,
        part: &PartAddress,
    ) -> Result<Vec<u8>, Error> {
        self.parts
            .get(&(message, part.to_string()))
            .cloned()
            .ok_or_else(|| {
                Error::Store(format!(
                    "no such part: {} of message {}",
                    part, message
                ))
            })
    }

    fn append_raw_message(
        &self,
        mailbox: &str,
        raw: &[u8],
    ) -> Result<(), Error> {
        self.appended
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .push((mailbox.to_owned(), raw.to_vec()));
        Ok(())
    }
}
