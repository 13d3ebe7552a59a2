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

use std::sync::{Arc, Mutex, MutexGuard};

use crate::mime::charset::{self, Charset};
use crate::mime::model::PartAddress;
use crate::mime::transfer::{self, ContentTransferEncoding};
use crate::store::MessageStore;
use crate::support::error::Error;

/// A lazily-resolved reference to the decoded content of one message part.
///
/// The reference owns its part address and the declarations needed to decode
/// the content: the transfer encoding, and (for text parts) the declared
/// charset label. Resolution goes through the store exactly once; the result
/// is cached in a single-write cell and every later call returns the cached
/// bytes. The cache is exclusive to this reference; two references to the
/// same part address each fetch independently.
#[derive(Debug)]
pub struct DataReference {
    message: u32,
    part: PartAddress,
    encoding: ContentTransferEncoding,
    charset: Option<String>,
    is_text: bool,
    // Locked across the fetch so concurrent callers cannot race a second
    // transport round-trip.
    cache: Mutex<Option<Arc<[u8]>>>,
}

impl DataReference {
    pub fn new(
        message: u32,
        part: PartAddress,
        encoding: ContentTransferEncoding,
        charset: Option<String>,
        is_text: bool,
    ) -> Self {
        DataReference {
            message,
            part,
            encoding,
            charset,
            is_text,
            cache: Mutex::new(None),
        }
    }

    pub fn part(&self) -> &PartAddress {
        &self.part
    }

    pub fn encoding(&self) -> ContentTransferEncoding {
        self.encoding
    }

    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    /// Whether the content has already been fetched and cached.
    pub fn is_fetched(&self) -> bool {
        self.lock_cache().is_some()
    }

    /// Resolve this reference to its decoded content.
    ///
    /// Raw bytes are fetched through `store`, transfer-decoded, and — for
    /// text parts only — converted from the declared charset (US-ASCII when
    /// none was declared) into `server_charset`. The first successful call
    /// caches; later calls return the cached bytes without touching the
    /// store.
    pub fn fetch(
        &self,
        store: &dyn MessageStore,
        server_charset: Charset,
    ) -> Result<Arc<[u8]>, Error> {
        let mut cache = self.lock_cache();
        if let Some(ref data) = *cache {
            return Ok(Arc::clone(data));
        }

        let raw = store.fetch_part_bytes(self.message, &self.part)?;
        let decoded = transfer::decode(&raw, self.encoding);

        let data: Arc<[u8]> = if self.is_text {
            let text = charset::decode_label(self.charset(), &decoded);
            Arc::from(server_charset.encode(&text))
        } else {
            Arc::from(decoded.into_owned())
        };

        *cache = Some(Arc::clone(&data));
        Ok(data)
    }

    fn lock_cache(&self) -> MutexGuard<Option<Arc<[u8]>>> {
        self.cache
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}
