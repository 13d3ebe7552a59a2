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

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A charset name outside the supported allow-list was given where a
    /// canonical charset is required.
    #[error("Unsupported charset: {0}")]
    UnsupportedCharset(String),
    /// An RFC 2047 encoded word declared a sub-encoding other than Q or B.
    #[error("Malformed encoded word: {0}")]
    MalformedEncodedWord(String),
    /// An operation that requires non-empty input was given nothing to work
    /// with.
    #[error("Empty input: {0}")]
    EmptyInput(&'static str),
    /// No collision-free multipart boundary could be generated for the given
    /// part contents.
    #[error("Multipart boundary collides with part content")]
    BoundaryCollision,
    /// Content was requested from an entity before a data reference was
    /// bound to it.
    #[error("No content has been attached to this entity")]
    DataNotYetAttached,
    /// Failure reported by the mail store transport.
    #[error("Mail store error: {0}")]
    Store(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}
