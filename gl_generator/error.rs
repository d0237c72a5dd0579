////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2020 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

use std::{io, path::PathBuf};

use thiserror::Error;

/// Everything that aborts a generation run.
///
/// None of these are recoverable: output produced before the error must not be trusted.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{count} extension(s) flagged for renaming into core, but no header symbol metadata is available")]
    RenameWithoutSymbolMetadata { count: usize },

    #[error("rename collision: `{first}` and `{second}` both end up named `{target}`")]
    RenameCollision { target: String, first: String, second: String },

    #[error("`{function}` is flagged as a buffer object function, but none of its arguments is a memory buffer")]
    NoBufferObjectArgument { function: String },

    #[error("a binding references `{function}`, which is not part of the emitted symbol set")]
    DanglingBinding { function: String },

    #[error("no extension metadata available to annotate `{symbol}`")]
    MissingSymbolMetadata { symbol: String },

    #[error("unknown native type `{ty}` used by `{symbol}`")]
    UnknownNativeType { symbol: String, ty: String },

    #[error("malformed symbol table: {0}")]
    SymbolTable(String),

    #[error("failed to parse registry XML: {0}")]
    Xml(#[from] xml::reader::Error),

    #[error("failed to parse configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
