////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2019 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

//! Runtime support for bindings produced by `glbind_generator`.
//!
//! Generated bindings expose one canonical name per capability, while the entry point that the
//! driver actually provides may carry an `ARB`/vendor suffix. This crate holds the naming
//! convention shared by the generator and the bindings, and the [`ProcAddressTable`] that answers
//! "what is the native address of this function" for any suffix spelling of a known name.
//!
//! ```
//! use glbind_runtime::ProcAddressTable;
//!
//! let table: ProcAddressTable = vec![("glBufferData", 0x1000), ("glFooEXT", 0x2000)].into_iter().collect();
//!
//! assert_eq!(table.address_for("glBufferDataARB").unwrap(), 0x1000);
//! assert_eq!(table.address_for("glFooEXT").unwrap(), 0x2000);
//! assert!(table.address_for("glUnknown").is_err());
//! ```

#[macro_use]
extern crate log;

pub mod extension_names;
mod proc_address;

pub use extension_names::SymbolKind;
pub use proc_address::{AddressNotFound, ProcAddressTable};
