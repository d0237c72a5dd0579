////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2019 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

//! A GL bindings generator. It reads a Khronos-style XML registry, renames the extensions the
//! configuration promotes into core, drops extensions whose symbols all exist in core, adds buffer
//! object variants of the flagged functions and writes Rust bindings calling through a procedure
//! address table.
//!
//! # Example
//!
//! In `build.rs`:
//!
//! ```no_run
//! extern crate glbind_generator;
//!
//! use glbind_generator::{GeneratorConfig, SymbolTable};
//! use std::env;
//! use std::fs::File;
//! use std::path::Path;
//!
//! fn main() {
//!     let dest = env::var("OUT_DIR").unwrap();
//!     let mut file = File::create(&Path::new(&dest).join("gl_bindings.rs")).unwrap();
//!
//!     let symbols = SymbolTable::load("gl.xml").unwrap();
//!     let config = GeneratorConfig::load("glbind.toml").unwrap();
//!     glbind_generator::write_bindings(&symbols, config, &mut file).unwrap();
//! }
//! ```
//!
//! In your project:
//!
//! ```ignore
//! mod gl {
//!     include!(concat!(env!("OUT_DIR"), "/gl_bindings.rs"));
//! }
//! ```
//!
//! The output carries no inner attributes, so a file written by the `glbind` command line tool can
//!  equally be declared as a module file (`mod gl;` next to `src/gl.rs`).
//!
//! The generated code refers to the runtime crate (`glbind_runtime` unless configured otherwise)
//!  for its address table, so the project must depend on it.

extern crate lazy_static;
#[macro_use]
extern crate log;
extern crate xml;

use std::io;

pub mod binding;
pub mod config;
mod error;
#[cfg(feature = "unstable_generator_utils")]
pub mod generators;
#[cfg(not(feature = "unstable_generator_utils"))]
mod generators;
pub mod pipeline;
mod registry;

pub use binding::{BindingId, BindingType, BindingVariant, BufferObjectBindings, MethodBinding};
pub use config::GeneratorConfig;
pub use error::{Error, Result};
pub use generators::{
    global_typed_gen::GlobalTypedGenerator, proc_address_gen::ProcAddressTableGenerator, Generator,
};
pub use pipeline::{BindingSet, Pipeline};
pub use registry::*;

/// Runs the whole pipeline over `symbols` and writes the typed bindings, address table included,
/// into `dest`.
///
/// Nothing is written if one of the stages fails.
pub fn write_bindings<W>(symbols: &SymbolTable, config: GeneratorConfig, dest: &mut W) -> Result<BindingSet>
where W: io::Write {
    let bindings = Pipeline::new(config).run(symbols)?;
    let mut generated = Vec::new();
    bindings.write_bindings(&GlobalTypedGenerator, &mut generated)?;
    dest.write_all(&generated)?;
    Ok(bindings)
}
