////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2020 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

use std::{fs, path::Path};

use indexmap::IndexSet;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Options controlling one generation run.
///
/// ```toml
/// rename_extensions_into_core = ["GL_OES_framebuffer_object"]
/// auto_unify_extensions = true
/// buffer_object_functions = ["glBufferData", "glVertexPointer"]
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Extensions whose symbols are exposed under their core names.
    pub rename_extensions_into_core: IndexSet<String>,
    /// Drop extension symbols that are fully covered by core symbols.
    pub auto_unify_extensions: bool,
    /// Functions that get an additional variant taking a buffer object offset.
    pub buffer_object_functions: IndexSet<String>,
    /// Emit constants that no extension or feature declares.
    pub allow_non_extension_constants: bool,
    pub ignored_symbols: IndexSet<String>,
    pub ignored_extensions: IndexSet<String>,
    /// Functions linked at build time; they get no address slot.
    pub statically_linked_functions: IndexSet<String>,
    /// Path of the runtime crate as seen from the generated code.
    pub runtime_crate: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            rename_extensions_into_core: IndexSet::new(),
            auto_unify_extensions: false,
            buffer_object_functions: IndexSet::new(),
            allow_non_extension_constants: false,
            ignored_symbols: IndexSet::new(),
            ignored_extensions: IndexSet::new(),
            statically_linked_functions: IndexSet::new(),
            runtime_crate: "glbind_runtime".to_owned(),
        }
    }
}

impl GeneratorConfig {
    pub fn from_toml_str(src: &str) -> Result<GeneratorConfig> {
        Ok(toml::from_str(src)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<GeneratorConfig> {
        let path = path.as_ref();
        let src = fs::read_to_string(path).map_err(|source| Error::Read { path: path.to_owned(), source })?;
        GeneratorConfig::from_toml_str(&src)
    }

    pub fn is_buffer_object_function(&self, name: &str) -> bool {
        self.buffer_object_functions.contains(name)
    }

    pub fn is_statically_linked(&self, name: &str) -> bool {
        self.statically_linked_functions.contains(name)
    }
}
