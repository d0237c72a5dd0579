////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2020 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

//! The generation pipeline: renaming, unification and buffer object expansion of a symbol table,
//! producing the [`BindingSet`] the generators emit.

use std::io;

use indexmap::IndexSet;

use crate::{
    binding::{self, BindingIds, BufferObjectBindings, MethodBinding},
    config::GeneratorConfig,
    error::{Error, Result},
    generators::Generator,
    registry::{ConstantDefinition, ExtensionRegistry, FunctionSymbol, SymbolTable},
};

pub mod buffer_object;
pub mod rename;
pub mod unify;

pub use self::{
    buffer_object::BufferObjectExpander,
    rename::{RenameTable, Renamer},
    unify::{ExtensionUnification, ExtensionUnifier, UnificationOutcome, UnificationReport},
};

/// Runs the stages in their fixed order: rename, unify, expand.
pub struct Pipeline {
    config: GeneratorConfig,
}

impl Pipeline {
    pub fn new(config: GeneratorConfig) -> Pipeline {
        Pipeline { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// The symbols scheduled for emission before any stage runs: everything except the ignored
    /// symbols and the members of ignored extensions.
    pub fn emission_set(&self, symbols: &SymbolTable) -> SymbolTable {
        let mut ignored: IndexSet<&str> = self.config.ignored_symbols.iter().map(String::as_str).collect();
        if let Some(registry) = symbols.extensions() {
            for extension in &self.config.ignored_extensions {
                match registry.declarations(extension) {
                    Some(declarations) => ignored.extend(declarations.iter().map(String::as_str)),
                    None => warn!("ignored extension {} is not declared anywhere", extension),
                }
            }
        }

        if ignored.is_empty() {
            return symbols.clone();
        }
        debug!("ignoring {} symbols", ignored.len());
        symbols.retain(|name| !ignored.contains(name))
    }

    pub fn run(&self, symbols: &SymbolTable) -> Result<BindingSet> {
        let scheduled = self.emission_set(symbols);

        let renames = Renamer::new(&self.config.rename_extensions_into_core).rename(&scheduled)?;
        let renamed = renames.apply(&scheduled)?;

        let (unified, unification) = if self.config.auto_unify_extensions {
            ExtensionUnifier::new().filter_symbols(&renamed)
        } else {
            (renamed, UnificationReport::default())
        };

        let expander = BufferObjectExpander::new(&self.config.buffer_object_functions);
        for name in &self.config.buffer_object_functions {
            if !unified.functions().iter().any(|f| f.name == *name || f.entry_point() == name) {
                warn!("buffer object function {} is not emitted", name);
            }
        }

        let mut ids = BindingIds::new();
        let mut buffer_object_bindings = BufferObjectBindings::new();
        let mut bindings = Vec::with_capacity(unified.functions().len());
        for function in unified.functions() {
            let overloads = binding::expand_function(function, &mut ids);
            bindings.extend(expander.expand(function, overloads, &mut ids, &mut buffer_object_bindings)?);
        }

        let set = BindingSet {
            symbols: unified,
            bindings,
            buffer_object_bindings,
            renames,
            unification,
            config: self.config.clone(),
        };
        set.validate()?;
        Ok(set)
    }
}

/// The renamed, unified and expanded symbol set of one run, ready for emission.
#[derive(Debug, Clone)]
pub struct BindingSet {
    symbols: SymbolTable,
    bindings: Vec<MethodBinding>,
    buffer_object_bindings: BufferObjectBindings,
    renames: RenameTable,
    unification: UnificationReport,
    config: GeneratorConfig,
}

impl BindingSet {
    pub fn constants(&self) -> &[ConstantDefinition] {
        self.symbols.constants()
    }

    pub fn functions(&self) -> &[FunctionSymbol] {
        self.symbols.functions()
    }

    /// The registry after renaming; still lists unified extensions.
    pub fn registry(&self) -> Option<&ExtensionRegistry> {
        self.symbols.extensions()
    }

    /// All bindings, grouped by function, originals before buffer object variants.
    pub fn bindings(&self) -> &[MethodBinding] {
        &self.bindings
    }

    pub fn bindings_for<'a>(&'a self, function: &'a str) -> impl Iterator<Item = &'a MethodBinding> + 'a {
        self.bindings.iter().filter(move |b| b.function == function)
    }

    pub fn is_buffer_object_binding(&self, binding: &MethodBinding) -> bool {
        self.buffer_object_bindings.contains(binding)
    }

    pub fn buffer_object_bindings(&self) -> &BufferObjectBindings {
        &self.buffer_object_bindings
    }

    pub fn renames(&self) -> &RenameTable {
        &self.renames
    }

    pub fn unification(&self) -> &UnificationReport {
        &self.unification
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Native names to try, in order, when loading `function`: its entry point followed by the
    /// extension entry points unified into it.
    pub fn load_names(&self, function: &FunctionSymbol) -> Vec<String> {
        let mut names = vec![function.entry_point().to_owned()];
        if let Some(removed) = self.unification.fallbacks().get(function.name.as_str()) {
            names.extend(removed.iter().map(|&name| name.to_owned()).filter(|name| *name != function.entry_point()));
        }
        names
    }

    /// Every binding must call a function that is still emitted.
    pub fn validate(&self) -> Result<()> {
        let functions: IndexSet<&str> = self.functions().iter().map(|f| f.name.as_str()).collect();
        match self.bindings.iter().find(|b| !functions.contains(b.function.as_str())) {
            Some(binding) => Err(Error::DanglingBinding { function: binding.function.clone() }),
            None => Ok(()),
        }
    }

    pub fn write_bindings<G, W>(&self, generator: &G, dest: &mut W) -> Result<()>
    where
        G: Generator,
        W: io::Write, {
        self.validate()?;
        generator.write(self, dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{NativeType, Param};

    fn table() -> SymbolTable {
        let mut registry = ExtensionRegistry::new();
        registry.declare("GL_VERSION_1_5", "glBufferData");
        registry.declare("GL_VERSION_1_5", "GL_ARRAY_BUFFER");
        registry.declare("GL_ARB_vertex_buffer_object", "glBufferDataARB");
        registry.declare("GL_ARB_vertex_buffer_object", "GL_ARRAY_BUFFER_ARB");
        registry.declare("GL_SGIX_async", "glAsyncMarkerSGIX");

        let buffer_data = |name: &str| {
            FunctionSymbol::new(
                name,
                vec![
                    Param::new("target", NativeType::scalar("GLenum")),
                    Param::new("size", NativeType::scalar("GLsizeiptr")),
                    Param::new("data", "const void *".parse().unwrap()),
                    Param::new("usage", NativeType::scalar("GLenum")),
                ],
                NativeType::void(),
            )
        };

        SymbolTable::new(
            vec![ConstantDefinition::new("GL_ARRAY_BUFFER", 0x8892), ConstantDefinition::new("GL_ARRAY_BUFFER_ARB", 0x8892)],
            vec![
                buffer_data("glBufferData"),
                buffer_data("glBufferDataARB"),
                FunctionSymbol::new("glAsyncMarkerSGIX", vec![Param::new("marker", NativeType::scalar("GLuint"))], NativeType::void()),
            ],
            Some(registry),
        )
    }

    fn config() -> GeneratorConfig {
        GeneratorConfig {
            auto_unify_extensions: true,
            buffer_object_functions: vec!["glBufferData".to_owned()].into_iter().collect(),
            ignored_extensions: vec!["GL_SGIX_async".to_owned()].into_iter().collect(),
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn runs_every_stage() {
        let set = Pipeline::new(config()).run(&table()).unwrap();

        let functions: Vec<_> = set.functions().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(functions, vec!["glBufferData"]);
        assert_eq!(set.constants().len(), 1);
        assert!(set.unification().is_unified("GL_ARB_vertex_buffer_object"));

        let bindings: Vec<_> = set.bindings_for("glBufferData").collect();
        assert_eq!(bindings.len(), 2);
        assert!(!set.is_buffer_object_binding(bindings[0]));
        assert!(set.is_buffer_object_binding(bindings[1]));

        let function = &set.functions()[0];
        assert_eq!(set.load_names(function), vec!["glBufferData", "glBufferDataARB"]);
    }

    #[test]
    fn unification_is_off_by_default() {
        let set = Pipeline::new(GeneratorConfig::default()).run(&table()).unwrap();
        assert_eq!(set.functions().len(), 3);
        assert!(set.unification().entries().is_empty());
    }

    #[test]
    fn buffer_object_flag_after_unification_targets_survivor() {
        let config = GeneratorConfig {
            buffer_object_functions: vec!["glBufferDataARB".to_owned()].into_iter().collect(),
            ..config()
        };
        // glBufferDataARB is unified away, so no variant exists and nothing dangles
        let set = Pipeline::new(config).run(&table()).unwrap();
        assert!(set.buffer_object_bindings().is_empty());
    }

    #[test]
    fn dangling_binding_is_rejected() {
        let mut set = Pipeline::new(config()).run(&table()).unwrap();
        set.symbols = set.symbols.retain(|name| name != "glBufferData");
        assert!(matches!(set.validate(), Err(Error::DanglingBinding { ref function }) if function == "glBufferData"));
    }

    #[test]
    fn rename_without_metadata_aborts_the_run() {
        let config = GeneratorConfig {
            rename_extensions_into_core: vec!["GL_OES_mapbuffer".to_owned()].into_iter().collect(),
            ..GeneratorConfig::default()
        };
        let table = SymbolTable::new(vec![], vec![], None);
        assert!(matches!(Pipeline::new(config).run(&table), Err(Error::RenameWithoutSymbolMetadata { .. })));
    }
}
