////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2020 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

//! The symbol table a generation run starts from: constants, functions and the extension groups
//! declaring them.

use std::{fmt, str::FromStr};

use indexmap::{IndexMap, IndexSet};

use crate::error::{Error, Result};

mod parse;

/// A `#define`d or enumerated constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantDefinition {
    pub name: String,
    pub value: i128,
    /// Other names of the same value, e.g. the `_ARB` spelling of a core enumerant.
    pub aliases: Vec<String>,
    pub enum_group: Option<String>,
    /// Declared as a member of an enumeration rather than as a plain define.
    pub is_enum: bool,
}

impl ConstantDefinition {
    pub fn new<S: Into<String>>(name: S, value: i128) -> ConstantDefinition {
        ConstantDefinition { name: name.into(), value, aliases: Vec::new(), enum_group: None, is_enum: false }
    }

    fn renamed(&self, name: String) -> ConstantDefinition {
        ConstantDefinition { name, ..self.clone() }
    }
}

/// A C type as written in a declaration, e.g. `const void *`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NativeType {
    /// `const` applies to the innermost pointee.
    pub is_const: bool,
    pub base: String,
    pub pointer_depth: u8,
}

impl NativeType {
    pub fn scalar<S: Into<String>>(base: S) -> NativeType {
        NativeType { is_const: false, base: base.into(), pointer_depth: 0 }
    }

    pub fn void() -> NativeType {
        NativeType::scalar("void")
    }

    pub fn is_void(&self) -> bool {
        self.base == "void" && self.pointer_depth == 0
    }

    pub fn is_pointer(&self) -> bool {
        self.pointer_depth > 0
    }

    /// The type this pointer points to.
    pub fn pointee(&self) -> Option<NativeType> {
        if self.pointer_depth == 0 {
            return None;
        }
        Some(NativeType { is_const: self.is_const, base: self.base.clone(), pointer_depth: self.pointer_depth - 1 })
    }
}

impl FromStr for NativeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<NativeType> {
        let mut is_const = false;
        let mut pointer_depth = 0u8;
        let mut base = Vec::new();

        let spaced = s.replace('*', " * ");
        for word in spaced.split_whitespace() {
            match word {
                "*" => pointer_depth += 1,
                // only the qualifier next to the base type matters to the bindings
                "const" if pointer_depth == 0 => is_const = true,
                "const" | "struct" => {},
                _ if pointer_depth == 0 => base.push(word),
                _ => return Err(Error::SymbolTable(format!("unexpected `{}` after pointer in type `{}`", word, s))),
            }
        }

        if base.is_empty() {
            return Err(Error::SymbolTable(format!("type `{}` has no base type", s)));
        }

        Ok(NativeType { is_const, base: base.join(" "), pointer_depth })
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_const {
            write!(f, "const ")?;
        }
        write!(f, "{}", self.base)?;
        if self.pointer_depth > 0 {
            write!(f, " {}", "*".repeat(self.pointer_depth as usize))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: NativeType,
}

impl Param {
    pub fn new<S: Into<String>>(name: S, ty: NativeType) -> Param {
        Param { name: name.into(), ty }
    }
}

/// A native function declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSymbol {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: NativeType,
    /// Native symbol to load when `name` was rewritten by a rename.
    entry_point: Option<String>,
}

impl FunctionSymbol {
    pub fn new<S: Into<String>>(name: S, params: Vec<Param>, return_type: NativeType) -> FunctionSymbol {
        FunctionSymbol { name: name.into(), params, return_type, entry_point: None }
    }

    /// The symbol the native library exports for this function.
    pub fn entry_point(&self) -> &str {
        self.entry_point.as_ref().unwrap_or(&self.name)
    }

    pub fn is_renamed(&self) -> bool {
        self.entry_point.is_some()
    }

    fn renamed(&self, name: String) -> FunctionSymbol {
        FunctionSymbol { name, entry_point: Some(self.entry_point().to_owned()), ..self.clone() }
    }
}

/// Which extension (or core feature) groups declare which symbols.
///
/// Both directions keep declaration order so that everything derived from the registry comes out
/// in the same order on every run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionRegistry {
    declarations: IndexMap<String, IndexSet<String>>,
    declared_by: IndexMap<String, Vec<String>>,
}

impl ExtensionRegistry {
    pub fn new() -> ExtensionRegistry {
        ExtensionRegistry::default()
    }

    /// Records that `extension` declares `symbol`.
    pub fn declare<E, S>(&mut self, extension: E, symbol: S)
    where
        E: Into<String>,
        S: Into<String>, {
        let extension = extension.into();
        let symbol = symbol.into();

        let declaring = self.declared_by.entry(symbol.clone()).or_insert_with(Vec::new);
        if !declaring.contains(&extension) {
            declaring.push(extension.clone());
        }
        self.declarations.entry(extension).or_insert_with(IndexSet::new).insert(symbol);
    }

    /// Registers an extension that declares nothing (yet).
    pub fn add_extension<E: Into<String>>(&mut self, extension: E) {
        self.declarations.entry(extension.into()).or_insert_with(IndexSet::new);
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.declarations.keys().map(String::as_str)
    }

    pub fn declarations(&self, extension: &str) -> Option<&IndexSet<String>> {
        self.declarations.get(extension)
    }

    /// Extensions declaring `symbol`, in registry order.
    pub fn extensions_declaring(&self, symbol: &str) -> &[String] {
        self.declared_by.get(symbol).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True if some extension or feature of the registry declares `symbol`.
    pub fn is_declared(&self, symbol: &str) -> bool {
        self.declared_by.contains_key(symbol)
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Rebuilds the registry with every declared name passed through `rename`.
    pub fn map_names<F>(&self, rename: F) -> ExtensionRegistry
    where F: Fn(&str) -> String {
        let mut renamed = ExtensionRegistry::new();
        for (extension, symbols) in &self.declarations {
            renamed.add_extension(extension.as_str());
            for symbol in symbols {
                renamed.declare(extension.as_str(), rename(symbol));
            }
        }
        renamed
    }
}

/// The pre-built symbol table of one generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    constants: Vec<ConstantDefinition>,
    functions: Vec<FunctionSymbol>,
    extensions: Option<ExtensionRegistry>,
}

impl SymbolTable {
    /// `extensions` is `None` when no header symbol metadata is available at all.
    pub fn new(
        constants: Vec<ConstantDefinition>,
        functions: Vec<FunctionSymbol>,
        extensions: Option<ExtensionRegistry>,
    ) -> SymbolTable {
        SymbolTable { constants, functions, extensions }
    }

    /// Reads a registry in the Khronos XML dialect.
    pub fn from_xml<R: std::io::Read>(src: R) -> Result<SymbolTable> {
        parse::from_xml(src)
    }

    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<SymbolTable> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| Error::Read { path: path.to_owned(), source })?;
        SymbolTable::from_xml(std::io::BufReader::new(file))
    }

    pub fn constants(&self) -> &[ConstantDefinition] {
        &self.constants
    }

    pub fn functions(&self) -> &[FunctionSymbol] {
        &self.functions
    }

    pub fn extensions(&self) -> Option<&ExtensionRegistry> {
        self.extensions.as_ref()
    }

    pub fn function(&self, name: &str) -> Option<&FunctionSymbol> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn constant(&self, name: &str) -> Option<&ConstantDefinition> {
        self.constants.iter().find(|c| c.name == name)
    }

    /// Returns a copy restricted to the symbols for which `keep` returns true. The extension
    /// registry is left untouched.
    pub fn retain<F>(&self, keep: F) -> SymbolTable
    where F: Fn(&str) -> bool {
        SymbolTable {
            constants: self.constants.iter().filter(|c| keep(&c.name)).cloned().collect(),
            functions: self.functions.iter().filter(|f| keep(&f.name)).cloned().collect(),
            extensions: self.extensions.clone(),
        }
    }

    pub(crate) fn with_renames<F>(&self, rename: F) -> SymbolTable
    where F: Fn(&str) -> Option<String> {
        SymbolTable {
            constants: self
                .constants
                .iter()
                .map(|c| match rename(&c.name) {
                    Some(name) => c.renamed(name),
                    None => c.clone(),
                })
                .collect(),
            functions: self
                .functions
                .iter()
                .map(|f| match rename(&f.name) {
                    Some(name) => f.renamed(name),
                    None => f.clone(),
                })
                .collect(),
            extensions: self
                .extensions
                .as_ref()
                .map(|registry| registry.map_names(|name| rename(name).unwrap_or_else(|| name.to_owned()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_native_types() {
        let ty: NativeType = "const void *".parse().unwrap();
        assert_eq!(ty, NativeType { is_const: true, base: "void".to_owned(), pointer_depth: 1 });

        let ty: NativeType = "const GLchar *const*".parse().unwrap();
        assert!(ty.is_const);
        assert_eq!(ty.base, "GLchar");
        assert_eq!(ty.pointer_depth, 2);

        let ty: NativeType = "struct _cl_context *".parse().unwrap();
        assert_eq!(ty.base, "_cl_context");

        assert_eq!("unsigned int".parse::<NativeType>().unwrap().base, "unsigned int");
        assert!("*".parse::<NativeType>().is_err());
        assert!("GLfloat * x".parse::<NativeType>().is_err());
    }

    #[test]
    fn native_type_display_round_trips_shape() {
        let ty: NativeType = "const GLfloat*".parse().unwrap();
        assert_eq!(ty.to_string(), "const GLfloat *");
        assert_eq!(ty.pointee().unwrap(), NativeType { is_const: true, base: "GLfloat".to_owned(), pointer_depth: 0 });
        assert!(NativeType::void().is_void());
    }

    #[test]
    fn registry_tracks_both_directions_in_order() {
        let mut registry = ExtensionRegistry::new();
        registry.declare("GL_VERSION_1_5", "glBufferData");
        registry.declare("GL_ARB_vertex_buffer_object", "glBufferDataARB");
        registry.declare("GL_ES_VERSION_2_0", "glBufferData");
        registry.declare("GL_VERSION_1_5", "glBufferData");

        assert_eq!(registry.extensions().collect::<Vec<_>>(), vec![
            "GL_VERSION_1_5",
            "GL_ARB_vertex_buffer_object",
            "GL_ES_VERSION_2_0"
        ]);
        assert_eq!(registry.extensions_declaring("glBufferData"), &[
            "GL_VERSION_1_5".to_owned(),
            "GL_ES_VERSION_2_0".to_owned()
        ]);
        assert!(registry.is_declared("glBufferDataARB"));
        assert!(!registry.is_declared("glBufferDataEXT"));
        assert!(registry.extensions_declaring("glBufferDataEXT").is_empty());
    }

    #[test]
    fn renamed_function_keeps_its_entry_point() {
        let table = SymbolTable::new(
            vec![ConstantDefinition::new("GL_FRAMEBUFFER_OES", 0x8D40)],
            vec![FunctionSymbol::new("glBindFramebufferOES", vec![], NativeType::void())],
            None,
        );
        let renamed = table.with_renames(|name| name.strip_suffix("OES").map(|s| s.trim_end_matches('_').to_owned()));

        let function = renamed.function("glBindFramebuffer").unwrap();
        assert!(function.is_renamed());
        assert_eq!(function.entry_point(), "glBindFramebufferOES");
        assert!(renamed.constant("GL_FRAMEBUFFER").is_some());
    }
}
