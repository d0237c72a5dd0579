////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2020 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

//! Removal of extensions whose every symbol is also available under its core name.
//!
//! When the hardware lacks the core entry point, the loader falls back to the extension one, so
//! the bindings only need to expose the core spelling.

use glbind_runtime::{extension_names, SymbolKind};
use indexmap::{IndexMap, IndexSet};

use crate::registry::{ConstantDefinition, ExtensionRegistry, FunctionSymbol, SymbolTable};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnificationOutcome {
    /// Every symbol was removed; `removed` lists them with their core names.
    Unified { removed: Vec<(String, String)> },
    /// Nothing was removed because `blocked_by` has no core counterpart.
    Abandoned { blocked_by: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionUnification {
    pub extension: String,
    pub outcome: UnificationOutcome,
}

/// What happened to each true extension, in registry order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnificationReport {
    entries: Vec<ExtensionUnification>,
}

impl UnificationReport {
    pub fn entries(&self) -> &[ExtensionUnification] {
        &self.entries
    }

    pub fn outcome(&self, extension: &str) -> Option<&UnificationOutcome> {
        self.entries.iter().find(|e| e.extension == extension).map(|e| &e.outcome)
    }

    pub fn is_unified(&self, extension: &str) -> bool {
        matches!(self.outcome(extension), Some(UnificationOutcome::Unified { .. }))
    }

    /// Core name → removed extension names, over all unified extensions.
    pub fn fallbacks(&self) -> IndexMap<&str, Vec<&str>> {
        let mut fallbacks: IndexMap<&str, Vec<&str>> = IndexMap::new();
        for entry in &self.entries {
            if let UnificationOutcome::Unified { removed } = &entry.outcome {
                for (name, core) in removed {
                    fallbacks.entry(core.as_str()).or_insert_with(Vec::new).push(name.as_str());
                }
            }
        }
        fallbacks
    }
}

enum Verdict {
    /// Not an extension the unifier deals with.
    Skip,
    Unify(Vec<(String, String)>),
    Abandon(String),
}

/// Decides the fate of one extension without touching the emission maps.
fn judge(
    declarations: &IndexSet<String>,
    registry: &ExtensionRegistry,
    constants: &IndexMap<&str, &ConstantDefinition>,
    functions: &IndexMap<&str, &FunctionSymbol>,
) -> Verdict {
    let mut removed = Vec::with_capacity(declarations.len());
    for declaration in declarations {
        let kind = match SymbolKind::classify(declaration) {
            Some(kind) if extension_names::is_extension(declaration, kind) => kind,
            _ => return Verdict::Skip,
        };
        let scheduled = match kind {
            SymbolKind::Function => functions.contains_key(declaration.as_str()),
            SymbolKind::Enumeration => constants.contains_key(declaration.as_str()),
        };
        if !scheduled {
            return Verdict::Skip;
        }
        let core = extension_names::normalize(declaration, kind);
        if !registry.is_declared(&core) {
            return Verdict::Abandon(declaration.clone());
        }
        removed.push((declaration.clone(), core));
    }
    Verdict::Unify(removed)
}

/// Whole-symbol-set filter removing extensions subsumed by core symbols.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtensionUnifier;

impl ExtensionUnifier {
    pub fn new() -> ExtensionUnifier {
        ExtensionUnifier
    }

    /// Filters the constants and functions of `table`.
    ///
    /// Membership of extension symbols is checked against the symbols of `table`, but whether a
    /// core name exists is checked against its whole registry: the header being bound may not be
    /// the one declaring the core entry points.
    pub fn filter_symbols(&self, table: &SymbolTable) -> (SymbolTable, UnificationReport) {
        let mut report = UnificationReport::default();
        let registry = match table.extensions() {
            Some(registry) => registry,
            None => return (table.clone(), report),
        };

        let mut constants: IndexMap<&str, &ConstantDefinition> =
            table.constants().iter().map(|c| (c.name.as_str(), c)).collect();
        let mut functions: IndexMap<&str, &FunctionSymbol> =
            table.functions().iter().map(|f| (f.name.as_str(), f)).collect();

        for extension in registry.extensions() {
            let declarations = match registry.declarations(extension) {
                Some(declarations) if !declarations.is_empty() => declarations,
                _ => continue,
            };

            let verdict = judge(declarations, registry, &constants, &functions);

            let outcome = match verdict {
                Verdict::Skip => {
                    debug!("{} is not unifiable: not an extension or not emitted", extension);
                    continue;
                },
                Verdict::Unify(removed) => {
                    for (name, _) in &removed {
                        constants.shift_remove(name.as_str());
                        functions.shift_remove(name.as_str());
                    }
                    info!("unified extension {} into core API", extension);
                    UnificationOutcome::Unified { removed }
                },
                Verdict::Abandon(blocked_by) => {
                    info!("didn't unify extension {} into core API because of {}", extension, blocked_by);
                    UnificationOutcome::Abandoned { blocked_by }
                },
            };
            report.entries.push(ExtensionUnification { extension: extension.to_owned(), outcome });
        }

        let filtered = SymbolTable::new(
            constants.values().map(|&c| c.clone()).collect(),
            functions.values().map(|&f| f.clone()).collect(),
            Some(registry.clone()),
        );
        (filtered, report)
    }
}
