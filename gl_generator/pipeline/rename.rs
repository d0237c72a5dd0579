////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2020 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

//! Moving whole extensions into the core namespace, e.g. the `OES` framebuffer functions of
//! OpenGL ES which desktop OpenGL has in core.

use glbind_runtime::{extension_names, SymbolKind};
use indexmap::{IndexMap, IndexSet};

use crate::{
    error::{Error, Result},
    registry::SymbolTable,
};

/// Declared name → exposed name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameTable {
    renames: IndexMap<String, String>,
    /// Exposed name → declared name, to detect two names ending up on the same target.
    targets: IndexMap<String, String>,
}

impl RenameTable {
    pub fn new() -> RenameTable {
        RenameTable::default()
    }

    pub fn insert<F, T>(&mut self, from: F, to: T) -> Result<()>
    where
        F: Into<String>,
        T: Into<String>, {
        let from = from.into();
        let to = to.into();

        if let Some(previous) = self.targets.get(&to) {
            if *previous != from {
                return Err(Error::RenameCollision { target: to, first: previous.clone(), second: from });
            }
            return Ok(());
        }

        self.targets.insert(to.clone(), from.clone());
        self.renames.insert(from, to);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.renames.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.renames.iter().map(|(from, to)| (from.as_str(), to.as_str()))
    }

    pub fn len(&self) -> usize {
        self.renames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }

    /// Rewrites every constant, function and registry declaration named in this table.
    ///
    /// Fails if a renamed symbol lands on a name that is already taken by another emitted symbol.
    pub fn apply(&self, table: &SymbolTable) -> Result<SymbolTable> {
        let renamed = table.with_renames(|name| self.get(name).map(str::to_owned));

        check_unique(
            table.constants().iter().map(|c| c.name.as_str()),
            renamed.constants().iter().map(|c| c.name.as_str()),
        )?;
        check_unique(
            table.functions().iter().map(|f| f.name.as_str()),
            renamed.functions().iter().map(|f| f.name.as_str()),
        )?;

        Ok(renamed)
    }
}

fn check_unique<'a, I, J>(original: I, renamed: J) -> Result<()>
where
    I: Iterator<Item = &'a str>,
    J: Iterator<Item = &'a str>, {
    let mut seen: IndexMap<&str, &str> = IndexMap::new();
    for (before, after) in original.zip(renamed) {
        if let Some(first) = seen.insert(after, before) {
            return Err(Error::RenameCollision { target: after.to_owned(), first: first.to_owned(), second: before.to_owned() });
        }
    }
    Ok(())
}

/// Computes the renames for the extensions flagged to be moved into core.
pub struct Renamer<'a> {
    extensions: &'a IndexSet<String>,
}

impl<'a> Renamer<'a> {
    pub fn new(extensions_renamed_into_core: &'a IndexSet<String>) -> Renamer<'a> {
        Renamer { extensions: extensions_renamed_into_core }
    }

    pub fn rename(&self, table: &SymbolTable) -> Result<RenameTable> {
        let mut renames = RenameTable::new();

        let registry = match table.extensions() {
            Some(registry) => registry,
            None if self.extensions.is_empty() => return Ok(renames),
            None => return Err(Error::RenameWithoutSymbolMetadata { count: self.extensions.len() }),
        };

        for extension in self.extensions {
            let declarations = match registry.declarations(extension) {
                Some(declarations) => declarations,
                None => {
                    warn!("extension {} is flagged for renaming into core but is not declared anywhere", extension);
                    continue;
                },
            };

            for declaration in declarations {
                let kind = match SymbolKind::classify(declaration) {
                    Some(kind) => kind,
                    None => continue,
                };
                let normalized = extension_names::normalize(declaration, kind);
                if normalized != *declaration {
                    debug!("renaming {} to {}", declaration, normalized);
                    renames.insert(declaration.as_str(), normalized)?;
                }
            }
        }

        Ok(renames)
    }
}
