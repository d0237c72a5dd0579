////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2019 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

//! Naming convention of GL-family entry points and enumerants.
//!
//! Functions carry their extension suffix directly (`glBufferDataARB`), enumerants carry it after
//! an underscore (`GL_ARRAY_BUFFER_ARB`). Suffixes are split into two groups: the ARB-like ones
//! that usually get promoted into core unchanged, and the vendor ones.

/// ARB-like suffixes, in priority order.
pub const ARB_SUFFIXES: &[&str] = &["ARB", "GL2", "OES", "KHR", "OML"];

/// Vendor suffixes, in priority order.
pub const VENDOR_SUFFIXES: &[&str] = &[
    "3DFX", "AMD", "ANGLE", "ARM", "APPLE", "ATI", "EXT", "HP", "IBM", "IMG", "MESA", "MESAX", "NV", "QCOM", "SGI",
    "SGIS", "SGIX", "SUN", "WIN",
];

const FUNCTION_PREFIXES: &[&str] = &["gl", "egl", "wgl", "agl", "cgl"];
const ENUMERATION_PREFIXES: &[&str] = &["GL_", "GLU_", "GLX_", "EGL_", "WGL_", "AGL_", "CGL_"];

/// The two namespaces of the native API.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Function,
    Enumeration,
}

impl SymbolKind {
    /// Classifies a declared name, or returns `None` if it follows neither naming convention.
    pub fn classify(name: &str) -> Option<SymbolKind> {
        if is_enumeration(name) {
            Some(SymbolKind::Enumeration)
        } else if is_function(name) {
            Some(SymbolKind::Function)
        } else {
            None
        }
    }
}

pub fn is_function(name: &str) -> bool {
    FUNCTION_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

pub fn is_enumeration(name: &str) -> bool {
    ENUMERATION_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

/// Strips the namespace prefix of a function (`gl`, `egl`, ...) or enumerant (`GL_`, `EGL_`, ...).
pub fn strip_namespace(name: &str) -> &str {
    ENUMERATION_PREFIXES
        .iter()
        .chain(FUNCTION_PREFIXES)
        .find(|prefix| name.starts_with(*prefix))
        .map_or(name, |prefix| &name[prefix.len()..])
}

/// Length of the `suffixes` entry that `name` ends with, including the separating underscore of
/// enumerants. Later entries are checked first so that `SGIX` wins over `SGI`.
fn suffix_len(suffixes: &[&'static str], name: &str, kind: SymbolKind) -> Option<(&'static str, usize)> {
    suffixes.iter().rev().find_map(|&suffix| match kind {
        SymbolKind::Function if name.ends_with(suffix) => Some((suffix, suffix.len())),
        SymbolKind::Enumeration
            if name.ends_with(suffix) && name[..name.len() - suffix.len()].ends_with('_') =>
        {
            Some((suffix, suffix.len() + 1))
        },
        _ => None,
    })
}

/// Returns the extension suffix carried by `name`, ARB-like suffixes first.
pub fn extension_suffix(name: &str, kind: SymbolKind) -> Option<&'static str> {
    suffix_len(ARB_SUFFIXES, name, kind)
        .or_else(|| suffix_len(VENDOR_SUFFIXES, name, kind))
        .map(|(suffix, _)| suffix)
}

pub fn is_extension(name: &str, kind: SymbolKind) -> bool {
    extension_suffix(name, kind).is_some()
}

pub fn is_extension_arb(name: &str, kind: SymbolKind) -> bool {
    suffix_len(ARB_SUFFIXES, name, kind).is_some()
}

pub fn is_extension_vendor(name: &str, kind: SymbolKind) -> bool {
    suffix_len(VENDOR_SUFFIXES, name, kind).is_some()
}

fn strip(suffixes: &[&'static str], name: &str, kind: SymbolKind) -> String {
    match suffix_len(suffixes, name, kind) {
        Some((_, len)) => name[..name.len() - len].to_owned(),
        None => name.to_owned(),
    }
}

/// Strips one ARB-like suffix, if any.
pub fn normalize_arb(name: &str, kind: SymbolKind) -> String {
    strip(ARB_SUFFIXES, name, kind)
}

/// Strips one vendor suffix, if any.
pub fn normalize_vendor(name: &str, kind: SymbolKind) -> String {
    strip(VENDOR_SUFFIXES, name, kind)
}

/// Returns the core name of `name`: an ARB-like suffix is stripped if present, otherwise a vendor
/// suffix. Names without a suffix are returned unchanged.
pub fn normalize(name: &str, kind: SymbolKind) -> String {
    if is_extension_arb(name, kind) {
        normalize_arb(name, kind)
    } else if is_extension_vendor(name, kind) {
        normalize_vendor(name, kind)
    } else {
        name.to_owned()
    }
}

/// Every spelling under which the function `base` may have been exposed.
///
/// A name that already carries a suffix has no other spelling. Otherwise the identity comes first,
/// followed by `base` with each ARB-like and then each vendor suffix appended.
pub fn function_name_permutations(base: &str) -> Vec<String> {
    if is_extension(base, SymbolKind::Function) {
        return vec![base.to_owned()];
    }

    let mut names = Vec::with_capacity(1 + ARB_SUFFIXES.len() + VENDOR_SUFFIXES.len());
    names.push(base.to_owned());
    names.extend(ARB_SUFFIXES.iter().chain(VENDOR_SUFFIXES).map(|suffix| format!("{}{}", base, suffix)));
    names
}
