////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2020 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

use std::io;

use indexmap::IndexSet;

use crate::{
    binding::{BindingVariant, MethodBinding},
    error::{Error, Result},
    pipeline::BindingSet,
    registry::{ConstantDefinition, ExtensionRegistry, FunctionSymbol},
};

use super::proc_address_gen;

/// Emits typed bindings: constants, one `unsafe fn` per binding and the procedure address table
/// the functions are called through.
#[allow(missing_copy_implementations)]
pub struct GlobalTypedGenerator;

impl super::Generator for GlobalTypedGenerator {
    fn write<W>(&self, bindings: &BindingSet, dest: &mut W) -> Result<()>
    where W: io::Write {
        write_header(&bindings.config().runtime_crate, dest)?;
        write_type_aliases(bindings, dest)?;
        write_constants(bindings, dest)?;
        write_static_fns(bindings, dest)?;
        write_fns(bindings, dest)?;
        proc_address_gen::write_address_table(bindings, dest)?;
        Ok(())
    }
}

/// Creates a `__gl_imports` module which contains all the external symbols that we need for the
///  bindings.
///
/// Lints are silenced with outer attributes on each item, so that the output can be pulled in with
///  `include!` as well as used as a module file.
pub(crate) fn write_header<W>(runtime_crate: &str, dest: &mut W) -> io::Result<()>
where W: io::Write {
    writeln!(
        dest,
        r#"
#[allow(unused_imports)]
mod __gl_imports {{
    pub use std::ffi::CStr;
    pub use std::mem;
    pub use std::os::raw;
    pub use std::sync::OnceLock;
    pub use {runtime} as rt;
}}"#,
        runtime = runtime_crate
    )
}

/// Creates a `types` module which contains the type aliases of every referenced native scalar.
///
/// See also `generators::gen_types`.
fn write_type_aliases<W>(bindings: &BindingSet, dest: &mut W) -> Result<()>
where W: io::Write {
    let scalars = super::referenced_scalars(bindings)?;

    writeln!(
        dest,
        r#"
pub mod types {{
    #![allow(non_camel_case_types, non_snake_case, dead_code, missing_copy_implementations)]"#
    )?;
    super::gen_types(&scalars, dest)?;
    writeln!(dest, "}}")?;
    Ok(())
}

/// Extensions declaring `name` or one of `aliases`, in registry order.
fn declaring_extensions<'a>(registry: &'a ExtensionRegistry, name: &str, aliases: &[String]) -> IndexSet<&'a str> {
    Some(name)
        .into_iter()
        .chain(aliases.iter().map(String::as_str))
        .flat_map(|symbol| registry.extensions_declaring(symbol))
        .map(String::as_str)
        .collect()
}

/// The `Part of ...` annotation of a constant, or `None` if the constant is not emitted.
fn constant_owner(bindings: &BindingSet, registry: &ExtensionRegistry, constant: &ConstantDefinition) -> Option<String> {
    let extensions = declaring_extensions(registry, &constant.name, &constant.aliases);
    if !extensions.is_empty() {
        return Some(extensions.into_iter().collect::<Vec<_>>().join(", "));
    }

    if constant.is_enum {
        Some(constant.enum_group.clone().unwrap_or_else(|| "CORE ENUM".to_owned()))
    } else if bindings.config().allow_non_extension_constants {
        Some("CORE DEF".to_owned())
    } else {
        // every define is expected to sit behind an extension or feature guard
        info!("dropping constant {}: not declared by any extension", constant.name);
        None
    }
}

/// Creates all the constants at the root of the bindings.
fn write_constants<W>(bindings: &BindingSet, dest: &mut W) -> Result<()>
where W: io::Write {
    let registry = match (bindings.registry(), bindings.constants().first()) {
        (Some(registry), _) => registry,
        (None, None) => return Ok(()),
        (None, Some(first)) => return Err(Error::MissingSymbolMetadata { symbol: first.name.clone() }),
    };

    writeln!(dest)?;
    for constant in bindings.constants() {
        if let Some(owner) = constant_owner(bindings, registry, constant) {
            writeln!(dest, "/// Part of `{}`", owner)?;
            super::gen_constant_item(constant, "types::", dest)?;
        }
    }
    Ok(())
}

fn is_statically_linked(bindings: &BindingSet, function: &FunctionSymbol) -> bool {
    let config = bindings.config();
    config.is_statically_linked(&function.name) || config.is_statically_linked(function.entry_point())
}

/// Creates the `__static` module declaring the functions resolved by the linker.
fn write_static_fns<W>(bindings: &BindingSet, dest: &mut W) -> Result<()>
where W: io::Write {
    let functions: Vec<&FunctionSymbol> =
        bindings.functions().iter().filter(|f| is_statically_linked(bindings, f)).collect();
    if functions.is_empty() {
        return Ok(());
    }

    writeln!(
        dest,
        r#"
mod __static {{
    #![allow(non_snake_case)]
    #[allow(unused_imports)]
    use super::{{__gl_imports, types}};

    extern "system" {{"#
    )?;
    for function in functions {
        writeln!(
            dest,
            "        pub fn {symbol}({params}){ret};",
            symbol = function.entry_point(),
            params = super::gen_native_parameters(function, true).join(", "),
            ret = super::gen_return_suffix(&function.return_type),
        )?;
    }
    writeln!(dest, "    }}\n}}")?;
    Ok(())
}

fn write_binding_docs<W>(bindings: &BindingSet, function: &FunctionSymbol, binding: &MethodBinding, dest: &mut W) -> Result<()>
where W: io::Write {
    if let Some(registry) = bindings.registry() {
        let mut extensions = declaring_extensions(registry, &function.name, &[]);
        if function.is_renamed() {
            extensions.extend(declaring_extensions(registry, function.entry_point(), &[]));
        }
        if !extensions.is_empty() {
            writeln!(dest, "/// Part of `{}`", extensions.into_iter().collect::<Vec<_>>().join(", "))?;
        }
    }

    let load_names = bindings.load_names(function);
    if load_names.len() > 1 {
        writeln!(dest, "///\n/// Fallbacks: {}", load_names[1..].join(", "))?;
    }

    match binding.variant {
        BindingVariant::Primary => {},
        BindingVariant::Array => writeln!(dest, "///\n/// Takes typed pointers as slices.")?,
        BindingVariant::BufferObject => {
            debug_assert!(bindings.is_buffer_object_binding(binding));
            writeln!(dest, "///\n/// Buffer object variant: pointer arguments are offsets into the bound buffer object.")?
        },
    }
    Ok(())
}

/// Creates the functions corresponding to the bindings.
///
/// Dynamically linked functions call the function pointer stored in the `storage` module created
///  by the address table, statically linked ones the `__static` declarations.
fn write_fns<W>(bindings: &BindingSet, dest: &mut W) -> Result<()>
where W: io::Write {
    for function in bindings.functions() {
        let ident = super::gen_ident(&function.name);
        let ret = super::gen_return_suffix(&function.return_type);

        let callee = if is_statically_linked(bindings, function) {
            format!("__static::{}", function.entry_point())
        } else {
            format!(
                "__gl_imports::mem::transmute::<_, extern \"system\" fn({typed_params}){ret}>(storage::{ident}.f)",
                typed_params = super::gen_native_parameters(function, false).join(", "),
                ret = ret,
                ident = ident,
            )
        };

        for binding in bindings.bindings_for(&function.name) {
            writeln!(dest)?;
            write_binding_docs(bindings, function, binding, dest)?;
            writeln!(
                dest,
                "#[inline]
#[allow(non_snake_case, dead_code)]
pub unsafe fn {ident}{suffix}({params}){ret} {{
    {callee}({args})
}}",
                ident = ident,
                suffix = binding.variant.ident_suffix(),
                params = super::gen_parameters(binding, true, true).join(", "),
                ret = ret,
                callee = callee,
                args = super::gen_parameters(binding, false, false).join(", "),
            )?;
        }
    }
    Ok(())
}
