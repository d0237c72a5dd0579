////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2020 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

//! The procedure address table: one function pointer slot per dynamically linked function, the
//! loaders filling them and `get_address_for`, which finds a slot by any suffix spelling of its
//! name.

use std::io;

use crate::{error::Result, pipeline::BindingSet, registry::FunctionSymbol};

use super::global_typed_gen::write_header;

/// Emits only the address table, without typed wrappers.
#[allow(missing_copy_implementations)]
pub struct ProcAddressTableGenerator;

impl super::Generator for ProcAddressTableGenerator {
    fn write<W>(&self, bindings: &BindingSet, dest: &mut W) -> Result<()>
    where W: io::Write {
        write_header(&bindings.config().runtime_crate, dest)?;
        write_address_table(bindings, dest)
    }
}

/// Writes every part of the address table into `dest`.
pub(crate) fn write_address_table<W>(bindings: &BindingSet, dest: &mut W) -> Result<()>
where W: io::Write {
    let functions = dynamic_functions(bindings);

    write_first_loaded(dest)?;
    write_fnptr_struct_def(dest)?;
    write_ptrs(&functions, dest)?;
    write_fn_mods(bindings, &functions, dest)?;
    write_panicking_fns(dest)?;
    write_load_fn(&functions, dest)?;
    write_get_address_for(dest)?;
    Ok(())
}

/// Functions that are resolved at load time, i.e. everything not linked statically.
fn dynamic_functions(bindings: &BindingSet) -> Vec<&FunctionSymbol> {
    let config = bindings.config();
    bindings
        .functions()
        .iter()
        .filter(|f| !config.is_statically_linked(&f.name) && !config.is_statically_linked(f.entry_point()))
        .collect()
}

/// Creates `first_loaded`, which asks the loader for each name in turn.
fn write_first_loaded<W>(dest: &mut W) -> io::Result<()>
where W: io::Write {
    writeln!(
        dest,
        r#"
#[allow(dead_code)]
#[inline(never)]
fn first_loaded(loadfn: &mut dyn FnMut(&'static str) -> *const __gl_imports::raw::c_void,
                names: &[&'static str]) -> *const __gl_imports::raw::c_void {{
    names.iter().map(|&name| loadfn(name)).find(|ptr| !ptr.is_null()).unwrap_or(::std::ptr::null())
}}"#
    )
}

/// Creates the `FnPtr` slot type. An empty slot points at `missing_fn_panic` and reports address
///  `0` to the address table.
fn write_fnptr_struct_def<W>(dest: &mut W) -> io::Result<()>
where W: io::Write {
    writeln!(
        dest,
        "
#[derive(Clone, Copy)]
#[allow(dead_code)]
pub struct FnPtr {{
    f: *const __gl_imports::raw::c_void,
    loaded: bool,
}}

#[allow(dead_code)]
impl FnPtr {{
    const EMPTY: FnPtr = FnPtr {{ f: missing_fn_panic as *const __gl_imports::raw::c_void, loaded: false }};

    fn resolved(ptr: *const __gl_imports::raw::c_void) -> FnPtr {{
        if ptr.is_null() {{ FnPtr::EMPTY }} else {{ FnPtr {{ f: ptr, loaded: true }} }}
    }}

    fn address(self) -> usize {{
        if self.loaded {{ self.f as usize }} else {{ 0 }}
    }}
}}"
    )
}

/// Creates a `storage` module which contains a static `FnPtr` per dynamically linked function.
fn write_ptrs<W>(functions: &[&FunctionSymbol], dest: &mut W) -> io::Result<()>
where W: io::Write {
    writeln!(
        dest,
        "
mod storage {{
    #![allow(non_snake_case, non_upper_case_globals, dead_code, unused_imports)]
    use super::FnPtr;
"
    )?;

    for function in functions {
        writeln!(
            dest,
            "    pub static mut {ident}: FnPtr = FnPtr::EMPTY;",
            ident = super::gen_ident(&function.name)
        )?;
    }

    writeln!(dest, "}}")
}

/// Creates one module for each function.
///
/// Each module contains `is_loaded`, `load_with` and `address` which interact with the `storage`
///  module created by `write_ptrs`. `load_with` asks for the native entry point first and then for
///  every extension entry point that was unified into it.
fn write_fn_mods<W>(bindings: &BindingSet, functions: &[&FunctionSymbol], dest: &mut W) -> io::Result<()>
where W: io::Write {
    for function in functions {
        let ident = super::gen_ident(&function.name);
        let mut load_names = bindings.load_names(function);
        if load_names.is_empty() {
            load_names.push(function.entry_point().to_owned());
        }
        let names = load_names.iter().map(|name| format!("\"{}\"", name)).collect::<Vec<_>>().join(", ");

        writeln!(
            dest,
            r##"
#[allow(non_snake_case, dead_code)]
pub mod {ident} {{
    use super::{{storage, first_loaded, FnPtr}};
    use super::__gl_imports::raw;

    #[inline]
    pub fn is_loaded() -> bool {{
        unsafe {{ storage::{ident}.loaded }}
    }}

    /// Native address of the loaded function, `0` if it was not found.
    #[inline]
    pub fn address() -> usize {{
        unsafe {{ storage::{ident}.address() }}
    }}

    pub fn load_with<F>(mut loadfn: F) where F: FnMut(&'static str) -> *const raw::c_void {{
        unsafe {{
            storage::{ident} = FnPtr::resolved(first_loaded(&mut loadfn, &[{names}]))
        }}
    }}
}}"##,
            ident = ident,
            names = names,
        )?;
    }

    Ok(())
}

/// Creates a `missing_fn_panic` function.
///
/// This function is the mock that is called if the real function could not be called.
fn write_panicking_fns<W>(dest: &mut W) -> io::Result<()>
where W: io::Write {
    writeln!(
        dest,
        "
#[allow(dead_code)]
#[inline(never)]
fn missing_fn_panic() -> ! {{
    panic!(\"GL function was not loaded\")
}}"
    )
}

/// Creates the `load_with` function.
///
/// The function calls `load_with` in each module created by `write_fn_mods`, then fills the
///  address table. The table is filled by the first call only.
fn write_load_fn<W>(functions: &[&FunctionSymbol], dest: &mut W) -> io::Result<()>
where W: io::Write {
    writeln!(
        dest,
        "
static PROC_ADDRESS_TABLE: __gl_imports::OnceLock<__gl_imports::rt::ProcAddressTable> = __gl_imports::OnceLock::new();

/// Load each GL symbol using a custom load function. This allows for the
/// use of functions like `glfwGetProcAddress` or `SDL_GL_GetProcAddress`.
/// ~~~ignore
/// gl::load_with(|s| glfw.get_proc_address(s));
/// ~~~
#[allow(dead_code)]
pub fn load_with<F>(mut loadfn: F) where F: FnMut(&'static str) -> *const __gl_imports::raw::c_void {{"
    )?;

    for function in functions {
        writeln!(dest, "    {}::load_with(&mut loadfn);", super::gen_ident(&function.name))?;
    }

    writeln!(dest, "    PROC_ADDRESS_TABLE.get_or_init(|| {{\n        let slots: Vec<(&'static str, usize)> = vec![")?;
    for function in functions {
        writeln!(dest, "            (\"{}\", {}::address()),", function.name, super::gen_ident(&function.name))?;
    }
    writeln!(dest, "        ];\n        slots.into_iter().collect()\n    }});\n}}")
}

/// Creates the `get_address_for` function, backed by the table `load_with` filled.
fn write_get_address_for<W>(dest: &mut W) -> io::Result<()>
where W: io::Write {
    writeln!(
        dest,
        r#"
/// Native address of `name`, which may be spelled with any extension suffix.
///
/// Fails if the function is unknown, statically linked, or `load_with` was never called.
#[allow(dead_code)]
pub fn get_address_for(name: &str) -> Result<usize, __gl_imports::rt::AddressNotFound> {{
    match PROC_ADDRESS_TABLE.get() {{
        Some(table) => table.address_for(name),
        None => __gl_imports::rt::ProcAddressTable::default().address_for(name),
    }}
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::GeneratorConfig,
        generators::Generator,
        pipeline::Pipeline,
        registry::{ExtensionRegistry, NativeType, SymbolTable},
    };

    fn bindings(config: GeneratorConfig) -> BindingSet {
        let mut registry = ExtensionRegistry::new();
        registry.declare("GL_VERSION_1_0", "glFinish");
        registry.declare("GL_VERSION_1_0", "glFlush");
        registry.declare("GL_VERSION_9_9", "glFoo");
        registry.declare("GL_EXT_foo", "glFooEXT");

        let functions = ["glFinish", "glFlush", "glFoo", "glFooEXT"]
            .iter()
            .map(|name| FunctionSymbol::new(*name, vec![], NativeType::void()))
            .collect();
        Pipeline::new(config).run(&SymbolTable::new(vec![], functions, Some(registry))).unwrap()
    }

    fn generate(config: GeneratorConfig) -> String {
        let mut out = Vec::new();
        ProcAddressTableGenerator.write(&bindings(config), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn one_slot_and_loader_per_function() {
        let out = generate(GeneratorConfig::default());

        assert!(out.contains("pub use glbind_runtime as rt;"));
        for ident in &["Finish", "Flush", "Foo", "FooEXT"] {
            assert!(out.contains(&format!("    pub static mut {}: FnPtr", ident)));
            assert!(out.contains(&format!("pub mod {} {{", ident)));
            assert!(out.contains(&format!("    {}::load_with(&mut loadfn);", ident)));
        }
        assert!(out.contains("    pub static mut Finish: FnPtr = FnPtr::EMPTY;"));
        assert!(out.contains("FnPtr::resolved(first_loaded(&mut loadfn, &[\"glFinish\"]))"));
        assert!(out.contains("            (\"glFooEXT\", FooEXT::address()),"));
        assert!(out.contains("pub fn get_address_for(name: &str)"));
    }

    #[test]
    fn unified_entry_points_become_fallbacks() {
        let config = GeneratorConfig { auto_unify_extensions: true, ..GeneratorConfig::default() };
        let out = generate(config);

        assert!(!out.contains("pub mod FooEXT"));
        assert!(out.contains("first_loaded(&mut loadfn, &[\"glFoo\", \"glFooEXT\"])"));
    }

    #[test]
    fn statically_linked_functions_have_no_slot() {
        let config = GeneratorConfig {
            statically_linked_functions: vec!["glFlush".to_owned()].into_iter().collect(),
            ..GeneratorConfig::default()
        };
        let out = generate(config);

        assert!(!out.contains("storage::Flush"));
        assert!(!out.contains("(\"glFlush\""));
        assert!(out.contains("storage::Finish"));
    }

    #[test]
    fn output_is_stable() {
        assert_eq!(generate(GeneratorConfig::default()), generate(GeneratorConfig::default()));
    }
}
