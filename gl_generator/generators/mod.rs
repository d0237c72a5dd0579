////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2019 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

use std::{collections::HashMap, io};

use glbind_runtime::extension_names;
use indexmap::IndexSet;
use lazy_static::lazy_static;

use crate::{
    binding::{BindingType, MethodBinding},
    error::{Error, Result},
    pipeline::BindingSet,
    registry::{ConstantDefinition, FunctionSymbol, NativeType},
};

pub mod global_typed_gen;
pub mod proc_address_gen;

/// Trait for a bindings generator.
pub trait Generator {
    /// Writes the bindings of a finished pipeline run.
    fn write<W>(&self, bindings: &BindingSet, dest: &mut W) -> Result<()>
    where W: io::Write;
}

lazy_static! {
    // native scalar type -> rust type it is aliased to in the `types` module
    static ref NATIVE_SCALARS: HashMap<&'static str, &'static str> = {
        let mut map = HashMap::new();
        for &(native, rust) in &[
            ("GLenum", "u32"),
            ("GLboolean", "u8"),
            ("GLbitfield", "u32"),
            ("GLbyte", "i8"),
            ("GLubyte", "u8"),
            ("GLshort", "i16"),
            ("GLushort", "u16"),
            ("GLint", "i32"),
            ("GLuint", "u32"),
            ("GLclampx", "i32"),
            ("GLfixed", "i32"),
            ("GLsizei", "i32"),
            ("GLfloat", "f32"),
            ("GLclampf", "f32"),
            ("GLdouble", "f64"),
            ("GLclampd", "f64"),
            ("GLchar", "super::__gl_imports::raw::c_char"),
            ("GLcharARB", "super::__gl_imports::raw::c_char"),
            ("GLhalf", "u16"),
            ("GLhalfARB", "u16"),
            ("GLhalfNV", "u16"),
            ("GLintptr", "isize"),
            ("GLintptrARB", "isize"),
            ("GLsizeiptr", "isize"),
            ("GLsizeiptrARB", "isize"),
            ("GLint64", "i64"),
            ("GLint64EXT", "i64"),
            ("GLuint64", "u64"),
            ("GLuint64EXT", "u64"),
            ("GLhandleARB", "u32"),
            ("GLsync", "*const super::__gl_imports::raw::c_void"),
            ("GLeglImageOES", "*const super::__gl_imports::raw::c_void"),
            ("GLDEBUGPROC", "*const super::__gl_imports::raw::c_void"),
            ("GLDEBUGPROCARB", "*const super::__gl_imports::raw::c_void"),
            ("GLDEBUGPROCKHR", "*const super::__gl_imports::raw::c_void"),
            ("GLDEBUGPROCAMD", "*const super::__gl_imports::raw::c_void"),
            ("GLVULKANPROCNV", "*const super::__gl_imports::raw::c_void"),
            ("GLeglClientBufferEXT", "*const super::__gl_imports::raw::c_void"),
            ("GLvdpauSurfaceNV", "isize"),
            ("char", "super::__gl_imports::raw::c_char"),
            ("unsigned char", "u8"),
            ("short", "i16"),
            ("unsigned short", "u16"),
            ("int", "i32"),
            ("unsigned int", "u32"),
            ("float", "f32"),
            ("double", "f64"),
        ] {
            map.insert(native, rust);
        }
        map
    };
}

/// Rust identifier of a function or constant: the namespace prefix is dropped and identifiers that
/// would start with a digit get a leading underscore.
///
/// Example results: `"Clear"` for `glClear`, `"ARRAY_BUFFER"` for `GL_ARRAY_BUFFER`, `"_2D"` for
/// `GL_2D`.
pub fn gen_ident(name: &str) -> String {
    let stripped = extension_names::strip_namespace(name);
    if stripped.chars().next().map_or(true, |c| c.is_ascii_digit()) {
        format!("_{}", stripped)
    } else {
        stripped.to_owned()
    }
}

/// Parameter names that are Rust keywords get a trailing underscore.
pub fn gen_param_ident(name: &str) -> String {
    match name {
        "type" | "ref" | "in" | "fn" | "box" | "match" | "impl" | "mod" | "move" | "loop" | "self" | "where"
        | "use" | "priv" | "final" | "override" | "macro" | "yield" | "async" | "await" | "dyn" => {
            format!("{}_", name)
        },
        _ => name.to_owned(),
    }
}

/// The `types` alias of a constant, picked from its value.
pub fn constant_type(value: i128) -> &'static str {
    if value >= 0 && value <= i128::from(u32::MAX) {
        "GLenum"
    } else if value < 0 && value >= i128::from(i32::MIN) {
        "GLint"
    } else if value > 0 && value <= i128::from(u64::MAX) {
        "GLuint64"
    } else {
        "GLint64"
    }
}

/// This function generates a `const name: type = value;` item.
pub fn gen_constant_item<W>(constant: &ConstantDefinition, types_prefix: &str, dest: &mut W) -> io::Result<()>
where W: io::Write {
    let value = if constant.value < 0 { constant.value.to_string() } else { format!("0x{:X}", constant.value) };
    writeln!(
        dest,
        "#[allow(dead_code, non_upper_case_globals)] pub const {ident}: {types_prefix}{ty} = {value};",
        ident = gen_ident(&constant.name),
        types_prefix = types_prefix,
        ty = constant_type(constant.value),
        value = value,
    )
}

fn is_void(base: &str) -> bool {
    base == "void" || base == "GLvoid"
}

/// True for pointers to types the `types` module has no alias for, such as `struct _cl_context *`.
/// Those are passed around as `c_void` pointers.
pub(crate) fn is_opaque_pointer(ty: &NativeType) -> bool {
    ty.pointer_depth > 0 && !is_void(&ty.base) && !NATIVE_SCALARS.contains_key(ty.base.as_str())
}

fn check_scalar(symbol: &str, ty: &NativeType) -> Result<()> {
    if is_void(&ty.base) || is_opaque_pointer(ty) || NATIVE_SCALARS.contains_key(ty.base.as_str()) {
        Ok(())
    } else {
        Err(Error::UnknownNativeType { symbol: symbol.to_owned(), ty: ty.base.clone() })
    }
}

/// Native scalars referenced by the constants and functions of `bindings`, in first-use order.
pub fn referenced_scalars(bindings: &BindingSet) -> Result<IndexSet<&str>> {
    let mut scalars = IndexSet::new();
    for constant in bindings.constants() {
        scalars.insert(constant_type(constant.value));
    }
    for function in bindings.functions() {
        let types = function.params.iter().map(|p| &p.ty).chain(Some(&function.return_type));
        for ty in types {
            check_scalar(&function.name, ty)?;
            if is_opaque_pointer(ty) {
                debug!("{}: passing `{}` as a void pointer", function.name, ty);
            } else if !is_void(&ty.base) {
                scalars.insert(ty.base.as_str());
            }
        }
    }
    Ok(scalars)
}

/// Generates the type aliases of the `types` module.
///
/// Only the scalars actually referenced are aliased, so that the module stays small for bindings
/// of a handful of functions.
pub fn gen_types<W>(scalars: &IndexSet<&str>, dest: &mut W) -> io::Result<()>
where W: io::Write {
    for scalar in scalars {
        if let Some(rust) = NATIVE_SCALARS.get(*scalar) {
            writeln!(dest, "    pub type {} = {};", scalar.replace(' ', "_"), rust)?;
        }
    }
    Ok(())
}

/// Rust spelling of a native type, as used in `extern "system"` signatures.
pub fn gen_native_type(ty: &NativeType) -> String {
    let base = if is_void(&ty.base) || is_opaque_pointer(ty) {
        if ty.pointer_depth == 0 {
            return "()".to_owned();
        }
        "__gl_imports::raw::c_void".to_owned()
    } else {
        format!("types::{}", ty.base.replace(' ', "_"))
    };
    let pointer = if ty.is_const { "*const " } else { "*mut " };
    format!("{}{}", pointer.repeat(ty.pointer_depth as usize), base)
}

/// Rust spelling of a binding argument type, as seen by callers.
pub fn gen_binding_type(arg_native: &NativeType, ty: &BindingType) -> String {
    let pointer = if arg_native.is_const { "*const" } else { "*mut" };
    match ty {
        BindingType::Scalar(_) | BindingType::RawPointer(_) => gen_native_type(arg_native),
        BindingType::Buffer { element: None, .. } => format!("{} __gl_imports::raw::c_void", pointer),
        BindingType::Buffer { element: Some(element), .. } => format!("{} types::{}", pointer, element.replace(' ', "_")),
        BindingType::Array { element, mutable: false } => format!("&[types::{}]", element.replace(' ', "_")),
        BindingType::Array { element, mutable: true } => format!("&mut [types::{}]", element.replace(' ', "_")),
        BindingType::CString => "&__gl_imports::CStr".to_owned(),
        BindingType::BufferOffset => "isize".to_owned(),
    }
}

/// Expression converting a binding argument into the native argument.
fn gen_conversion(ident: &str, arg_native: &NativeType, ty: &BindingType) -> String {
    let pointer = if arg_native.is_const { "*const _" } else { "*mut _" };
    match ty {
        BindingType::Array { mutable: false, .. } => format!("{}.as_ptr()", ident),
        BindingType::Array { mutable: true, .. } => format!("{}.as_mut_ptr()", ident),
        BindingType::CString => format!("{}.as_ptr() as *const _", ident),
        BindingType::BufferOffset => format!("{} as {}", ident, pointer),
        _ => ident.to_owned(),
    }
}

/// Generates the list of Rust `Arg`s that a binding requires.
pub fn gen_parameters(binding: &MethodBinding, with_idents: bool, with_types: bool) -> Vec<String> {
    binding
        .args
        .iter()
        .map(|arg| {
            let ident = gen_param_ident(&arg.name);
            if with_idents && with_types {
                format!("{}: {}", ident, gen_binding_type(&arg.native, &arg.ty))
            } else if with_types {
                gen_binding_type(&arg.native, &arg.ty)
            } else {
                gen_conversion(&ident, &arg.native, &arg.ty)
            }
        })
        .collect()
}

/// Native parameter list of a function, `name: type` or types only.
pub fn gen_native_parameters(function: &FunctionSymbol, with_idents: bool) -> Vec<String> {
    function
        .params
        .iter()
        .map(|param| {
            if with_idents {
                format!("{}: {}", gen_param_ident(&param.name), gen_native_type(&param.ty))
            } else {
                gen_native_type(&param.ty)
            }
        })
        .collect()
}

/// ` -> T` for functions returning a value, nothing for `void`.
pub fn gen_return_suffix(ty: &NativeType) -> String {
    if is_void(&ty.base) && ty.pointer_depth == 0 {
        String::new()
    } else {
        format!(" -> {}", gen_native_type(ty))
    }
}
