////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2020 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

//! Method bindings: the Rust-side signatures derived from native function declarations.

use std::collections::HashSet;

use crate::{
    generators,
    registry::{FunctionSymbol, NativeType},
};

/// Identity of a binding within one generation run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(u32);

/// Hands out [`BindingId`]s in creation order.
#[derive(Debug, Default)]
pub struct BindingIds {
    next: u32,
}

impl BindingIds {
    pub fn new() -> BindingIds {
        BindingIds::default()
    }

    pub fn next_id(&mut self) -> BindingId {
        let id = BindingId(self.next);
        self.next += 1;
        id
    }
}

/// The type of one argument as seen by users of the bindings.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum BindingType {
    /// A value passed as is, named by its native type.
    Scalar(String),
    /// A region of client memory. `element` is `None` for `void *`.
    Buffer { element: Option<String>, mutable: bool },
    /// A strongly typed array of primitives.
    Array { element: String, mutable: bool },
    /// A NUL-terminated string (`const GLchar *`).
    CString,
    /// Passed through without conversion.
    RawPointer(NativeType),
    /// An offset into the buffer object currently bound.
    BufferOffset,
}

impl BindingType {
    pub fn is_memory_buffer(&self) -> bool {
        matches!(self, BindingType::Buffer { .. })
    }

    pub fn is_array(&self) -> bool {
        matches!(self, BindingType::Array { .. })
    }
}

/// Which member of a function's overload set a binding is.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BindingVariant {
    Primary,
    /// Typed pointers taken as slices.
    Array,
    /// Memory buffers replaced by buffer object offsets.
    BufferObject,
}

impl BindingVariant {
    /// Appended to the function identifier, since Rust has no overloading.
    pub fn ident_suffix(self) -> &'static str {
        match self {
            BindingVariant::Primary => "",
            BindingVariant::Array => "_slice",
            BindingVariant::BufferObject => "_offset",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingArg {
    pub name: String,
    pub native: NativeType,
    pub ty: BindingType,
}

#[derive(Clone, Debug)]
pub struct MethodBinding {
    id: BindingId,
    /// Name of the function this binding calls.
    pub function: String,
    pub variant: BindingVariant,
    pub args: Vec<BindingArg>,
    pub return_type: NativeType,
}

impl MethodBinding {
    pub fn id(&self) -> BindingId {
        self.id
    }

    pub fn argument_types(&self) -> Vec<&BindingType> {
        self.args.iter().map(|arg| &arg.ty).collect()
    }

    pub fn uses_primitive_arrays(&self) -> bool {
        self.args.iter().any(|arg| arg.ty.is_array())
    }

    /// Returns a copy of this binding with argument `index` retyped, under a new identity.
    pub fn replace_argument_type(
        &self,
        ids: &mut BindingIds,
        index: usize,
        ty: BindingType,
        variant: BindingVariant,
    ) -> MethodBinding {
        let mut binding = self.clone();
        binding.id = ids.next_id();
        binding.variant = variant;
        binding.args[index].ty = ty;
        binding
    }
}

/// Bindings are equal when they are the same binding, not when their signatures match.
impl PartialEq for MethodBinding {
    fn eq(&self, other: &MethodBinding) -> bool {
        self.id == other.id
    }
}

impl Eq for MethodBinding {}

/// The buffer object variants created during a run.
#[derive(Debug, Default, Clone)]
pub struct BufferObjectBindings {
    ids: HashSet<BindingId>,
}

impl BufferObjectBindings {
    pub fn new() -> BufferObjectBindings {
        BufferObjectBindings::default()
    }

    pub fn insert(&mut self, binding: &MethodBinding) {
        self.ids.insert(binding.id);
    }

    pub fn contains(&self, binding: &MethodBinding) -> bool {
        self.ids.contains(&binding.id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

fn is_char(base: &str) -> bool {
    base == "GLchar" || base == "char" || base == "GLcharARB"
}

/// Type of `native` in the primary overload, and whether it is a typed pointer that gets a slice
/// in the array overload.
fn primary_type(native: &NativeType) -> (BindingType, bool) {
    match native.pointer_depth {
        0 => (BindingType::Scalar(native.base.clone()), false),
        1 if native.base == "void" || native.base == "GLvoid" || generators::is_opaque_pointer(native) => {
            (BindingType::Buffer { element: None, mutable: !native.is_const }, false)
        },
        1 if native.is_const && is_char(&native.base) => (BindingType::CString, false),
        1 => (BindingType::Buffer { element: Some(native.base.clone()), mutable: !native.is_const }, true),
        _ => (BindingType::RawPointer(native.clone()), false),
    }
}

/// Expands a function into its overload set: the primary binding, followed by a binding taking
/// slices if any argument is a typed pointer.
pub fn expand_function(function: &FunctionSymbol, ids: &mut BindingIds) -> Vec<MethodBinding> {
    let mut has_typed_pointer = false;
    let args: Vec<BindingArg> = function
        .params
        .iter()
        .map(|param| {
            let (ty, typed) = primary_type(&param.ty);
            has_typed_pointer |= typed;
            BindingArg { name: param.name.clone(), native: param.ty.clone(), ty }
        })
        .collect();

    let primary = MethodBinding {
        id: ids.next_id(),
        function: function.name.clone(),
        variant: BindingVariant::Primary,
        args,
        return_type: function.return_type.clone(),
    };

    if !has_typed_pointer {
        return vec![primary];
    }

    let mut array = primary.clone();
    array.id = ids.next_id();
    array.variant = BindingVariant::Array;
    for arg in &mut array.args {
        if let BindingType::Buffer { element: Some(element), mutable } = &arg.ty {
            arg.ty = BindingType::Array { element: element.clone(), mutable: *mutable };
        }
    }

    vec![primary, array]
}
