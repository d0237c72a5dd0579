////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2020 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

//! Buffer object variants: for functions whose pointer argument may instead name an offset into
//! the currently bound buffer object (`glBufferData`, `glVertexPointer`, `glTexImage2D` with a
//! pixel unpack buffer, ...), an extra overload takes that offset as an integer.

use indexmap::IndexSet;

use crate::{
    binding::{BindingIds, BindingType, BindingVariant, BufferObjectBindings, MethodBinding},
    error::{Error, Result},
    registry::FunctionSymbol,
};

pub struct BufferObjectExpander<'a> {
    functions: &'a IndexSet<String>,
}

impl<'a> BufferObjectExpander<'a> {
    pub fn new(buffer_object_functions: &'a IndexSet<String>) -> BufferObjectExpander<'a> {
        BufferObjectExpander { functions: buffer_object_functions }
    }

    /// Flagged either under its exposed name or under its native entry point.
    pub fn applies_to(&self, function: &FunctionSymbol) -> bool {
        self.functions.contains(&function.name) || self.functions.contains(function.entry_point())
    }

    /// Returns `bindings` followed by one buffer object variant of each of them, recording the
    /// variants in `variants`. Functions that are not flagged are returned unchanged.
    ///
    /// Bindings taking primitive arrays have no buffer object equivalent and are skipped. A flagged
    /// function whose binding has no memory buffer argument at all is a configuration error.
    pub fn expand(
        &self,
        function: &FunctionSymbol,
        bindings: Vec<MethodBinding>,
        ids: &mut BindingIds,
        variants: &mut BufferObjectBindings,
    ) -> Result<Vec<MethodBinding>> {
        if !self.applies_to(function) {
            return Ok(bindings);
        }

        let mut expanded = Vec::with_capacity(bindings.len() * 2);
        for binding in &bindings {
            if binding.uses_primitive_arrays() {
                continue;
            }

            let buffers: Vec<usize> = binding
                .args
                .iter()
                .enumerate()
                .filter(|(_, arg)| arg.ty.is_memory_buffer())
                .map(|(index, _)| index)
                .collect();

            let (&first, rest) = match buffers.split_first() {
                Some(split) => split,
                None => return Err(Error::NoBufferObjectArgument { function: function.name.clone() }),
            };

            let mut variant =
                binding.replace_argument_type(ids, first, BindingType::BufferOffset, BindingVariant::BufferObject);
            for &index in rest {
                variant.args[index].ty = BindingType::BufferOffset;
            }

            trace!("buffer object variant of {}: {:?}", function.name, variant.argument_types());
            variants.insert(&variant);
            expanded.push(variant);
        }

        let mut result = bindings;
        result.extend(expanded);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        binding::expand_function,
        registry::{NativeType, Param},
    };

    fn function(name: &str, params: &[(&str, &str)]) -> FunctionSymbol {
        FunctionSymbol::new(
            name,
            params.iter().map(|(n, ty)| Param::new(*n, ty.parse().unwrap())).collect(),
            NativeType::void(),
        )
    }

    fn flagged(names: &[&str]) -> IndexSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn buffer_data_gets_one_offset_overload() {
        let f = function("glBufferDataARB", &[
            ("target", "GLenum"),
            ("size", "GLsizeiptrARB"),
            ("data", "const void *"),
            ("usage", "GLenum"),
        ]);
        let names = flagged(&["glBufferDataARB"]);
        let expander = BufferObjectExpander::new(&names);
        let mut ids = BindingIds::new();
        let mut variants = BufferObjectBindings::new();

        let originals = expand_function(&f, &mut ids);
        let bindings = expander.expand(&f, originals, &mut ids, &mut variants).unwrap();

        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].args[2].ty, BindingType::Buffer { element: None, mutable: false });
        assert!(!variants.contains(&bindings[0]));

        assert_eq!(bindings[1].variant, BindingVariant::BufferObject);
        assert_eq!(bindings[1].argument_types(), vec![
            &BindingType::Scalar("GLenum".to_owned()),
            &BindingType::Scalar("GLsizeiptrARB".to_owned()),
            &BindingType::BufferOffset,
            &BindingType::Scalar("GLenum".to_owned()),
        ]);
        assert!(variants.contains(&bindings[1]));
        assert_eq!(variants.len(), 1);
    }

    #[test]
    fn array_overloads_are_skipped() {
        let f = function("glBitmap", &[
            ("width", "GLsizei"),
            ("height", "GLsizei"),
            ("xorig", "GLfloat"),
            ("yorig", "GLfloat"),
            ("xmove", "GLfloat"),
            ("ymove", "GLfloat"),
            ("bitmap", "const GLubyte *"),
        ]);
        let names = flagged(&["glBitmap"]);
        let mut ids = BindingIds::new();
        let mut variants = BufferObjectBindings::new();

        let originals = expand_function(&f, &mut ids);
        assert_eq!(originals.len(), 2);
        let bindings = BufferObjectExpander::new(&names).expand(&f, originals, &mut ids, &mut variants).unwrap();

        let kinds: Vec<_> = bindings.iter().map(|b| b.variant).collect();
        assert_eq!(kinds, vec![BindingVariant::Primary, BindingVariant::Array, BindingVariant::BufferObject]);
        assert_eq!(variants.len(), 1);
    }

    #[test]
    fn every_memory_buffer_is_converted() {
        let f = function("glMultiDrawElementsish", &[("count", "const void *"), ("indices", "const void *")]);
        let names = flagged(&["glMultiDrawElementsish"]);
        let mut ids = BindingIds::new();
        let mut variants = BufferObjectBindings::new();

        let originals = expand_function(&f, &mut ids);
        let bindings = BufferObjectExpander::new(&names).expand(&f, originals, &mut ids, &mut variants).unwrap();
        assert_eq!(bindings[1].argument_types(), vec![&BindingType::BufferOffset, &BindingType::BufferOffset]);
    }

    #[test]
    fn flag_without_pointer_argument_is_fatal() {
        let f = function("glClear", &[("mask", "GLbitfield")]);
        let names = flagged(&["glClear"]);
        let mut ids = BindingIds::new();
        let mut variants = BufferObjectBindings::new();

        let originals = expand_function(&f, &mut ids);
        match BufferObjectExpander::new(&names).expand(&f, originals, &mut ids, &mut variants) {
            Err(Error::NoBufferObjectArgument { function }) => assert_eq!(function, "glClear"),
            other => panic!("expected an error, got {:?}", other),
        }
    }

    #[test]
    fn unflagged_function_is_untouched() {
        let f = function("glVertexPointer", &[("pointer", "const void *")]);
        let names = flagged(&[]);
        let mut ids = BindingIds::new();
        let mut variants = BufferObjectBindings::new();

        let originals = expand_function(&f, &mut ids);
        let bindings = BufferObjectExpander::new(&names).expand(&f, originals, &mut ids, &mut variants).unwrap();
        assert_eq!(bindings.len(), 1);
        assert!(variants.is_empty());
    }
}
