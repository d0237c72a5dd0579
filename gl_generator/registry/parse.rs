////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2020 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

//! Reader for the subset of the Khronos registry format the generator needs: `<enums>`,
//! `<commands>`, `<feature>` and `<extension>` membership.

use std::{io, ops::Range};

use indexmap::IndexSet;
use xml::{
    attribute::OwnedAttribute,
    reader::{EventReader, XmlEvent},
};

use super::{ConstantDefinition, ExtensionRegistry, FunctionSymbol, NativeType, Param, SymbolTable};
use crate::error::{Error, Result};

pub(super) fn from_xml<R: io::Read>(src: R) -> Result<SymbolTable> {
    let mut parser = Parser::default();

    for event in EventReader::new(src) {
        match event? {
            XmlEvent::StartElement { name, attributes, .. } => parser.start(&name.local_name, &attributes)?,
            XmlEvent::EndElement { name } => parser.end(&name.local_name)?,
            XmlEvent::Characters(text) | XmlEvent::Whitespace(text) => parser.text(&text),
            _ => {},
        }
    }

    Ok(parser.finish())
}

fn attr<'a>(attributes: &'a [OwnedAttribute], key: &str) -> Option<&'a str> {
    attributes.iter().find(|a| a.name.local_name == key).map(|a| a.value.as_str())
}

fn required_attr<'a>(attributes: &'a [OwnedAttribute], element: &str, key: &str) -> Result<&'a str> {
    attr(attributes, key).ok_or_else(|| Error::SymbolTable(format!("<{}> without `{}` attribute", element, key)))
}

/// Parses decimal or hexadecimal constant values, ignoring C integer suffixes.
fn parse_value(name: &str, raw: &str) -> Result<i128> {
    let trimmed = raw.trim().trim_end_matches(|c| c == 'u' || c == 'U' || c == 'l' || c == 'L');
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let value = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => i128::from_str_radix(hex, 16),
        None => digits.parse::<i128>(),
    }
    .map_err(|_| Error::SymbolTable(format!("constant `{}` has non-numeric value `{}`", name, raw)))?;

    Ok(if negative { -value } else { value })
}

struct EnumsBlock {
    group: Option<String>,
    is_enum: bool,
}

/// Text collected inside a `<proto>` or `<param>`.
///
/// The last `<name>` is the declared identifier. Earlier ones, as in
/// `struct <name>_cl_context</name> *<name>context</name>`, are part of the type.
#[derive(Default)]
struct Declarator {
    text: String,
    name_start: Option<usize>,
    name: Option<Range<usize>>,
}

impl Declarator {
    fn open_name(&mut self) {
        self.name_start = Some(self.text.len());
    }

    fn close_name(&mut self) {
        if let Some(start) = self.name_start.take() {
            self.name = Some(start..self.text.len());
        }
    }

    fn push(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn finish(self, context: &str) -> Result<(String, NativeType)> {
        let range = match self.name {
            Some(range) if !self.text[range.clone()].trim().is_empty() => range,
            _ => return Err(Error::SymbolTable(format!("declaration without <name> in {}", context))),
        };
        let name = self.text[range.clone()].trim().to_owned();
        let ty = format!("{} {}", &self.text[..range.start], &self.text[range.end..]).parse()?;
        Ok((name, ty))
    }
}

#[derive(Default)]
struct CommandBuilder {
    proto: Option<(String, NativeType)>,
    params: Vec<Param>,
    current: Option<Declarator>,
}

#[derive(Default)]
struct Parser {
    constants: Vec<ConstantDefinition>,
    functions: Vec<FunctionSymbol>,
    seen: IndexSet<String>,
    registry: ExtensionRegistry,
    has_groups: bool,
    enums: Option<EnumsBlock>,
    command: Option<CommandBuilder>,
    /// The `<feature>` or `<extension>` currently being read.
    declaring: Option<String>,
    removing: bool,
}

impl Parser {
    fn start(&mut self, element: &str, attributes: &[OwnedAttribute]) -> Result<()> {
        if let Some(extension) = &self.declaring {
            match element {
                "remove" => self.removing = true,
                "enum" | "command" if !self.removing => {
                    self.registry.declare(extension.as_str(), required_attr(attributes, element, "name")?);
                },
                _ => {},
            }
            return Ok(());
        }

        if let Some(command) = &mut self.command {
            match element {
                "proto" | "param" => command.current = Some(Declarator::default()),
                "name" => {
                    if let Some(declarator) = &mut command.current {
                        declarator.open_name();
                    }
                },
                _ => {},
            }
            return Ok(());
        }

        match element {
            "enums" => {
                self.enums = Some(EnumsBlock {
                    group: attr(attributes, "group").map(str::to_owned),
                    is_enum: attr(attributes, "type") == Some("enum"),
                })
            },
            "enum" => {
                if let Some(block) = &self.enums {
                    let name = required_attr(attributes, element, "name")?;
                    let value = parse_value(name, required_attr(attributes, element, "value")?)?;
                    let constant = ConstantDefinition {
                        name: name.to_owned(),
                        value,
                        aliases: attr(attributes, "alias").map(str::to_owned).into_iter().collect(),
                        enum_group: attr(attributes, "group").map(str::to_owned).or_else(|| block.group.clone()),
                        is_enum: block.is_enum,
                    };
                    if self.seen.insert(constant.name.clone()) {
                        self.constants.push(constant);
                    } else {
                        debug!("ignoring redefinition of {}", name);
                    }
                }
            },
            "command" => self.command = Some(CommandBuilder::default()),
            "feature" | "extension" => {
                let name = required_attr(attributes, element, "name")?;
                self.registry.add_extension(name);
                self.declaring = Some(name.to_owned());
                self.has_groups = true;
            },
            _ => {},
        }

        Ok(())
    }

    fn end(&mut self, element: &str) -> Result<()> {
        if self.declaring.is_some() {
            match element {
                "remove" => self.removing = false,
                "feature" | "extension" => self.declaring = None,
                _ => {},
            }
            return Ok(());
        }

        match element {
            "enums" => self.enums = None,
            "name" => {
                if let Some(declarator) = self.command.as_mut().and_then(|c| c.current.as_mut()) {
                    declarator.close_name();
                }
            },
            "proto" | "param" => {
                if let Some(command) = &mut self.command {
                    let context = match &command.proto {
                        Some((name, _)) => format!("command `{}`", name),
                        None => "<command>".to_owned(),
                    };
                    let declarator = command.current.take().unwrap_or_default();
                    let (name, ty) = declarator.finish(&context)?;
                    if element == "proto" {
                        command.proto = Some((name, ty));
                    } else {
                        command.params.push(Param::new(name, ty));
                    }
                }
            },
            "command" => {
                if let Some(command) = self.command.take() {
                    let (name, return_type) =
                        command.proto.ok_or_else(|| Error::SymbolTable("<command> without <proto>".to_owned()))?;
                    if self.seen.insert(name.clone()) {
                        self.functions.push(FunctionSymbol::new(name, command.params, return_type));
                    } else {
                        debug!("ignoring redeclaration of {}", name);
                    }
                }
            },
            _ => {},
        }

        Ok(())
    }

    fn text(&mut self, text: &str) {
        if let Some(declarator) = self.command.as_mut().and_then(|c| c.current.as_mut()) {
            declarator.push(text);
        }
    }

    fn finish(self) -> SymbolTable {
        let extensions = if self.has_groups { Some(self.registry) } else { None };
        SymbolTable::new(self.constants, self.functions, extensions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY: &str = r#"
<registry>
    <enums namespace="GL" group="BufferTargetARB" type="enum">
        <enum value="0x8892" name="GL_ARRAY_BUFFER" alias="GL_ARRAY_BUFFER_ARB"/>
        <enum value="0x8892" name="GL_ARRAY_BUFFER_ARB" group="OtherGroup"/>
    </enums>
    <enums namespace="GL">
        <enum value="0xFFFFFFFFFFFFFFFF" name="GL_TIMEOUT_IGNORED" type="ull"/>
        <enum value="-1" name="GL_INVALID_INDEX_ISH"/>
    </enums>
    <commands namespace="GL">
        <command>
            <proto>void <name>glBufferData</name></proto>
            <param group="BufferTargetARB"><ptype>GLenum</ptype> <name>target</name></param>
            <param><ptype>GLsizeiptr</ptype> <name>size</name></param>
            <param len="size">const void *<name>data</name></param>
            <param><ptype>GLenum</ptype> <name>usage</name></param>
        </command>
        <command>
            <proto>const <ptype>GLubyte</ptype> *<name>glGetString</name></proto>
            <param><ptype>GLenum</ptype> <name>name</name></param>
        </command>
    </commands>
    <feature api="gl" name="GL_VERSION_1_5" number="1.5">
        <require>
            <enum name="GL_ARRAY_BUFFER"/>
            <command name="glBufferData"/>
        </require>
        <remove>
            <command name="glGetString"/>
        </remove>
    </feature>
    <extensions>
        <extension name="GL_ARB_vertex_buffer_object" supported="gl">
            <require>
                <enum name="GL_ARRAY_BUFFER_ARB"/>
                <command name="glBufferDataARB"/>
            </require>
        </extension>
    </extensions>
</registry>
"#;

    #[test]
    fn reads_constants() {
        let table = from_xml(REGISTRY.as_bytes()).unwrap();

        let array_buffer = table.constant("GL_ARRAY_BUFFER").unwrap();
        assert_eq!(array_buffer.value, 0x8892);
        assert_eq!(array_buffer.aliases, vec!["GL_ARRAY_BUFFER_ARB".to_owned()]);
        assert_eq!(array_buffer.enum_group.as_deref(), Some("BufferTargetARB"));
        assert!(array_buffer.is_enum);

        assert_eq!(table.constant("GL_ARRAY_BUFFER_ARB").unwrap().enum_group.as_deref(), Some("OtherGroup"));
        assert_eq!(table.constant("GL_TIMEOUT_IGNORED").unwrap().value, 0xFFFF_FFFF_FFFF_FFFF);
        assert_eq!(table.constant("GL_INVALID_INDEX_ISH").unwrap().value, -1);
        assert!(!table.constant("GL_TIMEOUT_IGNORED").unwrap().is_enum);
    }

    #[test]
    fn reads_commands_with_native_types() {
        let table = from_xml(REGISTRY.as_bytes()).unwrap();

        let buffer_data = table.function("glBufferData").unwrap();
        let params: Vec<_> = buffer_data.params.iter().map(|p| (p.name.as_str(), p.ty.to_string())).collect();
        assert_eq!(params, vec![
            ("target", "GLenum".to_owned()),
            ("size", "GLsizeiptr".to_owned()),
            ("data", "const void *".to_owned()),
            ("usage", "GLenum".to_owned()),
        ]);
        assert!(buffer_data.return_type.is_void());

        let get_string = table.function("glGetString").unwrap();
        assert_eq!(get_string.return_type.to_string(), "const GLubyte *");
    }

    #[test]
    fn reads_membership_but_not_removals() {
        let table = from_xml(REGISTRY.as_bytes()).unwrap();
        let registry = table.extensions().unwrap();

        assert_eq!(registry.extensions().collect::<Vec<_>>(), vec!["GL_VERSION_1_5", "GL_ARB_vertex_buffer_object"]);
        assert_eq!(registry.extensions_declaring("glBufferDataARB"), &["GL_ARB_vertex_buffer_object".to_owned()]);
        assert!(!registry.is_declared("glGetString"));
    }

    #[test]
    fn registry_without_groups_has_no_metadata() {
        let table = from_xml(r#"<registry><enums><enum name="GL_ONE" value="1"/></enums></registry>"#.as_bytes())
            .unwrap();
        assert!(table.extensions().is_none());
        assert_eq!(table.constants().len(), 1);
    }

    #[test]
    fn rejects_bad_values() {
        let err = from_xml(r#"<registry><enums><enum name="GL_X" value="((EGLint)-1)"/></enums></registry>"#.as_bytes())
            .unwrap_err();
        assert!(err.to_string().contains("GL_X"), "{}", err);
    }

    #[test]
    fn only_the_last_name_declares() {
        let src = r#"
<registry>
    <commands namespace="GL">
        <command>
            <proto><ptype>GLsync</ptype> <name>glCreateSyncFromCLeventARB</name></proto>
            <param>struct <name>_cl_context</name> *<name>context</name></param>
            <param>struct <name>_cl_event</name> *<name>event</name></param>
            <param><ptype>GLbitfield</ptype> <name>flags</name></param>
        </command>
    </commands>
</registry>"#;
        let table = from_xml(src.as_bytes()).unwrap();
        let function = table.function("glCreateSyncFromCLeventARB").unwrap();

        assert_eq!(function.return_type, NativeType::scalar("GLsync"));
        let params: Vec<_> = function.params.iter().map(|p| (p.name.as_str(), p.ty.to_string())).collect();
        assert_eq!(params, vec![
            ("context", "_cl_context *".to_owned()),
            ("event", "_cl_event *".to_owned()),
            ("flags", "GLbitfield".to_owned()),
        ]);
    }

    #[test]
    fn rejects_command_without_name() {
        let src = r#"<registry><commands><command><proto>void</proto></command></commands></registry>"#;
        assert!(matches!(from_xml(src.as_bytes()), Err(Error::SymbolTable(_))));
    }
}
