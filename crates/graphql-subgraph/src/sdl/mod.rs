//! Printing a registry as GraphQL SDL.
//!
//! [`SdlPrinter`] carries the generic printing logic as default methods. [`SchemaPrinter`] uses
//! them as they are, [`FederatedSdlPrinter`] overrides the parts that differ for a subgraph.

pub(crate) mod display_utils;
mod federated;

use std::fmt::Write;

use indexmap::IndexMap;

pub use self::federated::{FederatedSdlPrinter, FEDERATION_TYPES};
use self::display_utils::{block, comment_description, deprecated, description, implements, input_value, quoted, INDENT};
use crate::{
    entity::EntityType,
    registry::{
        EnumType, InputObjectType, InterfaceType, MetaDirective, MetaField, MetaInputValue, MetaType, ObjectType,
        Registry, ScalarType, UnionType, BUILTIN_DIRECTIVES, BUILTIN_SCALARS,
    },
    Error,
};

/// Options of a single print
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PrintOptions {
    /// Print the fields of every type ordered by name instead of by definition
    pub sort_fields: bool,
    /// Print descriptions as `#` comments instead of block strings
    pub comment_descriptions: bool,
}

/// The header of an object-like type: `extend type Name implements A @key(fields: "id")`
pub struct ObjectHeader<'a> {
    pub extend: bool,
    pub keyword: &'static str,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub interfaces: &'a [String],
    /// Directives applied to the type, already printed
    pub directives: String,
}

pub trait SdlPrinter {
    fn options(&self) -> PrintOptions;

    /// Prints every included directive and type, separated by blank lines
    fn print(&self, registry: &Registry) -> Result<String, Error> {
        let mut blocks = vec![self.print_schema_definition(registry)?];

        for directive in registry.directives.values() {
            if self.include_directive(directive) {
                blocks.push(self.print_directive(directive)?);
            }
        }

        for ty in registry.types.values() {
            if self.include_type(ty) {
                blocks.push(self.print_type(registry, ty)?);
            }
        }

        blocks.retain(|block| !block.is_empty());

        Ok(blocks.join("\n\n") + "\n")
    }

    fn include_directive(&self, directive: &MetaDirective) -> bool {
        !BUILTIN_DIRECTIVES.contains(&directive.name.as_str())
    }

    fn include_type(&self, ty: &MetaType) -> bool {
        !ty.name().starts_with("__") && !BUILTIN_SCALARS.contains(&ty.name())
    }

    fn include_field(&self, _registry: &Registry, _type_name: &str, field: &MetaField) -> bool {
        !field.name.starts_with("__")
    }

    /// `schema { ... }`, only needed when the root types don't have their usual names
    fn print_schema_definition(&self, registry: &Registry) -> Result<String, Error> {
        Ok(schema_definition(registry))
    }

    fn print_directive(&self, directive: &MetaDirective) -> Result<String, Error> {
        let mut sdl = self.print_description(directive.description.as_deref(), "", true);
        write!(sdl, "directive @{}{}", directive.name, self.print_args(&directive.args, ""))?;
        if directive.is_repeatable {
            sdl.push_str(" repeatable");
        }

        let locations = directive
            .locations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        write!(sdl, " on {}", locations.join(" | "))?;

        Ok(sdl)
    }

    fn print_type(&self, registry: &Registry, ty: &MetaType) -> Result<String, Error> {
        match ty {
            MetaType::Scalar(scalar) => self.print_scalar(scalar),
            MetaType::Object(object) => self.print_object(registry, object),
            MetaType::Entity(entity) => self.print_entity(registry, entity, false),
            MetaType::EntityRef(entity) => self.print_entity(registry, entity.as_entity(), true),
            MetaType::Interface(interface) => self.print_interface(registry, interface),
            MetaType::Union(union) => self.print_union(union),
            MetaType::Enum(enum_type) => self.print_enum(enum_type),
            MetaType::InputObject(input) => self.print_input_object(input),
        }
    }

    fn print_scalar(&self, scalar: &ScalarType) -> Result<String, Error> {
        let mut sdl = self.print_description(scalar.description.as_deref(), "", true);
        write!(sdl, "scalar {}", scalar.name)?;
        if let Some(url) = &scalar.specified_by_url {
            write!(sdl, " @specifiedBy(url: {})", quoted(url))?;
        }
        Ok(sdl)
    }

    fn print_object(&self, registry: &Registry, object: &ObjectType) -> Result<String, Error> {
        let header = ObjectHeader {
            extend: false,
            keyword: "type",
            name: &object.name,
            description: object.description.as_deref(),
            interfaces: &object.interfaces,
            directives: String::new(),
        };
        self.print_object_like(registry, header, object.fields.fields())
    }

    /// Entities are plain object types unless the printer knows about federation
    fn print_entity(&self, registry: &Registry, entity: &EntityType, _is_stub: bool) -> Result<String, Error> {
        let header = ObjectHeader {
            extend: false,
            keyword: "type",
            name: entity.name(),
            description: entity.description(),
            interfaces: entity.interfaces(),
            directives: String::new(),
        };
        self.print_object_like(registry, header, entity.fields())
    }

    fn print_interface(&self, registry: &Registry, interface: &InterfaceType) -> Result<String, Error> {
        let header = ObjectHeader {
            extend: false,
            keyword: "interface",
            name: &interface.name,
            description: interface.description.as_deref(),
            interfaces: &interface.interfaces,
            directives: String::new(),
        };
        self.print_object_like(registry, header, interface.fields.fields())
    }

    fn print_object_like(
        &self,
        registry: &Registry,
        header: ObjectHeader<'_>,
        fields: &IndexMap<String, MetaField>,
    ) -> Result<String, Error> {
        let mut sdl = self.print_description(header.description, "", true);
        if header.extend {
            sdl.push_str("extend ");
        }
        write!(
            sdl,
            "{} {}{}{}",
            header.keyword,
            header.name,
            implements(header.interfaces),
            header.directives
        )?;
        sdl.push_str(&self.print_fields(registry, header.name, fields)?);
        Ok(sdl)
    }

    fn print_union(&self, union: &UnionType) -> Result<String, Error> {
        let mut sdl = self.print_description(union.description.as_deref(), "", true);
        write!(sdl, "union {}", union.name)?;
        if !union.possible_types.is_empty() {
            write!(sdl, " = {}", union.possible_types.join(" | "))?;
        }
        Ok(sdl)
    }

    fn print_enum(&self, enum_type: &EnumType) -> Result<String, Error> {
        let values = enum_type
            .enum_values
            .values()
            .enumerate()
            .map(|(i, value)| {
                format!(
                    "{}{INDENT}{}{}",
                    self.print_description(value.description.as_deref(), INDENT, i == 0),
                    value.name,
                    deprecated(&value.deprecation)
                )
            })
            .collect::<Vec<_>>();

        let mut sdl = self.print_description(enum_type.description.as_deref(), "", true);
        write!(sdl, "enum {}{}", enum_type.name, block(&values))?;
        Ok(sdl)
    }

    fn print_input_object(&self, input: &InputObjectType) -> Result<String, Error> {
        let fields = input
            .input_fields
            .values()
            .enumerate()
            .map(|(i, field)| {
                format!(
                    "{}{INDENT}{}",
                    self.print_description(field.description.as_deref(), INDENT, i == 0),
                    input_value(field)
                )
            })
            .collect::<Vec<_>>();

        let mut sdl = self.print_description(input.description.as_deref(), "", true);
        write!(sdl, "input {}{}", input.name, block(&fields))?;
        Ok(sdl)
    }

    /// The fields of a type as a block, or nothing if none of them is included
    fn print_fields(
        &self,
        registry: &Registry,
        type_name: &str,
        fields: &IndexMap<String, MetaField>,
    ) -> Result<String, Error> {
        let mut fields = fields
            .values()
            .filter(|field| self.include_field(registry, type_name, field))
            .collect::<Vec<_>>();

        if self.options().sort_fields {
            fields.sort_by(|lhs, rhs| lhs.name.cmp(&rhs.name));
        }

        let mut lines = Vec::with_capacity(fields.len());
        let mut previous_has_description = false;

        for (i, field) in fields.into_iter().enumerate() {
            let has_description = field.description.is_some();
            if previous_has_description && !has_description {
                lines.push(String::new());
            }

            let mut line = self.print_description(field.description.as_deref(), INDENT, i == 0);
            write!(
                line,
                "{INDENT}{}{}: {}{}",
                field.name,
                self.print_args(&field.args, INDENT),
                field.ty,
                deprecated(&field.deprecation)
            )?;

            let directives = self.print_field_directives(field)?;
            if !directives.is_empty() {
                line.push(' ');
                line.push_str(&directives);
            }

            lines.push(line);
            previous_has_description = has_description;
        }

        Ok(block(&lines))
    }

    /// Directives applied to a field, space separated
    fn print_field_directives(&self, _field: &MetaField) -> Result<String, Error> {
        Ok(String::new())
    }

    /// Arguments inline, or one per line when any of them has a description
    fn print_args(&self, args: &IndexMap<String, MetaInputValue>, indentation: &str) -> String {
        if args.is_empty() {
            return String::new();
        }

        if args.values().all(|arg| arg.description.is_none()) {
            let args = args.values().map(input_value).collect::<Vec<_>>();
            return format!("({})", args.join(", "));
        }

        let arg_indentation = format!("{INDENT}{indentation}");
        let args = args
            .values()
            .enumerate()
            .map(|(i, arg)| {
                format!(
                    "{}{arg_indentation}{}",
                    self.print_description(arg.description.as_deref(), &arg_indentation, i == 0),
                    input_value(arg)
                )
            })
            .collect::<Vec<_>>();

        format!("(\n{}\n{indentation})", args.join("\n"))
    }

    fn print_description(&self, text: Option<&str>, indentation: &str, first_in_block: bool) -> String {
        match text {
            None => String::new(),
            Some(text) if self.options().comment_descriptions => {
                comment_description(text, indentation, first_in_block)
            }
            Some(text) => description(text, indentation, first_in_block),
        }
    }
}

fn schema_definition(registry: &Registry) -> String {
    if registry.query_type == "Query" && matches!(registry.mutation_type.as_deref(), None | Some("Mutation")) {
        return String::new();
    }

    let mut operations = vec![format!("{INDENT}query: {}", registry.query_type)];
    if let Some(mutation) = &registry.mutation_type {
        operations.push(format!("{INDENT}mutation: {mutation}"));
    }

    format!("schema{}", block(&operations))
}

/// Prints the whole registry, federation types and directive definitions included
#[derive(Clone, Copy, Debug, Default)]
pub struct SchemaPrinter {
    options: PrintOptions,
}

impl SchemaPrinter {
    pub fn new(options: PrintOptions) -> Self {
        SchemaPrinter { options }
    }
}

impl SdlPrinter for SchemaPrinter {
    fn options(&self) -> PrintOptions {
        self.options
    }
}
