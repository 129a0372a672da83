//! Type-definition merging.
//!
//! Every fragment is parsed as an SDL document; definitions sharing a name are
//! merged into one:
//!
//! - object types and interfaces: union of fields and of implemented
//!   interfaces;
//! - input types: union of fields;
//! - enums: union of values;
//! - unions: union of members;
//! - scalars: deduplicated.
//!
//! Redefining a field with the same type (and compatible arguments) is fine;
//! redefining it with another type is a conflict, as is reusing a name for a
//! different kind of type. `extend` definitions are applied after all base
//! definitions, so an extension may appear before the type it extends.
//! `schema { ... }` blocks merge their operation roots. Directive definitions
//! are accepted and ignored.

use std::fmt::Write as _;

use async_graphql_parser::types::{
    FieldDefinition, InputValueDefinition, SchemaDefinition, Type, TypeDefinition, TypeKind,
    TypeSystemDefinition,
};
use async_graphql_parser::{Positioned, parse_schema};
use async_graphql_value::ConstValue;
use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace};

use crate::error::RegistryError;

/// Scalars every schema provides.
pub const BUILTIN_SCALARS: [&str; 5] = ["String", "Int", "Float", "Boolean", "ID"];

/// An argument or input field.
#[derive(Debug, Clone, PartialEq)]
pub struct InputValueDef {
    /// Description.
    pub description: Option<String>,
    /// Declared type.
    pub ty: Type,
    /// Default value.
    pub default_value: Option<ConstValue>,
}

/// An output field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Description.
    pub description: Option<String>,
    /// Declared type.
    pub ty: Type,
    /// Arguments, in declaration order.
    pub arguments: IndexMap<String, InputValueDef>,
}

/// Fields and interfaces of an object type or interface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectDef {
    /// Implemented interfaces.
    pub implements: IndexSet<String>,
    /// Fields, in declaration order.
    pub fields: IndexMap<String, FieldDef>,
}

/// The kind-specific part of a merged type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDefKind {
    Scalar,
    Object(ObjectDef),
    Interface(ObjectDef),
    Union(IndexSet<String>),
    /// Values with their descriptions.
    Enum(IndexMap<String, Option<String>>),
    InputObject(IndexMap<String, InputValueDef>),
}

impl TypeDefKind {
    fn label(&self) -> &'static str {
        match self {
            Self::Scalar => "a scalar",
            Self::Object(_) => "an object type",
            Self::Interface(_) => "an interface",
            Self::Union(_) => "a union",
            Self::Enum(_) => "an enum",
            Self::InputObject(_) => "an input type",
        }
    }
}

/// A merged named type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    /// Type name.
    pub name: String,
    /// Description (first one seen wins).
    pub description: Option<String>,
    /// Kind-specific definition.
    pub kind: TypeDefKind,
}

/// Operation roots declared by `schema { ... }` blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootNames {
    pub query: Option<String>,
    pub mutation: Option<String>,
    pub subscription: Option<String>,
}

/// The merged type-definition document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeDefinitions {
    types: IndexMap<String, TypeDef>,
    roots: RootNames,
}

/// Parses and merges SDL fragments, in order.
///
/// # Errors
///
/// Returns `RegistryError::Compilation` on a parse error (naming the
/// fragment), a conflicting redefinition, or an extension of an undefined type.
pub fn merge_type_definitions<S: AsRef<str>>(fragments: &[S]) -> Result<TypeDefinitions, RegistryError> {
    let mut merged = TypeDefinitions::default();
    let mut extensions = Vec::new();

    for (index, fragment) in fragments.iter().enumerate() {
        let document = parse_schema(fragment.as_ref()).map_err(|e| {
            RegistryError::compilation(format!("Invalid schema fragment #{}: {e}", index + 1))
        })?;

        for definition in document.definitions {
            match definition {
                TypeSystemDefinition::Schema(schema) => merged.merge_roots(schema.node)?,
                TypeSystemDefinition::Type(ty) if ty.node.extend => extensions.push(ty.node),
                TypeSystemDefinition::Type(ty) => merged.add_type(ty.node)?,
                TypeSystemDefinition::Directive(directive) => {
                    debug!(directive = %directive.node.name.node, "Ignoring directive definition");
                }
            }
        }
    }

    for extension in extensions {
        let name = extension.name.node.to_string();
        if !merged.types.contains_key(&name) {
            return Err(RegistryError::compilation(format!(
                "Cannot extend type \"{name}\" because it is not defined"
            )));
        }
        merged.add_type(extension)?;
    }

    trace!(types = merged.types.len(), "Merged type definitions");
    Ok(merged)
}

impl TypeDefinitions {
    /// Returns the merged type named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Iterates over merged types in first-definition order.
    pub fn types(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.values()
    }

    /// Number of merged types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns whether no type was defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Operation roots declared explicitly.
    #[must_use]
    pub fn roots(&self) -> &RootNames {
        &self.roots
    }

    fn merge_roots(&mut self, schema: SchemaDefinition) -> Result<(), RegistryError> {
        let pairs = [
            ("query", schema.query, &mut self.roots.query),
            ("mutation", schema.mutation, &mut self.roots.mutation),
            ("subscription", schema.subscription, &mut self.roots.subscription),
        ];
        for (operation, incoming, current) in pairs {
            let Some(incoming) = incoming else { continue };
            let incoming = incoming.node.to_string();
            match current {
                Some(existing) if *existing != incoming => {
                    return Err(RegistryError::compilation(format!(
                        "Conflicting {operation} root types: \"{existing}\" and \"{incoming}\""
                    )));
                }
                _ => *current = Some(incoming),
            }
        }
        Ok(())
    }

    fn add_type(&mut self, definition: TypeDefinition) -> Result<(), RegistryError> {
        let name = definition.name.node.to_string();
        if BUILTIN_SCALARS.contains(&name.as_str()) {
            debug!(name = %name, "Ignoring redefinition of built-in scalar");
            return Ok(());
        }

        let incoming = TypeDef {
            name: name.clone(),
            description: definition.description.map(|d| d.node),
            kind: convert_kind(definition.kind),
        };

        let Some(existing) = self.types.get_mut(&name) else {
            self.types.insert(name, incoming);
            return Ok(());
        };

        if existing.description.is_none() {
            existing.description = incoming.description;
        }

        match (&mut existing.kind, incoming.kind) {
            (TypeDefKind::Scalar, TypeDefKind::Scalar) => {}
            (TypeDefKind::Object(current), TypeDefKind::Object(other))
            | (TypeDefKind::Interface(current), TypeDefKind::Interface(other)) => {
                current.implements.extend(other.implements);
                for (field_name, field) in other.fields {
                    merge_field(&name, current, field_name, field)?;
                }
            }
            (TypeDefKind::Union(current), TypeDefKind::Union(other)) => current.extend(other),
            (TypeDefKind::Enum(current), TypeDefKind::Enum(other)) => {
                for (value, description) in other {
                    let slot = current.entry(value).or_insert(None);
                    if slot.is_none() {
                        *slot = description;
                    }
                }
            }
            (TypeDefKind::InputObject(current), TypeDefKind::InputObject(other)) => {
                for (field_name, field) in other {
                    merge_input_value(&name, current, field_name, field)?;
                }
            }
            (current, other) => {
                return Err(RegistryError::compilation(format!(
                    "Type \"{name}\" is defined as both {} and {}",
                    current.label(),
                    other.label()
                )));
            }
        }

        Ok(())
    }

    /// Renders the merged document as SDL.
    #[must_use]
    pub fn to_sdl(&self) -> String {
        let mut blocks = Vec::with_capacity(self.types.len() + 1);

        let roots = [
            ("query", &self.roots.query),
            ("mutation", &self.roots.mutation),
            ("subscription", &self.roots.subscription),
        ];
        let declared: Vec<String> = roots
            .iter()
            .filter_map(|(op, name)| name.as_ref().map(|n| format!("  {op}: {n}")))
            .collect();
        if !declared.is_empty() {
            blocks.push(format!("schema {{\n{}\n}}", declared.join("\n")));
        }

        for ty in self.types.values() {
            let mut block = String::new();
            if let Some(description) = &ty.description {
                let _ = writeln!(block, "{}", quote_string(description));
            }
            match &ty.kind {
                TypeDefKind::Scalar => {
                    let _ = write!(block, "scalar {}", ty.name);
                }
                TypeDefKind::Object(object) => {
                    write_object(&mut block, "type", &ty.name, object);
                }
                TypeDefKind::Interface(object) => {
                    write_object(&mut block, "interface", &ty.name, object);
                }
                TypeDefKind::Union(members) => {
                    let members: Vec<&str> = members.iter().map(String::as_str).collect();
                    let _ = write!(block, "union {} = {}", ty.name, members.join(" | "));
                }
                TypeDefKind::Enum(values) => {
                    let _ = writeln!(block, "enum {} {{", ty.name);
                    for (value, description) in values {
                        if let Some(description) = description {
                            let _ = writeln!(block, "  {}", quote_string(description));
                        }
                        let _ = writeln!(block, "  {value}");
                    }
                    block.push('}');
                }
                TypeDefKind::InputObject(fields) => {
                    let _ = writeln!(block, "input {} {{", ty.name);
                    for (name, field) in fields {
                        if let Some(description) = &field.description {
                            let _ = writeln!(block, "  {}", quote_string(description));
                        }
                        let _ = writeln!(block, "  {}", input_value_sdl(name, field));
                    }
                    block.push('}');
                }
            }
            blocks.push(block);
        }

        blocks.join("\n\n")
    }
}

fn write_object(block: &mut String, keyword: &str, name: &str, object: &ObjectDef) {
    let _ = write!(block, "{keyword} {name}");
    if !object.implements.is_empty() {
        let interfaces: Vec<&str> = object.implements.iter().map(String::as_str).collect();
        let _ = write!(block, " implements {}", interfaces.join(" & "));
    }
    block.push_str(" {\n");
    for (field_name, field) in &object.fields {
        if let Some(description) = &field.description {
            let _ = writeln!(block, "  {}", quote_string(description));
        }
        let _ = write!(block, "  {field_name}");
        if !field.arguments.is_empty() {
            let args: Vec<String> = field
                .arguments
                .iter()
                .map(|(arg, value)| input_value_sdl(arg, value))
                .collect();
            let _ = write!(block, "({})", args.join(", "));
        }
        let _ = writeln!(block, ": {}", field.ty);
    }
    block.push('}');
}

fn input_value_sdl(name: &str, value: &InputValueDef) -> String {
    match &value.default_value {
        Some(default) => format!("{name}: {} = {default}", value.ty),
        None => format!("{name}: {}", value.ty),
    }
}

fn merge_field(
    owner: &str,
    object: &mut ObjectDef,
    field_name: String,
    incoming: FieldDef,
) -> Result<(), RegistryError> {
    let Some(existing) = object.fields.get_mut(&field_name) else {
        object.fields.insert(field_name, incoming);
        return Ok(());
    };

    if existing.ty != incoming.ty {
        return Err(RegistryError::compilation(format!(
            "Conflicting types for field \"{owner}.{field_name}\": {} and {}",
            existing.ty, incoming.ty
        )));
    }
    if existing.description.is_none() {
        existing.description = incoming.description;
    }

    let owner = format!("{owner}.{field_name}");
    for (arg_name, arg) in incoming.arguments {
        merge_input_value(&owner, &mut existing.arguments, arg_name, arg)?;
    }
    Ok(())
}

fn merge_input_value(
    owner: &str,
    values: &mut IndexMap<String, InputValueDef>,
    name: String,
    incoming: InputValueDef,
) -> Result<(), RegistryError> {
    let Some(existing) = values.get_mut(&name) else {
        values.insert(name, incoming);
        return Ok(());
    };

    if existing.ty != incoming.ty {
        return Err(RegistryError::compilation(format!(
            "Conflicting types for \"{owner}.{name}\": {} and {}",
            existing.ty, incoming.ty
        )));
    }
    if existing.description.is_none() {
        existing.description = incoming.description;
    }
    if existing.default_value.is_none() {
        existing.default_value = incoming.default_value;
    }
    Ok(())
}

fn convert_kind(kind: TypeKind) -> TypeDefKind {
    match kind {
        TypeKind::Scalar => TypeDefKind::Scalar,
        TypeKind::Object(object) => TypeDefKind::Object(ObjectDef {
            implements: object.implements.into_iter().map(|n| n.node.to_string()).collect(),
            fields: convert_fields(object.fields),
        }),
        TypeKind::Interface(interface) => TypeDefKind::Interface(ObjectDef {
            implements: interface
                .implements
                .into_iter()
                .map(|n| n.node.to_string())
                .collect(),
            fields: convert_fields(interface.fields),
        }),
        TypeKind::Union(union) => TypeDefKind::Union(
            union.members.into_iter().map(|n| n.node.to_string()).collect(),
        ),
        TypeKind::Enum(enumeration) => TypeDefKind::Enum(
            enumeration
                .values
                .into_iter()
                .map(|v| (v.node.value.node.to_string(), v.node.description.map(|d| d.node)))
                .collect(),
        ),
        TypeKind::InputObject(input) => TypeDefKind::InputObject(convert_input_values(input.fields)),
    }
}

fn convert_fields(fields: Vec<Positioned<FieldDefinition>>) -> IndexMap<String, FieldDef> {
    fields
        .into_iter()
        .map(|field| {
            let field = field.node;
            (
                field.name.node.to_string(),
                FieldDef {
                    description: field.description.map(|d| d.node),
                    ty: field.ty.node,
                    arguments: convert_input_values(field.arguments),
                },
            )
        })
        .collect()
}

fn convert_input_values(
    values: Vec<Positioned<InputValueDefinition>>,
) -> IndexMap<String, InputValueDef> {
    values
        .into_iter()
        .map(|value| {
            let value = value.node;
            (
                value.name.node.to_string(),
                InputValueDef {
                    description: value.description.map(|d| d.node),
                    ty: value.ty.node,
                    default_value: value.default_value.map(|d| d.node),
                },
            )
        })
        .collect()
}

/// Renders `text` as a GraphQL string literal.
#[must_use]
pub fn quote_string(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(quoted, "\\u{:04X}", c as u32);
            }
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merge(fragments: &[&str]) -> TypeDefinitions {
        merge_type_definitions(fragments).unwrap()
    }

    fn object_fields(defs: &TypeDefinitions, name: &str) -> Vec<String> {
        match &defs.get(name).unwrap().kind {
            TypeDefKind::Object(object) => object.fields.keys().cloned().collect(),
            other => panic!("{name} is {}", other.label()),
        }
    }

    #[test]
    fn test_same_type_fields_are_merged() {
        let defs = merge(&[
            "type Query { ping: String }",
            "type Query { widgets: [Widget] }\ntype Widget { id: Int! }",
        ]);

        assert_eq!(object_fields(&defs, "Query"), vec!["ping", "widgets"]);
        assert_eq!(defs.len(), 2);
    }

    #[test]
    fn test_identical_redefinition_is_fine() {
        let defs = merge(&["type Widget { id: Int! }", "type Widget { id: Int! name: String }"]);
        assert_eq!(object_fields(&defs, "Widget"), vec!["id", "name"]);
    }

    #[test]
    fn test_conflicting_field_type() {
        let err = merge_type_definitions(&["type Widget { id: Int! }", "type Widget { id: String }"])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unable to start GraphQL. Conflicting types for field \"Widget.id\": Int! and String"
        );
    }

    #[test]
    fn test_kind_conflict() {
        let err = merge_type_definitions(&["type Status { id: Int }", "enum Status { A }"]).unwrap_err();
        assert!(err.to_string().contains("both an object type and an enum"));
    }

    #[test]
    fn test_enum_values_union() {
        let defs = merge(&["enum Status { A B }", "enum Status { B C }"]);
        match &defs.get("Status").unwrap().kind {
            TypeDefKind::Enum(values) => {
                assert_eq!(values.keys().collect::<Vec<_>>(), vec!["A", "B", "C"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_extension_before_base() {
        let defs = merge(&[
            "extend type Query { version: String }",
            "type Query { ping: String }",
        ]);
        assert_eq!(object_fields(&defs, "Query"), vec!["ping", "version"]);
    }

    #[test]
    fn test_extension_without_base() {
        let err = merge_type_definitions(&["extend type Query { version: String }"]).unwrap_err();
        assert!(err.to_string().contains("Cannot extend type \"Query\""));
    }

    #[test]
    fn test_parse_error_names_fragment() {
        let err = merge_type_definitions(&["type Query { ping: String }", "type {"]).unwrap_err();
        assert!(err.to_string().contains("fragment #2"));
    }

    #[test]
    fn test_scalars_deduplicated_and_builtins_ignored() {
        let defs = merge(&["scalar Date", "scalar Date\nscalar String"]);
        assert_eq!(defs.len(), 1);
        assert!(defs.get("String").is_none());
    }

    #[test]
    fn test_schema_roots() {
        let defs = merge(&[
            "schema { query: RootQuery }\ntype RootQuery { ping: String }",
            "schema { mutation: RootMutation }\ntype RootMutation { save: Boolean }",
        ]);
        assert_eq!(defs.roots().query.as_deref(), Some("RootQuery"));
        assert_eq!(defs.roots().mutation.as_deref(), Some("RootMutation"));

        let err = merge_type_definitions(&["schema { query: A }", "schema { query: B }"]).unwrap_err();
        assert!(err.to_string().contains("Conflicting query root types"));
    }

    #[test]
    fn test_to_sdl() {
        let defs = merge(&[
            "\"A widget\" type Widget implements Node { id: ID! parts(first: Int = 10): [Part!]! }",
            "interface Node { id: ID! }\ntype Part { id: ID! }\nunion Thing = Widget | Part",
            "enum Status { A B }\ninput WidgetFilter { status: Status }",
        ]);

        let sdl = defs.to_sdl();
        assert!(sdl.contains("\"A widget\"\ntype Widget implements Node {\n  id: ID!\n  parts(first: Int = 10): [Part!]!\n}"));
        assert!(sdl.contains("union Thing = Widget | Part"));
        assert!(sdl.contains("enum Status {\n  A\n  B\n}"));
        assert!(sdl.contains("input WidgetFilter {\n  status: Status\n}"));

        // The rendered document parses back to the same definitions.
        assert_eq!(merge(&[sdl.as_str()]), defs);
    }

    #[test]
    fn test_quote_string() {
        assert_eq!(quote_string("plain"), "\"plain\"");
        assert_eq!(quote_string("a \"b\"\nc"), "\"a \\\"b\\\"\\nc\"");
    }
}
