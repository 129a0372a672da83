//! Executable schema construction.
//!
//! `SchemaCompiler` turns the merged type definitions and the merged resolver
//! map into an `async_graphql::dynamic::Schema`. Every output field gets a
//! resolver: the registered one when present, otherwise the default property
//! resolver reading the field name from the parent object value.

use std::sync::Arc;

use async_graphql::dynamic::{
    Enum, EnumItem, Field, FieldFuture, FieldValue, InputObject, InputValue, Interface,
    InterfaceField, Object, ResolverContext, Scalar, Schema, SchemaBuilder, TypeRef, Union,
};
use async_graphql::{Name, Value};
use async_graphql_parser::types::{BaseType, Type};
use tracing::debug;

use super::merge::{
    FieldDef, InputValueDef, ObjectDef, TypeDef, TypeDefKind, TypeDefinitions,
    merge_type_definitions,
};
use crate::config::RegistryConfig;
use crate::context::RequestContext;
use crate::error::RegistryError;
use crate::resolvers::{ResolveInfo, ResolveParams, Resolver, ResolverMap};

/// Key an object value uses to name its concrete type when returned for an
/// interface or union field.
pub const TYPENAME_KEY: &str = "__typename";

/// Builds executable schemas.
#[derive(Debug, Clone, Default)]
pub struct SchemaCompiler {
    config: RegistryConfig,
}

/// Operation roots of a compiled schema.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Roots {
    query: String,
    mutation: Option<String>,
}

impl SchemaCompiler {
    /// Creates a compiler using `config` for root names and limits.
    #[must_use]
    pub fn new(config: RegistryConfig) -> Self {
        Self { config }
    }

    /// Merges `fragments` and `resolver_maps`, then builds the schema.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NoSchemaFragments` if `fragments` is empty and
    /// `RegistryError::Compilation` for any merge or build failure.
    pub fn compile<S: AsRef<str>>(
        &self,
        fragments: &[S],
        resolver_maps: &[ResolverMap],
    ) -> Result<Schema, RegistryError> {
        if fragments.is_empty() {
            return Err(RegistryError::NoSchemaFragments);
        }

        let definitions = merge_type_definitions(fragments)?;
        let resolvers = ResolverMap::merge(resolver_maps);
        self.build(&definitions, &resolvers)
    }

    /// Builds the schema from already merged definitions.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Compilation` if the roots are invalid, a
    /// resolver targets an unknown field, or the schema fails validation.
    pub fn build(
        &self,
        definitions: &TypeDefinitions,
        resolvers: &ResolverMap,
    ) -> Result<Schema, RegistryError> {
        let roots = self.roots(definitions)?;
        validate_resolvers(definitions, resolvers)?;

        debug!(
            query = %roots.query,
            mutation = ?roots.mutation,
            types = definitions.len(),
            resolvers = resolvers.len(),
            "Building executable schema"
        );

        let mut builder = Schema::build(&roots.query, roots.mutation.as_deref(), None);
        for ty in definitions.types() {
            builder = register_type(builder, ty, definitions, resolvers);
        }

        builder = builder
            .limit_depth(self.config.max_depth)
            .limit_complexity(self.config.max_complexity);
        if !self.config.introspection {
            builder = builder.disable_introspection();
        }

        builder
            .finish()
            .map_err(|e| RegistryError::compilation(e.to_string()))
    }

    fn roots(&self, definitions: &TypeDefinitions) -> Result<Roots, RegistryError> {
        let declared = definitions.roots();

        let subscription = declared
            .subscription
            .clone()
            .or_else(|| definitions.get("Subscription").map(|t| t.name.clone()));
        if let Some(name) = subscription {
            return Err(RegistryError::compilation(format!(
                "Subscriptions are not supported (root type \"{name}\")"
            )));
        }

        let query = declared
            .query
            .clone()
            .unwrap_or_else(|| self.config.query_type.clone());
        if !is_object(definitions, &query) {
            return Err(RegistryError::compilation(format!(
                "Query root type \"{query}\" must be defined as an object type"
            )));
        }

        let mutation = match &declared.mutation {
            Some(name) if !is_object(definitions, name) => {
                return Err(RegistryError::compilation(format!(
                    "Mutation root type \"{name}\" must be defined as an object type"
                )));
            }
            Some(name) => Some(name.clone()),
            None => is_object(definitions, &self.config.mutation_type)
                .then(|| self.config.mutation_type.clone()),
        };

        Ok(Roots { query, mutation })
    }
}

fn is_object(definitions: &TypeDefinitions, name: &str) -> bool {
    matches!(
        definitions.get(name).map(|t| &t.kind),
        Some(TypeDefKind::Object(_))
    )
}

fn validate_resolvers(
    definitions: &TypeDefinitions,
    resolvers: &ResolverMap,
) -> Result<(), RegistryError> {
    for (type_name, field, _) in resolvers.iter() {
        match definitions.get(type_name).map(|t| &t.kind) {
            Some(TypeDefKind::Object(object)) if object.fields.contains_key(field) => {}
            Some(TypeDefKind::Object(_)) => {
                return Err(RegistryError::compilation(format!(
                    "{type_name}.{field} defined in resolvers, but not in schema"
                )));
            }
            Some(_) => {
                return Err(RegistryError::compilation(format!(
                    "\"{type_name}\" defined in resolvers, but is not an object type"
                )));
            }
            None => {
                return Err(RegistryError::compilation(format!(
                    "\"{type_name}\" defined in resolvers, but not in schema"
                )));
            }
        }
    }
    Ok(())
}

fn register_type(
    builder: SchemaBuilder,
    ty: &TypeDef,
    definitions: &TypeDefinitions,
    resolvers: &ResolverMap,
) -> SchemaBuilder {
    let description = ty.description.as_deref();

    match &ty.kind {
        TypeDefKind::Scalar => {
            let mut scalar = Scalar::new(ty.name.as_str());
            if let Some(description) = description {
                scalar = scalar.description(description);
            }
            builder.register(scalar)
        }
        TypeDefKind::Object(object) => {
            builder.register(build_object(ty, object, definitions, resolvers))
        }
        TypeDefKind::Interface(object) => {
            let mut interface = Interface::new(ty.name.as_str());
            if let Some(description) = description {
                interface = interface.description(description);
            }
            for name in &object.implements {
                interface = interface.implement(name.as_str());
            }
            for (name, field) in &object.fields {
                let mut interface_field = InterfaceField::new(name.as_str(), type_ref(&field.ty));
                if let Some(description) = &field.description {
                    interface_field = interface_field.description(description.as_str());
                }
                for (arg, value) in &field.arguments {
                    interface_field = interface_field.argument(input_value(arg, value));
                }
                interface = interface.field(interface_field);
            }
            builder.register(interface)
        }
        TypeDefKind::Union(members) => {
            let mut union = Union::new(ty.name.as_str());
            if let Some(description) = description {
                union = union.description(description);
            }
            for member in members {
                union = union.possible_type(member.as_str());
            }
            builder.register(union)
        }
        TypeDefKind::Enum(values) => {
            let mut enumeration = Enum::new(ty.name.as_str());
            if let Some(description) = description {
                enumeration = enumeration.description(description);
            }
            for (value, value_description) in values {
                let mut item = EnumItem::new(value.as_str());
                if let Some(value_description) = value_description {
                    item = item.description(value_description.as_str());
                }
                enumeration = enumeration.item(item);
            }
            builder.register(enumeration)
        }
        TypeDefKind::InputObject(fields) => {
            let mut input = InputObject::new(ty.name.as_str());
            if let Some(description) = description {
                input = input.description(description);
            }
            for (name, value) in fields {
                input = input.field(input_value(name, value));
            }
            builder.register(input)
        }
    }
}

fn build_object(
    ty: &TypeDef,
    object: &ObjectDef,
    definitions: &TypeDefinitions,
    resolvers: &ResolverMap,
) -> Object {
    let mut obj = Object::new(ty.name.as_str());
    if let Some(description) = &ty.description {
        obj = obj.description(description.as_str());
    }
    for interface in &object.implements {
        obj = obj.implement(interface.as_str());
    }

    for (name, field) in &object.fields {
        let binding = Arc::new(FieldBinding {
            resolver: resolvers.get(&ty.name, name).cloned(),
            info: ResolveInfo {
                parent_type: ty.name.clone(),
                field_name: name.clone(),
                return_type: field.ty.to_string(),
                returns_list: matches!(field.ty.base, BaseType::List(_)),
            },
            shape: output_shape(&field.ty, definitions),
        });
        obj = obj.field(build_field(name, field, binding));
    }

    obj
}

fn build_field(name: &str, field: &FieldDef, binding: Arc<FieldBinding>) -> Field {
    let mut output = Field::new(name, type_ref(&field.ty), field_resolver(binding));
    if let Some(description) = &field.description {
        output = output.description(description.as_str());
    }
    for (arg, value) in &field.arguments {
        output = output.argument(input_value(arg, value));
    }
    output
}

fn input_value(name: &str, value: &InputValueDef) -> InputValue {
    let mut input = InputValue::new(name, type_ref(&value.ty));
    if let Some(description) = &value.description {
        input = input.description(description.as_str());
    }
    if let Some(default) = &value.default_value {
        input = input.default_value(default.clone());
    }
    input
}

/// Converts a parsed SDL type into a dynamic schema type reference.
fn type_ref(ty: &Type) -> TypeRef {
    let inner = match &ty.base {
        BaseType::Named(name) => TypeRef::named(name.as_str()),
        BaseType::List(item) => TypeRef::List(Box::new(type_ref(item))),
    };
    if ty.nullable {
        inner
    } else {
        TypeRef::NonNull(Box::new(inner))
    }
}

/// How a resolved value is handed back to the execution engine.
#[derive(Debug, Clone, PartialEq, Eq)]
enum OutputShape {
    Leaf,
    Enum,
    Object,
    Abstract,
    List(Box<OutputShape>),
}

fn output_shape(ty: &Type, definitions: &TypeDefinitions) -> OutputShape {
    match &ty.base {
        BaseType::List(item) => OutputShape::List(Box::new(output_shape(item, definitions))),
        BaseType::Named(name) => match definitions.get(name.as_str()).map(|t| &t.kind) {
            Some(TypeDefKind::Enum(_)) => OutputShape::Enum,
            Some(TypeDefKind::Object(_)) => OutputShape::Object,
            Some(TypeDefKind::Interface(_) | TypeDefKind::Union(_)) => OutputShape::Abstract,
            _ => OutputShape::Leaf,
        },
    }
}

struct FieldBinding {
    resolver: Option<Resolver>,
    info: ResolveInfo,
    shape: OutputShape,
}

fn field_resolver(
    binding: Arc<FieldBinding>,
) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + 'static {
    move |ctx| {
        let binding = Arc::clone(&binding);
        FieldFuture::new(async move {
            let parent = ctx.parent_value.as_value().cloned().unwrap_or(Value::Null);

            let value = match &binding.resolver {
                Some(resolver) => {
                    let context = ctx
                        .data::<RequestContext>()
                        .ok()
                        .cloned()
                        .unwrap_or_default();
                    let params = ResolveParams {
                        parent,
                        args: ctx.args.as_index_map().clone(),
                        context,
                        info: binding.info.clone(),
                    };
                    resolver.resolve(params).await?
                }
                None => property_value(&parent, &binding.info.field_name),
            };

            Ok(into_field_value(value, &binding.shape))
        })
    }
}

/// Default property resolver: reads `field` from an object parent.
fn property_value(parent: &Value, field: &str) -> Value {
    match parent {
        Value::Object(map) => map.get(field).cloned().unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

fn into_field_value(value: Value, shape: &OutputShape) -> Option<FieldValue<'static>> {
    match (shape, value) {
        (_, Value::Null) => None,
        (OutputShape::List(item), Value::List(values)) => Some(FieldValue::list(
            values
                .into_iter()
                .map(|v| into_field_value(v, item).unwrap_or(FieldValue::value(Value::Null))),
        )),
        (OutputShape::Enum, Value::String(s)) => Some(FieldValue::value(Value::Enum(Name::new(s)))),
        (OutputShape::Abstract, Value::Object(map)) => {
            let type_name = match map.get(TYPENAME_KEY) {
                Some(Value::String(name)) => Some(name.clone()),
                Some(Value::Enum(name)) => Some(name.to_string()),
                _ => None,
            };
            let field_value = FieldValue::value(Value::Object(map));
            Some(match type_name {
                Some(name) => field_value.with_type(name),
                None => field_value,
            })
        }
        (_, value) => Some(FieldValue::value(value)),
    }
}
