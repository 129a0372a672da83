//! GraphQL type derivation from model metadata.
//!
//! Attribute types map onto GraphQL as follows:
//!
//! | Data type                                   | GraphQL                       |
//! |---------------------------------------------|-------------------------------|
//! | `STRING`, `TEXT`, `CHAR`, `UUID`, `BIGINT`, `DATEONLY`, `TIME` | `String` |
//! | `INTEGER`                                   | `Int`                         |
//! | `FLOAT`, `DOUBLE`, `REAL`, `DECIMAL`        | `Float`                       |
//! | `BOOLEAN`                                   | `Boolean`                     |
//! | `DATE`                                      | `Date` (custom scalar)        |
//! | `JSON`, `JSONB`                             | `JSON` (custom scalar)        |
//! | `ENUM`                                      | `<Model><Attribute>EnumType`  |
//! | `ARRAY(t)`                                  | `[t]`                         |
//!
//! Attributes that are NOT NULL, and primary keys, get a `!`. Virtual
//! attributes have no column and are left out.

use indexmap::{IndexMap, IndexSet};
use modelgraph_models::{AttributeDefinition, DataType, ModelDefinition};

use crate::schema::quote_string;

/// Custom scalar used for `DATE` attributes.
pub const DATE_SCALAR: &str = "Date";

/// Custom scalar used for `JSON` / `JSONB` attributes.
pub const JSON_SCALAR: &str = "JSON";

/// A GraphQL field derived from a model attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedField {
    /// Named type at the core of the field type (`WidgetStatusEnumType`).
    pub type_name: String,
    /// Full SDL type (`[String]!`).
    pub type_ref: String,
    /// Description taken from the attribute comment.
    pub description: Option<String>,
    /// Sanitised values when the field type is a derived enum.
    pub enum_values: Option<Vec<String>>,
}

/// Computes the GraphQL field set of a model, in attribute order.
#[must_use]
pub fn attribute_fields(model_name: &str, definition: &ModelDefinition) -> IndexMap<String, DerivedField> {
    definition
        .stored_attributes()
        .map(|(name, attribute)| (name.clone(), derive_field(model_name, name, attribute)))
        .collect()
}

fn derive_field(model_name: &str, attribute_name: &str, attribute: &AttributeDefinition) -> DerivedField {
    let enum_values = attribute
        .data_type
        .enum_values()
        .filter(|values| !values.is_empty())
        .map(|values| values.iter().map(|v| sanitize_enum_value(v)).collect::<Vec<_>>());

    let type_name = match enum_values {
        Some(_) => enum_type_name(model_name, attribute_name),
        None => named_type(&attribute.data_type).to_string(),
    };

    let mut type_ref = wrap_lists(&attribute.data_type, &type_name);
    if !attribute.allow_null || attribute.primary_key {
        type_ref.push('!');
    }

    DerivedField {
        type_name,
        type_ref,
        description: attribute.comment.clone(),
        enum_values,
    }
}

fn named_type(data_type: &DataType) -> &'static str {
    match data_type {
        DataType::Integer => "Int",
        DataType::Float | DataType::Double | DataType::Real | DataType::Decimal => "Float",
        DataType::Boolean => "Boolean",
        DataType::Date => DATE_SCALAR,
        DataType::Json | DataType::Jsonb => JSON_SCALAR,
        DataType::Array(inner) => named_type(inner),
        DataType::String
        | DataType::Text
        | DataType::Char
        | DataType::Uuid
        | DataType::BigInt
        | DataType::DateOnly
        | DataType::Time
        | DataType::Enum { .. }
        | DataType::Virtual => "String",
    }
}

fn wrap_lists(data_type: &DataType, type_name: &str) -> String {
    match data_type {
        DataType::Array(inner) => format!("[{}]", wrap_lists(inner, type_name)),
        _ => type_name.to_string(),
    }
}

/// Name of the enum type derived for `model.attribute`.
#[must_use]
pub fn enum_type_name(model_name: &str, attribute_name: &str) -> String {
    let mut chars = attribute_name.chars();
    let capitalized: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    format!("{model_name}{capitalized}EnumType")
}

/// Turns an arbitrary enum value into a valid GraphQL name.
///
/// Characters outside `[A-Za-z0-9_]` become `_`; a leading digit (or an empty
/// value) gets a `_` prefix.
#[must_use]
pub fn sanitize_enum_value(value: &str) -> String {
    let mut sanitized: String = value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if sanitized.is_empty() || sanitized.starts_with(|c: char| c.is_ascii_digit()) {
        sanitized.insert(0, '_');
    }
    sanitized
}

/// Builds the SDL fragments for one model: custom scalars it uses, one `enum`
/// per enumerated attribute, then the model `type`.
///
/// Returns an empty vector for models that do not opt in or are virtual.
#[must_use]
pub fn model_fragments(model_name: &str, definition: &ModelDefinition) -> Vec<String> {
    if !definition.exposes_graphql() {
        return Vec::new();
    }

    let fields = attribute_fields(model_name, definition);
    let mut fragments = Vec::new();

    let scalars: IndexSet<&str> = fields
        .values()
        .map(|field| field.type_name.as_str())
        .filter(|name| *name == DATE_SCALAR || *name == JSON_SCALAR)
        .collect();
    for scalar in scalars {
        fragments.push(format!("scalar {scalar}"));
    }

    for field in fields.values() {
        if let Some(values) = &field.enum_values {
            fragments.push(format!(
                "enum {} {{\n  {}\n}}",
                field.type_name,
                values.join("\n  ")
            ));
        }
    }

    let lines: Vec<String> = fields
        .iter()
        .map(|(name, field)| match &field.description {
            Some(description) => {
                format!("{}\n  {name}: {}", quote_string(description), field.type_ref)
            }
            None => format!("{name}: {}", field.type_ref),
        })
        .collect();
    fragments.push(format!("type {model_name} {{\n  {}\n}}", lines.join("\n  ")));

    fragments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> ModelDefinition {
        ModelDefinition::new()
            .graphql(true)
            .attribute("id", AttributeDefinition::new(DataType::Integer).primary_key())
            .attribute("name", AttributeDefinition::new(DataType::String).not_null())
            .attribute("status", AttributeDefinition::new(DataType::enumeration(["A", "B"])))
            .attribute("weight", AttributeDefinition::new(DataType::Decimal))
            .attribute("tags", AttributeDefinition::new(DataType::array(DataType::Text)))
            .attribute("label", AttributeDefinition::new(DataType::Virtual))
    }

    #[test]
    fn test_attribute_fields() {
        let fields = attribute_fields("Widget", &widget());

        let types: Vec<_> = fields
            .iter()
            .map(|(k, f)| (k.as_str(), f.type_ref.as_str()))
            .collect();
        assert_eq!(
            types,
            vec![
                ("id", "Int!"),
                ("name", "String!"),
                ("status", "WidgetStatusEnumType"),
                ("weight", "Float"),
                ("tags", "[String]"),
            ]
        );
        assert_eq!(
            fields["status"].enum_values,
            Some(vec!["A".to_string(), "B".to_string()])
        );
    }

    #[test]
    fn test_model_fragments() {
        let fragments = model_fragments("Widget", &widget());

        assert_eq!(
            fragments,
            vec![
                "enum WidgetStatusEnumType {\n  A\n  B\n}".to_string(),
                "type Widget {\n  id: Int!\n  name: String!\n  status: WidgetStatusEnumType\n  weight: Float\n  tags: [String]\n}"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_skipped_models() {
        assert!(model_fragments("Widget", &widget().graphql(false)).is_empty());
        assert!(model_fragments("Widget", &widget().virtual_model()).is_empty());
    }

    #[test]
    fn test_custom_scalars_emitted_once() {
        let def = ModelDefinition::new()
            .graphql(true)
            .attribute("createdAt", AttributeDefinition::new(DataType::Date))
            .attribute("updatedAt", AttributeDefinition::new(DataType::Date))
            .attribute("meta", AttributeDefinition::new(DataType::Jsonb));

        let fragments = model_fragments("Event", &def);
        assert_eq!(fragments[0], "scalar Date");
        assert_eq!(fragments[1], "scalar JSON");
        assert!(fragments[2].starts_with("type Event {"));
    }

    #[test]
    fn test_description_from_comment() {
        let def = ModelDefinition::new().graphql(true).attribute(
            "sku",
            AttributeDefinition::new(DataType::String).comment("Stock keeping unit"),
        );

        let fragments = model_fragments("Item", &def);
        assert_eq!(
            fragments,
            vec!["type Item {\n  \"Stock keeping unit\"\n  sku: String\n}".to_string()]
        );
    }

    #[test]
    fn test_sanitize_enum_value() {
        assert_eq!(sanitize_enum_value("in progress"), "in_progress");
        assert_eq!(sanitize_enum_value("2fa"), "_2fa");
        assert_eq!(sanitize_enum_value(""), "_");
        assert_eq!(sanitize_enum_value("DONE"), "DONE");
    }

    #[test]
    fn test_enum_type_name() {
        assert_eq!(enum_type_name("Order", "state"), "OrderStateEnumType");
    }

    #[test]
    fn test_empty_enum_falls_back_to_string() {
        let def = ModelDefinition::new().graphql(true).attribute(
            "kind",
            AttributeDefinition::new(DataType::enumeration(Vec::<String>::new())),
        );
        let fields = attribute_fields("Thing", &def);
        assert_eq!(fields["kind"].type_ref, "String");
        assert!(fields["kind"].enum_values.is_none());
    }
}
