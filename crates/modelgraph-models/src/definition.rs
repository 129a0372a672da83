//! Declarative model metadata.
//!
//! A [`ModelDefinition`] describes one relational entity: its attributes,
//! their data types, and whether the entity should be exposed as a GraphQL
//! type. Definitions are plain data and can be deserialized from JSON or TOML:
//!
//! ```json
//! {
//!   "options": { "graphql": true },
//!   "attributes": {
//!     "id": { "type": "INTEGER", "primaryKey": true },
//!     "status": { "type": { "ENUM": { "values": ["ACTIVE", "RETIRED"] } } }
//!   }
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Column data types understood by the model layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    String,
    Text,
    Char,
    Uuid,
    Integer,
    #[serde(rename = "BIGINT")]
    BigInt,
    Float,
    Double,
    Real,
    Decimal,
    Boolean,
    Date,
    #[serde(rename = "DATEONLY")]
    DateOnly,
    Time,
    Json,
    Jsonb,
    /// A closed set of string values.
    Enum {
        /// Allowed values, in declaration order.
        values: Vec<String>,
    },
    /// A homogeneous array column.
    Array(Box<DataType>),
    /// A computed attribute with no backing column.
    Virtual,
}

impl DataType {
    /// Creates an enumerated type from its values.
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enum {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates an array type.
    #[must_use]
    pub fn array(inner: DataType) -> Self {
        Self::Array(Box::new(inner))
    }

    /// Returns the enumerated values, if this type (or the element type of an
    /// array) carries them.
    #[must_use]
    pub fn enum_values(&self) -> Option<&[String]> {
        match self {
            Self::Enum { values } => Some(values),
            Self::Array(inner) => inner.enum_values(),
            _ => None,
        }
    }

    /// Returns whether the attribute has no backing column.
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        matches!(self, Self::Virtual)
    }
}

/// A single model attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDefinition {
    /// Column data type.
    #[serde(rename = "type")]
    pub data_type: DataType,

    /// Whether the column accepts NULL. Default: true
    #[serde(default = "default_allow_null")]
    pub allow_null: bool,

    /// Whether the column is (part of) the primary key.
    #[serde(default)]
    pub primary_key: bool,

    /// Free-form column comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

fn default_allow_null() -> bool {
    true
}

impl AttributeDefinition {
    /// Creates a nullable attribute of the given type.
    #[must_use]
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            allow_null: default_allow_null(),
            primary_key: false,
            comment: None,
        }
    }

    /// Marks the attribute as NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.allow_null = false;
        self
    }

    /// Marks the attribute as primary key (implies NOT NULL).
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.allow_null = false;
        self
    }

    /// Sets the column comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Model-level options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelOptions {
    /// Opt-in marker: expose this model as a GraphQL type.
    #[serde(default, alias = "$graphql")]
    pub graphql: bool,
}

/// Declarative description of a relational model.
///
/// The model's name is the key under which the definition is registered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDefinition {
    /// Model-level options.
    #[serde(default)]
    pub options: ModelOptions,

    /// Derived models (views, projections) are never exposed.
    #[serde(default, rename = "virtual")]
    pub is_virtual: bool,

    /// Attributes in declaration order.
    #[serde(default)]
    pub attributes: IndexMap<String, AttributeDefinition>,
}

impl ModelDefinition {
    /// Creates an empty definition that is not exposed to GraphQL.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the GraphQL opt-in marker.
    #[must_use]
    pub fn graphql(mut self, enabled: bool) -> Self {
        self.options.graphql = enabled;
        self
    }

    /// Marks the model as virtual.
    #[must_use]
    pub fn virtual_model(mut self) -> Self {
        self.is_virtual = true;
        self
    }

    /// Adds an attribute, replacing any attribute of the same name.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, attribute: AttributeDefinition) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    /// Returns whether this model should be turned into a GraphQL type.
    #[must_use]
    pub fn exposes_graphql(&self) -> bool {
        self.options.graphql && !self.is_virtual
    }

    /// Iterates over attributes backed by a column.
    pub fn stored_attributes(&self) -> impl Iterator<Item = (&String, &AttributeDefinition)> {
        self.attributes
            .iter()
            .filter(|(_, attr)| !attr.data_type.is_virtual())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exposes_graphql() {
        assert!(!ModelDefinition::new().exposes_graphql());
        assert!(ModelDefinition::new().graphql(true).exposes_graphql());
        assert!(
            !ModelDefinition::new()
                .graphql(true)
                .virtual_model()
                .exposes_graphql()
        );
    }

    #[test]
    fn test_primary_key_implies_not_null() {
        let attr = AttributeDefinition::new(DataType::Integer).primary_key();
        assert!(attr.primary_key);
        assert!(!attr.allow_null);
    }

    #[test]
    fn test_enum_values() {
        let ty = DataType::enumeration(["A", "B"]);
        assert_eq!(ty.enum_values(), Some(&["A".to_string(), "B".to_string()][..]));
        assert_eq!(DataType::String.enum_values(), None);
        assert!(DataType::array(DataType::enumeration(["X"])).enum_values().is_some());
    }

    #[test]
    fn test_stored_attributes_skip_virtual() {
        let def = ModelDefinition::new()
            .attribute("id", AttributeDefinition::new(DataType::Integer))
            .attribute("label", AttributeDefinition::new(DataType::Virtual));

        let names: Vec<_> = def.stored_attributes().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["id"]);
    }

    #[test]
    fn test_deserialize_from_json() {
        let def: ModelDefinition = serde_json::from_value(serde_json::json!({
            "options": { "$graphql": true },
            "attributes": {
                "id": { "type": "INTEGER", "primaryKey": true },
                "total": { "type": "BIGINT" },
                "status": { "type": { "ENUM": { "values": ["A", "B"] } }, "allowNull": false },
                "tags": { "type": { "ARRAY": "STRING" } }
            }
        }))
        .unwrap();

        assert!(def.exposes_graphql());
        assert_eq!(def.attributes["id"].data_type, DataType::Integer);
        assert!(def.attributes["id"].primary_key);
        assert_eq!(def.attributes["total"].data_type, DataType::BigInt);
        assert!(!def.attributes["status"].allow_null);
        assert_eq!(
            def.attributes["tags"].data_type,
            DataType::array(DataType::String)
        );
    }
}
