//! Schema model: node types, edge types and their property schemas.
//!
//! These are schema-level definitions (entity types and relationship types),
//! not graph data instances. They are the records exchanged with a schema
//! store and the input of the canvas.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::{color::Color, geometry::Point, identifier::Id};

/// Errors raised while validating schema records.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("{kind} name must not be empty")]
    EmptyName { kind: &'static str },

    #[error("unknown value type `{0}`")]
    UnknownValueType(String),

    #[error("invalid color for node type `{name}`: {reason}")]
    InvalidColor { name: String, reason: String },

    #[error("property key of `{owner}` must not be empty")]
    EmptyPropertyKey { owner: String },

    #[error("duplicate property key `{key}` on `{owner}`")]
    DuplicatePropertyKey { owner: String, key: String },
}

/// The declared type of a property value.
///
/// Lists may only contain scalar types (`string`, `boolean`, `integer`,
/// `float`). Serialized using the wire names, e.g. `list<integer>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    Boolean,
    Integer,
    Float,
    List(Box<ValueType>),
    Map,
    Duration,
    Date,
    DateTime,
    Point,
}

impl ValueType {
    /// Returns `true` for the types a list may contain.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            ValueType::String | ValueType::Boolean | ValueType::Integer | ValueType::Float
        )
    }

    /// Creates a list type, rejecting non-scalar element types.
    pub fn list_of(element: ValueType) -> Result<Self, SchemaError> {
        if element.is_scalar() {
            Ok(ValueType::List(Box::new(element)))
        } else {
            Err(SchemaError::UnknownValueType(format!("list<{element}>")))
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::String => write!(f, "string"),
            ValueType::Boolean => write!(f, "boolean"),
            ValueType::Integer => write!(f, "integer"),
            ValueType::Float => write!(f, "float"),
            ValueType::List(element) => write!(f, "list<{element}>"),
            ValueType::Map => write!(f, "map"),
            ValueType::Duration => write!(f, "duration"),
            ValueType::Date => write!(f, "date"),
            ValueType::DateTime => write!(f, "datetime"),
            ValueType::Point => write!(f, "point"),
        }
    }
}

impl FromStr for ValueType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value_type = match s.trim() {
            "string" => ValueType::String,
            "boolean" => ValueType::Boolean,
            "integer" => ValueType::Integer,
            "float" => ValueType::Float,
            "map" => ValueType::Map,
            "duration" => ValueType::Duration,
            "date" => ValueType::Date,
            "datetime" => ValueType::DateTime,
            "point" => ValueType::Point,
            other => {
                let element = other
                    .strip_prefix("list<")
                    .and_then(|rest| rest.strip_suffix('>'))
                    .ok_or_else(|| SchemaError::UnknownValueType(s.to_string()))?;
                let element = element
                    .parse::<ValueType>()
                    .map_err(|_| SchemaError::UnknownValueType(s.to_string()))?;
                return ValueType::list_of(element)
                    .map_err(|_| SchemaError::UnknownValueType(s.to_string()));
            }
        };
        Ok(value_type)
    }
}

impl Serialize for ValueType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ValueType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A single declared property of a node or edge type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub key_name: String,
    pub value_type: ValueType,
}

impl PropertyDef {
    pub fn new(key_name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            key_name: key_name.into(),
            value_type,
        }
    }
}

/// A node type (entity type) as stored in the schema store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeNode {
    pub name: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_pos: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_pos: Option<f32>,
    #[serde(default)]
    pub schema: Vec<PropertyDef>,
}

impl TypeNode {
    /// Create an unpinned node type with the default color and no properties.
    pub fn new(name: impl Into<Id>) -> Self {
        Self {
            name: name.into(),
            color: None,
            x_pos: None,
            y_pos: None,
            schema: Vec::new(),
        }
    }

    /// Set the display color (builder style).
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Pin the node type at `position` (builder style).
    pub fn with_position(mut self, position: Point) -> Self {
        self.x_pos = Some(position.x());
        self.y_pos = Some(position.y());
        self
    }

    /// Add a property (builder style).
    pub fn with_property(mut self, property: PropertyDef) -> Self {
        self.schema.push(property);
        self
    }

    /// The stored position, if both coordinates are present.
    ///
    /// Non-finite coordinates are returned as-is; the layout engine decides
    /// what to do with them.
    pub fn pinned_position(&self) -> Option<Point> {
        match (self.x_pos, self.y_pos) {
            (Some(x), Some(y)) => Some(Point::new(x, y)),
            _ => None,
        }
    }

    /// The parsed display color, falling back to the default for missing or
    /// unparsable values.
    pub fn display_color(&self) -> Color {
        self.color
            .as_deref()
            .and_then(|color| Color::new(color).ok())
            .unwrap_or_default()
    }

    /// Validate name, color and property schema.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let name = self.name.as_string();
        if name.trim().is_empty() {
            return Err(SchemaError::EmptyName { kind: "node type" });
        }
        if let Some(color) = &self.color {
            Color::new(color).map_err(|reason| SchemaError::InvalidColor {
                name: name.clone(),
                reason,
            })?;
        }
        validate_properties(&name, &self.schema)
    }
}

/// An edge type (relationship type) as stored in the schema store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeEdge {
    pub name: Id,
    pub from: Id,
    pub to: Id,
    #[serde(default)]
    pub schema: Vec<PropertyDef>,
}

impl TypeEdge {
    /// Create an edge type without properties.
    pub fn new(name: impl Into<Id>, from: impl Into<Id>, to: impl Into<Id>) -> Self {
        Self {
            name: name.into(),
            from: from.into(),
            to: to.into(),
            schema: Vec::new(),
        }
    }

    /// Add a property (builder style).
    pub fn with_property(mut self, property: PropertyDef) -> Self {
        self.schema.push(property);
        self
    }

    /// Returns `true` if the edge starts and ends at the same node type.
    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }

    /// Validate names and property schema.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let name = self.name.as_string();
        if name.trim().is_empty() {
            return Err(SchemaError::EmptyName { kind: "edge type" });
        }
        if self.from.as_string().trim().is_empty() || self.to.as_string().trim().is_empty() {
            return Err(SchemaError::EmptyName {
                kind: "edge endpoint",
            });
        }
        validate_properties(&name, &self.schema)
    }
}

fn validate_properties(owner: &str, properties: &[PropertyDef]) -> Result<(), SchemaError> {
    for (idx, property) in properties.iter().enumerate() {
        if property.key_name.trim().is_empty() {
            return Err(SchemaError::EmptyPropertyKey {
                owner: owner.to_string(),
            });
        }
        if properties[..idx]
            .iter()
            .any(|other| other.key_name == property.key_name)
        {
            return Err(SchemaError::DuplicatePropertyKey {
                owner: owner.to_string(),
                key: property.key_name.clone(),
            });
        }
    }
    Ok(())
}

/// Normalizes a type name to SCREAMING_SNAKE_CASE.
///
/// Words are split on whitespace and hyphens, upper-cased and joined with `_`.
///
/// # Examples
///
/// ```
/// use schemata_core::schema::to_screaming_snake_case;
///
/// assert_eq!(to_screaming_snake_case("works at"), "WORKS_AT");
/// assert_eq!(to_screaming_snake_case("lives-in"), "LIVES_IN");
/// ```
pub fn to_screaming_snake_case(name: &str) -> String {
    name.split(|c: char| c.is_whitespace() || c == '-')
        .filter(|word| !word.is_empty())
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join("_")
}
