//! Logical schema types. Pure data; no codec or runtime dependency here.
//!
//! Field lookups by name come in two flavours: exact (`index_of`) and
//! case-insensitive (`index_of_ignore_case`). Key-field resolution always uses
//! the case-insensitive form, matching how upstream planners normalize names.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    Int32,
    Int64,
    Float32,
    Float64,
    Utf8,
    Binary,
}

impl DataType {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Int32 | DataType::Int64 | DataType::Float32 | DataType::Float64
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }

    /// Parse the type names accepted by the plan DSL.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "Boolean" | "bool" | "BOOLEAN" => DataType::Boolean,
            "Int32" | "i32" | "INT" | "INTEGER" => DataType::Int32,
            "Int64" | "i64" | "BIGINT" => DataType::Int64,
            "Float32" | "f32" | "FLOAT" => DataType::Float32,
            "Float64" | "f64" | "DOUBLE" => DataType::Float64,
            "Utf8" | "string" | "VARCHAR" | "STRING" => DataType::Utf8,
            "Binary" | "bytes" | "BYTES" => DataType::Binary,
            _ => return None,
        })
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataType::Boolean => "BOOLEAN",
            DataType::Int32 => "INT",
            DataType::Int64 => "BIGINT",
            DataType::Float32 => "FLOAT",
            DataType::Float64 => "DOUBLE",
            DataType::Utf8 => "VARCHAR",
            DataType::Binary => "BYTES",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
        }
    }

    /// Case-insensitive name comparison.
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Copy of this field renamed to `<alias>.<name>`.
    pub fn qualified(&self, alias: &str) -> Field {
        Field {
            name: format!("{}.{}", alias, self.name),
            data_type: self.data_type,
            nullable: self.nullable,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.data_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, idx: usize) -> Option<&Field> {
        self.fields.get(idx)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn index_of_ignore_case(&self, name: &str) -> Option<usize> {
        self.index_of(name)
            .or_else(|| self.fields.iter().position(|f| f.name_matches(name)))
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.index_of_ignore_case(name).map(|i| &self.fields[i])
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Every field renamed to `<alias>.<name>`, in order.
    pub fn qualified(&self, alias: &str) -> Schema {
        Schema::new(self.fields.iter().map(|f| f.qualified(alias)).collect())
    }

    /// Left fields followed by right fields.
    pub fn concat(&self, other: &Schema) -> Schema {
        let mut fields = Vec::with_capacity(self.len() + other.len());
        fields.extend(self.fields.iter().cloned());
        fields.extend(other.fields.iter().cloned());
        Schema::new(fields)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", field)?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Schema {
        Schema::new(vec![
            Field::new("ID", DataType::Int64, false),
            Field::new("value", DataType::Float64, true),
        ])
    }

    #[test]
    fn lookup_prefers_exact_then_ignores_case() {
        let s = sample();
        assert_eq!(s.index_of("id"), None);
        assert_eq!(s.index_of_ignore_case("id"), Some(0));
        assert_eq!(s.field_by_name("VALUE").map(|f| f.data_type), Some(DataType::Float64));
        assert!(s.field_by_name("missing").is_none());
    }

    #[test]
    fn qualify_and_concat_keep_order() {
        let left = sample().qualified("l");
        let right = Schema::new(vec![Field::new("name", DataType::Utf8, true)]).qualified("r");
        let joined = left.concat(&right);
        let names: Vec<_> = joined.names().collect();
        assert_eq!(names, vec!["l.ID", "l.value", "r.name"]);
    }
}
