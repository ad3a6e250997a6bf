//! Lightweight value/row types shared by expressions and the reference runner.
//!
//! Streaming records are row-oriented: a `Row` is the value half of a keyed
//! record, positionally aligned with a `Schema`.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::DataType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Bin(Vec<u8>),
}

impl Scalar {
    /// Concrete type of the value; `None` for `Null`.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Scalar::Null => None,
            Scalar::Bool(_) => Some(DataType::Boolean),
            Scalar::I32(_) => Some(DataType::Int32),
            Scalar::I64(_) => Some(DataType::Int64),
            Scalar::F32(_) => Some(DataType::Float32),
            Scalar::F64(_) => Some(DataType::Float64),
            Scalar::Str(_) => Some(DataType::Utf8),
            Scalar::Bin(_) => Some(DataType::Binary),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::I32(i) => Some(*i as i64),
            Scalar::I64(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::I32(i) => Some(*i as f64),
            Scalar::I64(i) => Some(*i as f64),
            Scalar::F32(f) => Some(*f as f64),
            Scalar::F64(f) => Some(*f),
            _ => None,
        }
    }

    /// SQL-style comparison. `None` when either side is null or the types
    /// are not comparable. Integers and floats compare numerically.
    pub fn compare(&self, other: &Scalar) -> Option<Ordering> {
        use Scalar::*;
        match (self, other) {
            (Null, _) | (_, Null) => None,
            (Bool(x), Bool(y)) => Some(x.cmp(y)),
            (Str(x), Str(y)) => Some(x.cmp(y)),
            (Bin(x), Bin(y)) => Some(x.cmp(y)),
            _ => match (self.as_i64(), other.as_i64()) {
                (Some(x), Some(y)) => Some(x.cmp(&y)),
                _ => {
                    let (x, y) = (self.as_f64()?, other.as_f64()?);
                    x.partial_cmp(&y)
                }
            },
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::I32(i) => write!(f, "{}", i),
            Scalar::I64(i) => write!(f, "{}", i),
            Scalar::F32(v) => write!(f, "{}", v),
            Scalar::F64(v) => write!(f, "{}", v),
            Scalar::Str(s) => f.write_str(s),
            Scalar::Bin(b) => {
                for byte in b {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }
    }
}

/// One record value, positionally aligned with its schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    pub values: Vec<Scalar>,
}

impl Row {
    pub fn new(values: Vec<Scalar>) -> Self {
        Self { values }
    }

    /// All-null row of the given width (used for unmatched outer-join sides).
    pub fn nulls(width: usize) -> Self {
        Self {
            values: vec![Scalar::Null; width],
        }
    }

    pub fn get(&self, idx: usize) -> Option<&Scalar> {
        self.values.get(idx)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Left values followed by right values.
    pub fn concat(&self, other: &Row) -> Row {
        let mut values = Vec::with_capacity(self.len() + other.len());
        values.extend(self.values.iter().cloned());
        values.extend(other.values.iter().cloned());
        Row { values }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", v)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_compare_crosses_widths() {
        assert_eq!(Scalar::I32(3).compare(&Scalar::I64(3)), Some(Ordering::Equal));
        assert_eq!(Scalar::I64(2).compare(&Scalar::F64(2.5)), Some(Ordering::Less));
        assert_eq!(Scalar::Null.compare(&Scalar::I64(1)), None);
        assert_eq!(Scalar::Str("a".into()).compare(&Scalar::I64(1)), None);
    }

    #[test]
    fn row_display_is_comma_separated() {
        let row = Row::new(vec![Scalar::I64(1), Scalar::Str("x".into()), Scalar::Null]);
        assert_eq!(row.to_string(), "1, x, null");
    }
}
