//! Row serde descriptors and the default codec-lookup implementation.
//!
//! Records are keyed by their key field rendered as a string, so every
//! `RowSerde` pairs a string key format with the value codec that was
//! resolved for the stage.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use streamc_core::codec::CodecDescriptor;

use crate::error::{DataflowError, Result};
use crate::traits::SerdeRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyFormat {
    String,
}

/// Key/value serde pair attached to stages that read or write topics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowSerde {
    pub key: KeyFormat,
    pub value: CodecDescriptor,
}

impl RowSerde {
    pub fn new(value: CodecDescriptor) -> Self {
        Self {
            key: KeyFormat::String,
            value,
        }
    }
}

/// Registry that knows a fixed set of value formats.
#[derive(Debug, Clone)]
pub struct DefaultSerdeRegistry {
    formats: BTreeSet<&'static str>,
}

impl Default for DefaultSerdeRegistry {
    fn default() -> Self {
        Self {
            formats: ["json", "delimited", "avro"].into_iter().collect(),
        }
    }
}

impl DefaultSerdeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the registry to the given format names.
    pub fn with_formats(formats: &[&'static str]) -> Self {
        Self {
            formats: formats.iter().copied().collect(),
        }
    }

    pub fn supports(&self, format: &str) -> bool {
        self.formats.contains(format)
    }
}

impl SerdeRegistry for DefaultSerdeRegistry {
    fn row_serde(&self, codec: &CodecDescriptor) -> Result<RowSerde> {
        if !self.supports(codec.format_name()) {
            return Err(DataflowError::UnsupportedFormat(codec.format_name().to_string()));
        }
        match codec {
            CodecDescriptor::Avro { schema } if schema.trim().is_empty() => Err(
                DataflowError::InvalidCodec("avro codec without a schema reference".into()),
            ),
            CodecDescriptor::Delimited { delimiter } if *delimiter == '\n' || *delimiter == '\r' => {
                Err(DataflowError::InvalidCodec(format!(
                    "delimiter {:?} collides with the record separator",
                    delimiter
                )))
            }
            _ => Ok(RowSerde::new(codec.clone())),
        }
    }
}
