//! Codec descriptors: *which* wire format a node's rows use.
//!
//! The compiler only selects and attaches descriptors; encoding/decoding is
//! owned by the serialization subsystem behind `SerdeRegistry`
//! (see `streamc-dataflow`).

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum CodecDescriptor {
    Json,
    Delimited {
        #[serde(default = "default_delimiter")]
        delimiter: char,
    },
    Avro {
        /// Path or registry subject of the Avro schema.
        schema: String,
    },
}

fn default_delimiter() -> char {
    ','
}

impl CodecDescriptor {
    pub fn delimited() -> Self {
        CodecDescriptor::Delimited {
            delimiter: default_delimiter(),
        }
    }

    /// Short format identifier (`json`, `delimited`, `avro`).
    pub fn format_name(&self) -> &'static str {
        match self {
            CodecDescriptor::Json => "json",
            CodecDescriptor::Delimited { .. } => "delimited",
            CodecDescriptor::Avro { .. } => "avro",
        }
    }
}

impl fmt::Display for CodecDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecDescriptor::Json => f.write_str("JSON"),
            CodecDescriptor::Delimited { delimiter } => write!(f, "DELIMITED({:?})", delimiter),
            CodecDescriptor::Avro { schema } => write!(f, "AVRO({})", schema),
        }
    }
}
