//! Textual plan front ends.

pub mod yaml;
