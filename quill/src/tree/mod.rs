//! The data model of mappings.

pub mod descriptor;
pub mod mappings;
pub mod names;
