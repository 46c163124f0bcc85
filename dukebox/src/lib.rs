//! Reading and remapping of `.jar` files.
//!
//! The [`storage`] module gives access to jars, either from disk or in memory. Single classes are remapped with
//! [`remap::remap_class`], and whole jars with the functions in [`pipeline`].

pub mod pipeline;
pub mod remap;
pub mod storage;
