//! Crate for reading mapping files, combining them and applying them to names found in class files.
//!
//! Currently this crate supports reading Tiny v1 files (see [`tiny_v1`]) and ProGuard mapping files (see
//! [`proguard`]). Both produce a [`Mapping`][tree::mappings::Mapping], mapping from one namespace into another one.
//!
//! Mappings can be inverted with [`Mapping::invert`][tree::mappings::Mapping::invert] and chained with
//! [`Mapping::combine`][tree::mappings::Mapping::combine], giving mappings between namespaces no single file maps
//! between.
//!
//! To apply a mapping, create a remapper (see [`remapper`]) with a [`HierarchyPool`][hierarchy::HierarchyPool] of the
//! classes to be remapped.

mod lines;

pub mod format;
pub mod proguard;
pub mod tiny_v1;

pub mod tree;
mod action;

pub mod hierarchy;
pub mod remapper;
