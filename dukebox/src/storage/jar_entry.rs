use std::fmt::{Debug, Formatter};
use anyhow::Result;
use crate::storage::BasicFileAttributes;

pub trait JarEntry {
	fn name(&self) -> &str;

	fn attrs(&self) -> BasicFileAttributes;

	/// Reads the contents of the entry.
	fn to_jar_entry_enum(self) -> Result<JarEntryEnum>;
}

/// The data of an entry of a jar.
///
/// The [`Debug`] implementation doesn't try to print the contents.
pub enum JarEntryEnum {
	Dir,
	Class(Vec<u8>),
	Other(Vec<u8>),
}

/// [`Debug`] only prints the type and size, not the contents.
impl Debug for JarEntryEnum {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			JarEntryEnum::Dir => write!(f, "Dir"),
			JarEntryEnum::Class(data) => write!(f, "Class({} bytes)", data.len()),
			JarEntryEnum::Other(data) => write!(f, "Other({} bytes)", data.len()),
		}
	}
}
