use std::fmt::{Debug, Formatter};
use std::io::Cursor;
use anyhow::{anyhow, Context, Result};
use zip::ZipArchive;
use crate::storage::Jar;

/// A jar held in memory, mostly useful for tests.
#[derive(Clone)]
pub struct MemJar {
	/// Only used in error messages.
	pub name: String,
	/// The bytes of the zip archive.
	pub data: Vec<u8>,
}

impl MemJar {
	pub fn new(name: impl Into<String>, data: Vec<u8>) -> MemJar {
		MemJar { name: name.into(), data }
	}
}

impl Debug for MemJar {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "MemJar({:?}, {} bytes)", self.name, self.data.len())
	}
}

impl Jar for MemJar {
	type Opened<'a> = ZipArchive<Cursor<&'a [u8]>> where Self: 'a;

	fn open(&self) -> Result<Self::Opened<'_>> {
		ZipArchive::new(Cursor::new(self.data.as_slice()))
			.with_context(|| anyhow!("in-memory jar {self:?} is not a valid zip archive"))
	}
}
