use std::io::{Seek, Write};
use anyhow::{anyhow, Context, Result};
use log::debug;
use quill::hierarchy::{ClassLink, HierarchyPool};
use quill::tree::names::InternalName;
use zip::ZipWriter;
use crate::storage::{is_class, JarEntry, JarEntryEnum};

/// Represents an opened jar.
///
/// Each opened jar has an [`EntryKey`][OpenedJar::EntryKey] type (most implementations use `usize`)
/// that's used for uniquely identifying each entry. You can retrieve an iterator over these entry
/// keys with [`entry_keys`][OpenedJar::entry_keys], and use the entry key to get a [`JarEntry`] with
/// the [`by_entry_key`][OpenedJar::by_entry_key] method.
///
/// The [`names`][OpenedJar::names] method gives the names of all entries, together with the keys.
pub trait OpenedJar {
	type EntryKey: Copy;
	type EntryKeyIter: Iterator<Item=Self::EntryKey>;

	type Entry<'a>: JarEntry where Self: 'a;

	fn entry_keys(&self) -> Self::EntryKeyIter;

	fn by_entry_key(&mut self, key: Self::EntryKey) -> Result<Self::Entry<'_>>;

	fn names(&self) -> impl Iterator<Item=(Self::EntryKey, &'_ str)>;

	/// Copies the entry into the writer, without decompressing it. Name and attributes are kept.
	fn copy_raw_into<W: Write + Seek>(&mut self, key: Self::EntryKey, writer: &mut ZipWriter<W>) -> Result<()>;

	/// Reads the direct parents of all classes in this jar.
	///
	/// This only reads the start of each class file.
	fn hierarchy(&mut self) -> Result<HierarchyPool> {
		let mut pool = HierarchyPool::new();

		for key in self.entry_keys() {
			let entry = self.by_entry_key(key)?;
			if !is_class(entry.name()) {
				continue;
			}
			let name = entry.name().to_owned();

			if let JarEntryEnum::Class(data) = entry.to_jar_entry_enum()? {
				let header = raw_class_file::read_header(&data)
					.with_context(|| anyhow!("failed to read class header of entry {name:?}"))?;

				let link = ClassLink {
					name: header.name.try_into()?,
					super_class: header.super_class.map(InternalName::try_from).transpose()?,
					interfaces: header.interfaces.into_iter()
						.map(InternalName::try_from)
						.collect::<Result<_>>()?,
				};
				pool.insert(link);
			}
		}

		debug!("read the hierarchy of {} classes", pool.len());
		Ok(pool)
	}
}
