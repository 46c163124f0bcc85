use std::io::{Read, Seek, Write};
use std::ops::Range;
use anyhow::{anyhow, Context, Result};
use log::info;
use zip::read::ZipFile;
use zip::{ZipArchive, ZipWriter};
use crate::storage::{is_class, BasicFileAttributes, JarEntry, JarEntryEnum, OpenedJar};

impl<R: Read + Seek> OpenedJar for ZipArchive<R> {
	type EntryKey = usize;
	type EntryKeyIter = Range<usize>;

	type Entry<'a> = ZipFile<'a> where Self: 'a;

	fn entry_keys(&self) -> Self::EntryKeyIter {
		0..self.len()
	}

	fn by_entry_key(&mut self, key: Self::EntryKey) -> Result<Self::Entry<'_>> {
		self.by_index(key)
			.with_context(|| anyhow!("failed to get entry {key} of zip archive"))
	}

	fn names(&self) -> impl Iterator<Item=(Self::EntryKey, &'_ str)> {
		(0..self.len()).filter_map(move |x| Some((x, self.name_for_index(x)?)))
	}

	fn copy_raw_into<W: Write + Seek>(&mut self, key: Self::EntryKey, writer: &mut ZipWriter<W>) -> Result<()> {
		let file = self.by_index_raw(key)
			.with_context(|| anyhow!("failed to get entry {key} of zip archive"))?;
		let name = file.name().to_owned();
		writer.raw_copy_file(file)
			.with_context(|| anyhow!("failed to copy entry {name:?}"))
	}
}

impl JarEntry for ZipFile<'_> {
	fn name(&self) -> &str {
		ZipFile::name(self)
	}

	fn attrs(&self) -> BasicFileAttributes {
		BasicFileAttributes::from_zip_file(self)
	}

	fn to_jar_entry_enum(mut self) -> Result<JarEntryEnum> {
		Ok(if self.is_dir() {
			JarEntryEnum::Dir
		} else {
			let data = {
				let capacity = self.size()
					.try_into()
					.unwrap_or_else(|x| {
						info!("size of zip file {:?} doesn't fit in usize: {x:?}", self.name());
						0
					});
				let mut data = Vec::with_capacity(capacity);
				self.read_to_end(&mut data)
					.with_context(|| anyhow!("failed to read entry {:?}", self.name()))?;
				data
			};

			if is_class(self.name()) {
				JarEntryEnum::Class(data)
			} else {
				JarEntryEnum::Other(data)
			}
		})
	}
}
