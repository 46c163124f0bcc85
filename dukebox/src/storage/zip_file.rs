use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use anyhow::{anyhow, Context, Result};
use zip::ZipArchive;
use crate::storage::Jar;

/// A jar on disk. The file is opened again for every [`Jar::open`], so both phases of remapping see the same content.
#[derive(Debug)]
pub struct FileJar {
	pub path: PathBuf,
}

impl FileJar {
	pub fn new(path: impl Into<PathBuf>) -> FileJar {
		FileJar { path: path.into() }
	}
}

impl Jar for FileJar {
	type Opened<'a> = ZipArchive<BufReader<File>> where Self: 'a;

	fn open(&self) -> Result<Self::Opened<'_>> {
		let file = File::open(&self.path)
			.with_context(|| anyhow!("could not open jar {:?}", self.path))?;
		ZipArchive::new(BufReader::new(file))
			.with_context(|| anyhow!("{:?} is not a valid zip archive", self.path))
	}
}
