use zip::DateTime;
use zip::read::ZipFile;
use zip::write::{ExtendedFileOptions, FileOptions};

/// The file times of a jar entry that are carried over to the remapped entry.
///
/// Use the [`Default`] implementation for having [`None`] everywhere.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BasicFileAttributes {
	pub last_modified: Option<DateTime>,
}

impl BasicFileAttributes {
	pub(crate) fn from_zip_file(file: &ZipFile<'_>) -> BasicFileAttributes {
		BasicFileAttributes {
			last_modified: file.last_modified(),
		}
	}

	pub(crate) fn to_file_options<'k>(self) -> FileOptions<'k, ExtendedFileOptions> {
		let mut file_options = FileOptions::default();

		if let Some(last_modified) = self.last_modified {
			file_options = file_options.last_modified_time(last_modified);
		}

		file_options
	}
}
