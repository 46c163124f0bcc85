//! Access to the entries of `.jar` files, either on disk or in memory.

mod file_attrs;
pub use file_attrs::BasicFileAttributes;

mod jar;
pub use jar::Jar;

mod jar_entry;
pub use jar_entry::{JarEntry, JarEntryEnum};

mod opened_jar;
pub use opened_jar::OpenedJar;

mod zip_file;
pub use zip_file::FileJar;

mod zip_impls;

mod zip_mem;
pub use zip_mem::MemJar;

const CLASS_SUFFIX: &str = ".class";

/// Suffixes of the files making up a jar signature.
const SIGNATURE_SUFFIXES: [&str; 4] = [".SF", ".RSA", ".DSA", ".EC"];

/// Checks if the entry name is the one of a class file.
pub fn is_class(name: &str) -> bool {
	name.ends_with(CLASS_SUFFIX)
}

/// Checks if the entry name is the one of a file belonging to a jar signature.
///
/// A signature is invalid after any class changes, so these files are dropped when remapping.
pub fn is_signature(name: &str) -> bool {
	SIGNATURE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Checks if the entry name is the one of a directory.
pub fn is_dir(name: &str) -> bool {
	name.ends_with('/')
}
