//! Remapping of whole jars.
//!
//! This runs in two phases: first the direct parents of all classes of the input jar are collected into a
//! [`HierarchyPool`][quill::hierarchy::HierarchyPool], then every entry is written to the output, remapping the
//! classes with the help of that hierarchy.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};
use anyhow::{anyhow, bail, Context, Result};
use indexmap::IndexSet;
use java_string::JavaStr;
use log::{debug, info, warn};
use quill::tree::mappings::Mapping;
use zip::ZipWriter;
use crate::remap::{remap_class, RemappedClass};
use crate::storage::{is_class, is_dir, is_signature, FileJar, Jar, JarEntry, JarEntryEnum, OpenedJar};

const OUTPUT_SUFFIX: &str = "-remapped";
const TEMPORARY_EXTENSION: &str = "tmp";

/// What happened to the entries of a jar during remapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemapSummary {
	/// Number of remapped classes.
	pub classes: usize,
	/// Number of entries copied without changes.
	pub copied: usize,
	/// Number of entries left out, like the files of a jar signature.
	pub dropped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemapOutcome {
	Remapped {
		output: PathBuf,
		summary: RemapSummary,
	},
	/// The default output already existed, so nothing was done.
	AlreadyPresent {
		output: PathBuf,
	},
}

/// The path the remapped version of a jar is written to, if none is given: `foo.jar` gives `foo-remapped.jar`.
pub fn default_output(input: &Path) -> Result<PathBuf> {
	let stem = input.file_stem()
		.with_context(|| anyhow!("input path {input:?} has no file name"))?;

	let mut name = stem.to_owned();
	name.push(OUTPUT_SUFFIX);
	if let Some(extension) = input.extension() {
		name.push(".");
		name.push(extension);
	}
	Ok(input.with_file_name(name))
}

fn temporary_path(output: &Path) -> Result<PathBuf> {
	let name = output.file_name()
		.with_context(|| anyhow!("output path {output:?} has no file name"))?;

	let mut name = name.to_owned();
	name.push(".");
	name.push(TEMPORARY_EXTENSION);
	Ok(output.with_file_name(name))
}

/// Remaps the jar at `input` with the mapping.
///
/// If `output` is given, that file is overwritten. Otherwise the [`default_output`] is used, and if that one exists,
/// the jar is assumed to be remapped already, and [`RemapOutcome::AlreadyPresent`] is returned.
///
/// The jar is first written to a temporary file next to the output, which is then renamed. This way there's never a
/// partially written jar at the output path.
pub fn remap_jar(input: &Path, output: Option<&Path>, mapping: &Mapping) -> Result<RemapOutcome> {
	let output = match output {
		Some(output) => output.to_owned(),
		None => {
			let output = default_output(input)?;
			if output.exists() {
				info!("{output:?} already exists, skipping remapping of {input:?}");
				return Ok(RemapOutcome::AlreadyPresent { output });
			}
			output
		},
	};

	let temporary = temporary_path(&output)?;
	info!("remapping {input:?} to {output:?}");

	let result = write_remapped(&FileJar::new(input), mapping, &temporary)
		.and_then(|summary| {
			std::fs::rename(&temporary, &output)
				.with_context(|| anyhow!("failed to move {temporary:?} to {output:?}"))?;
			Ok(summary)
		});

	match result {
		Ok(summary) => {
			info!("remapped {} classes, copied {} other entries and dropped {} entries",
				summary.classes, summary.copied, summary.dropped);
			Ok(RemapOutcome::Remapped { output, summary })
		},
		Err(e) => {
			if temporary.exists() {
				if let Err(remove) = std::fs::remove_file(&temporary) {
					warn!("failed to remove temporary file {temporary:?}: {remove}");
				}
			}
			Err(e.context(anyhow!("failed to remap {input:?}")))
		},
	}
}

fn write_remapped(jar: &impl Jar, mapping: &Mapping, path: &Path) -> Result<RemapSummary> {
	let file = File::create(path)
		.with_context(|| anyhow!("failed to create file {path:?}"))?;

	let (mut writer, summary) = remap_into(jar, mapping, BufWriter::new(file))?;
	writer.flush()
		.with_context(|| anyhow!("failed to write {path:?}"))?;
	Ok(summary)
}

/// Remaps all entries of the jar, writing them as a zip archive into `writer`.
///
/// Classes are remapped and put under their new name. Files of a jar signature and directory entries are left out.
/// All other entries are copied without decompressing them.
pub fn remap_into<W: Write + Seek>(jar: &impl Jar, mapping: &Mapping, writer: W) -> Result<(W, RemapSummary)> {
	let mut opened = jar.open()?;

	let hierarchy = opened.hierarchy()
		.context("failed to read class hierarchy")?;
	info!("read the hierarchy of {} classes", hierarchy.len());

	let remapper = mapping.remapper(&hierarchy);

	let mut zip = ZipWriter::new(writer);

	let mut summary = RemapSummary::default();
	let mut written = IndexSet::new();

	let entries: Vec<_> = opened.names()
		.map(|(key, name)| (key, name.to_owned()))
		.collect();

	for (key, name) in entries {
		if is_dir(&name) {
			continue;
		}
		if is_signature(&name) {
			debug!("dropping signature file {name:?}");
			summary.dropped += 1;
			continue;
		}

		if is_class(&name) {
			let entry = opened.by_entry_key(key)?;
			let attrs = entry.attrs();
			let JarEntryEnum::Class(data) = entry.to_jar_entry_enum()? else {
				bail!("entry {name:?} was expected to be a class");
			};

			let class = remap_class(&data, &remapper)
				.with_context(|| anyhow!("failed to remap class in entry {name:?}"))?;
			let new_name = class_entry_name(&name, &class)?;
			debug!("remapped {name:?} to {new_name:?}");

			if !written.insert(new_name.clone()) {
				bail!("duplicate entry {new_name:?} in output, written for {name:?}");
			}
			zip.start_file(new_name.as_str(), attrs.to_file_options())
				.with_context(|| anyhow!("failed to start entry {new_name:?}"))?;
			zip.write_all(&class.data)
				.with_context(|| anyhow!("failed to write entry {new_name:?}"))?;

			summary.classes += 1;
		} else {
			if !written.insert(name.clone()) {
				bail!("duplicate entry {name:?} in output");
			}
			opened.copy_raw_into(key, &mut zip)?;

			summary.copied += 1;
		}
	}

	let writer = zip.finish()
		.context("failed to finish writing the zip archive")?;

	Ok((writer, summary))
}

/// The entry name of a remapped class: the part of the entry name that's the class name is replaced.
///
/// Everything in front of the class name is kept, so that classes in `META-INF/versions/<n>/` stay there.
fn class_entry_name(entry_name: &str, class: &RemappedClass) -> Result<String> {
	let old_name = utf8(&class.old_name)?;
	let new_name = utf8(&class.new_name)?;

	let prefix = entry_name.strip_suffix(".class")
		.and_then(|without_suffix| without_suffix.strip_suffix(old_name))
		.filter(|prefix| prefix.is_empty() || prefix.ends_with('/'));

	Ok(match prefix {
		Some(prefix) => format!("{prefix}{new_name}.class"),
		None => {
			warn!("entry name {entry_name:?} doesn't match the name of the class {old_name:?} in it");
			format!("{new_name}.class")
		},
	})
}

fn utf8(name: &JavaStr) -> Result<&str> {
	name.as_str()
		.with_context(|| anyhow!("class name {name:?} is not valid utf-8, can't be used in an entry name"))
}
