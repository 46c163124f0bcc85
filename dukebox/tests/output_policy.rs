use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use anyhow::Result;
use java_string::{JavaStr, JavaString};
use pretty_assertions::assert_eq;
use quill::tree::mappings::Mapping;
use raw_class_file::{flags, read_header, ClassFile};
use zip::{ZipArchive, ZipWriter};
use zip::write::SimpleFileOptions;
use dukebox::pipeline::{default_output, remap_jar, RemapOutcome, RemapSummary};

/// A fresh directory for a single test.
fn test_dir(name: &str) -> Result<PathBuf> {
	let dir = std::env::temp_dir().join(format!("dukebox-{name}-{}", std::process::id()));
	if dir.exists() {
		fs::remove_dir_all(&dir)?;
	}
	fs::create_dir_all(&dir)?;
	Ok(dir)
}

fn write_jar(path: &Path, class: &str) -> Result<()> {
	let data = ClassFile::new(52, flags::ACC_PUBLIC, JavaStr::from_str(class), Some(JavaStr::from_str("java/lang/Object")), &[])?
		.write()?;

	let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
	zip.start_file(format!("{class}.class"), SimpleFileOptions::default())?;
	zip.write_all(&data)?;
	fs::write(path, zip.finish()?.into_inner())?;
	Ok(())
}

fn class_name_in(path: &Path) -> Result<String> {
	let mut archive = ZipArchive::new(fs::File::open(path)?)?;
	let name = archive.by_index(0)?.name().to_owned();
	Ok(name)
}

fn mapping() -> Result<Mapping> {
	quill::tiny_v1::read("v1\tofficial\tnamed\nCLASS\ta\tNamed\n".as_bytes(), "named")
}

#[test]
fn default_output_is_skipped_if_present() -> Result<()> {
	let dir = test_dir("default")?;
	let input = dir.join("game.jar");
	write_jar(&input, "a")?;

	let output = dir.join("game-remapped.jar");
	assert_eq!(default_output(&input)?, output);

	let outcome = remap_jar(&input, None, &mapping()?)?;
	assert_eq!(outcome, RemapOutcome::Remapped {
		output: output.clone(),
		summary: RemapSummary { classes: 1, copied: 0, dropped: 0 },
	});
	assert_eq!(class_name_in(&output)?, "Named.class");
	assert!(!dir.join("game-remapped.jar.tmp").exists());

	// with another mapping, nothing happens
	let outcome = remap_jar(&input, None, &Mapping::new())?;
	assert_eq!(outcome, RemapOutcome::AlreadyPresent { output: output.clone() });
	assert_eq!(class_name_in(&output)?, "Named.class");

	fs::remove_dir_all(&dir)?;
	Ok(())
}

#[test]
fn explicit_output_is_overwritten() -> Result<()> {
	let dir = test_dir("explicit")?;
	let input = dir.join("game.jar");
	write_jar(&input, "a")?;

	let output = dir.join("named.jar");
	fs::write(&output, b"old contents")?;

	let outcome = remap_jar(&input, Some(&output), &mapping()?)?;
	assert!(matches!(outcome, RemapOutcome::Remapped { .. }), "{outcome:?}");
	assert_eq!(class_name_in(&output)?, "Named.class");

	let mut archive = ZipArchive::new(fs::File::open(&output)?)?;
	let mut data = Vec::new();
	std::io::Read::read_to_end(&mut archive.by_index(0)?, &mut data)?;
	assert_eq!(read_header(&data)?.name, JavaString::from("Named"));

	fs::remove_dir_all(&dir)?;
	Ok(())
}

#[test]
fn failure_leaves_no_output() -> Result<()> {
	let dir = test_dir("failure")?;
	let input = dir.join("broken.jar");
	fs::write(&input, b"not a zip archive")?;

	assert!(remap_jar(&input, None, &mapping()?).is_err());
	assert!(!dir.join("broken-remapped.jar").exists());
	assert!(!dir.join("broken-remapped.jar.tmp").exists());

	fs::remove_dir_all(&dir)?;
	Ok(())
}
