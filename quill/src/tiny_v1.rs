//! Reading mappings in the "Tiny v1" format.
//!
//! A Tiny v1 file starts with a header line `v1` followed by the names of the namespaces, all separated by tabs. The
//! first namespace is the one the keys of the mapping are given in. Every following line is a record:
//! ```txt
//! CLASS	<name in first namespace>	<name in second namespace>	...
//! FIELD	<owner>	<descriptor>	<name in first namespace>	<name in second namespace>	...
//! METHOD	<owner>	<descriptor>	<name in first namespace>	<name in second namespace>	...
//! ```
//! Owners and descriptors are always given in the first namespace.
//!
//! Only one of the later namespaces is read at a time, see [`read`].

use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use anyhow::{anyhow, bail, Context, Result};
use indexmap::IndexSet;
use java_string::JavaString;
use log::debug;
use crate::lines::{content_lines, on_every_line, TinyLine};
use crate::tree::mappings::{ClassInfo, FieldInfo, Mapping, MethodInfo};

const HEADER: &str = "v1";

const CLASS: &str = "CLASS";
const FIELD: &str = "FIELD";
const METHOD: &str = "METHOD";

/// The namespace asked for isn't one of the namespaces of the file that can be mapped to.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownNamespace {
	pub requested: String,
	pub available: Vec<String>,
}

impl Display for UnknownNamespace {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "namespace {:?} is not specified in the mappings, available namespaces are {:?}", self.requested, self.available)
	}
}

impl std::error::Error for UnknownNamespace {}

/// Reads a Tiny v1 file from the given path, see [`read`].
pub fn read_file(path: impl AsRef<Path>, namespace: &str) -> Result<Mapping> {
	let file = File::open(&path)
		.with_context(|| anyhow!("failed to open mappings file {:?}", path.as_ref()))?;
	read(file, namespace)
		.with_context(|| anyhow!("failed to read mappings file {:?} as tiny v1 file", path.as_ref()))
}

#[allow(clippy::tabs_in_doc_comments)]
/// Reads a Tiny v1 file, creating a mapping from the first namespace into the namespace given.
///
/// Fails with an [`UnknownNamespace`] error if `namespace` isn't one of the namespaces after the first one. Entries
/// with an empty name in the selected namespace are skipped.
///
/// ```
/// # use pretty_assertions::assert_eq;
/// use java_string::JavaStr;
/// use quill::tiny_v1::UnknownNamespace;
///
/// let string = "\
/// v1	official	intermediary	named
/// CLASS	a	net/minecraft/class_1	net/minecraft/World
/// METHOD	a	()V	b	method_1	tick
/// ";
///
/// let mapping = quill::tiny_v1::read(string.as_bytes(), "named").unwrap();
/// assert_eq!(mapping.get_class(JavaStr::from_str("a")).or_original(), JavaStr::from_str("net/minecraft/World"));
/// assert_eq!(mapping.methods().len(), 1);
///
/// let error = quill::tiny_v1::read(string.as_bytes(), "yarn").unwrap_err();
/// assert!(error.downcast_ref::<UnknownNamespace>().is_some());
/// ```
pub fn read(reader: impl Read, namespace: &str) -> Result<Mapping> {
	let mut lines = content_lines(reader);

	let (_, header) = lines.next()
		.context("no header line, file is empty")??;
	let header = TinyLine::new(&header);
	if header.first_field != HEADER {
		bail!("v1 header was not detected, got {:?} instead of {HEADER:?}", header.first_field);
	}
	let namespaces = header.rest().context("header doesn't name any namespaces")?;
	let (from, to) = namespaces.split_first()
		.context("header doesn't name any namespaces")?;

	let column = to.iter().position(|x| x == namespace)
		.map(|index| index + 1)
		.ok_or_else(|| UnknownNamespace { requested: namespace.to_owned(), available: to.to_vec() })?;

	debug!("reading tiny v1 mappings from {from:?} to {namespace:?}");

	let mut mapping = Mapping::new();
	let mut class_keys = IndexSet::new();
	let mut class_records = 0usize;

	on_every_line(lines, |_, line| {
		let mut line = TinyLine::new(&line);
		match line.first_field.as_str() {
			CLASS => {
				let old = line.next()?;
				let new = line.nth(column - 1)?;
				class_records += 1;
				class_keys.insert(old.clone());
				if !new.is_empty() {
					mapping.add_class(ClassInfo(old.try_into()?), new.try_into()?)?;
				}
			},
			FIELD => {
				let owner = line.next()?;
				let descriptor = line.next()?;
				let old = line.next()?;
				let new = line.nth(column - 1)?;
				if !new.is_empty() {
					let key = FieldInfo { owner: owner.try_into()?, name: JavaString::from(old), descriptor: descriptor.try_into()? };
					mapping.add_field(key, JavaString::from(new))?;
				}
			},
			METHOD => {
				let owner = line.next()?;
				let descriptor = line.next()?;
				let old = line.next()?;
				let new = line.nth(column - 1)?;
				if !new.is_empty() {
					let key = MethodInfo { owner: owner.try_into()?, name: JavaString::from(old), descriptor: descriptor.try_into()? };
					mapping.add_method(key, JavaString::from(new))?;
				}
			},
			tag => bail!("unknown mapping target {tag:?}, expected one of {CLASS:?}, {FIELD:?} or {METHOD:?}"),
		}
		Ok(())
	})?;

	if class_records != class_keys.len() {
		bail!("read {class_records} class records, but only got {} distinct classes", class_keys.len());
	}

	debug!("read {} classes, {} fields and {} methods", mapping.classes().len(), mapping.fields().len(), mapping.methods().len());

	Ok(mapping)
}
