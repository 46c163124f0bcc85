//! Reading mappings in the format written by ProGuard (also used for the official Minecraft mappings).
//!
//! ```txt
//! # comment
//! com.example.Foo -> a:
//!     int bar -> b
//!     12:14:void baz(java.lang.String,int[]) -> c
//! ```
//! Class lines map the deobfuscated name to the obfuscated one. Member lines are indented, and give the type and name
//! in the deobfuscated namespace and the obfuscated name after the arrow. Method lines may carry line numbers.
//!
//! The mapping read maps from the obfuscated names to the deobfuscated ones.

use std::fmt::Debug;
use std::fs::File;
use std::hash::Hash;
use std::io::Read;
use std::path::Path;
use anyhow::{anyhow, bail, Context, Result};
use indexmap::IndexMap;
use java_string::{JavaStr, JavaString};
use log::{debug, trace};
use crate::lines::{content_lines, on_every_line};
use crate::tree::descriptor::map_descriptor;
use crate::tree::mappings::{ClassInfo, FieldInfo, Mapping, MethodInfo};
use crate::tree::names::{Descriptor, InternalName};

const ARROW: &str = "->";

const PRIMITIVES: [(&str, &str); 9] = [
	("int", "I"),
	("boolean", "Z"),
	("float", "F"),
	("void", "V"),
	("char", "C"),
	("byte", "B"),
	("short", "S"),
	("long", "J"),
	("double", "D"),
];

/// A member as written in the file: the descriptor uses the deobfuscated class names.
#[derive(Debug)]
struct MemberLine {
	new_name: String,
	old_name: String,
	descriptor: String,
}

/// One class block of the file, holding everything until the next class line.
#[derive(Debug)]
struct ClassMappingGroup {
	old_name: InternalName,
	new_name: InternalName,
	fields: Vec<MemberLine>,
	methods: Vec<MemberLine>,
}

/// Converts a java type like `java.lang.String[]` into a descriptor like `[Ljava/lang/String;`.
fn type_to_descriptor(java_type: &str) -> Result<String> {
	if java_type.is_empty() {
		bail!("type must not be empty");
	}
	if let Some(element) = java_type.strip_suffix("[]") {
		return Ok(format!("[{}", type_to_descriptor(element)?));
	}
	if let Some((_, descriptor)) = PRIMITIVES.iter().find(|(name, _)| *name == java_type) {
		return Ok((*descriptor).to_owned());
	}
	Ok(format!("L{};", java_type.replace('.', "/")))
}

fn split_arrow(line: &str) -> Result<(&str, &str)> {
	let (new, old) = line.split_once(ARROW)
		.with_context(|| anyhow!("expected {ARROW:?} in {line:?}"))?;
	Ok((new.trim(), old.trim()))
}

/// Removes a leading line number prefix, like `start:end:` or just `line:`.
///
/// The return type is the first word, and never contains a `:`, so everything up to the last `:` in it is the prefix.
fn strip_line_numbers(line: &str) -> &str {
	let first_word = line.split_once(' ').map_or(line, |(first, _)| first);
	match first_word.rfind(':') {
		Some(index) => &line[index + 1..],
		None => line,
	}
}

fn parse_class(line: &str) -> Result<(InternalName, InternalName)> {
	let (new, old) = split_arrow(line)?;
	let old = old.strip_suffix(':').unwrap_or(old);

	let new = InternalName::try_from(new.replace('.', "/"))?;
	let old = InternalName::try_from(old.replace('.', "/"))?;
	Ok((old, new))
}

fn parse_field(line: &str) -> Result<MemberLine> {
	let (new, old_name) = split_arrow(line)?;
	let (java_type, new_name) = new.split_once(' ')
		.with_context(|| anyhow!("expected a type and a name in field line {line:?}"))?;

	Ok(MemberLine {
		new_name: new_name.trim().to_owned(),
		old_name: old_name.to_owned(),
		descriptor: type_to_descriptor(java_type)?,
	})
}

fn parse_method(line: &str) -> Result<MemberLine> {
	let (new, old_name) = split_arrow(line)?;
	let new = strip_line_numbers(new);

	let (return_type, rest) = new.split_once(' ')
		.with_context(|| anyhow!("expected a return type and a name in method line {line:?}"))?;
	let (new_name, parameters) = rest.split_once('(')
		.with_context(|| anyhow!("expected a parameter list in method line {line:?}"))?;
	// anything after the closing parenthesis is the original line number range
	let (parameters, _) = parameters.rsplit_once(')')
		.with_context(|| anyhow!("unclosed parameter list in method line {line:?}"))?;

	let mut descriptor = String::from("(");
	for parameter in parameters.split(',').map(str::trim).filter(|x| !x.is_empty()) {
		descriptor.push_str(&type_to_descriptor(parameter)?);
	}
	descriptor.push(')');
	descriptor.push_str(&type_to_descriptor(return_type)?);

	Ok(MemberLine {
		new_name: new_name.trim().to_owned(),
		old_name: old_name.to_owned(),
		descriptor,
	})
}

/// Adds a member mapping, allowing the same mapping to be given again.
///
/// ProGuard writes a method once for every range of line numbers, these lines only differ in the line numbers.
fn add_member<K: Debug + Hash + Eq>(
	mapping: &mut Mapping,
	key: K,
	new_name: String,
	existing: fn(&Mapping) -> &IndexMap<K, JavaString>,
	add: fn(&mut Mapping, K, JavaString) -> Result<()>,
) -> Result<()> {
	let new_name = JavaString::from(new_name);
	match existing(mapping).get(&key) {
		Some(present) if *present == new_name => Ok(()),
		Some(present) => bail!("{key:?} is mapped to both {present:?} and {new_name:?}"),
		None => add(mapping, key, new_name),
	}
}

/// Reads a ProGuard mappings file from the given path, see [`read`].
pub fn read_file(path: impl AsRef<Path>) -> Result<Mapping> {
	let file = File::open(&path)
		.with_context(|| anyhow!("failed to open mappings file {:?}", path.as_ref()))?;
	read(file)
		.with_context(|| anyhow!("failed to read mappings file {:?} as proguard file", path.as_ref()))
}

/// Reads a ProGuard mappings file, creating a mapping from the obfuscated names to the deobfuscated ones.
///
/// The descriptors in the file use the deobfuscated class names, they're translated back into the obfuscated ones
/// after all class lines are known. Classes that don't appear in the file are kept as is.
///
/// ```
/// # use pretty_assertions::assert_eq;
/// use java_string::JavaStr;
///
/// let string = "\
/// com.example.Foo -> a:
///     com.example.Foo self -> b
/// ";
///
/// let mapping = quill::proguard::read(string.as_bytes()).unwrap();
/// let field = mapping.get_field(JavaStr::from_str("a"), JavaStr::from_str("b"), JavaStr::from_str("La;"));
/// assert_eq!(field.found(), Some(JavaStr::from_str("self")));
/// ```
pub fn read(reader: impl Read) -> Result<Mapping> {
	let mut groups: Vec<ClassMappingGroup> = Vec::new();

	on_every_line(content_lines(reader), |_, line| {
		if line.starts_with(char::is_whitespace) {
			let group = groups.last_mut()
				.context("member line before the first class line")?;
			let line = line.trim();
			if line.contains('(') {
				let method = parse_method(line)?;
				// R8 writes inlined methods of other classes with their qualified name, these aren't declarations
				if method.new_name.contains('.') {
					trace!("skipping inline frame {line:?}");
				} else {
					group.methods.push(method);
				}
			} else {
				group.fields.push(parse_field(line)?);
			}
		} else {
			let (old_name, new_name) = parse_class(&line)?;
			groups.push(ClassMappingGroup { old_name, new_name, fields: Vec::new(), methods: Vec::new() });
		}
		Ok(())
	})?;

	let mut mapping = Mapping::new();
	let mut reverse: IndexMap<JavaString, JavaString> = IndexMap::new();

	for group in &groups {
		mapping.add_class(ClassInfo(group.old_name.clone()), group.new_name.clone())?;
		reverse.insert(group.new_name.clone().into(), group.old_name.clone().into());
	}

	if mapping.classes().len() != groups.len() {
		bail!("read {} class blocks, but only got {} distinct classes", groups.len(), mapping.classes().len());
	}

	let reverse_descriptor = |descriptor: &str| -> Result<Descriptor> {
		let mapped = map_descriptor(JavaStr::from_str(descriptor), |class| {
			Ok(reverse.get(class).map_or(class, |old| old.as_java_str()).to_owned())
		})?;
		Descriptor::try_from(mapped)
	};

	for group in groups {
		for field in group.fields {
			let key = FieldInfo {
				owner: group.old_name.clone(),
				name: field.old_name.into(),
				descriptor: reverse_descriptor(&field.descriptor)
					.with_context(|| anyhow!("in field {:?} of {:?}", field.new_name, group.new_name))?,
			};
			add_member(&mut mapping, key, field.new_name, Mapping::fields, Mapping::add_field)?;
		}
		for method in group.methods {
			let key = MethodInfo {
				owner: group.old_name.clone(),
				name: method.old_name.into(),
				descriptor: reverse_descriptor(&method.descriptor)
					.with_context(|| anyhow!("in method {:?} of {:?}", method.new_name, group.new_name))?,
			};
			add_member(&mut mapping, key, method.new_name, Mapping::methods, Mapping::add_method)?;
		}
	}

	debug!("read {} classes, {} fields and {} methods", mapping.classes().len(), mapping.fields().len(), mapping.methods().len());

	Ok(mapping)
}
