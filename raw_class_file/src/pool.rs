use std::collections::HashMap;
use std::io::Cursor;
use anyhow::{anyhow, bail, Context, Result};
use java_string::{JavaStr, JavaString};
use crate::io::{ClassRead, ClassWrite};
use crate::jstring::{from_string_to_vec, from_vec_to_string};

const UTF8: u8 = 1;
const INTEGER: u8 = 3;
const FLOAT: u8 = 4;
const LONG: u8 = 5;
const DOUBLE: u8 = 6;
const CLASS: u8 = 7;
const STRING: u8 = 8;
const FIELD_REF: u8 = 9;
const METHOD_REF: u8 = 10;
const INTERFACE_METHOD_REF: u8 = 11;
const NAME_AND_TYPE: u8 = 12;
const METHOD_HANDLE: u8 = 15;
const METHOD_TYPE: u8 = 16;
const DYNAMIC: u8 = 17;
const INVOKE_DYNAMIC: u8 = 18;
const MODULE: u8 = 19;
const PACKAGE: u8 = 20;

/// An entry of the constant pool. The floating point values are kept as their raw bits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PoolEntry {
	Utf8(JavaString),
	Integer(u32),
	Float(u32),
	Long(u64),
	Double(u64),
	Class { name_index: u16 },
	String { string_index: u16 },
	FieldRef { class_index: u16, name_and_type_index: u16 },
	MethodRef { class_index: u16, name_and_type_index: u16 },
	InterfaceMethodRef { class_index: u16, name_and_type_index: u16 },
	NameAndType { name_index: u16, descriptor_index: u16 },
	MethodHandle { reference_kind: u8, reference_index: u16 },
	MethodType { descriptor_index: u16 },
	Dynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
	InvokeDynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
	Module { name_index: u16 },
	Package { name_index: u16 },
}

impl PoolEntry {
	/// `Long` and `Double` take up two indices in the pool.
	fn is_wide(&self) -> bool {
		matches!(self, PoolEntry::Long(_) | PoolEntry::Double(_))
	}

	fn is_interned(&self) -> bool {
		matches!(self, PoolEntry::Utf8(_) | PoolEntry::NameAndType { .. })
	}
}

/// A resolved `CONSTANT_Fieldref`, `CONSTANT_Methodref` or `CONSTANT_InterfaceMethodref`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemberRefInfo<'a> {
	pub owner: &'a JavaStr,
	pub name: &'a JavaStr,
	pub descriptor: &'a JavaStr,
}

/// The constant pool of a class file.
///
/// Indices are the ones used inside the class file: index `0` is never valid, and the index after
/// a `Long` or `Double` entry is unusable. Entries are never moved, adding entries only appends,
/// so indices stored in bytecode stay valid.
#[derive(Debug, Clone)]
pub struct Pool {
	entries: Vec<Option<PoolEntry>>,
	interned: HashMap<PoolEntry, u16>,
}

impl Default for Pool {
	fn default() -> Self {
		Pool::new()
	}
}

impl PartialEq for Pool {
	fn eq(&self, other: &Self) -> bool {
		self.entries == other.entries
	}
}

impl Pool {
	pub fn new() -> Pool {
		Pool {
			entries: vec![None],
			interned: HashMap::new(),
		}
	}

	pub fn iter(&self) -> impl Iterator<Item=(u16, &PoolEntry)> {
		self.entries.iter()
			.enumerate()
			.filter_map(|(index, entry)| Some((u16::try_from(index).ok()?, entry.as_ref()?)))
	}

	pub fn get(&self, index: u16) -> Result<&PoolEntry> {
		self.entries.get(index as usize)
			.and_then(Option::as_ref)
			.with_context(|| anyhow!("invalid constant pool index {index}, pool has {} entries", self.entries.len()))
	}

	/// Appends an entry, without looking for an equal one.
	pub fn push(&mut self, entry: PoolEntry) -> Result<u16> {
		let index = u16::try_from(self.entries.len())
			.ok()
			.filter(|&index| if entry.is_wide() { index < u16::MAX - 1 } else { index < u16::MAX })
			.with_context(|| anyhow!("constant pool is full, cannot add {entry:?}"))?;

		if entry.is_interned() {
			self.interned.entry(entry.clone()).or_insert(index);
		}
		let wide = entry.is_wide();
		self.entries.push(Some(entry));
		if wide {
			self.entries.push(None);
		}
		Ok(index)
	}

	/// Replaces the entry at the given index, returning the old one.
	///
	/// A `Long` or `Double` entry can only be replaced by another one of these, and vice versa.
	pub fn replace(&mut self, index: u16, entry: PoolEntry) -> Result<PoolEntry> {
		let slot = self.entries.get_mut(index as usize)
			.and_then(Option::as_mut)
			.with_context(|| anyhow!("invalid constant pool index {index} to replace"))?;
		if slot.is_wide() != entry.is_wide() {
			bail!("cannot replace {slot:?} with {entry:?} at index {index}: differing sizes");
		}

		let old = std::mem::replace(slot, entry.clone());
		if self.interned.get(&old) == Some(&index) {
			self.interned.remove(&old);
		}
		if entry.is_interned() {
			self.interned.entry(entry).or_insert(index);
		}
		Ok(old)
	}

	fn put(&mut self, entry: PoolEntry) -> Result<u16> {
		match self.interned.get(&entry) {
			Some(&index) => Ok(index),
			None => self.push(entry),
		}
	}

	/// Returns the index of an `Utf8` entry with the given content, adding one if there is none.
	pub fn put_utf8(&mut self, string: &JavaStr) -> Result<u16> {
		self.put(PoolEntry::Utf8(string.to_owned()))
	}

	/// Returns the index of a `NameAndType` entry with the given contents, adding entries as needed.
	pub fn put_name_and_type(&mut self, name: &JavaStr, descriptor: &JavaStr) -> Result<u16> {
		let name_index = self.put_utf8(name)?;
		let descriptor_index = self.put_utf8(descriptor)?;
		self.put(PoolEntry::NameAndType { name_index, descriptor_index })
	}

	/// Returns the index of a `Class` entry with the given name, adding entries as needed.
	pub fn put_class(&mut self, name: &JavaStr) -> Result<u16> {
		let name_index = self.put_utf8(name)?;
		let existing = self.iter()
			.find(|(_, entry)| matches!(entry, PoolEntry::Class { name_index: i } if *i == name_index))
			.map(|(index, _)| index);
		match existing {
			Some(index) => Ok(index),
			None => self.push(PoolEntry::Class { name_index }),
		}
	}

	pub fn put_field_ref(&mut self, owner: &JavaStr, name: &JavaStr, descriptor: &JavaStr) -> Result<u16> {
		let class_index = self.put_class(owner)?;
		let name_and_type_index = self.put_name_and_type(name, descriptor)?;
		self.push(PoolEntry::FieldRef { class_index, name_and_type_index })
	}

	pub fn put_method_ref(&mut self, owner: &JavaStr, name: &JavaStr, descriptor: &JavaStr, interface: bool) -> Result<u16> {
		let class_index = self.put_class(owner)?;
		let name_and_type_index = self.put_name_and_type(name, descriptor)?;
		if interface {
			self.push(PoolEntry::InterfaceMethodRef { class_index, name_and_type_index })
		} else {
			self.push(PoolEntry::MethodRef { class_index, name_and_type_index })
		}
	}

	pub fn get_utf8(&self, index: u16) -> Result<&JavaStr> {
		match self.get(index)? {
			PoolEntry::Utf8(string) => Ok(string.as_java_str()),
			entry => bail!("expected utf8 entry at index {index}, got {entry:?}"),
		}
	}

	pub fn get_class_name(&self, index: u16) -> Result<&JavaStr> {
		match self.get(index)? {
			&PoolEntry::Class { name_index } => self.get_utf8(name_index)
				.with_context(|| anyhow!("for class entry at index {index}")),
			entry => bail!("expected class entry at index {index}, got {entry:?}"),
		}
	}

	/// Index `0` means there's no class, like the super class of `java/lang/Object`.
	pub fn get_optional_class_name(&self, index: u16) -> Result<Option<&JavaStr>> {
		if index == 0 {
			Ok(None)
		} else {
			self.get_class_name(index).map(Some)
		}
	}

	/// Returns the name and descriptor of a `NameAndType` entry.
	pub fn get_name_and_type(&self, index: u16) -> Result<(&JavaStr, &JavaStr)> {
		match self.get(index)? {
			&PoolEntry::NameAndType { name_index, descriptor_index } => {
				let name = self.get_utf8(name_index)?;
				let descriptor = self.get_utf8(descriptor_index)?;
				Ok((name, descriptor))
			},
			entry => bail!("expected name and type entry at index {index}, got {entry:?}"),
		}
	}

	pub fn get_member_ref(&self, index: u16) -> Result<MemberRefInfo<'_>> {
		match self.get(index)? {
			&PoolEntry::FieldRef { class_index, name_and_type_index } |
			&PoolEntry::MethodRef { class_index, name_and_type_index } |
			&PoolEntry::InterfaceMethodRef { class_index, name_and_type_index } => {
				let owner = self.get_class_name(class_index)?;
				let (name, descriptor) = self.get_name_and_type(name_and_type_index)?;
				Ok(MemberRefInfo { owner, name, descriptor })
			},
			entry => bail!("expected field or method ref entry at index {index}, got {entry:?}"),
		}
	}

	pub(crate) fn read(reader: &mut Cursor<&[u8]>) -> Result<Pool> {
		let count = reader.read_u16_as_usize()?;
		if count == 0 {
			bail!("constant pool count must be at least one");
		}

		let mut pool = Pool::new();
		while pool.entries.len() < count {
			let index = pool.entries.len();
			let entry = read_entry(reader)
				.with_context(|| anyhow!("failed to read constant pool entry {index} of {count}"))?;
			if entry.is_wide() && index + 1 >= count {
				bail!("{entry:?} at index {index} takes two slots, but the pool only has {count}");
			}
			pool.push(entry)?;
		}
		Ok(pool)
	}

	pub(crate) fn write(&self, writer: &mut Vec<u8>) -> Result<()> {
		writer.write_usize_as_u16(self.entries.len())?;
		for entry in self.entries.iter().flatten() {
			write_entry(writer, entry)?;
		}
		Ok(())
	}
}

fn read_entry(reader: &mut Cursor<&[u8]>) -> Result<PoolEntry> {
	let tag = reader.read_u8()?;
	Ok(match tag {
		UTF8 => {
			let length = reader.read_u16_as_usize()?;
			let vec = reader.read_u8_vec(length)?;
			PoolEntry::Utf8(from_vec_to_string(vec)?)
		},
		INTEGER => PoolEntry::Integer(reader.read_u32()?),
		FLOAT => PoolEntry::Float(reader.read_u32()?),
		LONG => PoolEntry::Long(reader.read_u64()?),
		DOUBLE => PoolEntry::Double(reader.read_u64()?),
		CLASS => PoolEntry::Class { name_index: reader.read_u16()? },
		STRING => PoolEntry::String { string_index: reader.read_u16()? },
		FIELD_REF => PoolEntry::FieldRef { class_index: reader.read_u16()?, name_and_type_index: reader.read_u16()? },
		METHOD_REF => PoolEntry::MethodRef { class_index: reader.read_u16()?, name_and_type_index: reader.read_u16()? },
		INTERFACE_METHOD_REF => PoolEntry::InterfaceMethodRef { class_index: reader.read_u16()?, name_and_type_index: reader.read_u16()? },
		NAME_AND_TYPE => PoolEntry::NameAndType { name_index: reader.read_u16()?, descriptor_index: reader.read_u16()? },
		METHOD_HANDLE => PoolEntry::MethodHandle { reference_kind: reader.read_u8()?, reference_index: reader.read_u16()? },
		METHOD_TYPE => PoolEntry::MethodType { descriptor_index: reader.read_u16()? },
		DYNAMIC => PoolEntry::Dynamic { bootstrap_method_attr_index: reader.read_u16()?, name_and_type_index: reader.read_u16()? },
		INVOKE_DYNAMIC => PoolEntry::InvokeDynamic { bootstrap_method_attr_index: reader.read_u16()?, name_and_type_index: reader.read_u16()? },
		MODULE => PoolEntry::Module { name_index: reader.read_u16()? },
		PACKAGE => PoolEntry::Package { name_index: reader.read_u16()? },
		tag => bail!("unknown constant pool tag {tag}"),
	})
}

fn write_entry(writer: &mut Vec<u8>, entry: &PoolEntry) -> Result<()> {
	match entry {
		PoolEntry::Utf8(string) => {
			writer.write_u8(UTF8)?;
			let vec = from_string_to_vec(string);
			writer.write_usize_as_u16(vec.len())
				.with_context(|| anyhow!("string {string:?} is too long for the constant pool"))?;
			writer.write_u8_slice(&vec)?;
		},
		&PoolEntry::Integer(bytes) => {
			writer.write_u8(INTEGER)?;
			writer.write_u32(bytes)?;
		},
		&PoolEntry::Float(bytes) => {
			writer.write_u8(FLOAT)?;
			writer.write_u32(bytes)?;
		},
		&PoolEntry::Long(bytes) => {
			writer.write_u8(LONG)?;
			writer.write_u64(bytes)?;
		},
		&PoolEntry::Double(bytes) => {
			writer.write_u8(DOUBLE)?;
			writer.write_u64(bytes)?;
		},
		&PoolEntry::Class { name_index } => {
			writer.write_u8(CLASS)?;
			writer.write_u16(name_index)?;
		},
		&PoolEntry::String { string_index } => {
			writer.write_u8(STRING)?;
			writer.write_u16(string_index)?;
		},
		&PoolEntry::FieldRef { class_index, name_and_type_index } => {
			writer.write_u8(FIELD_REF)?;
			writer.write_u16(class_index)?;
			writer.write_u16(name_and_type_index)?;
		},
		&PoolEntry::MethodRef { class_index, name_and_type_index } => {
			writer.write_u8(METHOD_REF)?;
			writer.write_u16(class_index)?;
			writer.write_u16(name_and_type_index)?;
		},
		&PoolEntry::InterfaceMethodRef { class_index, name_and_type_index } => {
			writer.write_u8(INTERFACE_METHOD_REF)?;
			writer.write_u16(class_index)?;
			writer.write_u16(name_and_type_index)?;
		},
		&PoolEntry::NameAndType { name_index, descriptor_index } => {
			writer.write_u8(NAME_AND_TYPE)?;
			writer.write_u16(name_index)?;
			writer.write_u16(descriptor_index)?;
		},
		&PoolEntry::MethodHandle { reference_kind, reference_index } => {
			writer.write_u8(METHOD_HANDLE)?;
			writer.write_u8(reference_kind)?;
			writer.write_u16(reference_index)?;
		},
		&PoolEntry::MethodType { descriptor_index } => {
			writer.write_u8(METHOD_TYPE)?;
			writer.write_u16(descriptor_index)?;
		},
		&PoolEntry::Dynamic { bootstrap_method_attr_index, name_and_type_index } => {
			writer.write_u8(DYNAMIC)?;
			writer.write_u16(bootstrap_method_attr_index)?;
			writer.write_u16(name_and_type_index)?;
		},
		&PoolEntry::InvokeDynamic { bootstrap_method_attr_index, name_and_type_index } => {
			writer.write_u8(INVOKE_DYNAMIC)?;
			writer.write_u16(bootstrap_method_attr_index)?;
			writer.write_u16(name_and_type_index)?;
		},
		&PoolEntry::Module { name_index } => {
			writer.write_u8(MODULE)?;
			writer.write_u16(name_index)?;
		},
		&PoolEntry::Package { name_index } => {
			writer.write_u8(PACKAGE)?;
			writer.write_u16(name_index)?;
		},
	}
	Ok(())
}
