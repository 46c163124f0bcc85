//! A crate for reading and writing [Java Class Files](https://docs.oracle.com/javase/specs/jvms/se22/html/jvms-4.html)
//! without resolving them into a tree.
//!
//! The constant pool is kept as is, and everything refers to it by index. This allows changing the names of classes,
//! fields and methods without touching the bytecode of any method: new names are appended to the [`Pool`] and the
//! indices in the structures are updated, while all indices inside of the `code` arrays stay valid.
//!
//! Attributes that contain names are decoded (see [`Attribute`]), all other ones are kept as bytes.

mod io;
mod jstring;
pub mod annotation;
pub mod attribute;
pub mod pool;

use std::io::Cursor;
use anyhow::{anyhow, bail, Context, Result};
use java_string::{JavaStr, JavaString};
use crate::attribute::{Attribute, AttributeInfo};
use crate::io::{ClassRead, ClassWrite};
pub use crate::pool::{MemberRefInfo, Pool, PoolEntry};

const MAGIC: u32 = 0xCAFE_BABE;

pub mod flags {
	pub const ACC_PUBLIC: u16 = 0x0001;
	pub const ACC_PRIVATE: u16 = 0x0002;
	pub const ACC_PROTECTED: u16 = 0x0004;
	pub const ACC_STATIC: u16 = 0x0008;
	pub const ACC_FINAL: u16 = 0x0010;
	pub const ACC_SUPER: u16 = 0x0020;
	pub const ACC_INTERFACE: u16 = 0x0200;
	pub const ACC_ABSTRACT: u16 = 0x0400;
	pub const ACC_SYNTHETIC: u16 = 0x1000;
	pub const ACC_ENUM: u16 = 0x4000;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassFile {
	pub minor_version: u16,
	pub major_version: u16,
	pub pool: Pool,
	pub access_flags: u16,
	pub this_class: u16,
	/// `0` if there's no super class.
	pub super_class: u16,
	pub interfaces: Vec<u16>,
	pub fields: Vec<FieldInfo>,
	pub methods: Vec<MethodInfo>,
	pub attributes: Vec<AttributeInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
	pub access_flags: u16,
	pub name_index: u16,
	pub descriptor_index: u16,
	pub attributes: Vec<AttributeInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
	pub access_flags: u16,
	pub name_index: u16,
	pub descriptor_index: u16,
	pub attributes: Vec<AttributeInfo>,
}

/// The parts of a class file that describe its position in the class hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassHeader {
	pub name: JavaString,
	pub super_class: Option<JavaString>,
	pub interfaces: Vec<JavaString>,
}

fn read_start(reader: &mut Cursor<&[u8]>) -> Result<(u16, u16, Pool)> {
	let magic = reader.read_u32()?;
	if magic != MAGIC {
		bail!("wrong magic: got {magic:#x}, expected {MAGIC:#x}");
	}
	let minor_version = reader.read_u16()?;
	let major_version = reader.read_u16()?;
	let pool = Pool::read(reader)
		.context("failed to read constant pool")?;
	Ok((minor_version, major_version, pool))
}

fn read_members<T>(reader: &mut Cursor<&[u8]>, pool: &Pool, make: fn(u16, u16, u16, Vec<AttributeInfo>) -> T) -> Result<Vec<T>> {
	reader.read_vec(
		|r| r.read_u16_as_usize(),
		|r| {
			let access_flags = r.read_u16()?;
			let name_index = r.read_u16()?;
			let descriptor_index = r.read_u16()?;
			let attributes = AttributeInfo::read_all(r, pool)
				.with_context(|| anyhow!("failed to read attributes of member {:?}", pool.get_utf8(name_index).ok()))?;
			Ok(make(access_flags, name_index, descriptor_index, attributes))
		}
	)
}

/// Reads only the class header, that is the name, super class and interfaces.
///
/// This doesn't look at fields, methods or attributes at all.
pub fn read_header(bytes: &[u8]) -> Result<ClassHeader> {
	let mut reader = Cursor::new(bytes);
	let (_, _, pool) = read_start(&mut reader)?;

	let _access_flags = reader.read_u16()?;
	let name = pool.get_class_name(reader.read_u16()?)
		.context("failed to get name of class")?
		.to_owned();
	let super_class = pool.get_optional_class_name(reader.read_u16()?)
		.with_context(|| anyhow!("failed to get super class of {name:?}"))?
		.map(ToOwned::to_owned);
	let interfaces = reader.read_vec(
		|r| r.read_u16_as_usize(),
		|r| Ok(pool.get_class_name(r.read_u16()?)?.to_owned())
	).with_context(|| anyhow!("failed to read interfaces of {name:?}"))?;

	Ok(ClassHeader { name, super_class, interfaces })
}

impl ClassFile {
	/// Creates a class without any members or attributes.
	pub fn new(major_version: u16, access_flags: u16, name: &JavaStr, super_class: Option<&JavaStr>, interfaces: &[&JavaStr]) -> Result<ClassFile> {
		let mut pool = Pool::new();
		let this_class = pool.put_class(name)?;
		let super_class = match super_class {
			Some(super_class) => pool.put_class(super_class)?,
			None => 0,
		};
		let interfaces = interfaces.iter()
			.map(|interface| pool.put_class(interface))
			.collect::<Result<_>>()?;

		Ok(ClassFile {
			minor_version: 0,
			major_version,
			pool,
			access_flags,
			this_class,
			super_class,
			interfaces,
			fields: Vec::new(),
			methods: Vec::new(),
			attributes: Vec::new(),
		})
	}

	pub fn add_field(&mut self, access_flags: u16, name: &JavaStr, descriptor: &JavaStr) -> Result<&mut FieldInfo> {
		let name_index = self.pool.put_utf8(name)?;
		let descriptor_index = self.pool.put_utf8(descriptor)?;
		self.fields.push(FieldInfo { access_flags, name_index, descriptor_index, attributes: Vec::new() });
		self.fields.last_mut().context("field was just added")
	}

	pub fn add_method(&mut self, access_flags: u16, name: &JavaStr, descriptor: &JavaStr) -> Result<&mut MethodInfo> {
		let name_index = self.pool.put_utf8(name)?;
		let descriptor_index = self.pool.put_utf8(descriptor)?;
		self.methods.push(MethodInfo { access_flags, name_index, descriptor_index, attributes: Vec::new() });
		self.methods.last_mut().context("method was just added")
	}

	/// Adds an attribute with the given name to the pool, returning the [`AttributeInfo`].
	pub fn make_attribute(&mut self, name: &str, attribute: Attribute) -> Result<AttributeInfo> {
		let name_index = self.pool.put_utf8(JavaStr::from_str(name))?;
		Ok(AttributeInfo { name_index, attribute })
	}

	pub fn read(bytes: &[u8]) -> Result<ClassFile> {
		let mut reader = Cursor::new(bytes);
		let (minor_version, major_version, pool) = read_start(&mut reader)?;

		let access_flags = reader.read_u16()?;
		let this_class = reader.read_u16()?;
		let super_class = reader.read_u16()?;
		let interfaces = reader.read_vec(|r| r.read_u16_as_usize(), |r| r.read_u16())?;

		let name = pool.get_class_name(this_class)
			.context("failed to get name of class")?;

		let fields = read_members(&mut reader, &pool, |access_flags, name_index, descriptor_index, attributes| {
			FieldInfo { access_flags, name_index, descriptor_index, attributes }
		}).with_context(|| anyhow!("failed to read fields of {name:?}"))?;
		let methods = read_members(&mut reader, &pool, |access_flags, name_index, descriptor_index, attributes| {
			MethodInfo { access_flags, name_index, descriptor_index, attributes }
		}).with_context(|| anyhow!("failed to read methods of {name:?}"))?;
		let attributes = AttributeInfo::read_all(&mut reader, &pool)
			.with_context(|| anyhow!("failed to read attributes of {name:?}"))?;

		if !reader.is_at_end() {
			bail!("class {name:?} has {} trailing bytes", bytes.len() as u64 - reader.position());
		}

		Ok(ClassFile {
			minor_version,
			major_version,
			pool,
			access_flags,
			this_class,
			super_class,
			interfaces,
			fields,
			methods,
			attributes,
		})
	}

	pub fn write(&self) -> Result<Vec<u8>> {
		let mut writer = Vec::new();

		writer.write_u32(MAGIC)?;
		writer.write_u16(self.minor_version)?;
		writer.write_u16(self.major_version)?;
		self.pool.write(&mut writer)?;

		writer.write_u16(self.access_flags)?;
		writer.write_u16(self.this_class)?;
		writer.write_u16(self.super_class)?;
		writer.write_slice(&self.interfaces, |w, &interface| w.write_u16(interface))?;

		writer.write_slice(&self.fields, |w, field| {
			w.write_u16(field.access_flags)?;
			w.write_u16(field.name_index)?;
			w.write_u16(field.descriptor_index)?;
			AttributeInfo::write_all(w, &field.attributes)
		})?;
		writer.write_slice(&self.methods, |w, method| {
			w.write_u16(method.access_flags)?;
			w.write_u16(method.name_index)?;
			w.write_u16(method.descriptor_index)?;
			AttributeInfo::write_all(w, &method.attributes)
		})?;
		AttributeInfo::write_all(&mut writer, &self.attributes)?;

		Ok(writer)
	}

	/// Reads the header of this class from the pool.
	pub fn header(&self) -> Result<ClassHeader> {
		let name = self.pool.get_class_name(self.this_class)?.to_owned();
		let super_class = self.pool.get_optional_class_name(self.super_class)?.map(ToOwned::to_owned);
		let interfaces = self.interfaces.iter()
			.map(|&index| Ok(self.pool.get_class_name(index)?.to_owned()))
			.collect::<Result<_>>()?;
		Ok(ClassHeader { name, super_class, interfaces })
	}
}
