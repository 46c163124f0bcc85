use std::io::Cursor;
use anyhow::{anyhow, bail, Context, Result};
use crate::io::{ClassRead, ClassWrite};

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
	/// Index of an `Utf8` entry holding a field descriptor.
	pub type_index: u16,
	pub element_value_pairs: Vec<ElementValuePair>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementValuePair {
	pub element_name_index: u16,
	pub value: ElementValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
	/// One of the tags `B`, `C`, `D`, `F`, `I`, `J`, `S`, `Z` and `s`.
	Const { tag: u8, const_value_index: u16 },
	Enum { type_name_index: u16, const_name_index: u16 },
	/// `class_info_index` points to an `Utf8` entry with a return descriptor.
	Class { class_info_index: u16 },
	Annotation(Annotation),
	Array(Vec<ElementValue>),
}

/// A type annotation. Only the annotation itself is decoded, the target and path are kept as they are.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAnnotation {
	pub target_type: u8,
	pub target_info: Vec<u8>,
	/// Pairs of `type_path_kind` and `type_argument_index`.
	pub type_path: Vec<(u8, u8)>,
	pub annotation: Annotation,
}

impl Annotation {
	pub(crate) fn read(reader: &mut Cursor<&[u8]>) -> Result<Annotation> {
		Ok(Annotation {
			type_index: reader.read_u16()?,
			element_value_pairs: reader.read_vec(
				|r| r.read_u16_as_usize(),
				|r| Ok(ElementValuePair {
					element_name_index: r.read_u16()?,
					value: ElementValue::read(r)?,
				})
			)?,
		})
	}

	pub(crate) fn write(&self, writer: &mut Vec<u8>) -> Result<()> {
		writer.write_u16(self.type_index)?;
		writer.write_slice(&self.element_value_pairs, |w, pair| {
			w.write_u16(pair.element_name_index)?;
			pair.value.write(w)
		})
	}
}

impl ElementValue {
	pub(crate) fn read(reader: &mut Cursor<&[u8]>) -> Result<ElementValue> {
		let tag = reader.read_u8()?;
		Ok(match tag {
			b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' => ElementValue::Const {
				tag,
				const_value_index: reader.read_u16()?,
			},
			b'e' => ElementValue::Enum {
				type_name_index: reader.read_u16()?,
				const_name_index: reader.read_u16()?,
			},
			b'c' => ElementValue::Class { class_info_index: reader.read_u16()? },
			b'@' => ElementValue::Annotation(Annotation::read(reader)?),
			b'[' => ElementValue::Array(reader.read_vec(|r| r.read_u16_as_usize(), ElementValue::read)?),
			tag => bail!("unknown element value tag {tag:?} ({:?})", tag as char),
		})
	}

	pub(crate) fn write(&self, writer: &mut Vec<u8>) -> Result<()> {
		match self {
			&ElementValue::Const { tag, const_value_index } => {
				writer.write_u8(tag)?;
				writer.write_u16(const_value_index)?;
			},
			&ElementValue::Enum { type_name_index, const_name_index } => {
				writer.write_u8(b'e')?;
				writer.write_u16(type_name_index)?;
				writer.write_u16(const_name_index)?;
			},
			&ElementValue::Class { class_info_index } => {
				writer.write_u8(b'c')?;
				writer.write_u16(class_info_index)?;
			},
			ElementValue::Annotation(annotation) => {
				writer.write_u8(b'@')?;
				annotation.write(writer)?;
			},
			ElementValue::Array(values) => {
				writer.write_u8(b'[')?;
				writer.write_slice(values, |w, value| value.write(w))?;
			},
		}
		Ok(())
	}
}

impl TypeAnnotation {
	pub(crate) fn read(reader: &mut Cursor<&[u8]>) -> Result<TypeAnnotation> {
		let target_type = reader.read_u8()?;
		let target_info_length = match target_type {
			0x00 | 0x01 | 0x16 => 1,
			0x10 | 0x11 | 0x12 | 0x17 | 0x42 | 0x43..=0x46 => 2,
			0x13..=0x15 => 0,
			0x47..=0x4B => 3,
			0x40 | 0x41 => {
				let table_length = reader.read_u16_as_usize()?;
				let table = reader.read_u8_vec(table_length * 6)?;

				let mut target_info = Vec::with_capacity(2 + table.len());
				target_info.write_usize_as_u16(table_length)?;
				target_info.extend(table);
				return TypeAnnotation::read_rest(reader, target_type, target_info);
			},
			target_type => bail!("unknown type annotation target type {target_type:#x}"),
		};
		let target_info = reader.read_u8_vec(target_info_length)?;
		TypeAnnotation::read_rest(reader, target_type, target_info)
	}

	fn read_rest(reader: &mut Cursor<&[u8]>, target_type: u8, target_info: Vec<u8>) -> Result<TypeAnnotation> {
		let type_path = reader.read_vec(
			|r| r.read_u8_as_usize(),
			|r| Ok((r.read_u8()?, r.read_u8()?))
		)?;
		let annotation = Annotation::read(reader)
			.with_context(|| anyhow!("in type annotation with target type {target_type:#x}"))?;
		Ok(TypeAnnotation { target_type, target_info, type_path, annotation })
	}

	pub(crate) fn write(&self, writer: &mut Vec<u8>) -> Result<()> {
		writer.write_u8(self.target_type)?;
		writer.write_u8_slice(&self.target_info)?;
		writer.write_usize_as_u8(self.type_path.len())?;
		for &(kind, index) in &self.type_path {
			writer.write_u8(kind)?;
			writer.write_u8(index)?;
		}
		self.annotation.write(writer)
	}
}
