use std::io::Cursor;
use anyhow::{anyhow, bail, Context, Result};
use crate::annotation::{Annotation, ElementValue, TypeAnnotation};
use crate::io::{ClassRead, ClassWrite};
use crate::pool::Pool;

pub const CODE: &str = "Code";
pub const SIGNATURE: &str = "Signature";
pub const SOURCE_FILE: &str = "SourceFile";
pub const INNER_CLASSES: &str = "InnerClasses";
pub const ENCLOSING_METHOD: &str = "EnclosingMethod";
pub const LOCAL_VARIABLE_TABLE: &str = "LocalVariableTable";
pub const LOCAL_VARIABLE_TYPE_TABLE: &str = "LocalVariableTypeTable";
pub const METHOD_PARAMETERS: &str = "MethodParameters";
pub const RECORD: &str = "Record";
pub const BOOTSTRAP_METHODS: &str = "BootstrapMethods";
pub const RUNTIME_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";
pub const RUNTIME_INVISIBLE_ANNOTATIONS: &str = "RuntimeInvisibleAnnotations";
pub const RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS: &str = "RuntimeVisibleParameterAnnotations";
pub const RUNTIME_INVISIBLE_PARAMETER_ANNOTATIONS: &str = "RuntimeInvisibleParameterAnnotations";
pub const RUNTIME_VISIBLE_TYPE_ANNOTATIONS: &str = "RuntimeVisibleTypeAnnotations";
pub const RUNTIME_INVISIBLE_TYPE_ANNOTATIONS: &str = "RuntimeInvisibleTypeAnnotations";
pub const ANNOTATION_DEFAULT: &str = "AnnotationDefault";

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInfo {
	pub name_index: u16,
	pub attribute: Attribute,
}

/// The attributes that refer to names of classes, fields or methods are decoded, all other ones are kept as bytes.
///
/// Which kind of annotations (visible or invisible) is stored in the attribute only depends on the
/// attribute name.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
	Code(Code),
	Signature { signature_index: u16 },
	SourceFile { sourcefile_index: u16 },
	InnerClasses(Vec<InnerClass>),
	EnclosingMethod { class_index: u16, method_index: u16 },
	LocalVariableTable(Vec<LocalVariable>),
	/// The `descriptor_index` of each entry is the `signature_index` here.
	LocalVariableTypeTable(Vec<LocalVariable>),
	MethodParameters(Vec<MethodParameter>),
	Record(Vec<RecordComponent>),
	BootstrapMethods(Vec<BootstrapMethod>),
	Annotations(Vec<Annotation>),
	ParameterAnnotations(Vec<Vec<Annotation>>),
	TypeAnnotations(Vec<TypeAnnotation>),
	AnnotationDefault(ElementValue),
	Other(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Code {
	pub max_stack: u16,
	pub max_locals: u16,
	pub code: Vec<u8>,
	pub exception_table: Vec<ExceptionTableEntry>,
	pub attributes: Vec<AttributeInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExceptionTableEntry {
	pub start_pc: u16,
	pub end_pc: u16,
	pub handler_pc: u16,
	pub catch_type: u16,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InnerClass {
	pub inner_class_info_index: u16,
	pub outer_class_info_index: u16,
	/// `0` for anonymous classes.
	pub inner_name_index: u16,
	pub inner_class_access_flags: u16,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalVariable {
	pub start_pc: u16,
	pub length: u16,
	pub name_index: u16,
	pub descriptor_index: u16,
	pub index: u16,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MethodParameter {
	/// `0` for a parameter without a name.
	pub name_index: u16,
	pub access_flags: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordComponent {
	pub name_index: u16,
	pub descriptor_index: u16,
	pub attributes: Vec<AttributeInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapMethod {
	pub bootstrap_method_ref: u16,
	pub bootstrap_arguments: Vec<u16>,
}

impl AttributeInfo {
	/// Reads all attributes, prefixed by their count.
	pub(crate) fn read_all(reader: &mut Cursor<&[u8]>, pool: &Pool) -> Result<Vec<AttributeInfo>> {
		reader.read_vec(|r| r.read_u16_as_usize(), |r| AttributeInfo::read(r, pool))
	}

	pub(crate) fn write_all(writer: &mut Vec<u8>, attributes: &[AttributeInfo]) -> Result<()> {
		writer.write_slice(attributes, |w, attribute| attribute.write(w))
	}

	fn read(reader: &mut Cursor<&[u8]>, pool: &Pool) -> Result<AttributeInfo> {
		let name_index = reader.read_u16()?;
		let length = reader.read_u32_as_usize()?;
		let info = reader.read_u8_vec(length)?;

		let name = pool.get_utf8(name_index)
			.context("failed to get attribute name")?;
		let name = name.as_str().ok();

		let attribute = match name {
			Some(name) => {
				let mut inner = Cursor::new(info.as_slice());
				let attribute = Attribute::read(&mut inner, pool, name)
					.with_context(|| anyhow!("failed to read attribute {name:?}"))?;
				if !inner.is_at_end() {
					bail!("attribute {name:?} has {} bytes left over", length as u64 - inner.position());
				}
				attribute.unwrap_or(Attribute::Other(info))
			},
			None => Attribute::Other(info),
		};

		Ok(AttributeInfo { name_index, attribute })
	}

	fn write(&self, writer: &mut Vec<u8>) -> Result<()> {
		let mut info = Vec::new();
		self.attribute.write(&mut info)?;

		writer.write_u16(self.name_index)?;
		writer.write_usize_as_u32(info.len())?;
		writer.write_u8_slice(&info)
	}
}

impl Attribute {
	/// Returns `None` for attributes that are not decoded.
	fn read(reader: &mut Cursor<&[u8]>, pool: &Pool, name: &str) -> Result<Option<Attribute>> {
		Ok(Some(match name {
			CODE => Attribute::Code(Code {
				max_stack: reader.read_u16()?,
				max_locals: reader.read_u16()?,
				code: {
					let length = reader.read_u32_as_usize()?;
					reader.read_u8_vec(length)?
				},
				exception_table: reader.read_vec(
					|r| r.read_u16_as_usize(),
					|r| Ok(ExceptionTableEntry {
						start_pc: r.read_u16()?,
						end_pc: r.read_u16()?,
						handler_pc: r.read_u16()?,
						catch_type: r.read_u16()?,
					})
				)?,
				attributes: AttributeInfo::read_all(reader, pool)?,
			}),
			SIGNATURE => Attribute::Signature { signature_index: reader.read_u16()? },
			SOURCE_FILE => Attribute::SourceFile { sourcefile_index: reader.read_u16()? },
			INNER_CLASSES => Attribute::InnerClasses(reader.read_vec(
				|r| r.read_u16_as_usize(),
				|r| Ok(InnerClass {
					inner_class_info_index: r.read_u16()?,
					outer_class_info_index: r.read_u16()?,
					inner_name_index: r.read_u16()?,
					inner_class_access_flags: r.read_u16()?,
				})
			)?),
			ENCLOSING_METHOD => Attribute::EnclosingMethod {
				class_index: reader.read_u16()?,
				method_index: reader.read_u16()?,
			},
			LOCAL_VARIABLE_TABLE => Attribute::LocalVariableTable(read_local_variables(reader)?),
			LOCAL_VARIABLE_TYPE_TABLE => Attribute::LocalVariableTypeTable(read_local_variables(reader)?),
			METHOD_PARAMETERS => Attribute::MethodParameters(reader.read_vec(
				|r| r.read_u8_as_usize(),
				|r| Ok(MethodParameter {
					name_index: r.read_u16()?,
					access_flags: r.read_u16()?,
				})
			)?),
			RECORD => Attribute::Record(reader.read_vec(
				|r| r.read_u16_as_usize(),
				|r| Ok(RecordComponent {
					name_index: r.read_u16()?,
					descriptor_index: r.read_u16()?,
					attributes: AttributeInfo::read_all(r, pool)?,
				})
			)?),
			BOOTSTRAP_METHODS => Attribute::BootstrapMethods(reader.read_vec(
				|r| r.read_u16_as_usize(),
				|r| Ok(BootstrapMethod {
					bootstrap_method_ref: r.read_u16()?,
					bootstrap_arguments: r.read_vec(|r| r.read_u16_as_usize(), |r| r.read_u16())?,
				})
			)?),
			RUNTIME_VISIBLE_ANNOTATIONS | RUNTIME_INVISIBLE_ANNOTATIONS => Attribute::Annotations(
				reader.read_vec(|r| r.read_u16_as_usize(), Annotation::read)?
			),
			RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS | RUNTIME_INVISIBLE_PARAMETER_ANNOTATIONS => Attribute::ParameterAnnotations(
				reader.read_vec(
					|r| r.read_u8_as_usize(),
					|r| r.read_vec(|r| r.read_u16_as_usize(), Annotation::read)
				)?
			),
			RUNTIME_VISIBLE_TYPE_ANNOTATIONS | RUNTIME_INVISIBLE_TYPE_ANNOTATIONS => Attribute::TypeAnnotations(
				reader.read_vec(|r| r.read_u16_as_usize(), TypeAnnotation::read)?
			),
			ANNOTATION_DEFAULT => Attribute::AnnotationDefault(ElementValue::read(reader)?),
			_ => return Ok(None),
		}))
	}

	fn write(&self, writer: &mut Vec<u8>) -> Result<()> {
		match self {
			Attribute::Code(code) => {
				writer.write_u16(code.max_stack)?;
				writer.write_u16(code.max_locals)?;
				writer.write_usize_as_u32(code.code.len())?;
				writer.write_u8_slice(&code.code)?;
				writer.write_slice(&code.exception_table, |w, entry| {
					w.write_u16(entry.start_pc)?;
					w.write_u16(entry.end_pc)?;
					w.write_u16(entry.handler_pc)?;
					w.write_u16(entry.catch_type)
				})?;
				AttributeInfo::write_all(writer, &code.attributes)?;
			},
			&Attribute::Signature { signature_index } => writer.write_u16(signature_index)?,
			&Attribute::SourceFile { sourcefile_index } => writer.write_u16(sourcefile_index)?,
			Attribute::InnerClasses(inner_classes) => {
				writer.write_slice(inner_classes, |w, inner_class| {
					w.write_u16(inner_class.inner_class_info_index)?;
					w.write_u16(inner_class.outer_class_info_index)?;
					w.write_u16(inner_class.inner_name_index)?;
					w.write_u16(inner_class.inner_class_access_flags)
				})?;
			},
			&Attribute::EnclosingMethod { class_index, method_index } => {
				writer.write_u16(class_index)?;
				writer.write_u16(method_index)?;
			},
			Attribute::LocalVariableTable(table) |
			Attribute::LocalVariableTypeTable(table) => {
				writer.write_slice(table, |w, variable| {
					w.write_u16(variable.start_pc)?;
					w.write_u16(variable.length)?;
					w.write_u16(variable.name_index)?;
					w.write_u16(variable.descriptor_index)?;
					w.write_u16(variable.index)
				})?;
			},
			Attribute::MethodParameters(parameters) => {
				writer.write_usize_as_u8(parameters.len())?;
				for parameter in parameters {
					writer.write_u16(parameter.name_index)?;
					writer.write_u16(parameter.access_flags)?;
				}
			},
			Attribute::Record(components) => {
				writer.write_slice(components, |w, component| {
					w.write_u16(component.name_index)?;
					w.write_u16(component.descriptor_index)?;
					AttributeInfo::write_all(w, &component.attributes)
				})?;
			},
			Attribute::BootstrapMethods(methods) => {
				writer.write_slice(methods, |w, method| {
					w.write_u16(method.bootstrap_method_ref)?;
					w.write_slice(&method.bootstrap_arguments, |w, &argument| w.write_u16(argument))
				})?;
			},
			Attribute::Annotations(annotations) => {
				writer.write_slice(annotations, |w, annotation| annotation.write(w))?;
			},
			Attribute::ParameterAnnotations(parameters) => {
				writer.write_usize_as_u8(parameters.len())?;
				for annotations in parameters {
					writer.write_slice(annotations, |w, annotation| annotation.write(w))?;
				}
			},
			Attribute::TypeAnnotations(annotations) => {
				writer.write_slice(annotations, |w, annotation| annotation.write(w))?;
			},
			Attribute::AnnotationDefault(value) => value.write(writer)?,
			Attribute::Other(info) => writer.write_u8_slice(info)?,
		}
		Ok(())
	}
}

fn read_local_variables(reader: &mut Cursor<&[u8]>) -> Result<Vec<LocalVariable>> {
	reader.read_vec(
		|r| r.read_u16_as_usize(),
		|r| Ok(LocalVariable {
			start_pc: r.read_u16()?,
			length: r.read_u16()?,
			name_index: r.read_u16()?,
			descriptor_index: r.read_u16()?,
			index: r.read_u16()?,
		})
	)
}
