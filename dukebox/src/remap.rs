//! Remapping of a single class file.
//!
//! The class is kept in its raw form: all names in the constant pool are replaced, and everything referring to a name
//! is pointed at the new entry. New entries are only ever appended to the pool, so the bytecode stays untouched.

use anyhow::{anyhow, bail, Context, Result};
use java_string::{JavaStr, JavaString};
use log::trace;
use quill::remapper::BRemapper;
use raw_class_file::{ClassFile, FieldInfo, MethodInfo, Pool, PoolEntry};
use raw_class_file::annotation::{Annotation, ElementValue};
use raw_class_file::attribute::{Attribute, AttributeInfo, BootstrapMethod};

const LAMBDA_METAFACTORY: &str = "java/lang/invoke/LambdaMetafactory";
const METAFACTORY: &str = "metafactory";
const ALT_METAFACTORY: &str = "altMetafactory";

const SOURCE_FILE_EXTENSION: &str = ".java";

/// A class after remapping.
#[derive(Debug, Clone, PartialEq)]
pub struct RemappedClass {
	pub old_name: JavaString,
	pub new_name: JavaString,
	pub data: Vec<u8>,
}

/// The value of the `SourceFile` attribute for a class: the simple name, up to the first `$`, with `.java` appended.
///
/// ```
/// use java_string::{JavaStr, JavaString};
/// use dukebox::remap::source_file_name;
///
/// assert_eq!(source_file_name(JavaStr::from_str("org/example/Foo$Bar$1")), JavaString::from("Foo.java"));
/// assert_eq!(source_file_name(JavaStr::from_str("Foo")), JavaString::from("Foo.java"));
/// ```
pub fn source_file_name(class: &JavaStr) -> JavaString {
	let simple = class.rsplit_once('/').map_or(class, |(_, simple)| simple);
	let outer = simple.split_once('$').map_or(simple, |(outer, _)| outer);

	let mut name = outer.to_owned();
	name.push_str(SOURCE_FILE_EXTENSION);
	name
}

/// The name of an inner class as written in the `InnerClasses` attribute, computed from its binary name.
///
/// Returns `None` if the binary name doesn't contain a `$`, or only digits follow it.
fn inner_simple_name(class: &JavaStr) -> Option<&JavaStr> {
	let (_, after) = class.rsplit_once('$')?;
	let digits = after.as_bytes().iter().take_while(|b| b.is_ascii_digit()).count();
	let name = &after[digits..];
	(!name.is_empty()).then_some(name)
}

/// Remaps the class file given, returning the new class file together with the old and new names of the class.
pub fn remap_class(bytes: &[u8], remapper: &impl BRemapper) -> Result<RemappedClass> {
	let mut class = ClassFile::read(bytes)?;
	let original = class.pool.clone();

	let old_name = original.get_class_name(class.this_class)?.to_owned();
	let new_name = remapper.map_class(&old_name)?;
	trace!("remapping class {old_name:?} to {new_name:?}");

	let bootstrap_methods: Vec<BootstrapMethod> = class.attributes.iter()
		.find_map(|attribute| match &attribute.attribute {
			Attribute::BootstrapMethods(methods) => Some(methods.clone()),
			_ => None,
		})
		.unwrap_or_default();

	let mut cx = ClassContext {
		remapper,
		original: &original,
		pool: &mut class.pool,
		old_name: &old_name,
		new_name: &new_name,
	};

	cx.remap_pool(&bootstrap_methods)
		.context("failed to remap constant pool")?;

	for field in &mut class.fields {
		cx.remap_field(field)?;
	}
	for method in &mut class.methods {
		cx.remap_method(method)?;
	}
	cx.remap_attributes(&mut class.attributes)
		.context("failed to remap class attributes")?;

	let data = class.write()?;
	Ok(RemappedClass { old_name, new_name, data })
}

struct ClassContext<'a, R> {
	remapper: &'a R,
	/// The pool as read, all names are looked up here.
	original: &'a Pool,
	/// The pool written, new names are added here.
	pool: &'a mut Pool,
	old_name: &'a JavaStr,
	new_name: &'a JavaStr,
}

impl<'a, R: BRemapper> ClassContext<'a, R> {
	fn utf8(&self, index: u16) -> Result<&'a JavaStr> {
		let original: &'a Pool = self.original;
		original.get_utf8(index)
	}

	/// Gives the index of the new string, reusing the old index if it didn't change.
	fn updated_utf8(&mut self, index: u16, old: &JavaStr, new: &JavaStr) -> Result<u16> {
		if old == new {
			Ok(index)
		} else {
			self.pool.put_utf8(new)
		}
	}

	fn changed_utf8(&mut self, old: &JavaStr, new: &JavaStr) -> Result<Option<u16>> {
		if old == new {
			Ok(None)
		} else {
			self.pool.put_utf8(new).map(Some)
		}
	}

	fn changed_name_and_type(&mut self, old: (&JavaStr, &JavaStr), new: (&JavaStr, &JavaStr)) -> Result<Option<u16>> {
		if old == new {
			Ok(None)
		} else {
			self.pool.put_name_and_type(new.0, new.1).map(Some)
		}
	}

	/// Replaces all entries of the pool that are or refer to names.
	///
	/// `Class` entries are changed in place. Member references get a new `NameAndType` entry, as these may be shared.
	fn remap_pool(&mut self, bootstrap_methods: &[BootstrapMethod]) -> Result<()> {
		let original: &'a Pool = self.original;

		for (index, entry) in original.iter() {
			let replacement = match *entry {
				PoolEntry::Class { name_index } => {
					let name = original.get_utf8(name_index)?;
					let new_name = self.remapper.map_class_any(name)?;
					self.changed_utf8(name, &new_name)?
						.map(|name_index| PoolEntry::Class { name_index })
				},
				PoolEntry::FieldRef { class_index, .. } => {
					let member = original.get_member_ref(index)?;
					let name = self.remapper.map_field(member.owner, member.name, member.descriptor)?;
					let descriptor = self.remapper.map_desc(member.descriptor)?;
					self.changed_name_and_type((member.name, member.descriptor), (&name, &descriptor))?
						.map(|name_and_type_index| PoolEntry::FieldRef { class_index, name_and_type_index })
				},
				PoolEntry::MethodRef { class_index, .. } => {
					let member = original.get_member_ref(index)?;
					let name = self.remapper.map_method(member.owner, member.name, member.descriptor)?;
					let descriptor = self.remapper.map_desc(member.descriptor)?;
					self.changed_name_and_type((member.name, member.descriptor), (&name, &descriptor))?
						.map(|name_and_type_index| PoolEntry::MethodRef { class_index, name_and_type_index })
				},
				PoolEntry::InterfaceMethodRef { class_index, .. } => {
					let member = original.get_member_ref(index)?;
					let name = self.remapper.map_method(member.owner, member.name, member.descriptor)?;
					let descriptor = self.remapper.map_desc(member.descriptor)?;
					self.changed_name_and_type((member.name, member.descriptor), (&name, &descriptor))?
						.map(|name_and_type_index| PoolEntry::InterfaceMethodRef { class_index, name_and_type_index })
				},
				PoolEntry::MethodType { descriptor_index } => {
					let descriptor = original.get_utf8(descriptor_index)?;
					let new_descriptor = self.remapper.map_desc(descriptor)?;
					self.changed_utf8(descriptor, &new_descriptor)?
						.map(|descriptor_index| PoolEntry::MethodType { descriptor_index })
				},
				PoolEntry::InvokeDynamic { bootstrap_method_attr_index, name_and_type_index } => {
					let (name, descriptor) = original.get_name_and_type(name_and_type_index)?;
					let new_descriptor = self.remapper.map_desc(descriptor)?;
					let new_name = match self.lambda_interface_method(bootstrap_methods, bootstrap_method_attr_index, descriptor)? {
						Some((interface, method_descriptor)) => self.remapper.map_method(interface, name, method_descriptor)?,
						None => name.to_owned(),
					};
					self.changed_name_and_type((name, descriptor), (&new_name, &new_descriptor))?
						.map(|name_and_type_index| PoolEntry::InvokeDynamic { bootstrap_method_attr_index, name_and_type_index })
				},
				PoolEntry::Dynamic { bootstrap_method_attr_index, name_and_type_index } => {
					let (name, descriptor) = original.get_name_and_type(name_and_type_index)?;
					let new_descriptor = self.remapper.map_desc(descriptor)?;
					self.changed_name_and_type((name, descriptor), (name, &new_descriptor))?
						.map(|name_and_type_index| PoolEntry::Dynamic { bootstrap_method_attr_index, name_and_type_index })
				},
				_ => None,
			};

			if let Some(replacement) = replacement {
				self.pool.replace(index, replacement)
					.with_context(|| anyhow!("failed to replace constant pool entry {index}"))?;
			}
		}

		Ok(())
	}

	/// If the bootstrap method is the one creating lambdas, returns the functional interface and the descriptor of the
	/// method implemented, as the name of the call site is the name of that method.
	fn lambda_interface_method(
		&self,
		bootstrap_methods: &[BootstrapMethod],
		bootstrap_method_attr_index: u16,
		call_site_descriptor: &'a JavaStr,
	) -> Result<Option<(&'a JavaStr, &'a JavaStr)>> {
		let original: &'a Pool = self.original;

		let bootstrap_method = bootstrap_methods.get(bootstrap_method_attr_index as usize)
			.with_context(|| anyhow!("no bootstrap method at index {bootstrap_method_attr_index}, only got {}", bootstrap_methods.len()))?;

		let &PoolEntry::MethodHandle { reference_index, .. } = original.get(bootstrap_method.bootstrap_method_ref)? else {
			bail!("bootstrap method {bootstrap_method:?} doesn't refer to a method handle");
		};
		let handle = original.get_member_ref(reference_index)?;
		if handle.owner != JavaStr::from_str(LAMBDA_METAFACTORY) ||
			(handle.name != JavaStr::from_str(METAFACTORY) && handle.name != JavaStr::from_str(ALT_METAFACTORY)) {
			return Ok(None);
		}

		let Some(&first_argument) = bootstrap_method.bootstrap_arguments.first() else {
			return Ok(None);
		};
		let &PoolEntry::MethodType { descriptor_index } = original.get(first_argument)? else {
			return Ok(None);
		};
		let method_descriptor = original.get_utf8(descriptor_index)?;

		let interface = call_site_descriptor.rsplit_once(')')
			.and_then(|(_, return_type)| return_type.strip_prefix('L'))
			.and_then(|return_type| return_type.strip_suffix(';'))
			.with_context(|| anyhow!("lambda call site descriptor {call_site_descriptor:?} doesn't return an object"))?;

		Ok(Some((interface, method_descriptor)))
	}

	fn remap_field(&mut self, field: &mut FieldInfo) -> Result<()> {
		let name = self.utf8(field.name_index)?;
		let descriptor = self.utf8(field.descriptor_index)?;

		let new_name = self.remapper.map_field(self.old_name, name, descriptor)?;
		let new_descriptor = self.remapper.map_desc(descriptor)?;

		field.name_index = self.updated_utf8(field.name_index, name, &new_name)?;
		field.descriptor_index = self.updated_utf8(field.descriptor_index, descriptor, &new_descriptor)?;

		self.remap_attributes(&mut field.attributes)
			.with_context(|| anyhow!("failed to remap attributes of field {name:?}"))
	}

	fn remap_method(&mut self, method: &mut MethodInfo) -> Result<()> {
		let name = self.utf8(method.name_index)?;
		let descriptor = self.utf8(method.descriptor_index)?;

		let new_name = self.remapper.map_method(self.old_name, name, descriptor)?;
		let new_descriptor = self.remapper.map_desc(descriptor)?;

		method.name_index = self.updated_utf8(method.name_index, name, &new_name)?;
		method.descriptor_index = self.updated_utf8(method.descriptor_index, descriptor, &new_descriptor)?;

		self.remap_attributes(&mut method.attributes)
			.with_context(|| anyhow!("failed to remap attributes of method {name:?} {descriptor:?}"))
	}

	fn remap_attributes(&mut self, attributes: &mut [AttributeInfo]) -> Result<()> {
		let original: &'a Pool = self.original;
		for info in attributes {
			match &mut info.attribute {
				Attribute::Code(code) => {
					self.remap_attributes(&mut code.attributes)?;
				},
				Attribute::Signature { signature_index } => {
					let signature = self.utf8(*signature_index)?;
					let new_signature = self.remapper.map_signature(signature)?;
					*signature_index = self.updated_utf8(*signature_index, signature, &new_signature)?;
				},
				Attribute::SourceFile { sourcefile_index } => {
					*sourcefile_index = self.pool.put_utf8(&source_file_name(self.new_name))?;
				},
				Attribute::InnerClasses(inner_classes) => {
					for inner_class in inner_classes {
						if inner_class.inner_name_index == 0 {
							continue; // anonymous
						}
						let old_class = original.get_class_name(inner_class.inner_class_info_index)?;
						let new_class = self.remapper.map_class(old_class)?;
						if new_class.as_java_str() == old_class {
							continue;
						}
						if let Some(new_inner_name) = inner_simple_name(&new_class) {
							let old_inner_name = self.utf8(inner_class.inner_name_index)?;
							inner_class.inner_name_index = self.updated_utf8(inner_class.inner_name_index, old_inner_name, new_inner_name)?;
						}
					}
				},
				Attribute::EnclosingMethod { class_index, method_index } => {
					if *method_index != 0 {
						let owner = original.get_class_name(*class_index)?;
						let (name, descriptor) = original.get_name_and_type(*method_index)?;
						let new_name = self.remapper.map_method(owner, name, descriptor)?;
						let new_descriptor = self.remapper.map_desc(descriptor)?;
						if let Some(index) = self.changed_name_and_type((name, descriptor), (&new_name, &new_descriptor))? {
							*method_index = index;
						}
					}
				},
				Attribute::LocalVariableTable(variables) => {
					for variable in variables {
						let descriptor = self.utf8(variable.descriptor_index)?;
						let new_descriptor = self.remapper.map_desc(descriptor)?;
						variable.descriptor_index = self.updated_utf8(variable.descriptor_index, descriptor, &new_descriptor)?;
					}
				},
				Attribute::LocalVariableTypeTable(variables) => {
					for variable in variables {
						let signature = self.utf8(variable.descriptor_index)?;
						let new_signature = self.remapper.map_signature(signature)?;
						variable.descriptor_index = self.updated_utf8(variable.descriptor_index, signature, &new_signature)?;
					}
				},
				Attribute::MethodParameters(parameters) => {
					for (index, parameter) in parameters.iter_mut().enumerate() {
						let name = JavaString::from(format!("p{index}"));
						parameter.name_index = self.pool.put_utf8(&name)?;
					}
				},
				Attribute::Record(components) => {
					for component in components {
						let name = self.utf8(component.name_index)?;
						let descriptor = self.utf8(component.descriptor_index)?;

						let new_name = self.remapper.map_record_component(self.old_name, name, descriptor)?;
						let new_descriptor = self.remapper.map_desc(descriptor)?;

						component.name_index = self.updated_utf8(component.name_index, name, &new_name)?;
						component.descriptor_index = self.updated_utf8(component.descriptor_index, descriptor, &new_descriptor)?;

						self.remap_attributes(&mut component.attributes)
							.with_context(|| anyhow!("failed to remap attributes of record component {name:?}"))?;
					}
				},
				Attribute::Annotations(annotations) => {
					for annotation in annotations {
						self.remap_annotation(annotation)?;
					}
				},
				Attribute::ParameterAnnotations(parameters) => {
					for annotation in parameters.iter_mut().flatten() {
						self.remap_annotation(annotation)?;
					}
				},
				Attribute::TypeAnnotations(annotations) => {
					for type_annotation in annotations {
						self.remap_annotation(&mut type_annotation.annotation)?;
					}
				},
				Attribute::AnnotationDefault(value) => {
					self.remap_element_value(value)?;
				},
				Attribute::BootstrapMethods(_) | Attribute::Other(_) => {},
			}
		}
		Ok(())
	}

	fn remap_annotation(&mut self, annotation: &mut Annotation) -> Result<()> {
		let descriptor = self.utf8(annotation.type_index)?;
		let new_descriptor = self.remapper.map_desc(descriptor)?;
		annotation.type_index = self.updated_utf8(annotation.type_index, descriptor, &new_descriptor)?;

		for pair in &mut annotation.element_value_pairs {
			self.remap_element_value(&mut pair.value)?;
		}
		Ok(())
	}

	fn remap_element_value(&mut self, value: &mut ElementValue) -> Result<()> {
		match value {
			ElementValue::Const { .. } => {},
			ElementValue::Enum { type_name_index, const_name_index } => {
				let descriptor = self.utf8(*type_name_index)?;
				let name = self.utf8(*const_name_index)?;

				if let Some(owner) = descriptor.strip_prefix('L').and_then(|x| x.strip_suffix(';')) {
					let new_name = self.remapper.map_field(owner, name, descriptor)?;
					*const_name_index = self.updated_utf8(*const_name_index, name, &new_name)?;
				}

				let new_descriptor = self.remapper.map_desc(descriptor)?;
				*type_name_index = self.updated_utf8(*type_name_index, descriptor, &new_descriptor)?;
			},
			ElementValue::Class { class_info_index } => {
				let descriptor = self.utf8(*class_info_index)?;
				// `void.class` is written as a return descriptor
				if descriptor != JavaStr::from_str("V") {
					let new_descriptor = self.remapper.map_desc(descriptor)?;
					*class_info_index = self.updated_utf8(*class_info_index, descriptor, &new_descriptor)?;
				}
			},
			ElementValue::Annotation(annotation) => {
				self.remap_annotation(annotation)?;
			},
			ElementValue::Array(values) => {
				for value in values {
					self.remap_element_value(value)?;
				}
			},
		}
		Ok(())
	}
}
