use anyhow::Result;
use java_string::JavaStr;
use pretty_assertions::assert_eq;
use quill::remapper::NoSuperClassProvider;
use quill::tree::mappings::Mapping;
use raw_class_file::{flags, ClassFile, PoolEntry};
use raw_class_file::attribute::{self, Attribute, AttributeInfo, Code, LocalVariable, RecordComponent};
use dukebox::remap::{remap_class, RemappedClass};

fn j(s: &str) -> &JavaStr {
	JavaStr::from_str(s)
}

fn mapping() -> Result<Mapping> {
	quill::tiny_v1::read(include_str!("mapping.tiny").as_bytes(), "named")
}

fn remap(bytes: &[u8]) -> Result<RemappedClass> {
	let mapping = mapping()?;
	remap_class(bytes, &mapping.remapper(NoSuperClassProvider::new()))
}

fn signature(class: &mut ClassFile, signature: &str) -> Result<AttributeInfo> {
	let signature_index = class.pool.put_utf8(j(signature))?;
	class.make_attribute(attribute::SIGNATURE, Attribute::Signature { signature_index })
}

fn read_signature(class: &ClassFile, attribute: &AttributeInfo) -> Result<String> {
	let Attribute::Signature { signature_index } = attribute.attribute else {
		panic!("expected signature, got {attribute:?}");
	};
	Ok(class.pool.get_utf8(signature_index)?.as_str()?.to_owned())
}

/// The record `a`, with a generic component, signatures everywhere, local variables and dynamic constants.
fn record_a() -> Result<Vec<u8>> {
	let mut class = ClassFile::new(61, flags::ACC_PUBLIC | flags::ACC_FINAL | flags::ACC_SUPER, j("a"), Some(j("java/lang/Record")), &[])?;

	let class_signature = signature(&mut class, "Ljava/lang/Record;Ljava/lang/Comparable<La;>;")?;
	class.attributes.push(class_signature);

	let component_name = class.pool.put_utf8(j("e"))?;
	let component_descriptor = class.pool.put_utf8(j("La;"))?;
	let component_signature = signature(&mut class, "La<Lb;>;")?;
	let record = class.make_attribute(attribute::RECORD, Attribute::Record(vec![
		RecordComponent {
			name_index: component_name,
			descriptor_index: component_descriptor,
			attributes: vec![component_signature],
		},
	]))?;
	class.attributes.push(record);

	let field_signature = signature(&mut class, "La<Lb;>;")?;
	class.add_field(flags::ACC_PRIVATE | flags::ACC_FINAL, j("e"), j("La;"))?
		.attributes.push(field_signature);

	let this_name = class.pool.put_utf8(j("this"))?;
	let this_descriptor = class.pool.put_utf8(j("La;"))?;
	let list_name = class.pool.put_utf8(j("list"))?;
	let list_descriptor = class.pool.put_utf8(j("Ljava/util/List;"))?;
	let list_signature = class.pool.put_utf8(j("Ljava/util/List<Lb;>;"))?;
	let local_variables = class.make_attribute(attribute::LOCAL_VARIABLE_TABLE, Attribute::LocalVariableTable(vec![
		LocalVariable { start_pc: 0, length: 1, name_index: this_name, descriptor_index: this_descriptor, index: 0 },
		LocalVariable { start_pc: 0, length: 1, name_index: list_name, descriptor_index: list_descriptor, index: 1 },
	]))?;
	let local_variable_types = class.make_attribute(attribute::LOCAL_VARIABLE_TYPE_TABLE, Attribute::LocalVariableTypeTable(vec![
		LocalVariable { start_pc: 0, length: 1, name_index: list_name, descriptor_index: list_signature, index: 1 },
	]))?;
	let code = class.make_attribute(attribute::CODE, Attribute::Code(Code {
		max_stack: 1,
		max_locals: 2,
		code: vec![0x2a, 0xb0], // aload_0, areturn
		exception_table: Vec::new(),
		attributes: vec![local_variables, local_variable_types],
	}))?;
	let method_signature = signature(&mut class, "<T:La;>(TT;)Lb;")?;
	class.add_method(flags::ACC_PUBLIC, j("d"), j("(La;)La;"))?
		.attributes.extend([code, method_signature]);

	let method_type = class.pool.put_utf8(j("(La;)V"))?;
	class.pool.push(PoolEntry::MethodType { descriptor_index: method_type })?;
	let constant = class.pool.put_name_and_type(j("x"), j("La;"))?;
	class.pool.push(PoolEntry::Dynamic { bootstrap_method_attr_index: 0, name_and_type_index: constant })?;

	class.write()
}

/// The class `a$a`, declared inside the method `a.d`.
fn local_class() -> Result<Vec<u8>> {
	let mut class = ClassFile::new(61, flags::ACC_SUPER, j("a$a"), Some(j("java/lang/Object")), &[])?;

	let class_index = class.pool.put_class(j("a"))?;
	let method_index = class.pool.put_name_and_type(j("d"), j("(La;)La;"))?;
	let enclosing_method = class.make_attribute(attribute::ENCLOSING_METHOD, Attribute::EnclosingMethod { class_index, method_index })?;
	class.attributes.push(enclosing_method);

	class.write()
}

#[test]
fn record_and_signatures() -> Result<()> {
	let remapped = remap(&record_a()?)?;
	assert_eq!(remapped.new_name.as_java_str(), j("org/example/Foo"));

	let class = ClassFile::read(&remapped.data)?;
	assert_eq!(class.pool.get_class_name(class.this_class)?, j("org/example/Foo"));

	assert_eq!(read_signature(&class, &class.attributes[0])?, "Ljava/lang/Record;Ljava/lang/Comparable<Lorg/example/Foo;>;");

	let Attribute::Record(components) = &class.attributes[1].attribute else {
		panic!("expected record, got {:?}", class.attributes[1]);
	};
	assert_eq!(components.len(), 1);
	assert_eq!(class.pool.get_utf8(components[0].name_index)?, j("INSTANCE"));
	assert_eq!(class.pool.get_utf8(components[0].descriptor_index)?, j("Lorg/example/Foo;"));
	assert_eq!(read_signature(&class, &components[0].attributes[0])?, "Lorg/example/Foo<Lorg/example/Bar;>;");

	let field = &class.fields[0];
	assert_eq!(class.pool.get_utf8(field.name_index)?, j("INSTANCE"));
	assert_eq!(read_signature(&class, &field.attributes[0])?, "Lorg/example/Foo<Lorg/example/Bar;>;");
	Ok(())
}

#[test]
fn method_code_and_local_variables() -> Result<()> {
	let remapped = remap(&record_a()?)?;
	let class = ClassFile::read(&remapped.data)?;

	let method = &class.methods[0];
	assert_eq!(class.pool.get_utf8(method.name_index)?, j("copy"));
	assert_eq!(class.pool.get_utf8(method.descriptor_index)?, j("(Lorg/example/Foo;)Lorg/example/Foo;"));
	assert_eq!(read_signature(&class, &method.attributes[1])?, "<T:Lorg/example/Foo;>(TT;)Lorg/example/Bar;");

	let Attribute::Code(code) = &method.attributes[0].attribute else {
		panic!("expected code, got {:?}", method.attributes[0]);
	};
	assert_eq!(code.code, vec![0x2a, 0xb0]);

	let Attribute::LocalVariableTable(variables) = &code.attributes[0].attribute else {
		panic!("expected local variables, got {:?}", code.attributes[0]);
	};
	assert_eq!(class.pool.get_utf8(variables[0].name_index)?, j("this"));
	assert_eq!(class.pool.get_utf8(variables[0].descriptor_index)?, j("Lorg/example/Foo;"));
	assert_eq!(class.pool.get_utf8(variables[1].descriptor_index)?, j("Ljava/util/List;"));

	let Attribute::LocalVariableTypeTable(variables) = &code.attributes[1].attribute else {
		panic!("expected local variable types, got {:?}", code.attributes[1]);
	};
	assert_eq!(class.pool.get_utf8(variables[0].descriptor_index)?, j("Ljava/util/List<Lorg/example/Bar;>;"));
	Ok(())
}

#[test]
fn method_types_and_dynamic_constants() -> Result<()> {
	let remapped = remap(&record_a()?)?;
	let class = ClassFile::read(&remapped.data)?;

	let method_types: Vec<_> = class.pool.iter()
		.filter_map(|(_, entry)| match *entry {
			PoolEntry::MethodType { descriptor_index } => Some(descriptor_index),
			_ => None,
		})
		.map(|index| class.pool.get_utf8(index))
		.collect::<Result<_>>()?;
	assert_eq!(method_types, vec![j("(Lorg/example/Foo;)V")]);

	let constants: Vec<_> = class.pool.iter()
		.filter_map(|(_, entry)| match *entry {
			PoolEntry::Dynamic { name_and_type_index, .. } => Some(name_and_type_index),
			_ => None,
		})
		.map(|index| class.pool.get_name_and_type(index))
		.collect::<Result<_>>()?;
	// the name of a dynamic constant is chosen by its bootstrap method, only the type changes
	assert_eq!(constants, vec![(j("x"), j("Lorg/example/Foo;"))]);
	Ok(())
}

#[test]
fn enclosing_method() -> Result<()> {
	let remapped = remap(&local_class()?)?;
	assert_eq!(remapped.new_name.as_java_str(), j("org/example/Foo$Inner"));

	let class = ClassFile::read(&remapped.data)?;
	let Attribute::EnclosingMethod { class_index, method_index } = class.attributes[0].attribute else {
		panic!("expected enclosing method, got {:?}", class.attributes[0]);
	};
	assert_eq!(class.pool.get_class_name(class_index)?, j("org/example/Foo"));
	assert_eq!(class.pool.get_name_and_type(method_index)?, (j("copy"), j("(Lorg/example/Foo;)Lorg/example/Foo;")));
	Ok(())
}
