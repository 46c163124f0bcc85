use std::cell::Cell;
use std::io::{Cursor, Read, Write};
use anyhow::Result;
use indexmap::IndexMap;
use java_string::{JavaStr, JavaString};
use pretty_assertions::assert_eq;
use quill::tree::mappings::Mapping;
use raw_class_file::{flags, read_header, ClassFile, PoolEntry};
use raw_class_file::annotation::{Annotation, ElementValue, ElementValuePair};
use raw_class_file::attribute::{self, Attribute, BootstrapMethod, InnerClass, MethodParameter};
use zip::{DateTime, ZipArchive, ZipWriter};
use zip::write::SimpleFileOptions;
use dukebox::pipeline::{remap_into, RemapSummary};
use dukebox::storage::{Jar, MemJar};

const LAMBDA_METAFACTORY_DESCRIPTOR: &str = "(Ljava/lang/invoke/MethodHandles$Lookup;Ljava/lang/String;\
	Ljava/lang/invoke/MethodType;Ljava/lang/invoke/MethodType;Ljava/lang/invoke/MethodHandle;Ljava/lang/invoke/MethodType;)\
	Ljava/lang/invoke/CallSite;";

fn j(s: &str) -> &JavaStr {
	JavaStr::from_str(s)
}

fn s(s: &str) -> JavaString {
	JavaString::from(s)
}

fn mapping() -> Result<Mapping> {
	quill::tiny_v1::read(include_str!("mapping.tiny").as_bytes(), "named")
}

fn jar(entries: &[(&str, &[u8])]) -> Result<MemJar> {
	let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
	for &(name, data) in entries {
		if name.ends_with('/') {
			zip.add_directory(name, SimpleFileOptions::default())?;
		} else {
			zip.start_file(name, SimpleFileOptions::default())?;
			zip.write_all(data)?;
		}
	}
	Ok(MemJar::new("test.jar", zip.finish()?.into_inner()))
}

fn read_entries(data: &[u8]) -> Result<IndexMap<String, Vec<u8>>> {
	let mut archive = ZipArchive::new(Cursor::new(data))?;
	let mut entries = IndexMap::new();
	for index in 0..archive.len() {
		let mut file = archive.by_index(index)?;
		let mut content = Vec::new();
		file.read_to_end(&mut content)?;
		entries.insert(file.name().to_owned(), content);
	}
	Ok(entries)
}

fn raw_entry(data: &[u8], name: &str) -> Result<Vec<u8>> {
	let mut archive = ZipArchive::new(Cursor::new(data))?;
	let index = archive.index_for_name(name).ok_or_else(|| anyhow::anyhow!("no entry {name:?}"))?;
	let mut file = archive.by_index_raw(index)?;
	let mut content = Vec::new();
	file.read_to_end(&mut content)?;
	Ok(content)
}

fn remap(jar: &MemJar, mapping: &Mapping) -> Result<(Vec<u8>, RemapSummary)> {
	let (writer, summary) = remap_into(jar, mapping, Cursor::new(Vec::new()))?;
	Ok((writer.into_inner(), summary))
}

/// The class `a`, with a field, two methods and an inner class.
fn class_a() -> Result<Vec<u8>> {
	let mut class = ClassFile::new(61, flags::ACC_PUBLIC | flags::ACC_SUPER, j("a"), Some(j("java/lang/Object")), &[])?;

	let value = class.pool.put_utf8(j("value"))?;
	let annotation_type = class.pool.put_utf8(j("La;"))?;
	let enum_type = class.pool.put_utf8(j("La;"))?;
	let enum_const = class.pool.put_utf8(j("e"))?;
	let annotation = class.make_attribute(attribute::RUNTIME_VISIBLE_ANNOTATIONS, Attribute::Annotations(vec![
		Annotation {
			type_index: annotation_type,
			element_value_pairs: vec![
				ElementValuePair {
					element_name_index: value,
					value: ElementValue::Enum { type_name_index: enum_type, const_name_index: enum_const },
				},
			],
		},
	]))?;
	class.add_field(flags::ACC_PRIVATE, j("b"), j("I"))?
		.attributes.push(annotation);
	class.add_field(flags::ACC_PUBLIC | flags::ACC_STATIC | flags::ACC_FINAL, j("e"), j("La;"))?;

	class.add_method(flags::ACC_PUBLIC, j("c"), j("()V"))?;

	let parameter = class.pool.put_utf8(j("other"))?;
	let parameters = class.make_attribute(attribute::METHOD_PARAMETERS, Attribute::MethodParameters(vec![
		MethodParameter { name_index: parameter, access_flags: 0 },
	]))?;
	class.add_method(flags::ACC_PUBLIC, j("d"), j("(La;)La;"))?
		.attributes.push(parameters);

	class.pool.put_field_ref(j("a"), j("b"), j("I"))?;
	class.pool.put_method_ref(j("a"), j("d"), j("(La;)La;"), false)?;

	let inner_class = class.pool.put_class(j("a$a"))?;
	let outer_class = class.pool.put_class(j("a"))?;
	let inner_name = class.pool.put_utf8(j("a"))?;
	let inner_classes = class.make_attribute(attribute::INNER_CLASSES, Attribute::InnerClasses(vec![
		InnerClass {
			inner_class_info_index: inner_class,
			outer_class_info_index: outer_class,
			inner_name_index: inner_name,
			inner_class_access_flags: flags::ACC_PUBLIC | flags::ACC_STATIC,
		},
	]))?;
	class.attributes.push(inner_classes);

	let source_file = class.pool.put_utf8(j("SourceFile"))?;
	let source_file = class.make_attribute(attribute::SOURCE_FILE, Attribute::SourceFile { sourcefile_index: source_file })?;
	class.attributes.push(source_file);

	class.write()
}

/// The class `a$a`, an inner class of `a`.
fn class_a_inner() -> Result<Vec<u8>> {
	let mut class = ClassFile::new(61, flags::ACC_PUBLIC | flags::ACC_SUPER, j("a$a"), Some(j("java/lang/Object")), &[])?;

	let source_file = class.pool.put_utf8(j("SourceFile"))?;
	let source_file = class.make_attribute(attribute::SOURCE_FILE, Attribute::SourceFile { sourcefile_index: source_file })?;
	class.attributes.push(source_file);

	class.write()
}

/// The class `b`, extending `a`, using inherited members and creating a lambda for `a`.
fn class_b() -> Result<Vec<u8>> {
	let mut class = ClassFile::new(61, flags::ACC_PUBLIC | flags::ACC_SUPER, j("b"), Some(j("a")), &[])?;

	class.pool.put_field_ref(j("b"), j("b"), j("I"))?;
	class.pool.put_method_ref(j("b"), j("c"), j("()V"), false)?;

	let metafactory = class.pool.put_method_ref(j("java/lang/invoke/LambdaMetafactory"), j("metafactory"), j(LAMBDA_METAFACTORY_DESCRIPTOR), false)?;
	let handle = class.pool.push(PoolEntry::MethodHandle { reference_kind: 6, reference_index: metafactory })?;
	let implemented = class.pool.put_utf8(j("()V"))?;
	let method_type = class.pool.push(PoolEntry::MethodType { descriptor_index: implemented })?;
	let call_site = class.pool.put_name_and_type(j("c"), j("(Lb;)La;"))?;
	class.pool.push(PoolEntry::InvokeDynamic { bootstrap_method_attr_index: 0, name_and_type_index: call_site })?;

	let bootstrap_methods = class.make_attribute(attribute::BOOTSTRAP_METHODS, Attribute::BootstrapMethods(vec![
		BootstrapMethod { bootstrap_method_ref: handle, bootstrap_arguments: vec![method_type] },
	]))?;
	class.attributes.push(bootstrap_methods);

	class.write()
}

fn input_jar() -> Result<MemJar> {
	jar(&[
		("META-INF/", b""),
		("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\r\n\r\n"),
		("META-INF/MOJANGCS.SF", b"Signature-Version: 1.0\r\n"),
		("META-INF/MOJANGCS.RSA", b"\x30\x82"),
		("a.class", &class_a()?),
		("a$a.class", &class_a_inner()?),
		("b.class", &class_b()?),
		("log4j2.xml", b"<Configuration/>"),
	])
}

fn member_refs(class: &ClassFile) -> Result<Vec<(JavaString, JavaString, JavaString)>> {
	class.pool.iter()
		.filter(|(_, entry)| matches!(entry, PoolEntry::FieldRef { .. } | PoolEntry::MethodRef { .. } | PoolEntry::InterfaceMethodRef { .. }))
		.map(|(index, _)| {
			let member = class.pool.get_member_ref(index)?;
			Ok((member.owner.to_owned(), member.name.to_owned(), member.descriptor.to_owned()))
		})
		.collect()
}

#[test]
fn entries() -> Result<()> {
	let (output, summary) = remap(&input_jar()?, &mapping()?)?;

	assert_eq!(summary, RemapSummary { classes: 3, copied: 2, dropped: 2 });

	let names: Vec<_> = read_entries(&output)?.into_keys().collect();
	assert_eq!(names, vec![
		"META-INF/MANIFEST.MF",
		"org/example/Foo.class",
		"org/example/Foo$Inner.class",
		"org/example/Bar.class",
		"log4j2.xml",
	]);
	Ok(())
}

#[test]
fn other_entries_are_copied_raw() -> Result<()> {
	let input = input_jar()?;
	let (output, _) = remap(&input, &mapping()?)?;

	for name in ["META-INF/MANIFEST.MF", "log4j2.xml"] {
		assert_eq!(raw_entry(&output, name)?, raw_entry(&input.data, name)?, "raw data of {name:?}");
	}
	assert_eq!(read_entries(&output)?["log4j2.xml"], b"<Configuration/>");
	Ok(())
}

#[test]
fn class_contents() -> Result<()> {
	let (output, _) = remap(&input_jar()?, &mapping()?)?;
	let entries = read_entries(&output)?;

	let class = ClassFile::read(&entries["org/example/Foo.class"])?;
	let header = class.header()?;
	assert_eq!(header.name, s("org/example/Foo"));
	assert_eq!(header.super_class, Some(s("java/lang/Object")));

	let fields = class.fields.iter()
		.map(|field| Ok((class.pool.get_utf8(field.name_index)?, class.pool.get_utf8(field.descriptor_index)?)))
		.collect::<Result<Vec<_>>>()?;
	assert_eq!(fields, vec![(j("count"), j("I")), (j("INSTANCE"), j("Lorg/example/Foo;"))]);

	let methods = class.methods.iter()
		.map(|method| Ok((class.pool.get_utf8(method.name_index)?, class.pool.get_utf8(method.descriptor_index)?)))
		.collect::<Result<Vec<_>>>()?;
	assert_eq!(methods, vec![(j("run"), j("()V")), (j("copy"), j("(Lorg/example/Foo;)Lorg/example/Foo;"))]);

	let Attribute::MethodParameters(parameters) = &class.methods[1].attributes[0].attribute else {
		panic!("expected method parameters, got {:?}", class.methods[1].attributes[0]);
	};
	assert_eq!(class.pool.get_utf8(parameters[0].name_index)?, j("p0"));

	assert_eq!(member_refs(&class)?, vec![
		(s("org/example/Foo"), s("count"), s("I")),
		(s("org/example/Foo"), s("copy"), s("(Lorg/example/Foo;)Lorg/example/Foo;")),
	]);

	let Attribute::Annotations(annotations) = &class.fields[0].attributes[0].attribute else {
		panic!("expected annotations, got {:?}", class.fields[0].attributes[0]);
	};
	assert_eq!(class.pool.get_utf8(annotations[0].type_index)?, j("Lorg/example/Foo;"));
	assert_eq!(class.pool.get_utf8(annotations[0].element_value_pairs[0].element_name_index)?, j("value"));
	let ElementValue::Enum { type_name_index, const_name_index } = annotations[0].element_value_pairs[0].value else {
		panic!("expected enum value, got {:?}", annotations[0].element_value_pairs[0].value);
	};
	assert_eq!(class.pool.get_utf8(type_name_index)?, j("Lorg/example/Foo;"));
	assert_eq!(class.pool.get_utf8(const_name_index)?, j("INSTANCE"));

	let Attribute::InnerClasses(inner_classes) = &class.attributes[0].attribute else {
		panic!("expected inner classes, got {:?}", class.attributes[0]);
	};
	assert_eq!(class.pool.get_class_name(inner_classes[0].inner_class_info_index)?, j("org/example/Foo$Inner"));
	assert_eq!(class.pool.get_class_name(inner_classes[0].outer_class_info_index)?, j("org/example/Foo"));
	assert_eq!(class.pool.get_utf8(inner_classes[0].inner_name_index)?, j("Inner"));

	let Attribute::SourceFile { sourcefile_index } = class.attributes[1].attribute else {
		panic!("expected source file, got {:?}", class.attributes[1]);
	};
	assert_eq!(class.pool.get_utf8(sourcefile_index)?, j("Foo.java"));
	// the attribute name is the same string as the old value
	assert_eq!(class.pool.get_utf8(class.attributes[1].name_index)?, j("SourceFile"));
	Ok(())
}

#[test]
fn inner_class_source_file() -> Result<()> {
	let (output, _) = remap(&input_jar()?, &mapping()?)?;
	let class = ClassFile::read(&read_entries(&output)?["org/example/Foo$Inner.class"])?;

	let Attribute::SourceFile { sourcefile_index } = class.attributes[0].attribute else {
		panic!("expected source file, got {:?}", class.attributes[0]);
	};
	assert_eq!(class.pool.get_utf8(sourcefile_index)?, j("Foo.java"));
	Ok(())
}

#[test]
fn inherited_members_and_lambdas() -> Result<()> {
	let (output, _) = remap(&input_jar()?, &mapping()?)?;
	let class = ClassFile::read(&read_entries(&output)?["org/example/Bar.class"])?;

	assert_eq!(read_header(&read_entries(&output)?["org/example/Bar.class"])?.super_class, Some(s("org/example/Foo")));

	let refs = member_refs(&class)?;
	assert!(refs.contains(&(s("org/example/Bar"), s("count"), s("I"))), "{refs:?}");
	assert!(refs.contains(&(s("org/example/Bar"), s("run"), s("()V"))), "{refs:?}");
	// not remapped, as it's in java/
	assert!(refs.contains(&(s("java/lang/invoke/LambdaMetafactory"), s("metafactory"), s(LAMBDA_METAFACTORY_DESCRIPTOR))), "{refs:?}");

	let call_sites = class.pool.iter()
		.filter_map(|(_, entry)| match *entry {
			PoolEntry::InvokeDynamic { name_and_type_index, .. } => Some(name_and_type_index),
			_ => None,
		})
		.map(|index| class.pool.get_name_and_type(index))
		.collect::<Result<Vec<_>>>()?;
	assert_eq!(call_sites, vec![(j("run"), j("(Lorg/example/Bar;)Lorg/example/Foo;"))]);
	Ok(())
}

#[test]
fn identity_rerun() -> Result<()> {
	let (first, _) = remap(&input_jar()?, &mapping()?)?;
	let (second, summary) = remap(&MemJar::new("remapped.jar", first.clone()), &Mapping::new())?;

	assert_eq!(summary, RemapSummary { classes: 3, copied: 2, dropped: 0 });
	assert_eq!(read_entries(&second)?, read_entries(&first)?);
	assert_eq!(raw_entry(&second, "log4j2.xml")?, raw_entry(&first, "log4j2.xml")?);
	Ok(())
}

#[test]
fn duplicate_output_entries() -> Result<()> {
	let text = "v1\tofficial\tnamed\nCLASS\ta\tSame\nCLASS\tb\tSame\n";
	let mapping = quill::tiny_v1::read(text.as_bytes(), "named")?;

	let error = remap(&input_jar()?, &mapping).unwrap_err();
	assert!(format!("{error:?}").contains("duplicate entry"), "{error:?}");
	Ok(())
}

#[test]
fn broken_class() -> Result<()> {
	let jar = jar(&[("broken.class", b"not a class")])?;
	assert!(remap(&jar, &Mapping::new()).is_err());
	Ok(())
}

/// Counts how often the jar is opened.
struct CountingJar {
	jar: MemJar,
	opened: Cell<usize>,
}

impl Jar for CountingJar {
	type Opened<'a> = <MemJar as Jar>::Opened<'a> where Self: 'a;

	fn open(&self) -> Result<Self::Opened<'_>> {
		self.opened.set(self.opened.get() + 1);
		self.jar.open()
	}
}

#[test]
fn jar_is_opened_once() -> Result<()> {
	let jar = CountingJar { jar: input_jar()?, opened: Cell::new(0) };

	let (_, summary) = remap_into(&jar, &mapping()?, Cursor::new(Vec::new()))?;

	assert_eq!(summary.classes, 3);
	assert_eq!(jar.opened.get(), 1);
	Ok(())
}

#[test]
fn class_entries_keep_modification_time() -> Result<()> {
	let time = DateTime::from_date_and_time(2020, 2, 29, 13, 37, 42)?;

	let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
	zip.start_file("a.class", SimpleFileOptions::default().last_modified_time(time))?;
	zip.write_all(&class_a()?)?;
	let input = MemJar::new("test.jar", zip.finish()?.into_inner());

	let (output, _) = remap(&input, &mapping()?)?;

	let mut archive = ZipArchive::new(Cursor::new(output))?;
	let file = archive.by_name("org/example/Foo.class")?;
	assert_eq!(file.last_modified(), Some(time));
	Ok(())
}
