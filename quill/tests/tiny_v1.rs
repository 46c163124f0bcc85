use anyhow::Result;
use java_string::JavaStr;
use pretty_assertions::assert_eq;
use quill::format::{MappingFormat, ParseOptions};
use quill::tiny_v1::UnknownNamespace;

fn j(s: &str) -> &JavaStr {
	JavaStr::from_str(s)
}

#[test]
fn select_namespace() -> Result<()> {
	let input = include_str!("tiny_v1_input.tiny");

	let beta = quill::tiny_v1::read(input.as_bytes(), "beta")?;
	assert_eq!(beta.get_class(j("a")).found(), Some(j("com/example/Foo")));
	// empty name in that column
	assert_eq!(beta.get_class(j("b")).found(), None);
	assert_eq!(beta.get_field(j("a"), j("c"), j("Lb;")).found(), Some(j("bar")));
	assert_eq!(beta.get_method(j("a"), j("d"), j("(Lb;)La;")).found(), Some(j("baz")));
	assert_eq!(beta.get_method(j("a"), j("e"), j("()V")).found(), None);
	assert_eq!(beta.get_method(j("b"), j("f"), j("()V")).found(), Some(j("qux")));
	assert_eq!(beta.classes().len(), 1);
	assert_eq!(beta.methods().len(), 2);

	let alpha = quill::tiny_v1::read(input.as_bytes(), "alpha")?;
	assert_eq!(alpha.get_class(j("b")).found(), Some(j("class_2")));
	// descriptors stay in the first namespace
	assert_eq!(alpha.get_method(j("a"), j("d"), j("(Lb;)La;")).found(), Some(j("method_1")));
	assert_eq!(alpha.classes().len(), 2);
	assert_eq!(alpha.methods().len(), 3);

	Ok(())
}

#[test]
fn unknown_namespace() -> Result<()> {
	let input = include_str!("tiny_v1_input.tiny");

	let error = quill::tiny_v1::read(input.as_bytes(), "gamma").unwrap_err();
	let unknown = error.downcast_ref::<UnknownNamespace>().expect("error is an unknown namespace");
	assert_eq!(unknown, &UnknownNamespace {
		requested: "gamma".to_owned(),
		available: vec!["alpha".to_owned(), "beta".to_owned()],
	});
	assert!(error.to_string().contains("\"alpha\""), "{error}");

	// the first namespace is the one mapped from
	assert!(quill::tiny_v1::read(input.as_bytes(), "official").is_err());
	Ok(())
}

#[test]
fn format_errors() -> Result<()> {
	let error = quill::tiny_v1::read("v2\ta\tb\n".as_bytes(), "b").unwrap_err();
	assert!(error.to_string().contains("v1 header was not detected"), "{error:?}");

	assert!(quill::tiny_v1::read("".as_bytes(), "b").is_err());

	let error = quill::tiny_v1::read("v1\ta\tb\nCLASS\tx\ty\nPACKAGE\tx\ty\n".as_bytes(), "b").unwrap_err();
	assert!(format!("{error:#}").contains("in line 3"), "{error:#}");
	assert!(format!("{error:#}").contains("unknown mapping target"), "{error:#}");

	let error = quill::tiny_v1::read("v1\ta\tb\nCLASS\tx\ty\nCLASS\tx\tz\n".as_bytes(), "b").unwrap_err();
	assert!(format!("{error:#}").contains("in line 3"), "{error:#}");

	assert!(quill::tiny_v1::read("v1\ta\tb\nCLASS\tx\n".as_bytes(), "b").is_err());
	assert!(quill::tiny_v1::read("v1\ta\tb\nCLASS\tx.y\tz\n".as_bytes(), "b").is_err());
	Ok(())
}

#[test]
fn through_format() -> Result<()> {
	let input = include_str!("tiny_v1_input.tiny");

	let mapping = MappingFormat::TinyV1.parse(input, &ParseOptions::with_namespace("beta"))?;
	assert_eq!(mapping, quill::tiny_v1::read(input.as_bytes(), "beta")?);

	assert!(MappingFormat::TinyV1.check_options(&ParseOptions::default()).is_err());
	assert!(MappingFormat::Proguard.check_options(&ParseOptions::default()).is_ok());
	Ok(())
}
