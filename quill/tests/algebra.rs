use anyhow::Result;
use java_string::JavaStr;
use pretty_assertions::assert_eq;
use quill::tree::mappings::Mapping;

fn j(s: &str) -> &JavaStr {
	JavaStr::from_str(s)
}

fn official() -> Result<Mapping> {
	quill::proguard::read(include_str!("official.txt").as_bytes())
}

fn intermediary() -> Result<Mapping> {
	quill::tiny_v1::read(include_str!("intermediary.tiny").as_bytes(), "intermediary")
}

#[test]
fn invert_twice() -> Result<()> {
	for mapping in [official()?, intermediary()?] {
		let inverted = mapping.invert()?;
		assert_eq!(inverted.classes().len(), mapping.classes().len());
		assert_eq!(inverted.invert()?, mapping);
	}
	Ok(())
}

#[test]
fn inverted_keys_use_new_names() -> Result<()> {
	let inverted = official()?.invert()?;

	assert_eq!(inverted.get_class(j("com/example/Foo")).found(), Some(j("a")));
	assert_eq!(inverted.get_method(j("com/example/Bar"), j("accept"), j("(Lcom/example/Foo;)V")).found(), Some(j("a")));
	assert_eq!(inverted.get_field(j("com/example/Foo"), j("bar"), j("I")).found(), Some(j("b")));
	Ok(())
}

/// Maps from intermediary names to the deobfuscated names, going through the obfuscated names.
#[test]
fn intermediary_to_named() -> Result<()> {
	let combined = official()?.combine(&intermediary()?.invert()?)?;

	assert_eq!(combined.get_class(j("net/minecraft/class_1")).found(), Some(j("com/example/Foo")));
	assert_eq!(combined.get_class(j("net/minecraft/class_2")).found(), Some(j("com/example/Bar")));
	assert_eq!(combined.get_field(j("net/minecraft/class_1"), j("field_1"), j("I")).found(), Some(j("bar")));
	assert_eq!(combined.get_method(j("net/minecraft/class_1"), j("method_1"), j("()V")).found(), Some(j("baz")));
	assert_eq!(combined.get_method(j("net/minecraft/class_2"), j("method_2"), j("(Lnet/minecraft/class_1;)V")).found(), Some(j("accept")));

	// not in the intermediary mappings, still carried over
	assert_eq!(combined.get_class(j("c")).found(), Some(j("com/example/Unrelated")));
	assert_eq!(combined.classes().len(), 3);
	Ok(())
}

#[test]
fn identity() -> Result<()> {
	let empty = Mapping::new();
	for mapping in [official()?, intermediary()?] {
		assert_eq!(mapping.combine(&empty)?, mapping);
		assert_eq!(empty.combine(&mapping)?, mapping);
	}
	Ok(())
}

#[test]
fn combine_is_total() -> Result<()> {
	let intermediary = intermediary()?;

	// nothing in common: every entry keeps its name
	let mut other = Mapping::new();
	other.add_class(quill::tree::mappings::ClassInfo("x".try_into()?), "y".try_into()?)?;

	let combined = other.combine(&intermediary)?;
	for (key, value) in intermediary.classes() {
		assert_eq!(combined.classes().get(key), Some(value));
	}
	for (key, value) in intermediary.methods() {
		assert_eq!(combined.methods().get(key), Some(value));
	}
	assert_eq!(combined.get_class(j("x")).found(), Some(j("y")));
	Ok(())
}
