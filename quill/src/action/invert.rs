use anyhow::{anyhow, Context, Result};
use crate::tree::mappings::{ClassInfo, Mapping};

impl Mapping {
	#[allow(clippy::tabs_in_doc_comments)]
	/// Swaps the namespaces this mapping maps between.
	///
	/// The keys of the fields and methods are expressed in the namespace that was mapped to before, so their owners
	/// and descriptors are mapped too.
	///
	/// This fails if two classes or members are mapped to the same name, as there's no way to invert that.
	///
	/// ```
	/// # use pretty_assertions::assert_eq;
	/// # use java_string::JavaString;
	/// let mapping = quill::tiny_v1::read("\
	/// v1	official	named
	/// CLASS	a	org/example/Foo
	/// FIELD	a	La;	b	self
	/// ".as_bytes(), "named").unwrap();
	///
	/// let inverted = mapping.invert().unwrap();
	/// let field = inverted.fields().first().unwrap();
	/// assert_eq!(field.0.owner, "org/example/Foo");
	/// assert_eq!(field.0.descriptor, "Lorg/example/Foo;");
	/// assert_eq!(field.1, &JavaString::from("b"));
	///
	/// assert_eq!(inverted.invert().unwrap(), mapping);
	/// ```
	pub fn invert(&self) -> Result<Mapping> {
		let mut m = Mapping::new();

		for (key, new_name) in self.classes() {
			m.add_class(ClassInfo(new_name.clone()), key.0.clone())
				.context("class mappings are not injective")?;
		}

		for (key, _) in self.fields() {
			let new_key = self.map_field_info(key)?;
			m.add_field(new_key, key.name.clone())
				.with_context(|| anyhow!("cannot invert field mapping of {key:?}"))?;
		}

		for (key, _) in self.methods() {
			let new_key = self.map_method_info(key)?;
			m.add_method(new_key, key.name.clone())
				.with_context(|| anyhow!("cannot invert method mapping of {key:?}"))?;
		}

		Ok(m)
	}
}
