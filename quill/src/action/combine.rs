use anyhow::{anyhow, Context, Result};
use indexmap::{IndexMap, IndexSet};
use java_string::JavaStr;
use crate::tree::descriptor::map_descriptor;
use crate::tree::mappings::{ClassInfo, FieldInfo, MemberKey, Mapping, MethodInfo};
use crate::tree::names::{Descriptor, InternalName};

/// Maps class names of the namespace in the middle back to the first one.
struct Reverse<'a> {
	classes: IndexMap<&'a JavaStr, &'a InternalName>,
}

impl<'a> Reverse<'a> {
	fn new(mapping: &'a Mapping) -> Reverse<'a> {
		let classes = mapping.classes().iter()
			.map(|(key, new_name)| (new_name.as_java_str(), &key.0))
			.collect();
		Reverse { classes }
	}

	fn class(&self, class: &InternalName) -> InternalName {
		self.classes.get(class.as_java_str()).map_or(class, |old| *old).clone()
	}

	fn descriptor(&self, descriptor: &Descriptor) -> Result<Descriptor> {
		let mapped = map_descriptor(descriptor.as_java_str(), |class| {
			Ok(self.classes.get(class).map_or(class, |old| old.as_java_str()).to_owned())
		})?;
		Descriptor::try_from(mapped)
	}
}

impl Mapping {
	/// Combines two mappings into one.
	///
	/// If `other` maps from namespace `X` to `Y`, and `self` maps from `Y` to `Z`, the result maps from `X` to `Z`.
	///
	/// This never loses entries: an entry of `other` without a corresponding entry in `self` keeps its name from `Y`,
	/// and an entry of `self` that no entry of `other` leads to is kept with its key translated back into `X`. So
	/// combining with an empty mapping on either side gives back the same mapping.
	pub fn combine(&self, other: &Mapping) -> Result<Mapping> {
		let mut m = Mapping::new();

		let mut reached_classes = IndexSet::new();
		let mut reached_fields = IndexSet::new();
		let mut reached_methods = IndexSet::new();

		for (key, name) in other.classes() {
			let new_name = match self.classes().get_full(name.as_java_str()) {
				Some((index, _, new_name)) => {
					reached_classes.insert(index);
					new_name
				},
				None => name,
			};
			m.add_class(key.clone(), new_name.clone())?;
		}

		for (key, name) in other.fields() {
			let middle = other.map_field_info(key)
				.with_context(|| anyhow!("failed to map field {key:?} to the shared namespace"))?;
			let new_name = match self.fields().get_full(&MemberKey(middle.owner.as_java_str(), name, middle.descriptor.as_java_str())) {
				Some((index, _, new_name)) => {
					reached_fields.insert(index);
					new_name
				},
				None => name,
			};
			m.add_field(key.clone(), new_name.clone())?;
		}

		for (key, name) in other.methods() {
			let middle = other.map_method_info(key)
				.with_context(|| anyhow!("failed to map method {key:?} to the shared namespace"))?;
			let new_name = match self.methods().get_full(&MemberKey(middle.owner.as_java_str(), name, middle.descriptor.as_java_str())) {
				Some((index, _, new_name)) => {
					reached_methods.insert(index);
					new_name
				},
				None => name,
			};
			m.add_method(key.clone(), new_name.clone())?;
		}

		let reverse = Reverse::new(other);

		for (index, (key, new_name)) in self.classes().iter().enumerate() {
			if reached_classes.contains(&index) {
				continue;
			}
			let key = ClassInfo(reverse.class(&key.0));
			if !m.classes().contains_key(&key) {
				m.add_class(key, new_name.clone())?;
			}
		}

		for (index, (key, new_name)) in self.fields().iter().enumerate() {
			if reached_fields.contains(&index) {
				continue;
			}
			let key = FieldInfo {
				owner: reverse.class(&key.owner),
				name: key.name.clone(),
				descriptor: reverse.descriptor(&key.descriptor)?,
			};
			if !m.fields().contains_key(&key) {
				m.add_field(key, new_name.clone())?;
			}
		}

		for (index, (key, new_name)) in self.methods().iter().enumerate() {
			if reached_methods.contains(&index) {
				continue;
			}
			let key = MethodInfo {
				owner: reverse.class(&key.owner),
				name: key.name.clone(),
				descriptor: reverse.descriptor(&key.descriptor)?,
			};
			if !m.methods().contains_key(&key) {
				m.add_method(key, new_name.clone())?;
			}
		}

		Ok(m)
	}
}
