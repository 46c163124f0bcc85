use std::borrow::Borrow;
use anyhow::{anyhow, bail, Context, Result};
use indexmap::{Equivalent, IndexMap};
use indexmap::map::Entry;
use java_string::{JavaStr, JavaString};
use crate::tree::descriptor::map_descriptor;
use crate::tree::names::{Descriptor, InternalName};

/// A class known to a mapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassInfo(pub InternalName);

impl Borrow<JavaStr> for ClassInfo {
	fn borrow(&self) -> &JavaStr {
		self.0.as_java_str()
	}
}

/// A field in a class. The descriptor is part of the key, as mappings are looked up before the owner is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldInfo {
	pub owner: InternalName,
	pub name: JavaString,
	pub descriptor: Descriptor,
}

/// A method in a class. The descriptor tells overloads apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodInfo {
	pub owner: InternalName,
	pub name: JavaString,
	pub descriptor: Descriptor,
}

/// A borrowed key for looking up [`FieldInfo`] and [`MethodInfo`] without allocating.
///
/// This must hash the same way the derived [`Hash`] of these does.
#[derive(Hash)]
pub(crate) struct MemberKey<'a>(pub(crate) &'a JavaStr, pub(crate) &'a JavaStr, pub(crate) &'a JavaStr);

impl Equivalent<FieldInfo> for MemberKey<'_> {
	fn equivalent(&self, key: &FieldInfo) -> bool {
		self.0 == key.owner.as_java_str() && self.1 == key.name.as_java_str() && self.2 == key.descriptor.as_java_str()
	}
}

impl Equivalent<MethodInfo> for MemberKey<'_> {
	fn equivalent(&self, key: &MethodInfo) -> bool {
		self.0 == key.owner.as_java_str() && self.1 == key.name.as_java_str() && self.2 == key.descriptor.as_java_str()
	}
}

/// The result of looking something up in a [`Mapping`].
///
/// A lookup never fails: if there's no entry, the value looked up with is the result.
#[derive(Debug, PartialEq)]
pub enum OrOriginal<'a, T: ?Sized> {
	Mapped(&'a T),
	Original(&'a T),
}

impl<T: ?Sized> Clone for OrOriginal<'_, T> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<T: ?Sized> Copy for OrOriginal<'_, T> {}

impl<'a, T: ?Sized> OrOriginal<'a, T> {
	pub fn new(found: Option<&'a T>, original: &'a T) -> OrOriginal<'a, T> {
		match found {
			Some(found) => OrOriginal::Mapped(found),
			None => OrOriginal::Original(original),
		}
	}

	/// Returns the mapped value, if there was an entry.
	pub fn found(self) -> Option<&'a T> {
		match self {
			OrOriginal::Mapped(value) => Some(value),
			OrOriginal::Original(_) => None,
		}
	}

	pub fn or_original(self) -> &'a T {
		match self {
			OrOriginal::Mapped(value) | OrOriginal::Original(value) => value,
		}
	}

	pub fn is_mapped(&self) -> bool {
		matches!(self, OrOriginal::Mapped(_))
	}
}

/// Mappings from one namespace into another one.
///
/// All keys are given in the namespace mapped from. Which namespaces these are isn't stored, it's given by how a mapping
/// is obtained and combined with others.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
	classes: IndexMap<ClassInfo, InternalName>,
	fields: IndexMap<FieldInfo, JavaString>,
	methods: IndexMap<MethodInfo, JavaString>,
}

impl Mapping {
	pub fn new() -> Mapping {
		Mapping::default()
	}

	pub fn classes(&self) -> &IndexMap<ClassInfo, InternalName> {
		&self.classes
	}

	pub fn fields(&self) -> &IndexMap<FieldInfo, JavaString> {
		&self.fields
	}

	pub fn methods(&self) -> &IndexMap<MethodInfo, JavaString> {
		&self.methods
	}

	pub fn is_empty(&self) -> bool {
		self.classes.is_empty() && self.fields.is_empty() && self.methods.is_empty()
	}

	/// Adds a class mapping, failing if there's already one for that class.
	pub fn add_class(&mut self, key: ClassInfo, new_name: InternalName) -> Result<()> {
		match self.classes.entry(key) {
			Entry::Occupied(e) => {
				bail!("cannot add class mapping {:?} -> {new_name:?}, as there's already one: {:?}", e.key(), e.get());
			},
			Entry::Vacant(e) => {
				e.insert(new_name);
			},
		}
		Ok(())
	}

	/// Adds a field mapping, failing if there's already one for that field.
	pub fn add_field(&mut self, key: FieldInfo, new_name: JavaString) -> Result<()> {
		match self.fields.entry(key) {
			Entry::Occupied(e) => {
				bail!("cannot add field mapping {:?} -> {new_name:?}, as there's already one: {:?}", e.key(), e.get());
			},
			Entry::Vacant(e) => {
				e.insert(new_name);
			},
		}
		Ok(())
	}

	/// Adds a method mapping, failing if there's already one for that method.
	pub fn add_method(&mut self, key: MethodInfo, new_name: JavaString) -> Result<()> {
		match self.methods.entry(key) {
			Entry::Occupied(e) => {
				bail!("cannot add method mapping {:?} -> {new_name:?}, as there's already one: {:?}", e.key(), e.get());
			},
			Entry::Vacant(e) => {
				e.insert(new_name);
			},
		}
		Ok(())
	}

	pub fn get_class<'a>(&'a self, class: &'a JavaStr) -> OrOriginal<'a, JavaStr> {
		OrOriginal::new(self.classes.get(class).map(InternalName::as_java_str), class)
	}

	pub fn get_field<'a>(&'a self, owner: &JavaStr, name: &'a JavaStr, descriptor: &JavaStr) -> OrOriginal<'a, JavaStr> {
		let found = self.fields.get(&MemberKey(owner, name, descriptor));
		OrOriginal::new(found.map(JavaString::as_java_str), name)
	}

	pub fn get_method<'a>(&'a self, owner: &JavaStr, name: &'a JavaStr, descriptor: &JavaStr) -> OrOriginal<'a, JavaStr> {
		let found = self.methods.get(&MemberKey(owner, name, descriptor));
		OrOriginal::new(found.map(JavaString::as_java_str), name)
	}

	/// Maps all class names inside a descriptor, keeping the ones without an entry.
	pub fn map_descriptor(&self, descriptor: &Descriptor) -> Result<Descriptor> {
		let mapped = map_descriptor(descriptor.as_java_str(), |class| Ok(self.get_class(class).or_original().to_owned()))?;
		Descriptor::try_from(mapped)
	}

	/// Expresses the class in the namespace mapped to.
	pub fn map_class_info(&self, info: &ClassInfo) -> ClassInfo {
		ClassInfo(self.classes.get(info).unwrap_or(&info.0).clone())
	}

	/// Expresses the field in the namespace mapped to: the owner, name and all classes of the descriptor are mapped.
	pub fn map_field_info(&self, info: &FieldInfo) -> Result<FieldInfo> {
		Ok(FieldInfo {
			owner: self.get_class(info.owner.as_java_str()).or_original().try_into()?,
			name: self.fields.get(info).unwrap_or(&info.name).clone(),
			descriptor: self.map_descriptor(&info.descriptor)
				.with_context(|| anyhow!("failed to map descriptor of field {info:?}"))?,
		})
	}

	/// Expresses the method in the namespace mapped to: the owner, name and all classes of the descriptor are mapped.
	pub fn map_method_info(&self, info: &MethodInfo) -> Result<MethodInfo> {
		Ok(MethodInfo {
			owner: self.get_class(info.owner.as_java_str()).or_original().try_into()?,
			name: self.methods.get(info).unwrap_or(&info.name).clone(),
			descriptor: self.map_descriptor(&info.descriptor)
				.with_context(|| anyhow!("failed to map descriptor of method {info:?}"))?,
		})
	}
}
