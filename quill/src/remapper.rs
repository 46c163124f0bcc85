//! Remappers for remapping class names, descriptors, fields and methods.
//!
//! For remapping just classes and descriptors, you're interested in [`ARemapper`].
//! If you also want to remap field names and method names, use the [`BRemapper`].
//!
//! An implementor of both can be created from a [`Mapping`] with [`Mapping::remapper`].
//!
//! # What is a "remapper"?
//! A remapper answers the question for you "what is the name of X in the namespace mapped to?"
//!
//! Members are looked up on the class they're referenced on first. If there's no mapping there, the parents of that
//! class are searched, since a mapping file usually only names a member on the class declaring it.

use anyhow::Result;
use indexmap::IndexSet;
use java_string::{JavaStr, JavaString};
use crate::hierarchy::{ClassLink, HierarchyPool};
use crate::tree::descriptor::{map_descriptor, map_signature};
use crate::tree::mappings::Mapping;

/// Classes in this package are never renamed, and neither are their members.
const PLATFORM_PREFIX: &str = "java/";

const CONSTRUCTOR: &str = "<init>";
const STATIC_INITIALIZER: &str = "<clinit>";

/// A remapper supporting remapping of class names and descriptors.
pub trait ARemapper {
	/// Maps a class name to a new one, if the mapping exists.
	///
	/// If the mapping doesn't exist, returns `Ok(None)`.
	fn map_class_fail(&self, class: &JavaStr) -> Result<Option<JavaString>>;

	/// Maps a class name to a new one, if the mapping doesn't exist, return the old one.
	///
	/// Do not implement this yourself.
	fn map_class(&self, class: &JavaStr) -> Result<JavaString> {
		Ok(self.map_class_fail(class)?.unwrap_or_else(|| class.to_owned()))
	}

	/// Maps any class name, including array class names like `[Lorg/example/Foo;`.
	///
	/// Do not implement this yourself.
	fn map_class_any(&self, class: &JavaStr) -> Result<JavaString> {
		if class.starts_with('[') {
			self.map_desc(class)
		} else {
			self.map_class(class)
		}
	}

	/// Maps a field or method descriptor to a new one.
	///
	/// Do not implement this yourself.
	fn map_desc(&self, desc: &JavaStr) -> Result<JavaString> {
		map_descriptor(desc, |class| self.map_class(class))
	}

	/// Maps a generic signature, as found in the `Signature` attribute.
	///
	/// Do not implement this yourself.
	fn map_signature(&self, signature: &JavaStr) -> Result<JavaString> {
		map_signature(signature, |class| self.map_class(class))
	}
}

/// A remapper supporting remapping fields and methods, as well as class names and descriptors.
///
/// All the arguments are given in the namespace mapped from.
pub trait BRemapper: ARemapper {
	/// Maps a field name to a new one, if the mapping exists.
	///
	/// If the mapping doesn't exist, returns `Ok(None)`.
	fn map_field_fail(&self, owner: &JavaStr, name: &JavaStr, desc: &JavaStr) -> Result<Option<JavaString>>;

	/// Maps a field name to a new one, if the mapping doesn't exist, return the old one.
	///
	/// Do not implement this yourself.
	fn map_field(&self, owner: &JavaStr, name: &JavaStr, desc: &JavaStr) -> Result<JavaString> {
		Ok(self.map_field_fail(owner, name, desc)?.unwrap_or_else(|| name.to_owned()))
	}

	/// Maps a method name to a new one, if the mapping exists.
	///
	/// If the mapping doesn't exist, returns `Ok(None)`.
	fn map_method_fail(&self, owner: &JavaStr, name: &JavaStr, desc: &JavaStr) -> Result<Option<JavaString>>;

	/// Maps a method name to a new one, if the mapping doesn't exist, return the old one.
	///
	/// Do not implement this yourself.
	fn map_method(&self, owner: &JavaStr, name: &JavaStr, desc: &JavaStr) -> Result<JavaString> {
		Ok(self.map_method_fail(owner, name, desc)?.unwrap_or_else(|| name.to_owned()))
	}

	/// Maps the name of a record component. Record components share their name with the field holding them.
	fn map_record_component(&self, owner: &JavaStr, name: &JavaStr, desc: &JavaStr) -> Result<JavaString> {
		self.map_field(owner, name, desc)
	}
}

/// Gives the direct parents of a class.
pub trait SuperClassProvider {
	/// Returns `None` if nothing is known about the class.
	fn get_class_link(&self, class: &JavaStr) -> Result<Option<&ClassLink>>;
}

impl SuperClassProvider for HierarchyPool {
	fn get_class_link(&self, class: &JavaStr) -> Result<Option<&ClassLink>> {
		Ok(self.get(class))
	}
}

pub struct NoSuperClassProvider;

impl NoSuperClassProvider {
	pub fn new() -> &'static NoSuperClassProvider {
		static INSTANCE: NoSuperClassProvider = NoSuperClassProvider;
		&INSTANCE
	}
}

impl SuperClassProvider for NoSuperClassProvider {
	fn get_class_link(&self, _class: &JavaStr) -> Result<Option<&ClassLink>> {
		Ok(None)
	}
}

/// A remapper applying a [`Mapping`], looking at the parents given by the [`SuperClassProvider`] for members.
#[derive(Debug)]
pub struct MappingRemapper<'a, 'i, S> {
	mapping: &'a Mapping,
	super_classes: &'i S,
}

impl<S: SuperClassProvider> MappingRemapper<'_, '_, S> {
	/// Searches the class and then its parents for a mapping of a member, using `lookup`.
	///
	/// The parents are searched depth first, interfaces before the super class. A parent having a mapping to the
	/// same name doesn't count, and its parents aren't searched. Every class is visited only once, so a broken
	/// hierarchy with a cycle still terminates.
	fn find_in_hierarchy(
		&self,
		owner: &JavaStr,
		name: &JavaStr,
		lookup: impl Fn(&JavaStr) -> Option<JavaString>,
	) -> Result<Option<JavaString>> {
		let mut stack = vec![owner];
		let mut visited = IndexSet::new();

		while let Some(class) = stack.pop() {
			if !visited.insert(class) || class.starts_with(PLATFORM_PREFIX) {
				continue;
			}

			if let Some(found) = lookup(class) {
				if class == owner || found.as_java_str() != name {
					return Ok(Some(found));
				}
				continue;
			}

			if let Some(link) = self.super_classes.get_class_link(class)? {
				stack.extend(link.parents().rev().map(|parent| parent.as_java_str()));
			}
		}

		Ok(None)
	}
}

impl<S> ARemapper for MappingRemapper<'_, '_, S> {
	fn map_class_fail(&self, class: &JavaStr) -> Result<Option<JavaString>> {
		Ok(self.mapping.get_class(class).found().map(ToOwned::to_owned))
	}
}

impl<S: SuperClassProvider> BRemapper for MappingRemapper<'_, '_, S> {
	fn map_field_fail(&self, owner: &JavaStr, name: &JavaStr, desc: &JavaStr) -> Result<Option<JavaString>> {
		self.find_in_hierarchy(owner, name, |class| {
			self.mapping.get_field(class, name, desc).found().map(ToOwned::to_owned)
		})
	}

	fn map_method_fail(&self, owner: &JavaStr, name: &JavaStr, desc: &JavaStr) -> Result<Option<JavaString>> {
		if name == JavaStr::from_str(CONSTRUCTOR) || name == JavaStr::from_str(STATIC_INITIALIZER) {
			return Ok(None);
		}
		self.find_in_hierarchy(owner, name, |class| {
			self.mapping.get_method(class, name, desc).found().map(ToOwned::to_owned)
		})
	}
}

impl Mapping {
	/// Creates a remapper applying this mapping, that uses `super_classes` to find mappings of inherited members.
	pub fn remapper<'a, 'i, S: SuperClassProvider>(&'a self, super_classes: &'i S) -> MappingRemapper<'a, 'i, S> {
		MappingRemapper { mapping: self, super_classes }
	}
}
