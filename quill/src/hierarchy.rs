//! The class hierarchy of a jar, as far as it's needed for finding mappings of inherited members.

use indexmap::IndexMap;
use indexmap::map::Entry;
use java_string::JavaStr;
use log::warn;
use crate::tree::names::InternalName;

/// The direct parents of a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLink {
	pub name: InternalName,
	/// `None` only for `java/lang/Object`.
	pub super_class: Option<InternalName>,
	pub interfaces: Vec<InternalName>,
}

impl ClassLink {
	/// The interfaces in declaration order, followed by the super class.
	pub fn parents(&self) -> impl DoubleEndedIterator<Item=&InternalName> {
		self.interfaces.iter().chain(self.super_class.as_ref())
	}
}

/// All classes of a jar with their direct parents.
///
/// Classes from outside the jar aren't known, asking for them gives `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HierarchyPool {
	links: IndexMap<InternalName, ClassLink>,
}

impl HierarchyPool {
	pub fn new() -> HierarchyPool {
		HierarchyPool::default()
	}

	/// Adds a class. If the class is already known, the first one is kept and `false` is returned.
	pub fn insert(&mut self, link: ClassLink) -> bool {
		match self.links.entry(link.name.clone()) {
			Entry::Occupied(e) => {
				warn!("class {} appears more than once, using the first one seen: {:?}", link.name, e.get());
				false
			},
			Entry::Vacant(e) => {
				e.insert(link);
				true
			},
		}
	}

	pub fn get(&self, class: &JavaStr) -> Option<&ClassLink> {
		self.links.get(class)
	}

	pub fn len(&self) -> usize {
		self.links.len()
	}

	pub fn is_empty(&self) -> bool {
		self.links.is_empty()
	}
}

impl FromIterator<ClassLink> for HierarchyPool {
	fn from_iter<T: IntoIterator<Item=ClassLink>>(iter: T) -> HierarchyPool {
		let mut pool = HierarchyPool::new();
		for link in iter {
			pool.insert(link);
		}
		pool
	}
}

#[cfg(test)]
mod testing {
	use anyhow::Result;
	use java_string::JavaStr;
	use pretty_assertions::assert_eq;
	use crate::hierarchy::{ClassLink, HierarchyPool};
	use crate::tree::names::InternalName;

	#[test]
	fn parents_and_duplicates() -> Result<()> {
		let link = ClassLink {
			name: "a".try_into()?,
			super_class: Some("java/lang/Object".try_into()?),
			interfaces: vec!["b".try_into()?, "c".try_into()?],
		};
		let parents: Vec<&InternalName> = link.parents().collect();
		assert_eq!(parents, vec![&link.interfaces[0], &link.interfaces[1], link.super_class.as_ref().expect("has super class")]);

		let mut pool = HierarchyPool::new();
		assert!(pool.insert(link.clone()));
		assert!(!pool.insert(ClassLink { name: "a".try_into()?, super_class: None, interfaces: Vec::new() }));
		assert_eq!(pool.len(), 1);
		assert_eq!(pool.get(JavaStr::from_str("a")), Some(&link));
		assert_eq!(pool.get(JavaStr::from_str("b")), None);
		Ok(())
	}
}
