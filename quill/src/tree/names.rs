//! The names used as parts of the keys of a [`Mapping`][crate::tree::mappings::Mapping].

use std::borrow::Borrow;
use std::fmt::{Debug, Display, Formatter};
use anyhow::{anyhow, bail, Context, Result};
use java_string::{JavaStr, JavaString};
use crate::tree::descriptor::map_descriptor;

/// Creates a newtype around a [`JavaString`], that can only be constructed with valid contents.
///
/// The type needs to have a function `fn check_valid(inner: &JavaStr) -> Result<()>`.
macro_rules! make_name {
	(
		$( #[$doc:meta] )*
		$name:ident
	) => {
		$( #[$doc] )*
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
		pub struct $name(JavaString);

		impl $name {
			pub fn as_java_str(&self) -> &JavaStr {
				&self.0
			}

			pub fn into_inner(self) -> JavaString {
				self.0
			}

			/// Checks if a given value is valid for being represented by this type.
			pub fn is_valid(inner: &JavaStr) -> bool {
				$name::check_valid(inner).is_ok()
			}
		}

		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
				Debug::fmt(&self.0, f)
			}
		}

		impl Display for $name {
			fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
				self.0.as_str()
					.map_err(|_| std::fmt::Error)
					.and_then(|s| write!(f, "{}", s))
			}
		}

		impl AsRef<JavaStr> for $name {
			fn as_ref(&self) -> &JavaStr {
				&self.0
			}
		}

		impl Borrow<JavaStr> for $name {
			fn borrow(&self) -> &JavaStr {
				&self.0
			}
		}

		impl PartialEq<JavaStr> for $name {
			fn eq(&self, other: &JavaStr) -> bool {
				self.as_java_str() == other
			}
		}

		impl PartialEq<&str> for $name {
			fn eq(&self, other: &&str) -> bool {
				self.as_java_str() == JavaStr::from_str(other)
			}
		}

		impl TryFrom<JavaString> for $name {
			type Error = anyhow::Error;

			fn try_from(value: JavaString) -> Result<$name> {
				$name::check_valid(&value)
					.with_context(|| anyhow!("on value {value:?}"))?;
				Ok($name(value))
			}
		}

		impl TryFrom<&JavaStr> for $name {
			type Error = anyhow::Error;

			fn try_from(value: &JavaStr) -> Result<$name> {
				$name::try_from(value.to_owned())
			}
		}

		impl TryFrom<String> for $name {
			type Error = anyhow::Error;

			fn try_from(value: String) -> Result<$name> {
				$name::try_from(JavaString::from(value))
			}
		}

		impl TryFrom<&str> for $name {
			type Error = anyhow::Error;

			fn try_from(value: &str) -> Result<$name> {
				$name::try_from(JavaStr::from_str(value))
			}
		}

		impl From<$name> for JavaString {
			fn from(value: $name) -> JavaString {
				value.0
			}
		}
	}
}

make_name! {
	/// A fully qualified binary class name, using `/` as the package separator, like `java/lang/Object`.
	///
	/// This never contains a `.`.
	InternalName
}

impl InternalName {
	pub fn check_valid(inner: &JavaStr) -> Result<()> {
		if inner.is_empty() {
			bail!("internal name must not be empty");
		}
		if inner.contains('.') {
			bail!("internal name {inner:?} must not contain a dot, use `/` as package separator");
		}
		Ok(())
	}
}

make_name! {
	/// A field descriptor like `[Ljava/lang/String;` or a method descriptor like `(IJ)V`.
	Descriptor
}

impl Descriptor {
	pub fn check_valid(inner: &JavaStr) -> Result<()> {
		map_descriptor(inner, |class| Ok(class.to_owned()))
			.map(|_| ())
	}

	pub fn is_method(&self) -> bool {
		self.0.starts_with('(')
	}
}
