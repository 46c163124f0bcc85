//! Rewriting the class names inside of descriptors and generic signatures.

use std::iter::Peekable;
use anyhow::{anyhow, bail, Context, Result};
use java_string::{Chars, JavaCodePoint, JavaStr, JavaString};

const B: JavaCodePoint = JavaCodePoint::from_char('B');
const C: JavaCodePoint = JavaCodePoint::from_char('C');
const D: JavaCodePoint = JavaCodePoint::from_char('D');
const F: JavaCodePoint = JavaCodePoint::from_char('F');
const I: JavaCodePoint = JavaCodePoint::from_char('I');
const J: JavaCodePoint = JavaCodePoint::from_char('J');
const L: JavaCodePoint = JavaCodePoint::from_char('L');
const S: JavaCodePoint = JavaCodePoint::from_char('S');
const T: JavaCodePoint = JavaCodePoint::from_char('T');
const Z: JavaCodePoint = JavaCodePoint::from_char('Z');
const ARRAY: JavaCodePoint = JavaCodePoint::from_char('[');

fn next(chars: &mut Peekable<Chars>) -> Result<JavaCodePoint> {
	chars.next().ok_or_else(|| anyhow!("unexpected abrupt ending"))
}

/// Reads a class name up to (but excluding) one of the `terminators`, which must be present.
fn read_class_name(chars: &mut Peekable<Chars>, terminators: &[char]) -> Result<JavaString> {
	let mut name = JavaString::new();
	while let Some(&char) = chars.peek() {
		if terminators.iter().any(|&t| char == t) {
			if name.is_empty() {
				bail!("empty class name");
			}
			return Ok(name);
		}
		name.push_java(char);
		chars.next();
	}
	bail!("unexpected abrupt ending of class name {name:?}")
}

fn map_field_type(
	chars: &mut Peekable<Chars>,
	out: &mut JavaString,
	map_class: &mut impl FnMut(&JavaStr) -> Result<JavaString>,
) -> Result<()> {
	let char = next(chars)?;
	match char {
		B | C | D | F | I | J | S | Z => out.push_java(char),
		ARRAY => {
			out.push('[');
			map_field_type(chars, out, map_class)?;
		},
		L => {
			let class = read_class_name(chars, &[';'])?;
			chars.next();

			out.push('L');
			out.push_java_str(&map_class(&class)?);
			out.push(';');
		},
		x => bail!("unexpected char {x:?} in descriptor"),
	}
	Ok(())
}

/// Replaces every class name inside of a field or method descriptor using the given function.
///
/// This also checks that the descriptor is valid.
///
/// ```
/// # use pretty_assertions::assert_eq;
/// use java_string::{JavaStr, JavaString};
/// use quill::tree::descriptor::map_descriptor;
///
/// let desc = JavaStr::from_str("(I[La;Lb;)La;");
/// let mapped = map_descriptor(desc, |class| Ok(if class == JavaStr::from_str("a") {
///     JavaString::from("org/example/A")
/// } else {
///     class.to_owned()
/// })).unwrap();
/// assert_eq!(mapped, JavaStr::from_str("(I[Lorg/example/A;Lb;)Lorg/example/A;"));
/// ```
pub fn map_descriptor(desc: &JavaStr, mut map_class: impl FnMut(&JavaStr) -> Result<JavaString>) -> Result<JavaString> {
	let mut chars = desc.chars().peekable();
	let mut out = JavaString::with_capacity(desc.len());

	if chars.next_if_eq(&'(').is_some() {
		out.push('(');
		while chars.next_if_eq(&')').is_none() {
			map_field_type(&mut chars, &mut out, &mut map_class)
				.with_context(|| anyhow!("failed to read parameter descriptor of {desc:?}"))?;
		}
		out.push(')');

		if chars.next_if_eq(&'V').is_some() {
			out.push('V');
		} else {
			map_field_type(&mut chars, &mut out, &mut map_class)
				.with_context(|| anyhow!("failed to read return descriptor of {desc:?}"))?;
		}
	} else {
		map_field_type(&mut chars, &mut out, &mut map_class)
			.with_context(|| anyhow!("failed to read field descriptor {desc:?}"))?;
	}

	if chars.peek().is_some() {
		bail!("expected end of descriptor {desc:?}, got {:?} remaining", JavaString::from_iter(chars));
	}

	Ok(out)
}

/// Rewrites a generic signature (of a class, field, method, record component or local variable).
struct SignatureMapper<'a, M> {
	chars: Peekable<Chars<'a>>,
	out: JavaString,
	map_class: M,
}

impl<M: FnMut(&JavaStr) -> Result<JavaString>> SignatureMapper<'_, M> {
	fn copy(&mut self) -> Result<JavaCodePoint> {
		let char = next(&mut self.chars)?;
		self.out.push_java(char);
		Ok(char)
	}

	fn expect(&mut self, expected: char) -> Result<()> {
		let char = self.copy()?;
		if char != expected {
			bail!("expected {expected:?}, got {char:?}");
		}
		Ok(())
	}

	fn peek_is(&mut self, char: char) -> bool {
		self.chars.peek().is_some_and(|&c| c == char)
	}

	/// `<T:Ljava/lang/Object;U::Ljava/lang/Comparable<TU;>;>`
	fn type_parameters(&mut self) -> Result<()> {
		self.expect('<')?;
		while !self.peek_is('>') {
			// identifier
			while !self.peek_is(':') {
				self.copy()?;
			}
			// class bound, may be empty
			self.expect(':')?;
			if !self.peek_is(':') && !self.peek_is('>') {
				self.reference_type()?;
			}
			// interface bounds
			while self.peek_is(':') {
				self.copy()?;
				self.reference_type()?;
			}
		}
		self.expect('>')
	}

	fn java_type(&mut self) -> Result<()> {
		match self.chars.peek().copied() {
			Some(B | C | D | F | I | J | S | Z) => {
				self.copy()?;
				Ok(())
			},
			_ => self.reference_type(),
		}
	}

	fn reference_type(&mut self) -> Result<()> {
		match self.chars.peek().copied() {
			Some(L) => self.class_type(),
			Some(T) => {
				while self.copy()? != ';' {}
				Ok(())
			},
			Some(ARRAY) => {
				self.copy()?;
				self.java_type()
			},
			Some(x) => bail!("unexpected char {x:?} in signature"),
			None => bail!("unexpected abrupt ending of signature"),
		}
	}

	/// `Lpkg/Outer<TT;>.Inner<*>;`, where the inner class name is `pkg/Outer$Inner`.
	fn class_type(&mut self) -> Result<()> {
		self.expect('L')?;
		let mut old_name = read_class_name(&mut self.chars, &['<', '.', ';'])?;
		let mut new_name = (self.map_class)(&old_name)?;
		self.out.push_java_str(&new_name);

		loop {
			if self.peek_is('<') {
				self.type_arguments()?;
			}
			if self.peek_is('.') {
				self.copy()?;
				let inner = read_class_name(&mut self.chars, &['<', '.', ';'])?;

				old_name.push('$');
				old_name.push_java_str(&inner);
				let new_full = (self.map_class)(&old_name)?;

				self.out.push_java_str(&inner_name(&new_name, &new_full));
				new_name = new_full;
			} else {
				return self.expect(';');
			}
		}
	}

	fn type_arguments(&mut self) -> Result<()> {
		self.expect('<')?;
		while !self.peek_is('>') {
			if self.peek_is('*') {
				self.copy()?;
			} else {
				if self.peek_is('+') || self.peek_is('-') {
					self.copy()?;
				}
				self.reference_type()?;
			}
		}
		self.expect('>')
	}

	fn signature(&mut self) -> Result<()> {
		if self.peek_is('<') {
			self.type_parameters()?;
		}
		if self.peek_is('(') {
			self.copy()?;
			while !self.peek_is(')') {
				self.java_type()?;
			}
			self.copy()?;
			if self.peek_is('V') {
				self.copy()?;
			} else {
				self.java_type()?;
			}
			while self.peek_is('^') {
				self.copy()?;
				self.reference_type()?;
			}
		} else {
			// a class signature has a super class and interfaces, a field signature is a single type
			while self.chars.peek().is_some() {
				self.reference_type()?;
			}
		}
		Ok(())
	}
}

/// The part of `full` after `outer$`, or after the last `$` if `full` doesn't start with `outer$`.
fn inner_name(outer: &JavaStr, full: &JavaStr) -> JavaString {
	let mut chars = full.chars();
	let prefixed = outer.chars().all(|c| chars.next() == Some(c))
		&& chars.next().is_some_and(|c| c == '$');

	if prefixed {
		JavaString::from_iter(chars)
	} else {
		match full.rsplit_once('$') {
			Some((_, inner)) => inner.to_owned(),
			None => full.to_owned(),
		}
	}
}

/// Replaces every class name inside of a generic signature using the given function.
///
/// Inner classes of parameterized types (`Lpkg/Outer<TT;>.Inner;`) are looked up with their binary name
/// (`pkg/Outer$Inner`), and only the part after the mapped outer class is written back.
///
/// ```
/// # use pretty_assertions::assert_eq;
/// use java_string::{JavaStr, JavaString};
/// use quill::tree::descriptor::map_signature;
///
/// let signature = JavaStr::from_str("<T:La;>La<TT;>.b;Ljava/util/List<La;>;");
/// let mapped = map_signature(signature, |class| Ok(match class.as_str().unwrap() {
///     "a" => JavaString::from("org/example/A"),
///     "a$b" => JavaString::from("org/example/A$B"),
///     _ => class.to_owned(),
/// })).unwrap();
/// assert_eq!(mapped, JavaStr::from_str("<T:Lorg/example/A;>Lorg/example/A<TT;>.B;Ljava/util/List<Lorg/example/A;>;"));
/// ```
pub fn map_signature(signature: &JavaStr, map_class: impl FnMut(&JavaStr) -> Result<JavaString>) -> Result<JavaString> {
	let mut mapper = SignatureMapper {
		chars: signature.chars().peekable(),
		out: JavaString::with_capacity(signature.len()),
		map_class,
	};
	mapper.signature()
		.with_context(|| anyhow!("failed to map signature {signature:?}"))?;
	Ok(mapper.out)
}
