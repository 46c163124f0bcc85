use std::path::Path;
use anyhow::{anyhow, Context, Result};
use crate::tree::mappings::Mapping;
use crate::{proguard, tiny_v1};

/// The supported formats of mapping files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingFormat {
	/// See [`tiny_v1`].
	TinyV1,
	/// See [`proguard`].
	Proguard,
}

/// Options for parsing a mapping file. Not every format uses every option.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOptions {
	/// The namespace to map to. Required for [`MappingFormat::TinyV1`].
	pub namespace: Option<String>,
}

impl ParseOptions {
	pub fn with_namespace(namespace: impl Into<String>) -> ParseOptions {
		ParseOptions { namespace: Some(namespace.into()) }
	}
}

impl MappingFormat {
	/// Checks that the options contain all the information this format needs.
	pub fn check_options(&self, options: &ParseOptions) -> Result<()> {
		match self {
			MappingFormat::TinyV1 => {
				options.namespace.as_ref()
					.context("reading tiny v1 mappings requires a namespace to map to")?;
			},
			MappingFormat::Proguard => {},
		}
		Ok(())
	}

	#[allow(clippy::tabs_in_doc_comments)]
	/// Parses the text as a mapping in this format.
	///
	/// ```
	/// # use pretty_assertions::assert_eq;
	/// use quill::format::{MappingFormat, ParseOptions};
	///
	/// let text = "v1	official	named\nCLASS	a	Foo\n";
	/// let mapping = MappingFormat::TinyV1.parse(text, &ParseOptions::with_namespace("named")).unwrap();
	/// assert_eq!(mapping.classes().len(), 1);
	///
	/// assert!(MappingFormat::TinyV1.parse(text, &ParseOptions::default()).is_err());
	/// ```
	pub fn parse(&self, text: &str, options: &ParseOptions) -> Result<Mapping> {
		match self {
			MappingFormat::TinyV1 => {
				let namespace = options.namespace.as_deref()
					.context("reading tiny v1 mappings requires a namespace to map to")?;
				tiny_v1::read(text.as_bytes(), namespace)
			},
			MappingFormat::Proguard => proguard::read(text.as_bytes()),
		}
	}

	/// Reads the file at the path as a mapping in this format.
	pub fn read_file(&self, path: impl AsRef<Path>, options: &ParseOptions) -> Result<Mapping> {
		let text = std::fs::read_to_string(&path)
			.with_context(|| anyhow!("failed to read mappings file {:?}", path.as_ref()))?;
		self.parse(&text, options)
			.with_context(|| anyhow!("failed to parse mappings file {:?} as {self:?}", path.as_ref()))
	}
}
