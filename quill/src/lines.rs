use std::io::{BufRead, BufReader, Read};
use anyhow::{anyhow, bail, Context, Result};

/// Iterates over the lines of a reader, together with their line number (starting at `1`).
///
/// Blank lines and lines that start with a `#` (after any indentation) are skipped.
pub(crate) fn content_lines(reader: impl Read) -> impl Iterator<Item=Result<(usize, String)>> {
	BufReader::new(reader)
		.lines()
		.enumerate()
		.map(|(index, line)| {
			line.map(|line| (index + 1, line))
				.with_context(|| anyhow!("failed to read line {}", index + 1))
		})
		.filter(|line| match line {
			Ok((_, line)) => {
				let trimmed = line.trim_start();
				!trimmed.is_empty() && !trimmed.starts_with('#')
			},
			Err(_) => true,
		})
}

/// Runs the function on every line, adding the line number to any error.
pub(crate) fn on_every_line(
	lines: impl Iterator<Item=Result<(usize, String)>>,
	mut f: impl FnMut(usize, String) -> Result<()>,
) -> Result<()> {
	for line in lines {
		let (line_number, line) = line?;
		f(line_number, line)
			.with_context(|| anyhow!("in line {line_number}"))?;
	}
	Ok(())
}

/// A line of a tab separated format.
#[derive(Debug)]
pub(crate) struct TinyLine {
	pub(crate) first_field: String,
	fields: std::vec::IntoIter<String>,
}

impl TinyLine {
	pub(crate) fn new(line: &str) -> TinyLine {
		let mut fields = line.split('\t').map(|x| x.to_owned());

		// split always yields at least one element
		let first_field = fields.next().unwrap_or_default();
		let vec: Vec<String> = fields.collect();

		TinyLine {
			first_field,
			fields: vec.into_iter(),
		}
	}

	pub(crate) fn next(&mut self) -> Result<String> {
		self.fields.next()
			.with_context(|| anyhow!("expected another field after {:?}", self.first_field))
	}

	/// Skips `n` fields and returns the one after them. All fields after that one are ignored.
	pub(crate) fn nth(mut self, n: usize) -> Result<String> {
		let available = self.fields.len();
		self.fields.nth(n)
			.with_context(|| anyhow!("expected at least {} more fields after {:?}, got {available}", n + 1, self.first_field))
	}

	/// Returns the remaining fields, failing if there are none.
	pub(crate) fn rest(self) -> Result<Vec<String>> {
		let rest: Vec<String> = self.fields.collect();
		if rest.is_empty() {
			bail!("expected more fields after {:?}", self.first_field);
		}
		Ok(rest)
	}
}
