//! Big endian reading and writing of the primitive parts of a class file.

use std::io::{Cursor, Read, Write};
use anyhow::{anyhow, bail, Context, Result};

pub(crate) trait ClassRead {
	fn read_n<const N: usize>(&mut self) -> Result<[u8; N]>;
	fn read_u8_vec(&mut self, size: usize) -> Result<Vec<u8>>;

	/// Returns `true` if there's no more data left.
	fn is_at_end(&self) -> bool;

	fn read_u8(&mut self) -> Result<u8> {
		Ok(u8::from_be_bytes(self.read_n().context("couldn't read u8, perhaps the data's end is reached?")?))
	}
	fn read_u16(&mut self) -> Result<u16> {
		Ok(u16::from_be_bytes(self.read_n().context("couldn't read u16, perhaps the data's end is reached?")?))
	}
	fn read_u32(&mut self) -> Result<u32> {
		Ok(u32::from_be_bytes(self.read_n().context("couldn't read u32, perhaps the data's end is reached?")?))
	}
	fn read_u64(&mut self) -> Result<u64> {
		Ok(u64::from_be_bytes(self.read_n().context("couldn't read u64, perhaps the data's end is reached?")?))
	}

	fn read_u8_as_usize(&mut self) -> Result<usize> {
		Ok(self.read_u8()? as usize)
	}
	fn read_u16_as_usize(&mut self) -> Result<usize> {
		Ok(self.read_u16()? as usize)
	}
	fn read_u32_as_usize(&mut self) -> Result<usize> {
		usize::try_from(self.read_u32()?)
			.context("u32 length doesn't fit into usize")
	}

	fn read_vec<T, S, E>(&mut self, get_size: S, mut get_element: E) -> Result<Vec<T>>
		where
			S: FnOnce(&mut Self) -> Result<usize>,
			E: FnMut(&mut Self) -> Result<T>
	{
		let size = get_size(self)?;
		let mut vec = Vec::with_capacity(size);
		for _ in 0..size {
			vec.push(get_element(self)?);
		}
		Ok(vec)
	}
}

impl<T: AsRef<[u8]>> ClassRead for Cursor<T> {
	fn read_n<const N: usize>(&mut self) -> Result<[u8; N]> {
		let mut buf = [0u8; N];
		self.read_exact(&mut buf)?;
		Ok(buf)
	}

	fn read_u8_vec(&mut self, size: usize) -> Result<Vec<u8>> {
		let remaining = (self.get_ref().as_ref().len() as u64).saturating_sub(self.position());
		if size as u64 > remaining {
			bail!("wanted to read {size} bytes, but only {remaining} are left");
		}
		let mut vec = vec![0; size];
		self.read_exact(&mut vec)?;
		Ok(vec)
	}

	fn is_at_end(&self) -> bool {
		self.position() >= self.get_ref().as_ref().len() as u64
	}
}

pub(crate) trait ClassWrite {
	fn write_u8_slice(&mut self, slice: &[u8]) -> Result<()>;

	fn write_u8(&mut self, a: u8) -> Result<()> {
		self.write_u8_slice(&[a]).context("couldn't write u8")
	}
	fn write_u16(&mut self, a: u16) -> Result<()> {
		self.write_u8_slice(&a.to_be_bytes()).context("couldn't write u16")
	}
	fn write_u32(&mut self, a: u32) -> Result<()> {
		self.write_u8_slice(&a.to_be_bytes()).context("couldn't write u32")
	}
	fn write_u64(&mut self, a: u64) -> Result<()> {
		self.write_u8_slice(&a.to_be_bytes()).context("couldn't write u64")
	}

	fn write_usize_as_u8(&mut self, a: usize) -> Result<()> {
		let a = u8::try_from(a).with_context(|| anyhow!("length {a} doesn't fit into u8"))?;
		self.write_u8(a)
	}
	fn write_usize_as_u16(&mut self, a: usize) -> Result<()> {
		let a = u16::try_from(a).with_context(|| anyhow!("length {a} doesn't fit into u16"))?;
		self.write_u16(a)
	}
	fn write_usize_as_u32(&mut self, a: usize) -> Result<()> {
		let a = u32::try_from(a).with_context(|| anyhow!("length {a} doesn't fit into u32"))?;
		self.write_u32(a)
	}

	/// Writes the length as `u16` followed by each element.
	fn write_slice<T>(&mut self, slice: &[T], mut put_element: impl FnMut(&mut Self, &T) -> Result<()>) -> Result<()> {
		self.write_usize_as_u16(slice.len())?;
		for element in slice {
			put_element(self, element)?;
		}
		Ok(())
	}
}

impl<T: Write> ClassWrite for T {
	fn write_u8_slice(&mut self, slice: &[u8]) -> Result<()> {
		self.write_all(slice)?;
		Ok(())
	}
}
