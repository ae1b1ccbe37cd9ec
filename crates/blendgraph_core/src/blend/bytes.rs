use crate::blend::{BlendError, Endianness, Result};

/// Which part of the file a cursor walks; selects the error raised on short reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Region {
	/// Block framing in the file body.
	Blocks,
	/// Tables inside the `DNA1` payload.
	Schema,
}

/// Bounded cursor over an immutable byte slice.
///
/// Positions are absolute offsets into the backing slice, so error offsets
/// always refer to the original file.
pub(crate) struct Cursor<'a> {
	bytes: &'a [u8],
	pos: usize,
	end: usize,
	region: Region,
}

impl<'a> Cursor<'a> {
	/// Create a cursor over the whole slice at position 0.
	#[cfg(test)]
	pub fn new(bytes: &'a [u8]) -> Self {
		Self {
			bytes,
			pos: 0,
			end: bytes.len(),
			region: Region::Blocks,
		}
	}

	/// Create a cursor limited to `start..end` of `bytes`.
	pub fn bounded(bytes: &'a [u8], start: usize, end: usize, region: Region) -> Self {
		let end = end.min(bytes.len());
		Self {
			bytes,
			pos: start.min(end),
			end,
			region,
		}
	}

	/// Return current absolute byte offset.
	pub fn pos(&self) -> usize {
		self.pos
	}

	/// Return remaining unread bytes before the cursor bound.
	pub fn remaining(&self) -> usize {
		self.end.saturating_sub(self.pos)
	}

	fn eof(&self, need: usize) -> BlendError {
		let at = self.pos;
		let rem = self.remaining();
		match self.region {
			Region::Blocks => BlendError::TruncatedBlock { at, need, rem },
			Region::Schema => BlendError::SchemaTruncated { at, need, rem },
		}
	}

	/// Read exactly `n` bytes and advance cursor.
	pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8]> {
		if n > self.remaining() {
			return Err(self.eof(n));
		}

		let start = self.pos;
		self.pos += n;
		Ok(&self.bytes[start..self.pos])
	}

	/// Read a four-byte code.
	pub fn read_code4(&mut self) -> Result<[u8; 4]> {
		self.read_array::<4>()
	}

	fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
		let raw = self.read_exact(N)?;
		let mut out = [0_u8; N];
		out.copy_from_slice(raw);
		Ok(out)
	}

	/// Read a `u16` using the selected endianness.
	pub fn read_u16(&mut self, endianness: Endianness) -> Result<u16> {
		let buf = self.read_array::<2>()?;
		Ok(match endianness {
			Endianness::Little => u16::from_le_bytes(buf),
			Endianness::Big => u16::from_be_bytes(buf),
		})
	}

	/// Read a `u32` using the selected endianness.
	pub fn read_u32(&mut self, endianness: Endianness) -> Result<u32> {
		let buf = self.read_array::<4>()?;
		Ok(match endianness {
			Endianness::Little => u32::from_le_bytes(buf),
			Endianness::Big => u32::from_be_bytes(buf),
		})
	}

	/// Read an `i32` using the selected endianness.
	pub fn read_i32(&mut self, endianness: Endianness) -> Result<i32> {
		let buf = self.read_array::<4>()?;
		Ok(match endianness {
			Endianness::Little => i32::from_le_bytes(buf),
			Endianness::Big => i32::from_be_bytes(buf),
		})
	}

	/// Read a `u64` using the selected endianness.
	pub fn read_u64(&mut self, endianness: Endianness) -> Result<u64> {
		let buf = self.read_array::<8>()?;
		Ok(match endianness {
			Endianness::Little => u64::from_le_bytes(buf),
			Endianness::Big => u64::from_be_bytes(buf),
		})
	}

	/// Read an `i64` using the selected endianness.
	pub fn read_i64(&mut self, endianness: Endianness) -> Result<i64> {
		let buf = self.read_array::<8>()?;
		Ok(match endianness {
			Endianness::Little => i64::from_le_bytes(buf),
			Endianness::Big => i64::from_be_bytes(buf),
		})
	}

	/// Read a pointer-sized unsigned integer and widen to `u64`.
	pub fn read_ptr(&mut self, pointer_size: usize, endianness: Endianness) -> Result<u64> {
		match pointer_size {
			4 => Ok(u64::from(self.read_u32(endianness)?)),
			_ => self.read_u64(endianness),
		}
	}

	/// Skip at most `max` zero bytes, returning how many were skipped.
	pub fn skip_zero_padding(&mut self, max: usize) -> usize {
		let mut skipped = 0;
		while skipped < max && self.pos < self.end && self.bytes[self.pos] == 0 {
			self.pos += 1;
			skipped += 1;
		}
		skipped
	}

	/// Move forward until `marker` starts at the cursor, looking at most `window` bytes ahead.
	///
	/// On success the cursor is left just past the marker.
	pub fn seek_marker(&mut self, marker: &'static str, window: usize) -> Result<()> {
		let expected = marker.as_bytes();
		for skip in 0..=window {
			let start = self.pos + skip;
			let Some(end) = start.checked_add(expected.len()) else {
				break;
			};
			if end > self.end {
				break;
			}
			if &self.bytes[start..end] == expected {
				self.pos = end;
				return Ok(());
			}
		}

		Err(BlendError::SchemaAlignment {
			expected: marker,
			at: self.pos,
			window,
		})
	}

	/// Read a zero-terminated byte string without the terminator.
	pub fn read_cstring_bytes(&mut self) -> Result<&'a [u8]> {
		let start = self.pos;
		let rem = &self.bytes[self.pos..self.end];
		let Some(rel_end) = rem.iter().position(|byte| *byte == 0) else {
			return Err(self.eof(rem.len() + 1));
		};

		let end = start + rel_end;
		self.pos = end + 1;
		Ok(&self.bytes[start..end])
	}
}

#[cfg(test)]
mod tests {
	use super::{Cursor, Region};
	use crate::blend::{BlendError, Endianness};

	#[test]
	fn reads_respect_endianness() {
		let bytes = [0x01, 0x02, 0x03, 0x04];
		let mut little = Cursor::new(&bytes);
		let mut big = Cursor::new(&bytes);
		assert_eq!(little.read_u32(Endianness::Little).expect("read"), 0x0403_0201);
		assert_eq!(big.read_u32(Endianness::Big).expect("read"), 0x0102_0304);
	}

	#[test]
	fn short_read_in_schema_region_is_schema_truncated() {
		let bytes = [0_u8; 6];
		let mut cursor = Cursor::bounded(&bytes, 2, 4, Region::Schema);
		let err = cursor.read_u32(Endianness::Little).expect_err("only two bytes in bound");
		assert!(matches!(err, BlendError::SchemaTruncated { at: 2, need: 4, rem: 2 }));
	}

	#[test]
	fn seek_marker_tolerates_bounded_gap() {
		let mut bytes = vec![0xEE_u8; 5];
		bytes.extend_from_slice(b"TYPE");
		let mut cursor = Cursor::new(&bytes);
		cursor.seek_marker("TYPE", 8).expect("marker within window");
		assert_eq!(cursor.pos(), 9);
	}

	#[test]
	fn seek_marker_does_not_widen_window() {
		let mut bytes = vec![0xEE_u8; 9];
		bytes.extend_from_slice(b"TLEN");
		let mut cursor = Cursor::new(&bytes);
		let err = cursor.seek_marker("TLEN", 8).expect_err("marker is one byte past window");
		assert!(matches!(err, BlendError::SchemaAlignment { expected: "TLEN", at: 0, window: 8 }));
	}

	#[test]
	fn zero_padding_skip_is_bounded() {
		let bytes = [0_u8; 12];
		let mut cursor = Cursor::new(&bytes);
		assert_eq!(cursor.skip_zero_padding(8), 8);
		assert_eq!(cursor.pos(), 8);
	}
}
