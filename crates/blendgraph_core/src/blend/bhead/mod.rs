use crate::blend::bytes::Cursor;
use crate::blend::{BlendError, BlendHeader, Endianness, Result};

/// Parsed block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BHead {
	/// Four-byte block code.
	pub code: [u8; 4],
	/// SDNA struct index for payload interpretation.
	pub sdna_nr: u32,
	/// Stored old address used as the address-table key.
	pub old: u64,
	/// Payload byte length.
	pub len: u64,
	/// Number of struct instances stored in the payload.
	///
	/// Negative on-disk counts read as zero.
	pub nr: u64,
}

impl BHead {
	/// Terminal block code.
	pub const ENDB: [u8; 4] = *b"ENDB";
	/// Schema block code.
	pub const DNA1: [u8; 4] = *b"DNA1";
	/// Thumbnail block code.
	pub const TEST: [u8; 4] = *b"TEST";

	/// Parse a block header from cursor position.
	pub(crate) fn parse(cursor: &mut Cursor<'_>, header: &BlendHeader) -> Result<Self> {
		if header.format_version == BlendHeader::LEGACY_FORMAT_VERSION {
			return Self::parse_legacy(cursor, header);
		}
		Self::parse_v1(cursor, header)
	}

	/// The legacy length field is little-endian in every file; the remaining
	/// integers follow the header's byte order.
	fn parse_legacy(cursor: &mut Cursor<'_>, header: &BlendHeader) -> Result<Self> {
		let at = cursor.pos();
		let code = cursor.read_code4()?;
		let len = i64::from(cursor.read_i32(Endianness::Little)?);
		let old = cursor.read_ptr(header.pointer_size, header.endianness)?;
		let sdna_nr = cursor.read_u32(header.endianness)?;
		let nr = i64::from(cursor.read_i32(header.endianness)?);

		Self::checked(at, code, sdna_nr, old, len, nr)
	}

	fn parse_v1(cursor: &mut Cursor<'_>, header: &BlendHeader) -> Result<Self> {
		let at = cursor.pos();
		let code = cursor.read_code4()?;
		let sdna_nr = cursor.read_u32(header.endianness)?;
		let old = cursor.read_u64(header.endianness)?;
		let len = cursor.read_i64(header.endianness)?;
		let nr = cursor.read_i64(header.endianness)?;

		Self::checked(at, code, sdna_nr, old, len, nr)
	}

	fn checked(at: usize, code: [u8; 4], sdna_nr: u32, old: u64, len: i64, nr: i64) -> Result<Self> {
		if len < 0 {
			return Err(BlendError::InvalidBlockLength {
				at,
				len,
				reason: "negative length",
			});
		}

		Ok(Self {
			code,
			sdna_nr,
			old,
			len: len as u64,
			nr: nr.max(0) as u64,
		})
	}

	/// Return `true` when this is the terminal `ENDB` block.
	pub fn is_endb(&self) -> bool {
		self.code == Self::ENDB
	}
}

#[cfg(test)]
mod tests;
