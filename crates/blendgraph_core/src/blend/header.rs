use crate::blend::{BlendError, Result};

/// File signature shared by every `.blend` header.
pub const BLEND_MAGIC: &[u8; 7] = b"BLENDER";

/// Byte endianness marker stored in blend headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endianness {
	/// Little-endian byte order (`v` marker).
	Little,
	/// Big-endian byte order (`V` marker).
	Big,
}

impl Endianness {
	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Little => "little",
			Self::Big => "big",
		}
	}
}

/// Parsed blend file header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendHeader {
	/// Total file header size in bytes.
	pub header_size: usize,
	/// Container format version (`0` for legacy headers, `1` for v1 headers).
	pub format_version: u16,
	/// Blender version encoded as decimal digits (for example `280` or `500`).
	pub version: u16,
	/// Pointer width in bytes.
	pub pointer_size: usize,
	/// File byte order.
	pub endianness: Endianness,
}

impl BlendHeader {
	/// Exact size of legacy headers (`BLENDER-v280` style).
	pub const LEGACY_SIZE: usize = 12;
	/// Exact size of v1 headers (`BLENDER17-01v0500`).
	pub const V1_SIZE: usize = 17;
	/// Synthetic format marker for legacy headers.
	pub const LEGACY_FORMAT_VERSION: u16 = 0;
	/// Modern v1 format marker.
	pub const V1_FORMAT_VERSION: u16 = 1;

	/// Parse a blend header from the beginning of `bytes`.
	pub fn parse(bytes: &[u8]) -> Result<Self> {
		let prefix = &bytes[..bytes.len().min(BLEND_MAGIC.len())];
		if prefix != BLEND_MAGIC {
			let mut magic = [0_u8; 7];
			magic[..prefix.len()].copy_from_slice(prefix);
			return Err(BlendError::InvalidMagic { magic });
		}

		let kind = bytes.get(7).copied().ok_or(BlendError::InvalidHeader {
			at: 7,
			reason: "header ends after signature",
		})?;
		if kind.is_ascii_digit() {
			return Self::parse_v1(bytes);
		}

		Self::parse_legacy(bytes)
	}

	/// Version string as it appears in the header (`"280"`, `"0500"`).
	pub fn version_label(&self) -> String {
		if self.format_version == Self::LEGACY_FORMAT_VERSION {
			format!("{:03}", self.version)
		} else {
			format!("{:04}", self.version)
		}
	}

	/// Size of one block header for this file.
	pub fn bhead_size(&self) -> usize {
		if self.format_version == Self::LEGACY_FORMAT_VERSION {
			16 + self.pointer_size
		} else {
			32
		}
	}

	/// Human-readable block-header layout label.
	pub fn bhead_layout_label(&self) -> &'static str {
		if self.format_version == Self::LEGACY_FORMAT_VERSION {
			"legacy"
		} else {
			"large_bhead8"
		}
	}

	fn parse_legacy(bytes: &[u8]) -> Result<Self> {
		let header = bytes.get(0..Self::LEGACY_SIZE).ok_or(BlendError::InvalidHeader {
			at: bytes.len(),
			reason: "header shorter than 12 bytes",
		})?;

		let pointer_size = match header[7] {
			b'_' => 4,
			b'-' => 8,
			_ => {
				return Err(BlendError::InvalidHeader {
					at: 7,
					reason: "unknown pointer-size marker",
				});
			}
		};
		let endianness = parse_endianness_marker(header[8]).ok_or(BlendError::InvalidHeader {
			at: 8,
			reason: "unknown endianness marker",
		})?;
		let version = parse_digits(&header[9..12]).ok_or(BlendError::InvalidHeader {
			at: 9,
			reason: "version is not three ascii digits",
		})?;

		Ok(Self {
			header_size: Self::LEGACY_SIZE,
			format_version: Self::LEGACY_FORMAT_VERSION,
			version,
			pointer_size,
			endianness,
		})
	}

	fn parse_v1(bytes: &[u8]) -> Result<Self> {
		let header = bytes.get(0..Self::V1_SIZE).ok_or(BlendError::InvalidHeader {
			at: bytes.len(),
			reason: "header shorter than 17 bytes",
		})?;

		let header_size = parse_digits(&header[7..9]).ok_or(BlendError::InvalidHeader {
			at: 7,
			reason: "header size is not two ascii digits",
		})? as usize;
		if header_size != Self::V1_SIZE {
			return Err(BlendError::InvalidHeader {
				at: 7,
				reason: "unsupported header size",
			});
		}
		if header[9] != b'-' {
			return Err(BlendError::InvalidHeader {
				at: 9,
				reason: "unknown pointer-size marker",
			});
		}

		let format_version = parse_digits(&header[10..12]).ok_or(BlendError::InvalidHeader {
			at: 10,
			reason: "format version is not two ascii digits",
		})?;
		if format_version != Self::V1_FORMAT_VERSION {
			return Err(BlendError::InvalidHeader {
				at: 10,
				reason: "unsupported format version",
			});
		}

		let endianness = parse_endianness_marker(header[12]).ok_or(BlendError::InvalidHeader {
			at: 12,
			reason: "unknown endianness marker",
		})?;
		let version = parse_digits(&header[13..17]).ok_or(BlendError::InvalidHeader {
			at: 13,
			reason: "version is not four ascii digits",
		})?;

		Ok(Self {
			header_size,
			format_version,
			version,
			pointer_size: 8,
			endianness,
		})
	}
}

fn parse_endianness_marker(byte: u8) -> Option<Endianness> {
	match byte {
		b'v' => Some(Endianness::Little),
		b'V' => Some(Endianness::Big),
		_ => None,
	}
}

fn parse_digits(bytes: &[u8]) -> Option<u16> {
	if bytes.is_empty() {
		return None;
	}

	let mut value = 0_u16;
	for byte in bytes {
		if !byte.is_ascii_digit() {
			return None;
		}
		value = value * 10 + u16::from(*byte - b'0');
	}
	Some(value)
}
