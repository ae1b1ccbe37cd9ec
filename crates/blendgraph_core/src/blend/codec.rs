use crate::blend::{BlendError, Endianness, Result};

/// Primitive SDNA base type understood by the field codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
	/// `double`
	F64,
	/// `float`
	F32,
	/// `int64_t`
	I64,
	/// `uint64_t`, surfaced as the `i64` bit pattern.
	U64,
	/// `int`, `int32_t`
	I32,
	/// `uint`, `uint32_t`
	U32,
	/// `short`, `int16_t`
	I16,
	/// `ushort`, `uint16_t`
	U16,
	/// `char`; arrays decode as text.
	Char,
	/// `uchar`; arrays decode as text.
	UChar,
	/// `int8_t`; arrays decode as bytes.
	I8,
	/// `uint8_t`; arrays decode as bytes.
	U8,
	/// `bool`, one byte.
	Bool,
}

impl Primitive {
	/// Map an SDNA type name to a primitive, if it is one.
	pub fn from_type_name(name: &str) -> Option<Self> {
		Some(match name {
			"double" => Self::F64,
			"float" => Self::F32,
			"int64_t" => Self::I64,
			"uint64_t" => Self::U64,
			"int" | "int32_t" => Self::I32,
			"uint" | "uint32_t" => Self::U32,
			"short" | "int16_t" => Self::I16,
			"ushort" | "uint16_t" => Self::U16,
			"char" => Self::Char,
			"uchar" => Self::UChar,
			"int8_t" => Self::I8,
			"uint8_t" => Self::U8,
			"bool" => Self::Bool,
			_ => return None,
		})
	}

	/// Encoded width of one element in bytes.
	pub fn size(self) -> usize {
		match self {
			Self::F64 | Self::I64 | Self::U64 => 8,
			Self::F32 | Self::I32 | Self::U32 => 4,
			Self::I16 | Self::U16 => 2,
			Self::Char | Self::UChar | Self::I8 | Self::U8 | Self::Bool => 1,
		}
	}

	/// Whether values decode as floats.
	pub fn is_float(self) -> bool {
		matches!(self, Self::F64 | Self::F32)
	}

	/// Whether arrays of this type decode as NUL-terminated text.
	pub fn is_text(self) -> bool {
		matches!(self, Self::Char | Self::UChar)
	}

	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::F64 => "f64",
			Self::F32 => "f32",
			Self::I64 => "i64",
			Self::U64 => "u64",
			Self::I32 => "i32",
			Self::U32 => "u32",
			Self::I16 => "i16",
			Self::U16 => "u16",
			Self::Char => "char",
			Self::UChar => "uchar",
			Self::I8 => "i8",
			Self::U8 => "u8",
			Self::Bool => "bool",
		}
	}
}

/// One decoded primitive element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
	/// Any integer type, widened.
	Int(i64),
	/// Any float type, widened.
	Float(f64),
}

impl Scalar {
	/// Value as `f64`, converting integers.
	pub fn as_f64(self) -> f64 {
		match self {
			Self::Int(value) => value as f64,
			Self::Float(value) => value,
		}
	}

	/// Value as `i64`, truncating floats.
	pub fn as_i64(self) -> i64 {
		match self {
			Self::Int(value) => value,
			Self::Float(value) => value as i64,
		}
	}
}

macro_rules! read_endian {
	($ty:ty, $bytes:expr, $endianness:expr) => {{
		let mut raw = [0_u8; std::mem::size_of::<$ty>()];
		raw.copy_from_slice($bytes);
		match $endianness {
			Endianness::Little => <$ty>::from_le_bytes(raw),
			Endianness::Big => <$ty>::from_be_bytes(raw),
		}
	}};
}

/// Decode one element from `bytes`, which must be exactly `kind.size()` long.
fn decode_one(bytes: &[u8], kind: Primitive, endianness: Endianness) -> Scalar {
	match kind {
		Primitive::F64 => Scalar::Float(read_endian!(f64, bytes, endianness)),
		Primitive::F32 => Scalar::Float(f64::from(read_endian!(f32, bytes, endianness))),
		Primitive::I64 => Scalar::Int(read_endian!(i64, bytes, endianness)),
		Primitive::U64 => Scalar::Int(read_endian!(u64, bytes, endianness) as i64),
		Primitive::I32 => Scalar::Int(i64::from(read_endian!(i32, bytes, endianness))),
		Primitive::U32 => Scalar::Int(i64::from(read_endian!(u32, bytes, endianness))),
		Primitive::I16 => Scalar::Int(i64::from(read_endian!(i16, bytes, endianness))),
		Primitive::U16 => Scalar::Int(i64::from(read_endian!(u16, bytes, endianness))),
		Primitive::Char | Primitive::I8 => Scalar::Int(i64::from(bytes[0] as i8)),
		Primitive::UChar | Primitive::U8 => Scalar::Int(i64::from(bytes[0])),
		Primitive::Bool => Scalar::Int(i64::from(bytes[0] != 0)),
	}
}

/// Zero-copy view over a fixed array of primitive elements.
#[derive(Debug, Clone, Copy)]
pub struct ScalarArray<'a> {
	bytes: &'a [u8],
	kind: Primitive,
	endianness: Endianness,
}

impl<'a> ScalarArray<'a> {
	/// Element type.
	pub fn kind(&self) -> Primitive {
		self.kind
	}

	/// Backing bytes.
	pub fn as_bytes(&self) -> &'a [u8] {
		self.bytes
	}

	/// Number of elements.
	pub fn len(&self) -> usize {
		self.bytes.len() / self.kind.size()
	}

	/// Whether the array has no elements.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Decode element `index`.
	pub fn get(&self, index: usize) -> Option<Scalar> {
		let size = self.kind.size();
		let start = index.checked_mul(size)?;
		let raw = self.bytes.get(start..start.checked_add(size)?)?;
		Some(decode_one(raw, self.kind, self.endianness))
	}

	/// Iterate decoded elements.
	pub fn iter(&self) -> impl Iterator<Item = Scalar> + 'a {
		let kind = self.kind;
		let endianness = self.endianness;
		self.bytes.chunks_exact(kind.size()).map(move |raw| decode_one(raw, kind, endianness))
	}

	/// Collect as `f64` values.
	pub fn to_f64_vec(&self) -> Vec<f64> {
		self.iter().map(Scalar::as_f64).collect()
	}

	/// Collect as `i64` values.
	pub fn to_i64_vec(&self) -> Vec<i64> {
		self.iter().map(Scalar::as_i64).collect()
	}
}

/// Result of a codec read.
#[derive(Debug, Clone)]
pub enum Decoded<'a> {
	/// Single element.
	Scalar(Scalar),
	/// Numeric array view.
	Array(ScalarArray<'a>),
	/// `char`/`uchar` array up to the first NUL.
	Text(String),
	/// `int8_t`/`uint8_t` array.
	Bytes(&'a [u8]),
}

/// Read `count` elements of `kind` at `offset`.
///
/// Returns `None` when the range falls outside `buf`.
pub fn read_primitive(buf: &[u8], offset: usize, kind: Primitive, count: usize, endianness: Endianness) -> Option<Decoded<'_>> {
	let len = kind.size().checked_mul(count)?;
	let raw = buf.get(offset..offset.checked_add(len)?)?;

	if count == 1 {
		return Some(Decoded::Scalar(decode_one(raw, kind, endianness)));
	}

	Some(match kind {
		Primitive::Char | Primitive::UChar => Decoded::Text(decode_text(raw)),
		Primitive::I8 | Primitive::U8 => Decoded::Bytes(raw),
		_ => Decoded::Array(ScalarArray {
			bytes: raw,
			kind,
			endianness,
		}),
	})
}

/// Decode a fixed char array up to its first NUL byte.
pub fn decode_text(raw: &[u8]) -> String {
	let end = raw.iter().position(|byte| *byte == 0).unwrap_or(raw.len());
	String::from_utf8_lossy(&raw[..end]).into_owned()
}

fn checked_range(buf: &[u8], offset: usize, need: usize) -> Result<std::ops::Range<usize>> {
	match offset.checked_add(need) {
		Some(end) if end <= buf.len() => Ok(offset..end),
		_ => Err(BlendError::FieldOutOfRange {
			at: offset,
			need,
			len: buf.len(),
		}),
	}
}

macro_rules! write_endian {
	($dst:expr, $value:expr, $endianness:expr) => {{
		let raw = match $endianness {
			Endianness::Little => $value.to_le_bytes(),
			Endianness::Big => $value.to_be_bytes(),
		};
		$dst.copy_from_slice(&raw);
	}};
}

/// Encode one element of `kind` at `offset`.
pub fn write_scalar(buf: &mut [u8], offset: usize, kind: Primitive, value: Scalar, endianness: Endianness) -> Result<()> {
	let range = checked_range(buf, offset, kind.size())?;
	let dst = &mut buf[range];
	match kind {
		Primitive::F64 => write_endian!(dst, value.as_f64(), endianness),
		Primitive::F32 => write_endian!(dst, value.as_f64() as f32, endianness),
		Primitive::I64 | Primitive::U64 => write_endian!(dst, value.as_i64(), endianness),
		Primitive::I32 => write_endian!(dst, value.as_i64() as i32, endianness),
		Primitive::U32 => write_endian!(dst, value.as_i64() as u32, endianness),
		Primitive::I16 => write_endian!(dst, value.as_i64() as i16, endianness),
		Primitive::U16 => write_endian!(dst, value.as_i64() as u16, endianness),
		Primitive::Char | Primitive::UChar | Primitive::I8 | Primitive::U8 => dst[0] = value.as_i64() as u8,
		Primitive::Bool => dst[0] = u8::from(value.as_i64() != 0),
	}
	Ok(())
}

/// Write `text` into a fixed `len`-byte char array at `offset`, NUL padded.
///
/// Text longer than `len - 1` bytes is cut so the terminator always fits.
pub fn write_text(buf: &mut [u8], offset: usize, len: usize, text: &str) -> Result<()> {
	let range = checked_range(buf, offset, len)?;
	let dst = &mut buf[range];
	dst.fill(0);
	let keep = text.len().min(len.saturating_sub(1));
	dst[..keep].copy_from_slice(&text.as_bytes()[..keep]);
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::{Decoded, Primitive, Scalar, read_primitive, write_scalar, write_text};
	use crate::blend::{BlendError, Endianness};

	#[test]
	fn type_names_map_to_primitives() {
		assert_eq!(Primitive::from_type_name("float"), Some(Primitive::F32));
		assert_eq!(Primitive::from_type_name("uint32_t"), Some(Primitive::U32));
		assert_eq!(Primitive::from_type_name("ushort"), Some(Primitive::U16));
		assert_eq!(Primitive::from_type_name("void"), None);
		assert_eq!(Primitive::from_type_name("Object"), None);
	}

	#[test]
	fn single_element_is_scalar() {
		let buf = [0, 0, 0x2A, 0, 0, 0];
		let value = read_primitive(&buf, 2, Primitive::I32, 1, Endianness::Little).expect("in range");
		assert!(matches!(value, Decoded::Scalar(Scalar::Int(42))));
	}

	#[test]
	fn endianness_is_honored() {
		let buf = 1.5_f32.to_be_bytes();
		let value = read_primitive(&buf, 0, Primitive::F32, 1, Endianness::Big).expect("in range");
		assert!(matches!(value, Decoded::Scalar(Scalar::Float(v)) if v == 1.5));
	}

	#[test]
	fn numeric_array_is_zero_copy_view() {
		let mut buf = Vec::new();
		for value in [1_i16, -2, 3] {
			buf.extend_from_slice(&value.to_le_bytes());
		}
		let Some(Decoded::Array(array)) = read_primitive(&buf, 0, Primitive::I16, 3, Endianness::Little) else {
			panic!("expected array");
		};
		assert_eq!(array.len(), 3);
		assert_eq!(array.as_bytes().as_ptr(), buf.as_ptr());
		assert_eq!(array.to_i64_vec(), vec![1, -2, 3]);
		assert_eq!(array.get(3), None);
	}

	#[test]
	fn huge_array_index_is_none() {
		let buf = [0_u8; 16];
		let Some(Decoded::Array(array)) = read_primitive(&buf, 0, Primitive::F64, 2, Endianness::Little) else {
			panic!("expected array");
		};
		assert_eq!(array.get(usize::MAX / 8), None);
		assert_eq!(array.get(usize::MAX), None);
	}

	#[test]
	fn char_array_reads_until_nul() {
		let buf = *b"OBCube\0\0junk";
		let value = read_primitive(&buf, 0, Primitive::Char, buf.len(), Endianness::Little).expect("in range");
		assert!(matches!(value, Decoded::Text(ref text) if text == "OBCube"));
	}

	#[test]
	fn byte_array_stays_raw() {
		let buf = [1_u8, 0, 3];
		let value = read_primitive(&buf, 0, Primitive::U8, 3, Endianness::Little).expect("in range");
		assert!(matches!(value, Decoded::Bytes(&[1, 0, 3])));
	}

	#[test]
	fn out_of_range_read_is_none() {
		let buf = [0_u8; 4];
		assert!(read_primitive(&buf, 2, Primitive::I32, 1, Endianness::Little).is_none());
		assert!(read_primitive(&buf, usize::MAX, Primitive::Char, 2, Endianness::Little).is_none());
	}

	#[test]
	fn writes_respect_endianness() {
		let mut buf = [0_u8; 8];
		write_scalar(&mut buf, 4, Primitive::I32, Scalar::Int(-7), Endianness::Big).expect("fits");
		assert_eq!(&buf[4..], &(-7_i32).to_be_bytes());
		let value = read_primitive(&buf, 4, Primitive::I32, 1, Endianness::Big).expect("in range");
		assert!(matches!(value, Decoded::Scalar(Scalar::Int(-7))));
	}

	#[test]
	fn write_past_end_is_error() {
		let mut buf = [0_u8; 4];
		let err = write_scalar(&mut buf, 2, Primitive::F64, Scalar::Float(1.0), Endianness::Little).expect_err("too small");
		assert!(matches!(err, BlendError::FieldOutOfRange { at: 2, need: 8, len: 4 }));
	}

	#[test]
	fn write_text_keeps_terminator() {
		let mut buf = [0xFF_u8; 6];
		write_text(&mut buf, 0, 4, "Cube").expect("fits");
		assert_eq!(&buf, b"Cub\0\xFF\xFF");
	}
}
