//! Synthetic `.blend` writer shared by workspace tests.
//!
//! Builds headers, SDNA schema blocks, data blocks, thumbnails, and the `ENDB`
//! sentinel for either pointer width and either byte order.

use std::path::PathBuf;

/// Byte order used by the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
	/// Little-endian (`v`).
	Little,
	/// Big-endian (`V`).
	Big,
}

macro_rules! endian_writer {
	($name:ident, $ty:ty, $n:expr) => {
		/// Encode one value in this byte order.
		pub fn $name(self, value: $ty) -> [u8; $n] {
			match self {
				Self::Little => value.to_le_bytes(),
				Self::Big => value.to_be_bytes(),
			}
		}
	};
}

impl Endian {
	endian_writer!(u16, u16, 2);
	endian_writer!(i16, i16, 2);
	endian_writer!(u32, u32, 4);
	endian_writer!(i32, i32, 4);
	endian_writer!(u64, u64, 8);
	endian_writer!(i64, i64, 8);
	endian_writer!(f32, f32, 4);
	endian_writer!(f64, f64, 8);

	fn marker(self) -> u8 {
		match self {
			Self::Little => b'v',
			Self::Big => b'V',
		}
	}
}

/// Builder for the payload of a `DNA1` block.
#[derive(Debug, Clone)]
pub struct SdnaBuilder {
	pointer_size: usize,
	names: Vec<String>,
	types: Vec<(String, u16)>,
	structs: Vec<(u16, Vec<(u16, u16)>)>,
	gaps: Vec<(&'static str, usize)>,
}

impl SdnaBuilder {
	/// Create a builder with the common primitive types pre-registered.
	pub fn new(pointer_size: usize) -> Self {
		let mut builder = Self {
			pointer_size,
			names: Vec::new(),
			types: Vec::new(),
			structs: Vec::new(),
			gaps: Vec::new(),
		};
		for (name, size) in [
			("char", 1),
			("uchar", 1),
			("short", 2),
			("ushort", 2),
			("int", 4),
			("float", 4),
			("double", 8),
			("void", 0),
			("uint", 4),
			("int8_t", 1),
			("uint8_t", 1),
			("int64_t", 8),
			("uint64_t", 8),
		] {
			builder.add_type(name, size);
		}
		builder
	}

	/// Register a type name with its byte size, returning its type index.
	///
	/// Registering an existing name updates its size.
	pub fn add_type(&mut self, name: &str, size: u16) -> u16 {
		if let Some(idx) = self.types.iter().position(|(item, _)| item == name) {
			self.types[idx].1 = size;
			return idx as u16;
		}
		self.types.push((name.to_owned(), size));
		(self.types.len() - 1) as u16
	}

	fn name_index(&mut self, decl: &str) -> u16 {
		if let Some(idx) = self.names.iter().position(|item| item == decl) {
			return idx as u16;
		}
		self.names.push(decl.to_owned());
		(self.names.len() - 1) as u16
	}

	/// Return the registered size of a type.
	pub fn type_size(&self, name: &str) -> Option<usize> {
		self.types.iter().find(|(item, _)| item == name).map(|(_, size)| usize::from(*size))
	}

	/// Byte size of one field declaration, following C layout without padding.
	pub fn field_size(&self, type_name: &str, decl: &str) -> usize {
		let (ptr, dims) = decl_shape(decl);
		let element = if ptr { self.pointer_size } else { self.type_size(type_name).unwrap_or(0) };
		element * dims
	}

	/// Define a struct from `(type, declarator)` pairs and return its SDNA index.
	///
	/// The struct's stored size is the sum of its field sizes.
	pub fn add_struct(&mut self, name: &str, fields: &[(&str, &str)]) -> u32 {
		let size: usize = fields.iter().map(|(ty, decl)| self.field_size(ty, decl)).sum();
		self.add_struct_sized(name, size as u16, fields)
	}

	/// Define a struct with an explicit stored size.
	pub fn add_struct_sized(&mut self, name: &str, size: u16, fields: &[(&str, &str)]) -> u32 {
		let type_idx = self.add_type(name, size);
		let mut encoded = Vec::with_capacity(fields.len());
		for (ty, decl) in fields {
			let field_type = match self.types.iter().position(|(item, _)| item == ty) {
				Some(idx) => idx as u16,
				None => self.add_type(ty, 0),
			};
			let name_idx = self.name_index(decl);
			encoded.push((field_type, name_idx));
		}
		self.structs.push((type_idx, encoded));
		(self.structs.len() - 1) as u32
	}

	/// Insert `len` filler bytes (`0xEE`) before a sub-section marker.
	pub fn gap_before(&mut self, marker: &'static str, len: usize) -> &mut Self {
		self.gaps.push((marker, len));
		self
	}

	fn write_marker(&self, out: &mut Vec<u8>, marker: &'static str) {
		for (item, len) in &self.gaps {
			if *item == marker {
				out.extend(std::iter::repeat_n(0xEE_u8, *len));
			}
		}
		out.extend_from_slice(marker.as_bytes());
	}

	/// Encode the `SDNA` payload.
	pub fn encode(&self, endian: Endian) -> Vec<u8> {
		let mut out = Vec::new();
		self.write_marker(&mut out, "SDNA");
		self.write_marker(&mut out, "NAME");
		out.extend_from_slice(&endian.u32(self.names.len() as u32));
		for name in &self.names {
			out.extend_from_slice(name.as_bytes());
			out.push(0);
		}
		align4(&mut out);

		self.write_marker(&mut out, "TYPE");
		out.extend_from_slice(&endian.u32(self.types.len() as u32));
		for (name, _) in &self.types {
			out.extend_from_slice(name.as_bytes());
			out.push(0);
		}
		align4(&mut out);

		self.write_marker(&mut out, "TLEN");
		for (_, size) in &self.types {
			out.extend_from_slice(&endian.u16(*size));
		}
		align4(&mut out);

		self.write_marker(&mut out, "STRC");
		out.extend_from_slice(&endian.u32(self.structs.len() as u32));
		for (type_idx, fields) in &self.structs {
			out.extend_from_slice(&endian.u16(*type_idx));
			out.extend_from_slice(&endian.u16(fields.len() as u16));
			for (field_type, name_idx) in fields {
				out.extend_from_slice(&endian.u16(*field_type));
				out.extend_from_slice(&endian.u16(*name_idx));
			}
		}
		out
	}
}

fn align4(out: &mut Vec<u8>) {
	while out.len() % 4 != 0 {
		out.push(0);
	}
}

fn decl_shape(decl: &str) -> (bool, usize) {
	let ptr = decl.trim_start_matches('(').starts_with('*');
	let mut dims = 1_usize;
	let mut rest = decl;
	while let Some(start) = rest.find('[') {
		let Some(len) = rest[start + 1..].find(']') else {
			break;
		};
		dims *= rest[start + 1..start + 1 + len].parse::<usize>().unwrap_or(1);
		rest = &rest[start + 1 + len..];
	}
	(ptr, dims)
}

/// Writer for a whole `.blend` buffer.
#[derive(Debug, Clone)]
pub struct BlendWriter {
	out: Vec<u8>,
	pointer_size: usize,
	endian: Endian,
	large: bool,
}

impl BlendWriter {
	/// Start a classic file with a 12-byte header such as `BLENDER_v280`.
	pub fn legacy(pointer_size: usize, endian: Endian, version: &str) -> Self {
		let mut out = b"BLENDER".to_vec();
		out.push(if pointer_size == 4 { b'_' } else { b'-' });
		out.push(endian.marker());
		out.extend_from_slice(version.as_bytes());
		Self {
			out,
			pointer_size,
			endian,
			large: false,
		}
	}

	/// Start a v1 file (`BLENDER17-01v0500` style, little-endian, 8-byte pointers).
	pub fn v1(version: &str) -> Self {
		let mut out = b"BLENDER17-01v".to_vec();
		out.extend_from_slice(version.as_bytes());
		Self {
			out,
			pointer_size: 8,
			endian: Endian::Little,
			large: true,
		}
	}

	/// Byte order of this file.
	pub fn endian(&self) -> Endian {
		self.endian
	}

	/// Pointer width of this file.
	pub fn pointer_size(&self) -> usize {
		self.pointer_size
	}

	/// Current buffer length.
	pub fn len(&self) -> usize {
		self.out.len()
	}

	/// Whether nothing has been written.
	pub fn is_empty(&self) -> bool {
		self.out.is_empty()
	}

	/// Size of one block header.
	pub fn bhead_size(&self) -> usize {
		if self.large { 32 } else { 16 + self.pointer_size }
	}

	/// Start building a payload in this file's byte order and pointer width.
	pub fn payload(&self) -> Payload {
		Payload {
			bytes: Vec::new(),
			endian: self.endian,
			pointer_size: self.pointer_size,
		}
	}

	/// Append one block and return the absolute offset of its payload.
	///
	/// Legacy headers store the length little-endian regardless of byte order.
	pub fn block(&mut self, code: &[u8; 4], old: u64, sdna_nr: u32, count: u32, payload: &[u8]) -> usize {
		let endian = self.endian;
		self.out.extend_from_slice(code);
		if self.large {
			self.out.extend_from_slice(&endian.u32(sdna_nr));
			self.out.extend_from_slice(&endian.u64(old));
			self.out.extend_from_slice(&endian.i64(payload.len() as i64));
			self.out.extend_from_slice(&endian.i64(i64::from(count)));
		} else {
			self.out.extend_from_slice(&Endian::Little.i32(payload.len() as i32));
			self.push_ptr(old);
			self.out.extend_from_slice(&endian.u32(sdna_nr));
			self.out.extend_from_slice(&endian.i32(count as i32));
		}
		let data_offset = self.out.len();
		self.out.extend_from_slice(payload);
		data_offset
	}

	/// Append a block header declaring `len` payload bytes without writing them.
	pub fn raw_block_header(&mut self, code: &[u8; 4], old: u64, sdna_nr: u32, count: i32, len: i32) {
		let endian = self.endian;
		self.out.extend_from_slice(code);
		self.out.extend_from_slice(&Endian::Little.i32(len));
		self.push_ptr(old);
		self.out.extend_from_slice(&endian.u32(sdna_nr));
		self.out.extend_from_slice(&endian.i32(count));
	}

	fn push_ptr(&mut self, value: u64) {
		if self.pointer_size == 4 {
			self.out.extend_from_slice(&self.endian.u32(value as u32));
		} else {
			self.out.extend_from_slice(&self.endian.u64(value));
		}
	}

	/// Append the schema block.
	pub fn dna(&mut self, sdna: &SdnaBuilder) -> usize {
		let payload = sdna.encode(self.endian);
		self.block(b"DNA1", 0, 0, 1, &payload)
	}

	/// Append a `TEST` thumbnail block.
	pub fn thumbnail(&mut self, width: i32, height: i32, pixels: &[u32]) -> usize {
		let mut payload = Vec::with_capacity(8 + pixels.len() * 4);
		payload.extend_from_slice(&self.endian.i32(width));
		payload.extend_from_slice(&self.endian.i32(height));
		for pixel in pixels {
			payload.extend_from_slice(&pixel.to_le_bytes());
		}
		self.block(b"TEST", 0, 0, 1, &payload)
	}

	/// Append `len` zero bytes.
	pub fn padding(&mut self, len: usize) {
		self.out.extend(std::iter::repeat_n(0_u8, len));
	}

	/// Append the terminal `ENDB` block.
	pub fn endb(&mut self) -> usize {
		self.block(b"ENDB", 0, 0, 0, &[])
	}

	/// Return the finished buffer.
	pub fn finish(self) -> Vec<u8> {
		self.out
	}
}

/// Little helper for laying out struct payloads field by field.
#[derive(Debug, Clone)]
pub struct Payload {
	bytes: Vec<u8>,
	endian: Endian,
	pointer_size: usize,
}

impl Payload {
	/// Append an `int`.
	pub fn i32(mut self, value: i32) -> Self {
		self.bytes.extend_from_slice(&self.endian.i32(value));
		self
	}

	/// Append a `short`.
	pub fn i16(mut self, value: i16) -> Self {
		self.bytes.extend_from_slice(&self.endian.i16(value));
		self
	}

	/// Append a `ushort`.
	pub fn u16(mut self, value: u16) -> Self {
		self.bytes.extend_from_slice(&self.endian.u16(value));
		self
	}

	/// Append an `int64_t`.
	pub fn i64(mut self, value: i64) -> Self {
		self.bytes.extend_from_slice(&self.endian.i64(value));
		self
	}

	/// Append a `float`.
	pub fn f32(mut self, value: f32) -> Self {
		self.bytes.extend_from_slice(&self.endian.f32(value));
		self
	}

	/// Append a `double`.
	pub fn f64(mut self, value: f64) -> Self {
		self.bytes.extend_from_slice(&self.endian.f64(value));
		self
	}

	/// Append a pointer-sized old address.
	pub fn ptr(mut self, value: u64) -> Self {
		if self.pointer_size == 4 {
			self.bytes.extend_from_slice(&self.endian.u32(value as u32));
		} else {
			self.bytes.extend_from_slice(&self.endian.u64(value));
		}
		self
	}

	/// Append `text` into a fixed `len`-byte char array, NUL padded.
	pub fn text(mut self, text: &str, len: usize) -> Self {
		let mut raw = text.as_bytes().to_vec();
		raw.resize(len, 0);
		self.bytes.extend_from_slice(&raw);
		self
	}

	/// Append raw bytes.
	pub fn raw(mut self, bytes: &[u8]) -> Self {
		self.bytes.extend_from_slice(bytes);
		self
	}

	/// Append `len` zero bytes.
	pub fn zeros(mut self, len: usize) -> Self {
		self.bytes.extend(std::iter::repeat_n(0_u8, len));
		self
	}

	/// Return the laid-out bytes.
	pub fn build(self) -> Vec<u8> {
		self.bytes
	}
}

/// The smallest useful file: one struct `Tiny { int x; }` with one instance holding 42.
pub fn tiny_blend() -> Vec<u8> {
	let mut sdna = SdnaBuilder::new(4);
	let tiny = sdna.add_struct("Tiny", &[("int", "x")]);
	let mut file = BlendWriter::legacy(4, Endian::Little, "280");
	file.dna(&sdna);
	file.block(b"DATA", 0x1000, tiny, 1, &[0x2A, 0, 0, 0]);
	file.endb();
	file.finish()
}

/// Write `bytes` to a unique path under the system temp directory.
pub fn write_temp(name: &str, bytes: &[u8]) -> PathBuf {
	let dir = std::env::temp_dir().join(format!("blendgraph-test-{}", std::process::id()));
	std::fs::create_dir_all(&dir).expect("temp dir is writable");
	let path = dir.join(name);
	std::fs::write(&path, bytes).expect("temp file is writable");
	path
}
