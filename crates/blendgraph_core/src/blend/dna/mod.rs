use crate::blend::bytes::{Cursor, Region};
use crate::blend::{BlendError, Block, Endianness, Result};

/// Number of bytes the parser may skip while looking for an SDNA sub-section marker.
///
/// Exceeding the window is a [`BlendError::SchemaAlignment`]; it is never widened.
pub const MARKER_WINDOW: usize = 8;

/// Raw SDNA schema tables as stored in a `DNA1` block.
#[derive(Debug)]
pub struct Dna {
	/// Field declarator strings from `NAME`.
	pub names: Vec<Box<str>>,
	/// Type name strings from `TYPE`.
	pub types: Vec<Box<str>>,
	/// Type byte sizes from `TLEN`, parallel to `types`.
	pub tlen: Vec<u16>,
	/// Struct declarations from `STRC`, in SDNA index order.
	pub structs: Vec<DnaStruct>,
}

/// One struct declaration from SDNA.
#[derive(Debug)]
pub struct DnaStruct {
	/// Type index for this struct's name.
	pub type_idx: u16,
	/// Field declarations in source order.
	pub fields: Vec<DnaField>,
}

/// One SDNA field declaration.
#[derive(Debug, Clone, Copy)]
pub struct DnaField {
	/// Type table index for field type.
	pub type_idx: u16,
	/// Name table index for field declarator text.
	pub name_idx: u16,
}

/// A field declaration with its indices resolved to text and element size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
	/// Declarator text, for example `*next` or `mat[4][4]`.
	pub name: Box<str>,
	/// Base type name, for example `float` or `ListBase`.
	pub type_name: Box<str>,
	/// Byte size of one element of `type_name`.
	pub element_size: u32,
}

impl Dna {
	/// Parse the SDNA tables of a `DNA1` block.
	pub fn from_block(bytes: &[u8], block: &Block<'_>, endianness: Endianness) -> Result<Self> {
		Self::parse(bytes, block.data_offset, block.data_end(), endianness)
	}

	/// Parse SDNA tables stored in `bytes[start..end]`.
	///
	/// Error offsets are absolute positions in `bytes`.
	pub fn parse(bytes: &[u8], start: usize, end: usize, endianness: Endianness) -> Result<Self> {
		let mut cursor = Cursor::bounded(bytes, start, end, Region::Schema);

		cursor.seek_marker("SDNA", MARKER_WINDOW)?;
		cursor.seek_marker("NAME", MARKER_WINDOW)?;
		let name_count = cursor.read_u32(endianness)? as usize;
		let names = read_string_table(&mut cursor, name_count)?;

		cursor.seek_marker("TYPE", MARKER_WINDOW)?;
		let type_count = cursor.read_u32(endianness)? as usize;
		let types = read_string_table(&mut cursor, type_count)?;

		cursor.seek_marker("TLEN", MARKER_WINDOW)?;
		let mut tlen = Vec::with_capacity(type_count.min(cursor.remaining() / 2));
		for _ in 0..type_count {
			tlen.push(cursor.read_u16(endianness)?);
		}

		cursor.seek_marker("STRC", MARKER_WINDOW)?;
		let struct_count = cursor.read_u32(endianness)? as usize;
		let mut structs = Vec::with_capacity(struct_count.min(cursor.remaining() / 4));

		for _ in 0..struct_count {
			let at = cursor.pos();
			let type_idx = cursor.read_u16(endianness)?;
			check_index("struct.type_idx", u32::from(type_idx), types.len(), at)?;

			let field_count = cursor.read_u16(endianness)? as usize;
			let mut fields = Vec::with_capacity(field_count);
			for _ in 0..field_count {
				let at = cursor.pos();
				let field_type_idx = cursor.read_u16(endianness)?;
				let field_name_idx = cursor.read_u16(endianness)?;
				check_index("field.type_idx", u32::from(field_type_idx), types.len(), at)?;
				check_index("field.name_idx", u32::from(field_name_idx), names.len(), at)?;
				fields.push(DnaField {
					type_idx: field_type_idx,
					name_idx: field_name_idx,
				});
			}

			structs.push(DnaStruct { type_idx, fields });
		}

		Ok(Self { names, types, tlen, structs })
	}

	/// Return type name by type index.
	pub fn type_name(&self, type_idx: u16) -> &str {
		&self.types[type_idx as usize]
	}

	/// Return field declarator by name index.
	pub fn field_name(&self, name_idx: u16) -> &str {
		&self.names[name_idx as usize]
	}

	/// Return the stored byte size of a type.
	pub fn type_size(&self, type_idx: u16) -> u32 {
		self.tlen.get(type_idx as usize).copied().map(u32::from).unwrap_or(0)
	}

	/// Resolve a struct declaration into `(name, type, element size)` triples.
	pub fn raw_fields(&self, item: &DnaStruct) -> Vec<RawField> {
		item.fields
			.iter()
			.map(|field| RawField {
				name: self.field_name(field.name_idx).into(),
				type_name: self.type_name(field.type_idx).into(),
				element_size: self.type_size(field.type_idx),
			})
			.collect()
	}
}

fn read_string_table(cursor: &mut Cursor<'_>, count: usize) -> Result<Vec<Box<str>>> {
	let mut out = Vec::with_capacity(count.min(cursor.remaining()));
	for _ in 0..count {
		let bytes = cursor.read_cstring_bytes()?;
		out.push(String::from_utf8_lossy(bytes).into_owned().into_boxed_str());
	}
	Ok(out)
}

fn check_index(kind: &'static str, idx: u32, len: usize, at: usize) -> Result<()> {
	if (idx as usize) >= len {
		return Err(BlendError::SchemaIndexOutOfRange {
			kind,
			idx,
			max: len.saturating_sub(1) as u32,
			at,
		});
	}
	Ok(())
}

#[cfg(test)]
mod tests;
