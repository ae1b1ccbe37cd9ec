use std::collections::HashMap;

use crate::blend::codec::Primitive;
use crate::blend::decl::parse_field_decl;
use crate::blend::{Dna, Endianness, RawField};

/// Index of a compiled layout inside its [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayoutId(pub u32);

impl LayoutId {
	fn index(self) -> usize {
		self.0 as usize
	}
}

/// How a field's bytes are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
	/// Pointer of depth 1 or 2.
	Pointer,
	/// Primitive numeric or character type.
	Primitive(Primitive),
	/// Embedded struct; `None` when the type has no layout in this schema.
	Struct(Option<LayoutId>),
}

/// One compiled field with its resolved offset.
///
/// `byte_length == rows * array_len * element_size` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
	/// Field identifier with pointer and array syntax removed.
	pub name: Box<str>,
	/// Declarator exactly as stored in SDNA.
	pub decl: Box<str>,
	/// Base type name.
	pub type_name: Box<str>,
	/// Pointer depth (0, 1, or 2).
	pub pointer_depth: u8,
	/// Elements per row.
	pub array_len: u32,
	/// Rows of a two-dimensional field; 1 otherwise.
	pub rows: u32,
	/// Number of bracketed dimensions (0, 1, or 2).
	pub dims: u8,
	/// Size of one element: pointer width for pointers, type size otherwise.
	pub element_size: usize,
	/// Total field byte length.
	pub byte_length: usize,
	/// Offset from the start of the owning struct.
	pub offset: usize,
	/// Interpretation of the element bytes.
	pub kind: FieldKind,
}

impl FieldDescriptor {
	/// Whether the declarator carried array brackets.
	pub fn has_dims(&self) -> bool {
		self.dims > 0
	}

	/// Whether this field is two-dimensional (`[N][M]`).
	pub fn is_two_dimensional(&self) -> bool {
		self.dims == 2
	}

	/// Number of elements across all dimensions.
	pub fn element_count(&self) -> usize {
		self.rows as usize * self.array_len as usize
	}

	/// Offset of row `row` from the start of the owning struct.
	pub fn row_offset(&self, row: usize) -> usize {
		self.offset + row * self.array_len as usize * self.element_size
	}

	/// Byte length of one row.
	pub fn row_length(&self) -> usize {
		self.array_len as usize * self.element_size
	}
}

/// Compiled, offset-resolved description of one struct type.
#[derive(Debug, Clone)]
pub struct StructLayout {
	/// Struct type name.
	pub name: Box<str>,
	/// Fields in declaration order.
	pub fields: Vec<FieldDescriptor>,
	/// Sum of field byte lengths.
	pub total_byte_length: usize,
	/// Size recorded for this type in the `TLEN` table.
	pub stored_size: usize,
	index: HashMap<Box<str>, usize>,
}

impl StructLayout {
	/// Look up a field by identifier.
	pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
		self.index.get(name).map(|idx| &self.fields[*idx])
	}

	/// Position of a field in declaration order.
	pub fn field_index(&self, name: &str) -> Option<usize> {
		self.index.get(name).copied()
	}

	/// Stride between successive instances in a multi-instance block.
	///
	/// This is the stored size when known, otherwise the field sum.
	pub fn instance_size(&self) -> usize {
		if self.stored_size > 0 { self.stored_size } else { self.total_byte_length }
	}
}

/// All struct layouts for one schema version, pointer width, and byte order.
#[derive(Debug, Clone)]
pub struct Schema {
	pointer_size: usize,
	endianness: Endianness,
	layouts: Vec<StructLayout>,
	by_name: HashMap<Box<str>, LayoutId>,
	by_sdna: Vec<Option<LayoutId>>,
	name_count: usize,
	type_count: usize,
}

impl Schema {
	/// Create an empty schema.
	pub fn new(pointer_size: usize, endianness: Endianness) -> Self {
		Self {
			pointer_size,
			endianness,
			layouts: Vec::new(),
			by_name: HashMap::new(),
			by_sdna: Vec::new(),
			name_count: 0,
			type_count: 0,
		}
	}

	/// Compile every struct declaration in `dna`.
	pub fn compile(dna: &Dna, pointer_size: usize, endianness: Endianness) -> Self {
		let mut schema = Self::new(pointer_size, endianness);
		schema.name_count = dna.names.len();
		schema.type_count = dna.types.len();

		for item in &dna.structs {
			let name = dna.type_name(item.type_idx);
			let stored_size = dna.type_size(item.type_idx) as usize;
			let fields = dna.raw_fields(item);
			let id = schema.get_or_compile(name, Some(&fields), stored_size);
			schema.by_sdna.push(id);
		}

		schema.link_nested();
		schema
	}

	/// Return the layout named `name`, compiling it from `fields` when absent.
	///
	/// An existing layout is returned unchanged and `fields` is ignored.
	/// Returns `None` when the layout is absent and no fields were supplied.
	pub fn get_or_compile(&mut self, name: &str, fields: Option<&[RawField]>, stored_size: usize) -> Option<LayoutId> {
		if let Some(id) = self.by_name.get(name) {
			return Some(*id);
		}

		let layout = self.compile_layout(name, fields?, stored_size);
		let id = LayoutId(self.layouts.len() as u32);
		self.layouts.push(layout);
		self.by_name.insert(name.into(), id);
		Some(id)
	}

	fn compile_layout(&self, name: &str, raw: &[RawField], stored_size: usize) -> StructLayout {
		let mut fields = Vec::with_capacity(raw.len());
		let mut index = HashMap::with_capacity(raw.len());
		let mut offset = 0_usize;

		for field in raw {
			let decl = parse_field_decl(&field.name);
			let kind = if decl.ptr_depth > 0 {
				FieldKind::Pointer
			} else if let Some(primitive) = Primitive::from_type_name(&field.type_name) {
				FieldKind::Primitive(primitive)
			} else {
				FieldKind::Struct(None)
			};
			let element_size = if decl.ptr_depth > 0 {
				self.pointer_size
			} else {
				field.element_size as usize
			};
			let byte_length = element_size.saturating_mul(decl.element_count() as usize);

			// Later duplicates shadow earlier ones.
			index.insert(decl.ident.clone(), fields.len());
			fields.push(FieldDescriptor {
				name: decl.ident.clone(),
				decl: field.name.clone(),
				type_name: field.type_name.clone(),
				pointer_depth: decl.ptr_depth,
				array_len: decl.array_len(),
				rows: decl.rows(),
				dims: decl.dims(),
				element_size,
				byte_length,
				offset,
				kind,
			});
			offset = offset.saturating_add(byte_length);
		}

		StructLayout {
			name: name.into(),
			fields,
			total_byte_length: offset,
			stored_size,
			index,
		}
	}

	/// Resolve embedded struct fields to their layouts by type name.
	fn link_nested(&mut self) {
		let by_name = &self.by_name;
		for layout in &mut self.layouts {
			for field in &mut layout.fields {
				if let FieldKind::Struct(target) = &mut field.kind {
					*target = by_name.get(&field.type_name).copied();
				}
			}
		}
	}

	/// Pointer width the layouts were compiled for.
	pub fn pointer_size(&self) -> usize {
		self.pointer_size
	}

	/// Byte order of files using this schema.
	pub fn endianness(&self) -> Endianness {
		self.endianness
	}

	/// Number of compiled layouts.
	pub fn len(&self) -> usize {
		self.layouts.len()
	}

	/// Whether no layouts were compiled.
	pub fn is_empty(&self) -> bool {
		self.layouts.is_empty()
	}

	/// Number of struct declarations in the SDNA table.
	pub fn sdna_struct_count(&self) -> usize {
		self.by_sdna.len()
	}

	/// Number of entries in the SDNA name table.
	pub fn name_count(&self) -> usize {
		self.name_count
	}

	/// Number of entries in the SDNA type table.
	pub fn type_count(&self) -> usize {
		self.type_count
	}

	/// Return a layout by id.
	pub fn layout(&self, id: LayoutId) -> &StructLayout {
		&self.layouts[id.index()]
	}

	/// Return a layout id by struct name.
	pub fn layout_id(&self, name: &str) -> Option<LayoutId> {
		self.by_name.get(name).copied()
	}

	/// Return a layout by struct name.
	pub fn layout_by_name(&self, name: &str) -> Option<&StructLayout> {
		self.layout_id(name).map(|id| self.layout(id))
	}

	/// Return the layout for an SDNA struct index.
	pub fn layout_for_sdna(&self, sdna_nr: u32) -> Option<LayoutId> {
		self.by_sdna.get(sdna_nr as usize).copied().flatten()
	}

	/// Iterate layouts in compile order.
	pub fn layouts(&self) -> impl Iterator<Item = (LayoutId, &StructLayout)> {
		self.layouts.iter().enumerate().map(|(idx, layout)| (LayoutId(idx as u32), layout))
	}
}
