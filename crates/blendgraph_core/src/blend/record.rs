use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

use tracing::warn;

use crate::blend::codec;
use crate::blend::{BlendGraph, FieldDescriptor, FieldKind, FieldValue, LayoutId, ParseOptions, Schema, StructLayout};

/// Index of a bound record inside its graph's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub u32);

impl RecordId {
	pub(crate) fn index(self) -> usize {
		self.0 as usize
	}
}

/// One struct instance bound to a byte range of the file.
#[derive(Debug, Clone)]
pub struct StructRecord {
	/// Compiled layout of this instance.
	pub layout: LayoutId,
	/// Old address of the owning block; nested records share their parent's.
	pub address: u64,
	/// Absolute offset of the first byte.
	pub data_start: usize,
	/// Absolute offset one past the last byte.
	pub data_end: usize,
	/// Enclosing record for embedded structs.
	pub parent: Option<RecordId>,
	pub(crate) nested: Vec<NestedSlot>,
}

/// Binding outcome of one embedded-struct field.
#[derive(Debug, Clone)]
pub(crate) struct NestedSlot {
	pub field: usize,
	pub state: NestedState,
}

#[derive(Debug, Clone)]
pub(crate) enum NestedState {
	Bound(Box<[RecordId]>),
	Unknown,
	Unresolved,
}

/// Arena builder that binds records and their embedded structs eagerly.
pub(crate) struct Binder<'a> {
	schema: &'a Schema,
	options: &'a ParseOptions,
	pub records: Vec<StructRecord>,
	pub by_type: HashMap<LayoutId, Vec<RecordId>>,
	pub all: Vec<RecordId>,
}

impl<'a> Binder<'a> {
	pub fn new(schema: &'a Schema, options: &'a ParseOptions) -> Self {
		Self {
			schema,
			options,
			records: Vec::new(),
			by_type: HashMap::new(),
			all: Vec::new(),
		}
	}

	/// Bind a top-level instance over `start..end`.
	pub fn bind(&mut self, layout: LayoutId, address: u64, start: usize, end: usize) -> RecordId {
		self.bind_at(layout, address, start..end, None, 0)
	}

	fn bind_at(&mut self, layout: LayoutId, address: u64, range: Range<usize>, parent: Option<RecordId>, depth: u32) -> RecordId {
		let id = RecordId(self.records.len() as u32);
		self.records.push(StructRecord {
			layout,
			address,
			data_start: range.start,
			data_end: range.end,
			parent,
			nested: Vec::new(),
		});
		if parent.is_none() || self.options.index_nested {
			self.by_type.entry(layout).or_default().push(id);
			self.all.push(id);
		}

		let schema = self.schema;
		let mut nested = Vec::new();
		for (index, field) in schema.layout(layout).fields.iter().enumerate() {
			let FieldKind::Struct(target) = field.kind else {
				continue;
			};
			let state = match target {
				None => NestedState::Unknown,
				Some(_) if field.element_size == 0 => NestedState::Unknown,
				Some(_) if depth >= self.options.max_nesting_depth => {
					warn!(
						field = %field.name,
						owner = %schema.layout(layout).name,
						depth,
						"nested struct binding exceeds depth limit"
					);
					NestedState::Unknown
				}
				Some(child) => self.bind_nested(child, address, &range, field, id, depth + 1),
			};
			nested.push(NestedSlot { field: index, state });
		}

		self.records[id.index()].nested = nested;
		id
	}

	fn bind_nested(&mut self, child: LayoutId, address: u64, range: &Range<usize>, field: &FieldDescriptor, parent: RecordId, depth: u32) -> NestedState {
		let begin = range.start + field.offset;
		match begin.checked_add(field.byte_length) {
			Some(end) if end <= range.end => {}
			_ => return NestedState::Unresolved,
		}

		let ids = (0..field.element_count())
			.map(|slot| {
				let start = begin + slot * field.element_size;
				self.bind_at(child, address, start..start + field.element_size, Some(parent), depth)
			})
			.collect();
		NestedState::Bound(ids)
	}
}

/// Read-only view of one bound record.
#[derive(Clone, Copy)]
pub struct Record<'g> {
	graph: &'g BlendGraph,
	id: RecordId,
}

impl<'g> Record<'g> {
	pub(crate) fn new(graph: &'g BlendGraph, id: RecordId) -> Self {
		Self { graph, id }
	}

	fn inner(&self) -> &'g StructRecord {
		&self.graph.records[self.id.index()]
	}

	/// Arena index.
	pub fn id(&self) -> RecordId {
		self.id
	}

	/// Compiled layout.
	pub fn layout(&self) -> &'g StructLayout {
		self.graph.schema().layout(self.inner().layout)
	}

	/// Struct type name.
	pub fn type_name(&self) -> &'g str {
		&self.layout().name
	}

	/// Old address of the owning block.
	pub fn address(&self) -> u64 {
		self.inner().address
	}

	/// Absolute byte range in the file.
	pub fn data_range(&self) -> Range<usize> {
		let inner = self.inner();
		inner.data_start..inner.data_end
	}

	/// Bytes backing this record.
	pub fn raw_bytes(&self) -> &'g [u8] {
		&self.graph.bytes()[self.data_range()]
	}

	/// Enclosing record when this is an embedded struct.
	pub fn parent(&self) -> Option<Record<'g>> {
		self.inner().parent.map(|id| Record::new(self.graph, id))
	}

	/// Field identifiers in declaration order.
	pub fn field_names(&self) -> impl Iterator<Item = &'g str> + 'g {
		self.layout().fields.iter().map(|field| &*field.name)
	}

	/// Whether the layout declares `name`.
	pub fn has_field(&self, name: &str) -> bool {
		self.layout().field_index(name).is_some()
	}

	/// Read a field; `None` means the layout has no such field.
	pub fn get(&self, name: &str) -> Option<FieldValue<'g>> {
		let index = self.layout().field_index(name)?;
		Some(self.get_at(index))
	}

	/// Read the field at declaration position `index`.
	pub fn get_at(&self, index: usize) -> FieldValue<'g> {
		let Some(field) = self.layout().fields.get(index) else {
			return FieldValue::Unresolved;
		};

		match field.kind {
			FieldKind::Struct(None) => return FieldValue::Unknown,
			FieldKind::Struct(Some(_)) => return self.read_nested(index, field),
			_ => {}
		}

		let inner = self.inner();
		let start = inner.data_start + field.offset;
		match start.checked_add(field.byte_length) {
			Some(end) if end <= inner.data_end => {}
			_ => return FieldValue::Unresolved,
		}

		match field.kind {
			FieldKind::Pointer => self.read_pointer(field, start),
			FieldKind::Primitive(kind) => self.read_primitive(field, kind, start),
			FieldKind::Struct(_) => FieldValue::Unknown,
		}
	}

	fn read_primitive(&self, field: &FieldDescriptor, kind: codec::Primitive, start: usize) -> FieldValue<'g> {
		let bytes = self.graph.bytes();
		let endianness = self.graph.header().endianness;
		if field.is_two_dimensional() {
			let base = self.inner().data_start;
			let rows = (0..field.rows as usize)
				.map(|row| {
					let decoded = codec::read_primitive(bytes, base + field.row_offset(row), kind, field.array_len as usize, endianness);
					FieldValue::from_decoded(decoded)
				})
				.collect();
			return FieldValue::Rows(rows);
		}
		FieldValue::from_decoded(codec::read_primitive(bytes, start, kind, field.element_count(), endianness))
	}

	fn read_pointer(&self, field: &FieldDescriptor, start: usize) -> FieldValue<'g> {
		if field.pointer_depth >= 2 && !field.has_dims() {
			return self.graph.resolve_pointer_list(start);
		}
		if field.is_two_dimensional() {
			let base = self.inner().data_start;
			let rows = (0..field.rows as usize)
				.map(|row| FieldValue::PointerArray(self.graph.resolve_pointer_array(base + field.row_offset(row), field.array_len as usize)))
				.collect();
			return FieldValue::Rows(rows);
		}
		if field.has_dims() {
			return FieldValue::PointerArray(self.graph.resolve_pointer_array(start, field.array_len as usize));
		}

		match self.graph.resolve_pointer(start) {
			Some(target) => FieldValue::Pointer(target),
			None => FieldValue::Unresolved,
		}
	}

	fn read_nested(&self, index: usize, field: &FieldDescriptor) -> FieldValue<'g> {
		let slot = self.inner().nested.iter().find(|slot| slot.field == index);
		let ids = match slot.map(|slot| &slot.state) {
			Some(NestedState::Bound(ids)) => ids,
			Some(NestedState::Unresolved) => return FieldValue::Unresolved,
			Some(NestedState::Unknown) | None => return FieldValue::Unknown,
		};

		let graph = self.graph;
		let records = |ids: &[RecordId]| ids.iter().map(|id| Record::new(graph, *id)).collect::<Vec<_>>();
		if field.is_two_dimensional() {
			let width = field.array_len as usize;
			let rows = (0..field.rows as usize)
				.map(|row| FieldValue::NestedArray(records(ids.get(row * width..(row + 1) * width).unwrap_or(&[]))))
				.collect();
			return FieldValue::Rows(rows);
		}
		if field.has_dims() {
			return FieldValue::NestedArray(records(ids));
		}
		match ids.first() {
			Some(id) => FieldValue::Nested(Record::new(graph, *id)),
			None => FieldValue::Unknown,
		}
	}

	/// Integer field value.
	pub fn get_int(&self, name: &str) -> Option<i64> {
		self.get(name)?.as_int()
	}

	/// Float field value, widening integers.
	pub fn get_float(&self, name: &str) -> Option<f64> {
		self.get(name)?.as_float()
	}

	/// Text field value.
	pub fn get_text(&self, name: &str) -> Option<String> {
		match self.get(name)? {
			FieldValue::Text(text) => Some(text),
			_ => None,
		}
	}

	/// Embedded struct, or the first record a pointer field resolves to.
	pub fn get_record(&self, name: &str) -> Option<Record<'g>> {
		self.get(name)?.as_record()
	}

	/// Raw bytes of a field, whatever its type.
	pub fn raw_field_bytes(&self, name: &str) -> Option<&'g [u8]> {
		let field = self.layout().field(name)?;
		let start = self.inner().data_start + field.offset;
		let end = start.checked_add(field.byte_length)?;
		if end > self.inner().data_end {
			return None;
		}
		self.graph.bytes().get(start..end)
	}

	/// `ID.name` of an embedded `id` struct with its two-letter type prefix removed.
	pub fn id_name(&self) -> Option<String> {
		let name = self.get_record("id")?.get_text("name")?;
		name.get(2..).map(str::to_owned)
	}
}

impl fmt::Debug for Record<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Record")
			.field("id", &self.id)
			.field("type", &self.type_name())
			.field("address", &format_args!("{:#x}", self.address()))
			.field("range", &self.data_range())
			.finish()
	}
}

impl PartialEq for Record<'_> {
	fn eq(&self, other: &Self) -> bool {
		std::ptr::eq(self.graph, other.graph) && self.id == other.id
	}
}
