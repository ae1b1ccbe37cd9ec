use std::fmt;

use crate::blend::codec::{Decoded, Scalar, ScalarArray};
use crate::blend::{AddressEntry, BlendGraph, Record};

/// Value of one record field, produced on demand from the layout.
#[derive(Debug, Clone)]
pub enum FieldValue<'g> {
	/// Integer scalar of any width.
	Int(i64),
	/// Float scalar of any width.
	Float(f64),
	/// Fixed numeric array viewing the file bytes.
	Array(ScalarArray<'g>),
	/// `char`/`uchar` array read up to its first NUL.
	Text(String),
	/// `int8_t`/`uint8_t` array.
	Bytes(&'g [u8]),
	/// Resolved depth-1 pointer.
	Pointer(RecordRef<'g>),
	/// Depth-2 pointer walked slot by slot until the first unresolved slot.
	PointerList(Vec<RecordRef<'g>>),
	/// Fixed-length pointer array; unresolved slots are `None`.
	PointerArray(Vec<Option<RecordRef<'g>>>),
	/// Embedded struct.
	Nested(Record<'g>),
	/// Fixed array of embedded structs.
	NestedArray(Vec<Record<'g>>),
	/// Rows of a two-dimensional field, each holding one inner array.
	Rows(Vec<FieldValue<'g>>),
	/// Field type has no layout in this schema.
	Unknown,
	/// Null or dangling pointer, or bytes outside the record.
	Unresolved,
}

impl<'g> FieldValue<'g> {
	pub(crate) fn from_decoded(decoded: Option<Decoded<'g>>) -> Self {
		match decoded {
			Some(Decoded::Scalar(Scalar::Int(value))) => Self::Int(value),
			Some(Decoded::Scalar(Scalar::Float(value))) => Self::Float(value),
			Some(Decoded::Array(array)) => Self::Array(array),
			Some(Decoded::Text(text)) => Self::Text(text),
			Some(Decoded::Bytes(bytes)) => Self::Bytes(bytes),
			None => Self::Unresolved,
		}
	}

	/// Integer payload.
	pub fn as_int(&self) -> Option<i64> {
		match self {
			Self::Int(value) => Some(*value),
			_ => None,
		}
	}

	/// Float payload, widening integers.
	pub fn as_float(&self) -> Option<f64> {
		match self {
			Self::Float(value) => Some(*value),
			Self::Int(value) => Some(*value as f64),
			_ => None,
		}
	}

	/// Text payload.
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Text(text) => Some(text),
			_ => None,
		}
	}

	/// Embedded struct, or the first record behind a resolved pointer.
	pub fn as_record(&self) -> Option<Record<'g>> {
		match self {
			Self::Nested(record) => Some(*record),
			Self::Pointer(target) => target.first(),
			_ => None,
		}
	}

	/// Whether this value is [`FieldValue::Unresolved`].
	pub fn is_unresolved(&self) -> bool {
		matches!(self, Self::Unresolved)
	}

	/// Stable lowercase variant label.
	pub fn kind_str(&self) -> &'static str {
		match self {
			Self::Int(_) => "int",
			Self::Float(_) => "float",
			Self::Array(_) => "array",
			Self::Text(_) => "text",
			Self::Bytes(_) => "bytes",
			Self::Pointer(_) => "pointer",
			Self::PointerList(_) => "pointer_list",
			Self::PointerArray(_) => "pointer_array",
			Self::Nested(_) => "nested",
			Self::NestedArray(_) => "nested_array",
			Self::Rows(_) => "rows",
			Self::Unknown => "unknown",
			Self::Unresolved => "unresolved",
		}
	}
}

/// Resolved address-table entry: one record or a run of sibling records.
#[derive(Clone, Copy)]
pub struct RecordRef<'g> {
	graph: &'g BlendGraph,
	address: u64,
	entry: &'g AddressEntry,
}

impl<'g> RecordRef<'g> {
	pub(crate) fn new(graph: &'g BlendGraph, address: u64, entry: &'g AddressEntry) -> Self {
		Self { graph, address, entry }
	}

	/// Old address this reference was resolved from.
	pub fn address(&self) -> u64 {
		self.address
	}

	/// Whether the target block stores more than one instance.
	pub fn is_array(&self) -> bool {
		matches!(self.entry, AddressEntry::Many(_))
	}

	/// Number of records behind this address.
	pub fn len(&self) -> usize {
		self.entry.ids().len()
	}

	/// Whether no record is behind this address.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// First record.
	pub fn first(&self) -> Option<Record<'g>> {
		self.get(0)
	}

	/// Record at slice position `index`.
	pub fn get(&self, index: usize) -> Option<Record<'g>> {
		self.entry.ids().get(index).map(|id| Record::new(self.graph, *id))
	}

	/// Iterate records in slice order.
	pub fn iter(&self) -> impl Iterator<Item = Record<'g>> + 'g {
		let graph = self.graph;
		self.entry.ids().iter().map(move |id| Record::new(graph, *id))
	}
}

impl fmt::Debug for RecordRef<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RecordRef")
			.field("address", &format_args!("{:#x}", self.address))
			.field("ids", &self.entry.ids())
			.finish()
	}
}

impl PartialEq for RecordRef<'_> {
	fn eq(&self, other: &Self) -> bool {
		std::ptr::eq(self.graph, other.graph) && self.address == other.address
	}
}

#[cfg(test)]
mod tests {
	use super::FieldValue;
	use crate::blend::codec::{Decoded, Scalar};

	#[test]
	fn decoded_scalars_map_to_variants() {
		assert!(matches!(FieldValue::from_decoded(Some(Decoded::Scalar(Scalar::Int(3)))), FieldValue::Int(3)));
		assert!(FieldValue::from_decoded(None).is_unresolved());
	}

	#[test]
	fn float_accessor_widens_ints() {
		assert_eq!(FieldValue::Int(2).as_float(), Some(2.0));
		assert_eq!(FieldValue::Float(0.5).as_int(), None);
		assert_eq!(FieldValue::Text("OBCube".into()).as_text(), Some("OBCube"));
		assert_eq!(FieldValue::Unknown.kind_str(), "unknown");
	}
}
