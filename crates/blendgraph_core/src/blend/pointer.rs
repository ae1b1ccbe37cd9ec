use std::collections::HashMap;

use crate::blend::{BlendGraph, Endianness, FieldValue, RecordId, RecordRef};

/// What one old address maps to in the address table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressEntry {
	/// Block with a single instance.
	One(RecordId),
	/// Block with several same-typed instances, in slice order.
	Many(Box<[RecordId]>),
}

impl AddressEntry {
	/// First bound record.
	pub fn first(&self) -> Option<RecordId> {
		match self {
			Self::One(id) => Some(*id),
			Self::Many(ids) => ids.first().copied(),
		}
	}

	/// Records in slice order.
	pub fn ids(&self) -> &[RecordId] {
		match self {
			Self::One(id) => std::slice::from_ref(id),
			Self::Many(ids) => ids,
		}
	}
}

/// Map from stored old address to bound records.
#[derive(Debug, Default)]
pub struct AddressTable {
	entries: HashMap<u64, AddressEntry>,
}

impl AddressTable {
	/// Register records under `address`; a later block with the same address replaces the earlier one.
	pub fn insert(&mut self, address: u64, entry: AddressEntry) -> Option<AddressEntry> {
		self.entries.insert(address, entry)
	}

	/// Look up an address. Null (`0`) never resolves.
	pub fn get(&self, address: u64) -> Option<&AddressEntry> {
		if address == 0 {
			return None;
		}
		self.entries.get(&address)
	}

	/// Number of registered addresses.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether nothing is registered.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Iterate registered addresses and their entries in arbitrary order.
	pub fn iter(&self) -> impl Iterator<Item = (u64, &AddressEntry)> {
		self.entries.iter().map(|(address, entry)| (*address, entry))
	}
}

/// Decode the stored pointer at `offset` into an address key.
///
/// Returns `None` when the slot would read past `bytes`.
pub fn decode_pointer(bytes: &[u8], offset: usize, pointer_size: usize, endianness: Endianness) -> Option<u64> {
	let raw = bytes.get(offset..offset.checked_add(pointer_size)?)?;
	Some(match (pointer_size, endianness) {
		(4, Endianness::Little) => u64::from(u32::from_le_bytes(raw.try_into().ok()?)),
		(4, Endianness::Big) => u64::from(u32::from_be_bytes(raw.try_into().ok()?)),
		(8, Endianness::Little) => u64::from_le_bytes(raw.try_into().ok()?),
		(8, Endianness::Big) => u64::from_be_bytes(raw.try_into().ok()?),
		_ => return None,
	})
}

impl BlendGraph {
	/// Resolve the pointer slot at absolute `offset`.
	pub(crate) fn resolve_pointer(&self, offset: usize) -> Option<RecordRef<'_>> {
		let header = self.header();
		let address = decode_pointer(self.bytes(), offset, header.pointer_size, header.endianness)?;
		self.lookup(address)
	}

	/// Resolve `len` consecutive pointer slots starting at `offset`.
	pub(crate) fn resolve_pointer_array(&self, offset: usize, len: usize) -> Vec<Option<RecordRef<'_>>> {
		let step = self.header().pointer_size;
		(0..len).map(|slot| self.resolve_pointer(offset + slot * step)).collect()
	}

	/// Resolve a pointer-to-pointer slot.
	///
	/// The slot at `offset` names a base record; pointer slots are then read
	/// from the base record's first byte onward until one fails to resolve,
	/// the buffer ends, or the configured list limit is reached.
	pub(crate) fn resolve_pointer_list(&self, offset: usize) -> FieldValue<'_> {
		let Some(base) = self.resolve_pointer(offset).and_then(|target| target.first()) else {
			return FieldValue::Unresolved;
		};

		let step = self.header().pointer_size;
		let mut slot = base.data_range().start;
		let mut out = Vec::new();
		while out.len() < self.max_pointer_list_len {
			let Some(target) = self.resolve_pointer(slot) else {
				break;
			};
			out.push(target);
			slot += step;
		}
		FieldValue::PointerList(out)
	}
}

#[cfg(test)]
mod tests {
	use super::{AddressEntry, AddressTable, decode_pointer};
	use crate::blend::{Endianness, RecordId};

	#[test]
	fn decodes_both_widths_and_orders() {
		let bytes = [0x10, 0x20, 0x30, 0x40, 0x50, 0x60, 0x70, 0x80];
		assert_eq!(decode_pointer(&bytes, 0, 4, Endianness::Little), Some(0x4030_2010));
		assert_eq!(decode_pointer(&bytes, 0, 4, Endianness::Big), Some(0x1020_3040));
		assert_eq!(decode_pointer(&bytes, 0, 8, Endianness::Little), Some(0x8070_6050_4030_2010));
		assert_eq!(decode_pointer(&bytes, 0, 8, Endianness::Big), Some(0x1020_3040_5060_7080));
	}

	#[test]
	fn slot_past_end_is_none() {
		let bytes = [0_u8; 6];
		assert_eq!(decode_pointer(&bytes, 4, 4, Endianness::Little), None);
		assert_eq!(decode_pointer(&bytes, usize::MAX, 8, Endianness::Little), None);
	}

	#[test]
	fn null_never_resolves() {
		let mut table = AddressTable::default();
		table.insert(0, AddressEntry::One(RecordId(0)));
		table.insert(0x40, AddressEntry::Many(vec![RecordId(1), RecordId(2)].into_boxed_slice()));
		assert!(table.get(0).is_none());
		let entry = table.get(0x40).expect("registered");
		assert_eq!(entry.ids(), &[RecordId(1), RecordId(2)]);
		assert_eq!(entry.first(), Some(RecordId(1)));
	}

	#[test]
	fn later_insert_replaces_earlier() {
		let mut table = AddressTable::default();
		table.insert(0x40, AddressEntry::One(RecordId(0)));
		let previous = table.insert(0x40, AddressEntry::One(RecordId(5)));
		assert_eq!(previous, Some(AddressEntry::One(RecordId(0))));
		assert_eq!(table.get(0x40).and_then(AddressEntry::first), Some(RecordId(5)));
	}
}
