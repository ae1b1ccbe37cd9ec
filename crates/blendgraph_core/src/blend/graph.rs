use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::blend::{AddressTable, BlendError, BlendHeader, LayoutId, Record, RecordId, RecordRef, Result, Schema, StructRecord, parse};

/// Decoded `TEST` block thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
	/// Width in pixels.
	pub width: u32,
	/// Height in pixels.
	pub height: u32,
	/// RGBA pixels, one `u32` per pixel read little-endian from the stored `r, g, b, a` bytes.
	pub pixels: Vec<u32>,
}

impl Thumbnail {
	/// Pixels as interleaved RGBA bytes.
	pub fn to_rgba8(&self) -> Vec<u8> {
		self.pixels.iter().flat_map(|pixel| pixel.to_le_bytes()).collect()
	}
}

/// Block-level counts from the linear scan.
#[derive(Debug, Clone, Default)]
pub struct BlockStats {
	/// Number of blocks visited, `ENDB` included.
	pub block_count: usize,
	/// Data blocks that bound at least one record.
	pub bound_blocks: usize,
	/// Data blocks skipped for a zero count or an SDNA index without a layout.
	pub skipped_blocks: usize,
	/// Frequency table by block code.
	pub codes: HashMap<[u8; 4], usize>,
}

/// Parse result: every bound record plus the address table linking them.
pub struct BlendGraph {
	pub(crate) bytes: Vec<u8>,
	pub(crate) header: BlendHeader,
	pub(crate) schema: Arc<Schema>,
	pub(crate) records: Vec<StructRecord>,
	pub(crate) addresses: AddressTable,
	pub(crate) by_type: HashMap<LayoutId, Vec<RecordId>>,
	pub(crate) all: Vec<RecordId>,
	pub(crate) thumbnail: Option<Thumbnail>,
	pub(crate) stats: BlockStats,
	pub(crate) max_pointer_list_len: usize,
}

impl BlendGraph {
	/// Read a file from disk and parse it with default options.
	pub fn open(path: impl AsRef<Path>) -> Result<Self> {
		let bytes = std::fs::read(path)?;
		parse(bytes)
	}

	/// Bytes the graph was parsed from.
	pub fn bytes(&self) -> &[u8] {
		&self.bytes
	}

	/// Parsed file header.
	pub fn header(&self) -> &BlendHeader {
		&self.header
	}

	/// Compiled schema shared with other files of the same version.
	pub fn schema(&self) -> &Schema {
		&self.schema
	}

	/// Shared handle to the compiled schema.
	pub fn schema_arc(&self) -> Arc<Schema> {
		Arc::clone(&self.schema)
	}

	/// Version label from the header.
	pub fn version(&self) -> String {
		self.header.version_label()
	}

	/// Decoded thumbnail, if present and loaded.
	pub fn thumbnail(&self) -> Option<&Thumbnail> {
		self.thumbnail.as_ref()
	}

	/// Block scan counts.
	pub fn block_stats(&self) -> &BlockStats {
		&self.stats
	}

	/// Number of indexed instances.
	pub fn len(&self) -> usize {
		self.all.len()
	}

	/// Whether no instance was indexed.
	pub fn is_empty(&self) -> bool {
		self.all.is_empty()
	}

	/// Number of bound records, indexed or not.
	pub fn record_count(&self) -> usize {
		self.records.len()
	}

	/// View a record by arena id.
	pub fn record(&self, id: RecordId) -> Option<Record<'_>> {
		(id.index() < self.records.len()).then(|| Record::new(self, id))
	}

	/// Iterate indexed instances in binding order.
	pub fn instances(&self) -> impl Iterator<Item = Record<'_>> {
		self.all.iter().map(|id| Record::new(self, *id))
	}

	/// Iterate indexed instances of one struct type in binding order.
	pub fn instances_of<'g>(&'g self, type_name: &str) -> impl Iterator<Item = Record<'g>> + use<'g> {
		let ids = self
			.schema
			.layout_id(type_name)
			.and_then(|layout| self.by_type.get(&layout))
			.map(Vec::as_slice)
			.unwrap_or(&[]);
		ids.iter().map(|id| Record::new(self, *id))
	}

	/// Number of indexed instances of one struct type.
	pub fn instance_count(&self, type_name: &str) -> usize {
		self.instances_of(type_name).count()
	}

	/// Indexed instance `index` of `type_name`.
	pub fn instance(&self, type_name: &str, index: usize) -> Result<Record<'_>> {
		if self.schema.layout_id(type_name).is_none() {
			return Err(BlendError::StructNotFound { name: type_name.to_owned() });
		}
		let count = self.instance_count(type_name);
		self.instances_of(type_name).nth(index).ok_or_else(|| BlendError::RecordNotFound {
			type_name: type_name.to_owned(),
			index,
			count,
		})
	}

	/// Type names with at least one indexed instance, with counts, sorted by name.
	pub fn type_names(&self) -> Vec<(&str, usize)> {
		let mut out: Vec<_> = self
			.by_type
			.iter()
			.map(|(layout, ids)| (&*self.schema.layout(*layout).name, ids.len()))
			.collect();
		out.sort_unstable();
		out
	}

	/// Address table built during the scan.
	pub fn addresses(&self) -> &AddressTable {
		&self.addresses
	}

	/// Resolve an old address to the records bound from its block.
	pub fn lookup(&self, address: u64) -> Option<RecordRef<'_>> {
		let entry = self.addresses.get(address)?;
		Some(RecordRef::new(self, address, entry))
	}
}

impl fmt::Debug for BlendGraph {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BlendGraph")
			.field("version", &self.version())
			.field("bytes", &self.bytes.len())
			.field("records", &self.records.len())
			.field("addresses", &self.addresses.len())
			.finish_non_exhaustive()
	}
}
