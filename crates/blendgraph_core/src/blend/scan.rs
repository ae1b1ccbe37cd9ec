use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::blend::record::Binder;
use crate::blend::{
	AddressEntry, AddressTable, BHead, BlendError, BlendGraph, BlendHeader, Block, BlockIter, BlockStats, Dna, Endianness, LayoutId, RecordId,
	Result, Schema, SchemaKey, SchemaRegistry, StructRecord, Thumbnail,
};

/// Knobs for one parse.
#[derive(Debug, Clone)]
pub struct ParseOptions {
	/// Decode the `TEST` thumbnail block.
	pub load_thumbnail: bool,
	/// Add embedded struct records to the type index and instance list.
	pub index_nested: bool,
	/// Embedded structs deeper than this read as [`crate::blend::FieldValue::Unknown`].
	pub max_nesting_depth: u32,
	/// Upper bound on entries returned by one pointer-to-pointer walk.
	pub max_pointer_list_len: usize,
}

impl Default for ParseOptions {
	fn default() -> Self {
		Self {
			load_thumbnail: true,
			index_nested: true,
			max_nesting_depth: 32,
			max_pointer_list_len: 1 << 20,
		}
	}
}

/// Parse a whole `.blend` buffer with default options and the process-wide schema cache.
pub fn parse(bytes: impl Into<Vec<u8>>) -> Result<BlendGraph> {
	parse_with(bytes, SchemaRegistry::global(), &ParseOptions::default())
}

/// Parse a whole `.blend` buffer with an explicit schema cache and options.
///
/// Any framing or schema error aborts the parse; no partial graph is returned.
pub fn parse_with(bytes: impl Into<Vec<u8>>, registry: &SchemaRegistry, options: &ParseOptions) -> Result<BlendGraph> {
	let bytes = bytes.into();
	let header = BlendHeader::parse(&bytes)?;
	debug!(
		version = %header.version_label(),
		pointer_size = header.pointer_size,
		endianness = header.endianness.as_str(),
		layout = header.bhead_layout_label(),
		"read blend header"
	);

	let key = SchemaKey::for_header(&header);
	let schema = registry.get_or_compile(key, || compile_schema(&bytes, &header))?;

	let scanned = scan_blocks(&bytes, &header, &schema, options)?;
	debug!(
		blocks = scanned.stats.block_count,
		records = scanned.records.len(),
		addresses = scanned.addresses.len(),
		"scanned blocks"
	);

	Ok(BlendGraph {
		bytes,
		header,
		schema,
		records: scanned.records,
		addresses: scanned.addresses,
		by_type: scanned.by_type,
		all: scanned.all,
		thumbnail: scanned.thumbnail,
		stats: scanned.stats,
		max_pointer_list_len: options.max_pointer_list_len,
	})
}

/// Walk blocks up to the first `DNA1` and compile its schema.
fn compile_schema(bytes: &[u8], header: &BlendHeader) -> Result<Schema> {
	for block in BlockIter::new(bytes, header.header_size, *header) {
		let block = block?;
		if block.head.is_endb() {
			return Err(BlendError::SchemaNotFound { at: block.file_offset });
		}
		if block.head.code != BHead::DNA1 {
			continue;
		}

		debug!(offset = block.file_offset, len = block.payload.len(), "located DNA1 block");
		let dna = Dna::from_block(bytes, &block, header.endianness)?;
		let schema = Schema::compile(&dna, header.pointer_size, header.endianness);
		debug!(
			names = dna.names.len(),
			types = dna.types.len(),
			structs = dna.structs.len(),
			layouts = schema.len(),
			"compiled schema"
		);
		return Ok(schema);
	}

	Err(BlendError::SchemaNotFound { at: bytes.len() })
}

struct Scanned {
	records: Vec<StructRecord>,
	addresses: AddressTable,
	by_type: HashMap<LayoutId, Vec<RecordId>>,
	all: Vec<RecordId>,
	thumbnail: Option<Thumbnail>,
	stats: BlockStats,
}

fn scan_blocks(bytes: &[u8], header: &BlendHeader, schema: &Arc<Schema>, options: &ParseOptions) -> Result<Scanned> {
	let mut binder = Binder::new(schema, options);
	let mut addresses = AddressTable::default();
	let mut thumbnail = None;
	let mut stats = BlockStats::default();

	for block in BlockIter::new(bytes, header.header_size, *header) {
		let block = block?;
		stats.block_count += 1;
		*stats.codes.entry(block.head.code).or_insert(0) += 1;
		trace!(
			code = %String::from_utf8_lossy(&block.head.code),
			offset = block.file_offset,
			len = block.head.len,
			sdna = block.head.sdna_nr,
			count = block.head.nr,
			"block"
		);

		match block.head.code {
			BHead::ENDB | BHead::DNA1 => {}
			BHead::TEST => {
				if options.load_thumbnail {
					thumbnail = read_thumbnail(&block, header)?;
				}
			}
			_ => {
				if bind_block(&mut binder, &mut addresses, schema, &block) {
					stats.bound_blocks += 1;
				} else {
					stats.skipped_blocks += 1;
				}
			}
		}
	}

	Ok(Scanned {
		records: binder.records,
		addresses,
		by_type: binder.by_type,
		all: binder.all,
		thumbnail,
		stats,
	})
}

/// Bind every instance a data block holds and register them under its old address.
///
/// Returns `false` when the block is skipped.
fn bind_block(binder: &mut Binder<'_>, addresses: &mut AddressTable, schema: &Schema, block: &Block<'_>) -> bool {
	if block.head.nr == 0 {
		return false;
	}
	let Some(layout) = schema.layout_for_sdna(block.head.sdna_nr) else {
		return false;
	};

	let size = schema.layout(layout).instance_size();
	let len = block.payload.len();
	let declared = usize::try_from(block.head.nr).unwrap_or(usize::MAX);
	// Instances beyond the payload are not bound.
	let count = if size == 0 { 1 } else { declared.min(len.div_ceil(size).max(1)) };

	let ids: Vec<_> = (0..count)
		.map(|slot| {
			let start = block.data_offset + slot * size;
			let end = (start + size).min(block.data_end());
			binder.bind(layout, block.head.old, start, end.max(start))
		})
		.collect();

	let entry = match ids.as_slice() {
		[id] if block.head.nr == 1 => AddressEntry::One(*id),
		_ => AddressEntry::Many(ids.into_boxed_slice()),
	};
	addresses.insert(block.head.old, entry);
	true
}

/// Decode a `TEST` block: `width:i32, height:i32`, then `width * height` RGBA pixels.
fn read_thumbnail(block: &Block<'_>, header: &BlendHeader) -> Result<Option<Thumbnail>> {
	let invalid = |reason: &'static str| BlendError::InvalidBlockLength {
		at: block.file_offset,
		len: block.payload.len() as i64,
		reason,
	};

	let payload = block.payload;
	let (Some(width), Some(height)) = (read_i32(payload, 0, header), read_i32(payload, 4, header)) else {
		return Err(invalid("thumbnail block shorter than its size prefix"));
	};
	if width <= 0 || height <= 0 {
		return Ok(None);
	}

	let pixel_bytes = (width as u64) * (height as u64) * 4;
	if (payload.len() as u64) < pixel_bytes + 8 {
		return Err(invalid("thumbnail block shorter than width * height * 4 + 8"));
	}

	let pixels = payload[8..8 + pixel_bytes as usize]
		.chunks_exact(4)
		.map(|raw| u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
		.collect();
	debug!(width, height, "decoded thumbnail");
	Ok(Some(Thumbnail {
		width: width as u32,
		height: height as u32,
		pixels,
	}))
}

fn read_i32(bytes: &[u8], offset: usize, header: &BlendHeader) -> Option<i32> {
	let raw: [u8; 4] = bytes.get(offset..offset + 4)?.try_into().ok()?;
	Some(match header.endianness {
		Endianness::Little => i32::from_le_bytes(raw),
		Endianness::Big => i32::from_be_bytes(raw),
	})
}
