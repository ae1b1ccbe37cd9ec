use std::path::PathBuf;

use blendgraph::blend::Result;

use crate::cmd::util::{code_label, emit_json, open_graph};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long)]
	pub json: bool,
}

/// Print header fields, schema counts, and scan totals.
pub fn run(args: Args) -> Result<()> {
	let Args { path, json } = args;

	let graph = open_graph(&path)?;
	let header = graph.header();
	let schema = graph.schema();
	let stats = graph.block_stats();

	let mut codes: Vec<_> = stats.codes.iter().map(|(code, count)| (*code, *count)).collect();
	codes.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(&right.0)));

	if json {
		let payload = InfoJson {
			path: path.display().to_string(),
			version: graph.version(),
			format_version: header.format_version,
			header_size: header.header_size,
			bhead_layout: header.bhead_layout_label(),
			endianness: header.endianness.as_str(),
			pointer_size: header.pointer_size,
			schema: SchemaJson {
				names: schema.name_count(),
				types: schema.type_count(),
				structs: schema.sdna_struct_count(),
				layouts: schema.len(),
			},
			block_count: stats.block_count,
			bound_blocks: stats.bound_blocks,
			skipped_blocks: stats.skipped_blocks,
			records: graph.record_count(),
			instances: graph.len(),
			addresses: graph.addresses().len(),
			thumbnail: graph.thumbnail().map(|thumb| ThumbnailJson {
				width: thumb.width,
				height: thumb.height,
			}),
			top_codes: codes
				.iter()
				.take(12)
				.map(|(code, count)| CodeCountJson {
					code: code_label(*code),
					count: *count,
				})
				.collect(),
		};
		emit_json(&payload);
		return Ok(());
	}

	println!("path: {}", path.display());
	println!("version: {}", graph.version());
	println!("format_version: {}", header.format_version);
	println!("header_size: {}", header.header_size);
	println!("bhead_layout: {}", header.bhead_layout_label());
	println!("endianness: {}", header.endianness.as_str());
	println!("pointer_size: {}", header.pointer_size);
	println!("dna_names: {}", schema.name_count());
	println!("dna_types: {}", schema.type_count());
	println!("dna_structs: {}", schema.sdna_struct_count());
	println!("block_count: {}", stats.block_count);
	println!("bound_blocks: {}", stats.bound_blocks);
	println!("skipped_blocks: {}", stats.skipped_blocks);
	println!("records: {}", graph.record_count());
	println!("instances: {}", graph.len());
	println!("addresses: {}", graph.addresses().len());
	match graph.thumbnail() {
		Some(thumb) => println!("thumbnail: {}x{}", thumb.width, thumb.height),
		None => println!("thumbnail: -"),
	}

	println!("top_codes:");
	for (code, count) in codes.into_iter().take(12) {
		println!("  {}: {}", code_label(code), count);
	}

	Ok(())
}

#[derive(serde::Serialize)]
struct SchemaJson {
	names: usize,
	types: usize,
	structs: usize,
	layouts: usize,
}

#[derive(serde::Serialize)]
struct ThumbnailJson {
	width: u32,
	height: u32,
}

#[derive(serde::Serialize)]
struct CodeCountJson {
	code: String,
	count: usize,
}

#[derive(serde::Serialize)]
struct InfoJson {
	path: String,
	version: String,
	format_version: u16,
	header_size: usize,
	bhead_layout: &'static str,
	endianness: &'static str,
	pointer_size: usize,
	schema: SchemaJson,
	block_count: usize,
	bound_blocks: usize,
	skipped_blocks: usize,
	records: usize,
	instances: usize,
	addresses: usize,
	thumbnail: Option<ThumbnailJson>,
	top_codes: Vec<CodeCountJson>,
}
