use std::path::PathBuf;

use blendgraph::blend::{BlendError, FieldDescriptor, FieldKind, Result, Schema, StructLayout};

use crate::cmd::util::{emit_json, open_graph};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long = "struct")]
	pub struct_name: Option<String>,
	#[arg(long)]
	pub json: bool,
}

/// Print compiled struct layouts, or the fields of one layout.
pub fn run(args: Args) -> Result<()> {
	let Args { path, struct_name, json } = args;

	let graph = open_graph(&path)?;
	let schema = graph.schema();

	if let Some(name) = struct_name {
		let layout = schema.layout_by_name(&name).ok_or(BlendError::StructNotFound { name })?;
		if json {
			emit_json(&layout_json(layout, schema, true));
			return Ok(());
		}

		println!("struct: {}", layout.name);
		println!("size: {}", layout.instance_size());
		println!("field_sum: {}", layout.total_byte_length);
		println!("field_count: {}", layout.fields.len());
		for field in &layout.fields {
			println!(
				"  +{:<5} {:>5}B  {} {}  [{}]",
				field.offset,
				field.byte_length,
				field.type_name,
				field.decl,
				kind_label(field, schema)
			);
		}
		return Ok(());
	}

	if json {
		let payload = DnaJson {
			pointer_size: schema.pointer_size(),
			names: schema.name_count(),
			types: schema.type_count(),
			structs: schema.layouts().map(|(_, layout)| layout_json(layout, schema, false)).collect(),
		};
		emit_json(&payload);
		return Ok(());
	}

	println!("dna_names: {}", schema.name_count());
	println!("dna_types: {}", schema.type_count());
	println!("dna_structs: {}", schema.sdna_struct_count());
	for (_, layout) in schema.layouts() {
		println!("  {} size={} fields={}", layout.name, layout.instance_size(), layout.fields.len());
	}

	Ok(())
}

/// Label describing how a field decodes.
pub(crate) fn kind_label(field: &FieldDescriptor, schema: &Schema) -> String {
	match field.kind {
		FieldKind::Pointer => "*".repeat(field.pointer_depth as usize),
		FieldKind::Primitive(kind) => kind.as_str().to_owned(),
		FieldKind::Struct(Some(id)) => format!("struct {}", schema.layout(id).name),
		FieldKind::Struct(None) => "unknown".to_owned(),
	}
}

fn layout_json(layout: &StructLayout, schema: &Schema, with_fields: bool) -> LayoutJson {
	LayoutJson {
		name: layout.name.to_string(),
		size: layout.instance_size(),
		field_sum: layout.total_byte_length,
		field_count: layout.fields.len(),
		fields: with_fields.then(|| {
			layout
				.fields
				.iter()
				.map(|field| FieldJson {
					name: field.name.to_string(),
					decl: field.decl.to_string(),
					type_name: field.type_name.to_string(),
					kind: kind_label(field, schema),
					offset: field.offset,
					byte_length: field.byte_length,
					element_size: field.element_size,
					rows: field.rows,
					array_len: field.array_len,
				})
				.collect()
		}),
	}
}

#[derive(serde::Serialize)]
struct FieldJson {
	name: String,
	decl: String,
	#[serde(rename = "type")]
	type_name: String,
	kind: String,
	offset: usize,
	byte_length: usize,
	element_size: usize,
	rows: u32,
	array_len: u32,
}

#[derive(serde::Serialize)]
struct LayoutJson {
	name: String,
	size: usize,
	field_sum: usize,
	field_count: usize,
	#[serde(skip_serializing_if = "Option::is_none")]
	fields: Option<Vec<FieldJson>>,
}

#[derive(serde::Serialize)]
struct DnaJson {
	pointer_size: usize,
	names: usize,
	types: usize,
	structs: Vec<LayoutJson>,
}
