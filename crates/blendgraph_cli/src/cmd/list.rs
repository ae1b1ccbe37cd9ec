use std::path::PathBuf;

use blendgraph::blend::{BlendError, Result};

use crate::cmd::util::{emit_json, open_graph, ptr_hex};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long = "type")]
	pub type_name: Option<String>,
	#[arg(long)]
	pub json: bool,
}

/// Print instance counts per struct type, or the instances of one type.
pub fn run(args: Args) -> Result<()> {
	let Args { path, type_name, json } = args;

	let graph = open_graph(&path)?;

	let Some(type_name) = type_name else {
		let types = graph.type_names();
		if json {
			let payload = TypesJson {
				instances: graph.len(),
				types: types
					.into_iter()
					.map(|(name, count)| TypeCountJson {
						name: name.to_owned(),
						count,
					})
					.collect(),
			};
			emit_json(&payload);
			return Ok(());
		}

		println!("instances: {}", graph.len());
		for (name, count) in types {
			println!("  {name}: {count}");
		}
		return Ok(());
	};

	if graph.schema().layout_id(&type_name).is_none() {
		return Err(BlendError::StructNotFound { name: type_name });
	}

	let rows: Vec<_> = graph
		.instances_of(&type_name)
		.enumerate()
		.map(|(index, record)| InstanceJson {
			index,
			address: ptr_hex(record.address()),
			offset: record.data_range().start,
			size: record.data_range().len(),
			nested: record.parent().is_some(),
			id_name: record.id_name(),
		})
		.collect();

	if json {
		let payload = InstancesJson {
			type_name,
			count: rows.len(),
			instances: rows,
		};
		emit_json(&payload);
		return Ok(());
	}

	println!("type: {type_name}");
	println!("count: {}", rows.len());
	for row in rows {
		let name = row.id_name.as_deref().unwrap_or("-");
		let nested = if row.nested { " nested" } else { "" };
		println!("  [{}] {} @{}+{} {}{}", row.index, row.address, row.offset, row.size, name, nested);
	}

	Ok(())
}

#[derive(serde::Serialize)]
struct TypeCountJson {
	name: String,
	count: usize,
}

#[derive(serde::Serialize)]
struct TypesJson {
	instances: usize,
	types: Vec<TypeCountJson>,
}

#[derive(serde::Serialize)]
struct InstanceJson {
	index: usize,
	address: String,
	offset: usize,
	size: usize,
	nested: bool,
	id_name: Option<String>,
}

#[derive(serde::Serialize)]
struct InstancesJson {
	#[serde(rename = "type")]
	type_name: String,
	count: usize,
	instances: Vec<InstanceJson>,
}
