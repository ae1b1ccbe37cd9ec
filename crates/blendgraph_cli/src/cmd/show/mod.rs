use std::path::PathBuf;

use blendgraph::blend::{FieldValue, Record, RecordRef, Result, Scalar};
use serde_json::{Value, json};

use crate::cmd::util::{emit_json, open_graph, ptr_hex};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long = "type")]
	pub type_name: String,
	#[arg(long, default_value_t = 0)]
	pub index: usize,
	#[arg(long = "max-depth", default_value_t = 2)]
	pub max_depth: u32,
	#[arg(long)]
	pub json: bool,
}

/// Decode and print every field of one record.
pub fn run(args: Args) -> Result<()> {
	let Args {
		path,
		type_name,
		index,
		max_depth,
		json,
	} = args;

	let graph = open_graph(&path)?;
	let record = graph.instance(&type_name, index)?;

	if json {
		let mut payload = record_json(record, max_depth);
		payload["index"] = json!(index);
		payload["address"] = json!(ptr_hex(record.address()));
		payload["offset"] = json!(record.data_range().start);
		payload["size"] = json!(record.data_range().len());
		payload["id_name"] = json!(record.id_name());
		emit_json(&payload);
		return Ok(());
	}

	println!("type: {}", record.type_name());
	println!("index: {index}");
	println!("address: {}", ptr_hex(record.address()));
	println!("range: {:?}", record.data_range());
	if let Some(name) = record.id_name() {
		println!("id_name: {name}");
	}
	print_record(record, 1, max_depth);

	Ok(())
}

fn print_record(record: Record<'_>, indent: usize, depth: u32) {
	let pad = "  ".repeat(indent);
	for (index, name) in record.field_names().enumerate() {
		let value = record.get_at(index);
		match value {
			FieldValue::Nested(child) if depth > 0 => {
				println!("{pad}{name}: {}", child.type_name());
				print_record(child, indent + 1, depth - 1);
			}
			_ => println!("{pad}{name}: {}", value_text(&value)),
		}
	}
}

/// One-line rendering of a field value.
pub(crate) fn value_text(value: &FieldValue<'_>) -> String {
	match value {
		FieldValue::Int(value) => value.to_string(),
		FieldValue::Float(value) => value.to_string(),
		FieldValue::Array(array) => {
			let items: Vec<_> = array.iter().map(scalar_text).collect();
			format!("[{}]", items.join(", "))
		}
		FieldValue::Text(text) => format!("{text:?}"),
		FieldValue::Bytes(bytes) => format!("bytes[{}]", bytes.len()),
		FieldValue::Pointer(target) => ref_text(target),
		FieldValue::PointerList(targets) => {
			let items: Vec<_> = targets.iter().map(ref_text).collect();
			format!("[{}]", items.join(", "))
		}
		FieldValue::PointerArray(slots) => {
			let items: Vec<_> = slots.iter().map(|slot| slot.as_ref().map(ref_text).unwrap_or_else(|| "null".to_owned())).collect();
			format!("[{}]", items.join(", "))
		}
		FieldValue::Nested(record) => format!("{{{}}}", record.type_name()),
		FieldValue::NestedArray(records) => match records.first() {
			Some(first) => format!("[{{{}}} x {}]", first.type_name(), records.len()),
			None => "[]".to_owned(),
		},
		FieldValue::Rows(rows) => {
			let items: Vec<_> = rows.iter().map(value_text).collect();
			format!("[{}]", items.join(", "))
		}
		FieldValue::Unknown => "<unknown>".to_owned(),
		FieldValue::Unresolved => "null".to_owned(),
	}
}

fn scalar_text(scalar: Scalar) -> String {
	match scalar {
		Scalar::Int(value) => value.to_string(),
		Scalar::Float(value) => value.to_string(),
	}
}

fn ref_text(target: &RecordRef<'_>) -> String {
	let type_name = target.first().map(|record| record.type_name()).unwrap_or("?");
	if target.is_array() {
		format!("-> {} ({type_name} x{})", ptr_hex(target.address()), target.len())
	} else {
		format!("-> {} ({type_name})", ptr_hex(target.address()))
	}
}

/// JSON object with the record's type and fields in declaration order.
pub(crate) fn record_json(record: Record<'_>, depth: u32) -> Value {
	let fields: Vec<_> = record
		.field_names()
		.enumerate()
		.map(|(index, name)| {
			let value = record.get_at(index);
			json!({
				"name": name,
				"kind": value.kind_str(),
				"value": value_json(&value, depth),
			})
		})
		.collect();
	json!({ "type": record.type_name(), "fields": fields })
}

/// JSON rendering of a field value; embedded structs expand while `depth` allows.
pub(crate) fn value_json(value: &FieldValue<'_>, depth: u32) -> Value {
	match value {
		FieldValue::Int(value) => json!(value),
		FieldValue::Float(value) => float_json(*value),
		FieldValue::Array(array) => Value::Array(array.iter().map(scalar_json).collect()),
		FieldValue::Text(text) => json!(text),
		FieldValue::Bytes(bytes) => json!(bytes),
		FieldValue::Pointer(target) => ref_json(target),
		FieldValue::PointerList(targets) => Value::Array(targets.iter().map(ref_json).collect()),
		FieldValue::PointerArray(slots) => Value::Array(slots.iter().map(|slot| slot.as_ref().map(ref_json).unwrap_or(Value::Null)).collect()),
		FieldValue::Nested(record) => nested_json(*record, depth),
		FieldValue::NestedArray(records) => Value::Array(records.iter().map(|record| nested_json(*record, depth)).collect()),
		FieldValue::Rows(rows) => Value::Array(rows.iter().map(|row| value_json(row, depth)).collect()),
		FieldValue::Unknown | FieldValue::Unresolved => Value::Null,
	}
}

fn nested_json(record: Record<'_>, depth: u32) -> Value {
	if depth == 0 {
		return json!({ "type": record.type_name() });
	}
	record_json(record, depth - 1)
}

fn scalar_json(scalar: Scalar) -> Value {
	match scalar {
		Scalar::Int(value) => json!(value),
		Scalar::Float(value) => float_json(value),
	}
}

fn float_json(value: f64) -> Value {
	serde_json::Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

fn ref_json(target: &RecordRef<'_>) -> Value {
	json!({
		"ptr": ptr_hex(target.address()),
		"type": target.first().map(|record| record.type_name()),
		"count": target.len(),
	})
}
