#![allow(missing_docs)]

use std::path::PathBuf;
use std::process::{Command, Output};

use blendgraph_testkit::{BlendWriter, Endian, SdnaBuilder, tiny_blend, write_temp};
use serde_json::Value;

fn scene_fixture(name: &str) -> PathBuf {
	let mut sdna = SdnaBuilder::new(8);
	sdna.add_struct("ID", &[("ID", "*next"), ("char", "name[16]")]);
	let camera = sdna.add_struct("Camera", &[("ID", "id"), ("float", "lens")]);
	let object = sdna.add_struct("Object", &[("ID", "id"), ("Camera", "*data"), ("float", "loc[3]")]);

	let mut file = BlendWriter::legacy(8, Endian::Little, "300");
	file.thumbnail(1, 1, &[0xFFFF_FFFF]);
	file.dna(&sdna);
	let payload = file.payload().ptr(0).text("CACam", 16).f32(50.0).build();
	file.block(b"CA\0\0", 0x2000, camera, 1, &payload);
	let payload = file.payload().ptr(0).text("OBCamera", 16).ptr(0x2000).f32(1.0).f32(2.0).f32(3.0).build();
	file.block(b"OB\0\0", 0x1000, object, 1, &payload);
	file.endb();
	write_temp(name, &file.finish())
}

fn run(args: &[&str]) -> Output {
	Command::new(env!("CARGO_BIN_EXE_blendgraph")).args(args).output().expect("command executes")
}

fn run_json(args: &[&str]) -> Value {
	let output = run(args);
	assert!(
		output.status.success(),
		"blendgraph failed with status={}: {}",
		output.status,
		String::from_utf8_lossy(&output.stderr)
	);
	serde_json::from_slice(&output.stdout).expect("stdout should be valid json")
}

#[test]
fn info_json_reports_header_and_counts() {
	let path = scene_fixture("info.blend");
	let json = run_json(&["info", path.to_str().expect("utf8 path"), "--json"]);

	assert_eq!(json["version"], "300");
	assert_eq!(json["pointer_size"], 8);
	assert_eq!(json["endianness"], "little");
	assert_eq!(json["bhead_layout"], "legacy");
	assert_eq!(json["thumbnail"]["width"], 1);
	assert_eq!(json["bound_blocks"], 2);
	assert_eq!(json["addresses"], 2);
	assert!(json["top_codes"].as_array().is_some_and(|codes| !codes.is_empty()));
}

#[test]
fn dna_json_lists_struct_fields_with_offsets() {
	let path = scene_fixture("dna.blend");
	let json = run_json(&["dna", path.to_str().expect("utf8 path"), "--struct", "Object", "--json"]);

	assert_eq!(json["name"], "Object");
	assert_eq!(json["size"], 24 + 8 + 12);
	let fields = json["fields"].as_array().expect("fields array");
	assert_eq!(fields.len(), 3);
	assert_eq!(fields[1]["name"], "data");
	assert_eq!(fields[1]["offset"], 24);
	assert_eq!(fields[1]["kind"], "*");
	assert_eq!(fields[2]["byte_length"], 12);
	assert_eq!(fields[0]["kind"], "struct ID");
}

#[test]
fn dna_json_without_struct_lists_layouts() {
	let path = scene_fixture("dna_all.blend");
	let json = run_json(&["dna", path.to_str().expect("utf8 path"), "--json"]);
	let names: Vec<_> = json["structs"]
		.as_array()
		.expect("structs array")
		.iter()
		.filter_map(|item| item["name"].as_str())
		.collect();
	assert_eq!(names, ["ID", "Camera", "Object"]);
}

#[test]
fn list_json_counts_types_and_names_instances() {
	let path = scene_fixture("list.blend");
	let path = path.to_str().expect("utf8 path");

	let json = run_json(&["list", path, "--json"]);
	let types = json["types"].as_array().expect("types array");
	let id_count = types.iter().find(|item| item["name"] == "ID").map(|item| item["count"].clone());
	assert_eq!(id_count, Some(Value::from(2)));

	let json = run_json(&["list", path, "--type", "Object", "--json"]);
	assert_eq!(json["count"], 1);
	assert_eq!(json["instances"][0]["id_name"], "Camera");
	assert_eq!(json["instances"][0]["address"], "0x0000000000001000");
}

#[test]
fn show_json_follows_pointer_to_camera() {
	let path = scene_fixture("show.blend");
	let json = run_json(&["show", path.to_str().expect("utf8 path"), "--type", "Object", "--json"]);

	assert_eq!(json["type"], "Object");
	assert_eq!(json["id_name"], "Camera");
	let fields = json["fields"].as_array().expect("fields array");
	assert_eq!(fields[1]["kind"], "pointer");
	assert_eq!(fields[1]["value"]["type"], "Camera");
	assert_eq!(fields[2]["value"], serde_json::json!([1.0, 2.0, 3.0]));
}

#[test]
fn show_text_prints_fields() {
	let path = write_temp("show_text.blend", &tiny_blend());
	let output = run(&["show", path.to_str().expect("utf8 path"), "--type", "Tiny"]);
	assert!(output.status.success());
	let stdout = String::from_utf8_lossy(&output.stdout);
	assert!(stdout.contains("x: 42"), "unexpected output: {stdout}");
}

#[test]
fn missing_record_exits_with_error() {
	let path = write_temp("missing_record.blend", &tiny_blend());
	let output = run(&["show", path.to_str().expect("utf8 path"), "--type", "Tiny", "--index", "4"]);
	assert!(!output.status.success());
	assert!(String::from_utf8_lossy(&output.stderr).contains("no Tiny instance at index 4"));
}

#[test]
fn non_blend_input_exits_with_error() {
	let path = write_temp("not_a_blend.bin", b"PK\x03\x04 zip bytes");
	let output = run(&["info", path.to_str().expect("utf8 path")]);
	assert_eq!(output.status.code(), Some(1));
	assert!(String::from_utf8_lossy(&output.stderr).contains("not a .blend file"));
}
