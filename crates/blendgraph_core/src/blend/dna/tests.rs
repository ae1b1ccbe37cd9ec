use blendgraph_testkit::{Endian, SdnaBuilder};

use crate::blend::{BlendError, Dna, Endianness};

fn sample() -> SdnaBuilder {
	let mut sdna = SdnaBuilder::new(8);
	sdna.add_struct("Vec3", &[("float", "co[3]")]);
	sdna.add_struct("Node", &[("Node", "*next"), ("Vec3", "loc"), ("char", "name[8]")]);
	sdna
}

#[test]
fn parses_tables_in_order() {
	let bytes = sample().encode(Endian::Little);
	let dna = Dna::parse(&bytes, 0, bytes.len(), Endianness::Little).expect("sdna parses");

	assert_eq!(dna.structs.len(), 2);
	assert_eq!(dna.types.len(), dna.tlen.len());

	let node = &dna.structs[1];
	assert_eq!(dna.type_name(node.type_idx), "Node");
	assert_eq!(dna.type_size(node.type_idx), 8 + 12 + 8);

	let fields = dna.raw_fields(node);
	let names: Vec<_> = fields.iter().map(|field| &*field.name).collect();
	assert_eq!(names, ["*next", "loc", "name[8]"]);
	assert_eq!(&*fields[1].type_name, "Vec3");
	assert_eq!(fields[1].element_size, 12);
	assert_eq!(fields[2].element_size, 1);
}

#[test]
fn big_endian_counts_parse() {
	let bytes = sample().encode(Endian::Big);
	let dna = Dna::parse(&bytes, 0, bytes.len(), Endianness::Big).expect("big-endian sdna parses");
	assert_eq!(dna.structs.len(), 2);
	assert_eq!(dna.type_size(dna.structs[0].type_idx), 12);
}

#[test]
fn recovers_from_small_gap_before_marker() {
	let mut sdna = sample();
	// TLEN ends two bytes short of alignment, so six filler bytes fill the window.
	sdna.gap_before("TLEN", 3).gap_before("STRC", 6);
	let bytes = sdna.encode(Endian::Little);
	let dna = Dna::parse(&bytes, 0, bytes.len(), Endianness::Little).expect("gaps within window");
	assert_eq!(dna.structs.len(), 2);
}

#[test]
fn gap_past_window_is_alignment_error() {
	let mut sdna = sample();
	sdna.gap_before("TYPE", 9);
	let bytes = sdna.encode(Endian::Little);
	let err = Dna::parse(&bytes, 0, bytes.len(), Endianness::Little).expect_err("gap exceeds window");
	assert!(matches!(err, BlendError::SchemaAlignment { expected: "TYPE", window: 8, .. }));
}

#[test]
fn error_offsets_are_absolute() {
	let mut bytes = vec![0xAA_u8; 40];
	bytes.extend_from_slice(b"XXXX");
	let err = Dna::parse(&bytes, 40, bytes.len(), Endianness::Little).expect_err("no SDNA marker");
	assert!(matches!(err, BlendError::SchemaAlignment { expected: "SDNA", at: 40, .. }));
}

#[test]
fn truncated_payload_is_schema_truncated() {
	let bytes = sample().encode(Endian::Little);
	let cut = bytes.len() - 3;
	let err = Dna::parse(&bytes, 0, cut, Endianness::Little).expect_err("struct table is cut");
	assert!(matches!(err, BlendError::SchemaTruncated { .. }));
}

#[test]
fn out_of_range_name_index_is_rejected() {
	let mut bytes = sample().encode(Endian::Little);
	// Last field pair of the last struct: overwrite its name index.
	let len = bytes.len();
	bytes[len - 2..].copy_from_slice(&0x7FFF_u16.to_le_bytes());
	let err = Dna::parse(&bytes, 0, len, Endianness::Little).expect_err("name index too large");
	assert!(matches!(
		err,
		BlendError::SchemaIndexOutOfRange {
			kind: "field.name_idx",
			idx: 0x7FFF,
			..
		}
	));
}
