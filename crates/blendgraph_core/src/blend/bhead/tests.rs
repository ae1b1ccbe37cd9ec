use crate::blend::bytes::Cursor;
use crate::blend::{BHead, BlendError, BlendHeader};

#[test]
fn parses_legacy_little_endian_bhead_with_4_byte_pointers() {
	let header = BlendHeader::parse(b"BLENDER_v280").expect("header parses");
	let mut bytes = Vec::new();
	bytes.extend_from_slice(b"OB\0\0");
	bytes.extend_from_slice(&16_i32.to_le_bytes());
	bytes.extend_from_slice(&0x1000_u32.to_le_bytes());
	bytes.extend_from_slice(&3_u32.to_le_bytes());
	bytes.extend_from_slice(&2_i32.to_le_bytes());

	let mut cursor = Cursor::new(&bytes);
	let head = BHead::parse(&mut cursor, &header).expect("bhead parses");
	assert_eq!(head.code, *b"OB\0\0");
	assert_eq!(head.len, 16);
	assert_eq!(head.old, 0x1000);
	assert_eq!(head.sdna_nr, 3);
	assert_eq!(head.nr, 2);
	assert_eq!(cursor.pos(), header.bhead_size());
}

#[test]
fn parses_legacy_big_endian_bhead_with_8_byte_pointers() {
	let header = BlendHeader::parse(b"BLENDER-V249").expect("header parses");
	let mut bytes = Vec::new();
	bytes.extend_from_slice(b"TEST");
	bytes.extend_from_slice(&12_i32.to_le_bytes());
	bytes.extend_from_slice(&0x0000_0001_99AA_BBCC_u64.to_be_bytes());
	bytes.extend_from_slice(&7_u32.to_be_bytes());
	bytes.extend_from_slice(&1_i32.to_be_bytes());

	let mut cursor = Cursor::new(&bytes);
	let head = BHead::parse(&mut cursor, &header).expect("legacy bhead parses");
	assert_eq!(head.old, 0x0000_0001_99AA_BBCC);
	assert_eq!(head.sdna_nr, 7);
	assert_eq!(head.len, 12);
	assert_eq!(head.nr, 1);
}

#[test]
fn parses_v1_bhead() {
	let header = BlendHeader::parse(b"BLENDER17-01v0500").expect("header parses");
	let mut bytes = Vec::new();
	bytes.extend_from_slice(b"DATA");
	bytes.extend_from_slice(&3_u32.to_le_bytes());
	bytes.extend_from_slice(&0x1122_3344_5566_7788_u64.to_le_bytes());
	bytes.extend_from_slice(&16_i64.to_le_bytes());
	bytes.extend_from_slice(&2_i64.to_le_bytes());

	let mut cursor = Cursor::new(&bytes);
	let head = BHead::parse(&mut cursor, &header).expect("bhead parses");
	assert_eq!(head.sdna_nr, 3);
	assert_eq!(head.old, 0x1122_3344_5566_7788);
	assert_eq!(head.len, 16);
	assert_eq!(head.nr, 2);
}

#[test]
fn negative_length_is_rejected() {
	let header = BlendHeader::parse(b"BLENDER_v280").expect("header parses");
	let mut bytes = Vec::new();
	bytes.extend_from_slice(b"DATA");
	bytes.extend_from_slice(&(-4_i32).to_le_bytes());
	bytes.extend_from_slice(&[0_u8; 12]);

	let mut cursor = Cursor::new(&bytes);
	let err = BHead::parse(&mut cursor, &header).expect_err("negative length fails");
	assert!(matches!(err, BlendError::InvalidBlockLength { at: 0, len: -4, .. }));
}

#[test]
fn negative_count_reads_as_zero() {
	let header = BlendHeader::parse(b"BLENDER_v280").expect("header parses");
	let mut bytes = Vec::new();
	bytes.extend_from_slice(b"DATA");
	bytes.extend_from_slice(&0_i32.to_le_bytes());
	bytes.extend_from_slice(&0x10_u32.to_le_bytes());
	bytes.extend_from_slice(&0_u32.to_le_bytes());
	bytes.extend_from_slice(&(-1_i32).to_le_bytes());

	let mut cursor = Cursor::new(&bytes);
	let head = BHead::parse(&mut cursor, &header).expect("bhead parses");
	assert_eq!(head.nr, 0);
}

#[test]
fn big_endian_length_field_is_little_endian() {
	let header = BlendHeader::parse(b"BLENDER_V280").expect("header parses");
	let mut bytes = Vec::new();
	bytes.extend_from_slice(b"DATA");
	bytes.extend_from_slice(&0x0000_00A0_i32.to_le_bytes());
	bytes.extend_from_slice(&0x40_u32.to_be_bytes());
	bytes.extend_from_slice(&2_u32.to_be_bytes());
	bytes.extend_from_slice(&5_i32.to_be_bytes());

	let mut cursor = Cursor::new(&bytes);
	let head = BHead::parse(&mut cursor, &header).expect("bhead parses");
	assert_eq!(head.len, 0xA0);
	assert_eq!(head.old, 0x40);
	assert_eq!(head.sdna_nr, 2);
	assert_eq!(head.nr, 5);
}
