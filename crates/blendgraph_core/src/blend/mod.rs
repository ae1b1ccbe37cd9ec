mod bhead;
mod block;
mod bytes;
mod codec;
mod decl;
mod dna;
mod error;
mod graph;
mod header;
mod layout;
mod pointer;
mod record;
mod registry;
mod scan;
mod value;

/// Parsed block header record.
pub use bhead::BHead;
/// Block container and iterator types.
pub use block::{Block, BlockIter, MAX_BLOCK_PADDING};
/// Primitive field codec.
pub use codec::{Decoded, Primitive, Scalar, ScalarArray, decode_text, read_primitive, write_scalar, write_text};
/// SDNA field declarator parser.
pub use decl::{FieldDecl, parse_field_decl};
/// Raw SDNA schema tables.
pub use dna::{Dna, DnaField, DnaStruct, MARKER_WINDOW, RawField};
/// Error and result aliases.
pub use error::{BlendError, ErrorKind, Result};
/// Parse result and its queries.
pub use graph::{BlendGraph, BlockStats, Thumbnail};
/// File header representation.
pub use header::{BLEND_MAGIC, BlendHeader, Endianness};
/// Compiled struct layouts.
pub use layout::{FieldDescriptor, FieldKind, LayoutId, Schema, StructLayout};
/// Address table and pointer decoding.
pub use pointer::{AddressEntry, AddressTable, decode_pointer};
/// Bound struct records.
pub use record::{Record, RecordId, StructRecord};
/// Process-wide compiled schema cache.
pub use registry::{SchemaKey, SchemaRegistry};
/// Parse entry points and options.
pub use scan::{ParseOptions, parse, parse_with};
/// Field values produced by record reads.
pub use value::{FieldValue, RecordRef};
