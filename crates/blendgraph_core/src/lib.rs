//! SDNA-driven parser for Blender `.blend` files.
//!
//! The schema embedded in every file is compiled into struct layouts, then the
//! block stream is walked once to bind typed records and an old-address table
//! that resolves pointers between them.

/// Header, SDNA, layout, record, and pointer resolution.
pub mod blend;
