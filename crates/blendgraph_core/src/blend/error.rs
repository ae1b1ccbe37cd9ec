use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, BlendError>;

/// Errors produced while parsing `.blend` bytes into a record graph.
///
/// Every parse error is fatal: no partial graph is returned.
#[derive(Debug, Error)]
pub enum BlendError {
	/// Filesystem read failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// The first seven bytes are not `BLENDER`.
	#[error("not a .blend file (magic={magic:?})")]
	InvalidMagic {
		/// Up-to-7 leading bytes, zero padded.
		magic: [u8; 7],
	},
	/// Header markers after the signature are malformed.
	#[error("invalid header at offset {at}: {reason}")]
	InvalidHeader {
		/// Offset of the offending header byte.
		at: usize,
		/// Which marker failed.
		reason: &'static str,
	},
	/// The block walk ended without a `DNA1` block.
	#[error("DNA1 block not found (walk ended at offset {at})")]
	SchemaNotFound {
		/// Offset where the walk stopped.
		at: usize,
	},
	/// An SDNA sub-section marker was not found inside the lookahead window.
	#[error("SDNA marker {expected} not found within {window} bytes of offset {at}")]
	SchemaAlignment {
		/// Marker that was expected (`SDNA`, `NAME`, `TYPE`, `TLEN`, `STRC`).
		expected: &'static str,
		/// Offset where the search began.
		at: usize,
		/// Maximum number of bytes skipped while searching.
		window: usize,
	},
	/// An SDNA table would read past the `DNA1` payload.
	#[error("SDNA truncated at offset {at}: need {need} bytes, remaining {rem}")]
	SchemaTruncated {
		/// Offset of the failed read.
		at: usize,
		/// Requested bytes.
		need: usize,
		/// Bytes left in the payload.
		rem: usize,
	},
	/// A struct definition references a name or type index outside its table.
	#[error("SDNA index out of range for {kind} at offset {at}: idx={idx}, max={max}")]
	SchemaIndexOutOfRange {
		/// Logical index kind being validated.
		kind: &'static str,
		/// Offending index value.
		idx: u32,
		/// Maximum valid index.
		max: u32,
		/// Offset of the struct definition.
		at: usize,
	},
	/// A block header or body would read past the end of the buffer.
	#[error("truncated block at offset {at}: need {need} bytes, remaining {rem}")]
	TruncatedBlock {
		/// Offset where the read was attempted.
		at: usize,
		/// Requested bytes.
		need: usize,
		/// Bytes still available.
		rem: usize,
	},
	/// A block declares a length that cannot be valid.
	#[error("invalid block length {len} at offset {at}: {reason}")]
	InvalidBlockLength {
		/// Block header offset.
		at: usize,
		/// Declared length.
		len: i64,
		/// Which check failed.
		reason: &'static str,
	},
	/// A codec write would land outside the target buffer.
	#[error("field write out of range at offset {at}: need {need} bytes, buffer {len}")]
	FieldOutOfRange {
		/// Write offset.
		at: usize,
		/// Bytes required.
		need: usize,
		/// Target buffer length.
		len: usize,
	},
	/// No compiled layout has the requested struct name.
	#[error("struct layout not found: {name}")]
	StructNotFound {
		/// Requested struct name.
		name: String,
	},
	/// A struct type has fewer indexed instances than requested.
	#[error("no {type_name} instance at index {index} ({count} indexed)")]
	RecordNotFound {
		/// Requested struct name.
		type_name: String,
		/// Requested instance index.
		index: usize,
		/// Number of indexed instances of the type.
		count: usize,
	},
}

/// Fieldless discriminant of [`BlendError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	/// See [`BlendError::Io`].
	Io,
	/// See [`BlendError::InvalidMagic`].
	InvalidMagic,
	/// See [`BlendError::InvalidHeader`].
	InvalidHeader,
	/// See [`BlendError::SchemaNotFound`].
	SchemaNotFound,
	/// See [`BlendError::SchemaAlignment`].
	SchemaAlignment,
	/// See [`BlendError::SchemaTruncated`].
	SchemaTruncated,
	/// See [`BlendError::SchemaIndexOutOfRange`].
	SchemaIndexOutOfRange,
	/// See [`BlendError::TruncatedBlock`].
	TruncatedBlock,
	/// See [`BlendError::InvalidBlockLength`].
	InvalidBlockLength,
	/// See [`BlendError::FieldOutOfRange`].
	FieldOutOfRange,
	/// See [`BlendError::StructNotFound`].
	StructNotFound,
	/// See [`BlendError::RecordNotFound`].
	RecordNotFound,
}

impl BlendError {
	/// Return the error discriminant.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Io(_) => ErrorKind::Io,
			Self::InvalidMagic { .. } => ErrorKind::InvalidMagic,
			Self::InvalidHeader { .. } => ErrorKind::InvalidHeader,
			Self::SchemaNotFound { .. } => ErrorKind::SchemaNotFound,
			Self::SchemaAlignment { .. } => ErrorKind::SchemaAlignment,
			Self::SchemaTruncated { .. } => ErrorKind::SchemaTruncated,
			Self::SchemaIndexOutOfRange { .. } => ErrorKind::SchemaIndexOutOfRange,
			Self::TruncatedBlock { .. } => ErrorKind::TruncatedBlock,
			Self::InvalidBlockLength { .. } => ErrorKind::InvalidBlockLength,
			Self::FieldOutOfRange { .. } => ErrorKind::FieldOutOfRange,
			Self::StructNotFound { .. } => ErrorKind::StructNotFound,
			Self::RecordNotFound { .. } => ErrorKind::RecordNotFound,
		}
	}

	/// Return the byte offset at which the error was detected, when known.
	pub fn offset(&self) -> Option<usize> {
		match self {
			Self::Io(_) | Self::StructNotFound { .. } | Self::RecordNotFound { .. } => None,
			Self::InvalidMagic { .. } => Some(0),
			Self::InvalidHeader { at, .. }
			| Self::SchemaNotFound { at }
			| Self::SchemaAlignment { at, .. }
			| Self::SchemaTruncated { at, .. }
			| Self::SchemaIndexOutOfRange { at, .. }
			| Self::TruncatedBlock { at, .. }
			| Self::InvalidBlockLength { at, .. }
			| Self::FieldOutOfRange { at, .. } => Some(*at),
		}
	}
}
