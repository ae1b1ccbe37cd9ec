use crate::blend::bytes::{Cursor, Region};
use crate::blend::{BHead, BlendError, BlendHeader, Result};

/// Maximum number of zero padding bytes tolerated before a block header.
pub const MAX_BLOCK_PADDING: usize = 8;

/// Borrowed view over one parsed blend block.
#[derive(Debug, Clone, Copy)]
pub struct Block<'a> {
	/// Parsed block header.
	pub head: BHead,
	/// Raw payload bytes.
	pub payload: &'a [u8],
	/// Absolute byte offset where this block header starts.
	pub file_offset: usize,
	/// Absolute byte offset where the payload starts.
	pub data_offset: usize,
}

impl Block<'_> {
	/// Absolute byte offset one past the payload.
	pub fn data_end(&self) -> usize {
		self.data_offset + self.payload.len()
	}
}

/// Iterator over contiguous block records, ending after `ENDB`.
///
/// Running out of bytes before `ENDB` is an error, not a clean stop.
pub struct BlockIter<'a> {
	cursor: Cursor<'a>,
	header: BlendHeader,
	done: bool,
}

impl<'a> BlockIter<'a> {
	/// Create a block iterator starting at absolute `offset`.
	pub fn new(bytes: &'a [u8], offset: usize, header: BlendHeader) -> Self {
		Self {
			cursor: Cursor::bounded(bytes, offset, bytes.len(), Region::Blocks),
			header,
			done: false,
		}
	}

	fn read_block(&mut self) -> Result<Block<'a>> {
		self.cursor.skip_zero_padding(MAX_BLOCK_PADDING);

		let file_offset = self.cursor.pos();
		let head_size = self.header.bhead_size();
		let rem = self.cursor.remaining();
		if rem < head_size {
			return Err(BlendError::TruncatedBlock {
				at: file_offset,
				need: head_size,
				rem,
			});
		}

		let head = BHead::parse(&mut self.cursor, &self.header)?;
		let payload_len = usize::try_from(head.len).map_err(|_| BlendError::InvalidBlockLength {
			at: file_offset,
			len: head.len as i64,
			reason: "length does not fit in memory",
		})?;

		let data_offset = self.cursor.pos();
		let rem = self.cursor.remaining();
		if payload_len > rem {
			return Err(BlendError::TruncatedBlock {
				at: data_offset,
				need: payload_len,
				rem,
			});
		}

		let payload = self.cursor.read_exact(payload_len)?;
		Ok(Block {
			head,
			payload,
			file_offset,
			data_offset,
		})
	}
}

impl<'a> Iterator for BlockIter<'a> {
	type Item = Result<Block<'a>>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.done {
			return None;
		}

		match self.read_block() {
			Ok(block) => {
				if block.head.is_endb() {
					self.done = true;
				}
				Some(Ok(block))
			}
			Err(err) => {
				self.done = true;
				Some(Err(err))
			}
		}
	}
}
