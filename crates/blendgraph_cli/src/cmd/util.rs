use std::path::Path;

use blendgraph::blend::{BlendGraph, Result};
use tracing::debug;

/// Read and parse a file with default options.
pub(crate) fn open_graph(path: &Path) -> Result<BlendGraph> {
	debug!(path = %path.display(), "opening blend file");
	BlendGraph::open(path)
}

/// Print a serializable payload as pretty JSON on stdout.
pub(crate) fn emit_json<T: serde::Serialize>(payload: &T) {
	match serde_json::to_string_pretty(payload) {
		Ok(text) => println!("{text}"),
		Err(err) => eprintln!("error: json encode failed: {err}"),
	}
}

/// Render an old address as fixed-width hex.
pub(crate) fn ptr_hex(address: u64) -> String {
	format!("0x{address:016x}")
}

/// Render block code bytes as a printable label.
pub(crate) fn code_label(code: [u8; 4]) -> String {
	let mut out = String::new();
	for byte in code {
		if byte == 0 {
			continue;
		}
		if byte.is_ascii_graphic() || byte == b' ' {
			out.push(char::from(byte));
		} else {
			out.push('.');
		}
	}
	if out.is_empty() { "....".to_owned() } else { out }
}

#[cfg(test)]
mod tests {
	use super::{code_label, ptr_hex};

	#[test]
	fn code_labels_drop_nul_and_mask_binary() {
		assert_eq!(code_label(*b"DNA1"), "DNA1");
		assert_eq!(code_label([b'O', b'B', 0, 0]), "OB");
		assert_eq!(code_label([0x01, b'X', 0, 0]), ".X");
		assert_eq!(code_label([0; 4]), "....");
	}

	#[test]
	fn pointers_render_as_padded_hex() {
		assert_eq!(ptr_hex(0x1000), "0x0000000000001000");
	}
}
