/// Parsed shape of an SDNA field declarator such as `*next`, `mat[4][4]`, or `(*func)()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
	/// Bare identifier with pointer stars, parentheses, and dimensions removed.
	pub ident: Box<str>,
	/// Number of leading `*` markers, clamped to 2.
	pub ptr_depth: u8,
	/// Outer dimension (`N` in `[N]` or `[N][M]`), or `None` for scalars.
	pub outer: Option<u32>,
	/// Inner dimension (`M` in `[N][M]`), or `None` for 0/1-dimensional fields.
	pub inner: Option<u32>,
}

impl FieldDecl {
	/// Elements per row: `M` for 2-D fields, `N` for 1-D fields, `1` otherwise.
	pub fn array_len(&self) -> u32 {
		match (self.outer, self.inner) {
			(_, Some(inner)) => inner,
			(Some(outer), None) => outer,
			(None, None) => 1,
		}
	}

	/// Number of rows: `N` for 2-D fields, `1` otherwise.
	pub fn rows(&self) -> u32 {
		match (self.outer, self.inner) {
			(Some(outer), Some(_)) => outer,
			_ => 1,
		}
	}

	/// Total element count across all dimensions.
	pub fn element_count(&self) -> u64 {
		u64::from(self.array_len()) * u64::from(self.rows())
	}

	/// Whether the declarator carried any `[..]` dimension.
	pub fn has_dims(&self) -> bool {
		self.outer.is_some()
	}

	/// Number of bracketed dimensions.
	pub fn dims(&self) -> u8 {
		u8::from(self.outer.is_some()) + u8::from(self.inner.is_some())
	}
}

/// Parse one field declarator.
///
/// Unparseable declarators fall back to a bare scalar named by the raw text.
pub fn parse_field_decl(raw: &str) -> FieldDecl {
	let fallback = || FieldDecl {
		ident: raw.into(),
		ptr_depth: 0,
		outer: None,
		inner: None,
	};

	let mut rest = raw.trim();
	let mut ptr_depth = 0_u8;

	// Function pointers are stored as `(*name)()`.
	let paren = rest.starts_with('(');
	if paren {
		rest = &rest[1..];
	}
	while let Some(tail) = rest.strip_prefix('*') {
		ptr_depth = ptr_depth.saturating_add(1);
		rest = tail;
	}

	let ident_len = rest.find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_')).unwrap_or(rest.len());
	if ident_len == 0 {
		return fallback();
	}
	let ident = &rest[..ident_len];
	rest = &rest[ident_len..];

	if paren {
		let Some(tail) = rest.strip_prefix(')') else {
			return fallback();
		};
		rest = tail;
		if let Some(tail) = rest.strip_prefix('(') {
			let Some(close) = tail.find(')') else {
				return fallback();
			};
			rest = &tail[close + 1..];
		}
	}

	let mut dims = [None, None];
	let mut used = 0;
	while let Some(tail) = rest.strip_prefix('[') {
		let Some(close) = tail.find(']') else {
			return fallback();
		};
		if used == dims.len() {
			return fallback();
		}
		// An empty or symbolic dimension counts as one element.
		dims[used] = Some(tail[..close].trim().parse::<u32>().unwrap_or(1));
		used += 1;
		rest = &tail[close + 1..];
	}

	if !rest.trim().is_empty() {
		return fallback();
	}

	FieldDecl {
		ident: ident.into(),
		ptr_depth: ptr_depth.min(2),
		outer: dims[0],
		inner: dims[1],
	}
}

#[cfg(test)]
mod tests {
	use super::parse_field_decl;

	#[test]
	fn plain_scalar() {
		let decl = parse_field_decl("x");
		assert_eq!(&*decl.ident, "x");
		assert_eq!(decl.ptr_depth, 0);
		assert_eq!(decl.array_len(), 1);
		assert_eq!(decl.rows(), 1);
		assert!(!decl.has_dims());
	}

	#[test]
	fn pointer_depths() {
		assert_eq!(parse_field_decl("*next").ptr_depth, 1);
		let mat = parse_field_decl("**mat");
		assert_eq!(mat.ptr_depth, 2);
		assert_eq!(&*mat.ident, "mat");
		assert_eq!(parse_field_decl("***deep").ptr_depth, 2);
	}

	#[test]
	fn one_dimensional_array() {
		let decl = parse_field_decl("name[66]");
		assert_eq!(&*decl.ident, "name");
		assert_eq!(decl.array_len(), 66);
		assert_eq!(decl.rows(), 1);
		assert_eq!(decl.element_count(), 66);
	}

	#[test]
	fn two_dimensional_array_splits_rows() {
		let decl = parse_field_decl("obmat[4][3]");
		assert_eq!(decl.rows(), 4);
		assert_eq!(decl.array_len(), 3);
		assert_eq!(decl.element_count(), 12);
		assert_eq!(decl.dims(), 2);
	}

	#[test]
	fn pointer_array() {
		let decl = parse_field_decl("*mtex[18]");
		assert_eq!(decl.ptr_depth, 1);
		assert_eq!(decl.array_len(), 18);
	}

	#[test]
	fn function_pointer() {
		let decl = parse_field_decl("(*draw)()");
		assert_eq!(&*decl.ident, "draw");
		assert_eq!(decl.ptr_depth, 1);
		assert!(!decl.has_dims());
	}

	#[test]
	fn zero_sized_array_is_preserved() {
		let decl = parse_field_decl("weights[0]");
		assert_eq!(decl.array_len(), 0);
		assert_eq!(decl.element_count(), 0);
	}

	#[test]
	fn symbolic_dimension_counts_as_one() {
		assert_eq!(parse_field_decl("buf[MAX]").array_len(), 1);
	}

	#[test]
	fn garbage_falls_back_to_raw_scalar() {
		let decl = parse_field_decl("?? weird");
		assert_eq!(&*decl.ident, "?? weird");
		assert_eq!(decl.ptr_depth, 0);
		assert_eq!(decl.element_count(), 1);
	}
}
