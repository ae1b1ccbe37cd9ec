use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use once_cell::sync::Lazy;

use crate::blend::{BlendHeader, Endianness, Result, Schema};

/// Cache key for a compiled schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaKey {
	/// Version label as written in the header (`"280"`, `"0500"`).
	pub version: Box<str>,
	/// Container format version.
	pub format_version: u16,
	/// Pointer width in bytes.
	pub pointer_size: usize,
	/// File byte order.
	pub endianness: Endianness,
}

impl SchemaKey {
	/// Build the key a file with `header` maps to.
	pub fn for_header(header: &BlendHeader) -> Self {
		Self {
			version: header.version_label().into(),
			format_version: header.format_version,
			pointer_size: header.pointer_size,
			endianness: header.endianness,
		}
	}
}

static GLOBAL: Lazy<SchemaRegistry> = Lazy::new(SchemaRegistry::new);

/// Append-only cache of compiled schemas shared across parses.
///
/// Reads take a shared lock. Compilation is serialized by a separate mutex so
/// two parses racing on a new version compile it once.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
	entries: RwLock<HashMap<SchemaKey, Arc<Schema>>>,
	compile_lock: Mutex<()>,
	compiles: AtomicUsize,
}

impl SchemaRegistry {
	/// Create an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Process-wide registry used by [`crate::blend::parse`].
	pub fn global() -> &'static SchemaRegistry {
		&GLOBAL
	}

	/// Return a cached schema.
	pub fn get(&self, key: &SchemaKey) -> Option<Arc<Schema>> {
		let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
		entries.get(key).cloned()
	}

	/// Return the cached schema for `key`, running `compile` if none exists yet.
	///
	/// A failed compile caches nothing.
	pub fn get_or_compile<F>(&self, key: SchemaKey, compile: F) -> Result<Arc<Schema>>
	where
		F: FnOnce() -> Result<Schema>,
	{
		if let Some(schema) = self.get(&key) {
			return Ok(schema);
		}

		let _guard = self.compile_lock.lock().unwrap_or_else(PoisonError::into_inner);
		if let Some(schema) = self.get(&key) {
			return Ok(schema);
		}

		let schema = Arc::new(compile()?);
		self.compiles.fetch_add(1, Ordering::Relaxed);
		let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
		entries.insert(key, Arc::clone(&schema));
		Ok(schema)
	}

	/// Number of schemas compiled by this registry.
	pub fn compile_count(&self) -> usize {
		self.compiles.load(Ordering::Relaxed)
	}

	/// Number of cached schemas.
	pub fn len(&self) -> usize {
		self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
	}

	/// Whether nothing is cached.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use super::{SchemaKey, SchemaRegistry};
	use crate::blend::{BlendError, BlendHeader, Endianness, Schema};

	fn key(label: &str) -> SchemaKey {
		SchemaKey::for_header(&BlendHeader::parse(label.as_bytes()).expect("header"))
	}

	#[test]
	fn compiles_once_per_key() {
		let registry = SchemaRegistry::new();
		let first = registry
			.get_or_compile(key("BLENDER_v280"), || Ok(Schema::new(4, Endianness::Little)))
			.expect("compiles");
		let second = registry
			.get_or_compile(key("BLENDER_v280"), || panic!("must not recompile"))
			.expect("cached");
		assert!(Arc::ptr_eq(&first, &second));
		assert_eq!(registry.compile_count(), 1);

		registry
			.get_or_compile(key("BLENDER_v300"), || Ok(Schema::new(4, Endianness::Little)))
			.expect("compiles");
		assert_eq!(registry.compile_count(), 2);
		assert_eq!(registry.len(), 2);
	}

	#[test]
	fn pointer_width_is_part_of_key() {
		assert_ne!(key("BLENDER_v280"), key("BLENDER-v280"));
		assert_ne!(key("BLENDER_v280"), key("BLENDER_V280"));
	}

	#[test]
	fn failed_compile_is_not_cached() {
		let registry = SchemaRegistry::new();
		let err = registry
			.get_or_compile(key("BLENDER_v280"), || Err(BlendError::SchemaNotFound { at: 12 }))
			.expect_err("compile fails");
		assert!(matches!(err, BlendError::SchemaNotFound { at: 12 }));
		assert!(registry.is_empty());
		assert_eq!(registry.compile_count(), 0);
	}

	#[test]
	fn concurrent_first_use_compiles_once() {
		let registry = Arc::new(SchemaRegistry::new());
		let handles: Vec<_> = (0..8)
			.map(|_| {
				let registry = Arc::clone(&registry);
				std::thread::spawn(move || {
					registry
						.get_or_compile(key("BLENDER_v293"), || Ok(Schema::new(4, Endianness::Little)))
						.expect("compiles")
				})
			})
			.collect();
		for handle in handles {
			handle.join().expect("thread joins");
		}
		assert_eq!(registry.compile_count(), 1);
	}
}
