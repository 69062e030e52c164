//! The override index (shadow map).
//!
//! # Mental Model
//!
//! 1. **Build Phase:** [`OverrideIndexBuilder`] ingests descriptors from declarative
//!    configuration, deduplicates them and produces an immutable [`OverrideIndex`].
//! 2. **Resolution:** [`OverrideIndex::resolve`] answers "which override shadows this type at
//!    this version" with a most-specific-wins walk up the type hierarchy.
//! 3. **Enumeration:** [`OverrideIndex::applicable`] answers "which overrides are active at this
//!    version" for all-matching consumers such as lifecycle reset.
//!
//! # Precedence Contract
//!
//! - The first ancestor level (most-derived first) with any version-applicable candidate decides.
//!   Ancestor overrides are never merged with a subtype's.
//! - One candidate at that level wins outright.
//! - Several candidates require a picker; a picker that declines or names a non-candidate is a
//!   fatal [`crate::ResolveError::Ambiguous`]. Registration order never breaks ties.
//!
//! # Invariants
//!
//! - Read-only after build; cloning shares the tables.
//! - Iteration order is sorted by original type, then override type.

mod build;
mod collision;
mod resolve;

use std::sync::Arc;

use rustc_hash::FxHashMap as HashMap;

pub use build::OverrideIndexBuilder;
pub use collision::{Collision, DuplicatePolicy, Resolution};
pub use resolve::{ResolveEnv, Resolved};

use crate::OverrideDescriptor;
use crate::version::Version;

/// Immutable registry of override descriptors keyed by original type.
///
/// [`OverrideIndex::empty`] is a valid sentinel meaning "no overrides".
#[derive(Debug, Clone, Default)]
pub struct OverrideIndex {
	pub(crate) table: Arc<[Arc<OverrideDescriptor>]>,
	pub(crate) by_original: Arc<HashMap<String, Vec<u32>>>,
	pub(crate) by_override: Arc<HashMap<String, Vec<u32>>>,
	pub(crate) collisions: Arc<[Collision]>,
}

impl OverrideIndex {
	pub fn empty() -> Self {
		Self::default()
	}

	pub fn builder() -> OverrideIndexBuilder {
		OverrideIndexBuilder::new()
	}

	/// Builds an index from descriptors using the default duplicate policy.
	pub fn from_descriptors(defs: impl IntoIterator<Item = OverrideDescriptor>) -> Result<Self, crate::IndexError> {
		let mut builder = OverrideIndexBuilder::new();
		builder.extend(defs);
		builder.build()
	}

	pub fn len(&self) -> usize {
		self.table.len()
	}

	pub fn is_empty(&self) -> bool {
		self.table.is_empty()
	}

	/// All descriptors in stable order.
	pub fn iter(&self) -> impl Iterator<Item = &Arc<OverrideDescriptor>> {
		self.table.iter()
	}

	/// Descriptors registered directly for `original` (no hierarchy walk).
	pub fn for_original<'a>(&'a self, original: &str) -> impl Iterator<Item = &'a Arc<OverrideDescriptor>> + use<'a> {
		self.slots(&self.by_original, original)
	}

	/// Descriptors registering `override_type`, for any original type.
	pub fn for_override<'a>(&'a self, override_type: &str) -> impl Iterator<Item = &'a Arc<OverrideDescriptor>> + use<'a> {
		self.slots(&self.by_override, override_type)
	}

	/// Every descriptor whose range contains `version`, in stable order.
	pub fn applicable(&self, version: Version) -> impl Iterator<Item = &Arc<OverrideDescriptor>> {
		self.table.iter().filter(move |d| d.supports(version))
	}

	/// Returns true if `override_type` is registered for `original` with a range containing `version`.
	pub fn shadows(&self, override_type: &str, original: &str, version: Version) -> bool {
		self.for_override(override_type)
			.any(|d| d.original_type == original && d.supports(version))
	}

	/// Duplicate registrations recorded at build time.
	pub fn collisions(&self) -> &[Collision] {
		&self.collisions
	}

	fn slots<'a>(&'a self, map: &'a HashMap<String, Vec<u32>>, key: &str) -> impl Iterator<Item = &'a Arc<OverrideDescriptor>> + use<'a> {
		map.get(key)
			.map_or(&[][..], Vec::as_slice)
			.iter()
			.map(move |&idx| &self.table[idx as usize])
	}
}
