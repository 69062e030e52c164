use std::sync::Arc;

use rustc_hash::FxHashMap as HashMap;

use super::collision::{Collision, DuplicatePolicy, Resolution};
use super::OverrideIndex;
use crate::{IndexError, OverrideDescriptor};

/// Builder for constructing an [`OverrideIndex`].
#[derive(Debug, Default)]
pub struct OverrideIndexBuilder {
	defs: Vec<OverrideDescriptor>,
	policy: DuplicatePolicy,
}

impl OverrideIndexBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the number of descriptors registered so far.
	pub fn len(&self) -> usize {
		self.defs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.defs.is_empty()
	}

	/// Sets the duplicate registration policy.
	pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
		self.policy = policy;
		self
	}

	pub fn push(&mut self, def: OverrideDescriptor) {
		self.defs.push(def);
	}

	pub fn extend<I: IntoIterator<Item = OverrideDescriptor>>(&mut self, defs: I) {
		self.defs.extend(defs);
	}

	/// Builds the index.
	///
	/// Descriptors are deduplicated on `(original_type, override_type)` according to the
	/// duplicate policy, then stored sorted by original type and override type so iteration
	/// order never depends on registration order.
	pub fn build(self) -> Result<OverrideIndex, IndexError> {
		let mut table: Vec<OverrideDescriptor> = Vec::with_capacity(self.defs.len());
		let mut slots: HashMap<(String, String), usize> = HashMap::default();
		let mut collisions = Vec::new();

		for def in self.defs {
			if !def.range.is_valid() {
				return Err(IndexError::InvalidRange {
					override_type: def.override_type,
					original_type: def.original_type,
					range: def.range.to_string(),
				});
			}

			let key = (def.original_type.clone(), def.override_type.clone());
			let Some(&slot) = slots.get(&key) else {
				slots.insert(key, table.len());
				table.push(def);
				continue;
			};

			let resolution = match self.policy {
				DuplicatePolicy::Reject => {
					return Err(IndexError::Duplicate {
						override_type: def.override_type,
						original_type: def.original_type,
					});
				}
				DuplicatePolicy::FirstWins => Resolution::KeptExisting,
				DuplicatePolicy::LastWins => Resolution::ReplacedExisting,
			};

			tracing::warn!(
				original = %def.original_type,
				override_type = %def.override_type,
				?resolution,
				"duplicate override registration"
			);
			collisions.push(Collision {
				original_type: def.original_type.clone(),
				override_type: def.override_type.clone(),
				policy: self.policy,
				resolution,
			});
			if resolution == Resolution::ReplacedExisting {
				table[slot] = def;
			}
		}

		table.sort_by(|a, b| {
			a.original_type
				.cmp(&b.original_type)
				.then_with(|| a.override_type.cmp(&b.override_type))
		});

		let mut by_original: HashMap<String, Vec<u32>> = HashMap::default();
		let mut by_override: HashMap<String, Vec<u32>> = HashMap::default();
		for (idx, def) in table.iter().enumerate() {
			by_original.entry(def.original_type.clone()).or_default().push(idx as u32);
			by_override.entry(def.override_type.clone()).or_default().push(idx as u32);
		}

		Ok(OverrideIndex {
			table: table.into_iter().map(Arc::new).collect(),
			by_original: Arc::new(by_original),
			by_override: Arc::new(by_override),
			collisions: Arc::from(collisions),
		})
	}
}
