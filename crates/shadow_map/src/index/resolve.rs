//! Most-specific-wins override resolution.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::OverrideIndex;
use crate::hierarchy::{TypeHierarchy, ancestors};
use crate::picker::{EnvProperties, PickContext, PickerRegistry};
use crate::version::Version;
use crate::{AmbiguityReason, OverrideDescriptor, ResolveError};

/// Environment collaborators consulted during resolution.
#[derive(Clone, Copy)]
pub struct ResolveEnv<'a> {
	pub hierarchy: &'a dyn TypeHierarchy,
	pub pickers: &'a PickerRegistry,
	pub properties: &'a EnvProperties,
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
	pub descriptor: Arc<OverrideDescriptor>,
	/// Type in the ancestor chain at which the winning descriptor was registered.
	pub level: String,
	/// Picker that chose the descriptor, when more than one applied.
	pub picked_by: Option<String>,
}

impl OverrideIndex {
	/// Resolves the override shadowing `original` at `version`.
	///
	/// Returns `Ok(None)` when neither the type nor any ancestor is shadowed at this version.
	pub fn resolve(&self, original: &str, version: Version, env: &ResolveEnv<'_>) -> Result<Option<Resolved>, ResolveError> {
		for level in ancestors(env.hierarchy, original) {
			let candidates: Vec<&Arc<OverrideDescriptor>> = self.for_original(level).filter(|d| d.supports(version)).collect();

			match candidates.as_slice() {
				[] => {
					tracing::trace!(original, level, %version, "no applicable override at level");
				}
				[only] => {
					return Ok(Some(Resolved {
						descriptor: Arc::clone(only),
						level: level.to_string(),
						picked_by: None,
					}));
				}
				_ => return pick(original, level, version, &candidates, env).map(Some),
			}
		}
		Ok(None)
	}
}

fn pick(original: &str, level: &str, version: Version, candidates: &[&Arc<OverrideDescriptor>], env: &ResolveEnv<'_>) -> Result<Resolved, ResolveError> {
	let mut names: Vec<&str> = candidates.iter().map(|d| d.override_type.as_str()).collect();
	names.sort_unstable();

	let ambiguous = |reason: AmbiguityReason| ResolveError::Ambiguous {
		original: original.to_string(),
		level: level.to_string(),
		version,
		candidates: names.iter().map(|n| n.to_string()).collect(),
		reason,
	};

	let declared: BTreeSet<&str> = candidates.iter().filter_map(|d| d.picker.as_deref()).collect();
	let mut declared_iter = declared.iter();
	let picker_name = match (declared_iter.next(), declared_iter.next()) {
		(None, _) => return Err(ambiguous(AmbiguityReason::NoPicker)),
		(Some(&name), None) => name,
		_ => {
			return Err(ambiguous(AmbiguityReason::ConflictingPickers(
				declared.iter().map(|n| n.to_string()).collect(),
			)));
		}
	};

	let Some(picker) = env.pickers.get(picker_name) else {
		return Err(ambiguous(AmbiguityReason::UnknownPicker(picker_name.to_string())));
	};

	let ctx = PickContext {
		original_type: level,
		version,
		candidates: &names,
		properties: env.properties,
	};
	let Some(picked) = picker.pick(&ctx) else {
		return Err(ambiguous(AmbiguityReason::PickerDeclined(picker_name.to_string())));
	};

	let Some(winner) = candidates.iter().find(|d| d.override_type == picked) else {
		return Err(ambiguous(AmbiguityReason::PickedOutsideCandidates {
			picker: picker_name.to_string(),
			picked,
		}));
	};

	tracing::debug!(original, level, %version, picker = picker_name, picked = %winner.override_type, "override picked");
	Ok(Resolved {
		descriptor: Arc::clone(winner),
		level: level.to_string(),
		picked_by: Some(picker_name.to_string()),
	})
}
