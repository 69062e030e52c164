//! Lifecycle reset between test executions.
//!
//! Reset is an all-matching query: every override whose descriptor range contains the version
//! resets, not only the one a resolution would pick. A failing hook aborts the reset; partial
//! resets are never retried, and the owning environment is poisoned instead.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use umbra_shadow_map::{OverrideIndex, Version};

use crate::env::Environment;
use crate::error::ResetError;
use crate::shadow::OverrideCatalog;

/// Overrides whose reset hooks ran, in stable index order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetReport {
	pub version: Version,
	pub reset: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LifecycleResetter {
	index: OverrideIndex,
	catalog: Arc<OverrideCatalog>,
}

impl LifecycleResetter {
	pub fn new(index: OverrideIndex, catalog: Arc<OverrideCatalog>) -> Self {
		Self { index, catalog }
	}

	/// Runs the reset hook of every override active at `version`, once per override type.
	pub fn reset_all(&self, version: Version) -> Result<ResetReport, ResetError> {
		let mut seen = FxHashSet::default();
		let mut report = ResetReport {
			version,
			reset: Vec::new(),
		};

		for descriptor in self.index.applicable(version) {
			let name = descriptor.override_type.as_str();
			if !seen.insert(name) {
				continue;
			}
			let Some(hook) = self.catalog.get(name).and_then(|shadow| shadow.reset_hook()) else {
				continue;
			};

			if let Err(source) = hook() {
				tracing::error!(shadow = name, %version, error = %source, "override reset failed");
				return Err(ResetError {
					override_type: name.to_string(),
					version,
					source,
				});
			}
			report.reset.push(name.to_string());
		}

		tracing::debug!(%version, count = report.reset.len(), "overrides reset");
		Ok(report)
	}
}

/// Resets an environment when dropped, including during unwinding from a failed test.
///
/// ```ignore
/// let _guard = env.reset_guard();
/// // test body; overrides reset at scope exit even if it panics
/// ```
#[must_use = "the reset runs when the guard is dropped"]
pub struct ResetGuard<'a> {
	env: &'a Environment,
}

impl<'a> ResetGuard<'a> {
	pub(crate) fn new(env: &'a Environment) -> Self {
		Self { env }
	}
}

impl Drop for ResetGuard<'_> {
	fn drop(&mut self) {
		if let Err(error) = self.env.reset() {
			tracing::error!(%error, "reset at scope exit failed");
		}
	}
}
