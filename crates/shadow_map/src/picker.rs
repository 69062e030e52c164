//! Override pickers: per-original-type strategies for choosing among several applicable overrides.
//!
//! A picker must be a pure function of the [`PickContext`] it receives. The context carries the
//! candidate override names (sorted, so invocation order never leaks in), the current version
//! and the declared environment properties.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap as HashMap;

use crate::version::Version;

/// Declared environment state visible to pickers.
pub type EnvProperties = IndexMap<String, String>;

/// Inputs to one picker invocation.
#[derive(Debug, Clone, Copy)]
pub struct PickContext<'a> {
	/// Type at which the candidates were registered.
	pub original_type: &'a str,
	pub version: Version,
	/// Candidate override type names in sorted order.
	pub candidates: &'a [&'a str],
	pub properties: &'a EnvProperties,
}

impl PickContext<'_> {
	/// Convenience accessor for an environment property.
	pub fn property(&self, key: &str) -> Option<&str> {
		self.properties.get(key).map(String::as_str)
	}
}

pub trait OverridePicker: Send + Sync {
	/// Returns the chosen override type name, or `None` if no candidate fits.
	fn pick(&self, ctx: &PickContext<'_>) -> Option<String>;
}

impl<F> OverridePicker for F
where
	F: Fn(&PickContext<'_>) -> Option<String> + Send + Sync,
{
	fn pick(&self, ctx: &PickContext<'_>) -> Option<String> {
		self(ctx)
	}
}

/// Picker selecting the candidate named by an environment property.
///
/// `PropertyPicker::new("looper-mode", [("paused", "ShadowPausedLooper"), ("legacy", "ShadowLegacyLooper")])`
pub struct PropertyPicker {
	key: String,
	choices: IndexMap<String, String>,
	default: Option<String>,
}

impl PropertyPicker {
	pub fn new<K, V>(key: impl Into<String>, choices: impl IntoIterator<Item = (K, V)>) -> Self
	where
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			key: key.into(),
			choices: choices.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
			default: None,
		}
	}

	/// Override type used when the property is unset.
	pub fn with_default(mut self, override_type: impl Into<String>) -> Self {
		self.default = Some(override_type.into());
		self
	}
}

impl OverridePicker for PropertyPicker {
	fn pick(&self, ctx: &PickContext<'_>) -> Option<String> {
		match ctx.property(&self.key) {
			Some(value) => self.choices.get(value).cloned(),
			None => self.default.clone(),
		}
	}
}

/// Named pickers available to an environment.
#[derive(Clone, Default)]
pub struct PickerRegistry {
	pickers: HashMap<String, Arc<dyn OverridePicker>>,
}

impl PickerRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `picker` under `name`, returning the picker it replaced.
	pub fn register(&mut self, name: impl Into<String>, picker: impl OverridePicker + 'static) -> Option<Arc<dyn OverridePicker>> {
		self.pickers.insert(name.into(), Arc::new(picker))
	}

	pub fn with(mut self, name: impl Into<String>, picker: impl OverridePicker + 'static) -> Self {
		self.register(name, picker);
		self
	}

	pub fn get(&self, name: &str) -> Option<&Arc<dyn OverridePicker>> {
		self.pickers.get(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.pickers.contains_key(name)
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.pickers.keys().map(String::as_str)
	}
}

impl fmt::Debug for PickerRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut names: Vec<_> = self.names().collect();
		names.sort_unstable();
		f.debug_struct("PickerRegistry").field("pickers", &names).finish()
	}
}
