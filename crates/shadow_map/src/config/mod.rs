//! Declarative override configuration.
//!
//! ```toml
//! [environment]
//! version = 30
//! [environment.properties]
//! looper-mode = "paused"
//!
//! [[override]]
//! type = "ShadowLooper"
//! original = "android.os.Looper"
//! min-version = 21
//! picker = "LooperPicker"
//! ```
//!
//! Entries that parse but cannot be registered (inverted range, blank names) are dropped and
//! reported as [`ConfigWarning`]s; syntax errors fail the whole layer.

mod load;

use std::fmt;

use indexmap::IndexMap;
use serde::Deserialize;

pub use load::{CONFIG_FILE, ConfigLoadReport, OVERRIDES_DIR, load_config_from_dir};

use crate::version::{Version, VersionRange};
use crate::OverrideDescriptor;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("toml: {0}")]
	Toml(#[from] toml::de::Error),
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
}

/// Non-fatal problems found while reading a configuration layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
	InvalidRange { override_type: String, original: String, range: String },
	BlankName { position: usize },
}

impl fmt::Display for ConfigWarning {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::InvalidRange { override_type, original, range } => {
				write!(f, "override {override_type} for {original} has inverted range {range}; entry dropped")
			}
			Self::BlankName { position } => write!(f, "override entry #{position} has a blank type name; entry dropped"),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct EnvironmentSection {
	pub version: Option<Version>,
	#[serde(default)]
	pub properties: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct OverrideEntry {
	#[serde(rename = "type")]
	pub override_type: String,
	pub original: String,
	pub min_version: Option<u32>,
	pub max_version: Option<u32>,
	pub picker: Option<String>,
	#[serde(default)]
	pub loose_signatures: bool,
	#[serde(default = "default_call_through")]
	pub call_through: bool,
}

fn default_call_through() -> bool {
	true
}

impl OverrideEntry {
	pub fn range(&self) -> VersionRange {
		VersionRange::new(self.min_version.map(Version), self.max_version.map(Version))
	}

	pub fn to_descriptor(&self) -> OverrideDescriptor {
		OverrideDescriptor {
			override_type: self.override_type.clone(),
			original_type: self.original.clone(),
			range: self.range(),
			picker: self.picker.clone(),
			loose_signatures: self.loose_signatures,
			call_through: self.call_through,
		}
	}
}

/// One or more merged configuration layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct OverrideConfig {
	#[serde(default)]
	pub environment: EnvironmentSection,
	#[serde(default, rename = "override")]
	pub overrides: Vec<OverrideEntry>,
	#[serde(skip)]
	pub warnings: Vec<ConfigWarning>,
}

impl OverrideConfig {
	/// Merges a later layer into this one: version and properties override, overrides append.
	pub fn merge(&mut self, other: OverrideConfig) {
		if other.environment.version.is_some() {
			self.environment.version = other.environment.version;
		}
		self.environment.properties.extend(other.environment.properties);
		self.overrides.extend(other.overrides);
		self.warnings.extend(other.warnings);
	}

	pub fn descriptors(&self) -> Vec<OverrideDescriptor> {
		self.overrides.iter().map(OverrideEntry::to_descriptor).collect()
	}
}

/// Parses one configuration layer.
pub fn parse_config_str(content: &str) -> Result<OverrideConfig> {
	let mut config: OverrideConfig = toml::from_str(content)?;

	let mut kept = Vec::with_capacity(config.overrides.len());
	for (position, entry) in std::mem::take(&mut config.overrides).into_iter().enumerate() {
		if entry.override_type.trim().is_empty() || entry.original.trim().is_empty() {
			config.warnings.push(ConfigWarning::BlankName { position });
			continue;
		}
		let range = entry.range();
		if !range.is_valid() {
			config.warnings.push(ConfigWarning::InvalidRange {
				override_type: entry.override_type,
				original: entry.original,
				range: range.to_string(),
			});
			continue;
		}
		kept.push(entry);
	}
	config.overrides = kept;

	Ok(config)
}
