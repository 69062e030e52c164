//! Config directory loading.

use std::path::{Path, PathBuf};

use super::{ConfigWarning, OverrideConfig};

/// Base configuration file inside a config directory.
pub const CONFIG_FILE: &str = "umbra.toml";
/// Directory of additional layers, applied in lexical file-name order.
pub const OVERRIDES_DIR: &str = "overrides.d";

/// Aggregate result of loading configuration layers.
#[derive(Debug, Default)]
pub struct ConfigLoadReport {
	/// Merged config if any layer was loaded successfully.
	pub config: Option<OverrideConfig>,
	/// Non-fatal warnings keyed by source file path.
	pub warnings: Vec<(PathBuf, ConfigWarning)>,
	/// File read or parse errors keyed by source file path.
	pub errors: Vec<(PathBuf, String)>,
}

/// Loads `umbra.toml` and then every `overrides.d/*.toml`, merging them in that order.
///
/// A layer that fails to read or parse is reported in `errors` and skipped; the remaining layers
/// still merge.
pub fn load_config_from_dir(config_dir: &Path) -> ConfigLoadReport {
	let mut report = ConfigLoadReport::default();
	let mut merged = OverrideConfig::default();
	let mut found_any = false;

	load_layer(&mut report, &mut merged, &mut found_any, &config_dir.join(CONFIG_FILE));

	let layer_dir = config_dir.join(OVERRIDES_DIR);
	if layer_dir.is_dir() {
		match std::fs::read_dir(&layer_dir) {
			Ok(entries) => {
				let mut paths: Vec<PathBuf> = entries
					.filter_map(|e| e.ok().map(|e| e.path()))
					.filter(|p| p.extension().is_some_and(|ext| ext == "toml"))
					.collect();
				paths.sort();
				for path in paths {
					load_layer(&mut report, &mut merged, &mut found_any, &path);
				}
			}
			Err(error) => report.errors.push((layer_dir, error.to_string())),
		}
	}

	if found_any {
		report.config = Some(merged);
	}

	report
}

fn load_layer(report: &mut ConfigLoadReport, merged: &mut OverrideConfig, found_any: &mut bool, path: &Path) {
	if !path.exists() {
		return;
	}

	let content = match std::fs::read_to_string(path) {
		Ok(content) => content,
		Err(error) => {
			report.errors.push((path.to_path_buf(), error.to_string()));
			return;
		}
	};

	match super::parse_config_str(&content) {
		Ok(mut config) => {
			for warning in config.warnings.drain(..) {
				tracing::warn!(path = %path.display(), %warning, "override config warning");
				report.warnings.push((path.to_path_buf(), warning));
			}
			merged.merge(config);
			*found_any = true;
		}
		Err(error) => {
			tracing::warn!(path = %path.display(), %error, "override config layer failed to parse");
			report.errors.push((path.to_path_buf(), error.to_string()));
		}
	}
}

#[cfg(test)]
mod tests {
	use std::path::Path;

	use super::*;
	use crate::version::Version;

	fn write_file(path: &Path, content: &str) {
		std::fs::write(path, content).expect("file should be writable");
	}

	#[test]
	fn load_ignores_missing_files() {
		let dir = tempfile::tempdir().expect("temp dir should be creatable");
		let report = load_config_from_dir(dir.path());
		assert!(report.config.is_none());
		assert!(report.warnings.is_empty());
		assert!(report.errors.is_empty());
	}

	#[test]
	fn layers_merge_in_lexical_order() {
		let dir = tempfile::tempdir().expect("temp dir should be creatable");
		write_file(&dir.path().join(CONFIG_FILE), "[environment]\nversion = 28\n[[override]]\ntype = \"ShadowA\"\noriginal = \"x.A\"\n");
		std::fs::create_dir(dir.path().join(OVERRIDES_DIR)).unwrap();
		write_file(&dir.path().join(OVERRIDES_DIR).join("20-late.toml"), "[environment]\nversion = 34\n");
		write_file(&dir.path().join(OVERRIDES_DIR).join("10-early.toml"), "[environment]\nversion = 31\n[[override]]\ntype = \"ShadowB\"\noriginal = \"x.B\"\n");
		write_file(&dir.path().join(OVERRIDES_DIR).join("notes.txt"), "not a layer");

		let report = load_config_from_dir(dir.path());
		let config = report.config.expect("layers should load");
		assert_eq!(config.environment.version, Some(Version(34)));
		let names: Vec<_> = config.overrides.iter().map(|o| o.override_type.as_str()).collect();
		assert_eq!(names, ["ShadowA", "ShadowB"]);
		assert!(report.errors.is_empty());
	}

	#[test]
	fn load_collects_diagnostics_per_file() {
		let dir = tempfile::tempdir().expect("temp dir should be creatable");
		write_file(&dir.path().join(CONFIG_FILE), "[[override]]\ntype = \"ShadowA\"\noriginal = \"x.A\"\nmin-version = 9\nmax-version = 1\n");
		std::fs::create_dir(dir.path().join(OVERRIDES_DIR)).unwrap();
		write_file(&dir.path().join(OVERRIDES_DIR).join("broken.toml"), "[[override]\n");
		write_file(&dir.path().join(OVERRIDES_DIR).join("ok.toml"), "[[override]]\ntype = \"ShadowB\"\noriginal = \"x.B\"\n");

		let report = load_config_from_dir(dir.path());
		let config = report.config.expect("valid layers should still merge");
		assert_eq!(config.overrides.len(), 1);
		assert!(report.errors.iter().any(|(path, _)| path.ends_with("broken.toml")));
		assert!(report.warnings.iter().any(|(path, _)| path.ends_with(CONFIG_FILE)));
	}
}
