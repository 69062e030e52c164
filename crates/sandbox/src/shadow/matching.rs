//! Matching override operations against operation identities.

use umbra_shadow_map::{TypeHierarchy, ancestors};

use crate::value::{OBJECT, is_primitive};

/// How strictly override operation parameters must agree with an identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchMode {
	/// Parameter type names must be identical.
	#[default]
	Exact,
	/// Each declared parameter may be identical, a supertype of the identity's parameter, or
	/// `java.lang.Object` standing in for any reference type. Arity must still agree.
	Loose,
}

impl MatchMode {
	pub fn from_loose_flag(loose: bool) -> Self {
		if loose { Self::Loose } else { Self::Exact }
	}
}

/// Distance charged for a `java.lang.Object` parameter, above any real supertype step.
const OBJECT_DISTANCE: u32 = 1 << 16;

/// Quality of a successful match. `Exact` sorts before any `Loose`, and a loose match with a
/// smaller distance (summed supertype steps per parameter) sorts before a larger one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchQuality {
	Exact,
	Loose(u32),
}

/// Compares declared override parameters against an identity's parameters.
pub fn match_params(declared: &[String], wanted: &[String], mode: MatchMode, hierarchy: &dyn TypeHierarchy) -> Option<MatchQuality> {
	if declared == wanted {
		return Some(MatchQuality::Exact);
	}
	if mode == MatchMode::Exact || declared.len() != wanted.len() {
		return None;
	}
	declared
		.iter()
		.zip(wanted)
		.try_fold(0u32, |total, (d, w)| param_distance(d, w, hierarchy).map(|step| total.saturating_add(step)))
		.map(MatchQuality::Loose)
}

fn param_distance(declared: &str, wanted: &str, hierarchy: &dyn TypeHierarchy) -> Option<u32> {
	if declared == wanted {
		return Some(0);
	}
	if is_primitive(declared) || is_primitive(wanted) {
		return None;
	}
	if let Some(steps) = ancestors(hierarchy, wanted).position(|t| t == declared) {
		return u32::try_from(steps).ok();
	}
	(declared == OBJECT).then_some(OBJECT_DISTANCE)
}

#[cfg(test)]
mod tests {
	use rustc_hash::FxHashMap;
	use umbra_shadow_map::FlatHierarchy;

	use super::*;

	fn names(v: &[&str]) -> Vec<String> {
		v.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn exact_mode_requires_identical_names() {
		let wanted = names(&["int", "android.content.Context"]);
		assert_eq!(match_params(&wanted, &wanted, MatchMode::Exact, &FlatHierarchy), Some(MatchQuality::Exact));
		assert_eq!(match_params(&names(&["int", OBJECT]), &wanted, MatchMode::Exact, &FlatHierarchy), None);
	}

	#[test]
	fn loose_mode_accepts_object_and_supertypes() {
		let mut h = FxHashMap::default();
		h.insert("app.Activity".to_string(), "app.Context".to_string());

		let wanted = names(&["int", "app.Activity"]);
		assert_eq!(match_params(&names(&["int", "app.Context"]), &wanted, MatchMode::Loose, &h), Some(MatchQuality::Loose(1)));
		assert_eq!(match_params(&names(&["int", OBJECT]), &wanted, MatchMode::Loose, &h), Some(MatchQuality::Loose(OBJECT_DISTANCE)));
		assert_eq!(match_params(&names(&[OBJECT, "app.Activity"]), &wanted, MatchMode::Loose, &h), None);
		assert_eq!(match_params(&names(&["int"]), &wanted, MatchMode::Loose, &h), None);
	}

	#[test]
	fn closer_supertypes_rank_ahead_of_object() {
		let mut h = FxHashMap::default();
		h.insert("app.Activity".to_string(), "app.ContextWrapper".to_string());
		h.insert("app.ContextWrapper".to_string(), "app.Context".to_string());

		let wanted = names(&["app.Activity"]);
		let wrapper = match_params(&names(&["app.ContextWrapper"]), &wanted, MatchMode::Loose, &h);
		let context = match_params(&names(&["app.Context"]), &wanted, MatchMode::Loose, &h);
		let object = match_params(&names(&[OBJECT]), &wanted, MatchMode::Loose, &h);
		assert!(wrapper < context && context < object, "{wrapper:?} {context:?} {object:?}");
		assert!(Some(MatchQuality::Exact) < wrapper);
	}
}
