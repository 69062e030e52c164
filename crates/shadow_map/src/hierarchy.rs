//! Supertype chains consumed by override resolution.

use rustc_hash::{FxHashMap, FxHashSet};

/// Source of the single-inheritance supertype chain of original types.
pub trait TypeHierarchy {
	/// Direct supertype of `ty`, if it has one the hierarchy knows about.
	fn supertype_of(&self, ty: &str) -> Option<&str>;

	/// Returns true if `ty` is `ancestor` or inherits from it.
	fn is_subtype_of(&self, ty: &str, ancestor: &str) -> bool {
		ancestors(self, ty).any(|t| t == ancestor)
	}
}

/// A hierarchy where no type has a supertype.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatHierarchy;

impl TypeHierarchy for FlatHierarchy {
	fn supertype_of(&self, _ty: &str) -> Option<&str> {
		None
	}
}

impl TypeHierarchy for FxHashMap<String, String> {
	fn supertype_of(&self, ty: &str) -> Option<&str> {
		self.get(ty).map(String::as_str)
	}
}

/// Walks `ty` and its ancestors, most-derived first. Stops at the first repeated type.
pub fn ancestors<'a, H: TypeHierarchy + ?Sized>(hierarchy: &'a H, ty: &'a str) -> Ancestors<'a, H> {
	Ancestors {
		hierarchy,
		next: Some(ty),
		seen: FxHashSet::default(),
	}
}

pub struct Ancestors<'a, H: ?Sized> {
	hierarchy: &'a H,
	next: Option<&'a str>,
	seen: FxHashSet<&'a str>,
}

impl<'a, H: TypeHierarchy + ?Sized> Iterator for Ancestors<'a, H> {
	type Item = &'a str;

	fn next(&mut self) -> Option<&'a str> {
		let current = self.next.take()?;
		if !self.seen.insert(current) {
			tracing::warn!(ty = current, "cycle in type hierarchy");
			return None;
		}
		self.next = self.hierarchy.supertype_of(current);
		Some(current)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn chain() -> FxHashMap<String, String> {
		let mut h = FxHashMap::default();
		h.insert("C".to_string(), "B".to_string());
		h.insert("B".to_string(), "A".to_string());
		h
	}

	#[test]
	fn walks_most_derived_first() {
		let h = chain();
		assert_eq!(ancestors(&h, "C").collect::<Vec<_>>(), ["C", "B", "A"]);
		assert!(h.is_subtype_of("C", "A"));
		assert!(!h.is_subtype_of("A", "C"));
	}

	#[test]
	fn cycles_terminate() {
		let mut h = chain();
		h.insert("A".to_string(), "C".to_string());
		assert_eq!(ancestors(&h, "C").count(), 3);
	}
}
