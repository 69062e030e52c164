//! Dynamic values flowing through dispatch as receivers, arguments and results.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use umbra_shadow_map::TypeHierarchy;

pub const OBJECT: &str = "java.lang.Object";
pub const STRING: &str = "java.lang.String";
pub const LINKED_HASH_MAP: &str = "java.util.LinkedHashMap";
pub const MAP_ENTRY: &str = "java.util.Map$Entry";
pub const ARRAY_LIST: &str = "java.util.ArrayList";

/// Supertypes of the built-in container runtime types.
const MAP_SUPERTYPES: &[&str] = &[LINKED_HASH_MAP, "java.util.HashMap", "java.util.AbstractMap", "java.util.Map", OBJECT];
const LIST_SUPERTYPES: &[&str] = &[ARRAY_LIST, "java.util.List", "java.util.Collection", "java.lang.Iterable", OBJECT];
const STRING_SUPERTYPES: &[&str] = &[STRING, "java.lang.CharSequence", OBJECT];

/// Shared object instance with a runtime type and named fields.
pub struct Instance {
	type_name: String,
	fields: Mutex<IndexMap<String, Value>>,
}

impl Instance {
	pub fn type_name(&self) -> &str {
		&self.type_name
	}

	pub fn get(&self, field: &str) -> Option<Value> {
		self.fields.lock().get(field).cloned()
	}

	pub fn set(&self, field: impl Into<String>, value: Value) -> Option<Value> {
		self.fields.lock().insert(field.into(), value)
	}
}

impl fmt::Debug for Instance {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Instance")
			.field("type_name", &self.type_name)
			.field("fields", &*self.fields.lock())
			.finish()
	}
}

/// Hashable subset of [`Value`] usable as a map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey {
	Null,
	Bool(bool),
	Char(char),
	Int(i32),
	Long(i64),
	Str(Arc<str>),
}

impl MapKey {
	pub fn to_value(&self) -> Value {
		match self {
			Self::Null => Value::Null,
			Self::Bool(b) => Value::Bool(*b),
			Self::Char(c) => Value::Char(*c),
			Self::Int(i) => Value::Int(*i),
			Self::Long(l) => Value::Long(*l),
			Self::Str(s) => Value::Str(Arc::clone(s)),
		}
	}
}

impl From<i32> for MapKey {
	fn from(value: i32) -> Self {
		Self::Int(value)
	}
}

impl From<&str> for MapKey {
	fn from(value: &str) -> Self {
		Self::Str(value.into())
	}
}

/// Insertion-ordered map shared between every value that refers to it.
pub type SharedMap = Arc<Mutex<IndexMap<MapKey, Value>>>;

#[derive(Debug, Clone, Default)]
pub enum Value {
	/// Result of an operation declared `void`.
	#[default]
	Void,
	Null,
	Bool(bool),
	Char(char),
	/// `byte`, `short` and `int`.
	Int(i32),
	Long(i64),
	Float(f32),
	Double(f64),
	Str(Arc<str>),
	Object(Arc<Instance>),
	Map(SharedMap),
	Entry(Arc<(Value, Value)>),
	List(Arc<Mutex<Vec<Value>>>),
}

impl Value {
	/// Zero, `false`, `void` or `null` according to `type_name`.
	pub fn default_for(type_name: &str) -> Self {
		match type_name {
			"void" => Self::Void,
			"boolean" => Self::Bool(false),
			"char" => Self::Char('\0'),
			"byte" | "short" | "int" => Self::Int(0),
			"long" => Self::Long(0),
			"float" => Self::Float(0.0),
			"double" => Self::Double(0.0),
			_ => Self::Null,
		}
	}

	pub fn str(s: &str) -> Self {
		Self::Str(s.into())
	}

	pub fn object(type_name: impl Into<String>) -> Self {
		Self::Object(Arc::new(Instance {
			type_name: type_name.into(),
			fields: Mutex::new(IndexMap::new()),
		}))
	}

	pub fn linked_map(entries: impl IntoIterator<Item = (MapKey, Value)>) -> Self {
		Self::Map(Arc::new(Mutex::new(entries.into_iter().collect())))
	}

	pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
		Self::List(Arc::new(Mutex::new(items.into_iter().collect())))
	}

	pub fn entry(key: Value, value: Value) -> Self {
		Self::Entry(Arc::new((key, value)))
	}

	/// Runtime type of reference values; `None` for primitives, `void` and `null`.
	pub fn runtime_type(&self) -> Option<&str> {
		match self {
			Self::Str(_) => Some(STRING),
			Self::Object(instance) => Some(instance.type_name()),
			Self::Map(_) => Some(LINKED_HASH_MAP),
			Self::Entry(_) => Some(MAP_ENTRY),
			Self::List(_) => Some(ARRAY_LIST),
			_ => None,
		}
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Str(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_map(&self) -> Option<&SharedMap> {
		match self {
			Self::Map(map) => Some(map),
			_ => None,
		}
	}

	/// Key/value pair of an `Entry`.
	pub fn as_entry(&self) -> Option<(&Value, &Value)> {
		match self {
			Self::Entry(pair) => Some((&pair.0, &pair.1)),
			_ => None,
		}
	}

	/// Returns true if this value can be passed where `type_name` is declared.
	pub fn fits(&self, type_name: &str, hierarchy: &dyn TypeHierarchy) -> bool {
		match self {
			Self::Void => false,
			Self::Null => !is_primitive(type_name),
			Self::Bool(_) => matches!(type_name, "boolean" | "java.lang.Boolean" | OBJECT),
			Self::Char(_) => matches!(type_name, "char" | "java.lang.Character" | OBJECT),
			Self::Int(_) => matches!(type_name, "byte" | "short" | "int" | "java.lang.Integer" | OBJECT),
			Self::Long(_) => matches!(type_name, "long" | "java.lang.Long" | OBJECT),
			Self::Float(_) => matches!(type_name, "float" | "java.lang.Float" | OBJECT),
			Self::Double(_) => matches!(type_name, "double" | "java.lang.Double" | OBJECT),
			Self::Str(_) => STRING_SUPERTYPES.contains(&type_name),
			Self::Map(_) => MAP_SUPERTYPES.contains(&type_name),
			Self::List(_) => LIST_SUPERTYPES.contains(&type_name),
			Self::Entry(_) => matches!(type_name, MAP_ENTRY | OBJECT),
			Self::Object(instance) => type_name == OBJECT || hierarchy.is_subtype_of(instance.type_name(), type_name),
		}
	}
}

/// Structural equality for scalars and entries; identity equality for shared containers.
impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Void, Self::Void) | (Self::Null, Self::Null) => true,
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::Char(a), Self::Char(b)) => a == b,
			(Self::Int(a), Self::Int(b)) => a == b,
			(Self::Long(a), Self::Long(b)) => a == b,
			(Self::Float(a), Self::Float(b)) => a == b,
			(Self::Double(a), Self::Double(b)) => a == b,
			(Self::Str(a), Self::Str(b)) => a == b,
			(Self::Entry(a), Self::Entry(b)) => a == b,
			(Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
			(Self::Map(a), Self::Map(b)) => Arc::ptr_eq(a, b),
			(Self::List(a), Self::List(b)) => Arc::ptr_eq(a, b),
			_ => false,
		}
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<i32> for Value {
	fn from(value: i32) -> Self {
		Self::Int(value)
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Self::Long(value)
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Self::str(value)
	}
}

pub fn is_primitive(type_name: &str) -> bool {
	matches!(type_name, "void" | "boolean" | "char" | "byte" | "short" | "int" | "long" | "float" | "double")
}

#[cfg(test)]
mod tests {
	use umbra_shadow_map::FlatHierarchy;

	use super::*;

	#[test]
	fn defaults_follow_declared_type() {
		assert_eq!(Value::default_for("void"), Value::Void);
		assert_eq!(Value::default_for("boolean"), Value::Bool(false));
		assert_eq!(Value::default_for("short"), Value::Int(0));
		assert_eq!(Value::default_for("long"), Value::Long(0));
		assert_eq!(Value::default_for("double"), Value::Double(0.0));
		assert_eq!(Value::default_for("java.lang.String"), Value::Null);
		assert_eq!(Value::default_for("int[]"), Value::Null);
	}

	#[test]
	fn shared_containers_compare_by_identity() {
		let a = Value::linked_map([]);
		let b = Value::linked_map([]);
		assert_eq!(a, a.clone());
		assert_ne!(a, b);
		assert_eq!(Value::entry(Value::Int(1), "x".into()), Value::entry(Value::Int(1), "x".into()));
	}

	#[test]
	fn fits_declared_parameter_types() {
		assert!(Value::Null.fits("java.lang.String", &FlatHierarchy));
		assert!(!Value::Null.fits("int", &FlatHierarchy));
		assert!(Value::Int(3).fits("short", &FlatHierarchy));
		assert!(!Value::Int(3).fits("long", &FlatHierarchy));
		assert!(Value::str("x").fits("java.lang.CharSequence", &FlatHierarchy));
		assert!(Value::linked_map([]).fits("java.util.Map", &FlatHierarchy));
		assert!(Value::object("a.B").fits(OBJECT, &FlatHierarchy));
		assert!(!Value::object("a.B").fits("a.C", &FlatHierarchy));
	}
}
