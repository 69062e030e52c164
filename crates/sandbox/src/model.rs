//! Type model of original (unshadowed) types.
//!
//! Each original operation is either [`OpKind::Safe`], meaning its body can run inside the
//! sandbox, or [`OpKind::Unsafe`], meaning it is backed by something the sandbox cannot provide
//! (native code, device services). Unsafe operations are the enumerated set for which dispatch
//! falls back to `DoNothing`.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap as HashMap;
use umbra_shadow_map::{TypeHierarchy, ancestors};
use umbra_signature::OperationIdentity;

use crate::error::DispatchError;
use crate::value::Value;

/// Context handed to an original operation body.
pub struct OriginalCall<'a> {
	pub receiver: &'a Value,
	/// Type that declares the operation being run.
	pub declaring_type: &'a str,
	pub args: &'a [Value],
}

pub type OriginalBody = Arc<dyn Fn(&OriginalCall<'_>) -> Result<Value, DispatchError> + Send + Sync>;

#[derive(Clone)]
pub enum OpKind {
	Safe(OriginalBody),
	Unsafe,
}

#[derive(Clone)]
pub struct OriginalOp {
	pub name: String,
	pub params: Vec<String>,
	pub result: String,
	pub kind: OpKind,
}

impl OriginalOp {
	pub fn is_safe(&self) -> bool {
		matches!(self.kind, OpKind::Safe(_))
	}
}

impl fmt::Debug for OriginalOp {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("OriginalOp")
			.field("name", &self.name)
			.field("params", &self.params)
			.field("result", &self.result)
			.field("safe", &self.is_safe())
			.finish()
	}
}

/// An original type with its direct supertype and declared operations.
#[derive(Debug, Clone)]
pub struct OriginalType {
	pub name: String,
	pub supertype: Option<String>,
	pub ops: Vec<OriginalOp>,
}

impl OriginalType {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			supertype: None,
			ops: Vec::new(),
		}
	}

	pub fn extends(mut self, supertype: impl Into<String>) -> Self {
		self.supertype = Some(supertype.into());
		self
	}

	/// Declares an operation whose body runs in the sandbox.
	pub fn safe<F>(mut self, name: &str, params: &[&str], result: &str, body: F) -> Self
	where
		F: Fn(&OriginalCall<'_>) -> Result<Value, DispatchError> + Send + Sync + 'static,
	{
		self.ops.push(OriginalOp {
			name: name.to_string(),
			params: params.iter().map(|p| p.to_string()).collect(),
			result: result.to_string(),
			kind: OpKind::Safe(Arc::new(body)),
		});
		self
	}

	/// Declares an operation that cannot run in the sandbox.
	pub fn unsafe_op(mut self, name: &str, params: &[&str], result: &str) -> Self {
		self.ops.push(OriginalOp {
			name: name.to_string(),
			params: params.iter().map(|p| p.to_string()).collect(),
			result: result.to_string(),
			kind: OpKind::Unsafe,
		});
		self
	}

	fn declared(&self, name: &str, params: &[String]) -> Option<&OriginalOp> {
		self.ops.iter().find(|op| op.name == name && op.params == params)
	}
}

/// Registry of original types, read-only once handed to an environment.
#[derive(Debug, Clone, Default)]
pub struct TypeModel {
	types: HashMap<String, OriginalType>,
}

impl TypeModel {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_type(mut self, ty: OriginalType) -> Self {
		self.insert(ty);
		self
	}

	pub fn insert(&mut self, ty: OriginalType) -> Option<OriginalType> {
		self.types.insert(ty.name.clone(), ty)
	}

	pub fn get(&self, name: &str) -> Option<&OriginalType> {
		self.types.get(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.types.contains_key(name)
	}

	/// Finds the original operation an identity names, searching inherited operations.
	///
	/// Returns the declaring type alongside the operation.
	pub fn find_op(&self, identity: &OperationIdentity) -> Option<(&str, &OriginalOp)> {
		ancestors(self, &identity.owner).find_map(|level| {
			let ty = self.types.get(level)?;
			ty.declared(&identity.name, &identity.params).map(|op| (ty.name.as_str(), op))
		})
	}

	/// Overloads named `name` visible from `declaring_type`, taken from the nearest type that
	/// declares any.
	pub fn overloads(&self, declaring_type: &str, name: &str) -> Option<(&str, Vec<&OriginalOp>)> {
		ancestors(self, declaring_type).find_map(|level| {
			let ty = self.types.get(level)?;
			let ops: Vec<_> = ty.ops.iter().filter(|op| op.name == name).collect();
			(!ops.is_empty()).then_some((ty.name.as_str(), ops))
		})
	}
}

impl TypeHierarchy for TypeModel {
	fn supertype_of(&self, ty: &str) -> Option<&str> {
		self.types.get(ty)?.supertype.as_deref()
	}
}
