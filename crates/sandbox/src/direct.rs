//! Direct calls to original operations.
//!
//! The proxy owns only the [`TypeModel`]. It has no path to the override index, the
//! interception registry or any dispatcher, so an override calling through to "its own" original
//! cannot recurse back into itself.

use std::sync::Arc;

use umbra_signature::OperationIdentity;

use crate::error::DispatchError;
use crate::model::{OpKind, OriginalCall, OriginalOp, TypeModel};
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct DirectCallProxy {
	model: Arc<TypeModel>,
}

impl DirectCallProxy {
	pub fn new(model: Arc<TypeModel>) -> Self {
		Self { model }
	}

	pub fn model(&self) -> &TypeModel {
		&self.model
	}

	/// Invokes the original `name` visible from `declaring_type`, choosing the overload whose
	/// parameters accept `args`.
	pub fn call_original(&self, receiver: &Value, declaring_type: &str, name: &str, args: &[Value]) -> Result<Value, DispatchError> {
		let missing = || DispatchError::MissingOriginal {
			owner: declaring_type.to_string(),
			operation: name.to_string(),
		};
		let (owner, overloads) = self.model.overloads(declaring_type, name).ok_or_else(missing)?;

		let mut fitting = overloads.into_iter().filter(|op| {
			op.params.len() == args.len() && op.params.iter().zip(args).all(|(param, arg)| arg.fits(param, &*self.model))
		});
		let op = match (fitting.next(), fitting.next()) {
			(None, _) => return Err(missing()),
			(Some(op), None) => op,
			(Some(_), Some(_)) => {
				return Err(DispatchError::AmbiguousOriginal {
					owner: owner.to_string(),
					name: name.to_string(),
					arity: args.len(),
					matches: 2 + fitting.count(),
				});
			}
		};
		self.run(owner, op, receiver, args)
	}

	/// Invokes exactly the original operation `identity` names, falling back to overload
	/// selection when the model does not declare those parameter types.
	pub fn call_identity(&self, receiver: &Value, identity: &OperationIdentity, args: &[Value]) -> Result<Value, DispatchError> {
		match self.model.find_op(identity) {
			Some((owner, op)) => self.run(owner, op, receiver, args),
			None => self.call_original(receiver, &identity.owner, &identity.name, args),
		}
	}

	fn run(&self, owner: &str, op: &OriginalOp, receiver: &Value, args: &[Value]) -> Result<Value, DispatchError> {
		match &op.kind {
			OpKind::Safe(body) => body(&OriginalCall {
				receiver,
				declaring_type: owner,
				args,
			}),
			OpKind::Unsafe => {
				tracing::debug!(owner, op = %op.name, "direct call to unsafe original; returning default");
				Ok(Value::default_for(&op.result))
			}
		}
	}
}
