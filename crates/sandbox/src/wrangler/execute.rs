use umbra_shadow_map::Version;
use umbra_signature::OperationIdentity;

use super::{DispatchResult, Dispatcher};
use crate::direct::DirectCallProxy;
use crate::error::DispatchError;
use crate::intercept::InterceptCall;
use crate::shadow::OverrideCall;
use crate::value::Value;

/// One redirected call: what is invoked, on what, with which arguments.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
	pub identity: &'a OperationIdentity,
	pub receiver: &'a Value,
	pub args: &'a [Value],
}

/// Runs the target a dispatch decision selected.
pub fn execute(plan: &DispatchResult, invocation: &Invocation<'_>, direct: &DirectCallProxy, version: Version) -> Result<Value, DispatchError> {
	let Invocation { identity, receiver, args } = *invocation;
	match plan {
		DispatchResult::RunOverride { op, .. } => op.run(&OverrideCall {
			identity,
			receiver,
			args,
			version,
			direct,
		}),
		DispatchResult::RunIntercepted(handler) => handler.compute(&InterceptCall {
			identity,
			receiver,
			declaring_type: &identity.owner,
			args,
		}),
		DispatchResult::RunOriginal => direct.call_identity(receiver, identity, args),
		DispatchResult::DoNothing(value) => Ok(value.clone()),
	}
}

/// Dispatches `invocation` and runs the chosen target.
pub fn invoke(dispatcher: &dyn Dispatcher, invocation: &Invocation<'_>, direct: &DirectCallProxy, version: Version) -> Result<Value, DispatchError> {
	let plan = dispatcher.dispatch(invocation.identity, invocation.receiver, invocation.args)?;
	execute(&plan, invocation, direct, version)
}
