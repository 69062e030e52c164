//! Runtime half of the shadowing sandbox.
//!
//! Given an invocation of an original operation, the [`ShadowWrangler`] decides whether a
//! registered override runs, an interceptor synthesizes a result, the original runs, or nothing
//! runs at all. Override bodies reach their originals through the [`DirectCallProxy`], which has
//! no route back into dispatch. Between tests the [`LifecycleResetter`] clears every active
//! override's state.
//!
//! [`Environment`] wires these together from a version, override descriptors and interceptors.

mod direct;
mod env;
mod error;
mod intercept;
mod model;
mod reset;
mod shadow;
mod value;
mod wrangler;

pub use direct::DirectCallProxy;
pub use env::{Environment, EnvironmentBuilder, EnvironmentProvider};
pub use error::{BoxError, DispatchError, EnvironmentError, ResetError};
pub use intercept::{InterceptBody, InterceptCall, InterceptKey, InterceptionHandler, InterceptionRegistry, InterceptorCollision, builtin_interceptors};
pub use model::{OpKind, OriginalBody, OriginalCall, OriginalOp, OriginalType, TypeModel};
pub use reset::{LifecycleResetter, ResetGuard, ResetReport};
pub use shadow::{MatchMode, MatchQuality, OverrideBody, OverrideCall, OverrideCatalog, OverrideImpl, OverrideOp, ResetHook, match_params};
pub use value::{Instance, MapKey, SharedMap, Value};
pub use wrangler::{DispatchResult, Dispatcher, Invocation, ShadowWrangler, execute, invoke};
