//! Operation identities and the canonical call-site descriptor format.
//!
//! # Purpose
//!
//! Every redirected call site carries a descriptor string naming the operation it invokes:
//!
//! ```text
//! owner/operation(paramType...)resultType
//! ```
//!
//! Type tokens use single-letter primitive markers (`Z B C S I J F D V`), `L<fqcn>;` for object
//! types and a `[` prefix per array dimension. The format is a persisted contract shared with
//! call-site generation and must stay stable.
//!
//! [`OperationIdentity::parse`] turns a descriptor into human-readable type names
//! (`Z` → `boolean`, `Ljava/lang/String;` → `java.lang.String`, `[[I` → `int[][]`), and
//! [`OperationIdentity::encode`] is its inverse.
//!
//! # Key Types
//!
//! | Type | Role |
//! |------|------|
//! | [`OperationIdentity`] | Owner, operation name, parameter and result type names. |
//! | [`TypeToken`] | One decoded type marker. |
//! | [`SignatureCache`] | Process-lifetime memo of parsed descriptors. |
//! | [`SignatureError`] | Descriptor could not be fully consumed. |

mod cache;
mod error;
mod identity;
mod token;

pub use cache::SignatureCache;
pub use error::SignatureError;
pub use identity::OperationIdentity;
pub use token::{Primitive, TypeToken, encode_type_name};
