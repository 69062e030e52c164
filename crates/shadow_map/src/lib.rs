//! Override descriptors and the shadow map.
//!
//! An override ("shadow") stands in for an original type's behavior over a range of platform
//! versions. This crate owns the declarative side of that relationship:
//!
//! * [`OverrideDescriptor`] and [`VersionRange`] describe one registration.
//! * [`OverrideIndex`] answers which override shadows a type at a version, walking the
//!   [`TypeHierarchy`] most-derived first and consulting [`OverridePicker`]s on ties.
//! * [`config`] loads descriptors and environment properties from TOML layers.

pub mod config;
mod descriptor;
mod error;
mod hierarchy;
mod index;
mod picker;
mod version;

pub use descriptor::OverrideDescriptor;
pub use error::{AmbiguityReason, IndexError, ResolveError};
pub use hierarchy::{Ancestors, FlatHierarchy, TypeHierarchy, ancestors};
pub use index::{Collision, DuplicatePolicy, OverrideIndex, OverrideIndexBuilder, Resolution, ResolveEnv, Resolved};
pub use picker::{EnvProperties, OverridePicker, PickContext, PickerRegistry, PropertyPicker};
pub use version::{Version, VersionRange};
