//! Permissioned multi-word flag bitfield engine.
//!
//! A [`FlagSet`] is three 32-bit words addressed by `(word, mask)`. Each
//! named flag is bound to a [`FlagEntry`] that carries a display letter,
//! a visibility permission, and a [`FlagHandler`] drawn from a small
//! enumerated set of mutation policies. The [`FlagRegistry`] is the
//! case-insensitive name table used to look flags up by name or letter
//! and to decode/encode flag sets to and from short letter strings.
//!
//! This crate has no knowledge of the object/attribute database it is
//! layered on top of: callers describe the actor and target through
//! [`ActorInfo`] / [`TargetInfo`], both of which are plain data the
//! embedding game supplies.

mod entry;
mod error;
mod handler;
mod registry;
mod set;

pub use entry::{FlagEntry, ListPermission};
pub use error::FlagError;
pub use handler::{ActorInfo, FlagHandler, MutationOutcome, ProtectedDbrefs, TargetInfo};
pub use registry::FlagRegistry;
pub use set::{FlagSet, FlagWord};

/// External game object identifier. The connection layer never
/// dereferences this; it is an opaque handle into a collaborator.
pub type Dbref = i64;
