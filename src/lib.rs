//! Asynchronous derived values for a reactive object model.
//!
//! A declared property is computed by a function returning a future (or a
//! plain value). The property exposes a synchronous default immediately and
//! transparently updates once the computation settles. Each invocation is
//! tagged with a per-property sequence number so that only the most recent
//! invocation's settlement is allowed to commit; late settlements of
//! superseded invocations are discarded silently.

pub mod macros;

mod addr;
mod batch;
mod descriptor;
mod error;
mod evaluation;
mod getter;
mod lazy;
mod registry;
mod sequencer;
mod status;
mod var;
mod watcher;

use std::rc::{Rc, Weak};

pub use batch::{batch, in_batch};
pub use descriptor::{Declaration, DefaultValue, Descriptor, PropertySpec, Watch};
pub use error::{ConfigError, ErrorHandler, Rejection, Reported, TouchError};
pub use evaluation::{Dependencies, Evaluation};
pub use getter::{Compute, Entity, Outcome};
pub use registry::{Options, Registry};
pub use sequencer::AsyncComputed;
pub use status::{PropertyState, Status};
pub use var::Var;
pub use watcher::{Watcher, Watchers};

pub trait Derived: 'static {
	fn invalidate(self: Rc<Self>, invalid: Invalid);
}

pub trait Observable: 'static {
	/// Bring this observable up to date and return the resulting version.
	fn update(&self) -> Version;

	/// The current version without recomputation.
	fn version(&self) -> Version;

	/// Notify this observable that `derived` started to listen.
	fn used_by(&self, derived: Weak<dyn Derived>);

	/// Notify this observable that `derived` stopped to listen.
	fn not_used_by(&self, derived: &Weak<dyn Derived>);
}

#[derive(PartialEq, Eq, Clone, Copy)]
pub enum State {
	Valid,
	Invalid(Invalid),
}

#[derive(PartialEq, Eq, Clone, Copy)]
pub enum Invalid {
	Maybe,
	Definitely,
}

#[derive(PartialEq, Eq, Clone, Copy)]
pub enum Version {
	Hash(u64),
}
