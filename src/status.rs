use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::error::Rejection;
use crate::evaluation::Evaluation;
use crate::var::Var;

/// Per-property lifecycle. `Idle` lasts until the first genuine
/// invocation: a lazy property that was never read, or one whose
/// `should_update` gate rejected every trigger so far, stays idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyState {
	Idle,
	Updating,
	Success,
	Error,
}

/// Target of a manual re-trigger; implemented by the property runtime.
pub(crate) trait Retrigger: 'static {
	fn retrigger(&self);
}

/// Read-only view of one property's state, plus the manual `update()`
/// entry point. The state lives in a single reactive cell, so the derived
/// `updating`/`success`/`error` flags can never disagree with each other.
#[derive(Clone)]
pub struct Status {
	body: Rc<StatusBody>,
}

struct StatusBody {
	state: Var<PropertyState>,
	exception: RefCell<Option<Rejection>>,
	target: RefCell<Option<Weak<dyn Retrigger>>>,
}

impl Status {
	pub(crate) fn new() -> Self {
		Status {
			body: Rc::new(StatusBody {
				state: Var::new(PropertyState::Idle),
				exception: RefCell::new(None),
				target: RefCell::new(None),
			}),
		}
	}

	pub(crate) fn bind(&self, target: Weak<dyn Retrigger>) {
		*self.body.target.borrow_mut() = Some(target);
	}

	/// Tracked read of the state machine.
	pub fn state(&self, eval: &impl AsRef<Evaluation>) -> PropertyState {
		*self.body.state.get(eval)
	}

	pub fn state_once(&self) -> PropertyState {
		*self.body.state.get_once()
	}

	pub fn updating(&self) -> bool {
		self.state_once() == PropertyState::Updating
	}

	pub fn success(&self) -> bool {
		self.state_once() == PropertyState::Success
	}

	pub fn error(&self) -> bool {
		self.state_once() == PropertyState::Error
	}

	/// The last captured rejection, cleared by the next successful commit.
	pub fn exception(&self) -> Option<Rejection> {
		self.body.exception.borrow().clone()
	}

	/// Force re-evaluation; a no-op once the owning entity is torn down.
	pub fn update(&self) {
		let target = self.body.target.borrow().clone();
		if let Some(target) = target.and_then(|t| t.upgrade()) {
			target.retrigger();
		}
	}

	pub(crate) fn transition(&self, next: PropertyState) {
		self.body.state.set(next);
	}

	pub(crate) fn succeed(&self) {
		self.body.exception.borrow_mut().take();
		self.body.state.set(PropertyState::Success);
	}

	pub(crate) fn fail(&self, err: Rejection) {
		*self.body.exception.borrow_mut() = Some(err);
		self.body.state.set(PropertyState::Error);
	}
}

impl std::fmt::Debug for Status {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Status")
			.field("state", &self.state_once())
			.field("exception", &self.exception().map(|e| e.to_string()))
			.finish()
	}
}
