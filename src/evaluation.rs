use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use crate::addr::RcKey;
use crate::{Derived, Observable, Version};

/// Records which observables were read, and at which version, during one
/// tracked evaluation of a derived node.
pub struct Evaluation {
	parent: Weak<dyn Derived>,
	inner: RefCell<Dependencies>,
}

impl AsRef<Evaluation> for Evaluation {
	fn as_ref(&self) -> &Evaluation {
		self
	}
}

impl Evaluation {
	pub fn new(parent: Weak<dyn Derived>) -> Self {
		Evaluation {
			parent,
			inner: RefCell::new(Dependencies::new()),
		}
	}

	pub(crate) fn parent(&self) -> Weak<dyn Derived> {
		self.parent.clone()
	}

	pub(crate) fn based_on(&self, observable: Rc<dyn Observable>, version: Version) {
		self.inner.borrow_mut().based_on(observable, version);
	}

	pub fn take(self) -> Dependencies {
		self.inner.into_inner()
	}
}

pub struct Dependencies {
	based_on: BTreeMap<RcKey<dyn Observable>, Version>,
}

impl Default for Dependencies {
	fn default() -> Self {
		Dependencies::new()
	}
}

impl Dependencies {
	pub fn new() -> Self {
		Dependencies {
			based_on: BTreeMap::new(),
		}
	}

	fn based_on(&mut self, observable: Rc<dyn Observable>, version: Version) {
		self.based_on.insert(RcKey::new(observable), version);
	}

	/// Unsubscribe `parent` from every recorded dependency.
	pub fn release(&mut self, parent: &Weak<dyn Derived>) {
		for item in self.based_on.keys() {
			item.not_used_by(parent);
		}
	}

	/// Revalidate a maybe-invalid node: true when every dependency still
	/// reports the version recorded at the last evaluation.
	pub fn are_valid(&self) -> bool {
		self.based_on
			.iter()
			.all(|(base, version)| base.update() == *version)
	}

	/// Install the dependency set of a fresh evaluation, unsubscribing
	/// `parent` from dependencies that are no longer read.
	pub fn swap(&mut self, next: Dependencies, parent: &Weak<dyn Derived>) {
		let prev = std::mem::replace(&mut self.based_on, next.based_on);

		prev.keys()
			.filter(|k| !self.based_on.contains_key(k))
			.for_each(|k| k.not_used_by(parent));
	}
}
