use std::future::Future;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::FutureExt;

use crate::descriptor::Watch;
use crate::error::{Rejection, TouchError};
use crate::evaluation::Evaluation;
use crate::var::Var;

/// The owning entity of a set of async computed properties.
///
/// `touch` is the explicit mark-dependency hook behind dotted watch paths:
/// the entity performs a tracked read along `path` so the surrounding
/// reactive system records the dependency. The default implementation
/// rejects every path; entities that never declare path watches need not
/// override it.
pub trait Entity: 'static {
	fn touch(&self, path: &str, _eval: &Evaluation) -> Result<(), TouchError> {
		Err(TouchError::Unsupported {
			path: path.to_owned(),
		})
	}
}

/// A getter's raw return: a plain value, or a deferred computation.
pub enum Compute<T> {
	Ready(T),
	Deferred(LocalBoxFuture<'static, Result<T, Rejection>>),
}

impl<T> Compute<T> {
	pub fn ready(value: T) -> Self {
		Compute::Ready(value)
	}

	pub fn deferred<F>(future: F) -> Self
	where
		F: Future<Output = Result<T, Rejection>> + 'static,
	{
		Compute::Deferred(future.boxed_local())
	}
}

/// Result of one gated invocation of the composed getter.
pub enum Outcome<T> {
	Recomputed(Compute<T>),
	/// A gate short-circuited; no state transition, no new sequence.
	Skipped,
}

pub(crate) type Getter<C, T> = Rc<dyn Fn(&C, &Evaluation) -> Compute<T>>;
pub(crate) type Predicate<C> = Rc<dyn Fn(&C, &Evaluation) -> bool>;

/// The composed getter: watch touches and gating wrapped around the raw
/// getter, with the owning entity passed explicitly through every layer.
pub(crate) struct Gates<C, T> {
	key: &'static str,
	get: Getter<C, T>,
	watch: Option<Watch<C>>,
	should_update: Option<Predicate<C>>,
	/// Activation cell of a lazy property; the gate reads it through the
	/// evaluation so that flipping it retriggers the watcher.
	lazy: Option<Var<bool>>,
}

impl<C: Entity, T> Gates<C, T> {
	pub fn new(
		key: &'static str,
		get: Getter<C, T>,
		watch: Option<Watch<C>>,
		should_update: Option<Predicate<C>>,
		lazy: Option<Var<bool>>,
	) -> Self {
		Gates {
			key,
			get,
			watch,
			should_update,
			lazy,
		}
	}

	/// Gated invocation, used on every reactive trigger.
	pub fn invoke(&self, ctx: &C, eval: &Evaluation) -> Outcome<T> {
		if let Some(active) = &self.lazy {
			if !*active.get(eval) {
				return Outcome::Skipped;
			}
		}
		if let Some(should_update) = &self.should_update {
			if !should_update(ctx, eval) {
				return Outcome::Skipped;
			}
		}
		Outcome::Recomputed(self.force(ctx, eval))
	}

	/// Record the gate cells as dependencies without letting their verdict
	/// gate anything. Forced runs replace the watcher's dependency set, so
	/// the gates must stay subscribed for later reactive triggers.
	pub fn track(&self, ctx: &C, eval: &Evaluation) {
		if let Some(active) = &self.lazy {
			let _ = active.get(eval);
		}
		if let Some(should_update) = &self.should_update {
			let _ = should_update(ctx, eval);
		}
	}

	/// Ungated invocation, used by manual `update()`: watch touches still
	/// run, `should_update` and the lazy gate do not.
	pub fn force(&self, ctx: &C, eval: &Evaluation) -> Compute<T> {
		match &self.watch {
			Some(Watch::Touch(func)) => func(ctx, eval),
			Some(Watch::Paths(paths)) => {
				for path in paths {
					if let Err(err) = ctx.touch(path, eval) {
						tracing::error!(key = self.key, path = %path, %err, "bad watch path");
						panic!(
							"async computed property `{}`: bad watch path `{}`: {}",
							self.key, path, err
						);
					}
				}
			}
			None => {}
		}
		(self.get)(ctx, eval)
	}
}
