use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

/// FIFO of pending events drained by a single handler.
///
/// Events pushed while the queue is draining (for instance by the handler
/// itself) are handled after the current one instead of re-entering it.
pub struct EventQueue<T> {
	pending: RefCell<VecDeque<T>>,
	draining: Cell<bool>,
}

impl<T> Default for EventQueue<T> {
	fn default() -> Self {
		Self {
			pending: RefCell::new(VecDeque::new()),
			draining: Cell::new(false),
		}
	}
}

impl<T> EventQueue<T> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&self, event: T) {
		self.pending.borrow_mut().push_back(event);
	}

	/// Runs `handle` on every queued event. Returns `false` when another drain
	/// further up the stack already owns the queue.
	pub fn drain(&self, mut handle: impl FnMut(T)) -> bool {
		if self.draining.replace(true) {
			return false;
		}
		loop {
			let next = self.pending.borrow_mut().pop_front();
			let Some(event) = next else {
				break;
			};
			handle(event);
		}
		self.draining.set(false);
		true
	}
}

#[cfg(test)]
mod tests {
	use std::rc::Rc;

	use super::*;

	#[test]
	fn nested_pushes_run_after_current_event() {
		let queue = Rc::new(EventQueue::new());
		let seen = RefCell::new(Vec::new());
		queue.push(1);
		queue.push(2);

		let inner = Rc::clone(&queue);
		assert!(queue.drain(|n| {
			seen.borrow_mut().push(n);
			if n == 1 {
				inner.push(10);
				assert!(!inner.drain(|_| unreachable!()));
			}
		}));

		assert_eq!(*seen.borrow(), [1, 2, 10]);
		let mut leftover = 0;
		queue.drain(|_| leftover += 1);
		assert_eq!(leftover, 0);
	}
}
