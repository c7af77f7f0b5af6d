//! Type aliases for commonly used complex types.
//!
//! The interaction layer runs on a single thread, so shared mutable state is
//! `Rc<RefCell<T>>` throughout. Aliases give those nested types readable names.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use solidkit_core::types::*;
//!
//! // Instead of: Rc<RefCell<MyState>>
//! let state: Shared<MyState> = shared(MyState::default());
//! ```

use std::cell::RefCell;
use std::rc::Rc;

/// A reference-counted, interior-mutable wrapper for single-threaded sharing.
///
/// Never hold a borrow across a call into user code (hooks, callbacks,
/// continuations); those may re-enter the same value.
pub type Shared<T> = Rc<RefCell<T>>;

/// An optional shared reference, for lazily-initialized shared state.
pub type SharedOption<T> = Rc<RefCell<Option<T>>>;

/// A boxed one-shot callback with no parameters.
pub type OnceCallback = Box<dyn FnOnce()>;

/// Create a new `Shared<T>` from a value.
#[inline]
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// Create a new `SharedOption<T>` initialized to `None`.
#[inline]
pub fn shared_none<T>() -> SharedOption<T> {
    Rc::new(RefCell::new(None))
}
