//! Type aliases for commonly used complex types.
//!
//! The map settings layer lives on the UI thread, so everything here is the
//! single-threaded `Rc<RefCell<T>>` family.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mapview_core::types::*;
//!
//! // Instead of: Rc<RefCell<MyState>>
//! let state: Shared<MyState> = shared(MyState::default());
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// A reference-counted, interior-mutable wrapper for single-threaded sharing.
///
/// Use when you need to share mutable state within a single thread (e.g. the
/// UI thread that owns a map view).
pub type Shared<T> = Rc<RefCell<T>>;

/// A non-owning handle to [`Shared`] state.
pub type WeakShared<T> = Weak<RefCell<T>>;

/// Create a new [`Shared`] value.
#[inline]
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}
