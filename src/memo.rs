//! Memoized, invalidatable slots for derived tree values.
//!
//! Every derived field of a [`Category`](crate::category::Category) or
//! [`Site`](crate::site::Site) lives in one [`Memo`]. A value is computed on
//! first access and handed out as a cheap clone (usually an `Rc`) until the
//! owning node clears it. Failed computations are not stored, so the next
//! access retries.
//!
//! The compute closure runs while the slot is *not* borrowed: it may freely
//! read other memos on the same node (e.g. `index_pages` reading `children`).

use std::cell::RefCell;

#[derive(Debug)]
pub struct Memo<T> {
    slot: RefCell<Option<T>>,
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self {
            slot: RefCell::new(None),
        }
    }
}

impl<T: Clone> Memo<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached value, if one has been computed this epoch.
    pub fn peek(&self) -> Option<T> {
        self.slot.borrow().clone()
    }

    pub fn is_cached(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Return the cached value or compute, store and return it.
    pub fn get_or_try_init<E>(&self, init: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        if let Some(value) = self.peek() {
            return Ok(value);
        }
        let value = init()?;
        *self.slot.borrow_mut() = Some(value.clone());
        Ok(value)
    }

    pub fn get_or_init(&self, init: impl FnOnce() -> T) -> T {
        if let Some(value) = self.peek() {
            return value;
        }
        let value = init();
        *self.slot.borrow_mut() = Some(value.clone());
        value
    }

    /// Drop the cached value and return it.
    pub fn clear(&self) -> Option<T> {
        self.slot.borrow_mut().take()
    }
}
