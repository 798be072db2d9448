//! Lexically scoped environments with shared mutable bindings.
//!
//! An [`Env`] is a handle onto a chain of frames. Each frame maps names to
//! cells and points at its parent; closures capture the chain by aliasing
//! the current frame. The operations keep a deliberate asymmetry:
//!
//! - [`Env::extend`] allocates a new frame in front of the chain and never
//!   mutates the existing frames, so environments captured earlier stay
//!   intact.
//! - [`Env::modify`] writes through the innermost cell with the given
//!   name; every handle aliasing that frame observes the write. `letrec`
//!   and `set!` depend on this.
//! - [`Env::define`] inserts into the innermost frame in place, so a
//!   top-level definition becomes visible to closures that captured the
//!   chain before it existed (this is what lets a top-level function call
//!   itself).
//!
//! A cell can be unassigned (`letrec` placeholders); looking one up
//! behaves as if the name were absent, while `modify` fills it in.

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A handle onto a frame chain. Cloning shares the chain.
#[derive(Clone)]
pub struct Env {
    frame: Rc<Frame>,
}

struct Frame {
    bindings: RefCell<HashMap<String, Option<Value>>>,
    parent: Option<Rc<Frame>>,
}

impl Env {
    /// The initial environment: a single empty frame. Primitives are not
    /// bindings; they are resolved through the primitive table.
    pub fn empty() -> Self {
        Env {
            frame: Rc::new(Frame {
                bindings: RefCell::new(HashMap::new()),
                parent: None,
            }),
        }
    }

    /// Innermost binding for `name`, or None when the name is absent or
    /// still an unassigned placeholder. The search stops at the first
    /// frame that knows the name.
    pub fn find(&self, name: &str) -> Option<Value> {
        let mut frame = Some(self.frame.clone());
        while let Some(f) = frame {
            if let Some(slot) = f.bindings.borrow().get(name) {
                return slot.clone();
            }
            frame = f.parent.clone();
        }
        None
    }

    /// New environment with `name` bound in a fresh innermost frame. The
    /// receiver is left untouched.
    pub fn extend(&self, name: &str, value: Value) -> Env {
        self.push_frame(name, Some(value))
    }

    /// New environment with `name` bound to an unassigned placeholder
    /// cell, to be filled in later through [`Env::modify`].
    pub fn extend_unassigned(&self, name: &str) -> Env {
        self.push_frame(name, None)
    }

    /// Write through the innermost cell named `name`. No effect when the
    /// name is absent; callers check with [`Env::find`] first.
    pub fn modify(&self, name: &str, value: Value) {
        let mut frame = Some(self.frame.clone());
        let mut value = Some(value);
        while let Some(f) = frame {
            {
                let mut bindings = f.bindings.borrow_mut();
                if let Some(slot) = bindings.get_mut(name) {
                    *slot = value.take();
                    return;
                }
            }
            frame = f.parent.clone();
        }
    }

    /// Insert a binding into the innermost frame in place. Used by
    /// `define` for names not bound anywhere yet.
    pub fn define(&self, name: &str, value: Value) {
        self.frame
            .bindings
            .borrow_mut()
            .insert(name.to_owned(), Some(value));
    }

    fn push_frame(&self, name: &str, slot: Option<Value>) -> Env {
        let mut bindings = HashMap::new();
        bindings.insert(name.to_owned(), slot);
        Env {
            frame: Rc::new(Frame {
                bindings: RefCell::new(bindings),
                parent: Some(self.frame.clone()),
            }),
        }
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<environment>")
    }
}
