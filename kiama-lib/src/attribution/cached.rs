/*!

Plain cached attributes, and the uncached convenience with the same interface.

The memo table drives cycle detection: an entry moves from absent to `InProgress` when
evaluation of the defining function starts, and to `Computed` when it returns. Finding
`InProgress` on application means the definition transitively requested itself. Errors, the
cycle included, remove the in-progress marker before propagating, so the table never retains
partial state.

*/

use std::cell::RefCell;
use std::rc::Rc;

use kiama_abs::IString;

use crate::{
  attribution::{AttrResult, Attribute},
  error::AttributeError,
  term::{IdentityTable, TermPtr},
};

#[derive(Clone)]
pub(crate) enum MemoState<U> {
  InProgress,
  Computed(U),
}

/// An attribute whose defining function is evaluated at most once per distinct node identity
/// between resets.
pub struct CachedAttribute<U> {
  name: IString,
  f:    Rc<dyn Fn(&TermPtr) -> AttrResult<U>>,
  memo: RefCell<IdentityTable<MemoState<U>>>,
}

impl<U: Clone + 'static> CachedAttribute<U> {
  pub fn new(name: &str, f: impl Fn(&TermPtr) -> AttrResult<U> + 'static) -> CachedAttribute<U> {
    CachedAttribute {
      name: IString::from(name),
      f:    Rc::new(f),
      memo: RefCell::new(IdentityTable::new()),
    }
  }

  pub fn apply(&self, t: &TermPtr) -> AttrResult<U> {
    {
      let memo = self.memo.borrow();
      match memo.get(t) {
        Some(MemoState::Computed(value)) => return Ok(value.clone()),
        Some(MemoState::InProgress) => {
          return Err(AttributeError::Cycle {
            attribute: self.name.to_string(),
            node:      t.to_string(),
          });
        }
        None => {}
      }
    }

    self.memo.borrow_mut().insert(t, MemoState::InProgress);
    match (self.f)(t) {
      Ok(value) => {
        self.memo.borrow_mut().insert(t, MemoState::Computed(value.clone()));
        Ok(value)
      }
      Err(e) => {
        self.memo.borrow_mut().remove(t);
        Err(e)
      }
    }
  }
}

impl<U: Clone + 'static> Attribute<U> for CachedAttribute<U> {
  fn name(&self) -> &IString {
    &self.name
  }

  fn has_been_computed_at(&self, t: &TermPtr) -> bool {
    matches!(self.memo.borrow().get(t), Some(MemoState::Computed(_)))
  }

  fn reset(&self) {
    self.memo.borrow_mut().clear();
  }
}

/// An attribute with the cached interface but no memo table. Every application re-evaluates the
/// defining function; there is no cycle detection.
pub struct UncachedAttribute<U> {
  name: IString,
  f:    Rc<dyn Fn(&TermPtr) -> AttrResult<U>>,
}

impl<U: Clone + 'static> UncachedAttribute<U> {
  pub fn new(name: &str, f: impl Fn(&TermPtr) -> AttrResult<U> + 'static) -> UncachedAttribute<U> {
    UncachedAttribute {
      name: IString::from(name),
      f:    Rc::new(f),
    }
  }

  pub fn apply(&self, t: &TermPtr) -> AttrResult<U> {
    (self.f)(t)
  }
}

impl<U: Clone + 'static> Attribute<U> for UncachedAttribute<U> {
  fn name(&self) -> &IString {
    &self.name
  }

  fn has_been_computed_at(&self, _t: &TermPtr) -> bool {
    false
  }

  fn reset(&self) {}
}
