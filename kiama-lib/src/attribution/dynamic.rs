/*!

Dynamically extensible attributes: a cached attribute over a base definition, plus an ordered
list of partial definitions. The most recently prepended definition that applies at a node
wins; the base definition is the fallback. Any change to the list resets the memo table, so
subsequent queries observe the new definition.

`block` runs a closure within a dynamic scope: the list is saved on entry and restored on exit,
unwinding included.

*/

use std::cell::RefCell;
use std::rc::Rc;

use kiama_abs::IString;

use crate::{
  attribution::{cached::MemoState, AttrResult, Attribute},
  error::AttributeError,
  term::{IdentityTable, TermPtr},
};

/// A partial definition: `None` where it does not apply.
pub type PartialAttrFn<U> = Rc<dyn Fn(&TermPtr) -> Option<AttrResult<U>>>;

pub struct CachedDynamicAttribute<U> {
  name:      IString,
  base:      Rc<dyn Fn(&TermPtr) -> AttrResult<U>>,
  overrides: RefCell<Vec<PartialAttrFn<U>>>,
  memo:      RefCell<IdentityTable<MemoState<U>>>,
}

impl<U: Clone + 'static> CachedDynamicAttribute<U> {
  pub fn new(name: &str, f: impl Fn(&TermPtr) -> AttrResult<U> + 'static) -> CachedDynamicAttribute<U> {
    CachedDynamicAttribute {
      name:      IString::from(name),
      base:      Rc::new(f),
      overrides: RefCell::new(Vec::new()),
      memo:      RefCell::new(IdentityTable::new()),
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
    match self.evaluate(t) {
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

  /// The first applicable override wins; the base definition is the fallback. The list is
  /// snapshotted so that user code may mutate the attribute while it runs.
  fn evaluate(&self, t: &TermPtr) -> AttrResult<U> {
    let overrides = self.overrides.borrow().clone();
    for g in &overrides {
      if let Some(result) = g(t) {
        return result;
      }
    }
    (self.base)(t)
  }

  /// Prepends a partial definition, giving it the highest precedence, and resets the memo
  /// table.
  pub fn prepend(&self, g: PartialAttrFn<U>) {
    self.overrides.borrow_mut().insert(0, g);
    self.reset();
  }

  /// Removes a previously prepended definition (compared by allocation) and resets the memo
  /// table.
  pub fn remove(&self, g: &PartialAttrFn<U>) {
    self.overrides.borrow_mut().retain(|h| !Rc::ptr_eq(h, g));
    self.reset();
  }

  /// Runs `body` in a dynamic scope: the override list is restored (and the memo table reset)
  /// when the scope exits, even by unwinding.
  pub fn block<R>(&self, body: impl FnOnce() -> R) -> R {
    let _guard = BlockGuard {
      attribute: self,
      saved:     self.overrides.borrow().clone(),
    };
    body()
  }
}

struct BlockGuard<'a, U: Clone + 'static> {
  attribute: &'a CachedDynamicAttribute<U>,
  saved:     Vec<PartialAttrFn<U>>,
}

impl<U: Clone + 'static> Drop for BlockGuard<'_, U> {
  fn drop(&mut self) {
    *self.attribute.overrides.borrow_mut() = std::mem::take(&mut self.saved);
    self.attribute.reset();
  }
}

impl<U: Clone + 'static> Attribute<U> for CachedDynamicAttribute<U> {
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
