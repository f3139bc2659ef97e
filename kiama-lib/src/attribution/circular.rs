/*!

Circular attributes: mutually recursive attribute systems solved by fixed-point iteration from
an initial value.

The evaluation protocol needs three flags shared by *every* circular attribute taking part in a
circle: whether a circle is being driven, whether any approximation changed in the current
pass, and whether the driver has stabilised and is making its final marking pass. The flags are
thread-local, so mutually recursive attributes on one thread join a single circle, while
evaluations on other threads are independent.

The first application not already inside a circle becomes the driver: it iterates its node's
definition until no approximation anywhere in the circle changes, then makes one more pass with
the ready flag set so that every occurrence visited at the fixed point is marked computed.
Applications inside the circle contribute one evaluation step per pass and otherwise return the
current approximation. If any evaluation returns an error, all three flags are cleared before
the error propagates.

*/

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use enumflags2::{bitflags, BitFlags};
use kiama_abs::{log::trace, IString};

use crate::{
  attribution::{AttrResult, Attribute},
  term::{IdentityTable, TermPtr},
};

#[bitflags]
#[repr(u8)]
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum CircleFlag {
  /// A circular evaluation is being driven somewhere on this thread.
  InCircle,
  /// Some approximation changed during the current iteration pass.
  Change,
  /// The driver has stabilised; the current pass marks visited occurrences as computed.
  Ready,
}

thread_local! {
  static CIRCLE_FLAGS: Cell<BitFlags<CircleFlag>> = Cell::new(BitFlags::EMPTY);
}

fn flag(f: CircleFlag) -> bool {
  CIRCLE_FLAGS.with(|flags| flags.get().contains(f))
}

fn set_flag(f: CircleFlag) {
  CIRCLE_FLAGS.with(|flags| {
    let mut value = flags.get();
    value.insert(f);
    flags.set(value);
  });
}

fn clear_flag(f: CircleFlag) {
  CIRCLE_FLAGS.with(|flags| {
    let mut value = flags.get();
    value.remove(f);
    flags.set(value);
  });
}

fn clear_all_flags() {
  CIRCLE_FLAGS.with(|flags| flags.set(BitFlags::EMPTY));
}

/// An attribute whose definition may transitively query itself, solved by iterating to a fixed
/// point starting from an initial value. The value type's equality decides stabilisation, so
/// the definition must be monotone under it and bounded by the value domain for the iteration
/// to terminate.
pub struct CircularAttribute<U: Clone + PartialEq> {
  name:     IString,
  init:     U,
  f:        Rc<dyn Fn(&TermPtr) -> AttrResult<U>>,
  values:   RefCell<IdentityTable<U>>,
  computed: RefCell<IdentityTable<()>>,
  visited:  RefCell<IdentityTable<()>>,
}

impl<U: Clone + PartialEq + 'static> CircularAttribute<U> {
  pub fn new(name: &str, init: U, f: impl Fn(&TermPtr) -> AttrResult<U> + 'static) -> CircularAttribute<U> {
    CircularAttribute {
      name:     IString::from(name),
      init,
      f:        Rc::new(f),
      values:   RefCell::new(IdentityTable::new()),
      computed: RefCell::new(IdentityTable::new()),
      visited:  RefCell::new(IdentityTable::new()),
    }
  }

  /// The current approximation at a node, defaulting to the initial value.
  fn value_of(&self, t: &TermPtr) -> U {
    self
        .values
        .borrow()
        .get(t)
        .cloned()
        .unwrap_or_else(|| self.init.clone())
  }

  fn store(&self, t: &TermPtr, value: U) {
    self.values.borrow_mut().insert(t, value);
  }

  pub fn apply(&self, t: &TermPtr) -> AttrResult<U> {
    let result = self.apply_in_circle(t);
    if result.is_err() {
      clear_all_flags();
    }
    result
  }

  fn apply_in_circle(&self, t: &TermPtr) -> AttrResult<U> {
    if self.computed.borrow().contains(t) {
      return Ok(self.value_of(t));
    }

    if !flag(CircleFlag::InCircle) {
      // This occurrence drives the circle: iterate until nothing changes anywhere in it.
      set_flag(CircleFlag::InCircle);
      self.visited.borrow_mut().insert(t, ());
      let mut passes = 0usize;
      loop {
        clear_flag(CircleFlag::Change);
        passes += 1;
        let current = self.value_of(t);
        let next = (self.f)(t)?;
        if current != next {
          set_flag(CircleFlag::Change);
          self.store(t, next);
        }
        if !flag(CircleFlag::Change) {
          break;
        }
      }
      trace!(3, "circular attribute {} stabilised after {} passes", self.name, passes);
      self.computed.borrow_mut().insert(t, ());
      set_flag(CircleFlag::Ready);
      (self.f)(t)?;
      clear_flag(CircleFlag::Ready);
      self.visited.borrow_mut().remove(t);
      clear_flag(CircleFlag::InCircle);
      Ok(self.value_of(t))
    } else if !self.visited.borrow().contains(t) {
      if flag(CircleFlag::Ready) {
        // The fixed point is stable: mark this occurrence final and propagate the marking.
        self.computed.borrow_mut().insert(t, ());
        self.visited.borrow_mut().insert(t, ());
        let value = (self.f)(t)?;
        self.store(t, value.clone());
        self.visited.borrow_mut().remove(t);
        Ok(value)
      } else {
        // One evaluation step within the driver's current pass.
        self.visited.borrow_mut().insert(t, ());
        let current = self.value_of(t);
        let next = (self.f)(t)?;
        self.visited.borrow_mut().remove(t);
        if current == next {
          Ok(current)
        } else {
          set_flag(CircleFlag::Change);
          self.store(t, next.clone());
          Ok(next)
        }
      }
    } else {
      // Already under evaluation in this pass: break the recursion with the current
      // approximation.
      Ok(self.value_of(t))
    }
  }
}

impl<U: Clone + PartialEq + 'static> Attribute<U> for CircularAttribute<U> {
  fn name(&self) -> &IString {
    &self.name
  }

  fn has_been_computed_at(&self, t: &TermPtr) -> bool {
    self.computed.borrow().contains(t)
  }

  fn reset(&self) {
    self.values.borrow_mut().clear();
    self.computed.borrow_mut().clear();
    self.visited.borrow_mut().clear();
  }
}
