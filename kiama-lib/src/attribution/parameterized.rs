/*!

Parameterised attributes: functions of an argument and a node, cached per `(argument, node)`
pair. The argument compares structurally; the node compares by identity, exactly as in the
plain cached attribute.

*/

use std::cell::RefCell;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

use kiama_abs::{HashMap, IString};

use crate::{
  attribution::{cached::MemoState, AttrResult},
  error::AttributeError,
  term::{NodeKey, TermPtr},
};

/// An entry pins the keyed node so its address stays valid for the table's lifetime.
struct ParamEntry<U> {
  _node: TermPtr,
  state: MemoState<U>,
}

pub struct CachedParamAttribute<A, U>
where
  A: Clone + Eq + Hash + Debug + 'static,
{
  name: IString,
  f:    Rc<dyn Fn(&A, &TermPtr) -> AttrResult<U>>,
  memo: RefCell<HashMap<(A, NodeKey), ParamEntry<U>>>,
}

impl<A, U> CachedParamAttribute<A, U>
where
  A: Clone + Eq + Hash + Debug + 'static,
  U: Clone + 'static,
{
  pub fn new(name: &str, f: impl Fn(&A, &TermPtr) -> AttrResult<U> + 'static) -> CachedParamAttribute<A, U> {
    CachedParamAttribute {
      name: IString::from(name),
      f:    Rc::new(f),
      memo: RefCell::new(HashMap::new()),
    }
  }

  pub fn name(&self) -> &IString {
    &self.name
  }

  pub fn apply(&self, arg: &A, t: &TermPtr) -> AttrResult<U> {
    let key = (arg.clone(), NodeKey::of(t));

    {
      let memo = self.memo.borrow();
      match memo.get(&key).map(|entry| &entry.state) {
        Some(MemoState::Computed(value)) => return Ok(value.clone()),
        Some(MemoState::InProgress) => {
          return Err(AttributeError::Cycle {
            attribute: format!("{}({:?})", self.name, arg),
            node:      t.to_string(),
          });
        }
        None => {}
      }
    }

    self.memo.borrow_mut().insert(
      key.clone(),
      ParamEntry { _node: t.clone(), state: MemoState::InProgress },
    );
    match (self.f)(arg, t) {
      Ok(value) => {
        self.memo.borrow_mut().insert(
          key,
          ParamEntry { _node: t.clone(), state: MemoState::Computed(value.clone()) },
        );
        Ok(value)
      }
      Err(e) => {
        self.memo.borrow_mut().remove(&key);
        Err(e)
      }
    }
  }

  pub fn has_been_computed_at(&self, arg: &A, t: &TermPtr) -> bool {
    let key = (arg.clone(), NodeKey::of(t));
    matches!(
      self.memo.borrow().get(&key).map(|entry| &entry.state),
      Some(MemoState::Computed(_))
    )
  }

  pub fn reset(&self) {
    self.memo.borrow_mut().clear();
  }
}
