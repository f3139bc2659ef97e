/*!

The chain decorator: a pair of mutually defined cached attributes, `in` and `out`, that thread
a value through a tree in textual order. The value enters a node from its previous sibling's
`out` (or its parent's `in` when it is the first child), flows through the node's subtree, and
leaves through the last child's `out` (or straight from `in` at a leaf).

User-supplied partial updates may override either attribute at arbitrary nodes; each update
receives the default computation so it can thread through it. Evaluating the default `in` at
the root, where there is nothing to chain from, is a
[`ChainRootReached`](crate::error::AttributeError::ChainRootReached) error; an update at the
root is how a chain is seeded.

This is the basis of classical data-flow style attributions such as environment passing.

*/

use std::rc::{Rc, Weak};

use crate::{
  attribution::{cached::CachedAttribute, AttrResult, Attribute},
  error::AttributeError,
  term::TermPtr,
  tree::Tree,
};

/// The default computation of a chain side, as passed to updates.
pub type ChainDefault<U> = Rc<dyn Fn(&TermPtr) -> AttrResult<U>>;

/// A partial update: receives the default computation and the node, and returns `None` where
/// it does not apply.
pub type ChainUpdate<U> = Rc<dyn Fn(&ChainDefault<U>, &TermPtr) -> Option<AttrResult<U>>>;

struct ChainInner<U: Clone + 'static> {
  tree:     Rc<Tree>,
  in_attr:  CachedAttribute<U>,
  out_attr: CachedAttribute<U>,
}

/// A chain over a tree. Cheap to clone; clones share the underlying attributes.
pub struct Chain<U: Clone + 'static> {
  inner: Rc<ChainInner<U>>,
}

impl<U: Clone + 'static> Clone for Chain<U> {
  fn clone(&self) -> Chain<U> {
    Chain { inner: self.inner.clone() }
  }
}

impl<U: Clone + 'static> Chain<U> {
  /// The value flowing into `t`.
  pub fn in_of(&self, t: &TermPtr) -> AttrResult<U> {
    self.inner.in_attr.apply(t)
  }

  /// The value flowing out of `t`'s subtree.
  pub fn out_of(&self, t: &TermPtr) -> AttrResult<U> {
    self.inner.out_attr.apply(t)
  }

  pub fn reset(&self) {
    self.inner.in_attr.reset();
    self.inner.out_attr.reset();
  }
}

fn in_default<U: Clone + 'static>(inner: &Rc<ChainInner<U>>, t: &TermPtr) -> AttrResult<U> {
  if let Some(prev) = inner.tree.prev(t)? {
    return inner.out_attr.apply(&prev);
  }
  match inner.tree.parent(t)? {
    Some(parent) => inner.in_attr.apply(&parent),
    None => Err(AttributeError::ChainRootReached { node: t.to_string() }),
  }
}

fn out_default<U: Clone + 'static>(inner: &Rc<ChainInner<U>>, t: &TermPtr) -> AttrResult<U> {
  match inner.tree.last_child(t)? {
    Some(last) => inner.out_attr.apply(&last),
    None => inner.in_attr.apply(t),
  }
}

/// Builds a chain over the given tree with optional updates for each side.
pub fn chain<U: Clone + 'static>(
  tree: &Rc<Tree>,
  in_update: Option<ChainUpdate<U>>,
  out_update: Option<ChainUpdate<U>>,
) -> Chain<U> {
  let inner = Rc::new_cyclic(|me: &Weak<ChainInner<U>>| {
    let in_f = {
      let me = me.clone();
      move |t: &TermPtr| -> AttrResult<U> {
        let inner = me.upgrade().expect("chain attributes cannot outlive the chain");
        if let Some(update) = &in_update {
          let default: ChainDefault<U> = {
            let inner = inner.clone();
            Rc::new(move |n: &TermPtr| in_default(&inner, n))
          };
          if let Some(result) = update(&default, t) {
            return result;
          }
        }
        in_default(&inner, t)
      }
    };

    let out_f = {
      let me = me.clone();
      move |t: &TermPtr| -> AttrResult<U> {
        let inner = me.upgrade().expect("chain attributes cannot outlive the chain");
        if let Some(update) = &out_update {
          let default: ChainDefault<U> = {
            let inner = inner.clone();
            Rc::new(move |n: &TermPtr| out_default(&inner, n))
          };
          if let Some(result) = update(&default, t) {
            return result;
          }
        }
        out_default(&inner, t)
      }
    };

    ChainInner {
      tree:     tree.clone(),
      in_attr:  CachedAttribute::new("chain.in", in_f),
      out_attr: CachedAttribute::new("chain.out", out_f),
    }
  });

  Chain { inner }
}
