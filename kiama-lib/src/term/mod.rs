/*!

The universal term model. A `Term` is a node in an expression tree; an expression tree is a term,
and each subexpression is a term. The engines do not know the shapes of user data: everything
they do is phrased through three operations on terms,

 1. `arity`/`children`: deconstruct a term into its ordered sequence of immediate children,
 2. [`dup`]: reconstruct a like-shaped term from replacement children,
 3. [`same`]: decide whether two terms are the same node.

Terms are immutable and shared through `Rc`. Rewriting never mutates in place: new terms are
built by [`dup`], and a traversal that changes nothing returns the original allocation, so
unchanged subtrees are shared between input and output.

Atoms are *value nodes*: two equal atoms are the same node wherever they occur. Every other
shape is a *reference node*, identified by its allocation. [`NodeKey`] reifies this distinction
for the identity-keyed tables used by memoisation and the tree relation.

*/

mod builders;
mod format;
mod identity;
mod rewritable;


use std::{
  collections::hash_map::DefaultHasher,
  hash::{Hash, Hasher},
  rc::Rc,
};

use kiama_abs::{DynHash, IString, SmallVec};
use ordered_float::OrderedFloat;

use crate::error::TermError;

pub use builders::{left, map, mk_bool, mk_float, mk_int, mk_str, none_t, object, rec, right, seq, set, some_t, tuple};
pub use format::{FormatStyle, Formattable};
pub use identity::{IdentityTable, NodeKey};
pub use rewritable::Rewritable;

pub type TermPtr = Rc<Term>;

/// An unboxed leaf value. Atoms are compared structurally everywhere the engines compare nodes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Atom {
  Bool(bool),
  Int(i64),
  Float(OrderedFloat<f64>),
  Str(IString),
}

/// A user-declared record: a tagged, fixed-arity constructor with positional children.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Record {
  pub tag:      IString,
  pub children: SmallVec<[TermPtr; 4]>,
}

impl Record {
  pub fn new(tag: &str, children: impl IntoIterator<Item = TermPtr>) -> Record {
    Record {
      tag:      IString::from(tag),
      children: children.into_iter().collect(),
    }
  }

  /// Does this record carry the given constructor tag?
  #[inline(always)]
  pub fn is(&self, tag: &str) -> bool {
    &*self.tag == tag
  }
}

/// A tree node. The engines treat the six container shapes and records uniformly; `Object` is
/// the escape hatch for user types that implement the [`Rewritable`] capability themselves.
#[derive(Clone)]
pub enum Term {
  /// Value leaf. Arity 0.
  Atom(Atom),
  /// Tagged positional constructor.
  Record(Record),
  /// Ordered sequence; children are the elements in order.
  Seq(Vec<TermPtr>),
  /// Positional product; children are the components.
  Tuple(Vec<TermPtr>),
  /// Ordered key-value entries; children are the entries as two-element tuples.
  Map(Vec<(TermPtr, TermPtr)>),
  /// Unordered collection with stable iteration order and structural deduplication.
  Set(Vec<TermPtr>),
  /// Optional container; the child is the wrapped value, if any.
  Opt(Option<TermPtr>),
  /// Left alternative of an either container.
  Left(TermPtr),
  /// Right alternative of an either container.
  Right(TermPtr),
  /// User-supplied shape.
  Object(Rc<dyn Rewritable>),
}

impl Term {
  /// The number of immediate children.
  pub fn arity(&self) -> usize {
    match self {
      Term::Atom(_) => 0,
      Term::Record(r) => r.children.len(),
      Term::Seq(elements) | Term::Tuple(elements) | Term::Set(elements) => elements.len(),
      Term::Map(entries) => entries.len(),
      Term::Opt(inner) => inner.iter().count(),
      Term::Left(_) | Term::Right(_) => 1,
      Term::Object(object) => object.arity(),
    }
  }

  /// Deconstructs the term into its ordered sequence of immediate children. Map entries
  /// deconstruct to freshly wrapped two-element tuples; the same wrapper instance flows through
  /// a traversal, so identity comparisons against it behave like any other child.
  pub fn children(&self) -> Vec<TermPtr> {
    match self {
      Term::Atom(_) => Vec::new(),
      Term::Record(r) => r.children.to_vec(),
      Term::Seq(elements) | Term::Tuple(elements) | Term::Set(elements) => elements.clone(),
      Term::Map(entries) => {
        entries
            .iter()
            .map(|(k, v)| Rc::new(Term::Tuple(vec![k.clone(), v.clone()])))
            .collect()
      }
      Term::Opt(inner) => inner.iter().cloned().collect(),
      Term::Left(inner) | Term::Right(inner) => vec![inner.clone()],
      Term::Object(object) => object.deconstruct(),
    }
  }

  #[inline(always)]
  pub fn is_leaf(&self) -> bool {
    self.arity() == 0
  }

  /// A short rendering of the constructor alone, used in error messages.
  pub fn shape_name(&self) -> String {
    match self {
      Term::Atom(_) => "an atom".to_string(),
      Term::Record(r) => r.tag.to_string(),
      Term::Seq(_) => "Seq".to_string(),
      Term::Tuple(_) => "Tuple".to_string(),
      Term::Map(_) => "Map".to_string(),
      Term::Set(_) => "Set".to_string(),
      Term::Opt(_) => "Opt".to_string(),
      Term::Left(_) => "Left".to_string(),
      Term::Right(_) => "Right".to_string(),
      Term::Object(object) => object.shape_name().to_string(),
    }
  }

  // region Accessors

  #[inline(always)]
  pub fn as_record(&self) -> Option<&Record> {
    if let Term::Record(r) = self { Some(r) } else { None }
  }

  /// The record, provided it carries the given tag.
  #[inline(always)]
  pub fn record(&self, tag: &str) -> Option<&Record> {
    self.as_record().filter(|r| r.is(tag))
  }

  #[inline(always)]
  pub fn as_atom(&self) -> Option<&Atom> {
    if let Term::Atom(a) = self { Some(a) } else { None }
  }

  #[inline(always)]
  pub fn as_int(&self) -> Option<i64> {
    if let Term::Atom(Atom::Int(i)) = self { Some(*i) } else { None }
  }

  #[inline(always)]
  pub fn as_bool(&self) -> Option<bool> {
    if let Term::Atom(Atom::Bool(b)) = self { Some(*b) } else { None }
  }

  #[inline(always)]
  pub fn as_str(&self) -> Option<&str> {
    if let Term::Atom(Atom::Str(s)) = self { Some(s) } else { None }
  }

  // endregion Accessors
}

/// Reconstructs a term of the same shape as `t` with the given replacement children.
///
/// Fixed-arity shapes (atoms, records, tuples, options, eithers, objects) insist on their
/// arity; sequences, maps, and sets take exactly the element sequence supplied. Map
/// reconstruction requires every child to be a two-element tuple. Set reconstruction
/// deduplicates structurally, keeping the first occurrence order.
///
/// `dup` always allocates; deciding that nothing changed and the original allocation should be
/// returned instead is the traversal's job.
pub fn dup(t: &TermPtr, children: Vec<TermPtr>) -> Result<TermPtr, TermError> {
  let illegal = |expected: usize, supplied: usize| TermError::IllegalArgs {
    shape: t.shape_name(),
    expected,
    supplied,
  };

  match &**t {
    Term::Atom(a) => {
      if !children.is_empty() {
        return Err(illegal(0, children.len()));
      }
      Ok(Rc::new(Term::Atom(a.clone())))
    }

    Term::Record(r) => {
      if children.len() != r.children.len() {
        return Err(illegal(r.children.len(), children.len()));
      }
      Ok(Rc::new(Term::Record(Record {
        tag:      r.tag.clone(),
        children: children.into_iter().collect(),
      })))
    }

    Term::Seq(_) => Ok(Rc::new(Term::Seq(children))),

    Term::Tuple(elements) => {
      if children.len() != elements.len() {
        return Err(illegal(elements.len(), children.len()));
      }
      Ok(Rc::new(Term::Tuple(children)))
    }

    Term::Map(_) => {
      let mut entries = Vec::with_capacity(children.len());
      for child in children {
        match &*child {
          Term::Tuple(pair) if pair.len() == 2 => {
            entries.push((pair[0].clone(), pair[1].clone()));
          }
          _ => {
            return Err(TermError::NotAPair {
              shape: t.shape_name(),
              child: child.to_string(),
            });
          }
        }
      }
      Ok(Rc::new(Term::Map(entries)))
    }

    Term::Set(_) => Ok(Rc::new(Term::Set(dedup_elements(children)))),

    Term::Opt(inner) => {
      let expected = inner.iter().count();
      if children.len() != expected {
        return Err(illegal(expected, children.len()));
      }
      Ok(Rc::new(Term::Opt(children.into_iter().next())))
    }

    Term::Left(_) => {
      if children.len() != 1 {
        return Err(illegal(1, children.len()));
      }
      Ok(Rc::new(Term::Left(children.into_iter().next().expect("one child"))))
    }

    Term::Right(_) => {
      if children.len() != 1 {
        return Err(illegal(1, children.len()));
      }
      Ok(Rc::new(Term::Right(children.into_iter().next().expect("one child"))))
    }

    Term::Object(object) => object.reconstruct(&children),
  }
}

/// Drops structural duplicates, keeping the first occurrence order.
pub(crate) fn dedup_elements(elements: Vec<TermPtr>) -> Vec<TermPtr> {
  let mut out: Vec<TermPtr> = Vec::with_capacity(elements.len());
  for element in elements {
    if !out.iter().any(|existing| **existing == *element) {
      out.push(element);
    }
  }
  out
}

/// The node-identity predicate: structural equality when both terms are atoms, allocation
/// identity otherwise. `same(x, x)` always holds; an atom and a non-atom are never the same.
#[inline]
pub fn same(a: &TermPtr, b: &TermPtr) -> bool {
  if Rc::ptr_eq(a, b) {
    return true;
  }
  match (&**a, &**b) {
    (Term::Atom(x), Term::Atom(y)) => x == y,
    _ => false,
  }
}

// region Structural equality and hashing

impl PartialEq for Term {
  fn eq(&self, other: &Term) -> bool {
    match (self, other) {
      (Term::Atom(a), Term::Atom(b)) => a == b,
      (Term::Record(a), Term::Record(b)) => a == b,
      (Term::Seq(a), Term::Seq(b)) => a == b,
      (Term::Tuple(a), Term::Tuple(b)) => a == b,
      (Term::Map(a), Term::Map(b)) => a == b,
      // Sets compare as sets: element order is iteration order, not meaning.
      (Term::Set(a), Term::Set(b)) => {
        a.len() == b.len() && a.iter().all(|x| b.iter().any(|y| **x == **y))
      }
      (Term::Opt(a), Term::Opt(b)) => a == b,
      (Term::Left(a), Term::Left(b)) => a == b,
      (Term::Right(a), Term::Right(b)) => a == b,
      (Term::Object(a), Term::Object(b)) => a.eq_rewritable(b.as_ref()),
      _ => false,
    }
  }
}

impl Eq for Term {}

impl Hash for Term {
  fn hash<H: Hasher>(&self, state: &mut H) {
    std::mem::discriminant(self).hash(state);
    match self {
      Term::Atom(a) => a.hash(state),
      Term::Record(r) => r.hash(state),
      Term::Seq(elements) | Term::Tuple(elements) => elements.hash(state),
      Term::Map(entries) => entries.hash(state),
      // Order-insensitive combination, in agreement with set equality.
      Term::Set(elements) => {
        let mut combined: u64 = 0;
        for element in elements {
          let mut hasher = DefaultHasher::new();
          element.hash(&mut hasher);
          combined ^= hasher.finish();
        }
        state.write_u64(combined);
      }
      Term::Opt(inner) => inner.hash(state),
      Term::Left(inner) | Term::Right(inner) => inner.hash(state),
      Term::Object(object) => object.dyn_hash(state),
    }
  }
}

// endregion Structural equality and hashing
