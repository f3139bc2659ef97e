/*!

The attribute engine: named, memoised functions from tree nodes to values.

Every attribute kind shares the same lifecycle: it is created once, applied to many nodes, and
`reset()` clears all memo state. Memoisation keys nodes by identity (atoms by value), so two
equal-but-distinct nodes have independent entries. A definition that transitively requests its
own value at the same node is a [`AttributeError::Cycle`]; mutually recursive definitions that
are *meant* to be solved by fixed-point iteration are declared [`circular`] instead.

*/

pub mod cached;
pub mod chain;
pub mod circular;
pub mod dynamic;
pub mod parameterized;

#[cfg(test)]
mod tests;

use kiama_abs::IString;

use crate::{error::AttributeError, term::TermPtr};

pub use cached::{CachedAttribute, UncachedAttribute};
pub use chain::{chain, Chain, ChainDefault, ChainUpdate};
pub use circular::CircularAttribute;
pub use dynamic::{CachedDynamicAttribute, PartialAttrFn};
pub use parameterized::CachedParamAttribute;

pub type AttrResult<U> = Result<U, AttributeError>;

/// The interface shared by node-keyed attributes. (Parameterised attributes key by argument and
/// node, so their equivalents take the argument as well.)
pub trait Attribute<U> {
  /// The name used in cycle error messages.
  fn name(&self) -> &IString;

  /// Has a final value been cached for this node since the last reset?
  fn has_been_computed_at(&self, t: &TermPtr) -> bool;

  /// Clears all memo state.
  fn reset(&self);
}

// region Constructors

/// Defines a cached attribute.
pub fn attr<U, F>(name: &str, f: F) -> CachedAttribute<U>
where
  U: Clone + 'static,
  F: Fn(&TermPtr) -> AttrResult<U> + 'static,
{
  CachedAttribute::new(name, f)
}

/// Defines an attribute that re-evaluates on every application: no memoisation, no cycle
/// detection.
pub fn uncached_attr<U, F>(name: &str, f: F) -> UncachedAttribute<U>
where
  U: Clone + 'static,
  F: Fn(&TermPtr) -> AttrResult<U> + 'static,
{
  UncachedAttribute::new(name, f)
}

/// Defines a parameterised attribute, cached per `(argument, node)` pair.
pub fn param_attr<A, U, F>(name: &str, f: F) -> CachedParamAttribute<A, U>
where
  A: Clone + Eq + std::hash::Hash + std::fmt::Debug + 'static,
  U: Clone + 'static,
  F: Fn(&A, &TermPtr) -> AttrResult<U> + 'static,
{
  CachedParamAttribute::new(name, f)
}

/// Defines a dynamic attribute: a cached attribute whose definition can be extended with
/// partial definitions within a dynamic scope.
pub fn dyn_attr<U, F>(name: &str, f: F) -> CachedDynamicAttribute<U>
where
  U: Clone + 'static,
  F: Fn(&TermPtr) -> AttrResult<U> + 'static,
{
  CachedDynamicAttribute::new(name, f)
}

/// Defines a circular attribute, solved by fixed-point iteration from `initial`.
pub fn circular<U, F>(name: &str, initial: U, f: F) -> CircularAttribute<U>
where
  U: Clone + PartialEq + 'static,
  F: Fn(&TermPtr) -> AttrResult<U> + 'static,
{
  CircularAttribute::new(name, initial, f)
}

// endregion Constructors
