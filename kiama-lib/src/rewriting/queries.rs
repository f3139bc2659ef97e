/*!

Folds and collection queries over terms. These visit nodes in top-down, left-to-right
deconstruction order, so given a deterministic deconstruction of containers their results are
deterministic sequences.

*/

use std::hash::Hash;

use kiama_abs::HashSet;

use crate::term::TermPtr;

/// Paramorphism: at each node `t` with children `cs`, computes `f(t, map(para(f), cs))`.
pub fn para<U, F>(f: &F, t: &TermPtr) -> U
where
  F: Fn(&TermPtr, Vec<U>) -> U,
{
  let children = t.children().iter().map(|child| para(f, child)).collect();
  f(t, children)
}

/// Folds `combine` over the values `extract` produces at every node, starting from `initial`.
pub fn everything<U, F, G>(initial: U, combine: &G, extract: &F, t: &TermPtr) -> U
where
  F: Fn(&TermPtr) -> Option<U>,
  G: Fn(U, U) -> U,
{
  let mut accumulator = initial;
  if let Some(value) = extract(t) {
    accumulator = combine(accumulator, value);
  }
  for child in t.children() {
    accumulator = everything(accumulator, combine, extract, &child);
  }
  accumulator
}

/// Collects the values `extract` produces at every node into any collection type.
pub fn collect<C, U, F>(extract: &F, t: &TermPtr) -> C
where
  C: FromIterator<U>,
  F: Fn(&TermPtr) -> Option<U>,
{
  let mut out = Vec::new();
  collect_into(extract, t, &mut out);
  out.into_iter().collect()
}

fn collect_into<U, F>(extract: &F, t: &TermPtr, out: &mut Vec<U>)
where
  F: Fn(&TermPtr) -> Option<U>,
{
  if let Some(value) = extract(t) {
    out.push(value);
  }
  for child in t.children() {
    collect_into(extract, &child, out);
  }
}

/// Collects matches in visit order.
pub fn collectl<U, F>(extract: &F, t: &TermPtr) -> Vec<U>
where
  F: Fn(&TermPtr) -> Option<U>,
{
  collect(extract, t)
}

/// Collects distinct matches.
pub fn collects<U, F>(extract: &F, t: &TermPtr) -> HashSet<U>
where
  U: Eq + Hash,
  F: Fn(&TermPtr) -> Option<U>,
{
  collect(extract, t)
}

/// Sums the counts `f` produces at every node.
pub fn count<F>(f: &F, t: &TermPtr) -> i64
where
  F: Fn(&TermPtr) -> Option<i64>,
{
  everything(0, &|a, b| a + b, f, t)
}
