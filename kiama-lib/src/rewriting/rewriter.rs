/*!

The rewriting engine: one-level traversal primitives and the full-tree traversals derived from
them, all as methods of a `Rewriter` so that the engine's single extension point, the
`rewriting(old, new)` callback, threads through every reconstruction.

The primitives obey one invariant throughout: when every rewritten child is
[`same`](crate::term::same) as its original, the original term is returned by allocation, and
reconstruction is never invoked. Unchanged subtrees are therefore shared between the input and
the result of any traversal.

Reconstruction failure inside a traversal (a rewrite produced children the subject shape cannot
accept, e.g. a map entry that is no longer a pair) is a programmer contract violation and
panics; everything else is strategy failure, which is ordinary control flow.

*/

use std::rc::Rc;

use crate::{
  rewriting::strategy::{attempt, fail, repeat, rulef, Strategy},
  term::{dup, same, Term, TermPtr},
};

/// The per-engine callback invoked as `hook(old, new)` after every reconstruction that produced
/// a new node. Metadata-copying rewriters (e.g. source-position preservation) install one.
pub type RewriteHook = Rc<dyn Fn(&TermPtr, &TermPtr)>;

/// A function from the self-recursion of a traversal to a strategy. Stoppable traversals use it
/// to short-circuit recursion where its strategy succeeds; [`leaves`](Rewriter::leaves_skip)
/// uses it to route the descent.
pub type StopFn = Rc<dyn Fn(Strategy) -> Strategy>;

/// The unit of [`StopFn`] composition: never stops.
pub fn dontstop() -> StopFn {
  Rc::new(|_| fail())
}

/// The strategy engine. Cheap to clone; clones share the callback.
#[derive(Clone, Default)]
pub struct Rewriter {
  hook: Option<RewriteHook>,
}

impl Rewriter {
  pub fn new() -> Rewriter {
    Rewriter { hook: None }
  }

  /// An engine whose `rewriting(old, new)` callback is invoked on every successful per-node
  /// replacement.
  pub fn with_rewriting(hook: impl Fn(&TermPtr, &TermPtr) + 'static) -> Rewriter {
    Rewriter { hook: Some(Rc::new(hook)) }
  }

  /// Applies `s` to `t`, returning `t` itself if `s` fails.
  pub fn rewrite(&self, s: &Strategy, t: &TermPtr) -> TermPtr {
    s.apply(t).unwrap_or_else(|| t.clone())
  }

  /// Reconstructs `t` with the given children and runs the callback. Panics on a reconstruction
  /// contract violation.
  fn rebuild(&self, t: &TermPtr, children: Vec<TermPtr>) -> TermPtr {
    match dup(t, children) {
      Ok(new_term) => {
        if let Some(hook) = &self.hook {
          hook(t, &new_term);
        }
        new_term
      }
      Err(e) => panic!("{}", e),
    }
  }

  // region One-level traversal primitives

  /// Applies `s` to every child; fails if any child fails. Succeeds with `t` unchanged when
  /// there are no children or nothing changed.
  pub fn all(&self, s: Strategy) -> Strategy {
    let engine = self.clone();
    Strategy::new("all", move |t| {
      let children = t.children();
      if children.is_empty() {
        return Some(t.clone());
      }
      let mut new_children = Vec::with_capacity(children.len());
      let mut changed = false;
      for child in &children {
        let new_child = s.apply(child)?;
        changed = changed || !same(&new_child, child);
        new_children.push(new_child);
      }
      if changed {
        Some(engine.rebuild(t, new_children))
      } else {
        Some(t.clone())
      }
    })
  }

  /// Applies `s` to the children left to right until it succeeds, replacing only that child.
  /// Fails when every child fails or there are no children.
  pub fn one(&self, s: Strategy) -> Strategy {
    let engine = self.clone();
    Strategy::new("one", move |t| {
      let children = t.children();
      for (i, child) in children.iter().enumerate() {
        if let Some(new_child) = s.apply(child) {
          if same(&new_child, child) {
            return Some(t.clone());
          }
          let mut new_children = children.clone();
          new_children[i] = new_child;
          return Some(engine.rebuild(t, new_children));
        }
      }
      None
    })
  }

  /// Applies `s` to every child, keeping originals where it fails. Succeeds iff at least one
  /// child succeeded; fails when there are no children.
  pub fn some(&self, s: Strategy) -> Strategy {
    let engine = self.clone();
    Strategy::new("some", move |t| {
      let children = t.children();
      let mut new_children = Vec::with_capacity(children.len());
      let mut succeeded = false;
      let mut changed = false;
      for child in &children {
        match s.apply(child) {
          Some(new_child) => {
            succeeded = true;
            changed = changed || !same(&new_child, child);
            new_children.push(new_child);
          }
          None => new_children.push(child.clone()),
        }
      }
      if !succeeded {
        return None;
      }
      if changed {
        Some(engine.rebuild(t, new_children))
      } else {
        Some(t.clone())
      }
    })
  }

  /// Applies `s` to child `i` only, counting from one. Fails if `i` is out of range or `s`
  /// fails there.
  pub fn child(&self, i: usize, s: Strategy) -> Strategy {
    let engine = self.clone();
    Strategy::new("child", move |t| {
      let children = t.children();
      if i < 1 || i > children.len() {
        return None;
      }
      let index = i - 1;
      let new_child = s.apply(&children[index])?;
      if same(&new_child, &children[index]) {
        return Some(t.clone());
      }
      let mut new_children = children.clone();
      new_children[index] = new_child;
      Some(engine.rebuild(t, new_children))
    })
  }

  /// Applies `ss[j]` to child `j` of a product-shaped term (record, tuple, or object). Fails on
  /// other shapes, on arity mismatch, and when any sub-strategy fails.
  pub fn congruence(&self, ss: Vec<Strategy>) -> Strategy {
    let engine = self.clone();
    Strategy::new("congruence", move |t| {
      if !matches!(&**t, Term::Record(_) | Term::Tuple(_) | Term::Object(_)) {
        return None;
      }
      let children = t.children();
      if children.len() != ss.len() {
        return None;
      }
      let mut new_children = Vec::with_capacity(children.len());
      let mut changed = false;
      for (child, s) in children.iter().zip(ss.iter()) {
        let new_child = s.apply(child)?;
        changed = changed || !same(&new_child, child);
        new_children.push(new_child);
      }
      if changed {
        Some(engine.rebuild(t, new_children))
      } else {
        Some(t.clone())
      }
    })
  }

  // endregion One-level traversal primitives

  // region Full-tree traversals

  /// `topdown(s) = s <* all(topdown(s))`
  pub fn topdown(&self, s: Strategy) -> Strategy {
    let engine = self.clone();
    let rec = {
      let engine = engine.clone();
      let s = s.clone();
      Strategy::lazily("topdown", move || engine.topdown(s.clone()))
    };
    s.then(engine.all(rec)).renamed("topdown")
  }

  /// `bottomup(s) = all(bottomup(s)) <* s`
  pub fn bottomup(&self, s: Strategy) -> Strategy {
    let engine = self.clone();
    let rec = {
      let engine = engine.clone();
      let s = s.clone();
      Strategy::lazily("bottomup", move || engine.bottomup(s.clone()))
    };
    engine.all(rec).then(s).renamed("bottomup")
  }

  /// `downup(s) = s <* all(downup(s)) <* s`
  pub fn downup(&self, s: Strategy) -> Strategy {
    let engine = self.clone();
    let rec = {
      let engine = engine.clone();
      let s = s.clone();
      Strategy::lazily("downup", move || engine.downup(s.clone()))
    };
    s.then(engine.all(rec)).then(s.clone()).renamed("downup")
  }

  /// `downup2(s1, s2) = s1 <* all(downup2(s1, s2)) <* s2`
  pub fn downup2(&self, s1: Strategy, s2: Strategy) -> Strategy {
    let engine = self.clone();
    let rec = {
      let engine = engine.clone();
      let s1 = s1.clone();
      let s2 = s2.clone();
      Strategy::lazily("downup2", move || engine.downup2(s1.clone(), s2.clone()))
    };
    s1.then(engine.all(rec)).then(s2).renamed("downup2")
  }

  /// `oncetd(s) = s <+ one(oncetd(s))`
  pub fn oncetd(&self, s: Strategy) -> Strategy {
    let engine = self.clone();
    let rec = {
      let engine = engine.clone();
      let s = s.clone();
      Strategy::lazily("oncetd", move || engine.oncetd(s.clone()))
    };
    s.or_else(engine.one(rec)).renamed("oncetd")
  }

  /// `oncebu(s) = one(oncebu(s)) <+ s`
  pub fn oncebu(&self, s: Strategy) -> Strategy {
    let engine = self.clone();
    let rec = {
      let engine = engine.clone();
      let s = s.clone();
      Strategy::lazily("oncebu", move || engine.oncebu(s.clone()))
    };
    engine.one(rec).or_else(s).renamed("oncebu")
  }

  /// `sometd(s) = s <+ some(sometd(s))`
  pub fn sometd(&self, s: Strategy) -> Strategy {
    let engine = self.clone();
    let rec = {
      let engine = engine.clone();
      let s = s.clone();
      Strategy::lazily("sometd", move || engine.sometd(s.clone()))
    };
    s.or_else(engine.some(rec)).renamed("sometd")
  }

  /// `somebu(s) = some(somebu(s)) <+ s`
  pub fn somebu(&self, s: Strategy) -> Strategy {
    let engine = self.clone();
    let rec = {
      let engine = engine.clone();
      let s = s.clone();
      Strategy::lazily("somebu", move || engine.somebu(s.clone()))
    };
    engine.some(rec).or_else(s).renamed("somebu")
  }

  /// `alltd(s) = s <+ all(alltd(s))`: apply `s` to the outermost terms where it applies.
  pub fn alltd(&self, s: Strategy) -> Strategy {
    let engine = self.clone();
    let rec = {
      let engine = engine.clone();
      let s = s.clone();
      Strategy::lazily("alltd", move || engine.alltd(s.clone()))
    };
    s.or_else(engine.all(rec)).renamed("alltd")
  }

  /// `allbu(s) = all(allbu(s)) <* s`: rewrite every level from the leaves up, requiring `s` to
  /// succeed at every node.
  pub fn allbu(&self, s: Strategy) -> Strategy {
    let engine = self.clone();
    let rec = {
      let engine = engine.clone();
      let s = s.clone();
      Strategy::lazily("allbu", move || engine.allbu(s.clone()))
    };
    engine.all(rec).then(s).renamed("allbu")
  }

  /// `manytd(s) = s <* all(attempt(manytd(s))) <+ some(manytd(s))`
  pub fn manytd(&self, s: Strategy) -> Strategy {
    let engine = self.clone();
    let rec = {
      let engine = engine.clone();
      let s = s.clone();
      Strategy::lazily("manytd", move || engine.manytd(s.clone()))
    };
    s.then(engine.all(attempt(rec.clone())))
        .or_else(engine.some(rec))
        .renamed("manytd")
  }

  /// `manybu(s) = some(manybu(s)) <* attempt(s) <+ s`
  pub fn manybu(&self, s: Strategy) -> Strategy {
    let engine = self.clone();
    let rec = {
      let engine = engine.clone();
      let s = s.clone();
      Strategy::lazily("manybu", move || engine.manybu(s.clone()))
    };
    engine
        .some(rec)
        .then(attempt(s.clone()))
        .or_else(s)
        .renamed("manybu")
  }

  /// `innermost(s) = bottomup(attempt(s <* innermost(s)))`: exhaustively apply `s`, starting
  /// with the innermost redexes.
  pub fn innermost(&self, s: Strategy) -> Strategy {
    let engine = self.clone();
    let rec = {
      let engine = engine.clone();
      let s = s.clone();
      Strategy::lazily("innermost", move || engine.innermost(s.clone()))
    };
    engine.bottomup(attempt(s.then(rec))).renamed("innermost")
  }

  /// `outermost(s) = repeat(oncetd(s))`
  pub fn outermost(&self, s: Strategy) -> Strategy {
    repeat(self.oncetd(s)).renamed("outermost")
  }

  /// `everywheretd(s) = topdown(attempt(s))`
  pub fn everywheretd(&self, s: Strategy) -> Strategy {
    self.topdown(attempt(s)).renamed("everywheretd")
  }

  /// `everywherebu(s) = bottomup(attempt(s))`
  pub fn everywherebu(&self, s: Strategy) -> Strategy {
    self.bottomup(attempt(s)).renamed("everywherebu")
  }

  /// Synonym of [`everywheretd`](Rewriter::everywheretd).
  pub fn everywhere(&self, s: Strategy) -> Strategy {
    self.everywheretd(s).renamed("everywhere")
  }

  /// `breadthfirst(s) = all(s) <* all(breadthfirst(s))`
  pub fn breadthfirst(&self, s: Strategy) -> Strategy {
    let engine = self.clone();
    let rec = {
      let engine = engine.clone();
      let s = s.clone();
      Strategy::lazily("breadthfirst", move || engine.breadthfirst(s.clone()))
    };
    engine.all(s).then(engine.all(rec)).renamed("breadthfirst")
  }

  /// `leaves(s, isleaf) = (isleaf <* s) <+ all(leaves(s, isleaf))`: apply `s` at the nodes
  /// `isleaf` accepts, descending everywhere else.
  pub fn leaves(&self, s: Strategy, isleaf: Strategy) -> Strategy {
    let engine = self.clone();
    let rec = {
      let engine = engine.clone();
      let s = s.clone();
      let isleaf = isleaf.clone();
      Strategy::lazily("leaves", move || engine.leaves(s.clone(), isleaf.clone()))
    };
    isleaf.then(s).or_else(engine.all(rec)).renamed("leaves")
  }

  /// Like [`leaves`](Rewriter::leaves), but `skip` can reroute the descent at interior nodes
  /// before the generic `all` descent is tried.
  pub fn leaves_skip(&self, s: Strategy, isleaf: Strategy, skip: StopFn) -> Strategy {
    let engine = self.clone();
    let rec = {
      let engine = engine.clone();
      let s = s.clone();
      let isleaf = isleaf.clone();
      let skip = skip.clone();
      Strategy::lazily("leaves_skip", move || {
        engine.leaves_skip(s.clone(), isleaf.clone(), skip.clone())
      })
    };
    isleaf
        .then(s)
        .or_else(skip(rec.clone()).or_else(engine.all(rec)))
        .renamed("leaves_skip")
  }

  /// `topdown_s(s, stop) = s <* (stop(self) <+ all(topdown_s(s, stop)))`
  pub fn topdown_s(&self, s: Strategy, stop: StopFn) -> Strategy {
    let engine = self.clone();
    let rec = {
      let engine = engine.clone();
      let s = s.clone();
      let stop = stop.clone();
      Strategy::lazily("topdown_s", move || engine.topdown_s(s.clone(), stop.clone()))
    };
    s.then(stop(rec.clone()).or_else(engine.all(rec))).renamed("topdown_s")
  }

  /// `bottomup_s(s, stop) = (stop(self) <+ all(bottomup_s(s, stop))) <* s`
  pub fn bottomup_s(&self, s: Strategy, stop: StopFn) -> Strategy {
    let engine = self.clone();
    let rec = {
      let engine = engine.clone();
      let s = s.clone();
      let stop = stop.clone();
      Strategy::lazily("bottomup_s", move || engine.bottomup_s(s.clone(), stop.clone()))
    };
    stop(rec.clone())
        .or_else(engine.all(rec))
        .then(s)
        .renamed("bottomup_s")
  }

  /// `downup_s(s, stop) = s <* (stop(self) <+ (all(downup_s(s, stop)) <* s))`
  pub fn downup_s(&self, s: Strategy, stop: StopFn) -> Strategy {
    let engine = self.clone();
    let rec = {
      let engine = engine.clone();
      let s = s.clone();
      let stop = stop.clone();
      Strategy::lazily("downup_s", move || engine.downup_s(s.clone(), stop.clone()))
    };
    s.then(stop(rec.clone()).or_else(engine.all(rec).then(s.clone())))
        .renamed("downup_s")
  }

  // endregion Full-tree traversals

  /// Rebuilds the term with fresh allocations at every reference node. The result is
  /// structurally equal to the input, but no reference node is shared with it, so positions
  /// that shared a node in the input are distinct nodes in the result.
  pub fn deep_clone(&self, t: &TermPtr) -> TermPtr {
    let copy = rulef(|t| Rc::new((**t).clone()));
    self
        .everywherebu(copy)
        .apply(t)
        .expect("everywherebu never fails")
  }
}
