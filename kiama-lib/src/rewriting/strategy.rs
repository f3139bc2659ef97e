/*!

Strategies and the engine-independent combinator algebra.

A `Strategy` wraps a total function from a term to an optional replacement term. `None` is
failure; `Some(t')` is success, and a success whose result is [`same`](crate::term::same) as the
input is an unchanged success. Failure is ordinary control flow: it is how guarded choice works,
and no combinator here can panic.

Recursive strategies are tied with [`Strategy::lazily`], which defers construction of the body
until each application. This is what lets a traversal like `topdown(s) = s <* all(topdown(s))`
be written exactly as its defining equation.

*/

use std::cell::RefCell;
use std::rc::Rc;

use kiama_abs::{
  log::{debug as log_debug, info as log_info},
  IString,
};

use crate::term::{IdentityTable, TermPtr};

/// A total function from a term to an optional replacement term, with a display name.
#[derive(Clone)]
pub struct Strategy {
  name: IString,
  f:    Rc<dyn Fn(&TermPtr) -> Option<TermPtr>>,
}

impl Strategy {
  pub fn new(name: &str, f: impl Fn(&TermPtr) -> Option<TermPtr> + 'static) -> Strategy {
    Strategy {
      name: IString::from(name),
      f:    Rc::new(f),
    }
  }

  /// A strategy whose body is built afresh on each application. The indirection is what allows
  /// recursive definitions: the recursive occurrence is not constructed until the strategy is
  /// actually applied at a node.
  pub fn lazily(name: &str, make: impl Fn() -> Strategy + 'static) -> Strategy {
    Strategy::new(name, move |t| make().apply(t))
  }

  /// Applies the strategy. `None` is failure.
  #[inline(always)]
  pub fn apply(&self, t: &TermPtr) -> Option<TermPtr> {
    (self.f)(t)
  }

  #[inline(always)]
  pub fn name(&self) -> &IString {
    &self.name
  }

  pub fn renamed(mut self, name: &str) -> Strategy {
    self.name = IString::from(name);
    self
  }

  // region Combinators

  /// Sequential composition `self <* next`: run `self`; on success, run `next` on the result.
  pub fn then(&self, next: Strategy) -> Strategy {
    let first = self.clone();
    Strategy::new("then", move |t| first.apply(t).and_then(|t1| next.apply(&t1)))
  }

  /// Deterministic choice `self <+ alternative`: run `self`; on failure, run `alternative` on
  /// the original input.
  pub fn or_else(&self, alternative: Strategy) -> Strategy {
    let first = self.clone();
    Strategy::new("or_else", move |t| first.apply(t).or_else(|| alternative.apply(t)))
  }

  /// Non-deterministic choice `self + other`: an [`Alternation`] to be consumed by [`cond`].
  /// Used on its own it behaves like deterministic choice.
  pub fn plus(&self, other: Strategy) -> Alternation {
    Alternation {
      left:  self.clone(),
      right: other,
    }
  }

  /// Conditional choice `self < l + r`: if `self` succeeds with `t'`, apply `l` to `t'`;
  /// if `self` fails, apply `r` to the original input.
  pub fn cond(&self, alternation: Alternation) -> Strategy {
    let condition = self.clone();
    Strategy::new("cond", move |t| match condition.apply(t) {
      Some(t1) => alternation.left.apply(&t1),
      None => alternation.right.apply(t),
    })
  }

  // endregion Combinators
}

/// The pair of branches of a conditional choice, built by [`Strategy::plus`].
#[derive(Clone)]
pub struct Alternation {
  pub(crate) left:  Strategy,
  pub(crate) right: Strategy,
}

impl From<Alternation> for Strategy {
  /// The default semantics of `s + q` outside a conditional is deterministic choice.
  fn from(alternation: Alternation) -> Strategy {
    alternation.left.or_else(alternation.right)
  }
}

// region Base constructors

/// Always succeeds, returning the input unchanged.
pub fn id() -> Strategy {
  Strategy::new("id", |t| Some(t.clone()))
}

/// Always fails.
pub fn fail() -> Strategy {
  Strategy::new("fail", |_| None)
}

/// Lifts a partial function: succeeds with `f`'s result where `f` is defined, fails elsewhere.
pub fn rule(f: impl Fn(&TermPtr) -> Option<TermPtr> + 'static) -> Strategy {
  Strategy::new("rule", f)
}

/// Lifts a total function; the resulting strategy always succeeds.
pub fn rulef(f: impl Fn(&TermPtr) -> TermPtr + 'static) -> Strategy {
  Strategy::new("rulef", move |t| Some(f(t)))
}

/// Lifts a partial function that yields a strategy, which is then applied to the subject term.
pub fn rulefs(f: impl Fn(&TermPtr) -> Option<Strategy> + 'static) -> Strategy {
  Strategy::new("rulefs", move |t| f(t).and_then(|s| s.apply(t)))
}

/// Lifts an option-returning function to a strategy.
pub fn strategy(f: impl Fn(&TermPtr) -> Option<TermPtr> + 'static) -> Strategy {
  Strategy::new("strategy", f)
}

/// Alias of [`strategy`] for functions that are total rather than partial-by-`Option`; the two
/// collapse to the same type in Rust and are kept for surface parity.
pub fn strategyf(f: impl Fn(&TermPtr) -> Option<TermPtr> + 'static) -> Strategy {
  Strategy::new("strategyf", f)
}

/// Always succeeds with the given term, regardless of input.
pub fn build(t: TermPtr) -> Strategy {
  Strategy::new("build", move |_| Some(t.clone()))
}

/// Succeeds iff the input is structurally equal to the given term.
pub fn term(pattern: TermPtr) -> Strategy {
  Strategy::new("term", move |t| if **t == *pattern { Some(t.clone()) } else { None })
}

/// Succeeds with the wrapped term if `Some`, fails if `None`.
pub fn option(o: Option<TermPtr>) -> Strategy {
  Strategy::new("option", move |_| o.clone())
}

/// Runs `f` for its effect and succeeds with the input unchanged.
pub fn query(f: impl Fn(&TermPtr) + 'static) -> Strategy {
  Strategy::new("query", move |t| {
    f(t);
    Some(t.clone())
  })
}

/// Alias of [`query`]; see [`strategyf`].
pub fn queryf(f: impl Fn(&TermPtr) + 'static) -> Strategy {
  query(f).renamed("queryf")
}

// endregion Base constructors

// region Derived combinators

/// Succeeds with the input iff `s` fails.
pub fn not_(s: Strategy) -> Strategy {
  s.cond(fail().plus(id())).renamed("not")
}

/// Succeeds with the *original* input iff `s` succeeds, discarding `s`'s result.
pub fn test(s: Strategy) -> Strategy {
  Strategy::new("test", move |t| s.apply(t).map(|_| t.clone()))
}

/// Synonym of [`test`].
pub fn where_(s: Strategy) -> Strategy {
  test(s).renamed("where")
}

/// `s <+ id`: never fails.
pub fn attempt(s: Strategy) -> Strategy {
  s.or_else(id()).renamed("attempt")
}

/// Applies `s` as many times as possible, ending with success.
pub fn repeat(s: Strategy) -> Strategy {
  let rec = {
    let s = s.clone();
    Strategy::lazily("repeat", move || repeat(s.clone()))
  };
  attempt(s.then(rec)).renamed("repeat")
}

/// Applies `s` at least once, then as often as possible.
pub fn repeat1(s: Strategy) -> Strategy {
  s.then(repeat(s.clone())).renamed("repeat1")
}

/// Applies `s` exactly `n` times.
pub fn repeat_n(s: Strategy, n: usize) -> Strategy {
  if n == 0 {
    id()
  } else {
    let rest = {
      let s = s.clone();
      Strategy::lazily("repeat_n", move || repeat_n(s.clone(), n - 1))
    };
    s.then(rest).renamed("repeat_n")
  }
}

/// Applies `s` one or more times until `c` succeeds on the result.
pub fn repeat_until(s: Strategy, c: Strategy) -> Strategy {
  let rec = {
    let s = s.clone();
    let c = c.clone();
    Strategy::lazily("repeat_until", move || repeat_until(s.clone(), c.clone()))
  };
  s.then(test(c).or_else(rec)).renamed("repeat_until")
}

/// While `c` succeeds, applies `s`.
pub fn loop_(c: Strategy, s: Strategy) -> Strategy {
  let rec = {
    let c = c.clone();
    let s = s.clone();
    Strategy::lazily("loop", move || loop_(c.clone(), s.clone()))
  };
  attempt(test(c).then(s).then(rec)).renamed("loop")
}

/// Applies `s` while `c` fails; `c`'s eventual result ends the loop.
pub fn loop_not(c: Strategy, s: Strategy) -> Strategy {
  let rec = {
    let c = c.clone();
    let s = s.clone();
    Strategy::lazily("loop_not", move || loop_not(c.clone(), s.clone()))
  };
  c.or_else(s.then(rec)).renamed("loop_not")
}

/// Applies `s` once, then behaves like [`loop_`].
pub fn do_loop(s: Strategy, c: Strategy) -> Strategy {
  s.then(loop_(c, s.clone())).renamed("do_loop")
}

/// Initialise with `i`, then loop `s` while `r` succeeds. Never fails.
pub fn loop_iter(i: Strategy, r: Strategy, s: Strategy) -> Strategy {
  attempt(i.then(loop_(r, s))).renamed("loop_iter")
}

/// Sequences `s(low) <* s(low + 1) <* … <* s(high)`.
pub fn loop_iter_range<F>(s: F, low: i64, high: i64) -> Strategy
where
  F: Fn(i64) -> Strategy + Clone + 'static,
{
  if low <= high {
    let rest = {
      let s = s.clone();
      Strategy::lazily("loop_iter_range", move || loop_iter_range(s.clone(), low + 1, high))
    };
    s(low).then(rest).renamed("loop_iter_range")
  } else {
    id()
  }
}

/// If `s` fails, run `rest` (for its effect on the original input) and still fail.
pub fn restore(s: Strategy, rest: Strategy) -> Strategy {
  s.or_else(rest.then(fail())).renamed("restore")
}

/// Run `rest` whether or not `s` succeeds, preserving `s`'s outcome.
pub fn restore_always(s: Strategy, rest: Strategy) -> Strategy {
  s.cond(rest.clone().plus(rest.then(fail()))).renamed("restore_always")
}

/// Like [`restore_always`], but `f` runs as a test, so its result term is discarded.
pub fn lastly(s: Strategy, f: Strategy) -> Strategy {
  s.cond(where_(f.clone()).plus(where_(f).then(fail()))).renamed("lastly")
}

/// Inclusive or: apply `s1` and then try `s2` on its result, or apply `s2` alone.
pub fn ior(s1: Strategy, s2: Strategy) -> Strategy {
  s1.then(attempt(s2.clone())).or_else(s2).renamed("ior")
}

/// Succeeds (with the input unchanged) iff `s1` or `s2` succeeds; both are tried.
pub fn or(s1: Strategy, s2: Strategy) -> Strategy {
  where_(s1)
      .cond(attempt(test(s2.clone())).plus(test(s2)))
      .renamed("or")
}

/// Succeeds (with the input unchanged) iff both `s1` and `s2` succeed.
pub fn and(s1: Strategy, s2: Strategy) -> Strategy {
  where_(s1).cond(test(s2).plus(fail())).renamed("and")
}

// endregion Derived combinators

// region Observation

/// Emits the message and the subject term, then succeeds unchanged.
pub fn debug(msg: &str) -> Strategy {
  let msg = msg.to_string();
  Strategy::new("debug", move |t| {
    log_debug!(1, "{}{}", msg, t);
    Some(t.clone())
  })
}

/// Applies `s`, logging the subject and the outcome either way.
pub fn log(s: Strategy, msg: &str) -> Strategy {
  let msg = msg.to_string();
  Strategy::new("log", move |t| match s.apply(t) {
    Some(result) => {
      log_info!(1, "{}{} succeeded with {}", msg, t, result);
      Some(result)
    }
    None => {
      log_info!(1, "{}{} failed", msg, t);
      None
    }
  })
}

/// Applies `s`, logging only failures.
pub fn logfail(s: Strategy, msg: &str) -> Strategy {
  let msg = msg.to_string();
  Strategy::new("logfail", move |t| match s.apply(t) {
    Some(result) => Some(result),
    None => {
      log_info!(1, "{}{} failed", msg, t);
      None
    }
  })
}

/// Caches `s`'s outcomes, keyed by subject identity. The cache lives as long as the strategy
/// value and pins the subjects it has seen.
pub fn memo(s: Strategy) -> Strategy {
  let cache: RefCell<IdentityTable<Option<TermPtr>>> = RefCell::new(IdentityTable::new());
  Strategy::new("memo", move |t| {
    if let Some(outcome) = cache.borrow().get(t) {
      return outcome.clone();
    }
    let outcome = s.apply(t);
    cache.borrow_mut().insert(t, outcome.clone());
    outcome
  })
}

// endregion Observation
