use std::cell::Cell;
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};

use kiama_abs::HashMap;

use crate::{
  attribution::{
    attr,
    chain,
    circular,
    dyn_attr,
    param_attr,
    uncached_attr,
    AttrResult,
    Attribute,
    CachedAttribute,
    ChainUpdate,
    CircularAttribute,
    PartialAttrFn,
  },
  error::AttributeError,
  term::{mk_int, mk_str, rec, seq, Term, TermPtr},
  tree::Tree,
};

// region Cached attributes

fn pair(l: TermPtr, r: TermPtr) -> TermPtr {
  rec("Pair", vec![l, r])
}

fn leaf(i: i64) -> TermPtr {
  rec("Leaf", vec![mk_int(i)])
}

fn maximum_of(me: &Weak<CachedAttribute<i64>>, t: &TermPtr) -> AttrResult<i64> {
  if let Some(r) = t.record("Leaf") {
    Ok(r.children[0].as_int().expect("a leaf holds an integer"))
  } else {
    me.upgrade().expect("attribute is alive").apply(t)
  }
}

#[test]
fn cached_attribute_evaluates_once_per_node() {
  let invocations = Rc::new(Cell::new(0));
  let maximum: Rc<CachedAttribute<i64>> = Rc::new_cyclic(|me: &Weak<CachedAttribute<i64>>| {
    let me = me.clone();
    let invocations = invocations.clone();
    CachedAttribute::new("maximum", move |t| {
      invocations.set(invocations.get() + 1);
      let r = t
          .record("Pair")
          .ok_or_else(|| AttributeError::Evaluation(format!("maximum is not defined at {}", t)))?;
      let left = maximum_of(&me, &r.children[0])?;
      let right = maximum_of(&me, &r.children[1])?;
      Ok(left.max(right))
    })
  });

  let root = pair(leaf(3), pair(leaf(1), leaf(10)));
  assert_eq!(maximum.apply(&root).unwrap(), 10);
  assert_eq!(maximum.apply(&root).unwrap(), 10);
  // Once per Pair node, over both queries.
  assert_eq!(invocations.get(), 2);
}

#[test]
fn cached_attribute_detects_a_direct_cycle() {
  let looping: Rc<CachedAttribute<i64>> = Rc::new_cyclic(|me: &Weak<CachedAttribute<i64>>| {
    let me = me.clone();
    CachedAttribute::new("looping", move |t| me.upgrade().expect("attribute is alive").apply(t))
  });

  let node = leaf(1);
  match looping.apply(&node) {
    Err(AttributeError::Cycle { attribute, node: offender }) => {
      assert_eq!(attribute, "looping");
      assert_eq!(offender, "Leaf(1)");
    }
    other => panic!("expected a cycle error, got {:?}", other),
  }
  // The failed evaluation left no partial state behind.
  assert!(!looping.has_been_computed_at(&node));
}

#[test]
fn equal_nodes_have_independent_entries_but_equal_atoms_share_one() {
  let invocations = Rc::new(Cell::new(0));
  let size = {
    let invocations = invocations.clone();
    attr("size", move |t: &TermPtr| {
      invocations.set(invocations.get() + 1);
      Ok(t.arity())
    })
  };

  let x = rec("Num", vec![mk_int(1)]);
  let y = rec("Num", vec![mk_int(1)]);
  assert_eq!(*x, *y);
  size.apply(&x).unwrap();
  size.apply(&y).unwrap();
  size.apply(&x).unwrap();
  assert_eq!(invocations.get(), 2);

  // Atoms are value nodes: equal atoms are one node.
  size.apply(&mk_int(7)).unwrap();
  size.apply(&mk_int(7)).unwrap();
  assert_eq!(invocations.get(), 3);
}

#[test]
fn reset_clears_the_memo_table() {
  let invocations = Rc::new(Cell::new(0));
  let size = {
    let invocations = invocations.clone();
    attr("size", move |t: &TermPtr| {
      invocations.set(invocations.get() + 1);
      Ok(t.arity())
    })
  };

  let node = pair(leaf(1), leaf(2));
  size.apply(&node).unwrap();
  assert!(size.has_been_computed_at(&node));

  size.reset();
  assert!(!size.has_been_computed_at(&node));
  size.apply(&node).unwrap();
  assert_eq!(invocations.get(), 2);
}

#[test]
fn an_error_removes_the_in_progress_marker() {
  let failing = Rc::new(Cell::new(true));
  let touchy = {
    let failing = failing.clone();
    attr("touchy", move |t: &TermPtr| {
      if failing.get() {
        Err(AttributeError::Evaluation("not ready".to_string()))
      } else {
        Ok(t.arity())
      }
    })
  };

  let node = leaf(1);
  assert!(matches!(touchy.apply(&node), Err(AttributeError::Evaluation(_))));
  // A retained in-progress marker would now masquerade as a cycle.
  failing.set(false);
  assert_eq!(touchy.apply(&node).unwrap(), 1);
}

#[test]
fn uncached_attribute_reevaluates_every_time() {
  let invocations = Rc::new(Cell::new(0));
  let ticking = {
    let invocations = invocations.clone();
    uncached_attr("ticking", move |t: &TermPtr| {
      invocations.set(invocations.get() + 1);
      Ok(t.arity())
    })
  };

  let node = leaf(1);
  ticking.apply(&node).unwrap();
  ticking.apply(&node).unwrap();
  assert_eq!(invocations.get(), 2);
  assert!(!ticking.has_been_computed_at(&node));
}

// endregion Cached attributes

// region Parameterised attributes

#[test]
fn param_attribute_caches_per_argument_and_node() {
  let invocations = Rc::new(Cell::new(0));
  let padded = {
    let invocations = invocations.clone();
    param_attr("padded", move |arg: &usize, t: &TermPtr| {
      invocations.set(invocations.get() + 1);
      Ok(t.arity() + arg)
    })
  };

  let x = rec("Num", vec![mk_int(1)]);
  let y = rec("Num", vec![mk_int(1)]);

  assert_eq!(padded.apply(&1, &x).unwrap(), 2);
  assert_eq!(padded.apply(&1, &x).unwrap(), 2);
  assert_eq!(invocations.get(), 1);

  // A different argument, and an equal but distinct node, each get their own entry.
  assert_eq!(padded.apply(&2, &x).unwrap(), 3);
  assert_eq!(padded.apply(&1, &y).unwrap(), 2);
  assert_eq!(invocations.get(), 3);

  assert!(padded.has_been_computed_at(&1, &x));
  padded.reset();
  assert!(!padded.has_been_computed_at(&1, &x));
}

#[test]
fn param_attribute_cycle_message_includes_the_argument() {
  struct Looping {
    attribute: crate::attribution::CachedParamAttribute<usize, i64>,
  }
  let looping = Rc::new_cyclic(|me: &Weak<Looping>| {
    let me = me.clone();
    Looping {
      attribute: param_attr("looping", move |arg: &usize, t: &TermPtr| {
        me.upgrade().expect("attribute is alive").attribute.apply(arg, t)
      }),
    }
  });

  match looping.attribute.apply(&2, &leaf(1)) {
    Err(AttributeError::Cycle { attribute, .. }) => assert_eq!(attribute, "looping(2)"),
    other => panic!("expected a cycle error, got {:?}", other),
  }
}

// endregion Parameterised attributes

// region Dynamic attributes

#[test]
fn dynamic_attribute_prefers_the_most_recent_definition() {
  let describe = dyn_attr("describe", |t: &TermPtr| Ok(t.shape_name()));
  let num = rec("Num", vec![mk_int(1)]);

  assert_eq!(describe.apply(&num).unwrap(), "Num");

  let as_number: PartialAttrFn<String> =
      Rc::new(|t| t.record("Num").map(|_| Ok("number".to_string())));
  describe.prepend(as_number.clone());
  // The memo table was reset, so the new definition is observed.
  assert_eq!(describe.apply(&num).unwrap(), "number");

  let as_shiny: PartialAttrFn<String> =
      Rc::new(|t| t.record("Num").map(|_| Ok("shiny number".to_string())));
  describe.prepend(as_shiny.clone());
  assert_eq!(describe.apply(&num).unwrap(), "shiny number");

  describe.remove(&as_shiny);
  assert_eq!(describe.apply(&num).unwrap(), "number");

  describe.remove(&as_number);
  assert_eq!(describe.apply(&num).unwrap(), "Num");
}

#[test]
fn dynamic_attribute_block_restores_the_definitions() {
  let describe = dyn_attr("describe", |t: &TermPtr| Ok(t.shape_name()));
  let num = rec("Num", vec![mk_int(1)]);

  describe.block(|| {
    let as_number: PartialAttrFn<String> =
        Rc::new(|t| t.record("Num").map(|_| Ok("number".to_string())));
    describe.prepend(as_number);
    assert_eq!(describe.apply(&num).unwrap(), "number");
  });

  // The scope ended; the prepended definition is gone and the cache was reset.
  assert_eq!(describe.apply(&num).unwrap(), "Num");
}

// endregion Dynamic attributes

// region Circular attributes: live-variable dataflow

type VarSet = BTreeSet<String>;

fn vars(names: &[&str]) -> VarSet {
  names.iter().map(|n| n.to_string()).collect()
}

fn asgn(lhs: &str, rhs: &str) -> TermPtr {
  rec("Asgn", vec![mk_str(lhs), mk_str(rhs)])
}

fn while_loop(cond: &str, body: Vec<TermPtr>) -> TermPtr {
  rec("While", vec![mk_str(cond), seq(body)])
}

fn ret(var: &str) -> TermPtr {
  rec("Return", vec![mk_str(var)])
}

/// Variables read by a statement.
fn uses(t: &TermPtr) -> VarSet {
  if let Some(r) = t.record("Asgn") {
    return vars(&[r.children[1].as_str().expect("a variable name")]);
  }
  if let Some(r) = t.record("While") {
    return vars(&[r.children[0].as_str().expect("a variable name")]);
  }
  if let Some(r) = t.record("Return") {
    return vars(&[r.children[0].as_str().expect("a variable name")]);
  }
  VarSet::new()
}

/// Variables written by a statement.
fn defines(t: &TermPtr) -> VarSet {
  if let Some(r) = t.record("Asgn") {
    return vars(&[r.children[0].as_str().expect("a variable name")]);
  }
  VarSet::new()
}

/// The statements control may reach after leaving `t`'s enclosing position.
fn following(tree: &Rc<Tree>, t: &TermPtr) -> Result<Vec<TermPtr>, AttributeError> {
  match tree.parent(t)? {
    None => Ok(Vec::new()),
    Some(parent) => {
      if parent.record("While").is_some() {
        // The end of the loop body re-tests the condition.
        return Ok(vec![parent]);
      }
      if matches!(&*parent, Term::Seq(_)) {
        return match tree.next(t)? {
          Some(next) => Ok(vec![next]),
          None => following(tree, &parent),
        };
      }
      following(tree, &parent)
    }
  }
}

/// Control-flow successors of a statement.
fn succ(tree: &Rc<Tree>, t: &TermPtr) -> Result<Vec<TermPtr>, AttributeError> {
  if t.record("Asgn").is_some() {
    return following(tree, t);
  }
  if t.record("Return").is_some() {
    return Ok(Vec::new());
  }
  if let Some(r) = t.record("While") {
    let mut successors = following(tree, t)?;
    successors.push(r.children[1].clone());
    return Ok(successors);
  }
  if matches!(&**t, Term::Seq(_)) {
    return match tree.first_child(t)? {
      Some(first) => Ok(vec![first]),
      None => following(tree, t),
    };
  }
  Ok(Vec::new())
}

struct Dataflow {
  tree:     Rc<Tree>,
  in_vars:  CircularAttribute<VarSet>,
  out_vars: CircularAttribute<VarSet>,
}

/// `in(s) = uses(s) + (out(s) - defines(s))` and `out(s)` is the union of `in` over the
/// successors of `s`, both starting from the empty set.
fn dataflow(tree: Rc<Tree>) -> Rc<Dataflow> {
  Rc::new_cyclic(|me: &Weak<Dataflow>| {
    let in_f = {
      let me = me.clone();
      move |t: &TermPtr| -> AttrResult<VarSet> {
        let df = me.upgrade().expect("dataflow is alive");
        let defined = defines(t);
        let mut result = uses(t);
        for var in df.out_vars.apply(t)? {
          if !defined.contains(&var) {
            result.insert(var);
          }
        }
        Ok(result)
      }
    };

    let out_f = {
      let me = me.clone();
      move |t: &TermPtr| -> AttrResult<VarSet> {
        let df = me.upgrade().expect("dataflow is alive");
        let mut result = VarSet::new();
        for successor in succ(&df.tree, t)? {
          result.extend(df.in_vars.apply(&successor)?);
        }
        Ok(result)
      }
    };

    Dataflow {
      tree,
      in_vars:  circular("in", VarSet::new(), in_f),
      out_vars: circular("out", VarSet::new(), out_f),
    }
  })
}

#[test]
fn live_variable_analysis_reaches_the_expected_fixed_point() {
  let s1 = asgn("y", "v");
  let s2 = asgn("z", "y");
  let s3 = asgn("x", "v");
  let s411 = asgn("x", "w");
  let s412 = asgn("x", "v");
  let s4 = while_loop("x", vec![s411.clone(), s412.clone()]);
  let s5 = ret("x");
  let root = seq(vec![s1.clone(), s2.clone(), s3.clone(), s4.clone(), s5.clone()]);

  let df = dataflow(Rc::new(Tree::new(root)));

  assert_eq!(df.in_vars.apply(&s1).unwrap(), vars(&["w", "v"]));
  assert_eq!(df.out_vars.apply(&s1).unwrap(), vars(&["y", "w", "v"]));
  assert_eq!(df.in_vars.apply(&s4).unwrap(), vars(&["x", "w", "v"]));
  assert_eq!(df.out_vars.apply(&s412).unwrap(), vars(&["x", "w", "v"]));
  assert_eq!(df.in_vars.apply(&s5).unwrap(), vars(&["x"]));
  assert_eq!(df.out_vars.apply(&s5).unwrap(), VarSet::new());

  // Stabilised values do not change on re-query.
  assert_eq!(df.out_vars.apply(&s412).unwrap(), vars(&["x", "w", "v"]));

  // Resetting one attribute of the circle forgets its values and nothing else.
  df.out_vars.reset();
  assert!(!df.out_vars.has_been_computed_at(&s412));
  assert_eq!(df.out_vars.apply(&s412).unwrap(), vars(&["x", "w", "v"]));
  assert!(df.out_vars.has_been_computed_at(&s412));
}

// endregion Circular attributes: live-variable dataflow

// region Circular attributes: cyclic inheritance

struct Inheritance {
  superclasses: CircularAttribute<BTreeSet<String>>,
}

fn class_decl(name: &str, superclass: &str) -> TermPtr {
  rec("Class", vec![mk_str(name), mk_str(superclass)])
}

fn inheritance(classes: HashMap<String, TermPtr>) -> Rc<Inheritance> {
  Rc::new_cyclic(|me: &Weak<Inheritance>| {
    let me = me.clone();
    Inheritance {
      superclasses: circular("superclasses", BTreeSet::new(), move |t: &TermPtr| {
        let analysis = me.upgrade().expect("analysis is alive");
        let r = t
            .record("Class")
            .ok_or_else(|| AttributeError::Evaluation(format!("not a class: {}", t)))?;
        let superclass = r.children[1].as_str().expect("a class name");
        let mut result = BTreeSet::new();
        if let Some(declaration) = classes.get(superclass) {
          result.insert(superclass.to_string());
          result.extend(analysis.superclasses.apply(declaration)?);
        }
        Ok(result)
      }),
    }
  })
}

#[test]
fn cyclic_inheritance_is_reported_for_every_class_on_the_cycle() {
  let class_a = class_decl("A", "B");
  let class_b = class_decl("B", "A");
  let mut classes = HashMap::new();
  classes.insert("A".to_string(), class_a.clone());
  classes.insert("B".to_string(), class_b.clone());

  let analysis = inheritance(classes);

  let mut errors = Vec::new();
  for (name, declaration) in [("A", &class_a), ("B", &class_b)] {
    let supers = analysis.superclasses.apply(declaration).unwrap();
    if supers.contains(name) {
      errors.push(format!("Cyclic inheritance chain for class {}", name));
    }
  }

  assert_eq!(
    errors,
    vec![
      "Cyclic inheritance chain for class A".to_string(),
      "Cyclic inheritance chain for class B".to_string(),
    ]
  );
}

// endregion Circular attributes: cyclic inheritance

// region Circular attributes: evaluation state

#[test]
fn circular_evaluation_state_is_reset_by_an_error() {
  let failing = Rc::new(Cell::new(true));
  let counting: Rc<CircularAttribute<i64>> = Rc::new_cyclic(|me: &Weak<CircularAttribute<i64>>| {
    let me = me.clone();
    let failing = failing.clone();
    CircularAttribute::new("counting", 0, move |t| {
      if failing.get() {
        return Err(AttributeError::Evaluation("interrupted".to_string()));
      }
      let current = me.upgrade().expect("attribute is alive").apply(t)?;
      Ok((current + 1).min(3))
    })
  });

  let node = leaf(1);
  assert!(matches!(counting.apply(&node), Err(AttributeError::Evaluation(_))));

  // Had the in-circle flag survived the error, this query would return a single
  // iteration step instead of driving the evaluation to its fixed point.
  failing.set(false);
  assert_eq!(counting.apply(&node).unwrap(), 3);
  assert!(counting.has_been_computed_at(&node));
}

// endregion Circular attributes: evaluation state

// region Chain decorator

fn leaf_node() -> TermPtr {
  rec("Leaf", vec![])
}

#[test]
fn chain_threads_a_value_in_textual_order() {
  let root = rec(
    "Node",
    vec![
      leaf_node(),
      rec("Node", vec![leaf_node(), leaf_node()]),
      leaf_node(),
    ],
  );
  let tree = Rc::new(Tree::new(root.clone()));

  // Seed the chain at the root and count leaves as the value flows past them.
  let seed: ChainUpdate<i64> = {
    let tree = tree.clone();
    Rc::new(move |_default, t| match tree.is_root(t) {
      Ok(true) => Some(Ok(0)),
      _ => None,
    })
  };
  let bump: ChainUpdate<i64> =
      Rc::new(|default, t| t.record("Leaf").map(|_| default(t).map(|seen| seen + 1)));

  let counter = chain(&tree, Some(seed), Some(bump));

  assert_eq!(counter.out_of(&root).unwrap(), 4);

  // The value entering the inner node has passed exactly one leaf.
  let inner = tree.children(&root).unwrap()[1].clone();
  assert_eq!(counter.in_of(&inner).unwrap(), 1);
}

#[test]
fn chain_reports_an_unseeded_root() {
  let root = rec("Node", vec![leaf_node()]);
  let tree = Rc::new(Tree::new(root.clone()));
  let unseeded: crate::attribution::Chain<i64> = chain(&tree, None, None);

  match unseeded.in_of(&root) {
    Err(AttributeError::ChainRootReached { .. }) => {}
    other => panic!("expected a chain-root error, got {:?}", other),
  }
}

// endregion Chain decorator
