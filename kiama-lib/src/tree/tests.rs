use std::rc::Rc;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
  error::AttributeError,
  term::{map, mk_int, mk_str, rec, same, seq, set, tuple, TermPtr},
  tree::{Tree, TreeShape, ROOT_INDEX},
};

fn num(i: i64) -> TermPtr {
  rec("Num", vec![mk_int(i)])
}

/// `Pair(Add(Num(1), Num(2)), Num(3))`
fn sample() -> TermPtr {
  rec("Pair", vec![rec("Add", vec![num(1), num(2)]), num(3)])
}

#[test]
fn root_relations() {
  let root = sample();
  let tree = Tree::new(root.clone());

  assert!(tree.is_root(&root).unwrap());
  assert_eq!(tree.parent(&root).unwrap(), None);
  assert_eq!(tree.index(&root).unwrap(), ROOT_INDEX);
  assert_eq!(tree.prev(&root).unwrap(), None);
  assert_eq!(tree.next(&root).unwrap(), None);

  let siblings = tree.siblings(&root).unwrap();
  assert_eq!(siblings.len(), 1);
  assert!(Rc::ptr_eq(&siblings[0], &root));
}

#[test]
fn child_relations() {
  let root = sample();
  let tree = Tree::new(root.clone());

  let children = tree.children(&root).unwrap();
  assert_eq!(children.len(), 2);
  let add = children[0].clone();
  let three = children[1].clone();

  assert!(Rc::ptr_eq(&tree.parent(&add).unwrap().unwrap(), &root));
  assert_eq!(tree.index(&add).unwrap(), 0);
  assert_eq!(tree.index(&three).unwrap(), 1);

  assert!(tree.is_first(&add).unwrap());
  assert!(!tree.is_last(&add).unwrap());
  assert!(tree.is_last(&three).unwrap());

  assert!(Rc::ptr_eq(&tree.next(&add).unwrap().unwrap(), &three));
  assert!(Rc::ptr_eq(&tree.prev(&three).unwrap().unwrap(), &add));

  assert!(Rc::ptr_eq(&tree.first_child(&root).unwrap().unwrap(), &add));
  assert!(Rc::ptr_eq(&tree.last_child(&root).unwrap().unwrap(), &three));
  assert!(Rc::ptr_eq(&tree.child(&root, 0).unwrap().unwrap(), &add));
  assert_eq!(tree.child(&root, 5).unwrap(), None);

  assert!(!tree.is_leaf(&add).unwrap());
  let one_atom = tree.children(&tree.children(&add).unwrap()[0]).unwrap()[0].clone();
  assert!(tree.is_leaf(&one_atom).unwrap());
}

#[test]
fn unrecorded_nodes_are_not_in_the_tree() {
  let root = sample();
  let tree = Tree::new(root);

  let stranger = num(42);
  match tree.parent(&stranger) {
    Err(AttributeError::NodeNotInTree { node }) => assert_eq!(node, "Num(42)"),
    other => panic!("expected NodeNotInTree, got {:?}", other),
  }
  assert!(!tree.contains(&stranger));
}

#[test]
fn first_visited_position_of_a_shared_node_is_canonical() {
  let shared = num(1);
  let left = rec("L", vec![shared.clone()]);
  let right = rec("R", vec![shared.clone()]);
  let root = rec("Pair", vec![left.clone(), right.clone()]);

  let tree = Tree::new(root);
  // The second position was not re-recorded: the parent is the first one visited.
  assert!(Rc::ptr_eq(&tree.parent(&shared).unwrap().unwrap(), &left));
  assert_eq!(tree.index(&shared).unwrap(), 0);
}

#[test]
fn check_tree_rejects_shared_reference_nodes() {
  let shared = num(1);
  let root = rec("Pair", vec![shared.clone(), shared]);
  assert!(Tree::with_shape(root, TreeShape::CheckTree).is_err());

  let proper = sample();
  assert!(Tree::with_shape(proper, TreeShape::CheckTree).is_ok());
}

#[test]
fn check_tree_accepts_equal_atoms() {
  // Equal atoms are one value node wherever they occur; that is not sharing.
  let root = seq(vec![mk_int(1), mk_int(1)]);
  assert!(Tree::with_shape(root, TreeShape::CheckTree).is_ok());
}

#[test]
fn ensure_tree_clones_shared_subtrees() {
  let shared = rec("Add", vec![num(1), num(2)]);
  let root = rec("Pair", vec![shared.clone(), shared.clone()]);

  let tree = Tree::with_shape(root.clone(), TreeShape::EnsureTree).unwrap();
  // Structure is preserved...
  assert_eq!(**tree.root(), *root);
  // ...but the two positions are now distinct nodes, each with its own parent entry.
  let children = tree.children(tree.root()).unwrap();
  assert!(!Rc::ptr_eq(&children[0], &children[1]));
  assert!(Rc::ptr_eq(&tree.parent(&children[0]).unwrap().unwrap(), tree.root()));
  assert!(Rc::ptr_eq(&tree.parent(&children[1]).unwrap().unwrap(), tree.root()));
}

#[test]
fn map_entries_are_nodes_of_the_tree() {
  let root = map(vec![(mk_str("a"), mk_int(1))]);
  let tree = Tree::new(root.clone());

  let entries = tree.children(&root).unwrap();
  assert_eq!(entries.len(), 1);
  assert!(Rc::ptr_eq(&tree.parent(&entries[0]).unwrap().unwrap(), &root));

  // A wrapper from a later, separate deconstruction is a different node.
  let fresh_wrapper = root.children()[0].clone();
  assert!(matches!(
    tree.parent(&fresh_wrapper),
    Err(AttributeError::NodeNotInTree { .. })
  ));
}

#[test]
fn nodes_enumerates_in_preorder() {
  let root = sample();
  let tree = Tree::new(root.clone());

  let nodes = tree.nodes();
  assert!(Rc::ptr_eq(&nodes[0], &root));
  // Pair, Add, Num(1), 1, Num(2), 2, Num(3), 3.
  assert_eq!(nodes.len(), 8);
}

// region Randomised relation consistency

fn random_tree(rng: &mut StdRng, depth: usize) -> TermPtr {
  if depth == 0 || rng.gen_range(0..4) == 0 {
    return mk_int(rng.gen_range(0..100));
  }
  let arity = rng.gen_range(1..=3);
  let children: Vec<TermPtr> = (0..arity).map(|_| random_tree(rng, depth - 1)).collect();
  match rng.gen_range(0..4) {
    0 => rec("Node", children),
    1 => seq(children),
    2 => tuple(children),
    _ => set(children),
  }
}

fn assert_relations_consistent(tree: &Tree) {
  for node in tree.nodes().to_vec() {
    if tree.is_root(&node).unwrap() {
      assert_eq!(tree.parent(&node).unwrap(), None);
      assert_eq!(tree.index(&node).unwrap(), ROOT_INDEX);
      continue;
    }

    let parent = tree.parent(&node).unwrap().expect("non-root nodes have a parent");
    let index = tree.index(&node).unwrap();
    assert!(index >= 0);
    let index = index as usize;

    let siblings = tree.siblings(&node).unwrap();
    let parent_children = tree.children(&parent).unwrap();
    assert_eq!(siblings.len(), parent_children.len());
    for (sibling, child) in siblings.iter().zip(parent_children.iter()) {
      assert!(same(sibling, child));
    }

    // The node sits at its recorded index, and prev/next are its neighbours there.
    assert!(same(&parent_children[index], &node));
    match tree.prev(&node).unwrap() {
      Some(prev) => assert!(same(&prev, &parent_children[index - 1])),
      None => assert_eq!(index, 0),
    }
    match tree.next(&node).unwrap() {
      Some(next) => assert!(same(&next, &parent_children[index + 1])),
      None => assert_eq!(index, parent_children.len() - 1),
    }
  }
}

#[test]
fn random_trees_have_consistent_relations() {
  let mut rng = StdRng::seed_from_u64(0xfeed);
  for _ in 0..50 {
    let root = random_tree(&mut rng, 4);
    let tree = Tree::new(root);
    assert_relations_consistent(&tree);
  }
}

// endregion Randomised relation consistency
