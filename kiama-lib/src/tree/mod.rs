/*!

Tree relations: the structural attributes of a term, materialised by a single initialisation
pass from a root.

`Tree::new(root)` visits every node reachable from the root, recording each node's parent, its
index among its parent's children, and the node's own child list as deconstructed at that
moment. Fixing the deconstruction has two consequences: set and map iteration order is stable
for the tree's lifetime, and structural queries answer about *these* child nodes. A map entry
wrapper obtained from a later, separate deconstruction is a different node and is not in the
tree.

Sharing policy is explicit at construction time via [`TreeShape`]. Value atoms are inherently
shared: every occurrence of an equal atom is the same node, so the first-visited position is
canonical and no policy treats atom sharing as an error. For reference nodes, the default
`LeaveAlone` policy likewise keeps the first-visited position canonical and does not re-record
later positions; `CheckTree` rejects such sharing; `EnsureTree` replaces shared subtrees with
deep clones before the relation is built.

Queries on nodes the pass never recorded fail with
[`NodeNotInTree`](crate::error::AttributeError::NodeNotInTree).

*/

#[cfg(test)]
mod tests;

use once_cell::unsync::OnceCell;

use crate::{
  error::{AttributeError, TreeError},
  rewriting::Rewriter,
  term::{dup, same, IdentityTable, Term, TermPtr},
};

/// The index sentinel recorded for the root, which has no position among siblings.
pub const ROOT_INDEX: i32 = -1;

/// The sharing policy applied when the initialisation pass meets an already-recorded reference
/// node at another position.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum TreeShape {
  /// First-visited position is canonical; later positions are not re-recorded.
  #[default]
  LeaveAlone,
  /// Construction fails with [`TreeError::NotATree`].
  CheckTree,
  /// Shared subtrees are replaced with deep clones before the relation is built.
  EnsureTree,
}

struct NodeInfo {
  parent:   Option<TermPtr>,
  index:    i32,
  children: Vec<TermPtr>,
}

/// A term plus the parent/index/child relations recorded by the one-time initialisation pass.
pub struct Tree {
  root:       TermPtr,
  relation:   IdentityTable<NodeInfo>,
  node_order: OnceCell<Vec<TermPtr>>,
}

impl Tree {
  /// Initialises the tree rooted at `root` under the default [`TreeShape::LeaveAlone`] policy.
  pub fn new(root: TermPtr) -> Tree {
    let (relation, _) = build(&root);
    Tree {
      root,
      relation,
      node_order: OnceCell::new(),
    }
  }

  /// Initialises the tree rooted at `root` under the given sharing policy.
  pub fn with_shape(root: TermPtr, shape: TreeShape) -> Result<Tree, TreeError> {
    match shape {
      TreeShape::LeaveAlone => Ok(Tree::new(root)),

      TreeShape::CheckTree => {
        let (relation, shared) = build(&root);
        if let Some(node) = shared.first() {
          return Err(TreeError::NotATree { node: node.to_string() });
        }
        Ok(Tree {
          root,
          relation,
          node_order: OnceCell::new(),
        })
      }

      TreeShape::EnsureTree => {
        let mut seen = IdentityTable::new();
        let fresh = ensure_unique(&root, &mut seen, &Rewriter::new());
        Ok(Tree::new(fresh))
      }
    }
  }

  #[inline(always)]
  pub fn root(&self) -> &TermPtr {
    &self.root
  }

  /// Was this node recorded by the initialisation pass?
  #[inline(always)]
  pub fn contains(&self, t: &TermPtr) -> bool {
    self.relation.contains(t)
  }

  fn info(&self, t: &TermPtr) -> Result<&NodeInfo, AttributeError> {
    self
        .relation
        .get(t)
        .ok_or_else(|| AttributeError::NodeNotInTree { node: t.to_string() })
  }

  // region Structural queries

  /// The parent of `t`; `None` at the root.
  pub fn parent(&self, t: &TermPtr) -> Result<Option<TermPtr>, AttributeError> {
    Ok(self.info(t)?.parent.clone())
  }

  /// The position of `t` among its parent's children; [`ROOT_INDEX`] at the root.
  pub fn index(&self, t: &TermPtr) -> Result<i32, AttributeError> {
    Ok(self.info(t)?.index)
  }

  /// The children of `t`, in the order fixed at initialisation.
  pub fn children(&self, t: &TermPtr) -> Result<Vec<TermPtr>, AttributeError> {
    Ok(self.info(t)?.children.clone())
  }

  /// Child `i` of `t`, counting from zero.
  pub fn child(&self, t: &TermPtr, i: usize) -> Result<Option<TermPtr>, AttributeError> {
    Ok(self.info(t)?.children.get(i).cloned())
  }

  pub fn first_child(&self, t: &TermPtr) -> Result<Option<TermPtr>, AttributeError> {
    Ok(self.info(t)?.children.first().cloned())
  }

  pub fn last_child(&self, t: &TermPtr) -> Result<Option<TermPtr>, AttributeError> {
    Ok(self.info(t)?.children.last().cloned())
  }

  /// The ordered children of `t`'s parent; for the root, the one-element sequence holding the
  /// root itself.
  pub fn siblings(&self, t: &TermPtr) -> Result<Vec<TermPtr>, AttributeError> {
    match &self.info(t)?.parent {
      Some(parent) => self.children(parent),
      None => Ok(vec![self.root.clone()]),
    }
  }

  pub fn prev(&self, t: &TermPtr) -> Result<Option<TermPtr>, AttributeError> {
    let info = self.info(t)?;
    match &info.parent {
      None => Ok(None),
      Some(parent) => {
        if info.index <= 0 {
          return Ok(None);
        }
        Ok(self.info(parent)?.children.get(info.index as usize - 1).cloned())
      }
    }
  }

  pub fn next(&self, t: &TermPtr) -> Result<Option<TermPtr>, AttributeError> {
    let info = self.info(t)?;
    match &info.parent {
      None => Ok(None),
      Some(parent) => {
        Ok(self.info(parent)?.children.get(info.index as usize + 1).cloned())
      }
    }
  }

  pub fn is_root(&self, t: &TermPtr) -> Result<bool, AttributeError> {
    Ok(self.info(t)?.parent.is_none())
  }

  pub fn is_first(&self, t: &TermPtr) -> Result<bool, AttributeError> {
    Ok(self.prev(t)?.is_none())
  }

  pub fn is_last(&self, t: &TermPtr) -> Result<bool, AttributeError> {
    Ok(self.next(t)?.is_none())
  }

  pub fn is_leaf(&self, t: &TermPtr) -> Result<bool, AttributeError> {
    Ok(self.info(t)?.children.is_empty())
  }

  // endregion Structural queries

  /// Every recorded node in preorder, materialised on first use.
  pub fn nodes(&self) -> &[TermPtr] {
    self.node_order.get_or_init(|| {
      let mut seen = IdentityTable::new();
      let mut order = Vec::with_capacity(self.relation.len());
      self.push_preorder(&self.root, &mut seen, &mut order);
      order
    })
  }

  fn push_preorder(&self, node: &TermPtr, seen: &mut IdentityTable<()>, out: &mut Vec<TermPtr>) {
    if seen.contains(node) {
      return;
    }
    seen.insert(node, ());
    out.push(node.clone());
    if let Some(info) = self.relation.get(node) {
      for child in &info.children {
        self.push_preorder(child, seen, out);
      }
    }
  }
}

fn build(root: &TermPtr) -> (IdentityTable<NodeInfo>, Vec<TermPtr>) {
  let mut relation = IdentityTable::new();
  let mut shared = Vec::new();
  relation.insert(
    root,
    NodeInfo {
      parent:   None,
      index:    ROOT_INDEX,
      children: Vec::new(),
    },
  );
  record_children(root, &mut relation, &mut shared);
  (relation, shared)
}

fn record_children(node: &TermPtr, relation: &mut IdentityTable<NodeInfo>, shared: &mut Vec<TermPtr>) {
  let children = node.children();
  relation
      .get_mut(node)
      .expect("a node is recorded before its children")
      .children = children.clone();

  for (i, child) in children.iter().enumerate() {
    if relation.contains(child) {
      // The first-visited position stays canonical. Atom occurrences are the same node by
      // definition, so only reference nodes count as sharing.
      if !matches!(&**child, Term::Atom(_)) {
        shared.push(child.clone());
      }
      continue;
    }
    relation.insert(
      child,
      NodeInfo {
        parent:   Some(node.clone()),
        index:    i as i32,
        children: Vec::new(),
      },
    );
    record_children(child, relation, shared);
  }
}

/// Rebuilds `t` so that no reference node reachable from it appears at two positions. The
/// first occurrence is kept; later occurrences are replaced by deep clones.
fn ensure_unique(t: &TermPtr, seen: &mut IdentityTable<()>, rewriter: &Rewriter) -> TermPtr {
  if matches!(&**t, Term::Atom(_)) {
    return t.clone();
  }
  if seen.contains(t) {
    return rewriter.deep_clone(t);
  }
  seen.insert(t, ());

  let children = t.children();
  let mut new_children = Vec::with_capacity(children.len());
  let mut changed = false;
  for child in &children {
    let new_child = ensure_unique(child, seen, rewriter);
    changed = changed || !same(&new_child, child);
    new_children.push(new_child);
  }
  if changed {
    dup(t, new_children).expect("like-shaped reconstruction")
  } else {
    t.clone()
  }
}
