/*!

The observable error surface of the engines.

Strategy failure is not represented here: a strategy that does not apply returns `None` and the
combinators treat that as ordinary control flow. The errors below are exceptional and unwind the
current top-level call; none of them leaves an engine in an unrecoverable state.

*/

use thiserror::Error;

/// Errors raised by term reconstruction. These are programmer contract violations: the traversal
/// primitives panic with the rendered error rather than converting it into strategy failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TermError {
  #[error("cannot reconstruct {shape}: expected {expected} children, got {supplied}")]
  IllegalArgs {
    shape:    String,
    expected: usize,
    supplied: usize,
  },

  #[error("cannot reconstruct {shape}: child {child} is not a key-value pair")]
  NotAPair {
    shape: String,
    child: String,
  },
}

/// Errors raised by attribute evaluation and structural queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
  /// The definition of `attribute` transitively requested its own value at `node`.
  #[error("Cycle detected in attribute evaluation of {attribute} at {node}")]
  Cycle {
    attribute: String,
    node:      String,
  },

  /// A structural attribute was queried with a node never seen by tree initialisation.
  #[error("node {node} is not part of this tree")]
  NodeNotInTree {
    node: String,
  },

  /// A chain's `in` or `out` attribute was evaluated at the root of the tree without an
  /// overriding definition.
  #[error("chain root reached at {node}: no updating definition applies")]
  ChainRootReached {
    node: String,
  },

  /// A user-supplied definition function signalled an error. The engine restores its own
  /// invariants before propagating this.
  #[error("attribute evaluation failed: {0}")]
  Evaluation(String),
}

/// Errors raised by tree construction under a sharing policy that rejects shared nodes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
  #[error("structure is not a tree: {node} appears as a child more than once")]
  NotATree {
    node: String,
  },
}
