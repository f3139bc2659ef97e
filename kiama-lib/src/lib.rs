/*!

Engines for building language-processing tools over tree-shaped data.

Two coupled engines sit on a shared term model:

 - The [`rewriting`] engine provides strategies, total functions from a term to an optional
   replacement term, together with a combinator algebra and generic one-level and full-tree
   traversals that work uniformly over records, sequences, maps, sets, options, eithers, tuples,
   and user-supplied [`term::Rewritable`] shapes.
 - The [`attribution`] engine computes named attributes of tree nodes with memoisation keyed by
   node identity, cycle detection, dynamically extensible definitions, and a fixed-point solver
   for mutually recursive attribute systems.

The [`tree`] module materialises the parent/sibling/index relations of a term in a single
initialisation pass; the attribution engine's structural attributes and the chain decorator are
built on it.

Unchanged subterms keep their allocation: every traversal returns the original term whenever all
rewritten children are [`term::same`] as the originals. Attribute memo tables and the tree
relation key nodes by allocation identity (value atoms by structural equality) and pin their key
nodes for the life of the table.

# Example

```
use kiama_lib::rewriting::{rule, Rewriter};
use kiama_lib::term::{mk_int, rec, TermPtr};

fn num(i: i64) -> TermPtr { rec("Num", vec![mk_int(i)]) }

let eval = rule(|t| {
    let r = t.as_record()?;
    let lhs = r.children[0].record("Num")?.children[0].as_int()?;
    let rhs = r.children[1].record("Num")?.children[0].as_int()?;
    match &*r.tag {
        "Add" => Some(num(lhs + rhs)),
        "Mul" => Some(num(lhs * rhs)),
        _     => None,
    }
});

let rewriter = Rewriter::new();
let term = rec("Mul", vec![rec("Add", vec![num(1), num(2)]), num(3)]);
let result = rewriter.everywherebu(eval).apply(&term).unwrap();
assert_eq!(*result, *num(9));
```

*/

pub mod attribution;
pub mod error;
pub mod rewriting;
pub mod term;
pub mod tree;

pub use error::{AttributeError, TermError, TreeError};
pub use term::{same, Atom, NodeKey, Record, Rewritable, Term, TermPtr};
