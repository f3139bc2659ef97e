/*!

The capability a user type implements to make its values traversable. Implementers of
`Rewritable` are wrapped in [`Term::Object`](crate::term::Term) and then behave like any other
term: the traversal primitives deconstruct them, rewrite the children, and ask the value to
reconstruct itself.

Requirements of implementers:

 1. `reconstruct` must place children at the same positions `deconstruct` returned them, and
    must reject children it cannot accept with `TermError::IllegalArgs` rather than panicking.
 2. `eq_rewritable` is structural equality. The usual implementation downcasts through
    `as_any` and compares with `==`.
 3. Hashing comes through [`DynHash`], which is blanket-implemented for any `Hash` type, and
    must agree with `eq_rewritable`.

Objects count as product shapes: congruence traversals apply to them positionally.

*/

use std::any::Any;
use std::fmt;

use kiama_abs::DynHash;

use crate::{
  error::TermError,
  term::{FormatStyle, TermPtr},
};

pub trait Rewritable: DynHash + 'static {
  fn as_any(&self) -> &dyn Any;

  /// The constructor name, used in error messages and trace output.
  fn shape_name(&self) -> &'static str;

  /// The number of immediate children.
  fn arity(&self) -> usize;

  /// The ordered sequence of immediate children.
  fn deconstruct(&self) -> Vec<TermPtr>;

  /// Builds a like-shaped value from replacement children, wrapped as a term.
  fn reconstruct(&self, children: &[TermPtr]) -> Result<TermPtr, TermError>;

  /// Structural equality against another object.
  fn eq_rewritable(&self, other: &dyn Rewritable) -> bool;

  /// Writes a text representation; see [`Formattable`](crate::term::Formattable).
  fn repr(&self, out: &mut dyn fmt::Write, style: FormatStyle) -> fmt::Result;
}
