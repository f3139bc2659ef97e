/*!

There are different text representations possible for terms depending on the context: error
messages want a full rendering, trace output often only wants the constructor. This module
provides a unified API for formatting objects across the project.

The trait that formattable types implement is `Formattable`. It works similar to the standard
library's `Display` trait, but carries a style. Both `Debug` and `Display` are implemented for
`dyn Formattable`, but this isn't enough to implement these traits for `T: Formattable`; the
`impl_display_debug_for_formattable!` macro does so for a concrete type.

*/

use std::fmt;

use kiama_abs::join_string;

use crate::term::{Atom, Term};

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum FormatStyle {
  /// Full rendering of the term.
  #[default]
  Default,
  /// Only the outermost constructor.
  Simple,
  /// Rendering with extra debugging information.
  Debug,
}

pub trait Formattable {
  /// Writes a text representation of `self` according to the given `FormatStyle`.
  /// Use `format!` and friends to create a string.
  fn repr(&self, out: &mut dyn fmt::Write, style: FormatStyle) -> fmt::Result;
}

#[macro_export]
macro_rules! impl_display_debug_for_formattable {
  ($t:ty) => {
    impl std::fmt::Display for $t {
      fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <$t as $crate::term::Formattable>::repr(self, f, $crate::term::FormatStyle::Default)
      }
    }

    impl std::fmt::Debug for $t {
      fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <$t as $crate::term::Formattable>::repr(self, f, $crate::term::FormatStyle::Debug)
      }
    }
  };
}
pub use impl_display_debug_for_formattable;

/// Renders a term to an owned string in the given style. Writing into a `String` cannot fail.
fn rendering(t: &Term, style: FormatStyle) -> String {
  let mut out = String::new();
  let _ = t.repr(&mut out, style);
  out
}

/// Writes `children` between `open` and `close`, comma-separated.
fn write_delimited<'a>(
  f: &mut dyn fmt::Write,
  style: FormatStyle,
  open: &str,
  children: impl Iterator<Item = &'a Term>,
  close: &str,
) -> fmt::Result {
  let joined = join_string(children.map(|child| rendering(child, style)), ", ");
  write!(f, "{}{}{}", open, joined, close)
}

impl Formattable for Term {
  fn repr(&self, f: &mut dyn fmt::Write, style: FormatStyle) -> fmt::Result {
    if style == FormatStyle::Simple {
      return write!(f, "{}", self.shape_name());
    }

    match self {
      Term::Atom(a) => match a {
        Atom::Bool(b) => write!(f, "{}", b),
        Atom::Int(i) => write!(f, "{}", i),
        Atom::Float(x) => write!(f, "{}", x),
        Atom::Str(s) => write!(f, "\"{}\"", s),
      },

      Term::Record(r) => {
        write!(f, "{}", r.tag)?;
        if !r.children.is_empty() {
          write_delimited(f, style, "(", r.children.iter().map(|c| &**c), ")")?;
        }
        Ok(())
      }

      Term::Seq(elements) => write_delimited(f, style, "[", elements.iter().map(|c| &**c), "]"),

      Term::Tuple(elements) => write_delimited(f, style, "(", elements.iter().map(|c| &**c), ")"),

      Term::Map(entries) => {
        let joined = join_string(
          entries
              .iter()
              .map(|(k, v)| format!("{} -> {}", rendering(k.as_ref(), style), rendering(v.as_ref(), style))),
          ", ",
        );
        write!(f, "{{{}}}", joined)
      }

      Term::Set(elements) => write_delimited(f, style, "{", elements.iter().map(|c| &**c), "}"),

      Term::Opt(Some(inner)) => {
        write!(f, "Some(")?;
        inner.repr(f, style)?;
        write!(f, ")")
      }

      Term::Opt(None) => write!(f, "None"),

      Term::Left(inner) => {
        write!(f, "Left(")?;
        inner.repr(f, style)?;
        write!(f, ")")
      }

      Term::Right(inner) => {
        write!(f, "Right(")?;
        inner.repr(f, style)?;
        write!(f, ")")
      }

      Term::Object(object) => object.repr(f, style),
    }
  }
}

impl_display_debug_for_formattable!(Term);
