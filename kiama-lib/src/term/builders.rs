/*!

Convenience constructors for terms. These are the only functions in the library that allocate
new shapes from scratch; the engines themselves build everything through
[`dup`](crate::term::dup).

*/

use std::rc::Rc;

use paste::paste;

use crate::term::{dedup_elements, Atom, Record, Rewritable, Term, TermPtr};

macro_rules! atom_builders {
  ($($variant:ident($ty:ty)),+ $(,)?) => {
    $(
      impl From<$ty> for Atom {
        fn from(value: $ty) -> Atom {
          Atom::$variant(value.into())
        }
      }

      paste! {
        #[doc = concat!("Builds an atom term from a `", stringify!($ty), "`.")]
        pub fn [<mk_ $variant:lower>](value: $ty) -> TermPtr {
          Rc::new(Term::Atom(Atom::$variant(value.into())))
        }
      }
    )+
  };
}

atom_builders!(Bool(bool), Int(i64), Float(f64), Str(&str));

/// Builds a record term with the given constructor tag and children.
pub fn rec(tag: &str, children: Vec<TermPtr>) -> TermPtr {
  Rc::new(Term::Record(Record::new(tag, children)))
}

pub fn seq(elements: Vec<TermPtr>) -> TermPtr {
  Rc::new(Term::Seq(elements))
}

pub fn tuple(elements: Vec<TermPtr>) -> TermPtr {
  Rc::new(Term::Tuple(elements))
}

pub fn map(entries: Vec<(TermPtr, TermPtr)>) -> TermPtr {
  Rc::new(Term::Map(entries))
}

/// Builds a set term. Structural duplicates are dropped, keeping first-occurrence order; that
/// order is the set's iteration order from then on.
pub fn set(elements: Vec<TermPtr>) -> TermPtr {
  Rc::new(Term::Set(dedup_elements(elements)))
}

pub fn some_t(inner: TermPtr) -> TermPtr {
  Rc::new(Term::Opt(Some(inner)))
}

pub fn none_t() -> TermPtr {
  Rc::new(Term::Opt(None))
}

pub fn left(inner: TermPtr) -> TermPtr {
  Rc::new(Term::Left(inner))
}

pub fn right(inner: TermPtr) -> TermPtr {
  Rc::new(Term::Right(inner))
}

/// Wraps a user-supplied [`Rewritable`] value as a term.
pub fn object(value: Rc<dyn Rewritable>) -> TermPtr {
  Rc::new(Term::Object(value))
}
