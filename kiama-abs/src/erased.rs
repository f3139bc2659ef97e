/*!

Hashing through trait objects, after the [erased trait](https://quinedot.github.io/rust-learning/dyn-trait-erased.html)
pattern. `Hash::hash` is generic over the hasher, so it cannot appear in an object-safe trait;
`DynHash` erases the hasher behind `&mut dyn Hasher` instead, and is blanket-implemented for
every `Hash` type.

The term model's user-supplied object shapes are the consumer: their capability trait requires
`DynHash`, which lets an `Rc<dyn …>` participate in the structural hashing of the terms that
contain it. A trait that wants the same only has to require `DynHash` and forward `Hash`:

```rust
# use kiama_abs::DynHash;
use core::hash::{Hash, Hasher};

pub trait Trait: DynHash {}

impl Hash for dyn Trait {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.dyn_hash(state)
    }
}
```

*/
use core::hash::{Hash, Hasher};

pub trait DynHash {
  /// Feeds `self` into the erased hasher. Comes for free for any `Hash` type.
  fn dyn_hash(&self, state: &mut dyn Hasher);
}

// `&mut dyn Hasher` is itself a hasher, which is what lets the generic `Hash::hash` drive the
// erased one.
impl<T: Hash> DynHash for T {
  fn dyn_hash(&self, mut state: &mut dyn Hasher) {
    Hash::hash(self, &mut state)
  }
}

impl Hash for dyn DynHash + '_ {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.dyn_hash(state)
  }
}
