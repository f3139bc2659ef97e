/*!

The strategy-based rewriting engine.

[`strategy`] holds the `Strategy` type, its base constructors, and the engine-independent
combinator algebra. [`rewriter`] holds the `Rewriter` engine with the one-level primitives and
the full-tree traversals derived from them. [`queries`] holds the folds and collection queries.

*/

pub mod queries;
pub mod rewriter;
pub mod strategy;


pub use queries::{collect, collectl, collects, count, everything, para};
pub use rewriter::{dontstop, RewriteHook, Rewriter, StopFn};
pub use strategy::*;
