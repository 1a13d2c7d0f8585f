//! Filter-graph building blocks shared by the compilers.

pub mod chain;
pub mod expr;
pub mod label;

pub use chain::{CompiledFragment, FilterChain};
pub use label::{Label, LabelAllocator, StreamRef};
