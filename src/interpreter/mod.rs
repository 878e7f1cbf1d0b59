pub use error::RuntimeError;
pub use namespace::{Function, Namespace};
pub use runtime::Runtime;

mod error;
mod namespace;
mod ops;
mod runtime;

/// What a statement or block asks of the construct enclosing it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    Return(i64),
    Break,
    Continue,
    Normal,
}
