//! An interpreter for `zero`, a small line-oriented language with integer
//! arithmetic, `while`/`if` blocks and `func` definitions.
//!
//! ```text
//! func add(a, b)
//!   return a + b
//! end
//! print add(3, 4)   # 7
//! ```

pub use config::{Config, ScopeMode};
pub use interpreter::{Function, Namespace, Runtime, RuntimeError, Signal};
pub use lines::{LineTable, StructureError};
pub use logging::init_tracing;
pub use parse::{parse_expr, BinaryOp, Expr, ParseError, Stmt, SyntaxError};

pub mod config;
pub mod interpreter;
pub mod lexical;
pub mod lines;
mod logging;
pub mod parse;
