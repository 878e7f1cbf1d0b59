use std::io::{self, Stdout, Write};
use std::rc::Rc;

use tracing::{debug, instrument, trace};

use crate::config::Config;
use crate::interpreter::error::Result;
use crate::interpreter::error::RuntimeError::{
    ArityMismatch, CallDepthExceeded, UndefinedFunction, UndefinedVariable,
};
use crate::interpreter::namespace::{Function, Namespace};
use crate::interpreter::{ops, Signal};
use crate::lines::LineTable;
use crate::parse::{parse_expr, Expr, Stmt};

/// An interpreter session.
///
/// Owns the namespace every statement reads and writes, and the sink `print`
/// writes to.
pub struct Runtime<W: Write = Stdout> {
    namespace: Namespace,
    config: Config,
    out: W,
    depth: usize,
}

impl Runtime {
    pub fn new() -> Runtime {
        Runtime::with_config(Config::default(), io::stdout())
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Runtime::new()
    }
}

impl<W: Write> Runtime<W> {
    pub fn with_output(out: W) -> Runtime<W> {
        Self::with_config(Config::default(), out)
    }

    pub fn with_config(config: Config, out: W) -> Runtime<W> {
        debug!(scope = %config.scope, max_call_depth = config.max_call_depth, "new runtime");
        Runtime {
            namespace: Namespace::new(config.scope),
            config,
            out,
            depth: 0,
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Builds a line table from `source` and runs it.
    pub fn run_source(&mut self, source: &str) -> anyhow::Result<()> {
        let table = Rc::new(LineTable::parse(source)?);
        self.run_program(&table)?;
        Ok(())
    }

    /// Runs every line of `table` once, in order. Signals reaching the top
    /// level are dropped.
    #[instrument(level = "debug", skip_all, fields(lines = table.len()))]
    pub fn run_program(&mut self, table: &Rc<LineTable>) -> Result<()> {
        let mut index = 0;
        while index < table.len() {
            let signal = self.run_statement(table, &mut index)?;
            if signal != Signal::Normal {
                debug!(line = index + 1, ?signal, "ignoring signal at top level");
            }
            index += 1;
        }
        Ok(())
    }

    /// Runs the lines strictly between `start` and `end`, stopping at the first
    /// statement that raises a signal.
    pub fn run_block(&mut self, table: &Rc<LineTable>, start: usize, end: usize) -> Result<Signal> {
        let mut index = start + 1;
        while index < end {
            let signal = self.run_statement(table, &mut index)?;
            if signal != Signal::Normal {
                return Ok(signal);
            }
            index += 1;
        }
        Ok(Signal::Normal)
    }

    /// Runs the line at `index`. Block statements leave `index` on their `end`.
    pub fn run_statement(&mut self, table: &Rc<LineTable>, index: &mut usize) -> Result<Signal> {
        let line = *index;
        self.exec(table, index)
            .map_err(|error| error.at_line(line + 1))
    }

    fn exec(&mut self, table: &Rc<LineTable>, index: &mut usize) -> Result<Signal> {
        let line = *index;
        let text = table.line(line);
        trace!(line = line + 1, text, "exec");
        match table.statement(line)? {
            Stmt::While { condition } => {
                let end = table.block_end(line);
                while self.eval(condition)? != 0 {
                    match self.run_block(table, line, end)? {
                        Signal::Return(value) => {
                            *index = end;
                            return Ok(Signal::Return(value));
                        }
                        Signal::Break => break,
                        Signal::Continue | Signal::Normal => {}
                    }
                }
                *index = end;
            }
            Stmt::If { condition } => {
                let end = table.block_end(line);
                let mut signal = Signal::Normal;
                if self.eval(condition)? != 0 {
                    signal = self.run_block(table, line, end)?;
                }
                *index = end;
                return Ok(signal);
            }
            Stmt::Return { retval } => return Ok(Signal::Return(self.eval(retval)?)),
            Stmt::Break => return Ok(Signal::Break),
            Stmt::Continue => return Ok(Signal::Continue),
            Stmt::Print { expr } => {
                let value = self.eval(expr)?;
                writeln!(self.out, "{value}")?;
            }
            Stmt::Let { name, value } => {
                let value = self.eval(value)?;
                self.namespace.set_variable(name, value);
            }
            Stmt::FunctionDef { name, params } => {
                let end = table.block_end(line);
                debug!(%name, ?params, line = line + 1, "registered function");
                self.namespace.define_function(
                    name.clone(),
                    Function {
                        table: Rc::clone(table),
                        start: line,
                        end,
                        params: params.clone(),
                    },
                );
                *index = end;
            }
            Stmt::Empty => {}
        }
        Ok(Signal::Normal)
    }

    /// Parses and evaluates a single expression.
    pub fn eval_expr(&mut self, text: &str) -> Result {
        let expr = parse_expr(text)?;
        self.eval(&expr)
    }

    fn eval(&mut self, expr: &Expr) -> Result {
        match expr {
            Expr::Literal { value } => Ok(*value),
            Expr::Variable { name } => self
                .namespace
                .variable(name)
                .ok_or_else(|| UndefinedVariable { name: name.clone() }),
            Expr::Call { name, args } => self.call(name, args),
            Expr::Binary { lhs, op, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                ops::apply(*op, lhs, rhs)
            }
        }
    }

    fn call(&mut self, name: &str, args: &[Expr]) -> Result {
        let args = args
            .iter()
            .map(|arg| self.eval(arg))
            .collect::<Result<Vec<_>>>()?;
        let Some(function) = self.namespace.function(name).cloned() else {
            return Err(UndefinedFunction {
                name: name.to_string(),
            });
        };
        if args.len() != function.arity() {
            return Err(ArityMismatch {
                name: name.to_string(),
                expected: function.arity(),
                actual: args.len(),
            });
        }
        if self.depth >= self.config.max_call_depth {
            return Err(CallDepthExceeded {
                limit: self.config.max_call_depth,
            });
        }
        trace!(name, ?args, depth = self.depth, "call");

        self.namespace.enter_call(&function.params, args);
        self.depth += 1;
        let result = ensure_sufficient_stack(|| {
            self.run_block(&function.table, function.start, function.end)
        });
        self.depth -= 1;
        self.namespace.exit_call();

        match result? {
            Signal::Return(value) => Ok(value),
            Signal::Break | Signal::Continue | Signal::Normal => Ok(0),
        }
    }
}

/// Runs `f`, first moving to a fresh stack segment if the current one is
/// nearly used up.
///
/// The red zone stays well above what the parser insists on having left.
#[inline]
fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    const RED_ZONE: usize = 256 * 1024;
    const STACK_PER_SEGMENT: usize = 1024 * 1024;

    stacker::maybe_grow(RED_ZONE, STACK_PER_SEGMENT, f)
}
