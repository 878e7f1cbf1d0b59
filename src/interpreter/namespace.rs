use std::collections::HashMap;
use std::rc::Rc;

use crate::config::ScopeMode;
use crate::lines::LineTable;

/// A user function: the `func` line, its `end`, and the parameter names.
#[derive(Clone, Debug)]
pub struct Function {
    pub(crate) table: Rc<LineTable>,
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) params: Vec<String>,
}

impl Function {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

type Frame = HashMap<String, i64>;

/// Variables and functions, each in their own map.
///
/// `frames[0]` is the global frame and is never popped. In flat mode it is the
/// only frame there ever is.
#[derive(Debug)]
pub struct Namespace {
    mode: ScopeMode,
    frames: Vec<Frame>,
    functions: HashMap<String, Function>,
}

impl Namespace {
    pub fn new(mode: ScopeMode) -> Namespace {
        Namespace {
            mode,
            frames: vec![Frame::new()],
            functions: HashMap::new(),
        }
    }

    pub fn variable(&self, name: &str) -> Option<i64> {
        let (current, global) = self.current_and_global();
        current
            .get(name)
            .or_else(|| global.get(name))
            .copied()
    }

    pub fn set_variable(&mut self, name: &str, value: i64) {
        let depth = self.frames.len() - 1;
        let index = if self.frames[depth].contains_key(name) || !self.frames[0].contains_key(name)
        {
            depth
        } else {
            0
        };
        self.frames[index].insert(name.to_string(), value);
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    /// Registers `function`, replacing any earlier definition of `name`.
    pub fn define_function(&mut self, name: String, function: Function) {
        self.functions.insert(name, function);
    }

    /// Binds call arguments to parameter names.
    ///
    /// Flat mode writes straight into the global frame, clobbering whatever
    /// the caller had under those names.
    pub fn enter_call(&mut self, params: &[String], args: Vec<i64>) {
        let bindings = params.iter().cloned().zip(args);
        match self.mode {
            ScopeMode::Flat => self.frames[0].extend(bindings),
            ScopeMode::Frames => self.frames.push(bindings.collect()),
        }
    }

    pub fn exit_call(&mut self) {
        if self.mode == ScopeMode::Frames && self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    fn current_and_global(&self) -> (&Frame, &Frame) {
        let current = &self.frames[self.frames.len() - 1];
        (current, &self.frames[0])
    }
}
