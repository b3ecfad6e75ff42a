//! Trace Synthesizer
//!
//! Walks statements in document order against one flat environment and one
//! input feed, appending a step record for every recognized shape. Nothing is
//! executed: conditionals always enter their body, counted loops only iterate
//! concrete lists, and condition loops replay until their test folds falsy or
//! the iteration cap stops them.

use serde::{Deserialize, Serialize};

use crate::domain::ast::{Expr, Module, Stmt};
use crate::domain::evaluator::{evaluate, Environment};
use crate::domain::input_feed::InputFeed;
use crate::domain::value::{clip, Value, MAX_RENDER_LEN};

/// Loop target that gets an extra `Print i: ...` step after every iteration.
pub const INDEX_COUNTER: &str = "i";

/// Kind tag of a step record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Assign,
    Print,
    If,
    For,
    While,
    Info,
    Error,
}

/// One entry of the synthesized trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    #[serde(rename = "type")]
    pub kind: StepKind,
    pub content: String,
}

impl Step {
    pub fn new(kind: StepKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
        }
    }
}

/// Bounds on a single synthesis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceLimits {
    /// Body replays allowed per entry into a condition loop.
    pub max_while_iterations: usize,
    /// Step records allowed in one trace.
    pub max_steps: usize,
}

impl Default for TraceLimits {
    fn default() -> Self {
        Self {
            max_while_iterations: 1_000,
            max_steps: 10_000,
        }
    }
}

/// Raised internally once the step budget is spent; unwinds the walk.
#[derive(Debug)]
struct Truncated;

type Visit = Result<(), Truncated>;

pub struct TraceSynthesizer<'a> {
    env: Environment,
    feed: InputFeed<'a>,
    steps: Vec<Step>,
    limits: TraceLimits,
}

impl<'a> TraceSynthesizer<'a> {
    pub fn new(inputs: &'a [String], limits: TraceLimits) -> Self {
        Self {
            env: Environment::new(),
            feed: InputFeed::new(inputs),
            steps: Vec::new(),
            limits,
        }
    }

    /// Walk every top-level statement. A spent step budget ends the walk early
    /// with an `info` step already recorded.
    pub fn visit_module(&mut self, module: &Module) {
        let _ = self.visit_block(&module.body);
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<Step> {
        self.steps
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn feed(&self) -> &InputFeed<'a> {
        &self.feed
    }

    fn emit(&mut self, kind: StepKind, mut content: String) -> Visit {
        if self.steps.len() >= self.limits.max_steps {
            self.steps.push(Step::new(
                StepKind::Info,
                format!("trace truncated after {} steps", self.limits.max_steps),
            ));
            return Err(Truncated);
        }
        clip(&mut content, MAX_RENDER_LEN);
        self.steps.push(Step::new(kind, content));
        Ok(())
    }

    fn visit_block(&mut self, body: &[Stmt]) -> Visit {
        for stmt in body {
            self.visit_stmt(stmt)?;
        }
        Ok(())
    }

    fn visit_stmt(&mut self, stmt: &Stmt) -> Visit {
        match stmt {
            Stmt::Assign { targets, value } => match targets.as_slice() {
                [Expr::Name(name)] => self.visit_assign(name, value),
                _ => Ok(()),
            },
            Stmt::Expr(expr) => match expr.as_named_call() {
                Some(("print", args)) => self.visit_print(args),
                _ => Ok(()),
            },
            Stmt::If { test, body, .. } => {
                let test = evaluate(test, &self.env);
                self.emit(StepKind::If, format!("if {}:", test))?;
                self.visit_block(body)
            }
            Stmt::For { target, iter, body, .. } => self.visit_for(target, iter, body),
            Stmt::While { test, body, .. } => self.visit_while(test, body),
            // Definitions, guarded and managed blocks are walked once where they appear.
            Stmt::Try { .. }
            | Stmt::With { .. }
            | Stmt::FunctionDef { .. }
            | Stmt::ClassDef { .. }
            | Stmt::Match { .. } => {
                for block in stmt.child_blocks() {
                    self.visit_block(block)?;
                }
                Ok(())
            }
            Stmt::AugAssign { .. }
            | Stmt::AnnAssign { .. }
            | Stmt::Return(_)
            | Stmt::Import(_)
            | Stmt::Assert { .. }
            | Stmt::Delete(_)
            | Stmt::Global(_)
            | Stmt::Raise(_)
            | Stmt::Pass
            | Stmt::Break
            | Stmt::Continue => Ok(()),
        }
    }

    fn visit_assign(&mut self, name: &str, value: &Expr) -> Visit {
        if let Some(("input", _)) = value.as_named_call() {
            let line = self.feed.next();
            let content = format!("{} = '{}'", name, line);
            self.env.insert(name.to_string(), Value::Str(line));
            return self.emit(StepKind::Assign, content);
        }

        if let Some(("int", [inner, ..])) = value.as_named_call() {
            if let Some(("input", _)) = inner.as_named_call() {
                let line = self.feed.next();
                let converted = parse_int(&line).map(Value::Int).unwrap_or_else(|| Value::str("error"));
                let content = format!("{} = {}", name, converted);
                self.env.insert(name.to_string(), converted);
                return self.emit(StepKind::Assign, content);
            }
        }

        let resolved = evaluate(value, &self.env);
        let content = format!("{} = {}", name, resolved);
        self.env.insert(name.to_string(), resolved);
        self.emit(StepKind::Assign, content)
    }

    fn visit_print(&mut self, args: &[Expr]) -> Visit {
        let parts: Vec<String> = args.iter().map(|a| evaluate(a, &self.env).to_string()).collect();
        self.emit(StepKind::Print, parts.join(" "))
    }

    fn visit_for(&mut self, target: &Expr, iter: &Expr, body: &[Stmt]) -> Visit {
        let iterable = evaluate(iter, &self.env);
        self.emit(StepKind::For, format!("for {} in {}:", render_target(target), iterable))?;

        let (Some(name), Value::List(items)) = (target.as_name(), iterable) else {
            return Ok(());
        };
        for item in items {
            self.env.insert(name.to_string(), item.clone());
            self.emit(StepKind::Assign, format!("{} = {}", name, item))?;
            self.visit_block(body)?;
            if name == INDEX_COUNTER {
                self.emit(StepKind::Print, format!("Print i: {}", item))?;
            }
        }
        Ok(())
    }

    fn visit_while(&mut self, test: &Expr, body: &[Stmt]) -> Visit {
        let mut condition = evaluate(test, &self.env);
        self.emit(StepKind::While, format!("while {}:", condition))?;

        let mut iterations = 0;
        while condition.is_truthy() {
            if iterations == self.limits.max_while_iterations {
                return self.emit(
                    StepKind::Info,
                    format!("while loop stopped after {} iterations (iteration cap reached)", iterations),
                );
            }
            self.visit_block(body)?;
            iterations += 1;
            condition = evaluate(test, &self.env);
        }
        Ok(())
    }
}

/// Synthesize the trace of an already-parsed module.
pub fn synthesize(module: &Module, inputs: &[String], limits: TraceLimits) -> Vec<Step> {
    let mut synthesizer = TraceSynthesizer::new(inputs, limits);
    synthesizer.visit_module(module);
    synthesizer.into_steps()
}

/// Integer conversion of a raw input line: surrounding whitespace, an
/// optional sign and single underscores between digits are accepted.
pub fn parse_int(raw: &str) -> Option<i64> {
    let text = raw.trim();
    let (negative, digits) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    if digits.is_empty() || digits.starts_with('_') || digits.ends_with('_') || digits.contains("__") {
        return None;
    }
    let mut value: i64 = 0;
    for c in digits.chars().filter(|c| *c != '_') {
        let digit = c.to_digit(10)? as i64;
        value = value.checked_mul(10)?;
        value = if negative {
            value.checked_sub(digit)?
        } else {
            value.checked_add(digit)?
        };
    }
    Some(value)
}

fn render_target(target: &Expr) -> String {
    match target {
        Expr::Name(name) => name.clone(),
        Expr::Tuple(items) => items.iter().map(render_target).collect::<Vec<_>>().join(", "),
        Expr::Attribute { value, attr } => format!("{}.{}", render_target(value), attr),
        _ => "<complex_target>".to_string(),
    }
}
