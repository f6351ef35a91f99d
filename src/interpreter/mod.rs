//! Walking the AST: emitted text plus break/continue signals, threaded
//! through one mutable environment.

use log::trace;

use crate::ast::{AstNode, AstRoot, ForEach, ForLoop, IfStatement, WhileLoop};
use crate::condition::evaluate_condition;
use crate::env::{is_identifier, Environment};
use crate::error::{BuildError, BuildResult};
use crate::expr::eval_expr;
use crate::registry::FunctionRegistry;
use crate::value::Value;

/// What a node's evaluation produced. Merging concatenates text and ORs the
/// control flags; loops consume and clear the flags at their boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvalResult {
    pub text: String,
    pub should_break: bool,
    pub should_continue: bool,
}

impl EvalResult {
    pub fn text(text: impl Into<String>) -> Self {
        EvalResult {
            text: text.into(),
            ..Default::default()
        }
    }

    fn signal(should_break: bool, should_continue: bool) -> Self {
        EvalResult {
            text: String::new(),
            should_break,
            should_continue,
        }
    }

    /// Fold another result into this one.
    pub fn absorb(&mut self, other: EvalResult) {
        self.text.push_str(&other.text);
        self.should_break |= other.should_break;
        self.should_continue |= other.should_continue;
    }

    fn interrupted(&self) -> bool {
        self.should_break || self.should_continue
    }
}

pub struct Interpreter<'a> {
    registry: &'a FunctionRegistry,
}

impl<'a> Interpreter<'a> {
    pub fn new(registry: &'a FunctionRegistry) -> Self {
        Self { registry }
    }

    /// Evaluate all of a root's children against its environment and return
    /// the concatenated emission. Stray control flags at the top level have
    /// no loop to consume them and are dropped.
    pub fn run_root(&self, root: &mut AstRoot) -> BuildResult<String> {
        let mut output = String::new();
        for child in &root.children {
            let result = self.evaluate(child, &mut root.env)?;
            output.push_str(&result.text);
        }
        Ok(output)
    }

    pub fn evaluate(&self, node: &AstNode, env: &mut Environment) -> BuildResult<EvalResult> {
        match node {
            AstNode::Block(children) => self.eval_children(children, env),
            AstNode::Text(text) => {
                let value = eval_expr(&text.expr, env, self.registry)?;
                if value.is_unknown() {
                    Ok(EvalResult::default())
                } else {
                    Ok(EvalResult::text(value.render()))
                }
            }
            AstNode::VarDecl(decl) => {
                let value = eval_expr(&decl.expr, env, self.registry)?;
                if !value.is_unknown() {
                    trace!("binding {name} = {value:?}", name = decl.name);
                    env.set(&decl.name, value);
                }
                Ok(EvalResult::default())
            }
            AstNode::Print(print) => {
                let value = eval_expr(&print.expr, env, self.registry)?;
                Ok(EvalResult::text(value.render()))
            }
            AstNode::If(chain) => self.eval_if(chain, env),
            AstNode::While(while_loop) => self.eval_while(while_loop, env),
            AstNode::For(for_loop) => self.eval_for(for_loop, env),
            AstNode::ForEach(foreach) => self.eval_foreach(foreach, env),
            AstNode::Break => Ok(EvalResult::signal(true, false)),
            AstNode::Continue => Ok(EvalResult::signal(false, true)),
        }
    }

    /// Evaluate children in order. A raised control flag stops the walk of
    /// the remaining children and propagates outward to the nearest loop.
    fn eval_children(
        &self,
        children: &[AstNode],
        env: &mut Environment,
    ) -> BuildResult<EvalResult> {
        let mut result = EvalResult::default();
        for child in children {
            result.absorb(self.evaluate(child, env)?);
            if result.interrupted() {
                break;
            }
        }
        Ok(result)
    }

    fn eval_if(&self, chain: &IfStatement, env: &mut Environment) -> BuildResult<EvalResult> {
        for branch in &chain.branches {
            if evaluate_condition(&branch.condition, env, self.registry)? {
                return self.eval_children(&branch.children, env);
            }
        }
        if let Some(else_children) = &chain.else_children {
            return self.eval_children(else_children, env);
        }
        Ok(EvalResult::default())
    }

    fn eval_while(
        &self,
        while_loop: &WhileLoop,
        env: &mut Environment,
    ) -> BuildResult<EvalResult> {
        let mut result = EvalResult::default();
        while evaluate_condition(&while_loop.condition, env, self.registry)? {
            let iteration = self.eval_children(&while_loop.children, env)?;
            result.text.push_str(&iteration.text);
            if iteration.should_break {
                break;
            }
        }
        Ok(result)
    }

    fn eval_for(&self, for_loop: &ForLoop, env: &mut Environment) -> BuildResult<EvalResult> {
        let (name, expr) = parse_loop_assignment(&for_loop.init)?;
        let value = eval_expr(&expr, env, self.registry)?;
        if value.is_unknown() {
            return Err(
                BuildError::value("failed to evaluate for loop init").with_snippet(&for_loop.init)
            );
        }
        env.set(name, value);

        let mut result = EvalResult::default();
        while evaluate_condition(&for_loop.condition, env, self.registry)? {
            let iteration = self.eval_children(&for_loop.children, env)?;
            result.text.push_str(&iteration.text);
            if iteration.should_break {
                break;
            }

            // Re-parsed per iteration: the increment may rebind a different
            // variable each time round.
            let (name, expr) = parse_loop_assignment(&for_loop.increment)?;
            let value = eval_expr(&expr, env, self.registry)?;
            if value.is_unknown() {
                return Err(BuildError::value("failed to evaluate for loop increment")
                    .with_snippet(&for_loop.increment));
            }
            env.set(name, value);
        }
        Ok(result)
    }

    fn eval_foreach(&self, foreach: &ForEach, env: &mut Environment) -> BuildResult<EvalResult> {
        let collection = eval_expr(&foreach.collection, env, self.registry)?;
        let Value::Array(items) = collection else {
            return Err(BuildError::type_error(format!(
                "foreach expects an array collection, got {}",
                collection.kind()
            ))
            .with_snippet(&foreach.collection));
        };

        let mut result = EvalResult::default();
        for item in items {
            env.set(&foreach.binding, item);
            let iteration = self.eval_children(&foreach.children, env)?;
            result.text.push_str(&iteration.text);
            if iteration.should_break {
                break;
            }
        }
        Ok(result)
    }
}

fn parse_loop_assignment(statement: &str) -> BuildResult<(String, String)> {
    let Some((name, expr)) = crate::statement::parse_assignment(statement) else {
        return Err(
            BuildError::parse("loop header part is not an assignment").with_snippet(statement)
        );
    };
    if !is_identifier(&name) {
        return Err(
            BuildError::parse(format!("invalid loop variable: {name}")).with_snippet(statement)
        );
    }
    Ok((name, expr))
}
