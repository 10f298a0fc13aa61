//! Program trees and their evaluation
//!
//! [`Expression`] is the closed set of node kinds a program is built from.
//! One tree instance is shared, unmodified, by every device that runs the
//! program; anything that must survive across rounds lives in the export
//! maps keyed by alignment path, never inside a node.
//!
//! # Evaluation contract
//!
//! Every node is evaluated at the alignment position its caller descended to.
//! On return the export holds an entry for the node's own path and for every
//! evaluated descendant; `last_exec` and the neighbor table are never
//! mutated; the environment is back at the scope depth it was found at, even
//! on an error exit. Children are entered through [`EvalContext::descend`],
//! which appends a slot and restores the parent path afterward, so a child's
//! extension never leaks to its siblings.

use std::sync::Arc;

use tracing::trace;

use fieldcast_foundation::{AlignmentPath, NeighborField, Reference, Slot, Value};

use crate::context::DeviceContext;
use crate::error::{Error, Result};
use crate::ops::Op;
use crate::stack::Environment;
use crate::state::{Export, NeighborTable};

/// A named function: parameters and a body, shared across call sites.
#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Reference>,
    pub body: Expression,
}

/// One node of a program tree.
#[derive(Debug, Clone)]
pub enum Expression {
    /// Constant value.
    Literal(Value),
    /// Variable lookup in the environment.
    Variable(Reference),
    /// Built-in operator applied to argument expressions.
    Apply { op: Op, args: Vec<Expression> },
    /// User function call. Arguments always shadow-bind into a fresh scope.
    Call {
        function: Arc<FunctionDef>,
        args: Vec<Expression>,
    },
    /// Local binding visible in `body` only.
    Let {
        var: Reference,
        value: Box<Expression>,
        body: Box<Expression>,
    },
    /// Conditional: exactly one arm is evaluated, under a branch slot, so the
    /// untaken arm's prior-round state is not read this round.
    If {
        guard: Box<Expression>,
        then_branch: Box<Expression>,
        else_branch: Box<Expression>,
    },
    /// Share the body's value and gather the aligned neighbors' values for
    /// the same position into a field.
    Neighbor { body: Box<Expression> },
    /// Value that persists round to round: `var` is bound to the previous
    /// round's result — or to `init` when there is none — while `body`
    /// computes the updated one.
    Rep {
        var: Reference,
        init: Box<Expression>,
        body: Box<Expression>,
    },
    /// One draw from the device's nondeterminism source.
    Random,
}

impl Expression {
    pub fn num(v: f64) -> Self {
        Expression::Literal(Value::Num(v))
    }

    pub fn bool(v: bool) -> Self {
        Expression::Literal(Value::Bool(v))
    }

    pub fn var(name: &str) -> Self {
        Expression::Variable(Reference::from(name))
    }

    pub fn apply(op: Op, args: Vec<Expression>) -> Self {
        Expression::Apply { op, args }
    }

    pub fn call(function: Arc<FunctionDef>, args: Vec<Expression>) -> Self {
        Expression::Call { function, args }
    }

    pub fn let_(var: &str, value: Expression, body: Expression) -> Self {
        Expression::Let {
            var: Reference::from(var),
            value: Box::new(value),
            body: Box::new(body),
        }
    }

    pub fn if_(guard: Expression, then_branch: Expression, else_branch: Expression) -> Self {
        Expression::If {
            guard: Box::new(guard),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }

    pub fn neighbor(body: Expression) -> Self {
        Expression::Neighbor {
            body: Box::new(body),
        }
    }

    pub fn rep(var: &str, init: Expression, body: Expression) -> Self {
        Expression::Rep {
            var: Reference::from(var),
            init: Box::new(init),
            body: Box::new(body),
        }
    }
}

/// Everything one round of evaluation threads through the tree.
///
/// `last_exec` and `neighbors` are read-only; `export` is the write sink.
pub struct EvalContext<'a> {
    pub device: &'a mut DeviceContext,
    pub neighbors: &'a NeighborTable,
    pub env: &'a mut Environment,
    pub last_exec: &'a Export,
    pub export: &'a mut Export,
    path: Vec<Slot>,
}

impl<'a> EvalContext<'a> {
    pub fn new(
        device: &'a mut DeviceContext,
        neighbors: &'a NeighborTable,
        env: &'a mut Environment,
        last_exec: &'a Export,
        export: &'a mut Export,
    ) -> Self {
        Self {
            device,
            neighbors,
            env,
            last_exec,
            export,
            path: Vec::new(),
        }
    }

    /// The alignment path of the node currently being evaluated.
    pub fn current_path(&self) -> AlignmentPath {
        AlignmentPath::new(self.path.clone())
    }

    /// Run `f` at the child position `slot`, restoring the parent path after.
    fn descend<T>(&mut self, slot: Slot, f: impl FnOnce(&mut Self) -> T) -> T {
        self.path.push(slot);
        let result = f(self);
        self.path.pop();
        result
    }
}

/// Evaluate `expr` at the context's current alignment position.
pub fn evaluate(expr: &Expression, ctx: &mut EvalContext<'_>) -> Result<Value> {
    let value = match expr {
        Expression::Literal(v) => v.clone(),

        Expression::Variable(var) => ctx
            .env
            .get(var)
            .cloned()
            .ok_or_else(|| Error::UnboundVariable(var.clone()))?,

        Expression::Apply { op, args } => {
            let operands = eval_children(args, ctx)?;
            op.apply(&operands)?
        }

        Expression::Call { function, args } => {
            if function.params.len() != args.len() {
                return Err(Error::ArityMismatch {
                    op: function.name.clone(),
                    expected: function.params.len(),
                    found: args.len(),
                });
            }
            let operands = eval_children(args, ctx)?;
            // The body sits one slot past the last argument
            let body_slot = Slot::Child(args.len() as u16);
            in_scope(ctx, |ctx| {
                ctx.env
                    .put_all(function.params.iter().cloned().zip(operands));
                ctx.descend(body_slot, |ctx| evaluate(&function.body, ctx))
            })?
        }

        Expression::Let { var, value, body } => {
            let bound = ctx.descend(Slot::Child(0), |ctx| evaluate(value, ctx))?;
            in_scope(ctx, |ctx| {
                ctx.env.put(var.clone(), bound, true);
                ctx.descend(Slot::Child(1), |ctx| evaluate(body, ctx))
            })?
        }

        Expression::If {
            guard,
            then_branch,
            else_branch,
        } => {
            let taken = match ctx.descend(Slot::Child(0), |ctx| evaluate(guard, ctx))? {
                Value::Bool(b) => b,
                other => {
                    return Err(Error::TypeMismatch {
                        op: "if".to_string(),
                        expected: "bool",
                        found: other.type_name(),
                    });
                }
            };
            let arm = if taken { then_branch } else { else_branch };
            ctx.descend(Slot::Branch(taken), |ctx| evaluate(arm, ctx))?
        }

        Expression::Neighbor { body } => {
            let slot = Slot::Child(0);
            let body_path = ctx.current_path().extend(slot);
            let local = ctx.descend(slot, |ctx| evaluate(body, ctx))?;
            let own = ctx.device.uid();
            let mut field = NeighborField::new(own, local);
            for (device, value) in ctx.neighbors.aligned(&body_path) {
                // The device's own stale publication never overrides the
                // value it just computed
                if device != own {
                    field.insert(device, value.clone());
                }
            }
            trace!(path = %body_path, aligned = field.neighbor_count(), "neighbor field gathered");
            Value::Field(field)
        }

        Expression::Rep { var, init, body } => {
            let prior = match ctx.last_exec.get(&ctx.current_path()) {
                Some(v) => v.clone(),
                // First round, or a previously untaken branch
                None => ctx.descend(Slot::Child(0), |ctx| evaluate(init, ctx))?,
            };
            in_scope(ctx, |ctx| {
                ctx.env.put(var.clone(), prior, true);
                ctx.descend(Slot::Child(1), |ctx| evaluate(body, ctx))
            })?
        }

        Expression::Random => Value::Num(ctx.device.next_random()?),
    };

    let path = ctx.current_path();
    ctx.export.record(path, value.clone())?;
    Ok(value)
}

/// Evaluate each child at its ordinal slot.
fn eval_children(args: &[Expression], ctx: &mut EvalContext<'_>) -> Result<Vec<Value>> {
    let mut operands = Vec::with_capacity(args.len());
    for (i, arg) in args.iter().enumerate() {
        operands.push(ctx.descend(Slot::Child(i as u16), |ctx| evaluate(arg, ctx))?);
    }
    Ok(operands)
}

/// Run `f` inside a fresh scope, popping it even on an error exit.
fn in_scope<T>(
    ctx: &mut EvalContext<'_>,
    f: impl FnOnce(&mut EvalContext<'_>) -> Result<T>,
) -> Result<T> {
    ctx.env.push();
    let result = f(ctx);
    ctx.env.pop()?;
    result
}
