//! Built-in operators
//!
//! Pure functions over values, applied to already-evaluated operands. Every
//! operator has a fixed arity (except tuple construction) and a closed set of
//! accepted operand types; anything else is a typed evaluation error, never a
//! panic.
//!
//! Field folds consume the field a neighbor construct produced. The fold runs
//! over all entries, the device's own value included, so an isolated device
//! folds to its own value rather than erroring — staleness and empty
//! neighborhoods are ordinary inputs. `count_hood` counts aligned neighbors
//! only.

use std::fmt;

use fieldcast_foundation::{NeighborField, Value};

use crate::error::{Error, Result};

/// Built-in operator set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Neg,
    // Comparison
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
    // Logic
    Not,
    And,
    Or,
    /// Eager select: all three operands are evaluated, unlike the conditional
    /// node, so neighbor constructs in both arms stay aligned on every device.
    Mux,
    // Numeric
    Min,
    Max,
    // Construction
    Tuple,
    // Field folds
    MinHood,
    MaxHood,
    SumHood,
    AnyHood,
    AllHood,
    CountHood,
}

impl Op {
    pub fn name(&self) -> &'static str {
        match self {
            Op::Add => "add",
            Op::Sub => "sub",
            Op::Mul => "mul",
            Op::Div => "div",
            Op::Neg => "neg",
            Op::Eq => "eq",
            Op::Lt => "lt",
            Op::Le => "le",
            Op::Gt => "gt",
            Op::Ge => "ge",
            Op::Not => "not",
            Op::And => "and",
            Op::Or => "or",
            Op::Mux => "mux",
            Op::Min => "min",
            Op::Max => "max",
            Op::Tuple => "tuple",
            Op::MinHood => "min_hood",
            Op::MaxHood => "max_hood",
            Op::SumHood => "sum_hood",
            Op::AnyHood => "any_hood",
            Op::AllHood => "all_hood",
            Op::CountHood => "count_hood",
        }
    }

    /// Required operand count; `None` for variadic operators.
    pub fn arity(&self) -> Option<usize> {
        match self {
            Op::Neg | Op::Not => Some(1),
            Op::MinHood | Op::MaxHood | Op::SumHood => Some(1),
            Op::AnyHood | Op::AllHood | Op::CountHood => Some(1),
            Op::Mux => Some(3),
            Op::Tuple => None,
            _ => Some(2),
        }
    }

    /// Apply the operator to evaluated operands.
    pub fn apply(&self, args: &[Value]) -> Result<Value> {
        if let Some(expected) = self.arity()
            && expected != args.len()
        {
            return Err(Error::ArityMismatch {
                op: self.name().to_string(),
                expected,
                found: args.len(),
            });
        }

        let value = match self {
            Op::Add => Value::Num(self.num(&args[0])? + self.num(&args[1])?),
            Op::Sub => Value::Num(self.num(&args[0])? - self.num(&args[1])?),
            Op::Mul => Value::Num(self.num(&args[0])? * self.num(&args[1])?),
            Op::Div => Value::Num(self.num(&args[0])? / self.num(&args[1])?),
            Op::Neg => Value::Num(-self.num(&args[0])?),

            Op::Eq => Value::Bool(args[0] == args[1]),
            Op::Lt => Value::Bool(self.num(&args[0])? < self.num(&args[1])?),
            Op::Le => Value::Bool(self.num(&args[0])? <= self.num(&args[1])?),
            Op::Gt => Value::Bool(self.num(&args[0])? > self.num(&args[1])?),
            Op::Ge => Value::Bool(self.num(&args[0])? >= self.num(&args[1])?),

            Op::Not => Value::Bool(!self.bool(&args[0])?),
            Op::And => Value::Bool(self.bool(&args[0])? && self.bool(&args[1])?),
            Op::Or => Value::Bool(self.bool(&args[0])? || self.bool(&args[1])?),
            Op::Mux => {
                if self.bool(&args[0])? {
                    args[1].clone()
                } else {
                    args[2].clone()
                }
            }

            Op::Min => Value::Num(self.num(&args[0])?.min(self.num(&args[1])?)),
            Op::Max => Value::Num(self.num(&args[0])?.max(self.num(&args[1])?)),

            Op::Tuple => Value::Tuple(args.to_vec()),

            Op::MinHood => self.fold_num(&args[0], f64::INFINITY, f64::min)?,
            Op::MaxHood => self.fold_num(&args[0], f64::NEG_INFINITY, f64::max)?,
            Op::SumHood => self.fold_num(&args[0], 0.0, |acc, v| acc + v)?,
            Op::AnyHood => self.fold_bool(&args[0], false, |acc, v| acc || v)?,
            Op::AllHood => self.fold_bool(&args[0], true, |acc, v| acc && v)?,
            Op::CountHood => {
                Value::Num(self.field(&args[0])?.neighbor_count() as f64)
            }
        };
        Ok(value)
    }

    fn num(&self, value: &Value) -> Result<f64> {
        value.as_num().ok_or_else(|| self.mismatch("num", value))
    }

    fn bool(&self, value: &Value) -> Result<bool> {
        value.as_bool().ok_or_else(|| self.mismatch("bool", value))
    }

    fn field<'a>(&self, value: &'a Value) -> Result<&'a NeighborField> {
        value.as_field().ok_or_else(|| self.mismatch("field", value))
    }

    fn fold_num(&self, value: &Value, init: f64, f: impl Fn(f64, f64) -> f64) -> Result<Value> {
        let mut acc = init;
        for entry in self.field(value)?.values() {
            acc = f(acc, self.num(entry)?);
        }
        Ok(Value::Num(acc))
    }

    fn fold_bool(&self, value: &Value, init: bool, f: impl Fn(bool, bool) -> bool) -> Result<Value> {
        let mut acc = init;
        for entry in self.field(value)?.values() {
            acc = f(acc, self.bool(entry)?);
        }
        Ok(Value::Bool(acc))
    }

    fn mismatch(&self, expected: &'static str, found: &Value) -> Error {
        Error::TypeMismatch {
            op: self.name().to_string(),
            expected,
            found: found.type_name(),
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
