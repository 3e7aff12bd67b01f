//! Shape-checked value interpolation
//!
//! [`classify`] is the single matcher deciding whether two values can be
//! animated into one another. Tweens build an [`Interpolator`] from it and
//! springs build their stepper tree from it, so both reject exactly the same
//! shapes.

use veil_core::{Record, Timestamp, Value};

use crate::error::{InterpolateError, Result};

/// How a start/target pair is animated
pub(crate) enum Pair<'a> {
    /// Already at the target (or the start is NaN): jump straight to it
    Snap,
    Numbers(f64, f64),
    Dates(f64, f64),
    Arrays(&'a [Value], &'a [Value]),
    Records(&'a Record, &'a Record),
}

/// Match a start value against a target value
pub(crate) fn classify<'a>(from: &'a Value, to: &'a Value) -> Result<Pair<'a>> {
    if from.is_nan() || from.strict_eq(to) {
        return Ok(Pair::Snap);
    }
    match (from, to) {
        (Value::Number(a), Value::Number(b)) => Ok(Pair::Numbers(*a, *b)),
        (Value::Date(a), Value::Date(b)) => Ok(Pair::Dates(a.as_millis(), b.as_millis())),
        (Value::Array(a), Value::Array(b)) => {
            if a.len() != b.len() {
                return Err(InterpolateError::LengthMismatch {
                    from: a.len(),
                    to: b.len(),
                });
            }
            Ok(Pair::Arrays(a, b))
        }
        (Value::Record(a), Value::Record(b)) => {
            if a.len() != b.len() || !a.keys().all(|k| b.contains_key(k)) {
                return Err(InterpolateError::KeyMismatch);
            }
            Ok(Pair::Records(a, b))
        }
        (a, b) if std::mem::discriminant(a) == std::mem::discriminant(b) => {
            Err(InterpolateError::NotInterpolatable(a.kind()))
        }
        (a, b) => Err(InterpolateError::TypeMismatch {
            from: a.kind(),
            to: b.kind(),
        }),
    }
}

/// A function of `t` from a start value to a target value
#[derive(Clone, Debug)]
pub enum Interpolator {
    Constant(Value),
    Number { from: f64, to: f64 },
    Date { from: f64, to: f64 },
    Array(Vec<Interpolator>),
    Record(Vec<(String, Interpolator)>),
}

impl Interpolator {
    /// Build an interpolator, failing if the shapes cannot be matched
    pub fn new(from: &Value, to: &Value) -> Result<Self> {
        Ok(match classify(from, to)? {
            Pair::Snap => Interpolator::Constant(to.clone()),
            Pair::Numbers(from, to) => Interpolator::Number { from, to },
            Pair::Dates(from, to) => Interpolator::Date { from, to },
            Pair::Arrays(a, b) => Interpolator::Array(
                a.iter()
                    .zip(b)
                    .map(|(x, y)| Interpolator::new(x, y))
                    .collect::<Result<_>>()?,
            ),
            // Output follows the target's key order
            Pair::Records(a, b) => Interpolator::Record(
                b.iter()
                    .map(|(key, y)| {
                        let x = a.get(key).unwrap_or(&Value::Null);
                        Interpolator::new(x, y).map(|interp| (key.clone(), interp))
                    })
                    .collect::<Result<_>>()?,
            ),
        })
    }

    /// Value at (eased) progress `t`; `t == 1` yields the target exactly
    pub fn at(&self, t: f64) -> Value {
        match self {
            Interpolator::Constant(v) => v.clone(),
            Interpolator::Number { from, to } => Value::Number(lerp(*from, *to, t)),
            Interpolator::Date { from, to } => Value::Date(Timestamp(lerp(*from, *to, t))),
            Interpolator::Array(items) => Value::Array(items.iter().map(|i| i.at(t)).collect()),
            Interpolator::Record(fields) => Value::Record(
                fields
                    .iter()
                    .map(|(key, interp)| (key.clone(), interp.at(t)))
                    .collect(),
            ),
        }
    }

    /// Whether every leaf is constant
    pub fn is_constant(&self) -> bool {
        match self {
            Interpolator::Constant(_) => true,
            Interpolator::Number { .. } | Interpolator::Date { .. } => false,
            Interpolator::Array(items) => items.iter().all(Interpolator::is_constant),
            Interpolator::Record(fields) => fields.iter().all(|(_, i)| i.is_constant()),
        }
    }
}

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    if t == 1.0 {
        to
    } else {
        from + t * (to - from)
    }
}
