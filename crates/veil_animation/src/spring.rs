//! Spring physics
//!
//! Springs step once per display frame (no time delta), so their
//! coefficients are per-frame rather than physical units. Each number leaf
//! keeps its own position and velocity:
//!
//! ```text
//! acceleration = stiffness * (target - current) - damping * velocity
//! velocity    += acceleration
//! current     += velocity
//! ```
//!
//! A leaf settles once both `|velocity|` and `|target - current|` drop below
//! `0.001 * |target - initial|`, at which point it snaps to the target.

use serde::{Deserialize, Serialize};
use veil_core::{Timestamp, Value};

use crate::error::Result;
use crate::interpolate::{classify, Pair};

/// Per-frame spring coefficients
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    pub stiffness: f64,
    pub damping: f64,
}

impl SpringConfig {
    pub fn new(stiffness: f64, damping: f64) -> Self {
        Self { stiffness, damping }
    }

    /// Slow, soft approach
    pub fn gentle() -> Self {
        Self {
            stiffness: 0.1,
            damping: 0.5,
        }
    }

    /// Visible overshoot before settling
    pub fn wobbly() -> Self {
        Self {
            stiffness: 0.2,
            damping: 0.2,
        }
    }

    /// Quick and tight
    pub fn stiff() -> Self {
        Self {
            stiffness: 0.3,
            damping: 0.6,
        }
    }
}

impl Default for SpringConfig {
    /// The modal's spring: critically snappy, no visible wobble
    fn default() -> Self {
        Self {
            stiffness: 0.5,
            damping: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
enum Node {
    /// Leaf already at its target
    Snap(Value),
    Number(Leaf),
    Date(Leaf),
    Array { children: Vec<Node>, target: Value },
    Record {
        children: Vec<(String, Node)>,
        target: Value,
    },
}

#[derive(Clone, Debug)]
struct Leaf {
    current: f64,
    velocity: f64,
    target: f64,
    initial_distance: f64,
    threshold: f64,
    settled: bool,
}

impl Leaf {
    fn new(from: f64, to: f64) -> Self {
        let distance = (to - from).abs();
        Self {
            current: from,
            velocity: 0.0,
            target: to,
            initial_distance: distance,
            threshold: distance * 0.001,
            settled: false,
        }
    }

    /// Advance one frame; returns true while still moving
    fn step(&mut self, config: &SpringConfig) -> bool {
        if self.settled {
            return false;
        }
        let acceleration =
            config.stiffness * (self.target - self.current) - config.damping * self.velocity;
        self.velocity += acceleration;
        self.current += self.velocity;
        if self.velocity.abs() < self.threshold
            && (self.target - self.current).abs() < self.threshold
        {
            self.current = self.target;
            self.velocity = 0.0;
            self.settled = true;
            return false;
        }
        true
    }

    fn progress(&self) -> f64 {
        if self.settled || self.initial_distance == 0.0 {
            return 1.0;
        }
        let remaining = (self.target - self.current).abs();
        (1.0 - remaining / self.initial_distance).clamp(0.0, 1.0)
    }
}

impl Node {
    fn build(from: &Value, to: &Value) -> Result<Self> {
        Ok(match classify(from, to)? {
            Pair::Snap => Node::Snap(to.clone()),
            Pair::Numbers(a, b) => Node::Number(Leaf::new(a, b)),
            Pair::Dates(a, b) => Node::Date(Leaf::new(a, b)),
            Pair::Arrays(a, b) => Node::Array {
                children: a
                    .iter()
                    .zip(b)
                    .map(|(x, y)| Node::build(x, y))
                    .collect::<Result<_>>()?,
                target: to.clone(),
            },
            Pair::Records(a, b) => Node::Record {
                children: b
                    .iter()
                    .map(|(key, y)| {
                        let x = a.get(key).unwrap_or(&Value::Null);
                        Node::build(x, y).map(|node| (key.clone(), node))
                    })
                    .collect::<Result<_>>()?,
                target: to.clone(),
            },
        })
    }

    /// Step every leaf; returns true while any leaf is still moving
    fn step(&mut self, config: &SpringConfig) -> bool {
        match self {
            Node::Snap(_) => false,
            Node::Number(leaf) | Node::Date(leaf) => leaf.step(config),
            Node::Array { children, .. } => children
                .iter_mut()
                .fold(false, |active, child| child.step(config) || active),
            Node::Record { children, .. } => children
                .iter_mut()
                .fold(false, |active, (_, child)| child.step(config) || active),
        }
    }

    fn value(&self) -> Value {
        match self {
            Node::Snap(v) => v.clone(),
            Node::Number(leaf) => Value::Number(leaf.current),
            Node::Date(leaf) => Value::Date(Timestamp(leaf.current)),
            Node::Array { children, target } => {
                if self.is_settled() {
                    return target.clone();
                }
                Value::Array(children.iter().map(Node::value).collect())
            }
            Node::Record { children, target } => {
                if self.is_settled() {
                    return target.clone();
                }
                Value::Record(
                    children
                        .iter()
                        .map(|(key, child)| (key.clone(), child.value()))
                        .collect(),
                )
            }
        }
    }

    fn is_settled(&self) -> bool {
        match self {
            Node::Snap(_) => true,
            Node::Number(leaf) | Node::Date(leaf) => leaf.settled,
            Node::Array { children, .. } => children.iter().all(Node::is_settled),
            Node::Record { children, .. } => children.iter().all(|(_, c)| c.is_settled()),
        }
    }

    fn collect_progress(&self, out: &mut Vec<f64>) {
        match self {
            Node::Snap(_) => {}
            Node::Number(leaf) | Node::Date(leaf) => out.push(leaf.progress()),
            Node::Array { children, .. } => {
                children.iter().for_each(|c| c.collect_progress(out));
            }
            Node::Record { children, .. } => {
                children.iter().for_each(|(_, c)| c.collect_progress(out));
            }
        }
    }

    fn velocities(&self, out: &mut Vec<f64>) {
        match self {
            Node::Snap(_) => {}
            Node::Number(leaf) | Node::Date(leaf) => out.push(leaf.velocity),
            Node::Array { children, .. } => children.iter().for_each(|c| c.velocities(out)),
            Node::Record { children, .. } => {
                children.iter().for_each(|(_, c)| c.velocities(out));
            }
        }
    }
}

/// A spring driving one state value towards a target
///
/// Always starts at rest: a spring built over an in-flight value does not
/// inherit the previous spring's velocity.
#[derive(Clone, Debug)]
pub struct SpringStepper {
    config: SpringConfig,
    root: Node,
}

impl SpringStepper {
    pub fn new(from: &Value, to: &Value, config: SpringConfig) -> Result<Self> {
        Ok(Self {
            config,
            root: Node::build(from, to)?,
        })
    }

    /// Advance one frame; returns true while the spring is still moving
    pub fn step(&mut self) -> bool {
        self.root.step(&self.config)
    }

    /// Current value (the exact target once settled)
    pub fn value(&self) -> Value {
        self.root.value()
    }

    pub fn is_settled(&self) -> bool {
        self.root.is_settled()
    }

    /// Mean fraction of distance covered across all moving leaves
    pub fn progress(&self) -> f64 {
        let mut samples = Vec::new();
        self.root.collect_progress(&mut samples);
        if samples.is_empty() {
            return 1.0;
        }
        samples.iter().sum::<f64>() / samples.len() as f64
    }

    /// Velocities of every number leaf, depth first
    pub fn velocities(&self) -> Vec<f64> {
        let mut out = Vec::new();
        self.root.velocities(&mut out);
        out
    }

    pub fn config(&self) -> SpringConfig {
        self.config
    }
}
