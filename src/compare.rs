use std::collections::HashSet;
use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::printer::Printer;
use crate::reflect::Reflect;
use crate::value::{Category, Scalar, Value};

/// Default maximum absolute difference between two floats that still
/// compare equal.
pub const DEFAULT_EPSILON: f64 = 1e-5;

// Fallback diagnostics quote both operands; keep them short.
const DIAGNOSTIC_CAP: usize = 200;

/// One step from a value to one of its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Field(String),
    Index(usize),
    Deref,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Field(name) => write!(f, ".{name}"),
            Step::Index(i) => write!(f, "[{i}]"),
            Step::Deref => f.write_str("*"),
        }
    }
}

/// Why two values are not equal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MismatchReason {
    #[error("not same types: {actual} vs {expected}")]
    Kind { actual: Category, expected: Category },
    #[error("floating-point comparison failed: {actual:?} != {expected:?}")]
    Float { actual: f64, expected: f64 },
    #[error("different lengths: {actual} vs {expected}")]
    Length { actual: usize, expected: usize },
    #[error("field count mismatch: {actual} vs {expected}")]
    FieldCount { actual: usize, expected: usize },
    #[error("deep-equality fallback failed: {actual} != {expected}")]
    Fallback { actual: String, expected: String },
}

/// The first difference found between two values, with the path leading to it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{reason}{}", located(.path))]
pub struct Mismatch {
    path: Vec<Step>,
    reason: MismatchReason,
}

fn located(path: &[Step]) -> String {
    if path.is_empty() {
        return String::new();
    }
    let mut at = String::from(" at ");
    for step in path {
        at.push_str(&step.to_string());
    }
    at
}

impl Mismatch {
    fn new(reason: MismatchReason) -> Self {
        Self {
            path: Vec::new(),
            reason,
        }
    }

    // Steps are pushed innermost first while unwinding and put in order once
    // by `rooted`.
    fn within(mut self, step: Step) -> Self {
        self.path.push(step);
        self
    }

    fn rooted(mut self) -> Self {
        self.path.reverse();
        self
    }

    /// Steps from the root to the differing values, outermost first.
    pub fn path(&self) -> &[Step] {
        &self.path
    }

    pub fn reason(&self) -> &MismatchReason {
        &self.reason
    }
}

// Ordered pairs of node addresses already under comparison, keyed by the
// tolerance in force: a pair accepted loosely says nothing about an exact walk.
type Visited = HashSet<(usize, usize, u64)>;

fn identity(value: &Value) -> usize {
    value as *const Value as usize
}

/// Recursive structural equality with an absolute tolerance on floats.
///
/// Pointers are followed, sequences are compared element by element and
/// aggregates field by field; everything else must match exactly. A pair of
/// nodes met again while it is still being compared is assumed equal, which
/// keeps the walk finite on cyclic graphs.
///
/// ```
/// use tabletest::{Comparator, Reflect};
///
/// let comparator = Comparator::new(1e-3);
/// let actual = vec![1.0, 2.0004].to_value();
/// let expected = vec![1.0, 2.0].to_value();
/// assert!(comparator.compare(&actual, &expected).is_ok());
///
/// let err = comparator
///     .compare(&vec![1.0, 2.5].to_value(), &expected)
///     .unwrap_err();
/// assert_eq!(err.to_string(), "floating-point comparison failed: 2.5 != 2.0 at [1]");
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparator {
    epsilon: f64,
}

impl Default for Comparator {
    fn default() -> Self {
        Self::new(DEFAULT_EPSILON)
    }
}

impl Comparator {
    pub const EXACT: Comparator = Comparator { epsilon: 0.0 };

    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn compare(&self, actual: &Value, expected: &Value) -> Result<(), Mismatch> {
        let mut visited = Visited::new();
        self.walk(actual, expected, &mut visited)
            .map_err(Mismatch::rooted)
    }

    fn walk(&self, actual: &Value, expected: &Value, visited: &mut Visited) -> Result<(), Mismatch> {
        if !visited.insert((identity(actual), identity(expected), self.epsilon.to_bits())) {
            return Ok(());
        }

        if actual.category() != expected.category() {
            return Err(Mismatch::new(MismatchReason::Kind {
                actual: actual.category(),
                expected: expected.category(),
            }));
        }

        match (actual, expected) {
            (Value::Pointer(Some(a)), Value::Pointer(Some(b))) => {
                let (a, b) = (a.borrow(), b.borrow());
                self.walk(&a, &b, visited)
                    .map_err(|m| m.within(Step::Deref))
            }
            (Value::Float(a), Value::Float(b)) => self.floats(*a, *b),
            (Value::Sequence(a), Value::Sequence(b)) => {
                if a.len() != b.len() {
                    return Err(Mismatch::new(MismatchReason::Length {
                        actual: a.len(),
                        expected: b.len(),
                    }));
                }
                for (i, (x, y)) in a.iter().zip(b).enumerate() {
                    self.walk(x, y, visited)
                        .map_err(|m| m.within(Step::Index(i)))?;
                }
                Ok(())
            }
            (Value::Aggregate(a), Value::Aggregate(b)) => {
                if a.fields.len() != b.fields.len() {
                    return Err(Mismatch::new(MismatchReason::FieldCount {
                        actual: a.fields.len(),
                        expected: b.fields.len(),
                    }));
                }
                for (x, y) in a.fields.iter().zip(&b.fields) {
                    self.walk(&x.value, &y.value, visited)
                        .map_err(|m| m.within(Step::Field(x.name.clone())))?;
                }
                Ok(())
            }
            _ => self.fallback(actual, expected, visited),
        }
    }

    fn floats(&self, actual: f64, expected: f64) -> Result<(), Mismatch> {
        if within(actual, expected, self.epsilon) {
            return Ok(());
        }
        debug!(actual, expected, epsilon = self.epsilon, "floating-point comparison failed");
        Err(Mismatch::new(MismatchReason::Float { actual, expected }))
    }

    // Null pointers and scalars. Maps and variants are walked with zero
    // tolerance; any difference inside them is reported here as a whole.
    fn fallback(&self, actual: &Value, expected: &Value, visited: &mut Visited) -> Result<(), Mismatch> {
        let equal = match (actual, expected) {
            (Value::Pointer(None), Value::Pointer(None)) => true,
            (Value::Scalar(a), Value::Scalar(b)) => scalars_equal(a, b, visited),
            _ => false,
        };
        if equal {
            return Ok(());
        }
        let printer = Printer::new(DIAGNOSTIC_CAP);
        Err(Mismatch::new(MismatchReason::Fallback {
            actual: printer.render(actual),
            expected: printer.render(expected),
        }))
    }
}

fn within(a: f64, b: f64, epsilon: f64) -> bool {
    if a == b || (a.is_nan() && b.is_nan()) {
        return true;
    }
    let diff = a - b;
    diff < epsilon && -diff < epsilon
}

fn scalars_equal(a: &Scalar, b: &Scalar, visited: &mut Visited) -> bool {
    let mut exact = |x: &Value, y: &Value| Comparator::EXACT.walk(x, y, visited).is_ok();
    match (a, b) {
        (Scalar::Unit, Scalar::Unit) => true,
        (Scalar::Bool(x), Scalar::Bool(y)) => x == y,
        (Scalar::Int(x), Scalar::Int(y)) => x == y,
        (Scalar::UInt(x), Scalar::UInt(y)) => x == y,
        (Scalar::Char(x), Scalar::Char(y)) => x == y,
        (Scalar::Str(x), Scalar::Str(y)) => x == y,
        (Scalar::Error(x), Scalar::Error(y)) => x == y,
        (Scalar::Opaque(x), Scalar::Opaque(y)) => x == y,
        (
            Scalar::Variant { ty, name, fields },
            Scalar::Variant {
                ty: other_ty,
                name: other_name,
                fields: other_fields,
            },
        ) => {
            ty == other_ty
                && name == other_name
                && fields.len() == other_fields.len()
                && fields.iter().zip(other_fields).all(|(x, y)| exact(x, y))
        }
        (Scalar::Map(x), Scalar::Map(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .zip(y)
                    .all(|((xk, xv), (yk, yv))| exact(xk, yk) && exact(xv, yv))
        }
        _ => false,
    }
}

/// Compares two reflectable values with [`DEFAULT_EPSILON`].
///
/// ```
/// assert!(tabletest::compare(&[1.0, 2.0], &[1.0, 2.000001]).is_ok());
/// assert!(tabletest::compare(&vec![1, 2, 3], &vec![1, 2]).is_err());
/// ```
pub fn compare<A, B>(actual: &A, expected: &B) -> Result<(), Mismatch>
where
    A: Reflect + ?Sized,
    B: Reflect + ?Sized,
{
    Comparator::default().compare(&actual.to_value(), &expected.to_value())
}

/// Two-valued form of [`Comparator::compare`] with [`DEFAULT_EPSILON`]: the
/// verdict and, when unequal, the diagnostic.
pub fn is_equal(actual: &Value, expected: &Value) -> (bool, String) {
    match Comparator::default().compare(actual, expected) {
        Ok(()) => (true, String::new()),
        Err(mismatch) => (false, mismatch.to_string()),
    }
}
