//! Running table cases against a function under test.

use std::fmt;

use tracing::{debug, debug_span};

use crate::compare::{Comparator, Mismatch};
use crate::config::Config;
use crate::error::HarnessError;
use crate::function::Function;
use crate::printer::Printer;
use crate::reflect::Reflect;
use crate::report::{Reporter, TracingReporter};
use crate::value::{Scalar, Value};

/// Result of one table case.
#[derive(Debug, Clone, PartialEq)]
pub enum CaseOutcome {
    Passed,
    Failed {
        /// Name of the differing output, when the function has several.
        output: Option<String>,
        mismatch: Mismatch,
    },
}

impl CaseOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, CaseOutcome::Passed)
    }

    /// Empty for a passing case.
    pub fn diagnostic(&self) -> String {
        match self {
            CaseOutcome::Passed => String::new(),
            CaseOutcome::Failed { mismatch, .. } => mismatch.to_string(),
        }
    }
}

/// A failing case of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseFailure {
    pub index: usize,
    pub diagnostic: String,
}

/// Summary of [`Harness::run_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub cases: usize,
    pub failures: Vec<CaseFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} cases failed", self.failures.len(), self.cases)?;
        for failure in &self.failures {
            write!(f, "\n  case {}: {}", failure.index, failure.diagnostic)?;
        }
        Ok(())
    }
}

/// A comparator and printer configured together.
#[derive(Debug, Clone, Copy, Default)]
pub struct Harness {
    comparator: Comparator,
    printer: Printer,
}

impl Harness {
    pub fn new(config: Config) -> Self {
        Self {
            comparator: Comparator::new(config.epsilon),
            printer: Printer::new(config.render_cap),
        }
    }

    /// A harness configured from the environment; see [`Config::from_env`].
    pub fn from_env() -> Result<Self, HarnessError> {
        Config::from_env().map(Self::new)
    }

    pub fn comparator(&self) -> &Comparator {
        &self.comparator
    }

    pub fn printer(&self) -> &Printer {
        &self.printer
    }

    /// Calls `function` once and checks each of its outputs.
    ///
    /// An aggregate `inputs` is spread into one argument per field; any other
    /// value is passed as the only argument. `expected` is split the same way,
    /// one expectation per output, and `()` stands for no outputs. Outputs are
    /// compared in order; the first difference ends the case and both values
    /// are logged through `reporter`.
    ///
    /// Returns an error, without calling `function`, when the argument or
    /// expectation counts don't fit its signature.
    pub fn run_case<F, Args, I, E, R>(
        &self,
        function: &F,
        inputs: &I,
        expected: &E,
        reporter: &mut R,
    ) -> Result<CaseOutcome, HarnessError>
    where
        F: Function<Args> + ?Sized,
        I: Reflect + ?Sized,
        E: Reflect + ?Sized,
        R: Reporter + ?Sized,
    {
        self.run_values(function, &inputs.to_value(), &expected.to_value(), reporter)
    }

    fn run_values<F, Args, R>(
        &self,
        function: &F,
        inputs: &Value,
        expected: &Value,
        reporter: &mut R,
    ) -> Result<CaseOutcome, HarnessError>
    where
        F: Function<Args> + ?Sized,
        R: Reporter + ?Sized,
    {
        let signature = function.signature();
        let (args, arg_names) = positional(inputs);
        let (wanted, wanted_names) = positional(expected);

        if args.len() != signature.inputs {
            return Err(HarnessError::InputArity {
                expected: signature.inputs,
                got: args.len(),
            });
        }
        if wanted.len() != signature.outputs {
            return Err(HarnessError::OutputArity {
                expected: signature.outputs,
                got: wanted.len(),
            });
        }

        let got = function.invoke(args).map_err(|err| match err {
            HarnessError::Argument {
                position,
                name: None,
                source,
            } => HarnessError::Argument {
                position,
                name: arg_names.get(position).cloned(),
                source,
            },
            other => other,
        })?;
        if got.len() != signature.outputs {
            return Err(HarnessError::ResultArity {
                declared: signature.outputs,
                returned: got.len(),
            });
        }

        for (i, (actual, expected)) in got.iter().zip(&wanted).enumerate() {
            let Err(mismatch) = self.comparator.compare(actual, expected) else {
                continue;
            };
            let output = if got.len() > 1 {
                wanted_names.get(i).cloned()
            } else {
                None
            };
            let label = output
                .as_deref()
                .map(|name| format!(" ({name})"))
                .unwrap_or_default();
            reporter.log(&format!("Expected{label}: {}", self.printer.render(expected)));
            reporter.log(&format!("Got     {label}: {}", self.printer.render(actual)));
            return Ok(CaseOutcome::Failed { output, mismatch });
        }
        Ok(CaseOutcome::Passed)
    }

    /// Runs every case of a table.
    ///
    /// `inputs` and `expected` must both reflect to sequences of the same
    /// length. Every case runs even after a failure; each failing case is
    /// reported through `reporter.fail` and collected in the returned
    /// [`BatchReport`]. An authoring error in any case stops the batch.
    pub fn run_all<F, Args, I, E, R>(
        &self,
        function: &F,
        inputs: &I,
        expected: &E,
        reporter: &mut R,
    ) -> Result<BatchReport, HarnessError>
    where
        F: Function<Args> + ?Sized,
        I: Reflect + ?Sized,
        E: Reflect + ?Sized,
        R: Reporter + ?Sized,
    {
        let inputs = cases(inputs.to_value(), "inputs")?;
        let expected = cases(expected.to_value(), "expected results")?;
        if inputs.len() != expected.len() {
            return Err(HarnessError::CaseCountMismatch {
                inputs: inputs.len(),
                expected: expected.len(),
            });
        }

        let mut report = BatchReport {
            cases: inputs.len(),
            failures: Vec::new(),
        };
        for (index, (input, wanted)) in inputs.iter().zip(&expected).enumerate() {
            let _span = debug_span!("case", index).entered();
            reporter.log(&format!("Testing case {index}"));
            let outcome = self.run_values(function, input, wanted, reporter)?;
            if let CaseOutcome::Failed { mismatch, .. } = outcome {
                let diagnostic = mismatch.to_string();
                reporter.fail(&format!("FAIL case {index} ({diagnostic})"));
                report.failures.push(CaseFailure { index, diagnostic });
            }
        }
        debug!(
            cases = report.cases,
            failed = report.failures.len(),
            "table finished"
        );
        Ok(report)
    }
}

// Spreads an aggregate into its fields; `()` is empty; anything else is a
// single slot.
fn positional(value: &Value) -> (Vec<Value>, Vec<String>) {
    match value {
        Value::Aggregate(record) => record
            .fields
            .iter()
            .map(|field| (field.value.clone(), field.name.clone()))
            .unzip(),
        Value::Scalar(Scalar::Unit) => (Vec::new(), Vec::new()),
        other => (vec![other.clone()], Vec::new()),
    }
}

fn cases(value: Value, which: &'static str) -> Result<Vec<Value>, HarnessError> {
    match value {
        Value::Sequence(items) => Ok(items),
        other => Err(HarnessError::NotASequence {
            which,
            found: other.category(),
        }),
    }
}

/// [`Harness::run_case`] with the default configuration.
pub fn run_case<F, Args, I, E, R>(
    function: &F,
    inputs: &I,
    expected: &E,
    reporter: &mut R,
) -> Result<CaseOutcome, HarnessError>
where
    F: Function<Args> + ?Sized,
    I: Reflect + ?Sized,
    E: Reflect + ?Sized,
    R: Reporter + ?Sized,
{
    Harness::default().run_case(function, inputs, expected, reporter)
}

/// [`Harness::run_all`] with the default configuration.
///
/// ```
/// use tabletest::{run_all, Recorder};
///
/// fn halve(x: f64) -> f64 {
///     x / 2.0
/// }
///
/// let mut recorder = Recorder::new();
/// let report = run_all(&halve, &[2.0, 3.0], &[1.0, 1.0], &mut recorder).unwrap();
/// assert_eq!(report.cases, 2);
/// assert_eq!(report.failures.len(), 1);
/// assert_eq!(report.failures[0].index, 1);
/// ```
pub fn run_all<F, Args, I, E, R>(
    function: &F,
    inputs: &I,
    expected: &E,
    reporter: &mut R,
) -> Result<BatchReport, HarnessError>
where
    F: Function<Args> + ?Sized,
    I: Reflect + ?Sized,
    E: Reflect + ?Sized,
    R: Reporter + ?Sized,
{
    Harness::default().run_all(function, inputs, expected, reporter)
}

fn env_harness() -> Harness {
    match Harness::from_env() {
        Ok(harness) => harness,
        Err(err) => panic!("{err}"),
    }
}

/// Runs one case inside a `#[test]`, panicking if it fails or is malformed.
///
/// The harness is configured from the environment (see
/// [`Config::from_env`]) and logs through `tracing`.
#[track_caller]
pub fn assert_case<F, Args, I, E>(function: &F, inputs: &I, expected: &E)
where
    F: Function<Args> + ?Sized,
    I: Reflect + ?Sized,
    E: Reflect + ?Sized,
{
    let mut reporter = TracingReporter::new();
    match env_harness().run_case(function, inputs, expected, &mut reporter) {
        Ok(CaseOutcome::Passed) => {}
        Ok(outcome) => panic!("FAIL ({})", outcome.diagnostic()),
        Err(err) => panic!("{err}"),
    }
}

/// Runs a whole table inside a `#[test]`, panicking after the last case if
/// any case failed, or immediately on a malformed table.
///
/// ```
/// use tabletest::assert_all;
///
/// fn divmod(a: u32, b: u32) -> (u32, u32) {
///     (a / b, a % b)
/// }
///
/// assert_all(&divmod, &[(7u32, 2u32), (9, 3)], &[(3u32, 1u32), (3, 0)]);
/// ```
#[track_caller]
pub fn assert_all<F, Args, I, E>(function: &F, inputs: &I, expected: &E)
where
    F: Function<Args> + ?Sized,
    I: Reflect + ?Sized,
    E: Reflect + ?Sized,
{
    let mut reporter = TracingReporter::new();
    match env_harness().run_all(function, inputs, expected, &mut reporter) {
        Ok(report) if report.is_success() => {}
        Ok(report) => panic!("{report}"),
        Err(err) => panic!("{err}"),
    }
}
