//! Table-driven tests with a deep equality check that tolerates small
//! floating-point error.
//!
//! A table is a list of inputs and a list of expected outputs. Each input is
//! spread into the arguments of the function under test, each result is
//! compared against its expectation with [`Comparator`], and every failing
//! case is reported without stopping the rest of the table.
//!
//! ```
//! use tabletest::{assert_all, reflect_record};
//!
//! // Expectations for a two-output function; the field names label the
//! // outputs in failure logs.
//! #[derive(Debug, Clone)]
//! struct Polar {
//!     r: f64,
//!     theta: f64,
//! }
//! reflect_record!(Polar { r, theta });
//!
//! fn to_polar(x: f64, y: f64) -> (f64, f64) {
//!     (x.hypot(y), y.atan2(x))
//! }
//!
//! assert_all(
//!     &to_polar,
//!     &[(1.0, 0.0), (0.0, 2.0)],
//!     &[
//!         Polar { r: 1.0, theta: 0.0 },
//!         Polar { r: 2.0, theta: std::f64::consts::FRAC_PI_2 },
//!     ],
//! );
//! ```

pub mod compare;
pub mod config;
pub mod error;
pub mod function;
pub mod printer;
pub mod reflect;
pub mod report;
pub mod runner;
pub mod value;

pub use compare::{compare, is_equal, Comparator, Mismatch, MismatchReason, Step, DEFAULT_EPSILON};
pub use config::Config;
pub use error::{ConversionError, HarnessError};
pub use function::{DynFunction, Function, Outputs, Signature};
pub use printer::{render, Printer, DEFAULT_RENDER_CAP, TRUNCATION_MARKER};
pub use reflect::{FromValue, Reflect, Reflector};
pub use report::{Event, Recorder, Reporter, TracingReporter};
pub use runner::{
    assert_all, assert_case, run_all, run_case, BatchReport, CaseFailure, CaseOutcome, Harness,
};
pub use value::{Category, Field, Record, Scalar, Shared, Value};
