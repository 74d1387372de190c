//! Expressions, report functions and the evaluator that runs them in
//! dependency order against the current data row.

pub mod error;
pub mod evaluator;
pub mod event;
pub mod expression;
pub mod formula;
pub mod functions;

pub use error::{EvaluationError, FormulaError};
pub use evaluator::{Checkpoint, ExpressionEvaluator, ExpressionSlot};
pub use event::{EventKind, ReportEvent};
pub use expression::{Expression, FormulaExpression, Function, Requirements};
pub use formula::{Formula, parse_formula};
pub use functions::{ItemCount, ItemSum, PageNumber, PageSum, PageTotal, RowBanding, TotalSum};
