//! The formula language used by computed fields and style expressions.
//!
//! Formulas reference row values as `[name]`, support arithmetic, `&`
//! concatenation, comparisons, `AND`/`OR`/`NOT` and a few functions
//! (`IF`, `ISNULL`, `UPPER`, `LOWER`, `LEN`, `ROUND`). Arguments are separated
//! by `;` or `,`.

pub mod ast;
pub mod engine;
mod parser;

pub use ast::{BinaryOp, Formula, UnaryOp};
pub use engine::evaluate;
pub use parser::parse_formula;
