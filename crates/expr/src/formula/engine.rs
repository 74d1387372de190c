//! Evaluates a parsed [`Formula`] against a data row.
use super::ast::{BinaryOp, Formula, UnaryOp};
use crate::error::FormulaError;
use quire_data::DataRow;
use quire_types::Value;
use std::cmp::Ordering;

pub fn evaluate(formula: &Formula, row: &DataRow) -> Result<Value, FormulaError> {
    match formula {
        Formula::Literal(v) => Ok(v.clone()),
        Formula::Field(name) => Ok(row.get(name)),
        Formula::Unary(op, inner) => {
            let v = evaluate(inner, row)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!v.is_truthy())),
                UnaryOp::Negate => match v {
                    Value::Null => Ok(Value::Null),
                    other => Ok(Value::Number(-number(&other)?)),
                },
            }
        }
        Formula::Binary(BinaryOp::And, l, r) => {
            Ok(Value::Bool(evaluate(l, row)?.is_truthy() && evaluate(r, row)?.is_truthy()))
        }
        Formula::Binary(BinaryOp::Or, l, r) => {
            Ok(Value::Bool(evaluate(l, row)?.is_truthy() || evaluate(r, row)?.is_truthy()))
        }
        Formula::Binary(op, l, r) => binary(*op, evaluate(l, row)?, evaluate(r, row)?),
        Formula::Call { name, args } if name == "IF" => {
            if args.len() < 2 || args.len() > 3 {
                return Err(FormulaError::Arity {
                    function: name.clone(),
                    expected: 3,
                    actual: args.len(),
                });
            }
            if evaluate(&args[0], row)?.is_truthy() {
                evaluate(&args[1], row)
            } else {
                args.get(2).map_or(Ok(Value::Bool(false)), |a| evaluate(a, row))
            }
        }
        Formula::Call { name, args } => {
            let values = args
                .iter()
                .map(|a| evaluate(a, row))
                .collect::<Result<Vec<_>, _>>()?;
            call(name, values)
        }
    }
}

fn number(v: &Value) -> Result<f64, FormulaError> {
    v.as_f64()
        .ok_or_else(|| FormulaError::TypeError(format!("'{v}' is not a number")))
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) if !matches!((a, b), (Value::Text(_), Value::Text(_))) => x.total_cmp(&y),
        _ => a.display_text().cmp(&b.display_text()),
    }
}

fn binary(op: BinaryOp, l: Value, r: Value) -> Result<Value, FormulaError> {
    let arithmetic = |f: fn(f64, f64) -> f64| -> Result<Value, FormulaError> {
        if l.is_null() || r.is_null() {
            return Ok(Value::Null);
        }
        Ok(Value::Number(f(number(&l)?, number(&r)?)))
    };
    match op {
        BinaryOp::Add => arithmetic(|a, b| a + b),
        BinaryOp::Subtract => arithmetic(|a, b| a - b),
        BinaryOp::Multiply => arithmetic(|a, b| a * b),
        BinaryOp::Divide => {
            if !r.is_null() && number(&r)? == 0.0 {
                return Err(FormulaError::DivisionByZero);
            }
            arithmetic(|a, b| a / b)
        }
        BinaryOp::Concat => Ok(Value::text(format!("{}{}", l.display_text(), r.display_text()))),
        BinaryOp::Equal => Ok(Value::Bool(compare(&l, &r) == Ordering::Equal)),
        BinaryOp::NotEqual => Ok(Value::Bool(compare(&l, &r) != Ordering::Equal)),
        BinaryOp::Less => Ok(Value::Bool(compare(&l, &r) == Ordering::Less)),
        BinaryOp::LessEqual => Ok(Value::Bool(compare(&l, &r) != Ordering::Greater)),
        BinaryOp::Greater => Ok(Value::Bool(compare(&l, &r) == Ordering::Greater)),
        BinaryOp::GreaterEqual => Ok(Value::Bool(compare(&l, &r) != Ordering::Less)),
        BinaryOp::And => Ok(Value::Bool(l.is_truthy() && r.is_truthy())),
        BinaryOp::Or => Ok(Value::Bool(l.is_truthy() || r.is_truthy())),
    }
}

fn expect_args(name: &str, args: &[Value], expected: usize) -> Result<(), FormulaError> {
    if args.len() != expected {
        return Err(FormulaError::Arity {
            function: name.to_string(),
            expected,
            actual: args.len(),
        });
    }
    Ok(())
}

fn call(name: &str, args: Vec<Value>) -> Result<Value, FormulaError> {
    match name {
        "ISNULL" => {
            expect_args(name, &args, 1)?;
            Ok(Value::Bool(args[0].is_null()))
        }
        "UPPER" => {
            expect_args(name, &args, 1)?;
            Ok(Value::text(args[0].display_text().to_uppercase()))
        }
        "LOWER" => {
            expect_args(name, &args, 1)?;
            Ok(Value::text(args[0].display_text().to_lowercase()))
        }
        "LEN" => {
            expect_args(name, &args, 1)?;
            Ok(Value::from(args[0].display_text().chars().count()))
        }
        "ROUND" => {
            let digits = match args.len() {
                1 => 0.0,
                2 => number(&args[1])?,
                n => {
                    return Err(FormulaError::Arity {
                        function: name.to_string(),
                        expected: 2,
                        actual: n,
                    });
                }
            };
            if args[0].is_null() {
                return Ok(Value::Null);
            }
            let scale = 10f64.powi(digits as i32);
            Ok(Value::Number((number(&args[0])? * scale).round() / scale))
        }
        "NOT" => {
            expect_args(name, &args, 1)?;
            Ok(Value::Bool(!args[0].is_truthy()))
        }
        _ => Err(FormulaError::UnknownFunction(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::parse_formula;
    use quire_data::{DefaultTableModel, Parameters};
    use std::sync::Arc;

    fn row() -> DataRow {
        let table = DefaultTableModel::new(["qty", "price", "name"]).with_row(vec![
            Value::from(3),
            Value::from(2.5),
            Value::from("widget"),
        ]);
        let mut row = DataRow::new(Parameters::new().with("discount", 1))
            .with_table(Arc::new(table), None);
        row.advance();
        row
    }

    fn eval(src: &str) -> Result<Value, FormulaError> {
        evaluate(&parse_formula(src).unwrap(), &row())
    }

    #[test]
    fn test_arithmetic_over_fields_and_parameters() {
        assert_eq!(eval("[qty] * [price] - [discount]"), Ok(Value::from(6.5)));
    }

    #[test]
    fn test_concat_and_functions() {
        assert_eq!(eval(r#"UPPER([name]) & " x" & [qty]"#), Ok(Value::from("WIDGET x3")));
        assert_eq!(eval("ROUND(2.375; 1)"), Ok(Value::from(2.4)));
        assert_eq!(eval("LEN([name])"), Ok(Value::from(6)));
    }

    #[test]
    fn test_conditionals() {
        assert_eq!(eval(r#"IF([qty] > 2; "many"; "few")"#), Ok(Value::from("many")));
        assert_eq!(eval("[qty] = 3 AND NOT ISNULL([name])"), Ok(Value::Bool(true)));
        assert_eq!(eval("[missing] + 1"), Ok(Value::Null));
    }

    #[test]
    fn test_errors() {
        assert_eq!(eval("1 / 0"), Err(FormulaError::DivisionByZero));
        assert!(matches!(eval("[name] * 2"), Err(FormulaError::TypeError(_))));
        assert!(matches!(eval("FOO(1)"), Err(FormulaError::UnknownFunction(_))));
    }
}
