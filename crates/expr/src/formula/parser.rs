//! A `nom`-based parser for report formulas.
//!
//! ```text
//! or      := and ("OR" and)*
//! and     := not ("AND" not)*
//! not     := "NOT" not | compare
//! compare := concat (("=" | "<>" | "<=" | ">=" | "<" | ">") concat)?
//! concat  := sum ("&" sum)*
//! sum     := product (("+" | "-") product)*
//! product := unary (("*" | "/") unary)*
//! unary   := "-" unary | primary
//! primary := number | "text" | TRUE | FALSE | NULL | [field] | NAME(args) | (or)
//! ```
use super::ast::{BinaryOp, Formula, UnaryOp};
use crate::error::FormulaError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{is_not, tag, tag_no_case, take_while},
    character::complete::{alpha1, char, multispace0, satisfy},
    combinator::{map, not, opt, peek, recognize, value},
    multi::{many0, separated_list0},
    number::complete::double,
    sequence::{delimited, pair, preceded, terminated},
};
use quire_types::Value;

pub fn parse_formula(input: &str) -> Result<Formula, FormulaError> {
    let source = input.strip_prefix('=').unwrap_or(input);
    match or_expr(source.trim()) {
        Ok(("", formula)) => Ok(formula),
        Ok((rem, _)) => Err(FormulaError::Parse(
            input.to_string(),
            format!("unexpected input at '{rem}'"),
        )),
        Err(e) => Err(FormulaError::Parse(input.to_string(), e.to_string())),
    }
}

fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: nom::error::ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

/// A case-insensitive keyword not followed by an identifier character.
fn keyword<'a>(word: &'static str) -> impl Parser<&'a str, Output = &'a str, Error = nom::error::Error<&'a str>> {
    terminated(
        tag_no_case(word),
        not(peek(satisfy(|c: char| c.is_alphanumeric() || c == '_'))),
    )
}

fn fold(first: Formula, rest: Vec<(BinaryOp, Formula)>) -> Formula {
    rest.into_iter().fold(first, |acc, (op, rhs)| {
        Formula::Binary(op, Box::new(acc), Box::new(rhs))
    })
}

fn or_expr(input: &str) -> IResult<&str, Formula> {
    let (input, first) = and_expr(input)?;
    let (input, rest) = many0(pair(value(BinaryOp::Or, ws(keyword("OR"))), and_expr)).parse(input)?;
    Ok((input, fold(first, rest)))
}

fn and_expr(input: &str) -> IResult<&str, Formula> {
    let (input, first) = not_expr(input)?;
    let (input, rest) = many0(pair(value(BinaryOp::And, ws(keyword("AND"))), not_expr)).parse(input)?;
    Ok((input, fold(first, rest)))
}

fn not_expr(input: &str) -> IResult<&str, Formula> {
    alt((
        map(preceded(ws(keyword("NOT")), not_expr), |f| {
            Formula::Unary(UnaryOp::Not, Box::new(f))
        }),
        compare_expr,
    ))
    .parse(input)
}

fn compare_op(input: &str) -> IResult<&str, BinaryOp> {
    ws(alt((
        value(BinaryOp::NotEqual, tag("<>")),
        value(BinaryOp::NotEqual, tag("!=")),
        value(BinaryOp::LessEqual, tag("<=")),
        value(BinaryOp::GreaterEqual, tag(">=")),
        value(BinaryOp::Equal, tag("==")),
        value(BinaryOp::Equal, tag("=")),
        value(BinaryOp::Less, tag("<")),
        value(BinaryOp::Greater, tag(">")),
    )))
    .parse(input)
}

fn compare_expr(input: &str) -> IResult<&str, Formula> {
    let (input, lhs) = concat_expr(input)?;
    let (input, rhs) = opt(pair(compare_op, concat_expr)).parse(input)?;
    Ok((input, fold(lhs, rhs.into_iter().collect())))
}

fn concat_expr(input: &str) -> IResult<&str, Formula> {
    let (input, first) = sum_expr(input)?;
    let (input, rest) = many0(pair(value(BinaryOp::Concat, ws(char('&'))), sum_expr)).parse(input)?;
    Ok((input, fold(first, rest)))
}

fn sum_expr(input: &str) -> IResult<&str, Formula> {
    let (input, first) = product_expr(input)?;
    let (input, rest) = many0(pair(
        ws(alt((
            value(BinaryOp::Add, char('+')),
            value(BinaryOp::Subtract, char('-')),
        ))),
        product_expr,
    ))
    .parse(input)?;
    Ok((input, fold(first, rest)))
}

fn product_expr(input: &str) -> IResult<&str, Formula> {
    let (input, first) = unary_expr(input)?;
    let (input, rest) = many0(pair(
        ws(alt((
            value(BinaryOp::Multiply, char('*')),
            value(BinaryOp::Divide, char('/')),
        ))),
        unary_expr,
    ))
    .parse(input)?;
    Ok((input, fold(first, rest)))
}

fn unary_expr(input: &str) -> IResult<&str, Formula> {
    alt((
        map(preceded(ws(char('-')), unary_expr), |f| {
            Formula::Unary(UnaryOp::Negate, Box::new(f))
        }),
        primary,
    ))
    .parse(input)
}

fn string_literal(input: &str) -> IResult<&str, Value> {
    // `""` inside a string is an escaped quote.
    map(
        delimited(
            char('"'),
            many0(alt((map(is_not("\""), str::to_string), value("\"".to_string(), tag("\"\""))))),
            char('"'),
        ),
        |parts: Vec<String>| Value::text(parts.concat()),
    )
    .parse(input)
}

fn literal(input: &str) -> IResult<&str, Value> {
    alt((
        value(Value::Bool(true), keyword("TRUE")),
        value(Value::Bool(false), keyword("FALSE")),
        value(Value::Null, keyword("NULL")),
        map(double, Value::Number),
        string_literal,
    ))
    .parse(input)
}

fn field(input: &str) -> IResult<&str, Formula> {
    map(delimited(char('['), is_not("]"), char(']')), |name: &str| {
        Formula::Field(name.trim().to_string())
    })
    .parse(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '.'),
    ))
    .parse(input)
}

fn call(input: &str) -> IResult<&str, Formula> {
    let (input, name) = identifier(input)?;
    let (input, _) = multispace0(input)?;
    let (input, args) = delimited(
        char('('),
        separated_list0(ws(alt((char(';'), char(',')))), ws(or_expr)),
        char(')'),
    )
    .parse(input)?;
    Ok((
        input,
        Formula::Call {
            name: name.to_ascii_uppercase(),
            args,
        },
    ))
}

fn primary(input: &str) -> IResult<&str, Formula> {
    ws(alt((
        delimited(char('('), ws(or_expr), char(')')),
        field,
        call,
        map(literal, Formula::Literal),
    )))
    .parse(input)
}
