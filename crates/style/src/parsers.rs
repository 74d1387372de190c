//! `nom` parsers for textual style values ("12pt", "50%", "2mm 4mm").

use crate::dimension::{Dimension, Insets};
use nom::IResult;
use nom::Parser;
use nom::branch::alt;
use nom::bytes::complete::{tag_no_case, take_while1};
use nom::character::complete::{char, multispace0, multispace1};
use nom::combinator::{all_consuming, map, map_res, opt, recognize};
use nom::multi::separated_list1;
use nom::sequence::{delimited, pair, preceded};
use quire_types::Pt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StyleParseError {
    #[error("Cannot parse '{input}' as {expected}")]
    Invalid {
        input: String,
        expected: &'static str,
    },

    #[error("Shorthand '{0}' must have 1, 2 or 4 values")]
    ShorthandArity(String),
}

fn decimal(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(pair(
            opt(alt((char('+'), char('-')))),
            alt((
                recognize(pair(
                    take_while1(|c: char| c.is_ascii_digit()),
                    opt(preceded(char('.'), take_while1(|c: char| c.is_ascii_digit()))),
                )),
                recognize(preceded(char('.'), take_while1(|c: char| c.is_ascii_digit()))),
            )),
        )),
        |s: &str| s.parse::<f64>(),
    )
    .parse(input)
}

/// Points per unit for the accepted length suffixes.
fn unit(input: &str) -> IResult<&str, f64> {
    alt((
        map(tag_no_case("pt"), |_| 1.0),
        map(tag_no_case("px"), |_| 1.0),
        map(tag_no_case("in"), |_| 72.0),
        map(tag_no_case("cm"), |_| 72.0 / 2.54),
        map(tag_no_case("mm"), |_| 72.0 / 25.4),
    ))
    .parse(input)
}

fn length(input: &str) -> IResult<&str, Pt> {
    map(pair(decimal, opt(unit)), |(value, scale)| {
        Pt::from_f64(value * scale.unwrap_or(1.0))
    })
    .parse(input)
}

fn dimension(input: &str) -> IResult<&str, Dimension> {
    alt((
        map(tag_no_case("auto"), |_| Dimension::Auto),
        map(tag_no_case("none"), |_| Dimension::Auto),
        map(pair(decimal, char('%')), |(value, _)| {
            Dimension::Percent((value * 100.0).round() as i64)
        }),
        map(length, Dimension::Pt),
    ))
    .parse(input)
}

fn trimmed<'a, O>(
    inner: impl Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>,
) -> impl Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>> {
    all_consuming(delimited(multispace0, inner, multispace0))
}

/// Parses a single length ("12", "12pt", "1in", "2.5mm").
pub fn parse_length(input: &str) -> Result<Pt, StyleParseError> {
    trimmed(length)
        .parse(input)
        .map(|(_, v)| v)
        .map_err(|_| StyleParseError::Invalid {
            input: input.to_string(),
            expected: "a length",
        })
}

/// Parses a length, a percentage or `auto`.
pub fn parse_dimension(input: &str) -> Result<Dimension, StyleParseError> {
    trimmed(dimension)
        .parse(input)
        .map(|(_, v)| v)
        .map_err(|_| StyleParseError::Invalid {
            input: input.to_string(),
            expected: "a dimension",
        })
}

/// Parses CSS shorthand insets with 1, 2 or 4 lengths.
pub fn parse_insets(input: &str) -> Result<Insets, StyleParseError> {
    let (_, parts) = trimmed(separated_list1(multispace1, length))
        .parse(input)
        .map_err(|_| StyleParseError::Invalid {
            input: input.to_string(),
            expected: "insets",
        })?;
    match parts.as_slice() {
        [all] => Ok(Insets::all(*all)),
        [y, x] => Ok(Insets {
            top: *y,
            right: *x,
            bottom: *y,
            left: *x,
        }),
        [top, right, bottom, left] => Ok(Insets {
            top: *top,
            right: *right,
            bottom: *bottom,
            left: *left,
        }),
        _ => Err(StyleParseError::ShorthandArity(input.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lengths() {
        assert_eq!(parse_length("12"), Ok(Pt::pt(12)));
        assert_eq!(parse_length(" 12pt "), Ok(Pt::pt(12)));
        assert_eq!(parse_length("1in"), Ok(Pt::pt(72)));
        assert_eq!(parse_length("-4.5"), Ok(Pt::from_units(-4_500)));
        assert!(parse_length("twelve").is_err());
    }

    #[test]
    fn test_dimensions() {
        assert_eq!(parse_dimension("auto"), Ok(Dimension::Auto));
        assert_eq!(parse_dimension("50%"), Ok(Dimension::Percent(5_000)));
        assert_eq!(parse_dimension("12.5%"), Ok(Dimension::Percent(1_250)));
        assert_eq!(parse_dimension("20pt"), Ok(Dimension::Pt(Pt::pt(20))));
    }

    #[test]
    fn test_insets_shorthand() {
        assert_eq!(parse_insets("4"), Ok(Insets::all(Pt::pt(4))));
        let two = parse_insets("2 6").unwrap();
        assert_eq!((two.top, two.right, two.bottom, two.left), (Pt::pt(2), Pt::pt(6), Pt::pt(2), Pt::pt(6)));
        assert!(matches!(parse_insets("1 2 3"), Err(StyleParseError::ShorthandArity(_))));
    }
}
