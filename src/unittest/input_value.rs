use nom::branch::alt;
use nom::bytes::complete::tag_no_case;
use nom::character::complete::{char, digit1};
use nom::combinator::{all_consuming, map, map_res, opt, value};
use nom::number::complete::recognize_float;
use nom::sequence::{pair, preceded, tuple};
use nom::IResult;
use serde::{Deserialize, Serialize};
use crate::common::constants::{is_stale_nan, STALE_NAN};
use crate::error::{SeriesError, SeriesResult};

/// Upper bound on the number of steps a single values expression may expand to.
/// Exceeding it fails the expression instead of exhausting memory.
pub const MAX_INPUT_STEPS: usize = 1 << 20;

/// A single step of an input series.
///
/// If `omitted` is set the step has no sample at all and `value` must be ignored.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SequenceValue {
    pub omitted: bool,
    pub value: f64,
}

impl SequenceValue {
    pub fn new(value: f64) -> Self {
        SequenceValue { omitted: false, value }
    }

    pub fn omitted() -> Self {
        SequenceValue { omitted: true, value: 0.0 }
    }

    pub fn stale() -> Self {
        SequenceValue::new(STALE_NAN)
    }

    pub fn is_stale(&self) -> bool {
        !self.omitted && is_stale_nan(self.value)
    }
}

/// Omitted steps are equal regardless of value. NaN equals NaN, while the stale marker only
/// equals itself.
impl PartialEq for SequenceValue {
    fn eq(&self, other: &Self) -> bool {
        if self.omitted || other.omitted {
            return self.omitted == other.omitted;
        }
        if self.value.is_nan() || other.value.is_nan() {
            return self.value.is_nan()
                && other.value.is_nan()
                && is_stale_nan(self.value) == is_stale_nan(other.value);
        }
        self.value == other.value
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TokenValue {
    Omitted,
    Stale,
    Number(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepOp {
    Plus,
    Minus,
}

/// Parsed form of one whitespace-separated item, e.g. `1+2x3` or `_x4`.
#[derive(Debug, Clone, PartialEq)]
struct ValueToken {
    base: TokenValue,
    op: Option<StepOp>,
    step: Option<TokenValue>,
    repeat: Option<u64>,
}

impl ValueToken {
    fn single(base: TokenValue) -> Self {
        ValueToken { base, op: None, step: None, repeat: None }
    }

    /// Appends the values denoted by the token to `dst`. `raw` is the source text, for errors.
    fn expand(&self, raw: &str, dst: &mut Vec<SequenceValue>) -> SeriesResult<()> {
        match self.base {
            // `_xN` yields a single omitted step, whatever N is.
            TokenValue::Omitted => dst.push(SequenceValue::omitted()),
            TokenValue::Stale => {
                if self.op.is_some() || self.repeat.is_some() {
                    return Err(SeriesError::UnsupportedOperation(raw.to_string()));
                }
                dst.push(SequenceValue::stale());
            }
            TokenValue::Number(base) => {
                let count = self.repeat.unwrap_or(0);
                let total = usize::try_from(count)
                    .ok()
                    .and_then(|n| n.checked_add(1))
                    .and_then(|n| n.checked_add(dst.len()));
                match total {
                    Some(n) if n <= MAX_INPUT_STEPS => dst.reserve(n - dst.len()),
                    _ => return Err(SeriesError::malformed(raw, "repeat count too large")),
                }
                match (self.op, self.step) {
                    (None, _) => {
                        for _ in 0..=count {
                            dst.push(SequenceValue::new(base));
                        }
                    }
                    (Some(op), Some(TokenValue::Number(step))) => {
                        for i in 0..=count {
                            let delta = step * i as f64;
                            let v = match op {
                                StepOp::Plus => base + delta,
                                StepOp::Minus => base - delta,
                            };
                            dst.push(SequenceValue::new(v));
                        }
                    }
                    (Some(_), Some(TokenValue::Stale)) => {
                        return Err(SeriesError::UnsupportedOperation(raw.to_string()));
                    }
                    (Some(_), _) => return Err(SeriesError::malformed(raw, "missing step value")),
                }
            }
        }
        Ok(())
    }
}

/// Parses a values expression such as `1+1x2 _ stale 3` into the steps it denotes.
///
/// Supported items:
///   * `a` - a float, or one of `nan`, `inf`, `+inf`, `-inf`, `stale` (case-insensitive)
///   * `_` - an omitted step
///   * `axN` - N+1 copies of a
///   * `a+bxN`, `a-bxN` - N+1 values starting at a, changing by b at each step
///
/// The first bad item fails the whole expression.
pub fn parse_input_value(input: &str) -> SeriesResult<Vec<SequenceValue>> {
    let mut items = input.split_whitespace().peekable();
    if items.peek().is_none() {
        return Err(SeriesError::EmptyExpression);
    }
    let mut res = Vec::new();
    for item in items {
        let token = parse_token(item)?;
        token.expand(item, &mut res)?;
    }
    Ok(res)
}

fn parse_token(item: &str) -> SeriesResult<ValueToken> {
    match all_consuming(token)(item) {
        Ok((_, t)) => Ok(t),
        Err(_) if item.starts_with('x') => Err(SeriesError::malformed(item, "missing base value")),
        Err(_) => Err(SeriesError::malformed(item, "cannot parse value")),
    }
}

fn token(input: &str) -> IResult<&str, ValueToken> {
    alt((omitted_token, value_token))(input)
}

fn omitted_token(input: &str) -> IResult<&str, ValueToken> {
    map(preceded(char('_'), opt(repeat_count)), |repeat| ValueToken {
        repeat,
        ..ValueToken::single(TokenValue::Omitted)
    })(input)
}

fn value_token(input: &str) -> IResult<&str, ValueToken> {
    map(pair(literal, opt(suffix)), |(base, suffix)| match suffix {
        None => ValueToken::single(base),
        Some((None, n)) => ValueToken {
            repeat: Some(n),
            ..ValueToken::single(base)
        },
        Some((Some((op, step)), n)) => ValueToken {
            base,
            op: Some(op),
            step: Some(step),
            repeat: Some(n),
        },
    })(input)
}

/// `+bxN`, `-bxN` or `xN`
fn suffix(input: &str) -> IResult<&str, (Option<(StepOp, TokenValue)>, u64)> {
    alt((
        map(tuple((step_op, literal, repeat_count)), |(op, step, n)| (Some((op, step)), n)),
        map(repeat_count, |n| (None, n)),
    ))(input)
}

fn step_op(input: &str) -> IResult<&str, StepOp> {
    alt((
        value(StepOp::Plus, char('+')),
        value(StepOp::Minus, char('-')),
    ))(input)
}

fn repeat_count(input: &str) -> IResult<&str, u64> {
    preceded(char('x'), map_res(digit1, |s: &str| s.parse::<u64>()))(input)
}

fn literal(input: &str) -> IResult<&str, TokenValue> {
    alt((keyword, number))(input)
}

fn keyword(input: &str) -> IResult<&str, TokenValue> {
    alt((
        value(TokenValue::Stale, tag_no_case("stale")),
        value(TokenValue::Number(f64::NAN), tag_no_case("nan")),
        value(TokenValue::Number(f64::INFINITY), tag_no_case("+inf")),
        value(TokenValue::Number(f64::NEG_INFINITY), tag_no_case("-inf")),
        value(TokenValue::Number(f64::INFINITY), tag_no_case("inf")),
    ))(input)
}

fn number(input: &str) -> IResult<&str, TokenValue> {
    map_res(recognize_float, |s: &str| s.parse::<f64>().map(TokenValue::Number))(input)
}
