use ahash::AHashSet;
use nom::branch::alt;
use nom::bytes::complete::{escaped, is_not, tag, tag_no_case, take_while};
use nom::character::complete::{anychar, char, multispace0, multispace1, none_of, satisfy};
use nom::combinator::{all_consuming, map, opt, recognize};
use nom::error::{Error as NomError, ErrorKind};
use nom::multi::separated_list1;
use nom::sequence::{delimited, pair, terminated, tuple};
use nom::IResult;
use crate::common::constants::METRIC_NAME_LABEL;
use crate::common::types::Label;
use crate::error::{SeriesError, SeriesResult};

/// Metric name and labels of a single series, e.g. `up{job="api",env="prod"}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesSelector {
    pub metric_name: String,
    /// Labels in the order they were written. Doesn't include `__name__`.
    pub labels: Vec<Label>,
}

#[derive(Debug)]
struct RawMatcher<'a> {
    label: &'a str,
    op: &'a str,
    value: String,
}

type MatcherSet<'a> = Vec<RawMatcher<'a>>;

/// Metric name plus the matcher sets of its `{...}` block.
type RawSelector<'a> = (Option<&'a str>, Vec<MatcherSet<'a>>);

/// Parses a series selector describing exactly one series.
///
/// Only `=` matchers are accepted and each label may appear once. `or`, either between matcher
/// sets or between whole selectors, describes several series and is rejected.
pub fn parse_series_selector(s: &str) -> SeriesResult<SeriesSelector> {
    if s.trim().is_empty() {
        return Err(SeriesError::invalid_selector(s, "empty selector"));
    }

    let selectors = match all_consuming(selector_list)(s) {
        Ok((_, res)) => res,
        Err(_) => return Err(SeriesError::invalid_selector(s, "cannot parse series selector")),
    };
    if selectors.len() > 1 || selectors.iter().any(|(_, sets)| sets.len() > 1) {
        return Err(SeriesError::UnsupportedSelector(s.to_string()));
    }
    let (name, sets) = selectors.into_iter().next().unwrap_or_default();
    let matchers = sets.into_iter().next().unwrap_or_default();
    if name.is_none() && matchers.is_empty() {
        return Err(SeriesError::invalid_selector(s, "missing metric name or label filters"));
    }

    let mut metric_name = name.map(|n| n.to_string());
    let mut seen: AHashSet<&str> = AHashSet::with_capacity(matchers.len());
    let mut labels = Vec::with_capacity(matchers.len());
    for m in matchers {
        if m.op != "=" {
            let msg = format!("unsupported matcher `{}{}` for label {}; only `=` can describe a series", m.label, m.op, m.label);
            return Err(SeriesError::invalid_selector(s, &msg));
        }
        if m.label == METRIC_NAME_LABEL {
            if metric_name.is_some() {
                return Err(SeriesError::invalid_selector(s, "duplicate metric name"));
            }
            metric_name = Some(m.value);
            continue;
        }
        if !seen.insert(m.label) {
            let msg = format!("duplicate label {}", m.label);
            return Err(SeriesError::invalid_selector(s, &msg));
        }
        labels.push(Label::new(m.label.to_string(), m.value));
    }

    let metric_name = metric_name.unwrap_or_default();
    if metric_name.is_empty() && labels.is_empty() {
        return Err(SeriesError::invalid_selector(s, "series has neither a metric name nor labels"));
    }

    Ok(SeriesSelector { metric_name, labels })
}

/// One or more selectors joined by `or`.
fn selector_list(input: &str) -> IResult<&str, Vec<RawSelector>> {
    separated_list1(or_keyword, selector)(input)
}

/// `or` may directly follow a closing quote or brace, but must be followed by whitespace.
fn or_keyword(input: &str) -> IResult<&str, &str> {
    delimited(multispace0, tag_no_case("or"), multispace1)(input)
}

/// `name`, `name{...}` or `{...}`, where `{...}` may hold several matcher sets joined by `or`.
fn selector(input: &str) -> IResult<&str, RawSelector> {
    map(
        delimited(multispace0, pair(opt(metric_name), opt(label_block)), multispace0),
        |(name, sets)| (name, sets.flatten().unwrap_or_default()),
    )(input)
}

fn label_block(input: &str) -> IResult<&str, Option<Vec<MatcherSet>>> {
    delimited(
        pair(char('{'), multispace0),
        opt(separated_list1(or_keyword, matcher_set)),
        pair(multispace0, char('}')),
    )(input)
}

fn matcher_set(input: &str) -> IResult<&str, MatcherSet> {
    terminated(
        separated_list1(tuple((multispace0, char(','), multispace0)), matcher),
        opt(pair(multispace0, char(','))),
    )(input)
}

fn matcher(input: &str) -> IResult<&str, RawMatcher> {
    map(
        tuple((label_name, multispace0, match_op, multispace0, quoted_string)),
        |(label, _, op, _, value)| RawMatcher { label, op, value },
    )(input)
}

fn match_op(input: &str) -> IResult<&str, &str> {
    alt((tag("=~"), tag("!~"), tag("!="), tag("=")))(input)
}

fn metric_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_' || c == ':'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == ':'),
    ))(input)
}

fn label_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

/// A `"..."`, `'...'` or `` `...` `` string. Backticks are raw; the others honour escapes.
fn quoted_string(input: &str) -> IResult<&str, String> {
    let (rest, raw) = alt((
        recognize(delimited(char('"'), opt(escaped(none_of("\\\""), '\\', anychar)), char('"'))),
        recognize(delimited(char('\''), opt(escaped(none_of("\\'"), '\\', anychar)), char('\''))),
        recognize(delimited(char('`'), opt(is_not("`")), char('`'))),
    ))(input)?;

    if let Some(value) = raw.strip_prefix('`').and_then(|r| r.strip_suffix('`')) {
        return Ok((rest, value.to_string()));
    }
    match enquote::unquote(raw) {
        Ok(value) => Ok((rest, value)),
        Err(_) => Err(nom::Err::Failure(NomError::new(input, ErrorKind::Escaped))),
    }
}
