use nom::{
    branch::alt,
    bytes::complete::{is_not, tag},
    character::complete::{char, digit1, multispace0, one_of},
    combinator::{all_consuming, opt, recognize},
    error::ParseError as NomParseError,
    multi::many1_count,
    sequence::{preceded, terminated},
    IResult, Parser,
};

use crate::error::ParseError;

/// Time units accepted by the proxy, e.g. `500ms`, `30s`, `1m`, `1h`.
fn time_unit<'a, E: NomParseError<&'a str>>(s: &'a str) -> IResult<&'a str, &'a str, E> {
    alt((
        tag("ms"),
        tag("s"),
        tag("m"),
        tag("h"),
        tag("d"),
        tag("w"),
        tag("M"),
        tag("y"),
    ))
    .parse(s)
}

fn time<'a, E: NomParseError<&'a str>>(s: &'a str) -> IResult<&'a str, usize, E> {
    all_consuming(many1_count(terminated(
        (digit1, opt(time_unit)),
        multispace0,
    )))
    .parse(s)
}

fn sized<'a, E: NomParseError<&'a str>>(
    units: &'static str,
) -> impl Parser<&'a str, Output = &'a str, Error = E> {
    recognize((digit1, opt(one_of(units))))
}

fn proxy_buffers<'a, E: NomParseError<&'a str>>(s: &'a str) -> IResult<&'a str, &'a str, E> {
    all_consuming(recognize((digit1, char(' '), sized(SIZE_UNITS)))).parse(s)
}

fn hash_method<'a, E: NomParseError<&'a str>>(s: &'a str) -> IResult<&'a str, &'a str, E> {
    all_consuming(recognize((
        preceded(tag("hash"), char(' ')),
        is_not(" \t\r\n"),
        opt(tag(" consistent")),
    )))
    .parse(s)
}

const OFFSET_UNITS: &str = "kKmMgG";
const SIZE_UNITS: &str = "kKmM";

const LB_METHODS: &[&str] = &[
    "least_conn",
    "ip_hash",
    "random",
    "random two",
    "random two least_conn",
];

const PLUS_LB_METHODS: &[&str] = &[
    "least_conn",
    "ip_hash",
    "random",
    "random two",
    "random two least_conn",
    "random two least_time=header",
    "random two least_time=last_byte",
    "least_time header",
    "least_time last_byte",
    "least_time header inflight",
    "least_time last_byte inflight",
];

/// Validates a proxy time value such as `30s`, `1m30s` or `1m 30s`.
///
/// The value is returned as written (trimmed); units are not normalized or summed.
pub fn parse_time(s: &str) -> Result<String, ParseError> {
    let trimmed = s.trim();

    time::<nom::error::Error<_>>(trimmed)
        .map(|_| trimmed.to_string())
        .map_err(|_| ParseError::Time(s.to_string()))
}

/// Validates a size offset: a number with an optional `k`, `m` or `g` suffix in either case.
pub fn parse_offset(s: &str) -> Result<String, ParseError> {
    all_consuming(sized::<nom::error::Error<_>>(OFFSET_UNITS))
        .parse(s)
        .map(|(_, value)| value.to_string())
        .map_err(|_| ParseError::Offset(s.to_string()))
}

/// Validates a size: a number with an optional `k` or `m` suffix in either case.
pub fn parse_size(s: &str) -> Result<String, ParseError> {
    all_consuming(sized::<nom::error::Error<_>>(SIZE_UNITS))
        .parse(s)
        .map(|(_, value)| value.to_string())
        .map_err(|_| ParseError::Size(s.to_string()))
}

/// Validates a `<count> <size>` pair as used by `proxy_buffers`, separated by exactly one space.
pub fn parse_proxy_buffers_spec(s: &str) -> Result<String, ParseError> {
    proxy_buffers::<nom::error::Error<_>>(s)
        .map(|(_, value)| value.to_string())
        .map_err(|_| ParseError::ProxyBuffers(s.to_string()))
}

/// Accepts unsigned base-10 integers only.
pub fn parse_non_negative_int(s: &str) -> Result<u32, ParseError> {
    all_consuming(digit1::<_, nom::error::Error<_>>)
        .parse(s)
        .ok()
        .and_then(|(_, digits)| digits.parse().ok())
        .ok_or_else(|| ParseError::NonNegativeInt(s.to_string()))
}

pub fn parse_int64(s: &str) -> Result<i64, ParseError> {
    s.parse().map_err(|_| ParseError::Int(s.to_string()))
}

pub fn parse_bool(s: &str) -> Result<bool, ParseError> {
    match s {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(ParseError::Bool(s.to_string())),
    }
}

/// Validates a load balancing method.
///
/// `round_robin` is the proxy default and resolves to an empty string.
pub fn parse_lb_method(s: &str, is_plus: bool) -> Result<String, ParseError> {
    let method = s.trim();

    if method == "round_robin" {
        return Ok(String::new());
    }

    if method.starts_with("hash") {
        return hash_method::<nom::error::Error<_>>(method)
            .map(|(_, value)| value.to_string())
            .map_err(|_| ParseError::LbMethod(s.to_string()));
    }

    let valid = if is_plus { PLUS_LB_METHODS } else { LB_METHODS };

    if valid.contains(&method) {
        Ok(method.to_string())
    } else {
        Err(ParseError::LbMethod(s.to_string()))
    }
}

/// Parses a comma separated list of ports, e.g. `80,8080`. Entries are not trimmed.
pub fn parse_ports(s: &str) -> Result<Vec<u16>, ParseError> {
    s.split(',')
        .map(|port| {
            all_consuming(digit1::<_, nom::error::Error<_>>)
                .parse(port)
                .ok()
                .and_then(|(_, digits)| digits.parse::<u16>().ok())
                .filter(|port| *port > 0)
                .ok_or_else(|| ParseError::Ports(s.to_string()))
        })
        .collect()
}

/// Splits a comma separated list, dropping empty entries.
pub fn parse_comma_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Splits a multi-line value (snippets) into lines.
pub fn parse_lines(s: &str) -> Vec<String> {
    s.lines().map(ToString::to_string).collect()
}
