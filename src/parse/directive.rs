use nom::{
    bytes::complete::{is_not, tag},
    character::complete::{multispace0, multispace1},
    combinator::{all_consuming, map, rest, verify},
    error::ParseError as NomParseError,
    sequence::{delimited, preceded, separated_pair},
    IResult, Parser,
};

use crate::error::ParseError;

const SERVICE_NAME_KEY: &str = "serviceName=";

/// A service-scoped directive: `serviceName=<service> <payload>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDirective {
    pub service_name: String,
    pub payload: String,
}

/// A whitespace-delimited value that contains no `=`.
fn token<'a, E: NomParseError<&'a str>>(s: &'a str) -> IResult<&'a str, &'a str, E> {
    is_not(" \t\r\n=").parse(s)
}

fn service_name<'a, E: NomParseError<&'a str>>(s: &'a str) -> IResult<&'a str, &'a str, E> {
    preceded(tag(SERVICE_NAME_KEY), token).parse(s)
}

fn rewrite_path<'a, E: NomParseError<&'a str>>(s: &'a str) -> IResult<&'a str, &'a str, E> {
    preceded(tag("rewrite="), token).parse(s)
}

fn cookie_spec<'a, E: NomParseError<&'a str>>(s: &'a str) -> IResult<&'a str, &'a str, E> {
    verify(map(rest, str::trim_end), |spec: &str| {
        !spec.is_empty()
            && !spec
                .split_whitespace()
                .any(|t| t.starts_with(SERVICE_NAME_KEY))
    })
    .parse(s)
}

fn rewrite<'a, E: NomParseError<&'a str>>(
    s: &'a str,
) -> IResult<&'a str, (&'a str, &'a str), E> {
    all_consuming(delimited(
        multispace0,
        separated_pair(service_name, multispace1, rewrite_path),
        multispace0,
    ))
    .parse(s)
}

fn sticky_service<'a, E: NomParseError<&'a str>>(
    s: &'a str,
) -> IResult<&'a str, (&'a str, &'a str), E> {
    all_consuming(preceded(
        multispace0,
        separated_pair(service_name, multispace1, cookie_spec),
    ))
    .parse(s)
}

/// Parses a single rewrite declaration, e.g. `serviceName=tea-svc rewrite=/`.
pub fn parse_rewrite(directive: &str) -> Result<ServiceDirective, ParseError> {
    let (_, (service_name, path)) =
        rewrite::<nom::error::Error<_>>(directive).map_err(|_| ParseError::Directive {
            directive: "rewrite",
            value: directive.to_string(),
        })?;

    Ok(ServiceDirective {
        service_name: service_name.to_string(),
        payload: path.to_string(),
    })
}

/// Parses a single sticky cookie declaration, e.g.
/// `serviceName=tea-svc srv_id expires=1h path=/`.
///
/// Everything after the service name is kept verbatim as the cookie specification.
pub fn parse_sticky_service(directive: &str) -> Result<ServiceDirective, ParseError> {
    let (_, (service_name, cookie)) = sticky_service::<nom::error::Error<_>>(directive)
        .map_err(|_| ParseError::Directive {
            directive: "sticky-cookie-services",
            value: directive.to_string(),
        })?;

    Ok(ServiceDirective {
        service_name: service_name.to_string(),
        payload: cookie.to_string(),
    })
}
