use crate::cli;
use ipranges::{Error, Filter, Result};

/*-------------------------------------------------------------------------------------------------
  Core functions
-------------------------------------------------------------------------------------------------*/

/*--------------------------------------------------------------------------------------
  Build IP range filters from CLI arguments
--------------------------------------------------------------------------------------*/

/// One service filter per positional service, plus a single attribute filter combining every
/// `--equals` and `--matches` condition. No arguments yields no filters (select everything).
pub fn build_filters(args: &cli::Args) -> Result<Vec<Filter>> {
    let mut filters: Vec<Filter> = args.services.iter().map(Filter::service).collect();

    if args.equals.is_empty() && args.matches.is_empty() {
        return Ok(filters);
    }

    let mut attributes = Filter::attributes();
    for argument in &args.equals {
        let (key, value) = parse_key_value(argument)?;
        attributes = attributes.equals(key, value);
    }
    for argument in &args.matches {
        let (key, pattern) = parse_key_value(argument)?;
        attributes = attributes.matches(key, pattern)?;
    }
    filters.push(attributes.build());

    Ok(filters)
}

/// Split a `KEY=VALUE` argument at the first `=`.
pub fn parse_key_value(argument: &str) -> Result<(&str, &str)> {
    match argument.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => Err(Error::InvalidFilter(format!(
            "expected KEY=VALUE, found {argument:?}"
        ))),
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
