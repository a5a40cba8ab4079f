use crate::candidate::CandidatePath;
use crate::error::{QueryError, Result};

use super::methods;
use super::registry::{Arity, Matcher, PredicateRegistry};

pub(super) fn register_builtins(registry: &mut PredicateRegistry) {
    registry.register(methods::DATETIME_AFTER, Arity::Exact(1), datetime_after);
    registry.register(methods::DATETIME_BEFORE, Arity::Exact(1), datetime_before);
    registry.register(
        methods::OBSERVER_ID_CONTAINS,
        Arity::Variadic,
        observer_id_contains,
    );
    registry.register(
        methods::OBSERVATION_ID_CONTAINS,
        Arity::Variadic,
        observation_id_contains,
    );
}

fn datetime_after(args: &[String]) -> Result<Matcher> {
    let bound = parse_millis(methods::DATETIME_AFTER, args)?;
    Ok(Box::new(move |candidate: &CandidatePath| {
        candidate.timestamp() > bound
    }))
}

fn datetime_before(args: &[String]) -> Result<Matcher> {
    let bound = parse_millis(methods::DATETIME_BEFORE, args)?;
    Ok(Box::new(move |candidate: &CandidatePath| {
        candidate.timestamp() < bound
    }))
}

fn observer_id_contains(args: &[String]) -> Result<Matcher> {
    let needles = args.to_vec();
    Ok(Box::new(move |candidate: &CandidatePath| {
        contains_any(candidate.observer_id(), &needles)
    }))
}

fn observation_id_contains(args: &[String]) -> Result<Matcher> {
    let needles = args.to_vec();
    Ok(Box::new(move |candidate: &CandidatePath| {
        contains_any(candidate.observation_id(), &needles)
    }))
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle.as_str()))
}

fn parse_millis(method: &str, args: &[String]) -> Result<i64> {
    let raw = args
        .first()
        .ok_or_else(|| QueryError::invalid_argument(method, "missing timestamp argument"))?;
    raw.trim().parse::<i64>().map_err(|_| {
        QueryError::invalid_argument(
            method,
            format!("expected an integer millisecond timestamp, got {raw:?}"),
        )
    })
}
