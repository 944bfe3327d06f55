// Shared term building utilities for converting Rust data to Elixir terms

use crate::error::{ErrorKind, TokenizerError};
use crate::record::Record;
use rustler::{Atom, Encoder, Env, Error, NifResult, Term};

mod atoms {
    rustler::atoms! {
        too_many_columns,
        too_few_columns,
        invalid_value,
        quoted_size_limit_exceeded,
        end_of_input,
        io,
    }
}

/// Error atom for a data error kind
pub fn kind_atom(kind: ErrorKind) -> Atom {
    match kind {
        ErrorKind::TooManyColumns => atoms::too_many_columns(),
        ErrorKind::TooFewColumns => atoms::too_few_columns(),
        ErrorKind::InvalidValue => atoms::invalid_value(),
        ErrorKind::QuotedSizeLimitExceeded => atoms::quoted_size_limit_exceeded(),
        ErrorKind::EndOfInput => atoms::end_of_input(),
        ErrorKind::Io => atoms::io(),
    }
}

/// Map a data error to `{:error, {kind, message}}`
pub fn data_error(err: TokenizerError) -> Error {
    Error::Term(Box::new((kind_atom(err.kind()), err.to_string())))
}

/// Convert nullable fields to an Elixir list of binaries and nils
pub fn nullable_fields_to_term<'a>(env: Env<'a>, fields: Vec<Option<String>>) -> Term<'a> {
    let mut list = Term::list_new_empty(env);

    for field in fields.into_iter().rev() {
        list = list.list_prepend(field.encode(env));
    }

    list
}

/// Convert rows of nullable fields to an Elixir list of lists
pub fn nullable_rows_to_term<'a>(env: Env<'a>, rows: Vec<Vec<Option<String>>>) -> Term<'a> {
    let mut list = Term::list_new_empty(env);

    for row in rows.into_iter().rev() {
        let row_term = nullable_fields_to_term(env, row);
        list = list.list_prepend(row_term);
    }

    list
}

/// Convert one record to a map keyed by header binaries.
/// A repeated header keeps its last value.
pub fn record_to_map<'a>(env: Env<'a>, record: Record) -> NifResult<Term<'a>> {
    let mut map = Term::map_new(env);
    for (header, value) in record {
        map = map.map_put(header.encode(env), value.encode(env))?;
    }
    Ok(map)
}

/// Convert records to an Elixir list of maps
pub fn records_to_maps<'a>(env: Env<'a>, records: Vec<Record>) -> NifResult<Term<'a>> {
    let mut list = Term::list_new_empty(env);

    for record in records.into_iter().rev() {
        list = list.list_prepend(record_to_map(env, record)?);
    }

    Ok(list)
}
