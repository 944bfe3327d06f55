// LineCSV - incremental, line-oriented CSV tokenizer
//
// The tokenizer turns physical lines into logical records, honoring
// configurable delimiter, quote, escape, trimming, comment and null rules,
// including quoted values that span several lines.
//
// Exposed two ways:
// - as a Rust library (CsvTokenizer, RecordIterator, LineSource)
// - as NIFs for Elixir.LineCSV.Native, holding a tokenizer in a resource

use rustler::types::map::MapIterator;
use rustler::{Binary, Env, Error, NifResult, ResourceArc, Term};

pub mod config;
pub mod core;
pub mod error;
pub mod record;
mod resource;
pub mod source;
mod term;
pub mod tokenizer;

pub use crate::config::{
    EscapeCharacter, QuoteCharacter, QuotesInQuotedFields, TokenizerConfig, TokenizerOptions,
};
pub use crate::core::{Delimiter, Field, Newline};
pub use crate::error::{ConfigError, ErrorKind, TokenizerError};
pub use crate::record::{Record, RecordIterator};
pub use crate::source::{LineSource, ReaderLineSource, TextLineSource};
pub use crate::tokenizer::{CsvTokenizer, RecordState};

use resource::{TokenizerRef, TokenizerResource};
use term::{data_error, nullable_rows_to_term, records_to_maps};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

// ============================================================================
// Option Decoding
// ============================================================================

fn is_nil(term: Term<'_>) -> bool {
    term.atom_to_string().map(|s| s == "nil").unwrap_or(false)
}

/// Decode a string-valued option.
/// Accepts: binary "x", or atom :x (atoms other than nil)
fn decode_string(term: Term<'_>) -> NifResult<String> {
    if let Ok(s) = term.decode::<String>() {
        return Ok(s);
    }
    if term.is_atom() && !is_nil(term) {
        return term.atom_to_string();
    }
    Err(Error::BadArg)
}

/// Decode an optional string option: nil → None
fn decode_optional_string(term: Term<'_>) -> NifResult<Option<String>> {
    if is_nil(term) {
        return Ok(None);
    }
    decode_string(term).map(Some)
}

/// Decode a quote/escape option.
/// Accepts: integer codepoint 34, binary <<34>>, or nil (feature disabled)
fn decode_character(term: Term<'_>) -> NifResult<Option<String>> {
    if is_nil(term) {
        return Ok(None);
    }
    if let Ok(codepoint) = term.decode::<u32>() {
        let c = char::from_u32(codepoint).ok_or(Error::BadArg)?;
        return Ok(Some(c.to_string()));
    }
    term.decode::<String>().map(Some).map_err(|_| Error::BadArg)
}

/// Decode the options map (atom keys) into a validated configuration.
/// Missing keys keep their defaults; unknown keys are rejected.
fn decode_config(opts: Term<'_>) -> NifResult<TokenizerConfig> {
    let mut options = TokenizerOptions::default();
    let iter = MapIterator::new(opts).ok_or(Error::BadArg)?;

    for (key, value) in iter {
        let key = key.atom_to_string().map_err(|_| Error::BadArg)?;
        match key.as_str() {
            "delimiter" => options.delimiter = decode_string(value)?,
            "quote" => options.quote = decode_character(value)?,
            "escape" => options.escape = decode_character(value)?,
            "quotes_in_quoted_fields" => {
                options.quotes_in_quoted_fields =
                    decode_string(value)?.parse().map_err(|_| Error::BadArg)?
            }
            "newline" => {
                options.newline = decode_string(value)?.parse().map_err(|_| Error::BadArg)?
            }
            "null_string" => options.null_string = decode_optional_string(value)?,
            "trim_if_not_quoted" => options.trim_if_not_quoted = value.decode::<bool>()?,
            "max_quoted_size_limit" => options.max_quoted_size_limit = value.decode::<i64>()?,
            "comment_line_marker" => options.comment_line_marker = decode_optional_string(value)?,
            _ => return Err(Error::BadArg),
        }
    }

    options.into_config().map_err(|_| Error::BadArg)
}

/// Decode the input files: list of UTF-8 binaries, one per file
fn decode_files(files: Vec<Binary<'_>>) -> NifResult<TextLineSource> {
    let texts = files
        .iter()
        .map(|b| {
            std::str::from_utf8(b.as_slice())
                .map(str::to_string)
                .map_err(|_| Error::BadArg)
        })
        .collect::<NifResult<Vec<String>>>()?;
    Ok(TextLineSource::new(texts))
}

fn build_tokenizer(
    files: Vec<Binary<'_>>,
    opts: Term<'_>,
) -> NifResult<CsvTokenizer<TextLineSource>> {
    let config = decode_config(opts)?;
    let source = decode_files(files)?;
    CsvTokenizer::new(config, source).map_err(|_| Error::BadArg)
}

// ============================================================================
// Stateful Tokenizer
// ============================================================================

/// Create a tokenizer over a list of files (binaries)
#[rustler::nif]
fn tokenizer_new<'a>(files: Vec<Binary<'a>>, opts: Term<'a>) -> NifResult<TokenizerRef> {
    let tokenizer = build_tokenizer(files, opts)?;
    Ok(ResourceArc::new(TokenizerResource::new(tokenizer)))
}

/// Open the next file; resets the line number
#[rustler::nif]
fn tokenizer_next_file(tokenizer: TokenizerRef) -> NifResult<bool> {
    let mut inner = tokenizer.lock()?;
    inner.next_file().map_err(data_error)
}

/// Consume one line without parsing it
#[rustler::nif]
fn tokenizer_skip_header_line(tokenizer: TokenizerRef) -> NifResult<bool> {
    let mut inner = tokenizer.lock()?;
    inner.skip_header_line().map_err(data_error)
}

/// Start the next record
#[rustler::nif]
fn tokenizer_next_record(tokenizer: TokenizerRef, skip_empty_line: bool) -> NifResult<bool> {
    let mut inner = tokenizer.lock()?;
    inner.next_record(skip_empty_line).map_err(data_error)
}

#[rustler::nif]
fn tokenizer_has_next_column(tokenizer: TokenizerRef) -> NifResult<bool> {
    let inner = tokenizer.lock()?;
    Ok(inner.has_next_column())
}

/// Read the next column as raw text
#[rustler::nif]
fn tokenizer_next_column(tokenizer: TokenizerRef) -> NifResult<String> {
    let mut inner = tokenizer.lock()?;
    inner.next_column().map_err(data_error)
}

/// Read the next column with null semantics (nil for null)
#[rustler::nif]
fn tokenizer_next_column_or_nil(tokenizer: TokenizerRef) -> NifResult<Option<String>> {
    let mut inner = tokenizer.lock()?;
    inner.next_column_or_null().map_err(data_error)
}

#[rustler::nif]
fn tokenizer_was_quoted_column(tokenizer: TokenizerRef) -> NifResult<bool> {
    let inner = tokenizer.lock()?;
    Ok(inner.was_quoted_column())
}

/// Abandon the current record; returns the line it started on (or nil)
#[rustler::nif]
fn tokenizer_skip_current_line(tokenizer: TokenizerRef) -> NifResult<Option<String>> {
    let mut inner = tokenizer.lock()?;
    Ok(inner.skip_current_line())
}

#[rustler::nif]
fn tokenizer_line_number(tokenizer: TokenizerRef) -> NifResult<u64> {
    let inner = tokenizer.lock()?;
    Ok(inner.current_line_number())
}

// ============================================================================
// Whole-Input Parsing
// ============================================================================

/// Parse every record of every file into a list of lists (nil for null).
/// Stops at the first data error.
/// Uses DirtyCpu scheduler since this can take significant time
#[rustler::nif(schedule = "DirtyCpu")]
fn parse_records<'a>(
    env: Env<'a>,
    files: Vec<Binary<'a>>,
    opts: Term<'a>,
) -> NifResult<Term<'a>> {
    let mut tokenizer = build_tokenizer(files, opts)?;
    let mut rows = Vec::new();

    while tokenizer.next_file().map_err(data_error)? {
        while tokenizer.next_record(true).map_err(data_error)? {
            rows.push(tokenizer.read_record().map_err(data_error)?);
        }
    }

    Ok(nullable_rows_to_term(env, rows))
}

/// Parse files whose first line is a header into a list of maps.
/// Stops at the first data error.
#[rustler::nif(schedule = "DirtyCpu")]
fn parse_to_maps<'a>(
    env: Env<'a>,
    files: Vec<Binary<'a>>,
    opts: Term<'a>,
) -> NifResult<Term<'a>> {
    let tokenizer = build_tokenizer(files, opts)?;
    let records = RecordIterator::new(tokenizer)
        .map_err(data_error)?
        .collect::<Result<Vec<Record>, TokenizerError>>()
        .map_err(data_error)?;

    records_to_maps(env, records)
}

// ============================================================================
// NIF Initialization
// ============================================================================

fn load(env: Env, _info: Term) -> bool {
    env.register::<TokenizerResource>().is_ok()
}

rustler::init!("Elixir.LineCSV.Native", load = load);
