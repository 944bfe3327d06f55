// ResourceArc wrapper for the tokenizer
//
// This allows the tokenizer state to persist across NIF calls. The mutex
// only satisfies the BEAM's sharing rules: a tokenizer has one sequential
// consumer.

use crate::source::TextLineSource;
use crate::tokenizer::CsvTokenizer;
use rustler::{Error, NifResult, Resource, ResourceArc};
use std::sync::{Mutex, MutexGuard};

pub type NifTokenizer = CsvTokenizer<TextLineSource>;

/// Wrapper for CsvTokenizer that can be stored in a ResourceArc
pub struct TokenizerResource {
    inner: Mutex<NifTokenizer>,
}

impl Resource for TokenizerResource {}

impl TokenizerResource {
    pub fn new(tokenizer: NifTokenizer) -> Self {
        TokenizerResource {
            inner: Mutex::new(tokenizer),
        }
    }

    pub fn lock(&self) -> NifResult<MutexGuard<'_, NifTokenizer>> {
        self.inner
            .lock()
            .map_err(|_| Error::RaiseAtom("tokenizer_poisoned"))
    }
}

/// Type alias for the ResourceArc
pub type TokenizerRef = ResourceArc<TokenizerResource>;
