//! Patterns
//!
//! A [`Pattern`] owns its source text and options, compiles through the
//! native engine once per encoding it is actually used with, and drives
//! search and iteration.

use crate::backend::RustRegexEngine;
use crate::encoding::{Encoding, EncodingMap};
use crate::error::{RegexError, Result};
use crate::matches::{Match, MatchCursor, Matches};
use crate::native::{Engine, NativeRegexEngine, Options};
use crate::view::EncodedView;
use crate::wrapped::{EncodingStrategy, Utf8Default, WrappedText};
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing::{debug, trace};

/// A compiled pattern, usable against text in any supported encoding
pub struct Pattern<E: NativeRegexEngine = RustRegexEngine> {
    engine: Arc<Engine<E>>,
    source: WrappedText,
    options: Options,
    strategy: Arc<dyn EncodingStrategy>,
    compiled: EncodingMap<OnceLock<E::Compiled>>,
    compile_lock: Mutex<()>,
}

impl Pattern<RustRegexEngine> {
    /// Compile `pattern` with the process-wide regex backend
    pub fn new(pattern: &str, options: Options) -> Result<Self> {
        PatternBuilder::new(pattern).options(options).build()
    }
}

impl<E: NativeRegexEngine> Pattern<E> {
    /// Compile `pattern` with a specific engine
    pub fn with_engine(engine: Arc<Engine<E>>, pattern: &str, options: Options) -> Result<Self> {
        PatternBuilder::new(pattern).options(options).build_with(engine)
    }

    fn from_parts(
        engine: Arc<Engine<E>>,
        source: WrappedText,
        options: Options,
        strategy: Arc<dyn EncodingStrategy>,
    ) -> Result<Self> {
        let pattern = Pattern {
            engine,
            source,
            options,
            strategy,
            compiled: EncodingMap::default(),
            compile_lock: Mutex::new(()),
        };
        pattern.compile_for(pattern.native_encoding())?;
        Ok(pattern)
    }

    /// The pattern source text
    pub fn as_str(&self) -> &str {
        self.source.text()
    }

    /// The options the pattern was compiled with
    pub fn options(&self) -> Options {
        self.options
    }

    /// The encoding the pattern text is natively held in
    pub fn native_encoding(&self) -> Encoding {
        self.source.native_encoding()
    }

    /// The engine host this pattern compiles through
    pub fn engine(&self) -> &Arc<Engine<E>> {
        &self.engine
    }

    /// Whether a handle for `encoding` has been compiled
    pub fn is_compiled(&self, encoding: Encoding) -> bool {
        self.compiled[encoding].get().is_some()
    }

    /// Pick the encoding shared by this pattern and `subject`
    ///
    /// The higher-ranked of the two native encodings wins; on a tie the
    /// pattern's encoding is kept.
    pub fn negotiate_encoding(&self, subject: &WrappedText) -> Encoding {
        let ours = self.native_encoding();
        let theirs = subject.native_encoding();
        let chosen = if theirs.rank() > ours.rank() { theirs } else { ours };
        trace!(pattern = %ours, subject = %theirs, %chosen, "negotiated encoding");
        chosen
    }

    /// The engine handle for `encoding`, compiling it on first use
    ///
    /// Compilation for a given encoding happens at most once, also under
    /// concurrent first use.
    pub fn compile_for(&self, encoding: Encoding) -> Result<&E::Compiled> {
        let slot = &self.compiled[encoding];
        if let Some(compiled) = slot.get() {
            return Ok(compiled);
        }

        let _guard = self
            .compile_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(compiled) = slot.get() {
            return Ok(compiled);
        }

        let view = self.source.encode(encoding)?;
        debug!(
            %encoding,
            options = %self.options,
            bytes = view.len(),
            "compiling pattern"
        );
        let compiled = self
            .engine
            .compile(view.bytes(), encoding, self.options)
            .inspect_err(|e| debug!(%encoding, error = %e, "pattern compilation failed"))?;
        Ok(slot.get_or_init(move || compiled))
    }

    /// Group numbers carrying `name`, in ascending order
    pub fn group_numbers_by_name(&self, name: &str) -> Result<Vec<usize>> {
        let unknown = || RegexError::UnknownGroupName(name.to_string());
        // name lookup does not depend on the encoding, any handle will do
        let (encoding, compiled) = self
            .compiled
            .iter()
            .find_map(|(encoding, slot)| slot.get().map(|compiled| (encoding, compiled)))
            .ok_or_else(unknown)?;
        let name_bytes = encoding.encode_bytes(name).map_err(|_| unknown())?;

        let mut numbers = self.engine.native().group_numbers(compiled, &name_bytes);
        if numbers.is_empty() {
            return Err(unknown());
        }
        numbers.sort_unstable();
        Ok(numbers)
    }

    /// Wrap `text` with this pattern's encoding strategy
    pub fn wrap(&self, text: &str) -> WrappedText {
        WrappedText::wrap_with(text, self.strategy.as_ref())
    }

    /// Search `text` from the beginning
    pub fn search(&self, text: &str) -> Result<Option<Match<'_, E>>> {
        self.search_at(text, 0)
    }

    /// Search `text` from character offset `start`
    pub fn search_at(&self, text: &str, start: usize) -> Result<Option<Match<'_, E>>> {
        self.search_wrapped(&self.wrap(text), start)
    }

    /// Search an already wrapped subject from character offset `start`
    pub fn search_wrapped(
        &self,
        subject: &WrappedText,
        start: usize,
    ) -> Result<Option<Match<'_, E>>> {
        let (view, offset) = self.prepare(subject, start)?;
        let scratch = self.prepare_view(&view)?;
        self.search_prepared(&view, &scratch, offset)
    }

    /// Iterate over all matches in `text`
    pub fn find_iter(&self, text: &str) -> Result<Matches<'_, E>> {
        self.find_iter_at(text, 0)
    }

    /// Iterate over all matches in `text` from character offset `start`
    pub fn find_iter_at(&self, text: &str, start: usize) -> Result<Matches<'_, E>> {
        self.find_iter_wrapped(&self.wrap(text), start)
    }

    /// Iterate over all matches in an already wrapped subject
    pub fn find_iter_wrapped(&self, subject: &WrappedText, start: usize) -> Result<Matches<'_, E>> {
        Ok(Matches::new(self, self.match_cursor(subject, start)?))
    }

    /// Iteration state over `subject` that can outlive a borrow of `self`
    ///
    /// Advance it with [`MatchCursor::advance`], passing this same pattern.
    pub fn match_cursor(&self, subject: &WrappedText, start: usize) -> Result<MatchCursor<E>> {
        let (view, offset) = self.prepare(subject, start)?;
        let scratch = self.prepare_view(&view)?;
        Ok(MatchCursor::new(view, scratch, offset))
    }

    /// Collect all matches in `text`
    pub fn find_all(&self, text: &str) -> Result<Vec<Match<'_, E>>> {
        self.find_iter(text)?.collect()
    }

    /// Collect all matches in `text` from character offset `start`
    pub fn find_all_at(&self, text: &str, start: usize) -> Result<Vec<Match<'_, E>>> {
        self.find_iter_at(text, start)?.collect()
    }

    fn prepare(&self, subject: &WrappedText, start: usize) -> Result<(Arc<EncodedView>, usize)> {
        let encoding = self.negotiate_encoding(subject);
        let view = subject.encode(encoding)?;
        let offset = view.char_offset_to_byte_offset(start);
        Ok((view, offset))
    }

    fn prepare_view(&self, view: &EncodedView) -> Result<E::Scratch> {
        let compiled = self.compile_for(view.encoding())?;
        self.engine.native().prepare(compiled, view.bytes())
    }

    pub(crate) fn search_prepared(
        &self,
        view: &Arc<EncodedView>,
        scratch: &E::Scratch,
        offset: usize,
    ) -> Result<Option<Match<'_, E>>> {
        let compiled = self.compile_for(view.encoding())?;
        trace!(encoding = %view.encoding(), offset, len = view.len(), "searching");
        match self
            .engine
            .native()
            .search(compiled, view.bytes(), scratch, offset, Options::NONE)?
        {
            Some(regions) => Match::new(self, Arc::clone(view), regions).map(Some),
            None => Ok(None),
        }
    }
}

impl<E: NativeRegexEngine> Drop for Pattern<E> {
    fn drop(&mut self) {
        for (encoding, slot) in self.compiled.iter_mut() {
            if let Some(compiled) = slot.take() {
                debug!(%encoding, "releasing compiled pattern");
                self.engine.native().release(compiled);
            }
        }
    }
}

impl<E: NativeRegexEngine> fmt::Debug for Pattern<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let compiled: Vec<Encoding> = self
            .compiled
            .iter()
            .filter(|(_, slot)| slot.get().is_some())
            .map(|(encoding, _)| encoding)
            .collect();
        f.debug_struct("Pattern")
            .field("pattern", &self.as_str())
            .field("options", &self.options)
            .field("native", &self.native_encoding())
            .field("compiled", &compiled)
            .finish()
    }
}

impl<E: NativeRegexEngine> fmt::Display for Pattern<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configures and builds a [`Pattern`]
#[derive(Clone)]
pub struct PatternBuilder {
    pattern: String,
    options: Options,
    strategy: Arc<dyn EncodingStrategy>,
}

impl PatternBuilder {
    /// Start building a pattern from its source text
    pub fn new(pattern: &str) -> Self {
        PatternBuilder {
            pattern: pattern.to_string(),
            options: Options::NONE,
            strategy: Arc::new(Utf8Default),
        }
    }

    /// Set the engine options
    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Set the strategy used to pick native encodings for the pattern and
    /// for subjects passed as plain text
    pub fn strategy(mut self, strategy: impl EncodingStrategy + 'static) -> Self {
        self.strategy = Arc::new(strategy);
        self
    }

    /// Build with the process-wide regex backend
    pub fn build(&self) -> Result<Pattern<RustRegexEngine>> {
        self.build_with(Engine::global())
    }

    /// Build with a specific engine
    pub fn build_with<E: NativeRegexEngine>(&self, engine: Arc<Engine<E>>) -> Result<Pattern<E>> {
        let source = WrappedText::wrap_with(self.pattern.as_str(), self.strategy.as_ref());
        Pattern::from_parts(engine, source, self.options, Arc::clone(&self.strategy))
    }
}

impl fmt::Debug for PatternBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternBuilder")
            .field("pattern", &self.pattern)
            .field("options", &self.options)
            .finish()
    }
}
