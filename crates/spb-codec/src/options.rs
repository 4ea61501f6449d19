//! Decoder and encoder options.

/// Deepest set nesting accepted by default.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Options for decoding SPB streams.
#[derive(Debug, Clone)]
pub struct DecoderOptions {
    /// Emit a `Model: {name}` comment before GUID values found in the
    /// model-name table (default: true).
    pub annotate_models: bool,
    /// Sets nested deeper than this fail with `NestingTooDeep`.
    pub max_depth: usize,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            annotate_models: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DecoderOptions {
    /// Create decoder options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_model_annotations(mut self, enabled: bool) -> Self {
        self.annotate_models = enabled;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Options for encoding trees back to SPB.
#[derive(Debug, Clone)]
pub struct EncoderOptions {
    /// Re-emit the explicit 0 terminators and top-level trailer recorded in
    /// the side-channel (default: true). Without them, sibling lists end at
    /// their byte boundary only.
    pub replay_terminators: bool,
    /// Set elements nested deeper than this fail with `NestingTooDeep`.
    pub max_depth: usize,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            replay_terminators: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl EncoderOptions {
    /// Create encoder options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_terminator_replay(mut self, enabled: bool) -> Self {
        self.replay_terminators = enabled;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}
