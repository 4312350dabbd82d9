//! Encoder and analyzer settings.

/// Behaviour switches of the function encoder.
///
/// Both default to `false`, which reproduces the permissive behaviour the
/// encoding was designed with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Emit `pathCondition => divisor != 0` next to every division.
    pub guard_division_by_zero: bool,
    /// Treat a lookup of a never-created expression as fatal instead of
    /// creating an unconstrained symbol for it.
    pub strict_expression_lookup: bool,
}

impl EncoderConfig {
    pub fn with_division_guard(mut self, enabled: bool) -> Self {
        self.guard_division_by_zero = enabled;
        self
    }

    pub fn with_strict_lookup(mut self, enabled: bool) -> Self {
        self.strict_expression_lookup = enabled;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalyzerConfig {
    pub encoder: EncoderConfig,
}

impl AnalyzerConfig {
    pub fn new(encoder: EncoderConfig) -> Self {
        Self { encoder }
    }
}
