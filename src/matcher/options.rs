//! Per-stage matching options.
//!
//! Thresholds differ between stages and have no single canonical value, so
//! each stage carries its own documented default.

use serde::{Deserialize, Serialize};

/// Options for text similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityOptions {
    /// Normalize Unicode to NFC before comparing
    pub normalize_unicode: bool,

    /// Collapse whitespace runs to one space and trim the ends
    pub collapse_whitespace: bool,

    /// Compare case-sensitively
    pub case_sensitive: bool,
}

impl Default for SimilarityOptions {
    fn default() -> Self {
        Self {
            normalize_unicode: true,
            collapse_whitespace: true,
            case_sensitive: true,
        }
    }
}

impl SimilarityOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare raw strings without any normalization.
    pub fn raw() -> Self {
        Self {
            normalize_unicode: false,
            collapse_whitespace: false,
            case_sensitive: true,
        }
    }

    /// Enable or disable case sensitivity.
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }
}

/// Options for the greedy matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GreedyOptions {
    /// Minimum similarity to accept a match (default 0.25)
    pub threshold: f32,

    /// Compute the similarity matrix in parallel
    pub parallel: bool,

    /// Matrix size (rows * columns) below which the matrix is computed sequentially
    pub parallel_min_cells: usize,
}

impl Default for GreedyOptions {
    fn default() -> Self {
        Self {
            threshold: 0.25,
            parallel: true,
            parallel_min_cells: 4096,
        }
    }
}

impl GreedyOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the acceptance threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Disable parallel matrix computation.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Options for anchor-token matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorOptions {
    /// Run the anchor stage at all
    pub enabled: bool,

    /// Minimum anchor token length in characters (default 6)
    pub min_token_len: usize,

    /// Similarity at which two tokens count as the same anchor (default 0.9)
    pub near_equal_threshold: f32,

    /// Similarity assigned to anchor-forced pairs (default 0.95)
    pub confidence: f32,

    /// Compare tokens case-sensitively
    pub case_sensitive: bool,
}

impl Default for AnchorOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            min_token_len: 6,
            near_equal_threshold: 0.9,
            confidence: 0.95,
            case_sensitive: false,
        }
    }
}

impl AnchorOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum token length.
    pub fn with_min_token_len(mut self, len: usize) -> Self {
        self.min_token_len = len.max(1);
        self
    }

    /// Set the near-equality threshold for tokens.
    pub fn with_near_equal_threshold(mut self, threshold: f32) -> Self {
        self.near_equal_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Disable the anchor stage.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Options for boundary refinement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerOptions {
    /// Run the optimizer at all
    pub enabled: bool,

    /// Required strict improvement over the current similarity (default 0.05)
    pub epsilon: f32,

    /// Fraction of words removed by a trim mutation (default 0.15)
    pub trim_fraction: f32,

    /// Try merging with neighboring unmatched regions
    pub allow_merge: bool,

    /// Try trimming leading or trailing words
    pub allow_trim: bool,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            epsilon: 0.05,
            trim_fraction: 0.15,
            allow_merge: true,
            allow_trim: true,
        }
    }
}

impl OptimizerOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the improvement epsilon.
    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon.max(0.0);
        self
    }

    /// Set the trim fraction.
    pub fn with_trim_fraction(mut self, fraction: f32) -> Self {
        self.trim_fraction = fraction.clamp(0.0, 0.5);
        self
    }

    /// Disable the optimizer.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}
