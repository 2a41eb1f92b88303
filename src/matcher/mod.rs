//! Region matching stages.
//!
//! The stages run in a fixed order over a shared [`Alignment`]:
//! greedy similarity pairing, anchor-token overrides, then boundary
//! refinement of borderline pairs.

mod alignment;
mod anchor;
mod greedy;
mod optimizer;
mod options;
mod similarity;

pub use alignment::{Alignment, Link};
pub use anchor::{AnchorMatch, AnchorMatcher, AnchorToken};
pub use greedy::GreedyMatcher;
pub use optimizer::{Mutation, Optimization, RangeOptimizer};
pub use options::{AnchorOptions, GreedyOptions, OptimizerOptions, SimilarityOptions};
pub use similarity::{
    char_ratio, matched_len, ratio_upper_bound, similarity, similarity_opt, TextSimilarity,
};
