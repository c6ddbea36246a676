//! Answer synthesis over retrieved chunks

mod synthesizer;

pub use synthesizer::{SynthesisContext, Synthesizer, EMPTY_RESPONSE};
