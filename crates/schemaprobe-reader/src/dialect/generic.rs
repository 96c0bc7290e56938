//! Pass-through normalization for dialects whose drivers report clean metadata

use crate::normalizer::DialectNormalizer;

/// Admits every table and applies no correction
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericNormalizer;

impl GenericNormalizer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl DialectNormalizer for GenericNormalizer {
    fn name(&self) -> &'static str {
        "generic"
    }
}
