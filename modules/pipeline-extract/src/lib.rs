pub mod card;
pub mod category;
pub mod fingerprint;
pub mod normalize;
pub mod strategies;
pub mod strategy;

pub use card::{ExtractedBatch, RawEventCard};
pub use category::classify_category;
pub use fingerprint::{fingerprint, Fingerprint, StrategyKind};
pub use normalize::{cheap_normalize, normalize_with_ai_fallback, NormalizedEvent, NormalizeOutcome};
pub use strategies::ai::{AiStrategy, AiStrategyMarker};
pub use strategies::dom::{DomSelectors, DomStrategy};
pub use strategies::feed::FeedStrategy;
pub use strategies::hydration::HydrationStrategy;
pub use strategies::json_ld::JsonLdStrategy;
pub use strategy::{run_waterfall, ExtractionStrategy};
