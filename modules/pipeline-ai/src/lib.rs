mod openai;
mod schema;
mod social_five;
pub mod traits;

pub use openai::OpenAiCompatClient;
pub use schema::StructuredOutput;
pub use social_five::{AiNormalizedEvent, DiscoveryValidation, SelectorRepair, SocialFive};
pub use traits::{EmbeddingClient, StructuredOutputClient};
