// Moderation classification — trait-based abstraction over the external classifier.
//
// The ModerationClient trait defines the interface. OpenAiModerationClient
// implements it against an OpenAI-compatible /moderations endpoint. The
// decision pipeline only ever sees the trait, so tests swap in a stub.

pub mod openai;
pub mod traits;
