//! Response generators
//!
//! A [`ResponseGenerator`] turns a user prompt into an assistant reply. The
//! turn controller only sees the trait object, so the canned mock and a real
//! model backend are interchangeable.

pub mod canned;
pub mod ollama;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::ChatError;
use crate::provider::GeneratorKind;

pub use canned::CannedGenerator;
pub use ollama::OllamaGenerator;

#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    /// Produce a reply for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, ChatError>;

    /// Short label for headers and logs
    fn name(&self) -> String;
}

/// Build the generator selected by `config`
pub fn build_generator(config: &Config) -> Arc<dyn ResponseGenerator> {
    match config.generator_kind() {
        GeneratorKind::Canned => Arc::new(CannedGenerator::with_delay(config.delay_range())),
        GeneratorKind::Ollama => Arc::new(OllamaGenerator::new(
            &config.ollama_url(),
            &config.model(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_generator_follows_config() {
        let mut config = Config::new();
        assert_eq!(build_generator(&config).name(), "Canned");

        config.generator = Some("ollama".to_string());
        config.model = Some("llama3.2:latest".to_string());
        assert_eq!(build_generator(&config).name(), "Ollama: llama3.2:latest");
    }
}
