use std::ops::Range;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::debug;

use super::ResponseGenerator;
use crate::error::ChatError;

pub const CANNED_RESPONSES: [&str; 5] = [
    "That's a great question! Let me help you with that. Based on what you've asked, I can provide some insights and suggestions that might be useful for your situation.",
    "I understand what you're looking for. Here's my take on this topic, along with some practical examples and considerations you might want to keep in mind.",
    "Excellent point! This is actually a fascinating area to explore. Let me break this down into key components and explain how they work together.",
    "Thanks for bringing this up! I can definitely help you understand this better. Here are the main concepts and how they apply to your specific case.",
    "That's an interesting challenge! I've seen similar situations before, and here's what typically works well in these scenarios.",
];

pub const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(3000);

/// Mock assistant: waits a random "thinking" delay, then returns one of
/// [`CANNED_RESPONSES`]. The prompt is ignored and it never fails.
#[derive(Debug, Clone)]
pub struct CannedGenerator {
    delay: Range<Duration>,
}

impl CannedGenerator {
    pub fn new() -> Self {
        Self::with_delay(DEFAULT_MIN_DELAY..DEFAULT_MAX_DELAY)
    }

    pub fn with_delay(delay: Range<Duration>) -> Self {
        Self { delay }
    }

    fn pick(&self) -> (Duration, &'static str) {
        let mut rng = rand::thread_rng();

        let min = self.delay.start.as_millis() as u64;
        let max = self.delay.end.as_millis() as u64;
        let delay_ms = if max > min { rng.gen_range(min..max) } else { min };

        let response = CANNED_RESPONSES[rng.gen_range(0..CANNED_RESPONSES.len())];
        (Duration::from_millis(delay_ms), response)
    }
}

impl Default for CannedGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseGenerator for CannedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, ChatError> {
        // thread_rng is not Send, so draw everything before the await
        let (delay, response) = self.pick();
        debug!(delay_ms = delay.as_millis() as u64, "simulating response delay");

        tokio::time::sleep(delay).await;
        Ok(response.to_string())
    }

    fn name(&self) -> String {
        "Canned".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_generate_returns_canned_response_within_delay() {
        let generator = CannedGenerator::new();

        for _ in 0..20 {
            let started = Instant::now();
            let response = generator.generate("anything").await.unwrap();
            let elapsed = started.elapsed();

            assert!(CANNED_RESPONSES.contains(&response.as_str()));
            assert!(elapsed >= DEFAULT_MIN_DELAY, "elapsed {:?}", elapsed);
            assert!(elapsed < DEFAULT_MAX_DELAY + Duration::from_millis(1), "elapsed {:?}", elapsed);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_degenerate_range_uses_min() {
        let generator = CannedGenerator::with_delay(Duration::from_millis(50)..Duration::from_millis(50));

        let started = Instant::now();
        generator.generate("hi").await.unwrap();
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(50) && elapsed < Duration::from_millis(52));
    }

    #[test]
    fn test_pick_stays_in_range() {
        let generator = CannedGenerator::with_delay(Duration::from_millis(10)..Duration::from_millis(20));
        for _ in 0..100 {
            let (delay, response) = generator.pick();
            assert!(delay >= Duration::from_millis(10) && delay < Duration::from_millis(20));
            assert!(CANNED_RESPONSES.contains(&response));
        }
    }
}
