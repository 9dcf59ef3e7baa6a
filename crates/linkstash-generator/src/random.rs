use crate::Generator;
use rand::Rng;
use typed_builder::TypedBuilder;

pub const DEFAULT_LENGTH: usize = 10;
pub const DEFAULT_ALPHABET: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890";

/// Generates random alphanumeric ids of a fixed length.
///
/// Uses the thread-local RNG, so a shared instance never contends on a lock.
#[derive(Debug, Clone, TypedBuilder)]
pub struct RandomStringGenerator {
    #[builder(default = DEFAULT_LENGTH)]
    length: usize,
    #[builder(default = DEFAULT_ALPHABET.as_bytes().to_vec(), setter(transform = |alphabet: &str| alphabet.as_bytes().to_vec()))]
    alphabet: Vec<u8>,
}

impl RandomStringGenerator {
    /// Creates a generator with the default alphabet.
    pub fn new(length: usize) -> Self {
        Self::builder().length(length).build()
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for RandomStringGenerator {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Generator for RandomStringGenerator {
    fn generate(&self, _original_url: &str) -> String {
        if self.alphabet.is_empty() {
            return String::new();
        }
        let mut rng = rand::rng();
        (0..self.length)
            .map(|_| self.alphabet[rng.random_range(0..self.alphabet.len())] as char)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn produces_requested_length() {
        let generator = RandomStringGenerator::new(10);
        assert_eq!(generator.generate("https://example.com").len(), 10);

        let generator = RandomStringGenerator::new(3);
        assert_eq!(generator.generate("https://example.com").len(), 3);
    }

    #[test]
    fn uses_only_alphabet_characters() {
        let generator = RandomStringGenerator::builder()
            .length(64)
            .alphabet("ab")
            .build();

        let id = generator.generate("https://example.com");
        assert!(id.chars().all(|c| c == 'a' || c == 'b'));
    }

    #[test]
    fn default_alphabet_is_alphanumeric() {
        let generator = RandomStringGenerator::default();
        let id = generator.generate("https://example.com");

        assert_eq!(id.len(), DEFAULT_LENGTH);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn ids_do_not_repeat_in_practice() {
        let generator = RandomStringGenerator::new(10);
        let ids: HashSet<String> = (0..1000)
            .map(|_| generator.generate("https://example.com"))
            .collect();

        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn shared_across_threads() {
        let generator = Arc::new(RandomStringGenerator::new(8));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let generator = Arc::clone(&generator);
                std::thread::spawn(move || {
                    (0..100)
                        .map(|_| generator.generate("https://example.com"))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for handle in handles {
            let ids = handle.join().unwrap();
            assert!(ids.iter().all(|id| id.len() == 8));
        }
    }
}
