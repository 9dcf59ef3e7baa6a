pub mod random;
pub mod seq;

pub use random::RandomStringGenerator;
pub use seq::SeqGenerator;

/// Trait for generating short-link identifiers.
///
/// Implementations are pure generators that don't interact with storage and
/// must be usable from many tasks at once without external locking.
///
/// The original URL is passed as a hint. Implementations are free to ignore
/// it; nothing requires the id to be derived from the URL.
pub trait Generator: Send + Sync + 'static {
    /// Produces a new short identifier candidate.
    fn generate(&self, original_url: &str) -> String;
}
