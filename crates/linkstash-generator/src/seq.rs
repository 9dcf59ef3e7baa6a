use crate::Generator;
use std::sync::atomic::{AtomicU64, Ordering};

const MIN_DIGITS: usize = 6;

/// Hands out `{prefix}{n}` ids with `n` zero-padded to six digits.
///
/// Ids never repeat within one instance. To keep them unique across runs
/// against a persistent store, build the generator with
/// [`SeqGenerator::resume_after`] from the ids already stored.
#[derive(Debug)]
pub struct SeqGenerator {
    next: AtomicU64,
    prefix: String,
}

impl SeqGenerator {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self::starting_at(prefix, 0)
    }

    pub fn starting_at(prefix: impl Into<String>, next: u64) -> Self {
        Self {
            next: AtomicU64::new(next),
            prefix: prefix.into(),
        }
    }

    /// Continues after the highest sequence number found among `existing`.
    ///
    /// Ids without this generator's prefix, or whose suffix is not a number,
    /// are ignored.
    pub fn resume_after<'a>(
        prefix: impl Into<String>,
        existing: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let prefix = prefix.into();
        let next = existing
            .into_iter()
            .filter_map(|id| parse_sequence(&prefix, id))
            .max()
            .map_or(0, |highest| highest.saturating_add(1));

        Self::starting_at(prefix, next)
    }

    /// The number the next generated id will carry.
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

fn parse_sequence(prefix: &str, id: &str) -> Option<u64> {
    let digits = id.strip_prefix(prefix)?;
    if digits.len() < MIN_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

impl Generator for SeqGenerator {
    fn generate(&self, _original_url: &str) -> String {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        format!("{}{:0width$}", self.prefix, n, width = MIN_DIGITS)
    }
}
