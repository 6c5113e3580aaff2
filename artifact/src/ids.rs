use uuid::Uuid;

/// Source of fresh slide identifiers.
///
/// Injected into the normalizer so repairs stay deterministic under test;
/// production callers use [`UuidIds`].
pub trait IdSource {
    fn next_id(&mut self) -> String;
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdSource for UuidIds {
    fn next_id(&mut self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic `prefix-N` identifiers for tests.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: usize,
}

impl SequentialIds {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            next: 0,
        }
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> String {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids_are_distinct() {
        let mut ids = SequentialIds::new("gen");
        assert_eq!(ids.next_id(), "gen-0");
        assert_eq!(ids.next_id(), "gen-1");
    }

    #[test]
    fn test_uuid_ids_are_distinct() {
        let mut ids = UuidIds;
        assert_ne!(ids.next_id(), ids.next_id());
    }
}
