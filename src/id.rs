/// Monotonic node id generator shared across every hierarchy level.
/// Guarantees run-unique ids. Zero is never issued: it is the root parent sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdGenerator {
    next: u32,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn starting_from(start: u32) -> Self {
        Self {
            next: start.max(1),
        }
    }

    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Number of ids issued so far.
    pub fn issued(&self) -> u32 {
        self.next - 1
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
