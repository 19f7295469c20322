pub mod terminal;

/// Why the UI loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Quit,
    /// User asked to enter a new server address; caller re-prompts and
    /// starts the loop again.
    ReenterAddress,
}
