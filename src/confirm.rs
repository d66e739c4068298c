//! Operator confirmation for destructive operations.
//!
//! Purge workflows take the confirmation capability as a parameter so tests
//! can supply a fixed answer instead of real interactive input.

use std::io::{self, Write};

use mockall::automock;

#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait Confirmation: Send + Sync {
    /// Asks the operator; `true` means proceed.
    fn confirm(&self, prompt: &str) -> bool;
}

/// Interactive yes/no on stdin. Anything other than `y` declines, as does a
/// read failure.
pub struct StdinConfirmation;

impl Confirmation for StdinConfirmation {
    fn confirm(&self, prompt: &str) -> bool {
        print!("\n\n{prompt} [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if io::stdin().read_line(&mut answer).is_err() {
            return false;
        }
        answer.trim() == "y"
    }
}
