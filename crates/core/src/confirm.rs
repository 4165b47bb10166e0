//! User confirmation

use async_trait::async_trait;
use mockall::automock;

/// Asks the user a yes/no question without blocking the event loop.
#[automock]
#[async_trait(?Send)]
pub trait Confirm {
    /// Resolve to the user's answer to `prompt`.
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Answers every prompt the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticConfirm(pub bool);

#[async_trait(?Send)]
impl Confirm for StaticConfirm {
    async fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}
