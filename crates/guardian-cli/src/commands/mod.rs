//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `score` - Build a receipt from flags or extractor output and score it
//! - `reports` - Spend report over a history file
//! - `history` - History listing, CSV export, and re-scoring
//! - `policy` - Effective policy display

pub mod history;
pub mod policy;
pub mod reports;
pub mod score;

// Re-export command functions for main.rs
pub use history::*;
pub use policy::*;
pub use reports::*;
pub use score::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
