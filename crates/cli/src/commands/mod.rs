//! Command handlers for the Guidebot CLI.

pub mod ask;
pub mod faq;
pub mod index;
pub mod suggest;

pub use ask::AskCommand;
pub use faq::FaqCommand;
pub use index::IndexCommand;
pub use suggest::SuggestCommand;

use guidebot_core::AppResult;
use serde::Serialize;

/// Print a value as pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
