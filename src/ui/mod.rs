pub mod prompt;
pub mod progress;

pub use prompt::{AutoConfirm, ConfirmPrompt, Confirmation};
pub use progress::{create_spinner, fail_spinner};
