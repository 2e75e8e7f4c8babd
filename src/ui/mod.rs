//! Terminal output for the CLI
//!
//! Interactive terminals get `cliclack` log lines and a spinner; pipes and CI
//! get plain `[OK]`/`[WARN]` prefixed lines that are easy to grep.

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{key_value, section, step_info, step_ok, step_ok_detail, step_warn, step_warn_hint};
pub use progress::TaskSpinner;
