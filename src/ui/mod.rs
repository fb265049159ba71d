//! Terminal output for the CLI
//!
//! Fancy `cliclack` output in a terminal, plain `[OK]`/`[WARN]` lines
//! when piped or running under CI.

mod context;
mod output;
mod progress;
mod prompts;

pub use context::UiContext;
pub use output::{intro, outro_success, remark, step_info, step_ok, step_ok_detail, step_warn_hint};
pub use progress::TaskSpinner;
pub use prompts::confirm;
