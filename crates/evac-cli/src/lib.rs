//! `evac-cli` — support code for the `evacd` binary.
//!
//! | Module      | Contents                                          |
//! |-------------|---------------------------------------------------|
//! | [`config`]  | TOML configuration and file resolution            |
//! | [`logging`] | `tracing-subscriber` setup                        |
//! | [`output`]  | `JsonLinesNotifier`                               |
//! | [`replay`]  | JSON-lines session-script replay                  |

pub mod config;
pub mod logging;
pub mod output;
pub mod replay;


pub use config::{Config, Loaded};
pub use output::JsonLinesNotifier;
pub use replay::{ReplaySummary, ScriptLine, Step, parse_line, replay};
