//! `evac-report` — turning a free-text blockage report into a location,
//! severity, and category.
//!
//! # Crate layout
//!
//! | Module             | Contents                                               |
//! |--------------------|--------------------------------------------------------|
//! | [`interpreter`]    | `ReportInterpreter` trait, `Interpretation`            |
//! | [`keyword`]        | `KeywordInterpreter` (deterministic rules)             |
//! | [`assisted`]       | `LanguageClient` trait, `AssistedInterpreter<C>`       |
//! | [`error`]          | `ReportError`, `ReportResult<T>`                       |
//!
//! The location returned here is a raw *mention* (`"p133"`, `"h4"`,
//! `"1063"`).  Resolving it against the waypoint graph is the caller's job.

pub mod assisted;
pub mod error;
pub mod interpreter;
pub mod keyword;


pub use assisted::{AssistedInterpreter, LanguageClient};
pub use error::{ReportError, ReportResult};
pub use interpreter::{Interpretation, ReportInterpreter};
pub use keyword::KeywordInterpreter;
