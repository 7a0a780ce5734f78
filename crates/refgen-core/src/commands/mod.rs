//! Asset lifecycle commands.
//!
//! Each command is a plain function over an open [`Registry`]; the CLI
//! resolves arguments, prompts and renders the returned reports.
//!
//! [`Registry`]: crate::registry::Registry

pub mod add;
pub mod build;
pub mod getseq;
pub mod init;
pub mod list;
pub mod pull;
pub mod remove;
pub mod seek;

pub use add::{AddOptions, add};
pub use build::build;
pub use getseq::getseq;
pub use init::{InitOptions, InitOutcome, init};
pub use list::{LocalListing, list_local};
pub use pull::{PullOptions, PullOutcome, PullState, pull};
pub use remove::{RemoveItem, RemovePlan, RemoveReport, RemoveRequest, execute_remove, plan_remove};
pub use seek::{SeekResult, seek};
