//! Resolve who owns each file in a repository according to its CODEOWNERS
//! file.
//!
//! CODEOWNERS patterns use gitignore syntax, and the last matching rule
//! decides ownership. Matching is done either by `git check-ignore`
//! ([`DelegatedMatcher`]) or in-process ([`NativeMatcher`]).
//!
//! ```no_run
//! use code_owners::{ownerships, Backend, Config};
//!
//! let config = Config::new(".").with_backend(Backend::Native);
//! for record in ownerships(&config)?.records {
//!     println!("{}  {}", record.file, record.owner());
//! }
//! # Ok::<(), code_owners::Error>(())
//! ```

mod config;
mod driver;
mod error;
pub mod files;
pub mod matcher;
pub mod parser;
mod path_tree;
pub mod patternset;
mod resolver;
mod ruleset;

pub use config::{find_codeowners_file, find_repo_root, Backend, Config, CODEOWNERS_LOCATIONS};
pub use driver::{ownership_map, ownerships, Ownerships};
pub use error::{Error, Result};
pub use matcher::{DelegatedMatcher, FileMatch, NativeMatcher, PatternMatcher};
pub use parser::{parse, parse_file, ParseError, ParseResult};
pub use resolver::{resolve, resolve_map, OwnershipRecord, UNOWNED};
pub use ruleset::{InvalidOwner, Owner, OwnerKind, Owners, Rule, RuleKind, RuleSet, RuleTable};
