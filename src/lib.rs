//! CGE letter generator
//!
//! Fills customer-response letter templates (DOCX) with claim data.
//!
//! This library provides:
//! - `builder`: placeholder token table from a letter form
//! - `tokens`: longest-first literal replacement engine
//! - `walker`: paragraph rewriting over a parsed document
//! - `emphasis`: bold heuristics for rewritten paragraphs
//! - `annex`: tab-separated annex tables appended to the letter
//! - `generate`: the end-to-end pipeline and template checks
//!
//! Binaries:
//! - `carta-cge`: generate letters and check templates from the command line

pub mod annex;
pub mod builder;
pub mod config;
pub mod docx;
pub mod document;
pub mod emphasis;
pub mod error;
pub mod format;
pub mod generate;
pub mod letter;
pub mod placeholders;
pub mod tokens;
pub mod walker;

pub use annex::AnnexDataset;
pub use config::GeneratorConfig;
pub use error::LetterError;
pub use generate::{GeneratedLetter, Generator};
pub use letter::{Channel, ExternalCase, LetterForm, LetterKind, Zone};
