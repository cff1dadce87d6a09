//! Method Corpus Operations Layer
//!
//! The extraction-and-export pipeline behind the `mcorpus` binary: discover
//! popular permissively licensed Java repositories, pin a shallow snapshot of
//! each, pull every method declaration out with tree-sitter, normalize and
//! tokenize it, and append it to a split-labelled CSV table.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use method_corpus_ops::{Config, MiningContext};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> method_corpus_ops::CorpusResult<()> {
//!     let config = Config::load()?;
//!     let response = MiningContext::new(config).run().await?;
//!
//!     println!("Wrote {} methods", response.rows_written);
//!     Ok(())
//! }
//! ```
//!
//! External capabilities sit behind traits ([`RepositorySearch`],
//! [`SnapshotSource`]) so the pipeline runs offline against fixtures.

mod config;
mod context;
mod discovery;
mod error;
mod export;
mod extract;
mod normalize;
mod responses;
mod scan;

// Re-export public API
pub use config::Config;
pub use context::MiningContext;
pub use discovery::{
    discover, GitHubSearch, RepositorySearch, SearchCandidate, SearchFailure, SearchFailureKind,
    SearchQuery,
};
pub use error::{CorpusError, CorpusResult};
pub use export::{CorpusWriter, UnlabeledRecord};
pub use extract::{ExtractedMethod, JavaMethodExtractor, ParseFailure, ParseFailureKind};
pub use normalize::{collapse_whitespace, normalize, strip_comments, tokenize, NormalizedMethod};
pub use responses::{MineResponse, RepositoryOutcome, RepositoryReport, SkippedFile};
pub use scan::{enumerate_sources, SourceFile};

pub use method_corpus_git::{AcquireError, GitSnapshotSource, SnapshotSource};
