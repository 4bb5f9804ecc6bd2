//! # REGOLITH: Per-Point Scan Data Expression Engine
//!
//! REGOLITH turns short textual formulas such as `element("Fe","%","A")*2`
//! into values keyed per measurement point (PMC) of a scan, backed by an
//! async data-source abstraction and a memoisation layer that coalesces
//! concurrent identical requests.
//!
//! ## Processing Pipeline
//!
//! Expression text moves through the same stages a conventional language
//! frontend would use:
//!
//! ```text
//! Program text → Line splitter → Tokenizer → Parser → Evaluator
//! ```
//!
//! ### Stage 1: Program splitting
//!
//! [`analyzer::program`] separates variable declarations (`name = expr`
//! lines) from the single final expression, rejecting malformed declaration
//! blocks synchronously before any evaluation work starts.
//!
//! ### Stage 2: Tokenization
//!
//! The [`tokenizer`] module lexes one expression's text into identifiers,
//! literals, operators and delimiters.
//!
//! ### Stage 3: Parsing
//!
//! The [`analyzer`] module parses the token stream into an [`ast`] tree with
//! a parser combinator system.
//!
//! ### Stage 4: Evaluation
//!
//! The [`eval`] module walks the tree. Function calls validate their
//! arguments in the builtin library ([`functions`]) and resolve scan data
//! through the injected [`source::ScanDataSource`]; arithmetic runs through
//! the sparse per-point map algebra in [`model`].
//!
//! ## Supporting Layers
//!
//! * [`source`] also hosts the diffraction-peak/roughness classifier and the
//!   per-detector energy calibration.
//! * [`memo`] caches computed expression payloads across three tiers with
//!   at-most-once-in-flight semantics per key.
//! * [`config`] and [`error`] carry the engine's settings and the top-level
//!   error type.
//!
//! ## Example
//!
//! ```no_run
//! use regolith::eval::{require_map, Evaluator};
//! use regolith::source::ScanDataSource;
//!
//! async fn example(source: &dyn ScanDataSource) -> Result<(), Box<dyn std::error::Error>> {
//!     let evaluator = Evaluator::new();
//!     let result = evaluator
//!         .evaluate("chiSq = data(\"chisq\",\"A\")\n1-normalize(chiSq)", source)
//!         .await?;
//!     let map = require_map(result)?;
//!     println!("{} points, range {}", map.len(), map.range());
//!     Ok(())
//! }
//! ```

pub mod analyzer;
pub mod ast;
pub mod config;
pub mod error;
pub mod eval;
pub mod functions;
pub mod memo;
pub mod model;
pub mod source;
pub mod tokenizer;

// Re-exports
pub use error::{EngineResult, Error};
pub use eval::{Evaluator, Value};
pub use model::{PointValue, PointValueSet};
