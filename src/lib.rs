#![deny(missing_docs)]

//! # DynamoDB Intent
//!
//! A client-side toolkit for the hard parts of talking to DynamoDB: marshalling
//! values to and from the wire format, deriving single-table composite keys,
//! compiling typed conditions and updates into expression strings, and
//! executing requests with retries, deduplication, coalescing and capacity
//! accounting over an injected transport.
//!
//! ## Overview
//!
//! - Prevents malformed expressions at compile time through structured types
//! - Derives composite keys (`USER#42`) from declarative patterns
//! - Retries throttled requests with exponential backoff and jitter
//! - Shares in-flight work across identical and batched lookups
//! - Never opens a socket itself: the transport is injected, so the same code
//!   runs against the real service, an emulator or a test mock
//!
//! ## Quick Example
//!
//! Instead of manually building expression strings and managing placeholders,
//! use structured types that the compiler validates:
//!
//! ```rust
//! use dynamodb_intent::expression::compiler::Compiler;
//! use dynamodb_intent::expression::condition::{Condition, WhereClause};
//! use dynamodb_intent::expression::ExpressionKind;
//!
//! # fn example() -> dynamodb_intent::error::Result<()> {
//! let mut compiler = Compiler::new(ExpressionKind::Condition);
//! compiler.push(WhereClause::new("status", Condition::Equals("ACTIVE")))?;
//! compiler.push(WhereClause::new("age", Condition::GreaterThanOrEqual(21)))?;
//! let compiled = compiler.build();
//! assert_eq!(compiled.expression, "#n0 = :v0 AND #n1 >= :v1");
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`mod@value`] and [`mod@codec`] - Native values and wire marshalling
//! - [`mod@key`] - Composite key derivation from declarative patterns
//! - [`mod@expression`] - Conditions, updates and projections as data
//! - [`mod@client`], [`mod@read`], [`mod@write`] - Operations over a transport
//! - [`mod@retry`], [`mod@dedup`], [`mod@coalesce`] - Execution strategies
//! - [`mod@metrics`] - Consumed capacity and outcome accounting

/// Client configuration and request execution.
pub mod client;

/// Coalescing of individual key lookups into batched calls.
pub mod coalesce;

/// Marshalling between native values and the wire format.
pub mod codec;

/// Deduplication of concurrent identical requests.
pub mod dedup;

/// The crate's error taxonomy.
pub mod error;

/// Typed expression building for conditions, updates and projections.
pub mod expression;

/// Composite key derivation from declarative patterns.
pub mod key;

/// Consumed capacity and request outcome accounting.
pub mod metrics;

/// Read operations for retrieving items.
///
/// This module provides operations for:
/// - Getting individual items by their derived key
/// - Querying partitions with key conditions and filters
/// - Batch retrieving multiple items
pub mod read;

/// Retry of transient failures with exponential backoff and jitter.
pub mod retry;

/// The injected transport boundary.
pub mod transport;

/// Native attribute values.
pub mod value;

/// Write operations for modifying items.
///
/// This module provides operations for:
/// - Putting new items or replacing existing ones
/// - Updating items with set, remove, add and delete actions
/// - Deleting items by their derived key
pub mod write;
