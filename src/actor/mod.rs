//! Actor System for Watch Mode
//!
//! Message-passing concurrency for the dev server:
//!
//! ```text
//! FsActor --> Dispatcher --> WsActor
//! (watch)     (run tasks)   (broadcast)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - File system watcher with debouncing
//! - `dispatcher` - Watch rules and serialized task runs
//! - `ws` - WebSocket broadcast and the browser overlay reporter
//! - `coordinator` - Wires up and runs actors

pub mod coordinator;
pub mod dispatcher;
pub mod fs;
pub mod messages;
pub mod ws;

pub use coordinator::Coordinator;
