//! Declaration model
//!
//! Typed description of the desired infrastructure. Every `Default`
//! reproduces the stock Valheim server declaration.

mod access;
mod backup;
mod bootstrap;
mod compute;
mod declaration;
mod identity;
mod network;

// Re-exports
pub use access::*;
pub use backup::*;
pub use bootstrap::*;
pub use compute::*;
pub use declaration::*;
pub use identity::*;
pub use network::*;
