//! valheim-stack core
//!
//! Declares the infrastructure of a small-group Valheim dedicated server and
//! synthesizes it into a CloudFormation template.
//!
//! ```text
//! valheim.kdl ──► loader (Tera + KDL) ──► Declaration
//!                                            │
//!                                            ▼
//!                                 synthesize() with Stack
//!                                            │
//!                                            ▼
//!                                   Template (JSON)  ──► provisioning engine
//! ```
//!
//! # Example
//!
//! ```
//! use valheim_stack_core::{Declaration, synthesize};
//!
//! let template = synthesize(&Declaration::default());
//! assert!(template.resources.contains_key("ValheimInstance"));
//! ```

pub mod cfn;
pub mod error;
pub mod loader;
pub mod model;
pub mod parser;
pub mod stack;
pub mod synth;
pub mod template;
pub mod validate;

// Re-exports
pub use cfn::{Output, Parameter, RemovalPolicy, Resource, Template};
pub use error::{Result, StackError};
pub use loader::load_declaration;
pub use model::*;
pub use parser::{parse_kdl_file, parse_kdl_string};
pub use stack::Stack;
pub use synth::synthesize;
pub use validate::{Finding, ValidationReport, validate};
