pub mod bootstrap;
pub mod diff;
pub mod outputs;
pub mod probe;
pub mod synth;
pub mod validate;
