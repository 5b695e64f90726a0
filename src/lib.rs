//! dltestgen core library.
//!
//! Compiles annotated loader test cases into a Ninja build description,
//! per-test run scripts, an aggregate run script, a binary registration
//! manifest, and a static invocation table. The library plans builds; it
//! never executes a compiler, linker, or test.

pub mod cli;
pub mod config;
pub mod directive;
pub mod manifest;
pub mod ninja;
pub mod runner;
pub mod runscript;
pub mod stable_file;
pub mod suite;
pub mod translate;
pub mod wrap;
