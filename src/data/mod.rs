//! Input data: the toy event generator used by `ttx demo` and the tests.

pub mod sample;

pub use sample::*;
