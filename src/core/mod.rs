// Core primitives for line-oriented CSV tokenizing

pub mod field;
pub mod newlines;
pub mod scanner;

pub use field::*;
pub use newlines::*;
pub use scanner::*;
