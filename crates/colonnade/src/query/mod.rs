//! Query derivation pipeline: keyword table, signature parsing, predicate
//! products, option resolution, and statement compilation.

pub mod keyword;
pub mod options;
pub mod parser;
pub mod plan;
pub mod predicate;
