pub mod hasher;
pub mod listing;
pub mod resolver;
pub mod scanner;

pub use listing::{Listing, SourceEnumerator};
pub use scanner::Scanner;
