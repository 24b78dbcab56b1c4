pub mod answers;
pub mod filter;
