mod basic;
mod cached;

pub use basic::*;
pub use cached::*;

#[cfg(test)]
mod tests;
