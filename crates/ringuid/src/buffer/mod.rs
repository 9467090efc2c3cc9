mod padding;
mod reject;
mod ring;

pub use padding::*;
pub use reject::*;
pub use ring::*;
