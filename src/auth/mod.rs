mod extractor;
pub mod password;
pub mod token;

pub use token::Claims;
