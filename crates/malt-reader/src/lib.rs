pub mod lexer;
mod reader;

pub use reader::{read, read_many, read_one, Read};
