pub mod converter;

pub use converter::{Converter, ConverterExit, ConverterOptions, ConverterProcess};
