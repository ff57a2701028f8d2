//! Navigation instructions: model, tokenizer, parser, stringifier.

pub mod model;
pub mod parser;
pub mod stringify;
pub mod tokenizer;

pub use model::{
    ComponentRef, InstructionTree, NavigationInstruction, Parameter, Parameters,
    ViewportInstruction,
};
pub use parser::{parse, parse_url, validate};
pub use stringify::{stringify, stringify_instructions};
