//! Interpreter: context frames, the stack machine, substitution, imports and loops.

pub mod driver;
pub mod frame;
pub mod machine;
pub mod substitute;
pub mod value;

pub use frame::Frame;
pub use machine::{Interpreter, TokenStream};
pub use value::{Environment, Value};
