//! RSG is a random sentence generator driven by simple context-free grammars.
//!
//! A grammar file holds brace-delimited definitions. The first line of each
//! block names a non-terminal and every following line, terminated by `;`,
//! is one alternative production. Generation starts at `<start>` and
//! replaces each non-terminal with a randomly chosen production until only
//! literal words remain.
//!
//! # Example
//!
//! ```rust
//! use rsg::Grammar;
//!
//! let grammar = Grammar::parse(
//!     "{\n<start>\nThe <object> sighs tonight. ;\n}\n{\n<object>\nsea ;\nwind ;\n}",
//! );
//!
//! let text = grammar.generate();
//! assert!(text == "The sea sighs tonight." || text == "The wind sighs tonight.");
//! ```

pub mod expander;
pub mod grammar;
pub mod utils;

pub use expander::Expander;
pub use grammar::{Grammar, GrammarConfig, Production, RuleTable, Token};
pub use utils::{GrammarError, Result, TextFilter, normalize_punctuation};
