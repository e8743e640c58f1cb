//! Recursive random expansion of non-terminals into terminal text.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::grammar::{Production, RuleTable, Token};

/// Expands symbols of a [`RuleTable`] by picking productions at random.
///
/// Every non-terminal occurrence makes its own uniform choice; nothing is
/// memoized between calls.
pub struct Expander<'a, R: Rng> {
    rules: &'a RuleTable,
    rng: R,
}

impl<'a, R: Rng> Expander<'a, R> {
    /// Create an expander over `rules` drawing choices from `rng`
    pub fn new(rules: &'a RuleTable, rng: R) -> Self {
        Expander { rules, rng }
    }

    /// Expand `symbol` into raw terminal text.
    ///
    /// Undefined symbols, and symbols with no productions, expand to `""`.
    /// Each terminal is followed by one space; the result is neither trimmed
    /// nor punctuation-normalized.
    pub fn expand(&mut self, symbol: &str) -> String {
        let rules = self.rules;
        match rules
            .get(symbol)
            .and_then(|productions| productions.choose(&mut self.rng))
        {
            Some(production) => self.expand_production(production),
            None => String::new(),
        }
    }

    /// Expand every token of one production, in order.
    pub fn expand_production(&mut self, production: &Production) -> String {
        let mut result = String::new();
        for token in &production.tokens {
            match token {
                Token::Terminal(text) => {
                    result.push_str(text);
                    result.push(' ');
                }
                Token::NonTerminal(name) => {
                    let expanded = self.expand(name);
                    result.push_str(&expanded);
                }
            }
        }
        result
    }
}
