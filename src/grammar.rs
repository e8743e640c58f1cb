use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::expander::Expander;
use crate::utils::{GrammarError, PunctuationFilter, Result, TextFilter};

/// Represents a token in a production, either a terminal or a non-terminal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Token {
    /// Literal text, emitted as-is
    Terminal(String),
    /// A `<name>` reference to another rule
    NonTerminal(String),
}

impl Token {
    /// Classify a raw token: `<...>` is a non-terminal, anything else is literal.
    pub fn parse(raw: &str) -> Self {
        if is_non_terminal(raw) {
            Token::NonTerminal(raw.to_string())
        } else {
            Token::Terminal(raw.to_string())
        }
    }

    /// The token text as written in the grammar file
    pub fn as_str(&self) -> &str {
        match self {
            Token::Terminal(text) | Token::NonTerminal(text) => text,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true if `s` starts with `<` and ends with `>`
pub fn is_non_terminal(s: &str) -> bool {
    s.len() >= 2 && s.starts_with('<') && s.ends_with('>')
}

/// One alternative expansion of a non-terminal; may hold zero tokens
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Production {
    /// The sequence of tokens in this production
    pub tokens: Vec<Token>,
}

impl Production {
    /// Tokenize a normalized production string by whitespace.
    pub fn parse(text: &str) -> Self {
        Production {
            tokens: text.split_whitespace().map(Token::parse).collect(),
        }
    }

    /// True when the production expands to nothing
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Mapping from non-terminal name to its alternative productions.
///
/// Names are matched case-insensitively: they are stored lower-cased and
/// every lookup lower-cases its key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleTable {
    rules: HashMap<String, Vec<Production>>,
}

impl RuleTable {
    /// Create an empty rule table
    pub fn new() -> Self {
        RuleTable::default()
    }

    /// Set the productions for `name`, replacing any earlier definition.
    pub fn insert(&mut self, name: &str, productions: Vec<Production>) {
        self.rules.insert(name.trim().to_lowercase(), productions);
    }

    /// Productions for `name`, if it was defined
    pub fn get(&self, name: &str) -> Option<&[Production]> {
        self.rules
            .get(&name.trim().to_lowercase())
            .map(Vec::as_slice)
    }

    /// Check if `name` has a definition
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of defined non-terminals
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when no non-terminal is defined
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Defined non-terminal names, sorted
    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        symbols.sort_unstable();
        symbols
    }

    /// Pretty JSON dump of the table with sorted keys.
    pub fn to_json(&self) -> Result<String> {
        let sorted: BTreeMap<&String, &Vec<Production>> = self.rules.iter().collect();
        Ok(serde_json::to_string_pretty(&sorted)?)
    }
}

/// Configuration options for loading and generating
#[derive(Debug, Clone)]
pub struct GrammarConfig {
    /// Symbol expansion starts from
    pub start_symbol: String,
    /// Whether to trim surrounding whitespace from the final sentence
    pub trim_output: bool,
    /// Directory prefixed to bare grammar names
    pub grammar_dir: PathBuf,
    /// File extension appended to grammar names that lack it
    pub extension: String,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        GrammarConfig {
            start_symbol: "<start>".to_string(),
            trim_output: true,
            grammar_dir: PathBuf::from("grammars"),
            extension: "g".to_string(),
        }
    }
}

impl GrammarConfig {
    /// Turn a grammar name into a file path.
    ///
    /// `poem` becomes `grammars/poem.g`; names already under the grammar
    /// directory (or absolute) are not prefixed again, and names already
    /// carrying the extension are not suffixed again.
    pub fn resolve_path(&self, name: &str) -> PathBuf {
        let mut path = PathBuf::from(name);
        if !path.is_absolute() && !path.starts_with(&self.grammar_dir) {
            path = self.grammar_dir.join(path);
        }
        let has_extension = path
            .extension()
            .is_some_and(|ext| ext.to_string_lossy() == self.extension);
        if !has_extension {
            let mut raw = path.into_os_string();
            raw.push(".");
            raw.push(&self.extension);
            path = PathBuf::from(raw);
        }
        path
    }
}

// Text between a `{` and the next `}`.
static BLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}]*)\}").expect("valid regex"));
static WHITESPACE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Every substring enclosed in braces, in order of appearance, braces excluded.
pub fn extract_definition_blocks(text: &str) -> Vec<&str> {
    BLOCK_REGEX
        .captures_iter(text)
        .filter_map(|captures| captures.get(1))
        .map(|block| block.as_str())
        .collect()
}

/// Normalize one raw grammar line.
///
/// Strips tabs and `;`, strips trailing whitespace, then collapses every
/// remaining whitespace run into a single space.
pub fn normalize_line(line: &str) -> String {
    let stripped: String = line.chars().filter(|c| *c != '\t' && *c != ';').collect();
    WHITESPACE_REGEX
        .replace_all(stripped.trim_end(), " ")
        .into_owned()
}

/// Split a raw block into its non-terminal name followed by its productions.
///
/// Empty lines are dropped before normalization, so a line holding only `;`
/// or only whitespace survives as an empty production.
pub fn split_definition(raw_block: &str) -> Vec<String> {
    raw_block
        .lines()
        .filter(|line| !line.is_empty())
        .map(normalize_line)
        .collect()
}

/// Build the rule table from split definitions.
///
/// A name defined by several blocks keeps only the productions of the last one.
pub fn build_rule_table<I, D>(definitions: I) -> RuleTable
where
    I: IntoIterator<Item = D>,
    D: AsRef<[String]>,
{
    let mut table = RuleTable::new();
    for definition in definitions {
        let Some((name, productions)) = definition.as_ref().split_first() else {
            continue;
        };
        let productions = productions.iter().map(|p| Production::parse(p)).collect();
        table.insert(name, productions);
    }
    table
}

/// A loaded grammar ready to generate sentences
#[derive(Debug, Clone)]
pub struct Grammar {
    /// The rules mapping non-terminals to productions
    rules: RuleTable,
    /// Configuration options
    config: GrammarConfig,
    /// Post-processing applied to every generated sentence
    filter: Box<dyn TextFilter>,
}

impl Grammar {
    /// Wrap an existing rule table with the default configuration
    pub fn new(rules: RuleTable) -> Self {
        Grammar::with_config(rules, GrammarConfig::default())
    }

    /// Wrap an existing rule table with a custom configuration
    pub fn with_config(rules: RuleTable, config: GrammarConfig) -> Self {
        Grammar {
            rules,
            config,
            filter: Box::new(PunctuationFilter),
        }
    }

    /// Replace the post-processing filter
    pub fn with_filter(mut self, filter: Box<dyn TextFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// Parse grammar source text
    pub fn parse(text: &str) -> Self {
        let definitions = extract_definition_blocks(text)
            .into_iter()
            .map(split_definition);
        Grammar::new(build_rule_table(definitions))
    }

    /// Parse a grammar from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| GrammarError::FileNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Grammar::parse(&text))
    }

    /// Resolve a grammar name through `config` and load it
    pub fn load(name: &str, config: GrammarConfig) -> Result<Self> {
        let path = config.resolve_path(name);
        let mut grammar = Grammar::from_file(path)?;
        grammar.config = config;
        Ok(grammar)
    }

    /// Generate a sentence from the configured start symbol
    pub fn generate(&self) -> String {
        self.generate_with_rng(&mut rand::thread_rng())
    }

    /// Generate a sentence from an arbitrary symbol
    pub fn generate_from(&self, symbol: &str) -> String {
        self.generate_from_with_rng(symbol, &mut rand::thread_rng())
    }

    /// Generate from the start symbol using the given random source
    pub fn generate_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        self.generate_from_with_rng(&self.config.start_symbol, rng)
    }

    /// Generate from `symbol` using the given random source
    pub fn generate_from_with_rng<R: Rng + ?Sized>(&self, symbol: &str, rng: &mut R) -> String {
        let raw = Expander::new(&self.rules, rng).expand(symbol);
        let result = self.filter.filter(&raw);

        if self.config.trim_output {
            result.trim().to_string()
        } else {
            result
        }
    }

    /// Get a reference to the grammar's rules
    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Get a reference to the grammar's configuration
    pub fn config(&self) -> &GrammarConfig {
        &self.config
    }

    /// Set a new configuration
    pub fn set_config(&mut self, config: GrammarConfig) {
        self.config = config;
    }
}

impl FromStr for Grammar {
    type Err = GrammarError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(Grammar::parse(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::noop_filter;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const POEM: &str = "
{
<start>
The   <object>   <verb>   tonight. ;
}

{
<object>
waves ;
\tbig    yellow       flowers ;
slugs ;
}
";

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extract_definition_blocks() {
        let blocks = extract_definition_blocks("junk {\n<a>\nx ;\n} more {<b>\n;\n}");
        assert_eq!(blocks, vec!["\n<a>\nx ;\n", "<b>\n;\n"]);
    }

    #[test]
    fn test_split_definition() {
        assert_eq!(
            split_definition("\n<start>\nYou <adj> <name> . ;\nMay <curse> . ;\n"),
            strings(&["<start>", "You <adj> <name> .", "May <curse> ."])
        );
        assert_eq!(
            split_definition("\n<start>\nYou <adj> <name> . ;\n;\n"),
            strings(&["<start>", "You <adj> <name> .", ""])
        );
    }

    #[test]
    fn test_split_definition_keeps_whitespace_lines() {
        assert_eq!(
            split_definition("\n  <start>\n   \n\tgo   home ;  \n\n"),
            strings(&[" <start>", "", "go home"])
        );
        assert_eq!(split_definition("\n<x>\na ;\n   "), strings(&["<x>", "a", ""]));
    }

    #[test]
    fn test_indented_closing_brace_adds_empty_production() {
        let grammar = Grammar::parse("{\n<x>\na ;\n   }");
        let productions = grammar.rules().get("<x>").unwrap();
        assert_eq!(productions, &[Production::parse("a"), Production::default()]);
    }

    #[test]
    fn test_normalize_line_idempotent() {
        for line in ["\tbig    yellow \t flowers ;  ", ";", "  a  b ;; ", "plain"] {
            let once = normalize_line(line);
            assert_eq!(normalize_line(&once), once, "line: {:?}", line);
        }
        assert_eq!(normalize_line("\tbig    yellow       flowers ;"), "big yellow flowers");
    }

    #[test]
    fn test_build_rule_table() {
        let table = build_rule_table(vec![
            strings(&["<start>", "The <object> <verb> tonight."]),
            strings(&["<object>", "waves", "big yellow flowers", ""]),
        ]);

        assert_eq!(table.len(), 2);
        let start = table.get("<start>").unwrap();
        assert_eq!(
            start[0].tokens,
            vec![
                Token::Terminal("The".into()),
                Token::NonTerminal("<object>".into()),
                Token::NonTerminal("<verb>".into()),
                Token::Terminal("tonight.".into()),
            ]
        );
        let object = table.get("<object>").unwrap();
        assert_eq!(object.len(), 3);
        assert_eq!(object[1].tokens.len(), 3);
        assert!(object[2].is_empty());
    }

    #[test]
    fn test_last_definition_wins() {
        let grammar = Grammar::parse("{<x>\na ;\nb ;\n} {<X>\nc ;\n}");
        let productions = grammar.rules().get("<x>").unwrap();
        assert_eq!(productions, &[Production::parse("c")]);
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let grammar = Grammar::parse("{<Noun>\ncat ;\n}");
        assert!(grammar.rules().contains("<noun>"));
        assert!(grammar.rules().contains("<NOUN>"));
        assert_eq!(grammar.rules().symbols(), vec!["<noun>"]);
    }

    #[test]
    fn test_token_classification() {
        assert!(is_non_terminal("<a>"));
        assert!(is_non_terminal("<>"));
        assert!(!is_non_terminal("<"));
        assert!(!is_non_terminal("<a>."));
        assert!(!is_non_terminal("a"));
        assert!(Production::parse("").is_empty());
    }

    #[test]
    fn test_generate_poem() {
        let grammar = Grammar::parse(POEM);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let result = grammar.generate_with_rng(&mut rng);
            assert!(
                result == "The waves tonight."
                    || result == "The big yellow flowers tonight."
                    || result == "The slugs tonight.",
                "unexpected: {:?}",
                result
            );
        }
    }

    #[test]
    fn test_untrimmed_and_unfiltered_output() {
        let mut grammar = Grammar::parse("{<start>\nhi there . ;\n}");
        grammar.set_config(GrammarConfig {
            trim_output: false,
            ..GrammarConfig::default()
        });
        assert_eq!(grammar.generate(), "hi there. ");

        let grammar = grammar.with_filter(noop_filter());
        assert_eq!(grammar.generate(), "hi there . ");
    }

    #[test]
    fn test_resolve_path() {
        let config = GrammarConfig::default();
        assert_eq!(config.resolve_path("poem"), PathBuf::from("grammars/poem.g"));
        assert_eq!(config.resolve_path("poem.g"), PathBuf::from("grammars/poem.g"));
        assert_eq!(
            config.resolve_path("grammars/poem"),
            PathBuf::from("grammars/poem.g")
        );
        assert_eq!(
            config.resolve_path("/tmp/poem.g"),
            PathBuf::from("/tmp/poem.g")
        );
    }

    #[test]
    fn test_to_json() {
        let grammar = Grammar::parse("{<b>\ny ;\n;\n} {<a>\nx <b> ;\n}");
        let json = grammar.rules().to_json().unwrap();
        assert!(json.find("\"<a>\"").unwrap() < json.find("\"<b>\"").unwrap());

        let parsed: RuleTable = serde_json::from_str(&json).unwrap();
        assert_eq!(&parsed, grammar.rules());
    }
}
