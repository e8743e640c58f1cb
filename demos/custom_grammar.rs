use rand::SeedableRng;
use rand::rngs::StdRng;
use rsg::grammar::{Production, RuleTable};
use rsg::{Grammar, GrammarConfig};
use std::error::Error;

/// Example of building grammars from text and programmatically
fn main() -> Result<(), Box<dyn Error>> {
    // Example 1: Load a bundled grammar file
    let grammar = Grammar::load("poem", GrammarConfig::default())?;

    println!("Generated poems:");
    for i in 1..=5 {
        println!("{}. {}", i, grammar.generate());
    }

    // Example 2: Build a rule table by hand
    let mut rules = RuleTable::new();
    rules.insert("<start>", vec![Production::parse("<greeting> , <person> !")]);
    rules.insert(
        "<greeting>",
        vec![
            Production::parse("Hello"),
            Production::parse("Bonjour"),
            Production::parse("Guten Tag"),
        ],
    );
    rules.insert(
        "<person>",
        vec![Production::parse("world"), Production::parse("friend")],
    );
    let grammar = Grammar::new(rules);

    println!("\nGenerated greetings with a fixed seed:");
    let mut rng = StdRng::seed_from_u64(7);
    for i in 1..=5 {
        println!("{}. {}", i, grammar.generate_with_rng(&mut rng));
    }

    // Example 3: Inspect the parsed rule table
    let grammar: Grammar = "{<start>\n( <x> ) ;\n} {<x>\n1 ^ 2 ;\n;\n}".parse()?;
    println!("\nRule table:\n{}", grammar.rules().to_json()?);
    println!("Sample: {}", grammar.generate());

    Ok(())
}
