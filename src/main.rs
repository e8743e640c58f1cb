use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rsg::{Grammar, GrammarConfig};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// Random sentence generator
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Grammar name or path; read from standard input when omitted
    #[arg(help = "Grammar file name (e.g. poem, grammars/poem.g)")]
    grammar: Option<String>,

    /// Directory searched for bare grammar names
    #[arg(long, default_value = "grammars")]
    dir: PathBuf,

    /// The starting non-terminal symbol
    #[arg(long, default_value = "<start>")]
    start: String,

    /// Number of sentences to generate
    #[arg(long, default_value_t = 1)]
    count: usize,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Keep surrounding whitespace on generated sentences
    #[arg(long)]
    raw: bool,

    /// Print the parsed rule table as JSON instead of generating
    #[arg(long)]
    dump_rules: bool,

    /// Print status lines to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let name = match cli.grammar {
        Some(name) => name,
        None => prompt_grammar_name()?,
    };

    let config = GrammarConfig {
        start_symbol: cli.start,
        trim_output: !cli.raw,
        grammar_dir: cli.dir,
        ..GrammarConfig::default()
    };

    if cli.verbose {
        eprintln!("Loading grammar from {}...", config.resolve_path(&name).display());
    }
    let grammar = Grammar::load(&name, config)?;

    if cli.verbose {
        eprintln!("Loaded {} rules.", grammar.rules().len());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if cli.dump_rules {
        writeln!(out, "{}", grammar.rules().to_json()?)?;
        return Ok(());
    }

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    if cli.count == 1 {
        write!(out, "{}", grammar.generate_with_rng(&mut rng))?;
    } else {
        for _ in 0..cli.count {
            writeln!(out, "{}", grammar.generate_with_rng(&mut rng))?;
        }
    }
    out.flush()?;

    Ok(())
}

fn prompt_grammar_name() -> io::Result<String> {
    eprint!("Please enter a grammar file: ");
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
