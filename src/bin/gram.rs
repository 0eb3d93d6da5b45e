//! Command-line demo for the gram combinator library
//!
//! Parses bracketed list input (words, numbers, and nested lists, e.g.
//! `[a, 12, [b, c]]`) with a grammar built from the library's combinators
//! and prints the built value as JSON. `--dump-grammar` prints the lowered
//! production set and token definitions instead of parsing.

use clap::Parser as ClapParser;
use serde_json::Value;
use std::io::{self, Read};

use gram::gram::{enclosed_list, lit, optional, pat, Definition, Syntax};

#[derive(ClapParser)]
#[command(name = "gram")]
#[command(about = "Parse bracketed list input with a combinator grammar")]
struct Args {
    /// Input to parse; read from stdin when omitted
    input: Option<String>,

    /// JSON context passed to the grammar's transform functions
    #[arg(long, default_value = "null")]
    context: String,

    /// Print the lowered grammar instead of parsing
    #[arg(long)]
    dump_grammar: bool,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,
}

/// Nested bracketed lists: value := number | word | [value, ...]
fn demo_grammar() -> Syntax {
    let value = Syntax::new("value");

    let number = Syntax::new("number");
    number.matches_with(
        || pat("[0-9]+"),
        |args| {
            args.value
                .as_str()
                .and_then(|text| text.parse::<i64>().ok())
                .map(Value::from)
                .unwrap_or(Value::Null)
        },
    );

    let word = Syntax::new("word");
    word.matches(|| pat("[a-z]+"));

    let items = Syntax::new("items");
    {
        let value = value.clone();
        items.matches_with(
            move || {
                enclosed_list(
                    lit("["),
                    optional([lit(" ")]).into(),
                    Definition::from(&value),
                    lit(","),
                    lit("]"),
                )
            },
            |args| args.value["elements"].clone(),
        );
    }

    {
        let number = number.clone();
        value.matches(move || Definition::from(&number));
    }
    {
        let word = word.clone();
        value.matches(move || Definition::from(&word));
    }
    {
        let items = items.clone();
        value.matches(move || Definition::from(&items));
    }

    value
}

fn main() -> io::Result<()> {
    let args = Args::parse();
    let grammar = demo_grammar();

    let invalid = |message: String| io::Error::new(io::ErrorKind::InvalidData, message);

    if args.dump_grammar {
        let parser = grammar
            .parser()
            .map_err(|error| invalid(format!("failed to compile grammar: {}", error)))?;
        if args.pretty {
            let encoded = serde_json::to_string_pretty(&parser.snapshot())
                .map_err(|error| invalid(error.to_string()))?;
            println!("{}", encoded);
        } else {
            print!("{}", parser.snapshot());
        }
        return Ok(());
    }

    let input = match args.input {
        Some(input) => input,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    let input = input.trim_end_matches('\n');

    let context: Value = serde_json::from_str(&args.context)
        .map_err(|error| invalid(format!("invalid --context JSON: {}", error)))?;

    let value = grammar
        .parse(&context, input)
        .map_err(|error| invalid(format!("failed to parse input: {}", error)))?;

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&value).map_err(|error| invalid(error.to_string()))?
    } else {
        value.to_string()
    };
    println!("{}", rendered);
    Ok(())
}
