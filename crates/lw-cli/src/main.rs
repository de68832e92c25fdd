//! Listwright CLI
//!
//! CLI tool for parsing, converting and encoding filter lists, and for
//! running extended selectors against HTML files.

use std::fs;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use lw_rules::{
    convert, deserialize_rules, generate_filter_list, parse_filter_list, read_header, serialize_rules,
    ConversionTarget, ListStats, ParserOptions, RuleNode,
};
use lw_selectors::{
    parse_html, parse_selector, query_selector_all, CosmeticSession, Document, ExtendedSelector, NodeId, Policy,
};

#[derive(Parser)]
#[command(name = "lw-cli")]
#[command(about = "Listwright filter list and selector tools")]
struct Cli {
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Target {
    Adg,
    Ubo,
}

impl From<Target> for ConversionTarget {
    fn from(target: Target) -> Self {
        match target {
            Target::Adg => ConversionTarget::Adg,
            Target::Ubo => ConversionTarget::Ubo,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a filter list and report line statistics
    Parse {
        /// Filter list file
        input: String,

        /// Print the parsed list as JSON
        #[arg(long)]
        json: bool,

        /// Parser options as a JSON file
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Convert a filter list to another dialect
    Convert {
        /// Filter list file
        input: String,

        /// Target dialect
        #[arg(long, value_enum)]
        to: Target,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Parser options as a JSON file
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Encode a filter list in the binary format
    Serialize {
        /// Filter list file
        input: String,

        /// Output file
        #[arg(short, long, default_value = "rules.lwb")]
        output: String,

        /// Parser options as a JSON file
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Decode a binary file back to filter list text
    Deserialize {
        /// Binary file
        input: String,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Dump binary file info
    Info {
        /// Binary file
        input: String,
    },

    /// Run a selector against an HTML file
    Query {
        /// HTML file
        #[arg(long)]
        html: String,

        /// Extended CSS selector
        #[arg(short, long)]
        selector: String,

        /// Page path and query for :matches-path
        #[arg(long)]
        location: Option<String>,
    },

    /// Apply extended selectors to an HTML file through a cosmetic session
    Cosmetic {
        /// HTML file
        #[arg(long)]
        html: String,

        /// File with one selector per line; `!` starts a comment
        #[arg(short, long)]
        selectors: String,

        /// Attribute set on hidden elements
        #[arg(long, default_value = "lw-hidden")]
        attribute: String,

        /// Remove matched elements instead of hiding them
        #[arg(long)]
        remove: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Parse { input, json, config } => cmd_parse(&input, json, config.as_deref()),
        Commands::Convert {
            input,
            to,
            output,
            config,
        } => cmd_convert(&input, to.into(), output.as_deref(), config.as_deref()),
        Commands::Serialize { input, output, config } => cmd_serialize(&input, &output, config.as_deref()),
        Commands::Deserialize { input, output } => cmd_deserialize(&input, output.as_deref()),
        Commands::Info { input } => cmd_info(&input),
        Commands::Query {
            html,
            selector,
            location,
        } => cmd_query(&html, &selector, location.as_deref()),
        Commands::Cosmetic {
            html,
            selectors,
            attribute,
            remove,
        } => cmd_cosmetic(&html, &selectors, &attribute, remove),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// =============================================================================
// Helpers
// =============================================================================

fn read_text(path: &str) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {}", path, e))
}

fn write_output(output: Option<&str>, text: &str) -> Result<(), String> {
    match output {
        Some(path) => fs::write(path, text).map_err(|e| format!("Failed to write '{}': {}", path, e)),
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

fn load_options(config: Option<&str>) -> Result<ParserOptions, String> {
    let Some(path) = config else {
        return Ok(ParserOptions::default());
    };
    let text = read_text(path)?;
    serde_json::from_str(&text).map_err(|e| format!("Invalid config '{}': {}", path, e))
}

fn describe(doc: &Document, node: NodeId) -> String {
    let mut out = format!("<{}", doc.tag_name(node).unwrap_or_default());
    for (name, value) in doc.attributes(node) {
        out.push_str(&format!(" {name}=\"{value}\""));
    }
    out.push('>');
    let text = doc.text_content(node);
    let text = text.trim();
    if !text.is_empty() {
        let snippet: String = text.chars().take(40).collect();
        out.push(' ');
        out.push_str(&snippet);
        if text.chars().count() > 40 {
            out.push_str("...");
        }
    }
    out
}

// =============================================================================
// Filter lists
// =============================================================================

fn cmd_parse(input: &str, json: bool, config: Option<&str>) -> Result<(), String> {
    let options = load_options(config)?;
    let text = read_text(input)?;

    let start = Instant::now();
    let list = parse_filter_list(&text, &options);
    let elapsed = start.elapsed();

    if json {
        let json = serde_json::to_string_pretty(&list).map_err(|e| format!("Failed to encode JSON: {}", e))?;
        println!("{json}");
        return Ok(());
    }

    println!("Parsed '{}' in {:.1}ms", input, elapsed.as_secs_f64() * 1000.0);
    println!("{}", list.stats());
    for item in list.invalid() {
        if let RuleNode::Invalid(invalid) = &item.node {
            println!("  line {}: {}", item.line, invalid.error.message);
        }
    }
    Ok(())
}

fn cmd_convert(input: &str, target: ConversionTarget, output: Option<&str>, config: Option<&str>) -> Result<(), String> {
    let options = load_options(config)?;
    let list = parse_filter_list(&read_text(input)?, &options);

    let mut converted = Vec::with_capacity(list.items.len());
    let mut changed = 0usize;
    let mut failed = 0usize;
    for item in &list.items {
        match convert(&item.node, target) {
            Ok(result) => {
                if result.is_converted() {
                    changed += 1;
                }
                converted.extend(result.into_nodes());
            }
            Err(e) => {
                log::warn!("line {}: {}", item.line, e);
                failed += 1;
            }
        }
    }

    write_output(output, &generate_filter_list(&converted, true))?;
    eprintln!(
        "Converted {} lines to {}: {} changed, {} failed",
        list.items.len(),
        target,
        changed,
        failed
    );
    Ok(())
}

fn cmd_serialize(input: &str, output: &str, config: Option<&str>) -> Result<(), String> {
    let options = load_options(config)?;
    let nodes = parse_filter_list(&read_text(input)?, &options).into_nodes();

    let start = Instant::now();
    let bytes = serialize_rules(&nodes).map_err(|e| format!("Failed to serialize: {}", e))?;
    let elapsed = start.elapsed();

    fs::write(output, &bytes).map_err(|e| format!("Failed to write '{}': {}", output, e))?;
    println!("Serialized {} rules to '{}'", nodes.len(), output);
    println!("  Size:     {} bytes ({:.1} KB)", bytes.len(), bytes.len() as f64 / 1024.0);
    println!("  Time:     {:.1}ms", elapsed.as_secs_f64() * 1000.0);
    Ok(())
}

fn cmd_deserialize(input: &str, output: Option<&str>) -> Result<(), String> {
    let bytes = fs::read(input).map_err(|e| format!("Failed to read '{}': {}", input, e))?;
    let nodes = deserialize_rules(&bytes).map_err(|e| format!("Invalid binary file: {}", e))?;
    write_output(output, &generate_filter_list(&nodes, true))
}

fn cmd_info(input: &str) -> Result<(), String> {
    let bytes = fs::read(input).map_err(|e| format!("Failed to read '{}': {}", input, e))?;
    let info = read_header(&bytes).map_err(|e| format!("Invalid binary file: {}", e))?;
    let nodes = deserialize_rules(&bytes).map_err(|e| format!("Invalid binary file: {}", e))?;

    println!("Binary: {}", input);
    println!("  Schema:      {}", info.schema_version);
    println!("  Nodes:       {}", info.node_count);
    println!("  Total size:  {} bytes ({:.1} KB)", info.byte_len, info.byte_len as f64 / 1024.0);
    println!();
    println!("{}", ListStats::from_nodes(&nodes));
    Ok(())
}

// =============================================================================
// Selectors
// =============================================================================

fn cmd_query(html: &str, selector: &str, location: Option<&str>) -> Result<(), String> {
    let mut doc = parse_html(&read_text(html)?);
    if let Some(location) = location {
        doc.set_location(location);
    }
    let selector = parse_selector(selector).map_err(|e| format!("Invalid selector: {}", e))?;

    let found = query_selector_all(&doc, doc.document(), &selector);
    for &node in &found {
        println!("{}", describe(&doc, node));
    }
    eprintln!("{} element(s) matched", found.len());
    Ok(())
}

fn cmd_cosmetic(html: &str, selectors: &str, attribute: &str, remove: bool) -> Result<(), String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start runtime: {}", e))?;
    runtime.block_on(run_cosmetic(html, selectors, attribute, remove))
}

async fn run_cosmetic(html: &str, selectors: &str, attribute: &str, remove: bool) -> Result<(), String> {
    let mut doc = parse_html(&read_text(html)?);
    let policy = if remove {
        Policy::Remove
    } else {
        Policy::Hide {
            attribute: attribute.to_string(),
        }
    };

    let mut extended = Vec::new();
    for (index, line) in read_text(selectors)?.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('!') {
            continue;
        }
        let selector = parse_selector(line).map_err(|e| format!("line {}: {}", index + 1, e))?;
        extended.push(ExtendedSelector {
            key: line.to_string(),
            selector,
            policy: policy.clone(),
        });
    }

    let mut session = CosmeticSession::default();
    session.start();
    let initial = session.query_all(&mut doc);
    if let Some(features) = &initial.features {
        println!("Features:");
        println!("  Ids:      {}", features.ids.len());
        println!("  Classes:  {}", features.classes.len());
        println!("  Hrefs:    {}", features.hrefs.len());
    }

    session.add_selectors(&doc, extended);
    session
        .notify(doc.document_element().into_iter().collect())
        .map_err(|e| e.to_string())?;
    let batch = session.next_batch().await.ok_or("Batcher closed early")?;
    let update = session.process(&mut doc, &batch);
    session.stop();

    for &node in &update.extended.hidden {
        println!("hidden   {}", describe(&doc, node));
    }
    for &node in &update.extended.removed {
        println!("removed  {}", describe(&doc, node));
    }
    eprintln!(
        "{} hidden, {} removed ({:?} flush)",
        update.extended.hidden.len(),
        update.extended.removed.len(),
        batch.reason
    );
    Ok(())
}
