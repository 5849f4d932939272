use clap::Parser;
use jsbridge::config::{DEFAULT_FILE_NAME, DEFAULT_MAX_DEPTH};
use jsbridge::{HostValue, Session, SessionConfig};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a script to evaluate
    #[arg(required_unless_present = "eval", conflicts_with = "eval")]
    script: Option<PathBuf>,

    /// Evaluate this source text instead of a file
    #[arg(short, long)]
    eval: Option<String>,

    /// File name used in diagnostics (defaults to the script path)
    #[arg(long)]
    file_name: Option<String>,

    /// Install a global before evaluation, as NAME=JSON (repeatable)
    #[arg(short, long = "bind", value_parser = parse_binding)]
    bindings: Vec<(String, Value)>,

    /// Package the source first and run the package
    #[arg(long)]
    via_bytecode: bool,

    /// Maximum nesting of arrays translated element by element
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

fn parse_binding(raw: &str) -> Result<(String, Value), String> {
    let (name, json) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=JSON, got '{}'", raw))?;
    let value = serde_json::from_str(json).map_err(|e| format!("invalid JSON for '{}': {}", name, e))?;
    Ok((name.to_string(), value))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    let (source, default_name) = match (&args.eval, &args.script) {
        (Some(source), _) => (source.clone(), DEFAULT_FILE_NAME.to_string()),
        (None, Some(path)) => (fs::read_to_string(path)?, path.display().to_string()),
        (None, None) => return Err("either a script path or --eval is required".into()),
    };
    let file_name = args.file_name.unwrap_or(default_name);

    let config = SessionConfig::new()
        .with_file_name(file_name.clone())
        .with_max_depth(args.max_depth);
    let mut session = Session::with_config(config)?;

    for (name, value) in args.bindings {
        log::debug!("Binding {} = {}", name, value);
        session.bind(&name, HostValue::Object(value))?;
    }

    let result = if args.via_bytecode {
        let bytecode = session.compile_to_bytecode(&source, &file_name);
        session.execute_bytecode(&bytecode)?
    } else {
        session.evaluate(&source, &file_name)?
    };
    session.close();

    log::info!("Result type: {}", result.type_name());
    println!("{}", serde_json::to_string_pretty(&Value::from(&result))?);
    Ok(())
}
