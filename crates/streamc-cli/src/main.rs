//! streamc CLI: validate, explain and run YAML query plans.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use streamc_compiler::compile_plan;
use streamc_core::config::CompilerConfig;
use streamc_exec::{LocalRunner, SourceData};
use streamc_planner::{parse_yaml_plan, PlanConfig};

#[derive(Parser)]
#[command(name = "streamc")]
#[command(about = "streamc: compile logical streaming query plans into dataflow topologies", long_about = None)]
struct Cli {
    /// Log compiler and runner events to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a plan YAML file (syntax and schema check)
    Validate {
        /// Path to the plan YAML file
        #[arg(short, long)]
        plan: PathBuf,
    },

    /// Compile a plan and print the resulting topology
    Explain {
        /// Path to the plan YAML file
        #[arg(short, long)]
        plan: PathBuf,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Compile a plan and execute it over JSON input with the reference runner
    Run {
        /// Path to the plan YAML file
        #[arg(short, long)]
        plan: PathBuf,

        /// JSON file mapping topic -> list of row objects
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        overrides: Overrides,
    },
}

#[derive(clap::Args, Debug, Default, Clone)]
struct Overrides {
    /// State store suffix for table sources (overrides config)
    #[arg(long)]
    state_store_suffix: Option<String>,

    /// Maximum plan nesting depth (overrides config)
    #[arg(long)]
    max_plan_depth: Option<usize>,
}

fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "streamc_compiler=debug,streamc_exec=trace,streamc_dataflow=trace"
    } else {
        "warn"
    }
}

/// `RUST_LOG` wins when set; otherwise `--verbose` selects debug output.
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Validate { plan } => {
            if let Err(e) = validate_plan(&plan) {
                eprintln!("Validation failed: {}", e);
                std::process::exit(1);
            }
            println!("✓ Plan is valid");
        }
        Commands::Explain { plan, overrides } => {
            if let Err(e) = explain_plan(&plan, &overrides) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Run {
            plan,
            input,
            overrides,
        } => {
            if let Err(e) = run_plan(&plan, &input, &overrides) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn validate_plan(plan_path: &Path) -> CliResult<()> {
    let yaml = fs::read_to_string(plan_path)?;
    let _ = parse_yaml_plan(&yaml)?;
    Ok(())
}

fn explain_plan(plan_path: &Path, overrides: &Overrides) -> CliResult<()> {
    let yaml = fs::read_to_string(plan_path)?;
    let parsed = parse_yaml_plan(&yaml)?;
    let config = resolve_config(&parsed.config, overrides)?;
    let compiled = compile_plan(&parsed.plan, &config)?;

    println!("Logical Plan");
    println!("============");
    print!("{}", parsed.plan.explain());
    println!();
    println!("Topology");
    println!("========");
    println!("{}", compiled.topology.describe());
    println!();
    println!("Result:");
    println!("  Kind: {}", compiled.handle.kind());
    println!("  Key: {}", compiled.handle.key_field().name);
    println!("  Schema: {}", compiled.handle.schema());
    match compiled.sink.topic() {
        Some(topic) => println!("  Sink: topic '{}'", topic),
        None => println!("  Sink: console"),
    }
    println!("  Topology hash: {}", compiled.topology.fingerprint()?.short());

    Ok(())
}

fn run_plan(plan_path: &Path, input_path: &Path, overrides: &Overrides) -> CliResult<()> {
    let yaml = fs::read_to_string(plan_path)?;
    let parsed = parse_yaml_plan(&yaml)?;
    let config = resolve_config(&parsed.config, overrides)?;
    let compiled = compile_plan(&parsed.plan, &config)?;

    let input = fs::read_to_string(input_path)?;
    let data = SourceData::from_json_str(&input, &compiled.topology)?;
    let output = LocalRunner::new(&config).run(&compiled.topology, &data)?;

    for line in &output.console {
        println!("{}", line);
    }
    for (topic, records) in &output.sink_rows {
        println!("[{}]", topic);
        for record in records {
            println!("  {}", record);
        }
    }

    let manifest = &output.manifest;
    println!("✓ Plan executed successfully");
    println!("  Rows in: {}, rows out: {}", manifest.rows_in, manifest.rows_out);
    println!("  Duration: {}ms", manifest.duration_ms());
    println!("  Topology hash: {}", manifest.topology_hash.short());

    Ok(())
}

/// Environment, then the plan's `config:` block, then CLI flags.
fn resolve_config(doc: &PlanConfig, overrides: &Overrides) -> CliResult<CompilerConfig> {
    let mut config = CompilerConfig::from_env();
    apply_plan_config(&mut config, doc);
    apply_overrides(&mut config, overrides);
    config.validate()?;
    Ok(config)
}

fn apply_plan_config(cfg: &mut CompilerConfig, doc: &PlanConfig) {
    if let Some(suffix) = &doc.state_store_suffix {
        cfg.state_store_suffix = suffix.clone();
    }
    if let Some(depth) = doc.max_plan_depth {
        cfg.max_plan_depth = depth;
    }
    if let Some(limit) = doc.console_row_limit {
        cfg.console_row_limit = Some(limit);
    }
}

fn apply_overrides(cfg: &mut CompilerConfig, overrides: &Overrides) {
    if let Some(suffix) = &overrides.state_store_suffix {
        cfg.state_store_suffix = suffix.clone();
    }
    if let Some(depth) = overrides.max_plan_depth {
        cfg.max_plan_depth = depth;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_config_overrides_defaults() {
        let mut config = CompilerConfig::default();
        let doc = PlanConfig {
            state_store_suffix: Some("_state".into()),
            console_row_limit: Some(3),
            ..Default::default()
        };
        apply_plan_config(&mut config, &doc);
        assert_eq!(config.state_store_suffix, "_state");
        assert_eq!(config.console_row_limit, Some(3));
        assert_eq!(config.max_plan_depth, 256);
    }

    #[test]
    fn cli_overrides_higher_priority_than_config() {
        let mut config = CompilerConfig::default();
        let doc = PlanConfig {
            state_store_suffix: Some("_state".into()),
            max_plan_depth: Some(10),
            ..Default::default()
        };
        apply_plan_config(&mut config, &doc);
        apply_overrides(
            &mut config,
            &Overrides {
                state_store_suffix: Some("_cli".into()),
                max_plan_depth: None,
            },
        );
        assert_eq!(config.state_store_suffix, "_cli");
        assert_eq!(config.max_plan_depth, 10);
    }

    #[test]
    fn verbose_flag_is_global_and_selects_a_valid_filter() {
        let cli = Cli::try_parse_from(["streamc", "validate", "--plan", "plan.yaml", "-v"]).unwrap();
        assert!(cli.verbose);
        let cli = Cli::try_parse_from(["streamc", "validate", "--plan", "plan.yaml"]).unwrap();
        assert!(!cli.verbose);

        for verbose in [true, false] {
            assert!(EnvFilter::try_new(default_log_filter(verbose)).is_ok());
        }
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        let overrides = Overrides {
            max_plan_depth: Some(0),
            ..Default::default()
        };
        assert!(resolve_config(&PlanConfig::default(), &overrides).is_err());
    }
}
