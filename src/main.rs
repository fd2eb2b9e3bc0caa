use hyqa::cli::{Cli, Commands, ConfigAction};
use hyqa::config::{Config, ConfigValidator};
use hyqa::error::{HyqaError, Result};
use hyqa::pipeline::{AnswerOptions, Pipeline, TurnOutcome};
use std::io::{BufRead, Write};
use std::path::PathBuf;

const RULE: &str = "================================================================================";

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    match cli.command {
        Commands::Ask {
            question,
            top_k,
            debug_sql,
            debug_text,
            json,
        } => {
            let config = load_config(cli.config, cli.profile)?;
            let mut options = AnswerOptions::from_config(&config);
            if let Some(k) = top_k {
                options.top_k = k.get();
            }
            options.debug_sql |= debug_sql;
            options.debug_text |= debug_text;
            cmd_ask(&config, &question, &options, json)?;
        }
        Commands::Chat { top_k } => {
            let config = load_config(cli.config, cli.profile)?;
            let mut options = AnswerOptions::from_config(&config);
            if let Some(k) = top_k {
                options.top_k = k.get();
            }
            cmd_chat(&config, &options)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, cli.profile, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "hyqa=debug" } else { "hyqa=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_ask(config: &Config, question: &str, options: &AnswerOptions, json: bool) -> Result<()> {
    let pipeline = Pipeline::from_config(config)?;
    let outcome = pipeline.answer(question, options)?;

    if json {
        let body = serde_json::to_string_pretty(&outcome).map_err(|e| HyqaError::Json {
            source: e,
            context: "Failed to serialize answer".to_string(),
        })?;
        println!("{}", body);
    } else {
        print_outcome(&outcome);
    }

    Ok(())
}

fn cmd_chat(config: &Config, options: &AnswerOptions) -> Result<()> {
    let pipeline = Pipeline::from_config(config)?;

    println!("{}", RULE);
    println!("QUERY ASSISTANT");
    println!("{}", RULE);
    println!("\nWelcome! Ask questions about our company data.");
    println!("\nType 'exit' or 'quit' to end the session.\n");

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("Your question: ");
        std::io::stdout().flush().ok();

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line.map_err(|e| HyqaError::Io {
            source: e,
            context: "Failed to read question".to_string(),
        })?;

        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question.to_lowercase().as_str(), "exit" | "quit" | "q") {
            break;
        }

        match pipeline.answer(question, options) {
            Ok(outcome) => print_outcome(&outcome),
            Err(e) => {
                tracing::error!("Turn failed: {}", e);
                println!("\nAn error occurred: {}\nPlease try again.\n", e);
            }
        }
    }

    println!("\nGoodbye!");
    Ok(())
}

fn print_outcome(outcome: &TurnOutcome) {
    println!("\n{}", RULE);
    println!("ANSWER");
    println!("{}", RULE);
    println!("\n{}\n", outcome.answer);
    println!("{}", RULE);
    println!("{}", outcome.usage);
    println!("{}\n", RULE);

    if let Some(trace) = &outcome.sql_trace {
        println!("{}\n", trace);
    }
    if let Some(trace) = &outcome.text_trace {
        println!("{}\n", trace);
    }
}

fn cmd_config(config_path: Option<PathBuf>, profile: Option<String>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path, profile)?;
            let toml = toml::to_string_pretty(&config)?;
            println!("{}", toml);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = match profile {
                Some(profile) => Config::load_with_profile(&path, &profile)?,
                None => Config::load(&path)?,
            };
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
            println!("  Provider: {} ({})", config.llm.provider, config.llm.endpoint());
            println!(
                "  Models: sql={}, text={}, answer={}, embeddings={}",
                config.models.sql_assistant,
                config.models.text_assistant,
                config.models.answer_generator,
                config.models.embeddings
            );
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| HyqaError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            Config::default().save(&path)?;

            println!("✓ Configuration initialized at: {}", path.display());
            println!("  Point [paths] at the prepared schema metadata, database and corpus files.");
        }
    }

    Ok(())
}

/// Load the config file, or fall back to defaults when none exists
fn load_config(config_path: Option<PathBuf>, profile: Option<String>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if path.exists() {
        return match profile {
            Some(profile) => Config::load_with_profile(&path, &profile),
            None => Config::load(&path),
        };
    }

    tracing::warn!("Config file not found, using defaults. Run 'hyqa config init' to create one.");

    let mut config = Config::default();
    if let Some(profile) = profile {
        config.apply_profile(&profile)?;
    }
    config.apply_env_overrides();
    let base_dir = std::env::current_dir().map_err(|e| HyqaError::Io {
        source: e,
        context: "Failed to determine working directory".to_string(),
    })?;
    config.resolve_paths(&base_dir)?;
    ConfigValidator::validate(&config)?;

    Ok(config)
}
