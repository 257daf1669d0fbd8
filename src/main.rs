mod adapters;
mod config;
mod core;
mod server;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const COMMENTS_FILE: &str = "code_comments.txt";
const SUGGESTIONS_FILE: &str = "code_suggestions.txt";

#[derive(Parser)]
#[command(name = "code-commenter")]
#[command(about = "Plain-language comments and improvement suggestions for your code", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, help = "Model name (gemini-*, claude-*, gpt-*, ollama:*)")]
    model: Option<String>,

    #[arg(long, global = true, help = "Override the system prompt")]
    prompt: Option<String>,

    #[arg(long, global = true)]
    temperature: Option<f32>,

    #[arg(long, global = true)]
    max_tokens: Option<usize>,

    #[arg(long, global = true, help = "Config file (defaults to .code-commenter.yml)")]
    config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text")]
    output_format: OutputFormat,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Generate comments and improvement suggestions")]
    Analyze {
        #[arg(help = "Source file (reads from stdin if not provided)")]
        file: Option<PathBuf>,

        #[arg(long, conflicts_with = "file", help = "Analyze a bundled sample")]
        example: Option<core::Sample>,

        #[arg(long, help = "Return the code with comments written into it")]
        inline: bool,

        #[arg(long, help = "Write code_comments.txt and code_suggestions.txt here")]
        output_dir: Option<PathBuf>,
    },
    #[command(about = "Generate plain-language comments only")]
    Explain {
        file: Option<PathBuf>,

        #[arg(long, conflicts_with = "file")]
        example: Option<core::Sample>,

        #[arg(long)]
        inline: bool,

        #[arg(short, long, help = "Output file path (prints to stdout if not provided)")]
        output: Option<PathBuf>,
    },
    #[command(about = "Generate improvement suggestions only")]
    Suggest {
        file: Option<PathBuf>,

        #[arg(long, conflicts_with = "file")]
        example: Option<core::Sample>,

        #[arg(short, long, help = "Output file path (prints to stdout if not provided)")]
        output: Option<PathBuf>,
    },
    #[command(about = "Print the detected language without calling the model")]
    Detect {
        file: Option<PathBuf>,

        #[arg(long, conflicts_with = "file")]
        example: Option<core::Sample>,
    },
    #[command(about = "Run the JSON backend for a browser front end")]
    Serve {
        #[arg(long, help = "Address to listen on (defaults to server.bind in config)")]
        bind: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => config::Config::from_path(path)?,
        None => config::Config::load().unwrap_or_else(|e| {
            warn!("Ignoring unreadable config: {:#}", e);
            config::Config::default()
        }),
    };
    config.merge_with_cli(cli.model.clone(), cli.prompt.clone());
    if let Some(temp) = cli.temperature {
        config.temperature = temp;
    }
    if let Some(tokens) = cli.max_tokens {
        config.max_tokens = tokens;
    }
    config.normalize();

    match cli.command {
        Commands::Analyze {
            file,
            example,
            inline,
            output_dir,
        } => {
            let code = read_input(file, example).await?;
            let style = comment_style(&config, inline);
            analyze_command(&config, &code, style, output_dir, cli.output_format).await?;
        }
        Commands::Explain {
            file,
            example,
            inline,
            output,
        } => {
            let code = read_input(file, example).await?;
            explain_command(&config, &code, inline, output).await?;
        }
        Commands::Suggest {
            file,
            example,
            output,
        } => {
            let code = read_input(file, example).await?;
            suggest_command(&config, &code, output).await?;
        }
        Commands::Detect { file, example } => {
            let code = read_input(file, example).await?;
            let language = core::LanguageDetector::detect(&code);
            match cli.output_format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&server::DetectResponse { language })?
                ),
                _ => println!("{}", language),
            }
        }
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            let state = Arc::new(server::AppState {
                analyzer: build_analyzer(&config)?,
            });
            server::serve(state, &bind).await?;
        }
    }

    Ok(())
}

fn build_analyzer(config: &config::Config) -> Result<core::CodeAnalyzer> {
    let adapter = adapters::llm::create_adapter(&config.model_config())?;

    let mut prompt_config = core::PromptConfig::default();
    if let Some(custom_prompt) = &config.system_prompt {
        prompt_config.system_prompt = custom_prompt.clone();
    }

    Ok(core::CodeAnalyzer::new(
        adapter,
        core::PromptBuilder::new(prompt_config),
        config.comment_style,
    ))
}

fn comment_style(config: &config::Config, inline: bool) -> core::CommentStyle {
    if inline {
        core::CommentStyle::Inline
    } else {
        config.comment_style
    }
}

async fn read_input(file: Option<PathBuf>, example: Option<core::Sample>) -> Result<String> {
    if let Some(sample) = example {
        return Ok(sample.code().to_string());
    }

    if let Some(path) = file {
        return tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()));
    }

    // An interactive terminal with nothing piped counts as no code
    if std::io::stdin().is_terminal() {
        return Ok(String::new());
    }

    use std::io::Read;
    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

async fn analyze_command(
    config: &config::Config,
    code: &str,
    style: core::CommentStyle,
    output_dir: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    core::ensure_code(code)?;
    info!("Starting analysis with model: {}", config.model);

    let analyzer = build_analyzer(config)?;
    let result = analyzer.analyze(code, style).await?;
    info!("Detected language: {}", result.language.display_name());

    let complete = result.is_complete();
    let output = finish_analysis(result, output_dir.as_deref(), format).await?;
    println!("{}", output);

    if !complete {
        anyhow::bail!("Analysis finished with errors");
    }
    Ok(())
}

/// Saves the download files, then renders the result. A failed save is
/// logged and never costs the caller the generated text.
async fn finish_analysis(
    result: core::AnalysisResult,
    output_dir: Option<&Path>,
    format: OutputFormat,
) -> Result<String> {
    if let Some(dir) = output_dir {
        if let Err(e) = write_downloads(&result, dir).await {
            warn!("Could not save downloads: {:#}", e);
        }
    }

    let output = match format {
        OutputFormat::Text => format_as_text(&result),
        OutputFormat::Markdown => format_as_markdown(&result),
        OutputFormat::Json => {
            serde_json::to_string_pretty(&server::AnalyzeResponse::from(result))?
        }
    };
    Ok(output)
}

async fn explain_command(
    config: &config::Config,
    code: &str,
    inline: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    core::ensure_code(code)?;
    let analyzer = build_analyzer(config)?;
    let comments = if inline {
        analyzer
            .explain_with_style(code, core::CommentStyle::Inline)
            .await?
    } else {
        analyzer.explain(code).await?
    };
    write_output(&comments, output).await
}

async fn suggest_command(
    config: &config::Config,
    code: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    core::ensure_code(code)?;
    let analyzer = build_analyzer(config)?;
    let suggestions = analyzer.suggest(code).await?;
    write_output(&suggestions, output).await
}

async fn write_output(text: &str, output_path: Option<PathBuf>) -> Result<()> {
    if let Some(path) = output_path {
        tokio::fs::write(&path, text)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {}", path.display());
    } else {
        println!("{}", text);
    }
    Ok(())
}

/// Saves each successful output as its own plain-text file.
async fn write_downloads(result: &core::AnalysisResult, dir: &Path) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut written = Vec::new();
    for (name, output) in [
        (COMMENTS_FILE, &result.explanation),
        (SUGGESTIONS_FILE, &result.suggestions),
    ] {
        match output {
            Ok(text) => {
                let path = dir.join(name);
                tokio::fs::write(&path, text)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Wrote {}", path.display());
                written.push(path);
            }
            Err(_) => warn!("Skipping {}: generation failed", name),
        }
    }
    Ok(written)
}

fn format_as_text(result: &core::AnalysisResult) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Detected language: {}\n\n",
        result.language.display_name()
    ));

    output.push_str("== User-Friendly Comments ==\n\n");
    push_section_text(&mut output, &result.explanation);
    output.push_str("\n== Improvement Suggestions ==\n\n");
    push_section_text(&mut output, &result.suggestions);

    output
}

fn push_section_text<E: std::fmt::Display>(output: &mut String, section: &Result<String, E>) {
    match section {
        Ok(text) => output.push_str(text.trim_end()),
        Err(e) => output.push_str(&format!("Error: {}", e)),
    }
    output.push('\n');
}

fn format_as_markdown(result: &core::AnalysisResult) -> String {
    let mut output = String::new();

    output.push_str("# Code Analysis\n\n");
    output.push_str(&format!(
        "**Detected language:** {}\n\n",
        result.language.display_name()
    ));

    output.push_str("## Code Comments\n\n");
    match &result.explanation {
        Ok(text) => {
            let fence_lang = if result.language.is_unknown() {
                ""
            } else {
                result.language.tag()
            };
            output.push_str(&format!("```{}\n{}\n```\n\n", fence_lang, text.trim_end()));
        }
        Err(e) => output.push_str(&format!("> **Error:** {}\n\n", e)),
    }

    output.push_str("## Improvement Suggestions\n\n");
    match &result.suggestions {
        Ok(text) => {
            for item in core::group_suggestions(text) {
                output.push_str(&item.text());
                output.push_str("\n\n");
            }
        }
        Err(e) => output.push_str(&format!("> **Error:** {}\n\n", e)),
    }

    output
}
