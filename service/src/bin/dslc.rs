//! `dslc`: compiles a blueprint document from a local path or URL and
//! prints the resulting plan as JSON.

use clap::Parser;
use dsl_compiler::CompilerConfig;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "dslc", about = "Compile a TOSCA-flavored blueprint into a deployment plan")]
struct Cli {
    /// Local path or URL of the blueprint's main document.
    source: String,

    /// Base URL used to resolve imports that name a bare relative path (§4.1 rule 5).
    #[arg(long)]
    resources_base_url: Option<String>,

    /// A URL to a YAML alias-mapping document, unioned with any inline aliases.
    #[arg(long)]
    alias_mapping_url: Option<String>,

    /// Maximum import recursion depth before aborting.
    #[arg(long, default_value_t = 50)]
    max_import_depth: usize,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = CompilerConfig::new();
    config.max_import_depth = cli.max_import_depth;
    if let Some(url) = cli.resources_base_url {
        config = config.with_resources_base_url(url);
    }
    if let Some(url) = cli.alias_mapping_url {
        config = config.with_alias_mapping_url(url);
    }

    let result = if cli.source.starts_with("http://") || cli.source.starts_with("https://") {
        dsl_compiler::parse_from_url(&cli.source, &config).await
    } else {
        dsl_compiler::parse_from_path(&PathBuf::from(&cli.source), &config).await
    };

    match result {
        Ok(plan) => {
            match serde_json::to_string_pretty(&plan) {
                Ok(json) => {
                    println!("{json}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("error: failed to serialize plan: {e}");
                    ExitCode::FAILURE
                }
            }
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
