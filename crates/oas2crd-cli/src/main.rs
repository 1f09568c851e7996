use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use oas2crd_core::config::{self, CONFIG_FILE_NAME, DefinitionConfig};
use oas2crd_core::{render, security};
use oas2crd_core::transpile::{self, JsonSchema, Transpiled};
use oas2crd_core::{Document, GeneratedFile, generate_schema_set};

#[derive(Parser)]
#[command(
    name = "oas2crd",
    about = "Generate CRD schemas from OpenAPI 3.x documents",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate spec, status and auth schemas for the configured resources
    Generate {
        /// Path to the definition config
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Path to the OpenAPI document (YAML or JSON)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write indented JSON instead of compact JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Validate an OpenAPI document and resolve its references
    Validate {
        /// Path to the OpenAPI document
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Print struct definitions for the component schemas of a document
    Structs {
        /// Path to the OpenAPI document, or a JSON Schema with --json-schema
        #[arg(short, long)]
        input: PathBuf,

        /// Treat the input as a plain JSON Schema document
        #[arg(long)]
        json_schema: bool,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: OutputFormat,
    },

    /// Initialize a new oas2crd configuration
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            config,
            input,
            output,
            pretty,
        } => cmd_generate(config, input, output, pretty),

        Commands::Validate { input } => cmd_validate(&input),

        Commands::Structs {
            input,
            json_schema,
            format,
        } => cmd_structs(&input, json_schema, format),

        Commands::Init { force } => cmd_init(Path::new(CONFIG_FILE_NAME), force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "oas2crd", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn load_document(path: &Path) -> Result<Document> {
    let content = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Document::load(&content).with_context(|| format!("failed to load {}", path.display()))
}

/// Write generated files to disk under the given base directory.
fn write_files(base: &Path, files: &[GeneratedFile]) -> Result<()> {
    for file in files {
        let path = base.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        fs::write(&path, &file.content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("  wrote {}", path.display());
    }
    Ok(())
}

fn cmd_generate(
    config_path: Option<PathBuf>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<()> {
    let config_path = config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    let cfg = config::load_config(&config_path)?.unwrap_or_default();
    let input = input.unwrap_or_else(|| PathBuf::from(&cfg.input));
    let output = output.unwrap_or_else(|| PathBuf::from(&cfg.output));
    generate(&cfg, &input, &output, pretty)
}

fn generate(cfg: &DefinitionConfig, input: &Path, output: &Path, pretty: bool) -> Result<()> {
    let doc = load_document(input)?;

    if cfg.resources.is_empty() {
        eprintln!("No resources configured. Add a `resources` section to your config.");
        return Ok(());
    }

    fs::create_dir_all(output)
        .with_context(|| format!("failed to create output directory {}", output.display()))?;

    let mut written = 0;
    for resource in &cfg.resources {
        eprintln!("Generating {}.{}", resource.kind, cfg.group);
        let set = generate_schema_set(&doc, resource)
            .with_context(|| format!("failed to generate schemas for {}", resource.kind))?;
        for warning in set.warnings() {
            eprintln!("  warning: {warning}");
        }
        let mut files = set.files();
        if pretty {
            for file in &mut files {
                file.content = render::prettify(&file.content)
                    .with_context(|| format!("failed to format {}", file.path))?;
            }
        }
        write_files(output, &files)?;
        written += files.len();
        log::debug!("{}: {} files", resource.kind, files.len());
    }

    eprintln!("Generated {} files in {}", written, output.display());
    Ok(())
}

fn cmd_validate(input: &Path) -> Result<()> {
    let doc = load_document(input)?;
    let info = doc.info();

    eprintln!("Valid OpenAPI document: {}", info.title);
    eprintln!("  Version: {}", info.version);
    eprintln!("  Paths: {}", doc.paths().count());
    for (path, _) in doc.paths() {
        let methods: Vec<&str> = doc
            .operations(path)
            .into_iter()
            .map(|(method, _)| method.as_str())
            .collect();
        eprintln!("    {} [{}]", path, methods.join(", "));
    }

    for (name, scheme) in doc.security_schemes() {
        match security::canonical_name(scheme) {
            Ok(canonical) => eprintln!("  Security scheme {name}: {canonical}"),
            Err(e) => eprintln!("  Security scheme {name}: skipped ({e})"),
        }
    }

    eprintln!("Validation successful.");
    Ok(())
}

fn transpile_input(input: &Path, json_schema: bool) -> Result<Transpiled> {
    if json_schema {
        let content =
            fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
        let schema = JsonSchema::parse(&content)?;
        let key = input
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.trim_end_matches(".schema").to_string())
            .unwrap_or_default();
        Ok(transpile::transpile_named([(key, schema)])?)
    } else {
        let doc = load_document(input)?;
        Ok(transpile::transpile_document(&doc)?)
    }
}

fn cmd_structs(input: &Path, json_schema: bool, format: OutputFormat) -> Result<()> {
    let transpiled = transpile_input(input, json_schema)?;

    match format {
        OutputFormat::Yaml => {
            let yaml = serde_yaml_ng::to_string(&transpiled)?;
            print!("{}", yaml);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&transpiled)?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn cmd_init(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(config_path, config::default_config_content())
        .with_context(|| format!("failed to write {}", config_path.display()))?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}
