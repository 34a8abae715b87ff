use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docfill::{CustomerRecord, PackageConfig, PackageGenerator};
use log::{info, warn};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the customer JSON file
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    /// Output directory (overrides config if provided)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Dry run mode - don't write files
    #[arg(long, global = true)]
    dry_run: bool,

    /// Also convert, merge and archive the filled documents
    #[arg(long, global = true)]
    full: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new docfill project
    Init {
        /// Project directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Fill the template package (default command)
    Generate,
    /// Print the replacement map for a customer, longest literal first
    Map,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Init { path }) => init_project(path)?,
        Some(Commands::Map) => print_map(&cli)?,
        Some(Commands::Generate) | None => generate(&cli)?,
    }

    Ok(())
}

fn init_project(path: &Path) -> Result<()> {
    info!("Initializing docfill project at {:?}", path);

    std::fs::create_dir_all(path.join("templates"))?;

    let config_content = r#"templates: templates
extension: docx
package_name: Document_Package
output: output

# Template file names containing these tokens get `_<LastName>` instead.
filename_tokens:
  - _JQD

rules:
  builtin: true
  files:
    - rules.yaml

naming:
  merged: "{{ package }}_{{ last_name }}_{{ document_date }}_COMPLETE.pdf"
  archive: "{{ package }}_{{ last_name }}_{{ document_date }}_Individual_PDFs.zip"

converter:
  command: soffice
  args: ["--headless", "--convert-to", "pdf", "--outdir", "{outdir}", "{input}"]
"#;
    std::fs::write(path.join("config.yaml"), config_content)?;

    let customer_content = r#"{
  "firstName": "John",
  "middleName": "Michael",
  "lastName": "Smith",
  "ssn": "123-45-6789",
  "streetAddress": "456 Oak Lane",
  "city": "Houston",
  "state": "Texas",
  "zipCode": "77001",
  "county": "Harris",
  "lienAmount": 100000000,
  "documentDate": "2025-01-15",
  "birthDate": "1985-06-15"
}
"#;
    std::fs::write(path.join("customer.json"), customer_content)?;

    let rules_content = r#"# Rules added on top of the built-in table.
rules:
  - literal: 'Doe Family Trust'
    value: '{{ name.mixed_no_middle }} Family Trust'
    requires: [last]
"#;
    std::fs::write(path.join("rules.yaml"), rules_content)?;

    info!("✓ Project initialized successfully!");
    info!("  Copy your .docx templates into templates/, then run:");
    info!("  docfill -c config.yaml -d customer.json");

    Ok(())
}

fn load_inputs(cli: &Cli) -> Result<(PackageConfig, CustomerRecord)> {
    let config_path = cli
        .config
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("--config is required"))?;
    let data_path = cli
        .data
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("--data is required"))?;

    info!("Loading config from {:?}", config_path);
    let config = PackageConfig::load(config_path).context("Failed to load config")?;

    info!("Loading customer from {:?}", data_path);
    let customer = CustomerRecord::load(data_path).context("Failed to load customer data")?;

    Ok((config, customer))
}

fn print_map(cli: &Cli) -> Result<()> {
    let (config, customer) = load_inputs(cli)?;
    let generator = PackageGenerator::new(config).context("Failed to load rule table")?;
    let map = generator
        .build_map(&customer)
        .context("Failed to build replacement map")?;

    println!("{}", serde_json::to_string_pretty(&map.longest_first())?);
    Ok(())
}

fn generate(cli: &Cli) -> Result<()> {
    let (config, customer) = load_inputs(cli)?;

    let output_dir = match (&cli.output, &config.output) {
        (Some(dir), _) => dir.clone(),
        (None, Some(dir)) => config.resolve(dir),
        (None, None) => config.resolve("output"),
    };

    if cli.dry_run {
        info!("=== DRY RUN MODE ===");
    }

    let generator = PackageGenerator::new(config)
        .context("Failed to load rule table")?
        .with_dry_run(cli.dry_run);

    let result = if cli.full {
        generator.generate_full_package(&customer, &output_dir)
    } else {
        generator.generate_package(&customer, &output_dir)
    }
    .context("Package generation failed")?;

    if !result.errors.is_empty() {
        warn!("{} documents could not be generated", result.errors.len());
    }
    println!("{}", serde_json::to_string_pretty(&result)?);

    if cli.dry_run {
        info!("=== DRY RUN COMPLETE ===");
    }

    Ok(())
}
