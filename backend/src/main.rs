//! Termquote CLI - Turn advisor workbooks into term insurance quotes
//!
//! # Main Commands
//!
//! ```bash
//! termquote generate client.xlsx               # Workbook → client_term_quote_final.docx
//! termquote combine client.xlsx premiums.xlsx  # Two files → one quote
//! termquote fetch <sheet url or id>            # Public Google Sheet → quote
//! termquote serve                              # Start HTTP server (port 3000)
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! termquote inspect client.xlsx    # Show what would be extracted
//! termquote config                 # Print the effective configuration
//! ```

use chrono::Local;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use termquote::{
    generate_quote_file, parse_spreadsheet_id, QuoteConfig, QuoteOutput, QuotePipeline, SheetFetcher,
};

#[derive(Parser)]
#[command(name = "termquote")]
#[command(about = "Generate term insurance quote documents from workbooks", long_about = None)]
struct Cli {
    /// JSON config file (default: $TERMQUOTE_CONFIG, then built-in defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a quote from one workbook
    Generate {
        /// Input workbook (.xlsx, .xls, .ods)
        input: PathBuf,

        /// Output .docx (default: <input stem>_term_quote_final.docx)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate a quote from a client workbook and a premium workbook
    Combine {
        /// Workbook holding the client details
        client: PathBuf,

        /// Workbook holding the premium comparison
        premiums: PathBuf,

        /// Output .docx (default: <client slug>_term_quote_final.docx)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate and extract without rendering
    Inspect {
        /// Input workbook
        input: PathBuf,

        /// Print the extraction as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download a public Google Sheet and generate its quote
    Fetch {
        /// Sheet URL or spreadsheet id
        sheet: String,

        /// Output .docx (default: <client slug>_term_quote_final.docx)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also keep the downloaded workbook
        #[arg(long)]
        save_xlsx: Option<PathBuf>,
    },

    /// Print the effective configuration as JSON
    Config,

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match load_config(cli.config.as_deref()) {
        Ok(config) => match cli.command {
            Commands::Generate { input, output } => cmd_generate(&input, output.as_deref(), config),
            Commands::Combine { client, premiums, output } => {
                cmd_combine(&client, &premiums, output.as_deref(), config)
            }
            Commands::Inspect { input, json } => cmd_inspect(&input, json, config),
            Commands::Fetch { sheet, output, save_xlsx } => {
                cmd_fetch(&sheet, output.as_deref(), save_xlsx.as_deref(), config).await
            }
            Commands::Config => cmd_config(&config),
            Commands::Serve { port } => cmd_serve(port, config).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<QuoteConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(p) => QuoteConfig::from_json_file(p)?,
        None => QuoteConfig::from_env()?,
    };
    Ok(config)
}

fn cmd_generate(input: &Path, output: Option<&Path>, config: QuoteConfig) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let result = generate_quote_file(input, config)?;
    write_quote(&result, output)
}

fn cmd_combine(
    client: &Path,
    premiums: &Path,
    output: Option<&Path>,
    config: QuoteConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Client:   {}", client.display());
    eprintln!("📄 Premiums: {}", premiums.display());

    let client_bytes = fs::read(client)?;
    let premium_bytes = fs::read(premiums)?;
    let result = QuotePipeline::new(config).generate_from_parts(
        &client_bytes,
        &premium_bytes,
        Local::now().naive_local(),
    )?;

    write_quote(&result, output)
}

fn cmd_inspect(input: &Path, json: bool, config: QuoteConfig) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("🔍 Inspecting: {}", input.display());

    let bytes = fs::read(input)?;
    let report = QuotePipeline::new(config).inspect(&bytes)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let extraction = &report.extraction;
    let client = &extraction.client;
    println!("Sheets:        {}", report.sheets.join(", "));
    println!("Client:        {}", client.name);
    println!("City:          {}", client.city.as_deref().unwrap_or("-"));
    println!(
        "Term / PPT:    {} / {}",
        client.policy_term.map_or("-".to_string(), |t| t.to_string()),
        client.ppt.map_or("-".to_string(), |t| t.to_string())
    );
    for (header, value) in &client.extra {
        println!("{:<14} {}", format!("{}:", header), value);
    }
    println!("Premium rows:  {}", extraction.premiums.len());
    for option in &extraction.premiums {
        println!("  row {:>3}  {} / {}", option.row, option.insurance_company, option.plan_name);
    }
    println!(
        "Final notes:   {}",
        extraction
            .notes
            .as_ref()
            .map_or("none".to_string(), |n| format!("{} paragraph(s)", n.paragraphs.len()))
    );
    for warning in extraction.warnings.iter().chain(client.term_warning().iter()) {
        println!("⚠️  {}", warning);
    }

    Ok(())
}

async fn cmd_fetch(
    sheet: &str,
    output: Option<&Path>,
    save_xlsx: Option<&Path>,
    config: QuoteConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = parse_spreadsheet_id(sheet)?;
    eprintln!("📡 Sheet: {}", id);

    let bytes = SheetFetcher::new().fetch_xlsx(&id).await?;
    if let Some(path) = save_xlsx {
        fs::write(path, &bytes)?;
        eprintln!("💾 Workbook saved to: {}", path.display());
    }

    let result = QuotePipeline::new(config).generate(&bytes)?;
    write_quote(&result, output)
}

fn cmd_config(config: &QuoteConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", config.to_json()?);
    Ok(())
}

async fn cmd_serve(port: u16, config: QuoteConfig) -> Result<(), Box<dyn std::error::Error>> {
    termquote::server::start_server(port, config).await
}

fn write_quote(result: &QuoteOutput, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&result.file_name));
    fs::write(&path, &result.rendered.bytes)?;

    if !result.warnings.is_empty() {
        eprintln!("\n⚠️  {} warning(s):", result.warnings.len());
        for warning in &result.warnings {
            eprintln!("   - {}", warning);
        }
    }

    eprintln!("💾 Quote written to: {}", path.display());
    eprintln!("\n✨ Done!");
    Ok(())
}
