use clap::Parser;
use sectioner::config::HierarchyConfig;
use sectioner::document::Document;
use sectioner::hierarchy::reconstruct;
use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

type DynError = Box<dyn Error + Send + Sync>;

#[derive(Parser)]
#[command(name = "sectioner")]
#[command(about = "Rebuild nested sections in a flat XML document", long_about = None)]
struct Args {
    /// Flat XML document
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Where to write the sectioned document (stdout when omitted)
    #[arg(long, short = 'o', value_name = "PATH")]
    output: Option<PathBuf>,

    /// JSON config file (defaults to $CONFIGS_PATH/hierarchy.json)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Minimum rank treated as a heading
    #[arg(long)]
    size_cutoff: Option<f64>,

    /// Ranks seen more often than this are ignored
    #[arg(long)]
    max_headings: Option<usize>,

    /// Print the reconstructed outline as JSON instead of the document
    #[arg(long)]
    outline: bool,
}

fn main() {
    init_tracing();

    if let Err(err) = run(Args::parse()) {
        tracing::error!("[Sectioner] {}", err);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), DynError> {
    let mut config = match &args.config {
        Some(path) => HierarchyConfig::load_from_file(path)?,
        None => HierarchyConfig::load_default()?,
    };
    if let Some(size_cutoff) = args.size_cutoff {
        config.size_cutoff = size_cutoff;
    }
    if let Some(max_headings) = args.max_headings {
        config.max_headings = max_headings;
    }
    config.validate()?;

    let mut doc = Document::load(&args.input)?;
    tracing::info!("[Sectioner] loaded {}", args.input.display());

    let outcome = reconstruct(&mut doc, &config);

    if args.outline {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        if let Some(path) = &args.output {
            doc.persist(path)?;
        }
        return Ok(());
    }

    match &args.output {
        Some(path) => {
            doc.persist(path)?;
            tracing::info!("[Sectioner] wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(doc.to_xml().as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
