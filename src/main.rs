use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use facility_finder::sdk::{
    config::FinderConfig,
    directory::{Category, FacilityDirectory, FacilityRecord, Rating},
    pregeocode::{geocode_directory_with_checkpoints, StateHint, CHECKPOINT_EVERY},
    routing::{NominatimGeocoder, OsrmRouter},
    search::{SearchResult, SearchSession, SearchStage, UserQuery},
    util::{log::init_logging, rate_limit::spacing_limiter},
};
use indicatif::{ProgressBar, ProgressStyle};
use std::{fs, path::PathBuf, sync::Arc, time::Duration};

/// Find the nearest healthcare facilities by driving distance
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log verbosely
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank facilities near an address
    Search(SearchArgs),
    /// Fill in facility coordinates ahead of time
    GeocodeDirectory(GeocodeArgs),
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Your street address (e.g., "123 Peachtree St, Atlanta, GA 30301")
    #[arg(short, long)]
    address: String,

    /// Treatment type (e.g., "Physical Therapy")
    #[arg(short, long)]
    category: Option<Category>,

    /// Spoken language
    #[arg(short, long)]
    language: Option<String>,

    /// Exact facility rating (1-3)
    #[arg(short, long)]
    rating: Option<Rating>,

    /// Maximum straight-line distance in miles
    #[arg(long)]
    max_miles: Option<f64>,

    /// Result page, starting at 1
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Results per page
    #[arg(long)]
    page_size: Option<usize>,

    /// Facility directory (JSON or CSV)
    #[arg(short, long, env = "FINDER_DIRECTORY")]
    directory: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Write the JSON result to a file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GeocodeArgs {
    /// Directory to read (JSON)
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write the updated directory (defaults to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// State code appended to addresses that lack one
    #[arg(long, default_value = "GA")]
    state: String,

    /// Full state name also accepted as "already present"
    #[arg(long, default_value = "Georgia")]
    state_name: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(if cli.verbose { "debug" } else { "info" });

    let mut config = FinderConfig::from_env().context("Invalid FINDER_* configuration")?;

    match cli.command {
        Command::Search(args) => run_search(&mut config, args).await,
        Command::GeocodeDirectory(args) => run_geocode(&config, args).await,
    }
}

fn build_geocoder(config: &FinderConfig) -> Result<NominatimGeocoder> {
    Ok(
        NominatimGeocoder::new(&config.geocoder_url, &config.user_agent, config.geocode_timeout)
            .context("Failed to build geocoding client")?
            .with_country_codes(&config.country_codes)
            .with_limiter(spacing_limiter(config.request_delay)),
    )
}

async fn run_search(config: &mut FinderConfig, args: SearchArgs) -> Result<()> {
    if let Some(directory) = args.directory {
        config.directory = directory;
    }
    if let Some(page_size) = args.page_size {
        config.page_size = page_size;
    }
    config.validate()?;

    let directory = FacilityDirectory::from_path(&config.directory)
        .with_context(|| format!("Failed to load {}", config.directory.display()))?;
    log::info!(
        "Loaded {} facilities ({} with coordinates) from {}",
        directory.len(),
        directory.with_coordinates(),
        config.directory.display()
    );

    let geocoder = build_geocoder(config)?;
    let router = OsrmRouter::new(&config.router_url, &config.user_agent, config.route_timeout)
        .context("Failed to build routing client")?
        .with_limiter(spacing_limiter(config.request_delay));
    let session = SearchSession::new(
        geocoder,
        router,
        Arc::new(directory),
        config.pipeline_settings(),
    );

    let mut query = UserQuery::new(args.address.trim()).on_page(args.page);
    if let Some(category) = args.category {
        query = query.with_category(category);
    }
    if let Some(language) = args.language {
        query = query.with_language(language);
    }
    if let Some(rating) = args.rating {
        query = query.with_rating(rating);
    }
    if let Some(miles) = args.max_miles {
        query = query.within_miles(miles);
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid spinner template"),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    let on_progress = |stage: SearchStage| spinner.set_message(stage.to_string());

    let outcome = session.search_with_progress(&query, &on_progress).await;
    spinner.finish_and_clear();

    let result = outcome.map_err(|err| {
        log::debug!("Search error: {}", err);
        anyhow!(err.user_message())
    })?;

    if args.json || args.output.is_some() {
        let json_output = serde_json::to_string_pretty(&result)?;
        match &args.output {
            Some(path) => {
                fs::write(path, json_output)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                log::info!("Results written to {}", path.display());
            }
            None => println!("{}", json_output),
        }
    } else {
        print_result(&query.address, &result);
    }
    Ok(())
}

fn print_result(user_address: &str, result: &SearchResult) {
    println!(
        "Showing {} of {} matching facilities (page {} of {})",
        result.facilities.len(),
        result.total_filtered,
        result.page,
        result.total_pages().max(1)
    );
    if let Some(label) = &result.user_location.label {
        println!("From: {}", label);
    }
    println!();

    let offset = (result.page - 1) * result.page_size;
    for (i, ranked) in result.facilities.iter().enumerate() {
        let f = &ranked.facility;
        let distance = match &ranked.driving {
            Some(d) => format!("{:.1} mi, {} min drive", d.distance_miles, d.duration_minutes),
            None => format!("~{:.1} mi straight line", ranked.straight_line_miles),
        };
        println!("{:>3}. {} [{}] {}", offset + i + 1, f.name, f.category, distance);
        print_details(f);
        if let Some(url) = ranked.directions_url(user_address) {
            println!("     Directions: {}", url);
        }
    }
}

fn print_details(f: &FacilityRecord) {
    let mut tags = Vec::new();
    if f.preferred {
        tags.push("Preferred".to_string());
    }
    if let Some(rating) = f.rating {
        let stars: String = (Rating::MIN..=Rating::MAX)
            .map(|s| if s <= rating.value() { '★' } else { '☆' })
            .collect();
        tags.push(stars);
    }
    if !f.languages.is_empty() {
        tags.push(f.languages.join("/"));
    }
    if let Some(insurance) = &f.insurance {
        tags.push(insurance.clone());
    }
    if !tags.is_empty() {
        println!("     {}", tags.join(" · "));
    }
    if let Some(address) = &f.address {
        println!("     {}", address);
    }
    if let Some(hours) = &f.hours {
        println!("     Hours: {}", hours);
    }
}

async fn run_geocode(config: &FinderConfig, args: GeocodeArgs) -> Result<()> {
    let data = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let mut records: Vec<FacilityRecord> = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse {}", args.input.display()))?;

    let state = StateHint::new(&args.state, Some(&args.state_name))?;
    let geocoder = build_geocoder(config)?;
    let output = args.output.unwrap_or(args.input);
    let save = |records: &[FacilityRecord]| -> Result<()> {
        fs::write(&output, serde_json::to_string_pretty(records)?)
            .with_context(|| format!("Failed to write {}", output.display()))
    };

    let report =
        geocode_directory_with_checkpoints(&mut records, &geocoder, &state, CHECKPOINT_EVERY, save)
            .await?;
    save(&records)?;

    log::info!(
        "Done! geocoded={}, skipped={}, failed={}",
        report.geocoded,
        report.skipped,
        report.failed
    );
    for address in &report.failed_addresses {
        log::warn!("  - {}", address);
    }
    log::info!("Saved to {}", output.display());
    Ok(())
}
