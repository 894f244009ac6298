use clap::{Parser, Subcommand};
use giftrec_affiliate::{AffiliateClient, ProbeRequest};
use giftrec_core::{AppConfig, Catalog};
use giftrec_recommend::{parse_request, RecommendSettings, Recommender};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "giftrec-cli")]
#[command(about = "Gift recommendation command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one recommendation request and print the response JSON
    Recommend {
        /// Budget bucket label (e.g., "$50-99")
        #[arg(long)]
        budget: Option<String>,
        /// Interest tag; repeat for several (e.g., --interest "Home & Decor")
        #[arg(long = "interest")]
        interests: Vec<String>,
        /// Two-letter shipping country
        #[arg(long)]
        country: Option<String>,
        /// Caller language tag (e.g., pt-BR)
        #[arg(long)]
        language: Option<String>,
        #[arg(long, default_value = "1")]
        page: u32,
        /// Include the debug report
        #[arg(long)]
        debug: bool,
    },
    /// Query the upstream once and print a shape report of the raw response
    Probe {
        /// Keywords to search for
        #[arg(long, default_value = "gift present")]
        kw: String,
        /// Upstream target language
        #[arg(long, default_value = "en")]
        lang: String,
        #[arg(long, default_value = "1")]
        page: u32,
        /// Shipping country filter
        #[arg(long)]
        ship: Option<String>,
        /// Restrict to the 11..99 price window
        #[arg(long)]
        priced: bool,
    },
}

/// Request body equivalent to what the quiz front-end posts.
fn request_body(
    budget: Option<String>,
    interests: Vec<String>,
    country: Option<String>,
    language: Option<String>,
) -> serde_json::Value {
    let mut body = serde_json::Map::new();
    if let Some(budget) = budget {
        body.insert("budget_bucket".to_string(), budget.into());
    }
    if !interests.is_empty() {
        body.insert("interests".to_string(), interests.into());
    }
    if let Some(country) = country {
        body.insert("country".to_string(), country.into());
    }
    if let Some(language) = language {
        body.insert("language".to_string(), language.into());
    }
    serde_json::Value::Object(body)
}

fn load_catalog(config: &AppConfig) -> anyhow::Result<Catalog> {
    Ok(match &config.catalog_path {
        Some(path) => giftrec_core::load_catalog(path)?,
        None => Catalog::builtin(),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("giftrec-cli: use `recommend` or `probe` (see --help)");
        return Ok(());
    };

    let config = giftrec_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let client = AffiliateClient::from_config(&config)?;
    if !client.is_configured() {
        tracing::warn!("upstream credentials not set; upstream calls will fail");
    }

    let output = match command {
        Commands::Recommend {
            budget,
            interests,
            country,
            language,
            page,
            debug,
        } => {
            let catalog = load_catalog(&config)?;
            let body = request_body(budget, interests, country, language);
            let ctx = parse_request(&body, page, &catalog);
            let recommender =
                Recommender::new(client, catalog, RecommendSettings::from_config(&config));
            let response = recommender.recommend(&ctx, debug).await;
            serde_json::to_string_pretty(&response)?
        }
        Commands::Probe {
            kw,
            lang,
            page,
            ship,
            priced,
        } => {
            let request = ProbeRequest {
                keywords: kw,
                lang,
                page,
                ship: ship.map(|s| s.to_ascii_uppercase()),
                priced,
            };
            let report = giftrec_affiliate::probe(&client, &request).await?;
            serde_json::to_string_pretty(&report)?
        }
    };

    println!("{output}");
    Ok(())
}
