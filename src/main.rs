use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use notesift::analytics::{network, tfidf, tokenizer, topics};
use notesift::collector::Collector;
use notesift::config::{
    CoherenceMeasure, CollageConfig, CollectorConfig, DownloadConfig, NetworkGraphConfig, NormalizerConfig,
    TfidfConfig, TokenizerConfig, TopicConfig,
};
use notesift::engine::browser::BrowserSession;
use notesift::media::{collage, downloader};
use notesift::network::IdentityProfile;
use notesift::ops::{init_tracing_with, LogFormat, StageTimer};
use notesift::refinery;

/// Note collection and analytics pipeline
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log output: json or pretty
    #[arg(long, global = true, default_value = "json")]
    log_format: LogFormat,

    /// Fallback log level when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search keywords in a browser and extract note details
    Collect(CollectArgs),
    /// Parse ids, counters and dates; drop domestic posts; dedup by id
    Normalize(NormalizeArgs),
    /// Segment text into tokens and drop stop-words
    Tokenize(TokenizeArgs),
    /// Rank terms by TF-IDF and draw a word cloud
    Tfidf(TfidfArgs),
    /// Sweep LDA topic counts and export per-K artifacts
    Topics(TopicArgs),
    /// Build the word co-occurrence network
    Network(NetworkArgs),
    /// Download every note image
    DownloadImages(DownloadArgs),
    /// Compose downloaded images into a grid
    Collage(CollageArgs),
}

#[derive(Args, Debug)]
struct CollectArgs {
    /// Search keyword, repeatable
    #[arg(short, long = "keyword")]
    keywords: Vec<String>,
    #[arg(long)]
    max_notes: Option<usize>,
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long)]
    csv_dir: Option<PathBuf>,
    /// Chromium profile directory, keeps the login between runs
    #[arg(long)]
    user_data_dir: Option<PathBuf>,
    #[arg(long)]
    headless: bool,
    /// Skip the manual login prompt
    #[arg(long)]
    no_login: bool,
}

#[derive(Args, Debug)]
struct NormalizeArgs {
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long)]
    output: Option<PathBuf>,
    /// Date that relative times are resolved against (YYYY-MM-DD), default today
    #[arg(long)]
    reference_date: Option<NaiveDate>,
}

#[derive(Args, Debug)]
struct TokenizeArgs {
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long)]
    cn_stopwords: Option<PathBuf>,
    #[arg(long)]
    en_stopwords: Option<PathBuf>,
    #[arg(long)]
    user_dict: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TfidfArgs {
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long)]
    image: Option<PathBuf>,
    #[arg(long)]
    stopwords: Option<PathBuf>,
    #[arg(long)]
    max_features: Option<usize>,
    /// TrueType/OpenType font for the word cloud; without it no image is drawn
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TopicArgs {
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long)]
    output_dir: Option<PathBuf>,
    #[arg(long)]
    min_topics: Option<usize>,
    #[arg(long)]
    max_topics: Option<usize>,
    #[arg(long)]
    iterations: Option<usize>,
    #[arg(long)]
    min_df: Option<usize>,
    #[arg(long)]
    max_df: Option<f64>,
    #[arg(long)]
    seed: Option<u64>,
    /// Coherence measure: c_v or u_mass
    #[arg(long)]
    coherence: Option<CoherenceMeasure>,
    /// Sliding window for c_v, in tokens
    #[arg(long)]
    coherence_window: Option<usize>,
    /// Font for the sweep chart labels
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct NetworkArgs {
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long)]
    nodes: Option<PathBuf>,
    #[arg(long)]
    edges: Option<PathBuf>,
    #[arg(long)]
    window: Option<usize>,
}

#[derive(Args, Debug)]
struct DownloadArgs {
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long)]
    output_dir: Option<PathBuf>,
    #[arg(long)]
    requests_per_second: Option<u32>,
    #[arg(long)]
    concurrency: Option<usize>,
    /// Proxy URL for image requests
    #[arg(long)]
    proxy: Option<String>,
}

#[derive(Args, Debug)]
struct CollageArgs {
    #[arg(long)]
    image_dir: Option<PathBuf>,
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long)]
    rows: Option<u32>,
    #[arg(long)]
    cols: Option<u32>,
    #[arg(long)]
    max_width: Option<u32>,
    #[arg(long)]
    seed: Option<u64>,
}

// * Overwrites `target` only when the flag was given
fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *target = v;
    }
}

async fn collect(args: CollectArgs) -> Result<()> {
    let mut config = CollectorConfig::default();
    if !args.keywords.is_empty() {
        config.keywords = args.keywords;
    }
    set(&mut config.max_notes, args.max_notes);
    set(&mut config.jsonl_output, args.output);
    set(&mut config.csv_dir, args.csv_dir);
    config.user_data_dir = args.user_data_dir;
    config.headless = args.headless;
    config.login_prompt = !args.no_login;

    let identity = IdentityProfile::desktop_chrome(&config.site_root);
    let session = BrowserSession::launch(&config, &identity)
        .await
        .context("launching browser")?;

    let login_prompt = config.login_prompt;
    let mut collector = Collector::new(session, config);
    if login_prompt {
        collector.login().await.context("manual login")?;
    }
    let outcome = collector.run().await;

    let mut session = collector.into_driver();
    session.shutdown().await;

    let summary = outcome.context("collecting notes")?;
    info!(
        keywords = summary.keywords.len(),
        details = summary.details_collected,
        "Collect stage done"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing_with(cli.log_format, &cli.log_level);

    match cli.command {
        Command::Collect(args) => {
            let _timer = StageTimer::start("collect");
            collect(args).await?;
        }
        Command::Normalize(args) => {
            let _timer = StageTimer::start("normalize");
            let mut config = NormalizerConfig::default();
            set(&mut config.input, args.input);
            set(&mut config.output, args.output);
            set(&mut config.reference_date, args.reference_date);
            refinery::run(&config)
                .with_context(|| format!("normalizing {}", config.input.display()))?;
        }
        Command::Tokenize(args) => {
            let _timer = StageTimer::start("tokenize");
            let mut config = TokenizerConfig::default();
            set(&mut config.input, args.input);
            set(&mut config.output, args.output);
            if args.cn_stopwords.is_some() {
                config.cn_stopwords = args.cn_stopwords;
            }
            if args.en_stopwords.is_some() {
                config.en_stopwords = args.en_stopwords;
            }
            config.user_dict = args.user_dict;
            tokenizer::run(&config)
                .with_context(|| format!("tokenizing {}", config.input.display()))?;
        }
        Command::Tfidf(args) => {
            let _timer = StageTimer::start("tfidf");
            let mut config = TfidfConfig::default();
            set(&mut config.input, args.input);
            set(&mut config.output_json, args.output);
            set(&mut config.output_image, args.image);
            set(&mut config.max_features, args.max_features);
            config.stopwords = args.stopwords;
            config.font = args.font;
            tfidf::run(&config)
                .with_context(|| format!("ranking terms of {}", config.input.display()))?;
        }
        Command::Topics(args) => {
            let _timer = StageTimer::start("topics");
            let mut config = TopicConfig::default();
            set(&mut config.input, args.input);
            set(&mut config.output_dir, args.output_dir);
            set(&mut config.min_topics, args.min_topics);
            set(&mut config.max_topics, args.max_topics);
            set(&mut config.iterations, args.iterations);
            set(&mut config.min_df, args.min_df);
            set(&mut config.max_df, args.max_df);
            set(&mut config.seed, args.seed);
            set(&mut config.coherence, args.coherence);
            set(&mut config.coherence_window, args.coherence_window);
            config.font = args.font;
            topics::run(&config)
                .with_context(|| format!("topic sweep over {}", config.input.display()))?;
        }
        Command::Network(args) => {
            let _timer = StageTimer::start("network");
            let mut config = NetworkGraphConfig::default();
            set(&mut config.input, args.input);
            set(&mut config.nodes_csv, args.nodes);
            set(&mut config.edges_csv, args.edges);
            set(&mut config.window, args.window);
            network::run(&config)
                .with_context(|| format!("co-occurrence network of {}", config.input.display()))?;
        }
        Command::DownloadImages(args) => {
            let _timer = StageTimer::start("download-images");
            let mut config = DownloadConfig::default();
            set(&mut config.input, args.input);
            set(&mut config.output_dir, args.output_dir);
            set(&mut config.requests_per_second, args.requests_per_second);
            set(&mut config.concurrency, args.concurrency);
            config.http.proxy = args.proxy;
            downloader::run(&config)
                .await
                .with_context(|| format!("downloading images from {}", config.input.display()))?;
        }
        Command::Collage(args) => {
            let _timer = StageTimer::start("collage");
            let mut config = CollageConfig::default();
            set(&mut config.image_dir, args.image_dir);
            set(&mut config.output, args.output);
            set(&mut config.rows, args.rows);
            set(&mut config.cols, args.cols);
            set(&mut config.max_width, args.max_width);
            config.seed = args.seed;
            collage::compose(&config)
                .with_context(|| format!("composing collage from {}", config.image_dir.display()))?;
        }
    }

    Ok(())
}
