//! CLI command definitions and handlers

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::cache::build_cache;
use crate::core::config::{CacheKind, ServiceKind, TranslatorConfig};
use crate::io::{CsvSheetReader, CsvSheetWriter, RowReader, RowWriter};
use crate::pipeline::{report::write_report, Pipeline};
use crate::services::create_service;

/// Translate a spreadsheet-exported text column between languages
#[derive(Parser, Debug)]
#[command(name = "sheet-translator", version, about, long_about = None)]
pub struct Args {
    /// Translation service backend
    #[arg(long, value_enum, default_value_t = ServiceKind::GoogleFree)]
    pub service: ServiceKind,

    /// Source language column (e.g. en-US)
    #[arg(short, long, default_value = "en-US")]
    pub source: String,

    /// Target language column (default: de-DE)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Deprecated alias for --target
    #[arg(long, hide = true)]
    pub dest: Option<String>,

    /// Input sheet file, or a directory holding one CSV per sheet
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Output file (default: <input>_translated.<ext>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Sheet name inside the workbook
    #[arg(long, default_value = "User Texts")]
    pub sheet: String,

    /// Rows per translation chunk
    #[arg(long, default_value_t = 100)]
    pub chunk_size: usize,

    /// Maximum chunks translated concurrently
    #[arg(long, default_value_t = 10)]
    pub max_concurrent: usize,

    /// Maximum provider requests per second
    #[arg(long, default_value_t = 10.0)]
    pub max_rps: f64,

    /// Fixed delay before each provider request (milliseconds)
    #[arg(long, default_value_t = 100)]
    pub request_delay: u64,

    /// Attempts per request or chunk before giving up
    #[arg(long, default_value_t = 3)]
    pub max_retries: u32,

    /// HTTP request timeout (milliseconds)
    #[arg(long, default_value_t = 30000)]
    pub timeout: u64,

    /// Abort the whole run on the first unrecovered error
    #[arg(long)]
    pub fail_fast: bool,

    /// Treat cells starting with '=' as blank
    #[arg(long)]
    pub skip_formulas: bool,

    /// Re-wrap translations to roughly match source line widths
    #[arg(long)]
    pub preserve_line_lengths: bool,

    /// Width tolerance for line wrapping (1.2 = 20% over source)
    #[arg(long, default_value_t = 1.2)]
    pub line_length_tolerance: f64,

    /// Cache backend
    #[arg(long, value_enum, default_value_t = CacheKind::Hybrid)]
    pub cache_type: CacheKind,

    /// Cache entry lifetime in hours
    #[arg(long, default_value_t = 168)]
    pub cache_ttl: i64,

    /// Persistent cache directory
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Print cache hit/miss statistics after the run
    #[arg(long)]
    pub cache_stats: bool,

    /// Clear the cache before doing anything else
    #[arg(long)]
    pub clear_cache: bool,

    /// Write a per-row report (.json or .csv)
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Fold CLI arguments into a validated run configuration
    fn into_config(self) -> anyhow::Result<(TranslatorConfig, Option<PathBuf>)> {
        let defaults = TranslatorConfig::default();
        let target = match (self.dest, self.target) {
            (Some(dest), Some(target)) if dest != target => {
                anyhow::bail!("Specify only one of --dest or --target");
            }
            (Some(dest), _) => {
                warn!("--dest is deprecated, use --target instead");
                dest
            }
            (None, Some(target)) => target,
            (None, None) => defaults.target_lang,
        };
        let input_file = self.file.clone();
        let output_file = match (&self.output, &input_file) {
            (Some(output), _) => output.clone(),
            (None, Some(input)) => TranslatorConfig::derived_output_file(input),
            (None, None) => defaults.output_file,
        };

        let config = TranslatorConfig {
            service: self.service,
            source_lang: self.source,
            target_lang: target,
            input_file: input_file.clone().unwrap_or(defaults.input_file),
            output_file,
            sheet_name: self.sheet,
            chunk_size: self.chunk_size,
            max_concurrent: self.max_concurrent,
            max_rps: self.max_rps,
            request_delay_ms: self.request_delay,
            max_retries: self.max_retries,
            timeout_ms: self.timeout,
            fail_fast: self.fail_fast,
            skip_formulas: self.skip_formulas,
            preserve_line_lengths: self.preserve_line_lengths,
            line_length_tolerance: self.line_length_tolerance,
            cache_kind: self.cache_type,
            cache_ttl_hours: self.cache_ttl,
            cache_max_memory_size: defaults.cache_max_memory_size,
            cache_dir: self.cache_dir.unwrap_or(defaults.cache_dir),
            report_path: self.report,
        };
        config.validate()?;

        Ok((config, input_file))
    }
}

/// Run a translation (or a cache maintenance action) from CLI arguments
pub async fn run(args: Args) -> anyhow::Result<()> {
    let cache_stats = args.cache_stats;
    let clear_cache = args.clear_cache;
    let (config, input_file) = args.into_config()?;

    let cache = build_cache(&config)?;

    if clear_cache {
        match &cache {
            Some(cache) => {
                cache.clear();
                println!("🧹 Cache cleared");
            }
            None => println!("Caching is disabled, nothing to clear"),
        }
    }

    let Some(input_file) = input_file else {
        if clear_cache || cache_stats {
            print_cache_stats(cache_stats, &cache);
            return Ok(());
        }
        anyhow::bail!("No input file given, use --file");
    };

    let start_time = Instant::now();
    let config = Arc::new(config);

    info!("Input: {}", input_file.display());
    info!("Output: {}", config.output_file.display());
    info!("Service: {}", config.service);
    info!(
        "Languages: {} -> {}",
        config.source_lang, config.target_lang
    );

    let service = create_service(&config)?;
    let reader = CsvSheetReader::new(config.source_lang.as_str(), config.skip_formulas);
    let rows = reader.read_rows(&input_file, &config.sheet_name)?;

    if rows.is_empty() {
        anyhow::bail!("No data rows found in sheet '{}'", config.sheet_name);
    }

    let pipeline = Pipeline::new(Arc::clone(&config), service, cache.clone());

    let pb = ProgressBar::new(pipeline.chunk_count(rows.len()) as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap()
            .progress_chars("=>-"),
    );
    pb.set_message("Translating chunks");

    let pipeline = pipeline.with_progress(pb.clone());
    let results = pipeline.run(rows).await?;
    pb.finish_with_message("Completed");

    let writer = CsvSheetWriter::new(config.target_lang.as_str());
    writer.write(&input_file, &config.sheet_name, &results, &config.output_file)?;

    if let Some(report_path) = &config.report_path {
        if let Err(e) = write_report(&results, report_path) {
            if config.fail_fast {
                return Err(e.into());
            }
            error!("Failed to write report: {}", e);
        }
    }

    let summary = crate::core::models::RunSummary::from_results(&results);
    let duration = start_time.elapsed();
    info!(
        "Completed: {} translated, {} skipped, {} failed in {:?}",
        summary.translated, summary.skipped, summary.failed, duration
    );

    println!("\n✅ Translation completed!");
    println!("   Translated: {}", summary.translated);
    println!("   Skipped: {}", summary.skipped);
    println!("   Failed: {}", summary.failed);
    println!("   Output: {}", config.output_file.display());
    println!("   Time: {:?}", duration);

    print_cache_stats(cache_stats, &cache);

    if summary.failed > 0 {
        anyhow::bail!("{} rows failed to translate", summary.failed);
    }

    Ok(())
}

fn print_cache_stats(
    enabled: bool,
    cache: &Option<Arc<dyn crate::cache::TranslationCache>>,
) {
    if !enabled {
        return;
    }
    match cache {
        Some(cache) => {
            let stats = cache.stats();
            println!("\n📊 Cache statistics:");
            println!("   Entries: {}", stats.size);
            println!("   Hits: {}", stats.hits);
            println!("   Misses: {}", stats.misses);
            println!("   Hit rate: {:.1}%", stats.hit_rate());
        }
        None => println!("\nCaching is disabled, no statistics available"),
    }
}
