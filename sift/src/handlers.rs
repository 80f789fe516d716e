use anyhow::{Context, bail};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use sift_core::config::RankingConfig;
use sift_core::model::Candidate;
use sift_core::rank::{RankProgressCallback, Ranker, crawl_candidate};
use sift_core::report::{ReportFormat, generate_report, save_report};
use sift_scanner::dump::format_tree;
use sift_scanner::{Fetch, HttpFetcher, KeywordScorer};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, warn};
use url::Url;

/// Install the stderr log subscriber. Warnings only unless `verbose`.
pub fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load candidates from a JSON array or a newline-delimited URL list
pub fn load_candidates_from_file(path: &Path) -> Result<Vec<Candidate>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read candidates file {}: {}", path.display(), e))?;

    let candidates = if content.trim_start().starts_with('[') {
        serde_json::from_str::<Vec<Candidate>>(&content)
            .map_err(|e| format!("Invalid candidates JSON in {}: {}", path.display(), e))?
    } else {
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| parse_url_line(line.trim()))
            .map(|url| Candidate::new(&url, "", ""))
            .collect()
    };

    if candidates.is_empty() {
        return Err(format!("No valid candidates found in {}", path.display()));
    }

    Ok(candidates)
}

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    if Url::parse(line).is_ok() {
        return Some(line.to_string());
    }

    let with_scheme = format!("http://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    warn!("Skipping invalid URL '{}'", line);
    None
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankOverrides {
    pub depth: Option<usize>,
    pub floor: Option<f64>,
    pub threads: Option<usize>,
    pub deadline_secs: Option<u64>,
}

impl RankOverrides {
    pub fn from_matches(args: &ArgMatches) -> Self {
        // `tree` defines only a subset of these flags
        let get_usize = |id: &str| args.try_get_one::<usize>(id).ok().flatten().copied();
        Self {
            depth: get_usize("depth"),
            floor: args.try_get_one::<f64>("floor").ok().flatten().copied(),
            threads: get_usize("threads"),
            deadline_secs: args.try_get_one::<u64>("deadline").ok().flatten().copied(),
        }
    }

    pub fn apply(&self, config: &mut RankingConfig) {
        if let Some(depth) = self.depth {
            config.max_depth = depth;
        }
        if let Some(floor) = self.floor {
            config.score_floor = floor;
        }
        if let Some(threads) = self.threads {
            config.concurrency = threads;
        }
        if let Some(deadline) = self.deadline_secs {
            config.deadline_secs = Some(deadline);
        }
    }
}

/// Read the config file (if any), apply overrides, and validate the result
pub fn load_ranking_config(
    path: Option<&PathBuf>,
    overrides: &RankOverrides,
) -> anyhow::Result<RankingConfig> {
    let mut config = match path {
        Some(path) => {
            let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
            RankingConfig::from_file(&expanded)
                .with_context(|| format!("Failed to load config {}", expanded))?
        }
        None => RankingConfig::default(),
    };
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

fn build_fetcher(config: &RankingConfig) -> anyhow::Result<Arc<dyn Fetch>> {
    let fetcher = HttpFetcher::with_config(&config.fetch).context("Failed to build HTTP client")?;
    Ok(Arc::new(fetcher))
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(message.to_string());
    spinner
}

pub async fn handle_rank(sub_matches: &ArgMatches, quiet: bool) -> anyhow::Result<()> {
    let keyword = sub_matches
        .get_one::<String>("keyword")
        .context("--keyword is required")?;
    let candidates_path = sub_matches
        .get_one::<PathBuf>("candidates")
        .context("--candidates is required")?;
    let format: ReportFormat = sub_matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("text")
        .parse()
        .map_err(anyhow::Error::msg)?;
    let output = sub_matches.get_one::<PathBuf>("output");
    let show_trees = sub_matches.get_flag("show-trees");
    if keyword.trim().is_empty() {
        bail!("Keyword must not be empty");
    }

    let config = load_ranking_config(
        sub_matches.get_one::<PathBuf>("config"),
        &RankOverrides::from_matches(sub_matches),
    )?;
    let candidates = load_candidates_from_file(candidates_path).map_err(anyhow::Error::msg)?;

    let mut ranker = Ranker::new(build_fetcher(&config)?, config);

    let progress = (!quiet).then(|| {
        spinner(&format!(
            "Ranking {} candidates for '{}'",
            candidates.len(),
            keyword
        ))
    });
    if let Some(ref pb) = progress {
        let pb = pb.clone();
        let callback: RankProgressCallback = Arc::new(move |msg: String| pb.set_message(msg));
        ranker = ranker.with_progress_callback(callback);
    }

    let scored = ranker.rank_scored(candidates, keyword).await;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    if show_trees {
        for candidate in &scored {
            println!("{}", format_tree(&candidate.tree));
        }
    }

    let results: Vec<_> = scored.iter().map(|s| s.to_result(keyword)).collect();
    let report = generate_report(format, keyword, &results)?;

    match output {
        Some(path) => {
            let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
            save_report(&report, Path::new(&expanded))
                .with_context(|| format!("Failed to write report to {}", expanded))?;
            if !quiet {
                println!(
                    "{} Report saved to {}",
                    "✓".green().bold(),
                    expanded.bright_white()
                );
            }
        }
        None => print!("{}", report),
    }

    Ok(())
}

pub async fn handle_tree(sub_matches: &ArgMatches, quiet: bool) -> anyhow::Result<()> {
    let url = sub_matches.get_one::<Url>("url").context("--url is required")?;
    let keyword = sub_matches
        .get_one::<String>("keyword")
        .context("--keyword is required")?;

    let config = load_ranking_config(
        sub_matches.get_one::<PathBuf>("config"),
        &RankOverrides::from_matches(sub_matches),
    )?;
    let fetcher = build_fetcher(&config)?;
    let scorer = Arc::new(KeywordScorer::new(config.scoring.clone()));
    let deadline = config
        .deadline()
        .map(|d| tokio::time::Instant::now() + d);

    let progress = (!quiet).then(|| spinner(&format!("Crawling {}", url)));
    let scored = crawl_candidate(
        Candidate::new(url.as_str(), "", ""),
        keyword,
        fetcher,
        scorer,
        &config,
        deadline,
    )
    .await;
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    let scored = scored?;

    println!("{}", format_tree(&scored.tree));
    if !quiet {
        println!(
            "{} {} pages, total {:.1}{}",
            "✓".green().bold(),
            scored.tree.root.len(),
            scored.total,
            if scored.authority {
                " (authority bonus applied)"
            } else {
                ""
            }
        );
    }
    Ok(())
}
