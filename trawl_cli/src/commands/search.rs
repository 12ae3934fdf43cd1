use crate::cli::{Cli, OutputFormat, SearchArgs};
use crate::commands::{settings_store, CommandError, Result};
use crate::output::{csv, format_output, problem_line, status_line, OutputData, SearchReport};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::{OwoColorize, Stream::Stdout};
use std::path::PathBuf;
use tracing::info;
use trawl_core::{AggregationRun, Aggregator, Link, RunCache, SearchSettings, SourceRegistry};

/// Unique-link count above which an empty reliable list suggests a lower threshold.
const LOW_THRESHOLD_HINT_MIN_UNIQUE: usize = 20;

pub async fn run(cli: &Cli, args: &SearchArgs) -> Result<()> {
    let username = args.username.trim();
    if username.is_empty() {
        return Err(CommandError::InvalidInput(
            "Missing username. Usage: trawl search <username>".to_string(),
        ));
    }

    let mut settings = settings_store(cli).load()?;
    args.apply(&mut settings);

    let pretty = cli.output == OutputFormat::Pretty;
    if pretty && username.contains(' ') {
        print_name_warning(settings.url_filter);
    }

    let registry = SourceRegistry::builtin();
    let mut aggregator = Aggregator::new(&registry);
    if args.debug {
        let dir = settings
            .cache_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        aggregator = aggregator.with_cache(RunCache::new(dir));
    }

    let spinner = ProgressBar::new_spinner();
    if pretty {
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .expect("Invalid progress template"),
        );
        spinner.set_message(format!("Searching for '{}'...", username));
        spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    } else {
        spinner.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }

    let result = aggregator.run(username, &settings).await;
    spinner.finish_and_clear();
    let run = result?;

    info!(
        username = %run.username,
        unique = run.unique_links.len(),
        errors = run.errors.len(),
        "search finished"
    );

    // The raw dump comes first so it also precedes --list output.
    if dumps_raw_links(args, pretty) {
        print!("{}", raw_links_dump(&run));
    }

    if args.list {
        let urls = run
            .unique_links
            .iter()
            .map(|l| l.url().to_string())
            .collect();
        format_output(&OutputData::UrlList(urls), &cli.output)?;
    } else if pretty {
        print_pretty(&run, &settings, cli.verbose > 0);
    } else {
        let report = SearchReport::from_run(&run, settings.threshold);
        format_output(&OutputData::SearchReport(Box::new(report)), &cli.output)?;
    }

    if let Some(path) = &args.csv {
        csv::write_csv_file(path, &run, settings.threshold)?;
        if pretty {
            println!(
                "{}",
                format!("Results saved to CSV file {}", path.display())
                    .if_supports_color(Stdout, |t| t.green())
            );
        }
    }

    Ok(())
}

fn print_name_warning(url_filter: bool) {
    println!(
        "{}",
        "Warning: search by first name + last name is not fully supported at the moment!"
            .if_supports_color(Stdout, |t| t.red())
    );
    if url_filter {
        println!(
            "{}",
            "Try to use the --no-url-filter option.".if_supports_color(Stdout, |t| t.red())
        );
    }
    println!();
}

fn dumps_raw_links(args: &SearchArgs, pretty: bool) -> bool {
    pretty && args.debug
}

fn raw_links_dump(run: &AggregationRun) -> String {
    run.all_links
        .iter()
        .map(|link| format!("{}\n{}\n\n", link.url(), link.title()))
        .collect()
}

fn link_line(link: &Link, verbose: bool) -> String {
    if verbose {
        format!(
            "{} {} {}",
            format!("[{}]", link.junk_score()).if_supports_color(Stdout, |t| t.magenta()),
            format!("[{}]", link.source()).if_supports_color(Stdout, |t| t.green()),
            link.url()
        )
    } else {
        link.url().to_string()
    }
}

/// Reliable links, then documents, then the status line with problems and hints.
fn print_pretty(run: &AggregationRun, settings: &SearchSettings, verbose: bool) {
    let threshold = settings.threshold;

    for link in run.reliable_links(threshold) {
        println!(
            "{} {}",
            "URL:".if_supports_color(Stdout, |t| t.cyan()),
            link_line(link, verbose)
        );
        println!(
            "{} {}",
            "Title:".if_supports_color(Stdout, |t| t.cyan()),
            link.title()
        );
        println!();
    }

    let documents = run.documents();
    if !documents.is_empty() {
        println!(
            "{}",
            "PDF files (without junk filtering)".if_supports_color(Stdout, |t| t.cyan())
        );
        for link in &documents {
            println!("{}\n{}", link_line(link, verbose), link.title());
            println!();
        }
    }

    let summary = run.summary(threshold);
    println!(
        "{}",
        status_line(&summary).if_supports_color(Stdout, |t| t.cyan())
    );

    for failure in &run.errors {
        println!(
            "{}",
            problem_line(failure).if_supports_color(Stdout, |t| t.yellow())
        );
    }
    for warning in &run.warnings {
        println!(
            "{}",
            format!("Warning: {}", warning).if_supports_color(Stdout, |t| t.yellow())
        );
    }

    if summary.reliable == 0 && summary.unique > LOW_THRESHOLD_HINT_MIN_UNIQUE {
        println!();
        for line in [
            format!(
                "No reliable links filtered, although there are more than {} unique links.",
                LOW_THRESHOLD_HINT_MIN_UNIQUE
            ),
            format!(
                "Try to decrease threshold with -t option ({} at the moment).",
                threshold
            ),
            format!(
                "Junk scores: median {:.1} / average {:.1}",
                summary.median_junk_score, summary.average_junk_score
            ),
        ] {
            println!("{}", line.if_supports_color(Stdout, |t| t.red()));
        }
    }

    println!();
    println!(
        "{}",
        format!("Completed in {}ms", run.duration_ms).if_supports_color(Stdout, |t| t.dimmed())
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_dump_is_not_skipped_by_list() {
        let args = SearchArgs {
            username: "john".into(),
            debug: true,
            list: true,
            ..Default::default()
        };
        assert!(dumps_raw_links(&args, true));
        assert!(!dumps_raw_links(&args, false));

        let quiet = SearchArgs {
            debug: false,
            ..args
        };
        assert!(!dumps_raw_links(&quiet, true));
    }

    #[test]
    fn test_raw_links_dump_lists_every_link() {
        let mut run = AggregationRun::new("john");
        run.all_links = vec![
            Link::new("https://github.com/john", "GitHub", "john", "google"),
            Link::new("https://github.com/john", "GitHub again", "john", "bing"),
        ];
        assert_eq!(
            raw_links_dump(&run),
            "https://github.com/john\nGitHub\n\nhttps://github.com/john\nGitHub again\n\n"
        );
    }
}
