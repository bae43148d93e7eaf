use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::Context;

use usacloud_update::config;
use usacloud_update::output;
use usacloud_update::process;
use usacloud_update::scan::Scanner;
use usacloud_update::transform::Catalog;

use crate::ScanArgs;

/// Map an error to the exit-code contract: 2 when the chain contains an
/// I/O error, 1 for anything else.
pub fn or_exit(r: anyhow::Result<i32>) -> i32 {
    r.unwrap_or_else(|e| {
        eprintln!("[usacloud-update] error: {e:#}");
        if e.chain()
            .any(|cause| cause.downcast_ref::<std::io::Error>().is_some())
        {
            2
        } else {
            1
        }
    })
}

pub fn cmd_transform(
    input: &str,
    output: &str,
    show_stats: bool,
    verbose: bool,
) -> anyhow::Result<i32> {
    let catalog = Catalog::builtin()?;

    let reader: Box<dyn BufRead> = if input == "-" {
        Box::new(BufReader::new(std::io::stdin()))
    } else {
        let file = std::fs::File::open(input)
            .with_context(|| format!("cannot open input: {input}"))?;
        Box::new(BufReader::new(file))
    };

    let mut writer: Box<dyn Write> = if output == "-" {
        Box::new(BufWriter::new(std::io::stdout()))
    } else {
        let file = std::fs::File::create(output)
            .with_context(|| format!("cannot create output: {output}"))?;
        Box::new(BufWriter::new(file))
    };

    let stats = process::process_stream(&catalog, reader, &mut writer)?;
    writer.flush().context("flushing output")?;

    if verbose {
        eprintln!(
            "[usacloud-update] {} rewrite(s) across {} line(s)",
            stats.total_changes(),
            stats.changed_lines()
        );
    }
    if show_stats {
        eprint!("{}", stats.render(&catalog));
    }

    Ok(0)
}

pub fn cmd_scan(args: &ScanArgs, verbose: bool) -> anyhow::Result<i32> {
    let mut config = config::load_user_config().unwrap_or_default().scan;

    // CLI flags override the config file.
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(depth) = args.max_depth {
        config.max_depth = depth;
    }
    if let Some(confidence) = args.min_confidence {
        config.min_confidence = confidence;
    }
    if let Some(importance) = args.min_importance {
        config.min_importance = importance;
    }
    if args.only_high_priority {
        config.only_high_priority = true;
    }
    if !args.include.is_empty() {
        config.include = args.include.clone();
    }
    if !args.exclude.is_empty() {
        config.exclude = args.exclude.clone();
    }
    if let Some(sort) = args.sort {
        config.sort = sort;
    }
    if let Some(order) = args.order {
        config.order = order;
    }

    if verbose {
        eprintln!(
            "[usacloud-update] scanning {} (depth {}, workers {})",
            args.path, config.max_depth, config.workers
        );
    }

    let root = Path::new(&args.path);
    std::fs::metadata(root).with_context(|| format!("cannot access {}", args.path))?;

    let scanner = Scanner::new(config)?;
    let report = scanner.scan(root)?;

    for error in &report.errors {
        eprintln!(
            "[usacloud-update] error: {}: {}",
            error.path.display(),
            error.message
        );
    }

    if args.json {
        output::print_json(&report);
        return Ok(0);
    }

    for result in report.results.iter().filter(|r| r.is_script) {
        println!(
            "{:<8}  importance {:>6.1}  confidence {:.2}  {:>3} command(s)  {}",
            result.priority.label(),
            result.importance_score,
            result.confidence,
            result.command_count,
            result.path.display()
        );
    }
    println!(
        "scanned {} file(s), {} candidate(s) in {}ms",
        report.total_files, report.detected_files, report.duration_ms
    );

    Ok(0)
}

pub fn cmd_rules(json: bool) -> anyhow::Result<i32> {
    let catalog = Catalog::builtin()?;

    if json {
        output::print_json(&catalog.describe());
        return Ok(0);
    }

    for info in catalog.describe() {
        match info.doc_url {
            Some(url) => println!(
                "{:>2}  {:<28} {}  ({url})",
                info.order, info.name, info.explanation
            ),
            None => println!("{:>2}  {:<28} {}", info.order, info.name, info.explanation),
        }
    }

    Ok(0)
}
