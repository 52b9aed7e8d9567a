// FILE: src/cli/handlers.rs
use crate::{
    cli::OutputFormat, lexer::Lexer, parser::parse_a_stylesheet, validate_file_with_options, Result,
    ValidationReport, ValidatorError, ValidatorOptions,
};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;

fn input_arg(matches: &clap::ArgMatches) -> Result<&String> {
    matches
        .get_one::<String>("input")
        .ok_or_else(|| ValidatorError::invalid_argument("missing input path"))
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ValidatorError::invalid_format(format!("JSON serialization error: {}", e)))
}

fn write_output(output_path: Option<&String>, content: String) -> Result<()> {
    if let Some(output_file) = output_path {
        fs::write(output_file, content)?;
        println!("✅ Output saved to {}", output_file);
    } else {
        println!("{}", content);
    }
    Ok(())
}

// --- CHECK ---
pub fn handle_check_command(cli: &super::EnhancedCli, matches: &clap::ArgMatches) -> Result<()> {
    let input_path = input_arg(matches)?;
    let options = cli.build_validator_options(matches)?;
    let format = matches.get_one::<OutputFormat>("format").unwrap_or(&OutputFormat::Text);
    let show_stats = matches.get_flag("stats");

    let files = if Path::new(input_path).is_dir() {
        collect_css_files(
            Path::new(input_path),
            matches.get_flag("recursive"),
            &cli.config.extensions(),
            &cli.config.exclude_patterns()?,
        )?
    } else {
        vec![PathBuf::from(input_path)]
    };

    if matches.get_flag("watch") {
        watch_and_check(input_path, &files, &options, format)
    } else {
        check_files(&files, &options, format, show_stats)
    }
}

/// Collects files with one of `extensions`, skipping paths matched by any
/// `exclude` pattern. The result is sorted for stable output.
pub(crate) fn collect_css_files(
    dir_path: &Path,
    recursive: bool,
    extensions: &[String],
    exclude: &[Regex],
) -> Result<Vec<PathBuf>> {
    let mut walker = walkdir::WalkDir::new(dir_path);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| ValidatorError::walk(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let matches_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)));
        if !matches_extension {
            continue;
        }
        let path_text = path.to_string_lossy();
        if exclude.iter().any(|pattern| pattern.is_match(&path_text)) {
            log::debug!("Skipping excluded file {}", path_text);
            continue;
        }
        files.push(path.to_path_buf());
    }
    files.sort();
    Ok(files)
}

#[derive(Serialize)]
struct FileReport<'a> {
    file: String,
    #[serde(flatten)]
    report: &'a ValidationReport,
}

fn check_files(
    files: &[PathBuf],
    options: &ValidatorOptions,
    format: &OutputFormat,
    show_stats: bool,
) -> Result<()> {
    let mut reports = Vec::new();
    for path in files {
        let report = validate_file_with_options(path, options)?;
        if let OutputFormat::Text = format {
            print_text_report(path, &report, show_stats);
        }
        reports.push((path.display().to_string(), report));
    }

    let failed = reports.iter().filter(|(_, report)| !report.is_valid()).count();

    match format {
        OutputFormat::Json => {
            let json_reports: Vec<FileReport> = reports
                .iter()
                .map(|(file, report)| FileReport {
                    file: file.clone(),
                    report,
                })
                .collect();
            println!("{}", to_json(&json_reports)?);
        }
        OutputFormat::Text if files.len() > 1 => {
            println!("\n📊 Check Summary:");
            println!("   Total files: {}", files.len());
            println!("   Files with errors: {}", failed);
            println!(
                "   Success rate: {:.1}%",
                (files.len() - failed) as f64 / files.len() as f64 * 100.0
            );
        }
        OutputFormat::Text => {}
    }

    if failed > 0 {
        Err(ValidatorError::ValidationFailed {
            failed,
            total: files.len(),
        })
    } else {
        Ok(())
    }
}

fn print_text_report(path: &Path, report: &ValidationReport, show_stats: bool) {
    if report.is_valid() {
        println!("✅ {} - No issues found", path.display());
    } else {
        println!("❌ {} - {} errors", path.display(), report.errors.len());
        for error in &report.errors {
            println!("   {}{}", path.display(), error);
        }
    }

    if show_stats {
        let stats = &report.stats;
        println!("   Size: {} bytes", stats.source_bytes);
        println!("   Tokens: {}", stats.token_count);
        println!("   Rules: {}", stats.rule_count);
        println!("   Declarations: {}", stats.declaration_count);
        println!("   URLs: {}", report.urls.len());
        println!("   !important: {}", report.important_declarations);
        println!("   Time: {}ms", stats.validation_time_ms);
    }
}

fn watch_and_check(
    input_path: &str,
    files: &[PathBuf],
    options: &ValidatorOptions,
    format: &OutputFormat,
) -> Result<()> {
    println!("👀 Watching {} for changes...", input_path);

    let (tx, rx) = channel();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            if let Ok(event) = res {
                if let Err(e) = tx.send(event) {
                    eprintln!("Watch error: {}", e);
                }
            }
        },
        notify::Config::default(),
    )
    .map_err(|e| ValidatorError::watch(format!("Failed to create file watcher: {}", e)))?;

    let mode = if Path::new(input_path).is_dir() {
        RecursiveMode::Recursive
    } else {
        RecursiveMode::NonRecursive
    };
    watcher
        .watch(Path::new(input_path), mode)
        .map_err(|e| ValidatorError::watch(format!("Failed to watch {}: {}", input_path, e)))?;

    if let Err(e) = check_files(files, options, format, false) {
        eprintln!("❌ {}", e);
    }

    loop {
        match rx.recv() {
            Ok(event) => {
                log::debug!("Change event for {:?}", event.paths);
                println!("🔄 File changed, revalidating...");
                if let Err(e) = check_files(files, options, format, false) {
                    eprintln!("❌ {}", e);
                }
            }
            Err(e) => {
                eprintln!("Watch error: {}", e);
                break;
            }
        }
    }

    Ok(())
}

// --- TOKENIZE ---
#[derive(Serialize)]
struct TokenizeOutput<'a> {
    tokens: &'a [crate::Token],
    errors: &'a [crate::ErrorToken],
}

pub fn handle_tokenize_command(cli: &super::EnhancedCli, matches: &clap::ArgMatches) -> Result<()> {
    let input_path = input_arg(matches)?;
    let options = cli.build_validator_options(matches)?;
    let source = read_source(input_path)?;

    let mut errors = Vec::new();
    let tokens = Lexer::new(&source)
        .with_start(options.start_line, options.start_col)
        .tokenize(&mut errors);
    log::info!("🔬 {} tokens in {}", tokens.len(), input_path);

    let json = to_json(&TokenizeOutput {
        tokens: &tokens,
        errors: &errors,
    })?;
    write_output(matches.get_one::<String>("output"), json)
}

// --- PARSE ---
#[derive(Serialize)]
struct ParseOutput<'a> {
    stylesheet: &'a crate::Stylesheet,
    errors: &'a [crate::ErrorToken],
}

pub fn handle_parse_command(cli: &super::EnhancedCli, matches: &clap::ArgMatches) -> Result<()> {
    let input_path = input_arg(matches)?;
    let options = cli.build_validator_options(matches)?;
    let source = read_source(input_path)?;

    let mut errors = Vec::new();
    let tokens = Lexer::new(&source)
        .with_start(options.start_line, options.start_col)
        .tokenize(&mut errors);
    let stylesheet = parse_a_stylesheet(&tokens, &options.at_rule_spec, options.default_block_type, &mut errors);
    log::info!("🔬 {} rules in {}", stylesheet.rules.len(), input_path);

    let json = to_json(&ParseOutput {
        stylesheet: &stylesheet,
        errors: &errors,
    })?;
    write_output(matches.get_one::<String>("output"), json)
}

fn read_source(input_path: &str) -> Result<String> {
    fs::read_to_string(input_path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ValidatorError::file_not_found(input_path),
        _ => ValidatorError::Io(e),
    })
}
