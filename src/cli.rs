// Command-line interface for polymux.
//
// Explicit subcommands with long-form options: `assemble` builds a polyglot
// from a media file and an analysis, `patch-pdf`/`patch-zip` apply a single
// offset patcher to a standalone file, `inspect` lists the structures a
// buffer exposes, and `config` prints build constants.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::analysis::{AnalysisResult, Analyzer, JsonFileAnalyzer, Sentiment};
use crate::assemble::{AssembleOptions, REPORT_ENTRY, SUMMARY_ENTRY, TRANSCRIPT_ENTRY};
use crate::io::{self, FileOptions, MediaLimits};
use crate::outcome::{PatchOutcome, Patched};
use crate::pdf::{self, render};
use crate::zip::{self, Method};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const BUF_SIZE: usize = 64 * 1024;

/// Exit code when a patch command leaves its input unpatched.
const EXIT_SKIPPED: i32 = 2;

// ---------------------------------------------------------------------------
// Byte size parsing (supports K, M, G suffixes)
// ---------------------------------------------------------------------------

fn parse_byte_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty size string".into());
    }
    let (num_part, multiplier) = match s.as_bytes().last() {
        Some(b'k' | b'K') => (&s[..s.len() - 1], 1024u64),
        Some(b'm' | b'M') => (&s[..s.len() - 1], 1024 * 1024),
        Some(b'g' | b'G') => (&s[..s.len() - 1], 1024 * 1024 * 1024),
        _ => (s, 1u64),
    };
    let num: u64 = num_part
        .trim()
        .parse()
        .map_err(|e| format!("invalid size '{s}': {e}"))?;
    num.checked_mul(multiplier)
        .ok_or_else(|| format!("size overflow: '{s}'"))
}

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Media + PDF + ZIP polyglot assembler.
#[derive(Parser, Debug)]
#[command(
    name = "polymux",
    version,
    about = "Build media files that are also valid PDF and ZIP files",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Append a report PDF and a ZIP bundle to a media file.
    Assemble(AssembleArgs),
    /// Shift the xref offsets of a standalone PDF.
    PatchPdf(PatchArgs),
    /// Shift the central directory offsets of a standalone ZIP.
    PatchZip(PatchArgs),
    /// List the PDF xref table and ZIP directory found in a file.
    Inspect(InspectArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Args, Debug)]
struct AssembleArgs {
    /// Media file to lead the output.
    #[arg(value_hint = ValueHint::FilePath)]
    media: PathBuf,

    /// Output file (default: `<stem>_universal.<ext>` next to the media).
    #[arg(value_hint = ValueHint::FilePath)]
    output_pos: Option<PathBuf>,

    /// Output file.
    #[arg(long, short = 'o', value_hint = ValueHint::FilePath, conflicts_with = "output_pos")]
    output: Option<PathBuf>,

    /// Analysis JSON (`transcript`, `summary`, `keyPoints`, `sentiment`).
    #[arg(long, short = 'a', value_hint = ValueHint::FilePath, conflicts_with_all = ["summary", "transcript"])]
    analysis: Option<PathBuf>,

    /// Plain-text summary file.
    #[arg(long, value_hint = ValueHint::FilePath, required_unless_present = "analysis")]
    summary: Option<PathBuf>,

    /// Plain-text transcript file.
    #[arg(long, value_hint = ValueHint::FilePath, required_unless_present = "analysis")]
    transcript: Option<PathBuf>,

    #[command(flatten)]
    tuning: AssembleTuningArgs,
}

#[derive(Args, Debug)]
struct AssembleTuningArgs {
    /// Media mime type (default: guessed from the extension).
    #[arg(long)]
    mime: Option<String>,

    /// Largest accepted media file (supports K/M/G suffix).
    #[arg(long = "max-size", value_parser = parse_byte_size, default_value_t = io::DEFAULT_MAX_MEDIA_SIZE)]
    max_size: u64,

    /// Accept media whose mime type is not `video/*`.
    #[arg(long = "allow-non-video")]
    allow_non_video: bool,

    /// Deflate archive entries instead of storing them.
    #[arg(long)]
    deflate: bool,

    /// Report title.
    #[arg(long, default_value = render::DEFAULT_TITLE)]
    title: String,

    /// Transcript characters kept in the report (0 keeps everything).
    #[arg(long = "transcript-limit", default_value_t = render::DEFAULT_TRANSCRIPT_LIMIT)]
    transcript_limit: usize,

    /// Omit dates so identical inputs give identical output.
    #[arg(long)]
    reproducible: bool,
}

#[derive(Args, Debug)]
struct PatchArgs {
    /// Input file.
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Output file.
    #[arg(value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Number of bytes that will precede the file.
    #[arg(long, short = 'b')]
    base: u64,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// File to inspect.
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,
}

// ---------------------------------------------------------------------------
// Resolved command + options (flattened from Cli)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Assemble,
    PatchPdf,
    PatchZip,
    Inspect,
    Config,
}

#[derive(Debug)]
struct Options {
    command: Command,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    input_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
    analysis_file: Option<PathBuf>,
    summary_file: Option<PathBuf>,
    transcript_file: Option<PathBuf>,
    mime_type: Option<String>,
    limits: MediaLimits,
    assemble: AssembleOptions,
    base: u64,
}

impl Options {
    fn new(command: Command, cli: &Cli) -> Self {
        Self {
            command,
            force: cli.force,
            quiet: cli.quiet,
            verbose: cli.verbose.min(2),
            json_output: cli.json_output,
            input_file: None,
            output_file: None,
            analysis_file: None,
            summary_file: None,
            transcript_file: None,
            mime_type: None,
            limits: MediaLimits::default(),
            assemble: AssembleOptions::default(),
            base: 0,
        }
    }
}

fn resolve_options(cli: Cli) -> Options {
    match &cli.command {
        Cmd::Assemble(args) => {
            let tuning = &args.tuning;
            Options {
                input_file: Some(args.media.clone()),
                output_file: args.output.clone().or_else(|| args.output_pos.clone()),
                analysis_file: args.analysis.clone(),
                summary_file: args.summary.clone(),
                transcript_file: args.transcript.clone(),
                mime_type: tuning.mime.clone(),
                limits: MediaLimits {
                    max_size: tuning.max_size,
                    require_video: !tuning.allow_non_video,
                },
                assemble: AssembleOptions {
                    title: tuning.title.clone(),
                    transcript_limit: (tuning.transcript_limit > 0).then_some(tuning.transcript_limit),
                    method: if tuning.deflate {
                        Method::Deflated
                    } else {
                        Method::Stored
                    },
                    timestamp: !tuning.reproducible,
                },
                ..Options::new(Command::Assemble, &cli)
            }
        }
        Cmd::PatchPdf(args) | Cmd::PatchZip(args) => {
            let command = if matches!(cli.command, Cmd::PatchPdf(_)) {
                Command::PatchPdf
            } else {
                Command::PatchZip
            };
            Options {
                input_file: Some(args.input.clone()),
                output_file: Some(args.output.clone()),
                base: args.base,
                ..Options::new(command, &cli)
            }
        }
        Cmd::Inspect(args) => Options {
            input_file: Some(args.input.clone()),
            ..Options::new(Command::Inspect, &cli)
        },
        Cmd::Config => Options::new(Command::Config, &cli),
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("polymux".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn read_input(path: &Path, what: &str) -> Result<Vec<u8>, i32> {
    std::fs::read(path).map_err(|e| {
        eprintln!("polymux: {what}: {}: {e}", path.display());
        1
    })
}

fn read_text(path: &Path, what: &str) -> Result<String, i32> {
    std::fs::read_to_string(path).map_err(|e| {
        eprintln!("polymux: {what}: {}: {e}", path.display());
        1
    })
}

fn check_overwrite(path: &Path, force: bool) -> Result<(), i32> {
    if path.exists() && !force {
        eprintln!(
            "polymux: output file exists, use -f to overwrite: {}",
            path.display()
        );
        return Err(1);
    }
    Ok(())
}

fn write_output(path: &Path, bytes: &[u8], force: bool) -> Result<(), i32> {
    check_overwrite(path, force)?;
    let result = File::create(path).and_then(|f| {
        let mut writer = BufWriter::with_capacity(BUF_SIZE, f);
        writer.write_all(bytes)?;
        writer.flush()
    });
    result.map_err(|e| {
        eprintln!("polymux: output file: {}: {e}", path.display());
        1
    })
}

fn print_json(json: &serde_json::Value) {
    eprintln!("{json:#}");
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("polymux version {version} (Rust), Copyright (C) polymux contributors");
    eprintln!("Licensed under the MIT License");

    let file_io = cfg!(feature = "file-io") as u8;
    let ptr_size = std::mem::size_of::<*const ()>();

    eprintln!("FILE_IO={file_io}");
    eprintln!("DEFAULT_MAX_MEDIA_SIZE={}", io::DEFAULT_MAX_MEDIA_SIZE);
    eprintln!("DEFAULT_TITLE={}", render::DEFAULT_TITLE);
    eprintln!("DEFAULT_TRANSCRIPT_LIMIT={}", render::DEFAULT_TRANSCRIPT_LIMIT);
    eprintln!("TRAILER_PADDING={}", render::TRAILER_PADDING);
    eprintln!("EOCD_SEARCH_WINDOW={}", zip::EOCD_SEARCH_WINDOW);
    eprintln!("ENTRIES={REPORT_ENTRY},{TRANSCRIPT_ENTRY},{SUMMARY_ENTRY}");
    eprintln!("OUTPUT_NAME=<stem>{}.<ext>", io::OUTPUT_SUFFIX);
    eprintln!("sizeof(usize)={ptr_size}");

    0
}

// ---------------------------------------------------------------------------
// Assemble command
// ---------------------------------------------------------------------------

fn cmd_assemble(opts: &Options) -> i32 {
    let Some(media_path) = &opts.input_file else {
        eprintln!("polymux: assemble requires a media file");
        return 1;
    };
    let output_path = match &opts.output_file {
        Some(path) => path.clone(),
        None => media_path.with_file_name(io::output_file_name(media_path)),
    };
    if let Err(code) = check_overwrite(&output_path, opts.force) {
        return code;
    }

    let analyzer: Box<dyn Analyzer> = match (&opts.analysis_file, &opts.summary_file, &opts.transcript_file) {
        (Some(path), _, _) => Box::new(JsonFileAnalyzer::new(path)),
        (None, Some(summary), Some(transcript)) => {
            let summary = match read_text(summary, "summary file") {
                Ok(text) => text,
                Err(code) => return code,
            };
            let transcript = match read_text(transcript, "transcript file") {
                Ok(text) => text,
                Err(code) => return code,
            };
            // Plain text inputs carry no key points or sentiment.
            Box::new(AnalysisResult {
                transcript,
                summary,
                key_points: Vec::new(),
                sentiment: Sentiment::Neutral,
            })
        }
        _ => {
            eprintln!("polymux: assemble requires --analysis or both --summary and --transcript");
            return 1;
        }
    };

    let file_opts = FileOptions {
        limits: opts.limits,
        mime_type: opts.mime_type.clone(),
        assemble: opts.assemble.clone(),
    };
    let stats = match io::assemble_file(media_path, analyzer.as_ref(), &output_path, &file_opts) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("polymux: {}: {e}", media_path.display());
            return 1;
        }
    };

    if !opts.quiet {
        eprintln!(
            "polymux: wrote {} ({} bytes, serve as {})",
            output_path.display(),
            stats.output_size,
            stats.mime_type
        );
    }
    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "polymux: layout: media {}, document {}, archive {}",
            stats.media_size, stats.document_size, stats.archive_size
        );
        eprintln!("polymux: document offsets: {}", stats.document);
        eprintln!("polymux: archive offsets: {}", stats.archive);
        if let Some(digest) = &stats.output_sha256 {
            eprintln!("polymux: sha256: {}", to_hex(digest));
        }
    }

    if opts.json_output {
        print_json(&serde_json::json!({
            "command": "assemble",
            "output": output_path.display().to_string(),
            "mime_type": stats.mime_type,
            "media_size": stats.media_size,
            "document_size": stats.document_size,
            "archive_size": stats.archive_size,
            "output_size": stats.output_size,
            "document": stats.document.label(),
            "archive": stats.archive.label(),
            "sha256": stats.output_sha256.as_ref().map(|d| to_hex(d)),
        }));
    }

    0
}

// ---------------------------------------------------------------------------
// Patch commands
// ---------------------------------------------------------------------------

fn cmd_patch(opts: &Options) -> i32 {
    let (Some(input), Some(output)) = (&opts.input_file, &opts.output_file) else {
        eprintln!("polymux: patch commands require input and output files");
        return 1;
    };
    if let Err(code) = check_overwrite(output, opts.force) {
        return code;
    }
    let data = match read_input(input, "input file") {
        Ok(data) => data,
        Err(code) => return code,
    };
    let input_size = data.len();

    let (kind, Patched { bytes, outcome }) = match opts.command {
        Command::PatchPdf => ("document", pdf::patch_document(data, opts.base)),
        _ => ("archive", zip::patch_archive(data, opts.base)),
    };
    if let Err(code) = write_output(output, &bytes, opts.force) {
        return code;
    }

    if !opts.quiet {
        eprintln!("polymux: {kind} offsets: {outcome}");
    }
    if opts.json_output {
        let (declared, patched, reason) = match outcome {
            PatchOutcome::Applied { declared, patched } => (Some(declared), Some(patched), None),
            PatchOutcome::Skipped(reason) => (None, None, Some(reason.to_string())),
        };
        let command = match opts.command {
            Command::PatchPdf => "patch-pdf",
            _ => "patch-zip",
        };
        print_json(&serde_json::json!({
            "command": command,
            "input_size": input_size,
            "base": opts.base,
            "outcome": outcome.label(),
            "declared": declared,
            "patched": patched,
            "reason": reason,
        }));
    }

    if outcome.is_applied() { 0 } else { EXIT_SKIPPED }
}

// ---------------------------------------------------------------------------
// Inspect command
// ---------------------------------------------------------------------------

fn cmd_inspect(opts: &Options) -> i32 {
    let Some(input) = &opts.input_file else {
        eprintln!("polymux: inspect requires an input file");
        return 1;
    };
    let data = match read_input(input, "input file") {
        Ok(data) => data,
        Err(code) => return code,
    };

    let xref = pdf::read_xref(&data);
    let directory = zip::read_directory(&data);

    if !opts.quiet {
        println!("File:                         {}", input.display());
        println!("Size:                         {}", data.len());
        println!();
        match &xref {
            Ok(table) => {
                println!("PDF startxref at:             {}", table.startxref_at);
                println!("PDF xref table offset:        {}", table.table_offset);
                println!("PDF objects:                  {}", table.entries.len());
                for entry in &table.entries {
                    let resolves = entry.in_use && object_at(&data, entry.offset, entry.object);
                    println!(
                        "  {:>5} {:010} {:05} {} {}",
                        entry.object,
                        entry.offset,
                        entry.generation,
                        if entry.in_use { 'n' } else { 'f' },
                        if !entry.in_use { "" } else if resolves { "ok" } else { "MISSING" }
                    );
                }
            }
            Err(e) => println!("PDF:                          {e}"),
        }
        println!();
        match &directory {
            Ok(dir) => {
                println!("ZIP end of directory at:      {}", dir.eocd_offset);
                println!("ZIP directory offset:         {}", dir.cd_offset);
                println!("ZIP directory size:           {}", dir.cd_size);
                println!("ZIP entries:                  {}", dir.total_entries);
                for entry in &dir.entries {
                    let status = match zip::read_entry(&data, entry) {
                        Ok(_) => "ok".to_string(),
                        Err(e) => e.to_string(),
                    };
                    println!(
                        "  {:>10} {:>10} {:>10} m{} {} [{}]",
                        entry.local_header_offset,
                        entry.compressed_size,
                        entry.uncompressed_size,
                        entry.method,
                        entry.name,
                        status
                    );
                }
            }
            Err(e) => println!("ZIP:                          {e}"),
        }
    }

    if opts.json_output {
        let pdf_json = match &xref {
            Ok(table) => serde_json::json!({
                "startxref_at": table.startxref_at,
                "table_offset": table.table_offset,
                "objects": table.entries.len(),
                "resolved": table.in_use().filter(|e| object_at(&data, e.offset, e.object)).count(),
            }),
            Err(e) => serde_json::json!({ "error": e.to_string() }),
        };
        let zip_json = match &directory {
            Ok(dir) => serde_json::json!({
                "eocd_offset": dir.eocd_offset,
                "cd_offset": dir.cd_offset,
                "entries": dir.entries.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(),
                "readable": dir.entries.iter().filter(|e| zip::read_entry(&data, e).is_ok()).count(),
            }),
            Err(e) => serde_json::json!({ "error": e.to_string() }),
        };
        print_json(&serde_json::json!({
            "command": "inspect",
            "size": data.len(),
            "pdf": pdf_json,
            "zip": zip_json,
        }));
    }

    if xref.is_err() && directory.is_err() { 1 } else { 0 }
}

/// Whether `N 0 obj` (any generation) starts at `offset`.
fn object_at(data: &[u8], offset: u64, object: u32) -> bool {
    usize::try_from(offset)
        .ok()
        .and_then(|at| data.get(at..))
        .is_some_and(|rest| rest.starts_with(format!("{object} ").as_bytes()))
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();
    let opts = resolve_options(cli);

    let default_filter = match (opts.quiet, opts.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let exit_code = match opts.command {
        Command::Assemble => cmd_assemble(&opts),
        Command::PatchPdf | Command::PatchZip => cmd_patch(&opts),
        Command::Inspect => cmd_inspect(&opts),
        Command::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_opts(args: &[&str]) -> Options {
        let argv: Vec<String> = std::iter::once("polymux".to_string())
            .chain(args.iter().map(|s| s.to_string()))
            .collect();
        let cli = Cli::try_parse_from(argv).expect("cli parse failed");
        resolve_options(cli)
    }

    fn parse_fails(args: &[&str]) -> bool {
        let argv: Vec<String> = std::iter::once("polymux".to_string())
            .chain(args.iter().map(|s| s.to_string()))
            .collect();
        Cli::try_parse_from(argv).is_err()
    }

    #[test]
    fn parse_byte_size_suffixes() {
        assert_eq!(parse_byte_size("1").unwrap(), 1);
        assert_eq!(parse_byte_size("2K").unwrap(), 2 * 1024);
        assert_eq!(parse_byte_size("20m").unwrap(), 20 * 1024 * 1024);
        assert_eq!(parse_byte_size("4G").unwrap(), 4 * 1024 * 1024 * 1024);
        assert!(parse_byte_size("").is_err());
        assert!(parse_byte_size("12Q").is_err());
    }

    #[test]
    fn assemble_with_analysis_maps_correctly() {
        let opts = parse_opts(&["assemble", "--analysis", "a.json", "clip.mp4", "out.mp4"]);
        assert_eq!(opts.command, Command::Assemble);
        assert_eq!(opts.input_file, Some(PathBuf::from("clip.mp4")));
        assert_eq!(opts.output_file, Some(PathBuf::from("out.mp4")));
        assert_eq!(opts.analysis_file, Some(PathBuf::from("a.json")));
        assert_eq!(opts.limits, MediaLimits::default());
        assert_eq!(opts.assemble.method, Method::Stored);
        assert_eq!(opts.assemble.transcript_limit, Some(render::DEFAULT_TRANSCRIPT_LIMIT));
        assert!(opts.assemble.timestamp);
    }

    #[test]
    fn assemble_tuning_flags_parse() {
        let opts = parse_opts(&[
            "assemble",
            "--summary",
            "s.md",
            "--transcript",
            "t.txt",
            "--mime",
            "video/webm",
            "--max-size",
            "64M",
            "--allow-non-video",
            "--deflate",
            "--title",
            "Weekly sync",
            "--transcript-limit",
            "0",
            "--reproducible",
            "--output",
            "out.webm",
            "clip.webm",
        ]);
        assert_eq!(opts.summary_file, Some(PathBuf::from("s.md")));
        assert_eq!(opts.transcript_file, Some(PathBuf::from("t.txt")));
        assert_eq!(opts.mime_type.as_deref(), Some("video/webm"));
        assert_eq!(opts.limits.max_size, 64 * 1024 * 1024);
        assert!(!opts.limits.require_video);
        assert_eq!(opts.assemble.method, Method::Deflated);
        assert_eq!(opts.assemble.title, "Weekly sync");
        assert_eq!(opts.assemble.transcript_limit, None);
        assert!(!opts.assemble.timestamp);
        assert_eq!(opts.output_file, Some(PathBuf::from("out.webm")));
    }

    #[test]
    fn assemble_requires_text_source() {
        assert!(parse_fails(&["assemble", "clip.mp4"]));
        assert!(parse_fails(&["assemble", "--summary", "s.md", "clip.mp4"]));
        assert!(parse_fails(&[
            "assemble",
            "--analysis",
            "a.json",
            "--summary",
            "s.md",
            "clip.mp4"
        ]));
    }

    #[test]
    fn patch_commands_map() {
        let pdf = parse_opts(&["patch-pdf", "--base", "1000", "in.pdf", "out.pdf"]);
        assert_eq!(pdf.command, Command::PatchPdf);
        assert_eq!(pdf.base, 1000);
        assert_eq!(pdf.input_file, Some(PathBuf::from("in.pdf")));
        assert_eq!(pdf.output_file, Some(PathBuf::from("out.pdf")));

        let zip = parse_opts(&["patch-zip", "-b", "42", "in.zip", "out.zip"]);
        assert_eq!(zip.command, Command::PatchZip);
        assert_eq!(zip.base, 42);

        assert!(parse_fails(&["patch-zip", "in.zip", "out.zip"]));
    }

    #[test]
    fn global_flags() {
        let opts = parse_opts(&["--force", "--json", "inspect", "file.bin"]);
        assert!(opts.force);
        assert!(opts.json_output);
        assert_eq!(opts.command, Command::Inspect);
        assert!(parse_fails(&["--quiet", "--verbose", "config"]));
    }

    #[test]
    fn verbose_is_capped() {
        let verbose = parse_opts(&["--verbose", "--verbose", "--verbose", "config"]);
        assert_eq!(verbose.verbose, 2);
    }

    #[test]
    fn config_command_maps() {
        assert_eq!(parse_opts(&["config"]).command, Command::Config);
    }

    #[test]
    fn object_lookup() {
        let data = b"junk1 0 obj\n12 0 obj";
        assert!(object_at(data, 4, 1));
        assert!(object_at(data, 12, 12));
        assert!(!object_at(data, 12, 1));
        assert!(!object_at(data, 999, 1));
    }

    #[test]
    fn hex_digest() {
        assert_eq!(to_hex(&[0x00, 0xab, 0x10]), "00ab10");
    }

    #[test]
    fn fuzz_hook_tolerates_garbage() {
        fuzz_try_parse_args(&["assemble".into(), "--max-size".into(), "9999999999999G".into()]);
        fuzz_try_parse_args(&["\u{0}".into()]);
    }
}
