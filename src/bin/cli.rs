use anyhow::{anyhow, bail, Context, Result};
use sheetscan::config::{ScanConfig, StrategyKind};
use sheetscan::extraction::{strategy_for, SheetLayout};
use sheetscan::quality::FrameQualityAssessor;
use sheetscan::session::{CaptureOutcome, ScanSession};
use sheetscan::store::{InMemoryDirectory, JsonLinesResultStore, ResultStore};
use sheetscan::types::{Frame, Quiz, MAX_QUESTIONS};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

const USAGE: &str = "Usage: sheetscan-cli <command> [args]

Commands:
  quality <image>                                   corner-mark readiness
  extract <image> [--questions <n>] [--trace]       read answers only
  scan <image> --quiz <file> --students <file> [--results <file>]
  print-config                                      effective configuration as TOML

Options:
  --config <file>      configuration file (default: sheetscan.toml)
  --strategy <name>    darkness | visibility | hybrid
  --json               machine-readable output";

#[derive(Debug, Default)]
struct Options {
    positional: Vec<String>,
    config: Option<PathBuf>,
    strategy: Option<StrategyKind>,
    quiz: Option<PathBuf>,
    students: Option<PathBuf>,
    results: Option<PathBuf>,
    questions: Option<usize>,
    json: bool,
    trace: bool,
}

impl Options {
    fn parse(args: &[String]) -> Result<Self> {
        let mut opts = Options::default();
        let mut i = 0;
        while i < args.len() {
            let arg = args[i].as_str();
            let mut value = || -> Result<String> {
                i += 1;
                args.get(i)
                    .cloned()
                    .ok_or_else(|| anyhow!("{} requires a value", arg))
            };
            match arg {
                "--config" => opts.config = Some(value()?.into()),
                "--strategy" => opts.strategy = Some(value()?.parse()?),
                "--quiz" => opts.quiz = Some(value()?.into()),
                "--students" => opts.students = Some(value()?.into()),
                "--results" => opts.results = Some(value()?.into()),
                "--questions" => {
                    opts.questions = Some(value()?.parse().context("--questions expects a number")?)
                }
                "--json" => opts.json = true,
                "--trace" => opts.trace = true,
                other if other.starts_with("--") => bail!("Unknown option: {}", other),
                other => opts.positional.push(other.to_string()),
            }
            i += 1;
        }
        Ok(opts)
    }

    fn load_config(&self) -> Result<ScanConfig> {
        let path = self.config.clone().unwrap_or_else(ScanConfig::default_path);
        let mut config = ScanConfig::load_from_file(&path)
            .with_context(|| format!("loading configuration from {}", path.display()))?;
        if let Some(strategy) = self.strategy {
            config.extraction.strategy = strategy;
        }
        Ok(config)
    }

    fn image(&self) -> Result<Frame> {
        let path = self
            .positional
            .first()
            .ok_or_else(|| anyhow!("an image path is required"))?;
        Frame::open(path).with_context(|| format!("opening {}", path))
    }
}

fn main() -> Result<()> {
    sheetscan::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("{}", USAGE);
        std::process::exit(1);
    }

    let command = &args[1];
    let opts = Options::parse(&args[2..])?;
    match command.as_str() {
        "quality" => cmd_quality(&opts),
        "extract" => cmd_extract(&opts),
        "scan" => cmd_scan(&opts),
        "print-config" => cmd_print_config(&opts),
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {}\n\n{}", command, USAGE);
            std::process::exit(1);
        }
    }
}

fn cmd_quality(opts: &Options) -> Result<()> {
    let config = opts.load_config()?;
    let frame = opts.image()?;
    let quality = FrameQualityAssessor::new(&config.quality).assess(&frame);

    if opts.json {
        println!("{}", serde_json::to_string(&quality)?);
    } else {
        println!(
            "{} ({} corners, confidence {:.2})",
            quality.tier, quality.corners_detected, quality.confidence
        );
        for corner in &quality.corners {
            println!(
                "  {:?}: {:.2}{}",
                corner.corner,
                corner.max_dark_ratio,
                if corner.detected { " detected" } else { "" }
            );
        }
    }
    Ok(())
}

fn cmd_extract(opts: &Options) -> Result<()> {
    let config = opts.load_config()?;
    let frame = opts.image()?;
    let layout = SheetLayout::standard(opts.questions.unwrap_or(MAX_QUESTIONS))?;
    let result = strategy_for(&config.extraction).extract(&frame, &layout);

    if opts.json {
        println!("{}", serde_json::to_string(&result)?);
        return Ok(());
    }

    println!(
        "{} strategy, confidence {:.1}",
        result.strategy, result.confidence
    );
    for q in &result.questions {
        println!("  Q{:<2} {:<8} {:5.1}", q.index + 1, q.answer.to_string(), q.confidence);
    }
    if opts.trace {
        for entry in result.trace.entries() {
            println!("  {}", entry);
        }
    }
    Ok(())
}

fn cmd_scan(opts: &Options) -> Result<()> {
    let config = opts.load_config()?;
    let quiz_path = opts.quiz.as_ref().ok_or_else(|| anyhow!("--quiz is required"))?;
    let students_path = opts
        .students
        .as_ref()
        .ok_or_else(|| anyhow!("--students is required"))?;

    let quiz = Quiz::load_from_file(quiz_path)
        .with_context(|| format!("loading quiz {}", quiz_path.display()))?;
    let directory = InMemoryDirectory::load_from_json(students_path)
        .with_context(|| format!("loading students {}", students_path.display()))?;
    let results = opts
        .results
        .clone()
        .unwrap_or_else(|| PathBuf::from("results.jsonl"));
    let store: Arc<dyn ResultStore> = Arc::new(JsonLinesResultStore::new(&results));

    let frame = opts.image()?;
    let session = ScanSession::new(config, quiz, Arc::new(directory), store)?;

    match session.capture_and_score(&frame)? {
        CaptureOutcome::Committed(report) => {
            if opts.json {
                println!("{}", serde_json::to_string(&report.record)?);
            } else {
                let record = &report.record;
                println!(
                    "{} ({}): {} correct, {} wrong, score {} ({}%){}",
                    record.student_name,
                    record.external_id,
                    record.correct_answers,
                    record.wrong_answers,
                    record.score,
                    record.percentage,
                    if record.verified { "" } else { " [unverified]" }
                );
                println!("Answers: {}", record.answers.join(","));
                println!("Saved to {}", results.display());
                if opts.trace {
                    for entry in report.score.trace.entries() {
                        println!("  {}", entry);
                    }
                }
            }
        }
        CaptureOutcome::Throttled { retry_in } => {
            bail!("capture throttled, retry in {} ms", retry_in.as_millis())
        }
        CaptureOutcome::Busy => bail!("another capture is in progress"),
    }
    Ok(())
}

fn cmd_print_config(opts: &Options) -> Result<()> {
    let config = opts.load_config()?;
    if opts.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        print!("{}", toml::to_string_pretty(&config)?);
    }
    Ok(())
}
