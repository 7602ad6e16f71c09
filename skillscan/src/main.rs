//! skillscan: turns item-panel screenshots into structured skill records.
//!
//! One JSON line per image (or per region with `--raw`) goes to stdout;
//! progress and logging go to stderr so the output stays machine-readable.

mod config;
mod panel;
mod template;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::config::Config;
use crate::panel::{PanelParser, PanelReading, SkillEntry};
use crate::template::TemplateSet;

const USAGE: &str = "\
usage: skillscan [options] <image>...

options:
  --template <file>  recognize the regions of a saved template instead of the whole panel
  --name <template>  which template to use from the file (default: first)
  --class <직업>     character class scoping the skill dictionary
  --raw              emit one JSON line per region with the raw OCR text";

#[derive(Debug, Default)]
struct Args {
    images: Vec<PathBuf>,
    template: Option<PathBuf>,
    template_name: Option<String>,
    class: Option<String>,
    raw: bool,
}

impl Args {
    fn parse(mut argv: impl Iterator<Item = String>) -> Result<Self> {
        let mut args = Self::default();
        while let Some(arg) = argv.next() {
            match arg.as_str() {
                "--template" => {
                    args.template = Some(argv.next().context("--template needs a path")?.into());
                }
                "--name" => {
                    args.template_name = Some(argv.next().context("--name needs a value")?);
                }
                "--class" => {
                    args.class = Some(argv.next().context("--class needs a value")?);
                }
                "--raw" => args.raw = true,
                "--help" | "-h" => {
                    eprintln!("{USAGE}");
                    std::process::exit(0);
                }
                flag if flag.starts_with('-') => bail!("unknown flag {flag}\n{USAGE}"),
                _ => args.images.push(arg.into()),
            }
        }
        if args.images.is_empty() {
            bail!("no images given\n{USAGE}");
        }
        Ok(args)
    }
}

#[derive(Serialize)]
struct RawRow<'a> {
    source: &'a str,
    region: &'a str,
    text: &'a str,
}

#[derive(Serialize)]
struct PanelRow<'a> {
    source: &'a str,
    #[serde(flatten)]
    reading: PanelReading,
}

fn main() -> Result<()> {
    // Structured logging. Use `RUST_LOG=info` etc.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse(std::env::args().skip(1))?;
    run(args)
}

fn run(args: Args) -> Result<()> {
    let cfg = Config::load_or_default();
    let class = args.class.clone().or_else(|| cfg.class.clone());
    if let Some(name) = class.as_deref() {
        if !data::class_names().contains(&name) {
            // The matcher falls back to the full dictionary for unknown
            // classes, so this is a warning, not an error.
            tracing::warn!(class = %name, "unknown character class; matching against all classes");
        }
    }

    let (regions, preprocess) = match &args.template {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("read template file {}", path.display()))?;
            let mut templates = TemplateSet::default();
            templates.import_json(&json)?;
            let template = match &args.template_name {
                Some(name) => templates
                    .get(name)
                    .with_context(|| format!("no template named {name}"))?,
                None => templates.0.values().next().context("template file is empty")?,
            };
            (template.regions.clone(), cfg.region_preprocess)
        }
        None => (
            ie::PanelSlots::default().to_regions().to_vec(),
            cfg.panel_preprocess,
        ),
    };

    let engine = ie::PaddleEngine::new(
        cfg.detection_model(),
        cfg.recognition_model(),
        cfg.charset(),
    );
    let recognizer = ie::Recognizer::new(engine, preprocess);
    let parser = PanelParser::new(class).with_max_skills(Some(cfg.max_skills));

    let total = args.images.len();
    for (i, path) in args.images.iter().enumerate() {
        let source = path.display().to_string();
        eprintln!("이미지 {}/{}: {}", i + 1, total, source);

        let image = match ie::OwnedImage::open(path) {
            Ok(image) => image,
            Err(err) => {
                // An unreadable file costs one row, not the batch.
                tracing::warn!(image = %source, error = %err, "failed to load image");
                emit_failure(&args, &source)?;
                continue;
            }
        };

        let results = recognizer
            .recognize(&image, &regions, &mut |p| eprintln!("  {}", p.text))
            .with_context(|| format!("recognize {source}"))?;

        if args.raw {
            for r in &results {
                emit(&RawRow {
                    source: &source,
                    region: &r.region_label,
                    text: &r.text,
                })?;
            }
        } else {
            let raw_text = results
                .iter()
                .map(|r| r.text.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            let mut reading = parser.parse_document(&raw_text);
            if reading.skills.is_empty() {
                reading.skills.push(failure_entry());
            }
            emit(&PanelRow {
                source: &source,
                reading,
            })?;
        }
    }

    eprintln!("전체 OCR 완료: {total}개 이미지");
    Ok(())
}

fn emit<T: Serialize>(row: &T) -> Result<()> {
    println!("{}", serde_json::to_string(row).context("serialize row")?);
    Ok(())
}

fn emit_failure(args: &Args, source: &str) -> Result<()> {
    if args.raw {
        emit(&RawRow {
            source,
            region: "",
            text: ie::RECOGNITION_FAILED,
        })
    } else {
        let reading = PanelReading {
            skills: vec![failure_entry()],
            ..PanelReading::default()
        };
        emit(&PanelRow { source, reading })
    }
}

fn failure_entry() -> SkillEntry {
    SkillEntry {
        name: ie::RECOGNITION_FAILED.to_string(),
        level: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> impl Iterator<Item = String> + use<> {
        args.iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn args_parse_flags_and_images() {
        let args = Args::parse(argv(&[
            "--template",
            "t.json",
            "--class",
            "호법성",
            "--raw",
            "a.png",
            "b.png",
        ]))
        .expect("parse");

        assert_eq!(args.template, Some(PathBuf::from("t.json")));
        assert_eq!(args.class.as_deref(), Some("호법성"));
        assert!(args.raw);
        assert_eq!(args.images.len(), 2);
    }

    #[test]
    fn args_require_at_least_one_image() {
        assert!(Args::parse(argv(&["--raw"])).is_err());
    }

    #[test]
    fn args_reject_unknown_flags() {
        assert!(Args::parse(argv(&["--wat", "a.png"])).is_err());
    }
}
