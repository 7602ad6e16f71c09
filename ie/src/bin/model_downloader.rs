//! Fetches the OCR model files the default engine needs.
//!
//! Detection is language-agnostic; recognition and the charset dictionary
//! are the Korean variants.

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};

const MODEL_DIR: &str = "models";

const MODELS: &[(&str, &str)] = &[
    (
        "ch_PP-OCRv4_det_infer.onnx",
        "https://huggingface.co/SWHL/RapidOCR/resolve/main/PP-OCRv4/ch_PP-OCRv4_det_infer.onnx",
    ),
    (
        "korean_PP-OCRv4_rec_infer.onnx",
        "https://huggingface.co/SWHL/RapidOCR/resolve/main/PP-OCRv4/korean_PP-OCRv4_rec_infer.onnx",
    ),
    (
        "korean_dict.txt",
        "https://raw.githubusercontent.com/PaddlePaddle/PaddleOCR/main/ppocr/utils/dict/korean_dict.txt",
    ),
];

fn main() -> Result<()> {
    let dir = Path::new(MODEL_DIR);
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;

    for (name, url) in MODELS {
        let target = dir.join(name);
        if target.exists() {
            println!("{name}: already present, skipping");
            continue;
        }

        println!("{name}: downloading...");
        let response = ureq::get(url).call().with_context(|| format!("GET {url}"))?;

        let tmp = target.with_extension("part");
        let mut file = fs::File::create(&tmp).with_context(|| format!("create {}", tmp.display()))?;
        io::copy(&mut response.into_reader(), &mut file)
            .with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &target).with_context(|| format!("persist {}", target.display()))?;

        println!("{name}: done");
    }

    println!("models ready under ./{MODEL_DIR}");
    Ok(())
}
