//! Golden fixture layout, shared by the golden tests and `regenerate_golden`.
//!
//! Each case directory under `tests/golden` holds `input.txt` and
//! `config.json`; the expectations are `expected_rgb.hex` (one frame row per
//! line) and `expected_stats.json`.

use std::fs;
use std::path::{Path, PathBuf};

use hexcam_core::pipeline::yuv_to_raw;
use hexcam_core::source::TextLineSource;
use hexcam_core::{FrameConfig, PipelineStats};

pub const INPUT_FILE: &str = "input.txt";
pub const CONFIG_FILE: &str = "config.json";
pub const RGB_FILE: &str = "expected_rgb.hex";
pub const STATS_FILE: &str = "expected_stats.json";

/// Repository-level fixture directory.
pub fn golden_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("tests")
        .join("golden")
}

/// Case directories with an input file, in name order.
pub fn case_dirs(root: &Path) -> Result<Vec<PathBuf>, String> {
    let entries =
        fs::read_dir(root).map_err(|err| format!("failed to read {}: {}", root.display(), err))?;
    let mut dirs = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|err| format!("failed to read entry: {}", err))?
            .path();
        if path.is_dir() && path.join(INPUT_FILE).is_file() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Output of converting one case with its own config.
pub struct CaseOutput {
    pub rgb_rows: String,
    pub stats: PipelineStats,
}

pub fn convert_case(dir: &Path) -> Result<CaseOutput, String> {
    let config_path = dir.join(CONFIG_FILE);
    let config = FrameConfig::load(&config_path)
        .map_err(|err| format!("config failed for {}: {}", config_path.display(), err))?;
    let input = dir.join(INPUT_FILE);
    let mut source = TextLineSource::open(&input)
        .map_err(|err| format!("failed to open {}: {}", input.display(), err))?;

    let mut raw = Vec::new();
    let stats = yuv_to_raw(&mut source, &mut raw, &config)
        .map_err(|err| format!("conversion failed for {}: {}", input.display(), err))?;

    let mut rgb_rows = String::new();
    for row in raw.chunks(config.width as usize * 3) {
        let tokens: Vec<String> = row.iter().map(|b| format!("{b:02x}")).collect();
        rgb_rows.push_str(&tokens.join(" "));
        rgb_rows.push('\n');
    }
    Ok(CaseOutput { rgb_rows, stats })
}
