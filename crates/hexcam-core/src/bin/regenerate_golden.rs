//! Rewrites the expected outputs of every golden case from its input and
//! config. Review the diff before committing: this accepts whatever the
//! current code produces.

use std::fs;
use std::process::ExitCode;

#[path = "../../tests/support/golden_cases.rs"]
mod golden_cases;

use golden_cases::{RGB_FILE, STATS_FILE, case_dirs, convert_case, golden_root};

fn main() -> ExitCode {
    let dirs = match case_dirs(&golden_root()) {
        Ok(dirs) => dirs,
        Err(err) => {
            eprintln!("error: {}", err);
            return ExitCode::from(1);
        }
    };

    let mut failed = false;
    for dir in dirs {
        let written = convert_case(&dir).and_then(|output| {
            let stats = serde_json::to_string_pretty(&output.stats)
                .map_err(|err| format!("JSON serialization failed: {}", err))?;
            fs::write(dir.join(RGB_FILE), output.rgb_rows)
                .and_then(|()| fs::write(dir.join(STATS_FILE), stats + "\n"))
                .map_err(|err| format!("failed to write {}: {}", dir.display(), err))
        });
        match written {
            Ok(()) => println!("updated {}", dir.display()),
            Err(err) => {
                eprintln!("error: {}", err);
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
