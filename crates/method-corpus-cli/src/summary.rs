//! End-of-run summary printed to stdout.

use std::fmt::Write as _;

use humansize::{format_size, DECIMAL};
use method_corpus_core::DatasetSplit;
use method_corpus_ops::{MineResponse, RepositoryOutcome};

pub fn print(response: &MineResponse, verbose: bool) {
    print!("{}", render(response, verbose));
}

fn render(response: &MineResponse, verbose: bool) -> String {
    let mut out = String::new();
    let size = std::fs::metadata(&response.output_path)
        .map(|m| format_size(m.len(), DECIMAL))
        .unwrap_or_else(|_| "-".to_string());

    if response.capacity_reached {
        let _ = writeln!(out, "✅ Corpus complete (all splits full)");
    } else {
        let _ = writeln!(out, "✅ Run complete");
    }
    let _ = writeln!(
        out,
        "   Repositories: {} processed, {} skipped",
        response.repositories.len() - response.repositories_skipped(),
        response.repositories_skipped()
    );
    let _ = writeln!(
        out,
        "   Files:        {} scanned, {} skipped",
        response.files_scanned(),
        response.files_skipped()
    );
    let _ = writeln!(out, "   Methods:      {}", response.rows_written);
    for split in DatasetSplit::ALL {
        let count = response.split_counts.get(&split).copied().unwrap_or(0);
        let _ = writeln!(
            out,
            "     {:<6} {} / {}",
            split.as_str(),
            count,
            response.split_capacities.capacity_of(split)
        );
    }
    let _ = writeln!(
        out,
        "   Output:       {} ({})",
        response.output_path.display(),
        size
    );

    if verbose {
        let _ = writeln!(out);
        for repo in &response.repositories {
            let status = match &repo.outcome {
                RepositoryOutcome::Completed => String::new(),
                RepositoryOutcome::CapacityReached => " [capacity reached]".to_string(),
                RepositoryOutcome::AcquisitionFailed { message } => format!(" [skipped: {}]", message),
            };
            let _ = writeln!(
                out,
                "   📦 {} ({} methods, {} files){}",
                repo.repo_name, repo.methods_emitted, repo.files_scanned, status
            );
            for file in &repo.skipped_files {
                let _ = writeln!(out, "      ⚠ {} ({})", file.file_path, file.kind);
            }
        }
    }

    out
}
