use std::path::{Path, PathBuf};

use clap::Args;
use constants::{
    EXIT_FAILURE, EXIT_SUCCESS, FOLDER_INDEX_FILE_NAME, REPORT_EXTENSION, REPORT_UNIT_OUTPUT_ENV,
};
use results::{Dispatcher, LogSink};

use crate::writer::{write_index, write_report, IndexEntry};

#[derive(Args, Clone, Debug)]
pub struct ReportArgs {
    #[arg(help = "Test results file, or a folder containing test results files.")]
    pub input: PathBuf,
    #[arg(
        env = REPORT_UNIT_OUTPUT_ENV,
        help = "Report file for a single input, or report folder for a folder input. \
                Defaults to writing next to the input."
    )]
    pub output: Option<PathBuf>,
    #[arg(long, help = "Also scan sub-folders when the input is a folder.")]
    pub recursive: bool,
}

pub fn run_report(report_args: ReportArgs) -> anyhow::Result<i32> {
    let ReportArgs {
        input,
        output,
        recursive,
    } = report_args;

    if input.is_dir() {
        report_folder(&input, output.as_deref(), recursive)
    } else if input.is_file() {
        report_file(&input, output.as_deref())
    } else {
        log::error!("Input does not exist: {}", input.display());
        Ok(EXIT_FAILURE)
    }
}

fn report_file(input: &Path, output: Option<&Path>) -> anyhow::Result<i32> {
    let sink = LogSink;
    let Some(parsed) = Dispatcher::new(&sink).load_parser(input) else {
        return Ok(EXIT_FAILURE);
    };

    let report = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input.with_extension(REPORT_EXTENSION));
    write_report(&report, &parsed)?;
    log::info!("Report written to {}", report.display());
    Ok(EXIT_SUCCESS)
}

/// Writes one report per recognised file, mirroring sub-folders, plus an index.
fn report_folder(input: &Path, output: Option<&Path>, recursive: bool) -> anyhow::Result<i32> {
    let output_dir = output.unwrap_or(input);
    let files = scan_folder(input, recursive)?;

    let sink = LogSink;
    let dispatcher = Dispatcher::new(&sink);
    let mut index = Vec::new();
    for file in &files {
        let Some(parsed) = dispatcher.load_parser(file) else {
            continue;
        };
        let relative = file.strip_prefix(input).unwrap_or(file);
        let report = folder_report_path(output_dir, relative);
        write_report(&report, &parsed)?;
        index.push(IndexEntry::new(&parsed, report));
    }

    if index.is_empty() {
        log::error!("No test results found in {}", input.display());
        return Ok(EXIT_FAILURE);
    }

    let index_path = output_dir.join(FOLDER_INDEX_FILE_NAME);
    write_index(&index_path, &index)?;
    log::info!(
        "Wrote {} of {} files to {}",
        index.len(),
        files.len(),
        output_dir.display()
    );
    Ok(EXIT_SUCCESS)
}

/// `run.xml` and `run.trx` in one folder must not share a report, and no report
/// may land on the folder index, so the input's own extension is kept.
fn folder_report_path(output_dir: &Path, relative: &Path) -> PathBuf {
    let mut file_name = relative.as_os_str().to_os_string();
    file_name.push(".");
    file_name.push(REPORT_EXTENSION);
    output_dir.join(file_name)
}

/// Files directly in `folder` (or anywhere below it), sorted by path.
pub fn scan_folder<T: AsRef<Path>>(folder: T, recursive: bool) -> anyhow::Result<Vec<PathBuf>> {
    let pattern = if recursive { "**/*" } else { "*" };
    let escaped_folder = glob::Pattern::escape(&folder.as_ref().to_string_lossy());
    let glob_path = Path::new(&escaped_folder).join(pattern);

    let mut paths = glob::glob(&glob_path.to_string_lossy())?
        .filter_map(|entry| entry.ok().filter(|path| path.is_file()))
        .collect::<Vec<_>>();
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn folder_reports_keep_input_extension() {
        let output_dir = Path::new("out");
        assert_eq!(
            folder_report_path(output_dir, Path::new("run.xml")),
            output_dir.join("run.xml.json")
        );
        assert_eq!(
            folder_report_path(output_dir, &Path::new("nested").join("run.trx")),
            output_dir.join("nested").join("run.trx.json")
        );
        assert_ne!(
            folder_report_path(output_dir, Path::new("index.xml")),
            output_dir.join(FOLDER_INDEX_FILE_NAME)
        );
    }

    #[test]
    fn scan_respects_recursive_flag() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("nested")).unwrap();
        fs::write(root.join("b.xml"), "").unwrap();
        fs::write(root.join("a.trx"), "").unwrap();
        fs::write(root.join("nested").join("c.xml"), "").unwrap();

        assert_eq!(
            scan_folder(root, false).unwrap(),
            [root.join("a.trx"), root.join("b.xml")]
        );
        assert_eq!(
            scan_folder(root, true).unwrap(),
            [
                root.join("a.trx"),
                root.join("b.xml"),
                root.join("nested").join("c.xml"),
            ]
        );
    }
}
