/// # Gear Orchestration
///
/// One pass of the gear:
///
/// 1. Load `config.json`
/// 2. Download the functional echoes into the output directory
/// 3. Assemble the `meica.py` call
/// 4. Run it in the output directory
/// 5. Zip every output subdirectory (on success, or always with
///    `save_on_error`) and remove the originals

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use chrono::Utc;
use colored::Colorize;
use log::{error, info, warn};

use crate::archive::{ArchiveJob, ArchiveSummary, Compression};
use crate::call::{MeicaCall, MeicaInputs};
use crate::errors::{GearError, Result};
use crate::flywheel::{DataService, FlywheelClient};
use crate::staging::{StagedInputs, setup_input_data};
use crate::types::gear_config::GearConfig;
use crate::utils::{PrintOp, Utils};

/// Default output directory inside the container.
pub const DEFAULT_OUTPUT_DIR: &str = "/flywheel/v0/output";
/// Default location of the meica.py entry point.
pub const DEFAULT_MEICA_PATH: &str = "/flywheel/v0/me-ica/meica.py";

/// Paths and switches for one gear run.
#[derive(Debug, Clone)]
pub struct GearOptions {
    pub config_path: PathBuf,
    pub output_dir: PathBuf,
    pub meica: PathBuf,
    pub dry_run: bool,
}

/// Run the whole gear and return the exit code to finish with.
pub fn run(options: &GearOptions) -> Result<u8> {
    let config = GearConfig::load_from_file(&options.config_path)?;
    let client = FlywheelClient::from_api_key(config.api_key()?)?;
    run_with_service(options, &config, &client)
}

/// Same as [`run`] with an already loaded config and data service.
pub fn run_with_service<S: DataService + ?Sized>(
    options: &GearOptions,
    config: &GearConfig,
    service: &S,
) -> Result<u8> {
    info!("start: {}", Utc::now().to_rfc3339());
    fs::create_dir_all(&options.output_dir)?;

    let staged = setup_input_data(
        service,
        config.functional_acquisition_id()?,
        &options.output_dir,
    )?;
    let call = create_meica_call(&staged, config, &options.output_dir, &options.meica);
    info!("{}", call.display());

    if options.dry_run {
        println!("  {} Dry-run: not running meica.py", "•".yellow());
        println!("{}", call.display());
        return Ok(0);
    }

    let status = run_meica_call(&call)?;
    let code = exit_code(status);
    cleanup(status.success(), config.save_on_error(), &options.output_dir)?;

    info!("done: {} (exit {})", Utc::now().to_rfc3339(), code);
    Ok(code)
}

/// Full meica.py call for the staged inputs.
pub fn create_meica_call(
    staged: &StagedInputs,
    config: &GearConfig,
    output_dir: &Path,
    meica: &Path,
) -> MeicaCall {
    let basetime = config.basetime();
    let inputs = MeicaInputs {
        echoes: &staged.echoes,
        anatomical: config.anatomical_path(),
        slice_timing: config.slice_timing_path(),
        basetime: &basetime,
        prefix: &staged.prefix,
    };
    MeicaCall::new(meica, output_dir, &inputs, config.options())
}

/// Run meica.py to completion with inherited stdio.
pub fn run_meica_call(call: &MeicaCall) -> Result<ExitStatus> {
    println!("{}", "Running meica.py...".bold().cyan());
    let status = call.to_command().status().map_err(|e| {
        GearError::CommandFailed(format!("failed to start {}: {}", call.program.display(), e))
    })?;
    Ok(status)
}

/// Exit code to report for a finished subprocess; signals map to 1.
pub fn exit_code(status: ExitStatus) -> u8 {
    match status.code() {
        Some(0) => 0,
        Some(c) => u8::try_from(c).unwrap_or(1),
        None => 1,
    }
}

/// Zip each subdirectory of `output_dir` into `<name>.zip` beside it and
/// remove the directory.
///
/// Nothing is touched when the run failed and `save_on_error` is off.
pub fn cleanup(
    success: bool,
    save_on_error: bool,
    output_dir: &Path,
) -> Result<Vec<ArchiveSummary>> {
    if !success && !save_on_error {
        error!("meica.py failed; outputs left in {}", output_dir.display());
        println!(
            "{} {}",
            "✗".red().bold(),
            "meica.py failed; not compressing outputs".red()
        );
        return Ok(Vec::new());
    }

    if success {
        println!("{}", "Success. Compressing outputs...".bold());
    } else {
        warn!("meica.py failed; compressing outputs because save_on_error is set");
        println!(
            "{} {}",
            "Warning:".yellow().bold(),
            "meica.py failed, saving outputs anyway".yellow()
        );
    }

    let mut dirs: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(output_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();

    let mut summaries = Vec::with_capacity(dirs.len());
    for dir in dirs {
        let job = ArchiveJob::new(&dir)
            .include_top_dir(true)
            .compression(Compression::Deflate);
        let dest = job.destination_path();
        info!("Generating {}...", dest.display());

        let summary = job.run()?;
        let rel = format!("{} ({} entries)", display_name(&dest), summary.entries());
        Utils::print_status(&rel, PrintOp::Create { is_dir: false });

        fs::remove_dir_all(&dir)?;
        Utils::print_status(&display_name(&dir), PrintOp::Delete);
        summaries.push(summary);
    }

    println!(
        "{} Compressed {} output director{}",
        "✓".green().bold(),
        summaries.len(),
        if summaries.len() == 1 { "y" } else { "ies" }
    );
    Ok(summaries)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn populated_output() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("meica.sub01/empty")).unwrap();
        fs::write(tmp.path().join("meica.sub01/report.txt"), "ok").unwrap();
        fs::create_dir_all(tmp.path().join("extra")).unwrap();
        fs::write(tmp.path().join("e1.nii.gz"), "data").unwrap();
        tmp
    }

    #[test]
    fn test_cleanup_on_success_zips_and_removes_dirs() {
        let tmp = populated_output();
        let summaries = cleanup(true, false, tmp.path()).unwrap();

        assert_eq!(summaries.len(), 2);
        assert!(tmp.path().join("meica.sub01.zip").is_file());
        assert!(tmp.path().join("extra.zip").is_file());
        assert!(!tmp.path().join("meica.sub01").exists());
        assert!(!tmp.path().join("extra").exists());
        // Loose files are left alone.
        assert!(tmp.path().join("e1.nii.gz").is_file());
        assert_eq!(summaries[1].files, 1);
        assert_eq!(summaries[1].directories, 1);
    }

    #[test]
    fn test_cleanup_on_failure_keeps_outputs() {
        let tmp = populated_output();
        let summaries = cleanup(false, false, tmp.path()).unwrap();

        assert!(summaries.is_empty());
        assert!(tmp.path().join("meica.sub01").is_dir());
        assert!(!tmp.path().join("meica.sub01.zip").exists());
    }

    #[test]
    fn test_cleanup_save_on_error() {
        let tmp = populated_output();
        let summaries = cleanup(false, true, tmp.path()).unwrap();

        assert_eq!(summaries.len(), 2);
        assert!(tmp.path().join("meica.sub01.zip").is_file());
        assert!(!tmp.path().join("meica.sub01").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_code() {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(exit_code(ExitStatus::from_raw(0)), 0);
        assert_eq!(exit_code(ExitStatus::from_raw(3 << 8)), 3);
        // Killed by SIGKILL.
        assert_eq!(exit_code(ExitStatus::from_raw(9)), 1);
    }
}
