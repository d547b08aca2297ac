use std::path::{Component, Path};

use colored::Colorize;
use log::info;

use crate::call::EchoFile;
use crate::errors::{GearError, Result};
use crate::flywheel::DataService;
use crate::types::acquisition::FileEntry;

/// Inputs downloaded for one run.
#[derive(Debug, Clone)]
pub struct StagedInputs {
    /// Functional echoes sorted by ascending echo time.
    pub echoes: Vec<EchoFile>,
    /// `<subject>_<acquisition>` with whitespace removed.
    pub prefix: String,
}

/// Download every functional NIfTI of `acquisition_id` into `output_dir`.
///
/// Files must carry an `EchoTime` (seconds); it is converted to
/// milliseconds for the command line.
pub fn setup_input_data<S: DataService + ?Sized>(
    service: &S,
    acquisition_id: &str,
    output_dir: &Path,
) -> Result<StagedInputs> {
    let acquisition = service.acquisition(acquisition_id)?;
    let functional: Vec<&FileEntry> = acquisition
        .files
        .iter()
        .filter(|f| f.is_nifti() && f.is_functional())
        .collect();

    info!(
        "Found {} functional NIfTI files in {}",
        functional.len(),
        acquisition.label
    );
    if functional.is_empty() {
        return Err(GearError::NoFunctionalData(acquisition_id.to_string()));
    }

    // Every file needs a usable name and an echo time; check them all
    // before downloading.
    let timed = functional
        .into_iter()
        .map(|f| {
            let local = local_name(&f.name)?;
            f.echo_time()
                .map(|te| (f, local, te))
                .ok_or_else(|| GearError::MissingEchoTime(f.name.clone()))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut echoes = Vec::with_capacity(timed.len());
    for (file, local, te) in timed {
        println!("  {} Downloading {}", "↓".cyan(), file.name);
        service.download_file(acquisition_id, &file.name, &output_dir.join(local))?;

        echoes.push(EchoFile {
            name: file.name.clone(),
            echo_time_ms: seconds_to_ms(te),
        });
    }
    echoes.sort_by(|a, b| a.echo_time_ms.total_cmp(&b.echo_time_ms));

    let subject_code = match &acquisition.parents.session {
        Some(session_id) => service.session(session_id)?.subject.code,
        None => String::new(),
    };
    let prefix = generate_prefix(&subject_code, &acquisition.label);

    Ok(StagedInputs { echoes, prefix })
}

/// Remote file names must be a single plain path component so downloads stay
/// inside the output directory.
fn local_name(name: &str) -> Result<&Path> {
    let path = Path::new(name);
    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(c)), None) if c == name => Ok(path),
        _ => Err(GearError::UnsafeFileName(name.to_string())),
    }
}

/// Rounded to the nanosecond so `0.0135` s prints as `13.5`.
fn seconds_to_ms(seconds: f64) -> f64 {
    (seconds * 1_000_000.0).round() / 1_000.0
}

/// `<subject>_<label>`, whitespace stripped from both parts.
pub fn generate_prefix(subject_code: &str, label: &str) -> String {
    let clean = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
    let (subject, label) = (clean(subject_code), clean(label));
    match (subject.is_empty(), label.is_empty()) {
        (true, _) => label,
        (false, true) => subject,
        (false, false) => format!("{}_{}", subject, label),
    }
}
