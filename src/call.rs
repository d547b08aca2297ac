/// # MEICA Command Assembly
///
/// Turns the gear configuration into a `meica.py` invocation.
///
/// ## Allow-list
///
/// Only the option names in [`MEICA_OPTIONS`] are forwarded to the tool, in
/// the order they appear there. Anything else in the configuration is
/// ignored.
///
/// ## Example
///
/// ```rust
/// use meica_gear::call::generate_call;
/// use serde_json::json;
///
/// let config = json!({ "MNI": true, "cpus": 4, "native": false, "unknown_key": "x" });
/// let tail = generate_call(config.as_object().unwrap());
/// assert_eq!(tail, "--MNI --cpus 4 ");
/// ```

use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::{Map, Value};

/// Option names accepted by `meica.py`, in command-line order.
pub const MEICA_OPTIONS: &[&str] = &[
    "MNI",
    "native",
    "space",
    "qwarp",
    "fres",
    "no_skullstrip",
    "no_despike",
    "no_axialize",
    "mask_mode",
    "coreg_mode",
    "strict",
    "smooth",
    "align_base",
    "TR",
    "tpattern",
    "align_args",
    "ted_args",
    "select_only",
    "tedica_only",
    "export_only",
    "daw",
    "tlrc",
    "highpass",
    "detrend",
    "initcost",
    "finalcost",
    "sourceTEs",
    "prefix",
    "cpus",
    "label",
    "test_proc",
    "script_only",
    "pp_only",
    "keep_int",
    "skip_check",
    "RESUME",
    "OVERWRITE",
];

/// One `--name [value]` fragment of the option tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag {
    pub name: &'static str,
    pub value: Option<String>,
}

impl Flag {
    fn push_args(&self, args: &mut Vec<String>) {
        args.push(format!("--{}", self.name));
        if let Some(v) = &self.value {
            args.push(v.clone());
        }
    }
}

/// Resolve a configured value into a flag value.
///
/// Returns `None` when the option should be left out, `Some(None)` for a bare
/// switch and `Some(Some(v))` for an option with an argument.
fn flag_value(value: &Value) -> Option<Option<String>> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some(None),
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(Some(s.clone())),
        other => Some(Some(other.to_string())),
    }
}

/// Collect the allow-listed flags present in `config`, in allow-list order.
pub fn flags(config: &Map<String, Value>) -> Vec<Flag> {
    MEICA_OPTIONS
        .iter()
        .copied()
        .filter_map(|name| {
            let value = flag_value(config.get(name)?)?;
            Some(Flag { name, value })
        })
        .collect()
}

/// Build the option tail of the `meica.py` command line.
///
/// Every fragment is followed by a single space, so the result can be
/// appended directly after the dataset / echo-time head. Values are not
/// quoted; use [`generate_args`] when spawning the process.
pub fn generate_call(config: &Map<String, Value>) -> String {
    let mut tail = String::new();
    for flag in flags(config) {
        tail.push_str("--");
        tail.push_str(flag.name);
        tail.push(' ');
        if let Some(v) = &flag.value {
            tail.push_str(v);
            tail.push(' ');
        }
    }
    tail
}

/// Same fragments as [`generate_call`], one argument per element.
pub fn generate_args(config: &Map<String, Value>) -> Vec<String> {
    let mut args = Vec::new();
    for flag in flags(config) {
        flag.push_args(&mut args);
    }
    args
}

/// A staged echo: file name relative to the working directory and its echo
/// time in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct EchoFile {
    pub name: String,
    pub echo_time_ms: f64,
}

/// Staged data that goes into the head of the command line.
#[derive(Debug, Clone, Copy)]
pub struct MeicaInputs<'a> {
    pub echoes: &'a [EchoFile],
    pub anatomical: Option<&'a Path>,
    pub slice_timing: Option<&'a Path>,
    pub basetime: &'a str,
    /// Used only when the configuration does not set `prefix`.
    pub prefix: &'a str,
}

/// Full `meica.py` invocation.
#[derive(Debug, Clone)]
pub struct MeicaCall {
    pub program: PathBuf,
    pub working_dir: PathBuf,
    pub args: Vec<String>,
}

impl MeicaCall {
    /// Assemble the call from staged inputs and the configuration.
    ///
    /// The slice-timing file is passed only when `tpattern` is not configured.
    pub fn new(
        program: &Path,
        working_dir: &Path,
        inputs: &MeicaInputs<'_>,
        config: &Map<String, Value>,
    ) -> Self {
        let datasets: Vec<&str> = inputs.echoes.iter().map(|e| e.name.as_str()).collect();
        let tes: Vec<String> = inputs
            .echoes
            .iter()
            .map(|e| format_te(e.echo_time_ms))
            .collect();

        let mut args = vec![
            "-d".to_string(),
            datasets.join(","),
            "-e".to_string(),
            tes.join(","),
        ];
        if let Some(anat) = inputs.anatomical {
            args.push("-a".to_string());
            args.push(anat.display().to_string());
        }
        args.push("-b".to_string());
        args.push(inputs.basetime.to_string());

        let configured = flags(config);
        for flag in &configured {
            flag.push_args(&mut args);
        }

        let has = |name: &str| configured.iter().any(|f| f.name == name);
        if let Some(st) = inputs.slice_timing.filter(|_| !has("tpattern")) {
            args.push("--tpattern".to_string());
            args.push(format!("@{}", st.display()));
        }
        if !has("prefix") && !inputs.prefix.is_empty() {
            args.push("--prefix".to_string());
            args.push(inputs.prefix.to_string());
        }

        MeicaCall {
            program: program.to_path_buf(),
            working_dir: working_dir.to_path_buf(),
            args,
        }
    }

    /// Process ready to spawn; arguments are passed without a shell.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).current_dir(&self.working_dir);
        cmd
    }

    /// Shell-quoted rendering of the call, for logs.
    pub fn display(&self) -> String {
        let program = self.program.display().to_string();
        let words = std::iter::once(program.as_str()).chain(self.args.iter().map(String::as_str));
        format!(
            "cd {} && {}",
            shell_words::quote(&self.working_dir.display().to_string()),
            shell_words::join(words)
        )
    }
}

/// Echo times are whole milliseconds most of the time; avoid printing `14.0`.
fn format_te(ms: f64) -> String {
    if ms.fract() == 0.0 {
        format!("{}", ms as i64)
    } else {
        format!("{}", ms)
    }
}
