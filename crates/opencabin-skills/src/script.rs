//! Script-backed capabilities.
//!
//! A package may ship executable scripts alongside its descriptor.  The host
//! wraps each one in a [`ScriptCapabilityHandler`] and registers it like any
//! other handler, so filesystem packages can carry real behavior without the
//! host linking new code.
//!
//! Slot values reach the script as `SKILL_SLOT_<NAME>` environment variables
//! plus a `SKILL_SLOTS` JSON blob.  Stdout that parses as an outcome-shaped
//! JSON object (`commands`, `tts_text`) becomes the execution outcome; any
//! other stdout is spoken verbatim.  Non-zero exit and timeout are handler
//! faults, which the executor wraps.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use opencabin_core::{Command, SkillContext};

use crate::executor::{CapabilityHandler, ExecutionOutcome};

/// Default wall-clock budget for one script run.
const DEFAULT_SCRIPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Supported script interpreters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptInterpreter {
    /// Shell script (`.sh`).
    Shell,
    /// Python script (`.py`).
    Python,
    /// JavaScript (`.js`, `.mjs`).
    JavaScript,
}

impl ScriptInterpreter {
    /// Detect the interpreter from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "sh" => Some(Self::Shell),
            "py" => Some(Self::Python),
            "js" | "mjs" => Some(Self::JavaScript),
            _ => None,
        }
    }

    /// The command used to run scripts of this kind.
    pub fn command(&self) -> &'static str {
        match self {
            Self::Shell => "sh",
            Self::Python => "python3",
            Self::JavaScript => "node",
        }
    }
}

/// An executable script discovered in a package.
#[derive(Debug, Clone)]
pub struct SkillScript {
    /// Script file name (e.g. `defrost.sh`).
    pub filename: String,
    /// Absolute path to the script.
    pub path: PathBuf,
    /// Interpreter inferred from the extension.
    pub interpreter: ScriptInterpreter,
}

/// Find executable scripts in a package's scripts directory.
///
/// Unrecognized extensions are ignored; a missing directory yields an empty
/// list.
pub fn discover_scripts(dir: &Path) -> std::io::Result<Vec<SkillScript>> {
    let mut scripts = Vec::new();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(scripts),
        Err(e) => return Err(e),
    };

    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if let Some(interpreter) = ScriptInterpreter::from_extension(ext) {
            scripts.push(SkillScript {
                filename: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                path: path.clone(),
                interpreter,
            });
        }
    }

    scripts.sort_by(|a, b| a.filename.cmp(&b.filename));
    Ok(scripts)
}

/// Outcome shape a script may print to stdout.
#[derive(Debug, Deserialize)]
struct ScriptOutput {
    #[serde(default)]
    commands: Vec<Command>,
    #[serde(default)]
    tts_text: Option<String>,
}

/// A [`CapabilityHandler`] that runs a package script as a subprocess.
pub struct ScriptCapabilityHandler {
    script: SkillScript,
    timeout: Duration,
}

impl ScriptCapabilityHandler {
    /// Wrap a script with the default timeout.
    #[must_use]
    pub fn new(script: SkillScript) -> Self {
        Self {
            script,
            timeout: DEFAULT_SCRIPT_TIMEOUT,
        }
    }

    /// Override the wall-clock budget (builder style).
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CapabilityHandler for ScriptCapabilityHandler {
    async fn handle(
        &self,
        slots: &HashMap<String, Value>,
        _context: &SkillContext,
    ) -> anyhow::Result<ExecutionOutcome> {
        tracing::debug!(script = %self.script.filename, "executing capability script");

        let mut cmd = tokio::process::Command::new(self.script.interpreter.command());
        cmd.arg(&self.script.path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        for (key, value) in slots {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            cmd.env(format!("SKILL_SLOT_{}", key.to_uppercase()), rendered);
        }
        cmd.env("SKILL_SLOTS", serde_json::to_string(slots)?);

        let child = cmd
            .spawn()
            .map_err(|e| anyhow::anyhow!("failed to spawn `{}`: {e}", self.script.filename))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                anyhow::anyhow!(
                    "script `{}` timed out after {:?}",
                    self.script.filename,
                    self.timeout
                )
            })??;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "script `{}` exited with {}: {}",
                self.script.filename,
                output.status.code().unwrap_or(-1),
                stderr.trim()
            );
        }

        let stdout = stdout.trim();
        if let Ok(parsed) = serde_json::from_str::<ScriptOutput>(stdout) {
            return Ok(ExecutionOutcome {
                commands: parsed.commands,
                tts_text: parsed.tts_text,
            });
        }

        Ok(ExecutionOutcome {
            commands: Vec::new(),
            tts_text: (!stdout.is_empty()).then(|| stdout.to_owned()),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpreter_detection() {
        assert_eq!(
            ScriptInterpreter::from_extension("sh"),
            Some(ScriptInterpreter::Shell)
        );
        assert_eq!(
            ScriptInterpreter::from_extension("py"),
            Some(ScriptInterpreter::Python)
        );
        assert_eq!(
            ScriptInterpreter::from_extension("mjs"),
            Some(ScriptInterpreter::JavaScript)
        );
        assert_eq!(ScriptInterpreter::from_extension("exe"), None);
    }

    #[test]
    fn discover_ignores_unrecognized_files() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("run.sh"), "#!/bin/sh\n").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "not a script").unwrap();
        std::fs::write(tmp.path().join("calc.py"), "print(1)").unwrap();

        let scripts = discover_scripts(tmp.path()).unwrap();
        let names: Vec<&str> = scripts.iter().map(|s| s.filename.as_str()).collect();
        assert_eq!(names, ["calc.py", "run.sh"]);
    }

    #[test]
    fn discover_missing_dir_is_empty() {
        let scripts = discover_scripts(Path::new("/nonexistent/scripts")).unwrap();
        assert!(scripts.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn script_json_stdout_becomes_the_outcome() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("ack.sh");
        std::fs::write(
            &path,
            "printf '{\"tts_text\": \"speed is %s\"}' \"$SKILL_SLOT_SPEED\"\n",
        )
        .unwrap();

        let handler = ScriptCapabilityHandler::new(SkillScript {
            filename: "ack.sh".into(),
            path,
            interpreter: ScriptInterpreter::Shell,
        });

        let slots = HashMap::from([("speed".to_owned(), Value::String("high".into()))]);
        let outcome = handler.handle(&slots, &SkillContext::default()).await.unwrap();

        assert!(outcome.commands.is_empty());
        assert_eq!(outcome.tts_text.as_deref(), Some("speed is high"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn script_plain_stdout_is_spoken_verbatim() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("hello.sh");
        std::fs::write(&path, "echo done\n").unwrap();

        let handler = ScriptCapabilityHandler::new(SkillScript {
            filename: "hello.sh".into(),
            path,
            interpreter: ScriptInterpreter::Shell,
        });

        let outcome = handler
            .handle(&HashMap::new(), &SkillContext::default())
            .await
            .unwrap();
        assert_eq!(outcome.tts_text.as_deref(), Some("done"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_is_a_handler_fault() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("fail.sh");
        std::fs::write(&path, "echo broken >&2\nexit 3\n").unwrap();

        let handler = ScriptCapabilityHandler::new(SkillScript {
            filename: "fail.sh".into(),
            path,
            interpreter: ScriptInterpreter::Shell,
        });

        let result = handler.handle(&HashMap::new(), &SkillContext::default()).await;
        let err = result.unwrap_err().to_string();
        assert!(err.contains("exited with 3"));
        assert!(err.contains("broken"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_script_times_out() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("slow.sh");
        std::fs::write(&path, "sleep 5\n").unwrap();

        let handler = ScriptCapabilityHandler::new(SkillScript {
            filename: "slow.sh".into(),
            path,
            interpreter: ScriptInterpreter::Shell,
        })
        .with_timeout(Duration::from_millis(100));

        let result = handler.handle(&HashMap::new(), &SkillContext::default()).await;
        assert!(result.unwrap_err().to_string().contains("timed out"));
    }
}
