//! Local speech engine fallback
//!
//! Shells out to whichever of `espeak-ng`, `espeak` or `say` is on `PATH`.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::Synthesizer;
use crate::{Error, Result};

/// Engines tried in order
const ENGINES: &[&str] = &["espeak-ng", "espeak", "say"];

/// Default speaking rate of the engines above, in words per minute
const BASE_WPM: f32 = 175.0;

/// Relative speaking rate
const RATE: f32 = 0.9;

/// Text-to-speech through a local command-line engine
#[derive(Debug, Clone)]
pub struct LocalSynthesizer {
    program: Option<PathBuf>,
    engine: &'static str,
    language: String,
}

impl LocalSynthesizer {
    /// Discover an engine on `PATH` for `locale`
    #[must_use]
    pub fn discover(locale: &str) -> Self {
        let found = ENGINES
            .iter()
            .find_map(|&name| which::which(name).ok().map(|path| (name, path)));

        match found {
            Some((engine, path)) => {
                tracing::debug!(engine, path = %path.display(), "local speech engine found");
                Self {
                    program: Some(path),
                    engine,
                    language: language_subtag(locale),
                }
            }
            None => {
                tracing::debug!("no local speech engine on PATH");
                Self {
                    program: None,
                    engine: "none",
                    language: language_subtag(locale),
                }
            }
        }
    }

    /// Build the engine's argument list for `text`
    fn args(&self, text: &str) -> Vec<String> {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let wpm = (BASE_WPM * RATE).round() as u32;

        match self.engine {
            "say" => vec!["-r".to_string(), wpm.to_string(), "--".to_string(), text.to_string()],
            _ => vec![
                "-v".to_string(),
                self.language.clone(),
                "-s".to_string(),
                wpm.to_string(),
                "--".to_string(),
                text.to_string(),
            ],
        }
    }
}

#[async_trait]
impl Synthesizer for LocalSynthesizer {
    fn name(&self) -> &str {
        self.engine
    }

    async fn is_available(&self) -> bool {
        self.program.is_some()
    }

    async fn speak(&self, text: &str, cancel: &CancellationToken) -> Result<()> {
        let program = self
            .program
            .as_ref()
            .ok_or_else(|| Error::Unsupported("no local speech engine".to_string()))?;

        let mut child = Command::new(program)
            .args(self.args(text))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::SynthesisFailed(format!("{}: {e}", self.engine)))?;

        tokio::select! {
            status = child.wait() => {
                let status = status?;
                if status.success() {
                    Ok(())
                } else {
                    Err(Error::SynthesisFailed(format!("{} exited with {status}", self.engine)))
                }
            }
            () = cancel.cancelled() => {
                child.kill().await.ok();
                tracing::debug!(engine = self.engine, "local speech cancelled");
                Ok(())
            }
        }
    }
}

fn language_subtag(locale: &str) -> String {
    locale
        .split(['-', '_'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("id")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(name: &'static str) -> LocalSynthesizer {
        LocalSynthesizer {
            program: Some(PathBuf::from(name)),
            engine: name,
            language: "id".to_string(),
        }
    }

    #[test]
    fn espeak_args_carry_language_and_rate() {
        let args = engine("espeak-ng").args("Halo");
        assert_eq!(args, vec!["-v", "id", "-s", "158", "--", "Halo"]);
    }

    #[test]
    fn say_args_carry_rate() {
        let args = engine("say").args("Halo");
        assert_eq!(args, vec!["-r", "158", "--", "Halo"]);
    }

    #[tokio::test]
    async fn missing_engine_is_unsupported() {
        let synth = LocalSynthesizer {
            program: None,
            engine: "none",
            language: "id".to_string(),
        };
        assert!(!synth.is_available().await);
        let err = synth.speak("halo", &CancellationToken::new()).await;
        assert!(matches!(err, Err(Error::Unsupported(_))));
    }
}
