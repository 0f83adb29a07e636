//! Pipeline coordinator for Animagen.
//!
//! Runs one prompt through generation, sanitization, validation and
//! rendering. Every stage of a run is awaited in order.

use crate::codegen::{sanitize, PlausibilityCheck, SceneTemplate};
use crate::config::Settings;
use crate::error::Result;
use crate::rag::CodeGenerator;
use crate::render::{CapturedOutput, RenderInvoker, RenderOutcome, RenderStage, ScriptGuard};
use chrono::Local;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use tracing::{error, info, instrument, warn};

/// Timestamp-derived identifier shared by a run's script and video names.
///
/// The id stays reserved for this process until the value is dropped.
#[derive(Debug)]
pub struct RunId {
    id: String,
}

fn active_runs() -> &'static Mutex<HashSet<String>> {
    static ACTIVE: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();
    ACTIVE.get_or_init(|| Mutex::new(HashSet::new()))
}

impl RunId {
    /// Reserve an id for the current second.
    ///
    /// When another run in this process holds the same timestamp, or its
    /// script or video already exists on disk, `_1`, `_2`, ... is appended.
    pub fn reserve(scripts_dir: &Path, output_dir: &Path) -> Self {
        Self::reserve_with(
            &Local::now().format("%Y%m%d_%H%M%S").to_string(),
            scripts_dir,
            output_dir,
        )
    }

    fn reserve_with(timestamp: &str, scripts_dir: &Path, output_dir: &Path) -> Self {
        let mut active = active_runs()
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut suffix = 0u32;
        loop {
            let id = if suffix == 0 {
                timestamp.to_string()
            } else {
                format!("{}_{}", timestamp, suffix)
            };

            let taken = active.contains(&id)
                || scripts_dir.join(script_name(&id)).exists()
                || output_dir.join(output_name(&id)).exists();

            if !taken {
                active.insert(id.clone());
                return Self { id };
            }
            suffix += 1;
        }
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }

    pub fn script_name(&self) -> String {
        script_name(&self.id)
    }

    pub fn output_name(&self) -> String {
        output_name(&self.id)
    }
}

impl Drop for RunId {
    fn drop(&mut self) {
        active_runs()
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.id);
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id)
    }
}

fn script_name(id: &str) -> String {
    format!("ai_scene_{}.py", id)
}

fn output_name(id: &str) -> String {
    format!("output_{}.mp4", id)
}

/// Sanitized model output.
#[derive(Debug, Clone)]
pub struct GeneratedCode {
    /// The model's answer, untouched.
    pub raw_response: String,
    /// Code destined for the `construct` body.
    pub code: String,
    /// Whether the body was isolated from a parsed `construct` definition.
    pub structured: bool,
}

/// How a video run ended.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The video exists at `video`.
    Rendered {
        run_id: String,
        video: PathBuf,
        output: CapturedOutput,
    },
    /// The code did not look like scene code; nothing was written or rendered.
    Rejected { raw_response: String, code: String },
    /// The renderer exited with a failure status.
    RenderFailed {
        run_id: String,
        status: Option<i32>,
        output: CapturedOutput,
    },
    /// The renderer succeeded but its video could not be found.
    ArtifactMissing {
        run_id: String,
        output: CapturedOutput,
    },
    /// An unexpected error interrupted the render stage.
    Failed { run_id: String, error: String },
}

/// Prompt-to-video pipeline.
pub struct Pipeline {
    generator: Arc<dyn CodeGenerator>,
    check: PlausibilityCheck,
    template: SceneTemplate,
    invoker: RenderInvoker,
    scripts_dir: PathBuf,
    output_dir: PathBuf,
}

impl Pipeline {
    pub fn new(settings: &Settings, generator: Arc<dyn CodeGenerator>) -> Self {
        Self {
            generator,
            check: PlausibilityCheck::new(settings.validation.signals.clone()),
            template: SceneTemplate::new(settings.render.scene_class.clone()),
            invoker: RenderInvoker::new(&settings.render, settings.media_dir()),
            scripts_dir: settings.scripts_dir(),
            output_dir: settings.output_dir(),
        }
    }

    /// Ask the generator for code and sanitize the answer.
    #[instrument(skip(self))]
    pub async fn generate_code(&self, prompt: &str) -> Result<GeneratedCode> {
        let raw_response = self.generator.generate(prompt).await?;
        let body = sanitize(&raw_response);
        let structured = body.is_structured();

        info!(structured, "Sanitized model response");

        Ok(GeneratedCode {
            raw_response,
            code: body.into_code(),
            structured,
        })
    }

    /// Run the full prompt-to-video pipeline.
    ///
    /// Generator errors are returned; everything after validation ends in a
    /// [`RunOutcome`].
    #[instrument(skip(self))]
    pub async fn generate_video(&self, prompt: &str) -> Result<RunOutcome> {
        let generated = self.generate_code(prompt).await?;

        if !self.check.is_plausible(&generated.code) {
            warn!("Model output does not look like scene code");
            return Ok(RunOutcome::Rejected {
                raw_response: generated.raw_response,
                code: generated.code,
            });
        }

        let run_id = RunId::reserve(&self.scripts_dir, &self.output_dir);
        info!(run_id = %run_id, stage = %RenderStage::Idle, "Starting render");

        let outcome = match self.render_stage(&generated.code, &run_id).await {
            Ok(RenderOutcome::Rendered { video, output }) => RunOutcome::Rendered {
                run_id: run_id.to_string(),
                video,
                output,
            },
            Ok(RenderOutcome::Failed { status, output }) => RunOutcome::RenderFailed {
                run_id: run_id.to_string(),
                status,
                output,
            },
            Ok(RenderOutcome::ArtifactMissing { output }) => RunOutcome::ArtifactMissing {
                run_id: run_id.to_string(),
                output,
            },
            Err(e) => {
                let chain = error_chain(&e);
                error!(run_id = %run_id, error = ?e, "Render stage failed: {}", chain);
                RunOutcome::Failed {
                    run_id: run_id.to_string(),
                    error: chain,
                }
            }
        };

        Ok(outcome)
    }

    async fn render_stage(&self, code: &str, run_id: &RunId) -> Result<RenderOutcome> {
        tokio::fs::create_dir_all(&self.scripts_dir).await?;
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let script = ScriptGuard::new(self.scripts_dir.join(run_id.script_name()));
        self.template.write_script(code, script.path())?;
        info!(stage = %RenderStage::ScriptWritten, "Wrote {}", script.path().display());

        let destination = self.output_dir.join(run_id.output_name());
        let outcome = self
            .invoker
            .render(script.path(), &run_id.output_name(), &destination)
            .await?;

        info!(run_id = %run_id, stage = %outcome.stage(), "Render finished");
        Ok(outcome)
    }
}

/// Render an error and its sources as one line.
fn error_chain(e: &dyn std::error::Error) -> String {
    let mut out = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        out.push_str(": ");
        out.push_str(&s.to_string());
        source = s.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderSettings;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a fixed answer.
    struct CannedGenerator {
        answer: String,
        calls: AtomicUsize,
    }

    impl CannedGenerator {
        fn new(answer: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: answer.to_string(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CodeGenerator for CannedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer.clone())
        }
    }

    struct Workspace {
        _dir: tempfile::TempDir,
        root: PathBuf,
        settings: Settings,
    }

    impl Workspace {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let root = dir.path().to_path_buf();
            let mut settings = Settings::default();
            settings.general.scripts_dir = root.join("scripts").display().to_string();
            settings.general.output_dir = root.join("videos").display().to_string();
            settings.render.media_dir = root.join("media").display().to_string();
            Self {
                _dir: dir,
                root,
                settings,
            }
        }

        fn files_in(&self, sub: &str) -> Vec<String> {
            match std::fs::read_dir(self.root.join(sub)) {
                Ok(entries) => entries
                    .flatten()
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect(),
                Err(_) => Vec::new(),
            }
        }

        /// Install a shell script standing in for the renderer.
        #[cfg(unix)]
        fn fake_renderer(&mut self, body: &str) {
            use std::os::unix::fs::PermissionsExt;

            let path = self.root.join("fake-manim");
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            self.settings.render.command = path.display().to_string();
        }
    }

    // Arguments: $1 quality, $2 script, $3 scene, $5 media dir, $7 output name
    #[cfg(unix)]
    const RENDER_OK: &str = r#"test -f "$2" || exit 3
grep -q "class $3(Scene)" "$2" || exit 4
mkdir -p "$5/videos/scene/480p15"
echo fake-video > "$5/videos/scene/480p15/$7"
echo "File ready""#;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_red_circle_renders_and_cleans_up() {
        let mut ws = Workspace::new();
        ws.fake_renderer(RENDER_OK);

        let generator =
            CannedGenerator::new("Here it is:\n```python\nself.play(Create(Circle()))\n```");
        let pipeline = Pipeline::new(&ws.settings, generator.clone());

        let outcome = pipeline.generate_video("draw a red circle").await.unwrap();
        let RunOutcome::Rendered { run_id, video, output } = outcome else {
            panic!("expected a rendered video, got {outcome:?}");
        };

        assert_eq!(video, ws.root.join("videos").join(format!("output_{run_id}.mp4")));
        assert_eq!(std::fs::read_to_string(&video).unwrap(), "fake-video\n");
        assert!(output.stdout.contains("File ready"));
        assert!(ws.files_in("scripts").is_empty());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);

        let name = video.file_name().unwrap().to_str().unwrap().to_string();
        let stamp = name.trim_start_matches("output_").trim_end_matches(".mp4");
        // Parallel runs in the same second get a numeric suffix
        assert!(stamp.len() >= 15, "{stamp}");
        assert!(stamp[..8].bytes().all(|b| b.is_ascii_digit()));
        assert_eq!(stamp.as_bytes()[8], b'_');
        assert_eq!(stamp, run_id);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_prose_is_rejected_before_rendering() {
        let mut ws = Workspace::new();
        ws.fake_renderer("touch \"$5.invoked\"\nexit 0");

        let answer = "I am not able to help with animations today.";
        let pipeline = Pipeline::new(&ws.settings, CannedGenerator::new(answer));

        let outcome = pipeline.generate_video("draw something").await.unwrap();
        match outcome {
            RunOutcome::Rejected { raw_response, .. } => assert_eq!(raw_response, answer),
            other => panic!("expected rejection, got {other:?}"),
        }

        assert!(ws.files_in("scripts").is_empty());
        assert!(!ws.root.join("media.invoked").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_render_failure_cleans_up() {
        let mut ws = Workspace::new();
        ws.fake_renderer("echo 'NameError: Circl' >&2\nexit 1");

        let pipeline = Pipeline::new(&ws.settings, CannedGenerator::new("self.play(Create(Circl()))"));

        let outcome = pipeline.generate_video("draw a circle").await.unwrap();
        let RunOutcome::RenderFailed { status, output, .. } = outcome else {
            panic!("expected render failure, got {outcome:?}");
        };

        assert_eq!(status, Some(1));
        assert!(output.stderr.contains("NameError"));
        assert!(ws.files_in("scripts").is_empty());
        assert!(ws.files_in("videos").is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_artifact_is_distinct() {
        let mut ws = Workspace::new();
        ws.fake_renderer("mkdir -p \"$5/videos\"\ntouch \"$5/videos/unrelated.mp4\"\nexit 0");

        let pipeline = Pipeline::new(&ws.settings, CannedGenerator::new("self.wait(1)"));

        let outcome = pipeline.generate_video("pause").await.unwrap();
        assert!(matches!(outcome, RunOutcome::ArtifactMissing { .. }), "{outcome:?}");
        assert!(ws.files_in("scripts").is_empty());
    }

    #[tokio::test]
    async fn test_missing_renderer_is_reported_as_failed_run() {
        let mut ws = Workspace::new();
        ws.settings.render = RenderSettings {
            command: "animagen-no-such-renderer".to_string(),
            ..RenderSettings::default()
        };

        let pipeline = Pipeline::new(&ws.settings, CannedGenerator::new("x = 1"));

        let outcome = pipeline.generate_video("anything").await.unwrap();
        let RunOutcome::Failed { error, .. } = outcome else {
            panic!("expected failure, got {outcome:?}");
        };
        assert!(error.contains("animagen-no-such-renderer"));
        assert!(ws.files_in("scripts").is_empty());
    }

    #[tokio::test]
    async fn test_generate_code_isolates_construct() {
        let ws = Workspace::new();
        let answer = "```python\nclass A(Scene):\n    def construct(self):\n        sq = Square()\n        self.add(sq)\n```";
        let pipeline = Pipeline::new(&ws.settings, CannedGenerator::new(answer));

        let generated = pipeline.generate_code("a square").await.unwrap();
        assert!(generated.structured);
        assert_eq!(generated.code, "sq = Square()\nself.add(sq)");
        assert_eq!(generated.raw_response, answer);
    }

    #[test]
    fn test_run_id_names_share_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let run = RunId::reserve_with("20240101_120000", dir.path(), dir.path());
        assert_eq!(run.script_name(), "ai_scene_20240101_120000.py");
        assert_eq!(run.output_name(), "output_20240101_120000.mp4");
    }

    #[test]
    fn test_run_id_avoids_collisions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("output_20240101_130000.mp4"), b"").unwrap();

        let first = RunId::reserve_with("20240101_130000", dir.path(), dir.path());
        assert_eq!(first.as_str(), "20240101_130000_1");

        let second = RunId::reserve_with("20240101_130000", dir.path(), dir.path());
        assert_eq!(second.as_str(), "20240101_130000_2");

        drop(first);
        let third = RunId::reserve_with("20240101_130000", dir.path(), dir.path());
        assert_eq!(third.as_str(), "20240101_130000_1");
    }

    #[test]
    fn test_run_id_released_after_poisoned_lock() {
        let _ = std::thread::spawn(|| {
            let _active = active_runs()
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            panic!("poison the run registry");
        })
        .join();
        assert!(active_runs().is_poisoned());

        let dir = tempfile::tempdir().unwrap();
        drop(RunId::reserve_with("20240101_140000", dir.path(), dir.path()));

        let again = RunId::reserve_with("20240101_140000", dir.path(), dir.path());
        assert_eq!(again.as_str(), "20240101_140000");
    }
}
