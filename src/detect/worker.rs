//! Models hosted in external worker processes.
//!
//! Each model runs in its own long-lived process. Spawning the process is
//! the "load" step (the worker reads its weights once at startup); after
//! that the worker answers one JSON request per line on stdin with one JSON
//! reply per line on stdout:
//!
//! | model      | request               | reply                                                        |
//! |------------|-----------------------|--------------------------------------------------------------|
//! | joint      | `{"image": "<path>"}` | `{"regions": [{"points": [[x,y],..4], "text": "..", "confidence": 0.9}]}` |
//! | detector   | `{"image": "<path>"}` | `{"boxes": [[x1, y1, x2, y2], ...]}`                         |
//! | recognizer | `{"image": "<path>"}` | `{"text": "..."}`                                            |
//!
//! Any worker may instead reply `{"error": "..."}`. Recognizer requests
//! point at a PNG crop written to a private temporary file.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::{Mutex, PoisonError};

use image::{DynamicImage, ImageFormat};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::config::{EngineConfig, WorkerCommand};
use super::provider::{
    JointReader, JointRegion, ModelKind, ModelProvider, TextDetector, TextRecognizer,
};
use crate::error::OcrLabelError;
use crate::geometry::{Corners, Quad};

/// A [`ModelProvider`] that spawns the worker processes named in an
/// [`EngineConfig`].
#[derive(Clone, Debug, Default)]
pub struct WorkerProvider {
    config: EngineConfig,
}

impl WorkerProvider {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    fn spawn(&self, kind: ModelKind) -> Result<WorkerProcess, OcrLabelError> {
        let command = self
            .config
            .command(kind)
            .ok_or_else(|| OcrLabelError::ModelLoad {
                model: kind.name(),
                message: "no worker command configured".to_string(),
            })?;
        WorkerProcess::spawn(kind, command)
    }
}

impl ModelProvider for WorkerProvider {
    fn load_joint(&self) -> Result<Box<dyn JointReader>, OcrLabelError> {
        Ok(Box::new(WorkerJointReader(self.spawn(ModelKind::Joint)?)))
    }

    fn load_detector(&self) -> Result<Box<dyn TextDetector>, OcrLabelError> {
        Ok(Box::new(WorkerDetector(self.spawn(ModelKind::Detector)?)))
    }

    fn load_recognizer(&self) -> Result<Box<dyn TextRecognizer>, OcrLabelError> {
        Ok(Box::new(WorkerRecognizer(self.spawn(ModelKind::Recognizer)?)))
    }
}

struct WorkerPipes {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// A running worker. Requests are serialized through the mutex, so one
/// worker serves one request at a time.
struct WorkerProcess {
    kind: ModelKind,
    pipes: Mutex<WorkerPipes>,
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    image: &'a Path,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WorkerReply<T> {
    Failed { error: String },
    Ok(T),
}

impl WorkerProcess {
    fn spawn(kind: ModelKind, command: &WorkerCommand) -> Result<Self, OcrLabelError> {
        let mut process = Command::new(&command.program);
        process
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        if let Some(dir) = &command.working_dir {
            process.current_dir(dir);
        }

        let load_error = |message: String| OcrLabelError::ModelLoad {
            model: kind.name(),
            message,
        };

        let mut child = process
            .spawn()
            .map_err(|err| load_error(format!("failed to spawn '{}': {err}", command.program)))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| load_error("worker stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| load_error("worker stdout unavailable".to_string()))?;

        tracing::info!(model = %kind, program = %command.program, pid = child.id(), "spawned worker");

        Ok(Self {
            kind,
            pipes: Mutex::new(WorkerPipes {
                child,
                stdin,
                stdout: BufReader::new(stdout),
            }),
        })
    }

    fn request<T: DeserializeOwned>(&self, image: &Path) -> Result<T, OcrLabelError> {
        let mut line = serde_json::to_string(&ImageRequest { image })
            .map_err(|err| self.inference_error(err.to_string()))?;
        line.push('\n');

        let mut guard = self.pipes.lock().unwrap_or_else(PoisonError::into_inner);
        let pipes = &mut *guard;
        pipes
            .stdin
            .write_all(line.as_bytes())
            .map_err(|err| self.inference_error(format!("failed to send request: {err}")))?;
        pipes
            .stdin
            .flush()
            .map_err(|err| self.inference_error(format!("failed to send request: {err}")))?;

        let mut reply = String::new();
        let read = pipes
            .stdout
            .read_line(&mut reply)
            .map_err(|err| self.inference_error(format!("failed to read reply: {err}")))?;
        if read == 0 {
            return Err(self.inference_error("worker exited before replying".to_string()));
        }

        match serde_json::from_str::<WorkerReply<T>>(reply.trim_end()) {
            Ok(WorkerReply::Ok(value)) => Ok(value),
            Ok(WorkerReply::Failed { error }) => Err(self.inference_error(error)),
            Err(err) => Err(self.inference_error(format!("malformed reply: {err}"))),
        }
    }

    fn inference_error(&self, message: String) -> OcrLabelError {
        OcrLabelError::Inference {
            model: self.kind.name(),
            message,
        }
    }
}

impl Drop for WorkerProcess {
    fn drop(&mut self) {
        let pipes = self.pipes.get_mut().unwrap_or_else(PoisonError::into_inner);
        // Already-exited workers make kill fail; that is fine.
        let _ = pipes.child.kill();
        let _ = pipes.child.wait();
    }
}

struct WorkerJointReader(WorkerProcess);

#[derive(Deserialize)]
struct JointReply {
    regions: Vec<WireRegion>,
}

#[derive(Deserialize)]
struct WireRegion {
    points: Quad,
    text: String,
    #[serde(default)]
    confidence: Option<f64>,
}

impl JointReader for WorkerJointReader {
    fn read_text(&self, image_path: &Path) -> Result<Vec<JointRegion>, OcrLabelError> {
        let reply: JointReply = self.0.request(image_path)?;
        Ok(reply
            .regions
            .into_iter()
            .map(|region| JointRegion {
                points: region.points,
                text: region.text,
                confidence: region.confidence,
            })
            .collect())
    }
}

struct WorkerDetector(WorkerProcess);

#[derive(Deserialize)]
struct DetectorReply {
    boxes: Vec<Corners>,
}

impl TextDetector for WorkerDetector {
    fn detect(&self, image_path: &Path) -> Result<Vec<Corners>, OcrLabelError> {
        let reply: DetectorReply = self.0.request(image_path)?;
        Ok(reply.boxes)
    }
}

struct WorkerRecognizer(WorkerProcess);

#[derive(Deserialize)]
struct RecognizerReply {
    text: String,
}

impl TextRecognizer for WorkerRecognizer {
    fn recognize(&self, region: &DynamicImage) -> Result<String, OcrLabelError> {
        let crop = tempfile::Builder::new()
            .prefix("ocrlabel-crop-")
            .suffix(".png")
            .tempfile()?;
        region
            .save_with_format(crop.path(), ImageFormat::Png)
            .map_err(|err| self.0.inference_error(format!("failed to write crop: {err}")))?;

        let reply: RecognizerReply = self.0.request(crop.path())?;
        Ok(reply.text)
    }
}
