//! ONNX Runtime session construction and execution.

use crate::config::InferenceDevice;
use crate::error::{Error, Result};
use ort::execution_providers::{CUDAExecutionProvider, ExecutionProvider};
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Session options shared by every model of a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    /// Execution device.
    pub device: InferenceDevice,
    /// Intra-op threads (0 lets the runtime decide).
    pub intra_threads: usize,
}

/// Initialize the ONNX Runtime environment once per process.
///
/// With dynamic loading the runtime library is located through `ORT_DYLIB_PATH`.
///
/// Returns `false` when an environment was already configured, in which case
/// the existing one keeps being used.
pub fn init_runtime() -> bool {
    let committed = ort::init().with_name(crate::constants::APP_NAME).commit();
    if !committed {
        warn!("ONNX Runtime environment was already configured; keeping the existing one");
    }
    committed
}

/// A loaded ONNX session.
///
/// `Session::run` needs exclusive access, so concurrent scorers queue on the lock.
pub struct OnnxSession {
    session: Mutex<Session>,
}

impl OnnxSession {
    /// Load a model file.
    pub fn load(path: &Path, options: SessionOptions) -> Result<Self> {
        let load_error = |e: &dyn std::fmt::Display| Error::ModelLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        let mut builder = Session::builder()
            .map_err(|e| load_error(&e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| load_error(&e))?;

        if options.intra_threads > 0 {
            builder = builder
                .with_intra_threads(options.intra_threads)
                .map_err(|e| load_error(&e))?;
        }

        builder = match options.device {
            InferenceDevice::Cpu => {
                debug!("Requested device: CPU");
                builder
            }
            InferenceDevice::Auto => {
                debug!("Auto mode: registering CUDA with silent CPU fallback");
                builder
                    .with_execution_providers([CUDAExecutionProvider::default().build()])
                    .map_err(|e| load_error(&e))?
            }
            InferenceDevice::Gpu => {
                if !CUDAExecutionProvider::default().is_available().unwrap_or(false) {
                    warn!("--gpu requested but CUDA is not available, using CPU");
                }
                builder
                    .with_execution_providers([CUDAExecutionProvider::default().build()])
                    .map_err(|e| load_error(&e))?
            }
        };

        let session = builder.commit_from_file(path).map_err(|e| load_error(&e))?;
        info!("Loaded model: {} (device: {})", path.display(), options.device);

        Ok(Self {
            session: Mutex::new(session),
        })
    }

    /// Run the model on one NCHW `f32` input and return the first output.
    pub fn run(&self, shape: [usize; 4], input: Vec<f32>) -> Result<(Vec<i64>, Vec<f32>)> {
        let tensor = Tensor::from_array((shape, input)).map_err(|e| Error::Inference {
            reason: format!("failed to build input tensor: {e}"),
        })?;

        let mut session = self.session.lock().map_err(|_| Error::Inference {
            reason: "model session lock poisoned".to_string(),
        })?;

        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| Error::Inference {
                reason: e.to_string(),
            })?;

        let (dims, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::Inference {
                reason: format!("failed to extract output tensor: {e}"),
            })?;

        Ok((dims.iter().copied().collect(), data.to_vec()))
    }
}

/// Read a labels file: one class name per line, blank lines ignored.
pub fn read_labels(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::LabelsRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_labels_skips_blank_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "deer\n\n muskdeer \nroe\n").unwrap();

        let labels = read_labels(file.path()).unwrap();
        assert_eq!(labels, vec!["deer", "muskdeer", "roe"]);
    }

    #[test]
    fn test_init_runtime_reports_repeat_configuration() {
        // The first call may already have happened in another test
        init_runtime();
        assert!(!init_runtime());
    }

    #[test]
    fn test_read_labels_missing_file() {
        let result = read_labels(Path::new("/nonexistent/labels.txt"));
        assert!(matches!(result, Err(Error::LabelsRead { .. })));
    }
}
