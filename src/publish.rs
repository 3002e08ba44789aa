//! Artifact naming and upload.
//!
//! Publishing happens after the artifact is finalized. Its failure never invalidates the render:
//! the caller reports it and keeps the local file.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};

use sha2::Digest as _;

use crate::foundation::error::{ReelError, ReelResult};

/// Uploads a finished artifact and returns where it can be fetched.
pub trait Publisher: Send + Sync {
    fn publish(&self, artifact: &Path) -> ReelResult<String>;
}

/// S3 destination read from `AWS_S3_BUCKET`, `AWS_REGION` and `AWS_S3_PREFIX`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct S3Target {
    pub bucket: String,
    pub region: String,
    pub prefix: String,
}

impl S3Target {
    pub const DEFAULT_REGION: &'static str = "us-east-1";

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> ReelResult<Self> {
        let non_empty = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let bucket = non_empty("AWS_S3_BUCKET")
            .ok_or_else(|| ReelError::publish("S3 bucket not configured (set AWS_S3_BUCKET)"))?;
        Ok(Self {
            bucket,
            region: non_empty("AWS_REGION").unwrap_or_else(|| Self::DEFAULT_REGION.to_string()),
            prefix: non_empty("AWS_S3_PREFIX").unwrap_or_default(),
        })
    }

    pub fn object_key(&self, file_name: &str) -> String {
        let prefix = self.prefix.trim_end_matches('/');
        if prefix.is_empty() {
            file_name.to_string()
        } else {
            format!("{prefix}/{file_name}")
        }
    }

    pub fn public_url(&self, key: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{key}",
            self.bucket, self.region
        )
    }
}

/// Uploads through the system `aws` CLI, which resolves credentials the usual way.
#[derive(Clone, Debug)]
pub struct AwsCliPublisher {
    target: S3Target,
    program: PathBuf,
}

impl AwsCliPublisher {
    pub fn new(target: S3Target) -> Self {
        Self {
            target,
            program: PathBuf::from("aws"),
        }
    }

    /// Use a specific `aws` executable.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn target(&self) -> &S3Target {
        &self.target
    }
}

impl Publisher for AwsCliPublisher {
    #[tracing::instrument(level = "info", skip(self), fields(bucket = %self.target.bucket))]
    fn publish(&self, artifact: &Path) -> ReelResult<String> {
        if !artifact.is_file() {
            return Err(ReelError::publish(format!(
                "file not found: {}",
                artifact.display()
            )));
        }
        let file_name = artifact
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ReelError::publish("artifact has no UTF-8 file name"))?;
        let key = self.target.object_key(file_name);

        let out = Command::new(&self.program)
            .args(["s3", "cp"])
            .arg(artifact)
            .arg(format!("s3://{}/{key}", self.target.bucket))
            .args([
                "--region",
                &self.target.region,
                "--content-type",
                "video/mp4",
                "--only-show-errors",
            ])
            .output()
            .map_err(|e| {
                ReelError::publish(format!(
                    "failed to run '{}' (is the AWS CLI installed?): {e}",
                    self.program.display()
                ))
            })?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(ReelError::publish(format!(
                "S3 upload failed ({}): {}",
                out.status,
                stderr.trim()
            )));
        }
        Ok(self.target.public_url(&key))
    }
}

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// [`AwsCliPublisher`] whose target is read from the environment at upload time.
///
/// An unset bucket only fails the upload, after the artifact has been written.
pub struct EnvS3Publisher {
    lookup: EnvLookup,
    program: PathBuf,
}

impl EnvS3Publisher {
    pub fn new() -> Self {
        Self::with_lookup(|k| std::env::var(k).ok())
    }

    pub fn with_lookup(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
            program: PathBuf::from("aws"),
        }
    }

    /// Use a specific `aws` executable.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }
}

impl Default for EnvS3Publisher {
    fn default() -> Self {
        Self::new()
    }
}

impl Publisher for EnvS3Publisher {
    fn publish(&self, artifact: &Path) -> ReelResult<String> {
        let target = S3Target::from_lookup(|k| (self.lookup)(k))?;
        AwsCliPublisher::new(target)
            .with_program(self.program.clone())
            .publish(artifact)
    }
}

static NAME_COUNTER: AtomicU64 = AtomicU64::new(0);

/// `YYYY-MM-DD_HH-MM-SS_<8 hex>.mp4`.
pub fn generate_output_name(now: chrono::DateTime<chrono::Local>) -> String {
    let mut hasher = sha2::Sha256::new();
    hasher.update(std::process::id().to_le_bytes());
    hasher.update(now.timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
    hasher.update(NAME_COUNTER.fetch_add(1, Ordering::Relaxed).to_le_bytes());
    let digest = hasher.finalize();
    let suffix: String = digest[..4].iter().map(|b| format!("{b:02x}")).collect();
    format!("{}_{suffix}.mp4", now.format("%Y-%m-%d_%H-%M-%S"))
}

/// Where the artifact goes: a generated name under `output_dir`, or `requested` (relative
/// names are placed under `output_dir`, `.mp4` is appended when missing).
pub fn resolve_output_path(output_dir: &Path, requested: Option<&Path>) -> PathBuf {
    let Some(requested) = requested else {
        return output_dir.join(generate_output_name(chrono::Local::now()));
    };
    let mut path = if requested.is_absolute() {
        requested.to_path_buf()
    } else {
        output_dir.join(requested)
    };
    if path.extension().is_none() {
        path.set_extension("mp4");
    }
    path
}

#[cfg(test)]
#[path = "../tests/unit/publish.rs"]
mod tests;
