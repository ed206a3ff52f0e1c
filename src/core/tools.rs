// src/core/tools.rs
//! External document tools behind capability traits.
//!
//! - `TextExtractor`: page bytes → layout-preserving text (`pdftotext -layout`)
//! - `Rasterizer`: page bytes → PNG of the first page (`pdftoppm -png`)
//! - `Recognizer`: PNG bytes → recognized text (`tesseract`)
//!
//! All three run as subprocesses fed through stdin and read from stdout. Every run
//! is bounded by a timeout and the caller's cancel token; an overdue child is killed.

use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::ToolOptions;
use crate::core::cancel::CancelToken;
use crate::error::{MenuError, Result};

const POLL: Duration = Duration::from_millis(20);

pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, pdf: &[u8], cancel: &CancelToken) -> Result<String>;
}

pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, pdf: &[u8], cancel: &CancelToken) -> Result<Vec<u8>>;
}

pub trait Recognizer: Send + Sync {
    fn recognize(&self, png: &[u8], cancel: &CancelToken) -> Result<String>;
}

/// poppler-utils: `pdftotext` and `pdftoppm`.
pub struct Poppler {
    pdftotext: String,
    pdftoppm: String,
    timeout: Duration,
}

impl Poppler {
    pub fn new(opts: &ToolOptions) -> Self {
        Self {
            pdftotext: opts.pdftotext.clone(),
            pdftoppm: opts.pdftoppm.clone(),
            timeout: opts.timeout,
        }
    }
}

impl TextExtractor for Poppler {
    fn extract_text(&self, pdf: &[u8], cancel: &CancelToken) -> Result<String> {
        let out = run_tool(&self.pdftotext, &["-layout", "-", "-"], pdf, self.timeout, cancel)?;
        if out.is_empty() {
            return Err(MenuError::tool(&self.pdftotext, "produced no text"));
        }
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

impl Rasterizer for Poppler {
    fn rasterize(&self, pdf: &[u8], cancel: &CancelToken) -> Result<Vec<u8>> {
        // first page only, so stdout carries exactly one PNG
        let out = run_tool(&self.pdftoppm, &["-png", "-f", "1", "-l", "1"], pdf, self.timeout, cancel)?;
        if out.is_empty() {
            return Err(MenuError::tool(&self.pdftoppm, "produced no image"));
        }
        Ok(out)
    }
}

pub struct Tesseract {
    binary: String,
    language: String,
    timeout: Duration,
}

impl Tesseract {
    pub fn new(opts: &ToolOptions) -> Self {
        Self {
            binary: opts.tesseract.clone(),
            language: opts.ocr_language.clone(),
            timeout: opts.timeout,
        }
    }
}

impl Recognizer for Tesseract {
    fn recognize(&self, png: &[u8], cancel: &CancelToken) -> Result<String> {
        let args = ["stdin", "stdout", "-l", self.language.as_str()];
        let out = run_tool(&self.binary, &args, png, self.timeout, cancel)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

/// Run `program args…` with `input` on stdin and return stdout.
///
/// Fails with `ExternalTool` on spawn failure, non-zero exit (stderr included)
/// or timeout, and with `Cancelled` if the token fires first.
pub fn run_tool(
    program: &str,
    args: &[&str],
    input: &[u8],
    timeout: Duration,
    cancel: &CancelToken,
) -> Result<Vec<u8>> {
    cancel.check()?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| MenuError::tool(program, format!("start failed: {e}")))?;

    let status = thread::scope(|scope| {
        let stdin = child.stdin.take();
        let writer = scope.spawn(move || -> std::io::Result<()> {
            if let Some(mut stdin) = stdin {
                stdin.write_all(input)?;
            }
            Ok(())
        });
        let stdout = drain(scope, child.stdout.take());
        let stderr = drain(scope, child.stderr.take());

        let status = wait(&mut child, program, timeout, cancel);

        // a killed child closes its pipes, so the helpers always finish
        let wrote = writer.join().unwrap_or(Ok(()));
        let out = stdout.join().unwrap_or_default();
        let err = stderr.join().unwrap_or_default();
        status.map(|s| (s, wrote, out, err))
    });

    let (status, wrote, out, err) = status?;
    if !status.success() {
        let stderr = String::from_utf8_lossy(&err);
        return Err(MenuError::tool(program, format!("{status}: {}", stderr.trim())));
    }
    if let Err(e) = wrote {
        return Err(MenuError::tool(program, format!("error copying to stdin: {e}")));
    }
    Ok(out)
}

fn drain<'scope, R>(
    scope: &'scope thread::Scope<'scope, '_>,
    pipe: Option<R>,
) -> thread::ScopedJoinHandle<'scope, Vec<u8>>
where
    R: Read + Send + 'scope,
{
    scope.spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

fn wait(child: &mut Child, program: &str, timeout: Duration, cancel: &CancelToken) -> Result<ExitStatus> {
    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {}
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(MenuError::tool(program, format!("wait failed: {e}")));
            }
        }

        let overdue = started.elapsed() >= timeout;
        if overdue || cancel.is_cancelled() {
            let _ = child.kill();
            let _ = child.wait();
            return Err(if overdue {
                MenuError::tool(program, format!("timed out after {timeout:?}"))
            } else {
                MenuError::Cancelled
            });
        }
        thread::sleep(POLL);
    }
}
