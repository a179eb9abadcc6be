//! Locating the Tesseract executable and its trained data.
//!
//! The executable must be installed (locally next to our data, on `PATH`, or in
//! a common install location). Trained data is downloaded into the local
//! data directory when no installed copy can be found.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";

#[cfg(windows)]
const EXECUTABLE_NAME: &str = "tesseract.exe";
#[cfg(not(windows))]
const EXECUTABLE_NAME: &str = "tesseract";

#[cfg(windows)]
const COMMON_EXECUTABLES: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
];
#[cfg(not(windows))]
const COMMON_EXECUTABLES: &[&str] = &[
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
];

#[cfg(windows)]
const COMMON_TESSDATA: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tessdata",
    r"C:\Program Files (x86)\Tesseract-OCR\tessdata",
];
#[cfg(not(windows))]
const COMMON_TESSDATA: &[&str] = &[
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
    "/opt/homebrew/share/tessdata",
];

#[derive(Clone, Debug)]
pub struct TesseractPaths {
    pub executable: PathBuf,
    pub tessdata: PathBuf,
}

/// Returns the directory for storing Tesseract files
pub fn get_tesseract_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rank-capture")
        .join("tesseract")
}

/// Finds Tesseract and makes sure trained data for `language` is available.
pub fn ensure_tesseract(language: &str) -> Result<TesseractPaths> {
    let executable = find_tesseract_executable()?;

    let tessdata = match find_tessdata_dir(language) {
        Some(dir) => dir,
        None => {
            let local = get_tesseract_dir().join("tessdata");
            download_tessdata(&local, language)?;
            local
        }
    };

    log::info!(
        "Tesseract ready: {} (tessdata: {})",
        executable.display(),
        tessdata.display()
    );
    Ok(TesseractPaths {
        executable,
        tessdata,
    })
}

/// Finds the Tesseract executable, checking our local dir first, then system
pub fn find_tesseract_executable() -> Result<PathBuf> {
    let local_exe = get_tesseract_dir().join(EXECUTABLE_NAME);
    if local_exe.exists() {
        return Ok(local_exe);
    }

    // Check PATH
    if let Ok(output) = Command::new("tesseract").arg("--version").output() {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    COMMON_EXECUTABLES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .ok_or_else(|| anyhow!("Tesseract not found. Please install Tesseract-OCR."))
}

/// Finds a directory containing `<language>.traineddata`.
pub fn find_tessdata_dir(language: &str) -> Option<PathBuf> {
    let mut candidates = vec![get_tesseract_dir().join("tessdata")];
    candidates.extend(COMMON_TESSDATA.iter().map(PathBuf::from));

    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let prefix = PathBuf::from(prefix);
        candidates.push(prefix.join("tessdata"));
        candidates.push(prefix);
    }

    first_with_traineddata(&candidates, language)
}

fn first_with_traineddata(candidates: &[PathBuf], language: &str) -> Option<PathBuf> {
    let file = traineddata_file(language);
    candidates.iter().find(|dir| dir.join(&file).exists()).cloned()
}

fn traineddata_file(language: &str) -> String {
    format!("{}.traineddata", language)
}

/// Downloads trained data for `language` into `tessdata_dir`.
fn download_tessdata(tessdata_dir: &Path, language: &str) -> Result<()> {
    let file = traineddata_file(language);
    let url = format!("{}/{}", TESSDATA_REPO, file);
    let target = tessdata_dir.join(&file);

    fs::create_dir_all(tessdata_dir)
        .with_context(|| format!("Failed to create {}", tessdata_dir.display()))?;
    log::info!("Downloading {}...", url);

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client
        .get(&url)
        .header("User-Agent", "rank-capture")
        .send()?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download {}: HTTP {}",
            file,
            response.status()
        ));
    }

    let bytes = response.bytes()?;
    let mut out = fs::File::create(&target)
        .with_context(|| format!("Failed to create {}", target.display()))?;
    out.write_all(&bytes)?;

    log::info!("Downloaded {} ({} bytes)", file, bytes.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_first_with_traineddata_skips_incomplete_dirs() {
        let empty = tempdir().unwrap();
        let full = tempdir().unwrap();
        fs::write(full.path().join("eng.traineddata"), b"data").unwrap();

        let candidates = vec![
            empty.path().to_path_buf(),
            full.path().to_path_buf(),
        ];
        assert_eq!(
            first_with_traineddata(&candidates, "eng"),
            Some(full.path().to_path_buf())
        );
        assert_eq!(first_with_traineddata(&candidates, "fra"), None);
    }

    #[test]
    fn test_tesseract_dir_is_app_specific() {
        let dir = get_tesseract_dir();
        assert!(dir.ends_with("rank-capture/tesseract"));
    }
}
