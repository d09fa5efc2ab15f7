use crate::error::{Error, Result};
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Stream `response` into `dest` through a temporary file in the same directory.
///
/// The temporary file is deleted on every error path, so `dest` either holds
/// the complete body or is left untouched.
pub async fn download_to(response: reqwest::Response, name: &str, dest: &Path) -> Result<u64> {
    tracing::info!("Downloading {}...", name);

    let url = response.url().to_string();
    let expected = response.content_length();
    let parent = dest.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let pb = ProgressBar::new(expected.unwrap_or(0));
    if let Ok(style) = ProgressStyle::default_bar()
        .template(concat!(
            "{msg} {spinner:.green} [{elapsed_precise}] ",
            "[{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})"
        ))
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(format!("Downloading {}", name));

    let mut tmp = NamedTempFile::new_in(parent)?;
    let mut received = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                pb.abandon_with_message("Download failed");
                return Err(e.into());
            }
        };
        tmp.write_all(&chunk)?;
        received += chunk.len() as u64;
        pb.set_position(received);
    }

    if let Some(expected) = expected {
        if received != expected {
            pb.abandon_with_message("Download incomplete");
            return Err(Error::IncompleteDownload {
                url,
                expected,
                received,
            });
        }
    }

    tmp.as_file().sync_all()?;

    if dest.exists() {
        fs::remove_file(dest)?;
    }
    tmp.persist(dest).map_err(|e| Error::Io(e.error))?;

    pb.finish_with_message("Download complete");
    tracing::debug!("Wrote {} bytes to {}", received, dest.display());
    Ok(received)
}
