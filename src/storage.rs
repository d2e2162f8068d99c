use crate::errors::BinderError;
use crate::page::Page;
use std::{env, io, path::Path, path::PathBuf};
use tokio::fs;

pub fn resolve_page_path() -> PathBuf {
    match env::var("PAGE_PATH") {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => PathBuf::from("data/page.json"),
    }
}

pub async fn load_page(path: &Path) -> Result<Page, BinderError> {
    let bytes = fs::read(path).await?;
    serde_json::from_slice(&bytes)
        .map_err(|err| BinderError::Io(io::Error::new(io::ErrorKind::InvalidData, err)))
}

pub async fn persist_page(path: &Path, page: &Page) -> Result<(), BinderError> {
    let payload = serde_json::to_vec_pretty(page)
        .map_err(|err| BinderError::Io(io::Error::new(io::ErrorKind::InvalidData, err)))?;
    fs::write(path, payload).await?;
    Ok(())
}
