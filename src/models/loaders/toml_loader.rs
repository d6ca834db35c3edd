use crate::error::{AppError, AppResult, FileError};
use crate::models::job::BulkJob;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 TOML 文件加载批量任务
pub async fn load_job_file(toml_file_path: &Path) -> AppResult<BulkJob> {
    let path_display = toml_file_path.display().to_string();

    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|e| AppError::file_read_failed(&path_display, e))?;

    let mut job: BulkJob = toml::from_str(&content).map_err(|source| FileError::TomlParseFailed {
        path: path_display.clone(),
        source,
    })?;

    // 设置文件路径
    job.file_path = Some(toml_file_path.to_string_lossy().to_string());

    Ok(job)
}

/// 从文件夹中加载所有 TOML 任务文件，按文件名排序
///
/// 单个文件解析失败只记录警告，不影响其他文件
pub async fn load_all_job_files(folder_path: &str) -> AppResult<Vec<BulkJob>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        return Err(FileError::DirectoryNotFound {
            path: folder_path.to_string(),
        }
        .into());
    }

    let mut toml_files = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml_files.push(path);
        }
    }
    toml_files.sort();

    let mut jobs = Vec::new();
    for path in toml_files {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_job_file(&path).await {
            Ok(job) => {
                tracing::info!("成功加载 {} 个条目 (动作: {})", job.items.len(), job.verb);
                jobs.push(job);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {}", path.display(), e);
            }
        }
    }

    Ok(jobs)
}
