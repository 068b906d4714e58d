//! Mindmap directory importer.
//!
//! Layout on disk: each immediate subdirectory of the mindmap root is a
//! module, and the `.md` files inside it are that module's documents. A
//! module directory with no markdown files is still recorded, as a
//! module-only row.
//!
//! Importing replaces the whole table: clear, then insert in sorted order.

use crate::store::DocumentStore;
use anyhow::Context;
use std::path::Path;
use walkdir::WalkDir;

/// Result of a completed import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    /// Total rows written.
    pub total: usize,
    /// Rows with document content.
    pub with_content: usize,
    /// Module-only rows.
    pub empty_modules: usize,
    /// Modules encountered, sorted.
    pub modules: Vec<String>,
}

/// A scanned document file.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub file_name: String,
    pub file_path: String,
    pub content: String,
}

/// A scanned module directory and its markdown files.
#[derive(Debug, Clone)]
pub struct ScannedModule {
    pub module: String,
    pub files: Vec<ScannedFile>,
}

/// Scan the mindmap root directory.
///
/// Hidden directories are skipped; modules and files come back sorted.
pub fn scan_mindmap_dir(root: &Path) -> anyhow::Result<Vec<ScannedModule>> {
    if !root.is_dir() {
        anyhow::bail!("mindmap directory does not exist: {}", root.display());
    }

    let mut modules = Vec::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let module = entry.file_name().to_string_lossy().to_string();
        if module.starts_with('.') {
            continue;
        }

        let mut files = Vec::new();
        for file_entry in WalkDir::new(entry.path())
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let file_entry = file_entry?;
            let path = file_entry.path();
            if !file_entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some("md")
            {
                continue;
            }

            let file_name = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let file_path = path
                .canonicalize()
                .unwrap_or_else(|_| path.to_path_buf())
                .to_string_lossy()
                .to_string();

            files.push(ScannedFile {
                file_name,
                file_path,
                content,
            });
        }

        modules.push(ScannedModule { module, files });
    }

    Ok(modules)
}

/// Clear the store and import everything under the mindmap root.
pub async fn import_dir(store: &DocumentStore, root: &Path) -> anyhow::Result<ImportSummary> {
    let scanned = scan_mindmap_dir(root)?;
    tracing::info!(root = %root.display(), modules = scanned.len(), "Importing mindmap directory");

    store.clear().await?;

    let mut total = 0;
    let mut with_content = 0;
    let mut empty_modules = 0;
    let mut modules = Vec::with_capacity(scanned.len());

    for module in &scanned {
        if module.files.is_empty() {
            store.insert(&module.module, None, None, None).await?;
            total += 1;
            empty_modules += 1;
            tracing::debug!(module = %module.module, "Imported empty module");
        } else {
            for file in &module.files {
                store
                    .insert(
                        &module.module,
                        Some(&file.file_name),
                        Some(&file.content),
                        Some(&file.file_path),
                    )
                    .await?;
                total += 1;
                with_content += 1;
                tracing::debug!(module = %module.module, file = %file.file_name, "Imported document");
            }
        }
        modules.push(module.module.clone());
    }

    let summary = ImportSummary {
        total,
        with_content,
        empty_modules,
        modules,
    };
    tracing::info!(
        total = summary.total,
        with_content = summary.with_content,
        empty_modules = summary.empty_modules,
        "Import complete"
    );
    Ok(summary)
}
