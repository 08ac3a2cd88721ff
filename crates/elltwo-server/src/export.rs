use std::path::Path;

use elltwo_core::ExportFormat;
use elltwo_core::protocol::ExportRequest;
use tracing::info;

use crate::error::ExportError;

/// Document file name without a trailing `.md`.
pub fn base_name(document: &Path) -> String {
    let name = document
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.strip_suffix(".md") {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => name,
    }
}

/// Write an export payload to `<export_dir>/<base>.<ext>` and return the
/// location relative to `export_dir`.
pub async fn write_export(
    export_dir: &Path,
    document: &Path,
    request: &ExportRequest,
) -> Result<String, ExportError> {
    if request.format == ExportFormat::Pdf {
        return Err(ExportError::Unsupported {
            format: request.format,
        });
    }

    let location = format!("{}.{}", base_name(document), request.format.extension());
    let target = export_dir.join(&location);

    tokio::fs::create_dir_all(export_dir)
        .await
        .map_err(|source| ExportError::Write {
            path: export_dir.to_path_buf(),
            source,
        })?;
    tokio::fs::write(&target, &request.data)
        .await
        .map_err(|source| ExportError::Write {
            path: target.clone(),
            source,
        })?;

    info!(
        format = request.format.as_str(),
        path = %target.display(),
        deps = request.deps.as_ref().map_or(0, Vec::len),
        "exported document"
    );
    Ok(location)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(format: ExportFormat, data: &str) -> ExportRequest {
        ExportRequest {
            format,
            data: data.to_string(),
            deps: None,
        }
    }

    #[test]
    fn base_name_drops_markdown_suffix() {
        assert_eq!(base_name(Path::new("notes/paper.md")), "paper");
        assert_eq!(base_name(Path::new("README")), "README");
        assert_eq!(base_name(Path::new(".md")), ".md");
    }

    #[tokio::test]
    async fn writes_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let export_dir = dir.path().join("export");

        let location = write_export(
            &export_dir,
            Path::new("notes/paper.md"),
            &request(ExportFormat::Latex, "\\section{A}"),
        )
        .await
        .unwrap();
        assert_eq!(location, "paper.tex");
        assert_eq!(
            std::fs::read_to_string(export_dir.join("paper.tex")).unwrap(),
            "\\section{A}"
        );
    }

    #[tokio::test]
    async fn pdf_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_export(dir.path(), Path::new("a.md"), &request(ExportFormat::Pdf, ""))
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::Unsupported { .. }));
    }
}
