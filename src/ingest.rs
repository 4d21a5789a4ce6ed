//! Ingesta de ficheros propios en la base de conocimiento: cada fichero de
//! texto o PDF pasa a ser un documento con metadatos `source: custom`.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use mime_guess::MimeGuess;
use tracing::{error, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::{
    app_state::{lock, Status},
    errors::StoreError,
    models::Metadata,
    report,
    vector_store::KnowledgeStore,
};

/// Resumen de los resultados de una operación de ingesta.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct IngestionSummary {
    pub files_scanned: u32,
    pub files_ingested: u32,
    pub files_skipped: u32,
}

impl std::fmt::Display for IngestionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Resumen: {} ficheros escaneados, {} ingeridos, {} omitidos.",
            self.files_scanned, self.files_ingested, self.files_skipped
        )
    }
}

/// Recorre las rutas (ficheros o directorios, recursivamente) y guarda cada
/// fichero soportado como un documento. Los fallos de un fichero se cuentan
/// como omitidos; la ingesta sigue con el resto.
pub async fn ingest_paths(
    store: &dyn KnowledgeStore,
    paths: &[PathBuf],
    status_arc: Arc<Mutex<Status>>,
) -> IngestionSummary {
    let mut summary = IngestionSummary::default();
    let mut files = Vec::new();
    for root in paths {
        if !root.exists() {
            warn!("La ruta no existe: {}", root.display());
            summary.files_skipped += 1;
            continue;
        }
        files.extend(
            WalkDir::new(root)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path()),
        );
    }

    let total_files = files.len() as f32;

    for (index, path) in files.iter().enumerate() {
        summary.files_scanned += 1;
        let filename = path.file_name().unwrap_or_default().to_string_lossy();
        let progress = (index + 1) as f32 / total_files;

        {
            let mut status = lock(&status_arc);
            status.message = format!(
                "[{}/{}] Procesando: {}...",
                index + 1,
                total_files as u32,
                filename
            );
            status.progress = progress;
        }

        match ingest_file(store, path).await {
            Ok(Some(id)) => {
                summary.files_ingested += 1;
                info!("Ingerido {} como {id}.", path.display());
            }
            Ok(None) => summary.files_skipped += 1,
            Err(err) => {
                summary.files_skipped += 1;
                error!("Error ingiriendo {}: {err}", path.display());
                lock(&status_arc).message = format!("ERROR en {}: {}", path.display(), err);
            }
        }
    }

    summary
}

/// Devuelve el id del documento creado, o `None` si el fichero no es
/// soportado o no tiene texto.
async fn ingest_file(store: &dyn KnowledgeStore, path: &Path) -> Result<Option<String>, StoreError> {
    let Some(text) = read_text(path) else {
        return Ok(None);
    };
    if text.trim().is_empty() {
        warn!("Fichero vacío o sin texto útil: {}", path.display());
        return Ok(None);
    }

    let filename = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string());
    let metadata = custom_metadata(&filename);
    let id = format!("file_{}", Uuid::new_v4().simple());

    let ids = store
        .add_documents(&[text], Some(&[metadata][..]), Some(&[id][..]))
        .await?;
    Ok(ids.into_iter().next())
}

fn read_text(path: &Path) -> Option<String> {
    let extension = path
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("")
        .to_lowercase();

    if extension == "pdf" {
        return match pdf_extract::extract_text(path) {
            Ok(content) => Some(content),
            Err(e) => {
                warn!("No se pudo extraer texto del PDF {}: {}. Saltando fichero.", path.display(), e);
                None
            }
        };
    }

    let is_text = matches!(extension.as_str(), "txt" | "md")
        || MimeGuess::from_path(path)
            .first()
            .is_some_and(|m| m.type_().as_str() == "text");
    if !is_text {
        info!("Saltando fichero con extensión no soportada ('.{}'): {}", extension, path.display());
        return None;
    }

    match fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(_) => {
            warn!("Saltando fichero no-texto o no-UTF8: {}", path.display());
            None
        }
    }
}

pub fn custom_metadata(filename: &str) -> Metadata {
    Metadata::from([
        ("source".to_string(), "custom".to_string()),
        ("filename".to_string(), filename.to_string()),
        ("type".to_string(), "document".to_string()),
        ("added_date".to_string(), report::today().to_string()),
    ])
}
