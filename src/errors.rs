//! Errores tipados del dominio.
//!
//! Los adaptadores externos absorben sus propios fallos; sólo el almacén de
//! conocimiento puede hacer fracasar una consulta.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Base de conocimiento no disponible: {0}")]
    Unavailable(String),

    #[error("Entrada inválida: {0}")]
    InvalidInput(String),

    #[error("Error de serialización de metadatos: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("El modelo no respondió en {0:?}")]
    Timeout(Duration),

    #[error("Error del proveedor LLM: {0}")]
    Provider(String),

    #[error("El modelo devolvió una respuesta vacía")]
    EmptyResponse,
}

#[derive(Error, Debug)]
pub enum ResearchError {
    #[error("La pregunta está vacía")]
    EmptyQuestion,

    #[error(transparent)]
    Store(#[from] StoreError),
}
