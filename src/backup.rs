//! Respaldo del archivo original antes de cualquier operación destructiva.
//!
//! La política es deliberadamente blanda: si el respaldo falla se registra una
//! advertencia y la limpieza continúa. El fallo llega al llamador como
//! [`BackupStatus::Failed`] para que quede visible en el resultado.

use chrono::{DateTime, Local};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const BACKUP_SUFFIX: &str = ".backup";

/// Respaldo creado junto al original. Nunca se elimina automáticamente.
#[derive(Clone, Debug, Serialize)]
pub struct BackupRecord {
    pub original: PathBuf,
    pub backup: PathBuf,
    pub created_at: DateTime<Local>,
    pub sha256: String,
}

#[derive(Clone, Debug)]
pub enum BackupStatus {
    Skipped,
    Created(BackupRecord),
    Failed(String),
}

impl BackupStatus {
    pub fn record(&self) -> Option<&BackupRecord> {
        match self {
            BackupStatus::Created(record) => Some(record),
            _ => None,
        }
    }
}

/// Ruta del respaldo: el nombre completo del original más `.backup`.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_os_string();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Copia `path` a `<path>.backup` cuando `enabled` es verdadero.
///
/// Un respaldo previo con el mismo nombre se sobrescribe sin aviso.
pub fn maybe_backup(path: &Path, enabled: bool) -> BackupStatus {
    if !enabled {
        return BackupStatus::Skipped;
    }

    let target = backup_path(path);
    match create_backup(path, &target) {
        Ok(record) => {
            info!(original = %path.display(), backup = %target.display(), "respaldo creado");
            BackupStatus::Created(record)
        }
        Err(error) => {
            warn!(original = %path.display(), %error, "no se pudo crear el respaldo; se continúa sin él");
            BackupStatus::Failed(format!(
                "no se pudo crear el respaldo `{}`: {error}",
                target.display()
            ))
        }
    }
}

fn create_backup(path: &Path, target: &Path) -> io::Result<BackupRecord> {
    fs::copy(path, target)?;
    // El respaldo debe estar en disco antes de que empiece la limpieza.
    File::open(target)?.sync_all()?;

    Ok(BackupRecord {
        original: path.to_path_buf(),
        backup: target.to_path_buf(),
        created_at: Local::now(),
        sha256: sha256_file(target)?,
    })
}

/// Calcula el SHA-256 de un archivo leyendo por bloques.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0_u8; 8192];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
