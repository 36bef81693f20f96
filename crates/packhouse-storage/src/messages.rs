//! Operator-facing messages (Portuguese/Brazilian)
//!
//! The packing house runs the tool in Portuguese. Log output stays in
//! English; everything printed for an operator comes from here.
//!
//! # Usage
//!
//! ```
//! use packhouse_storage::messages::DisplayMessages;
//! use packhouse_storage::StorageError;
//!
//! assert_eq!(
//!     DisplayMessages::for_error(&StorageError::EmptyBackupSet),
//!     "Nenhum backup encontrado"
//! );
//! ```

use crate::error::StorageError;

/// Display messages for inventory and backup operations
pub struct DisplayMessages;

impl DisplayMessages {
    pub const MATERIAL_ADDED: &'static str = "Material adicionado com sucesso!";
    pub const MATERIAL_UPDATED: &'static str = "Material atualizado com sucesso!";
    pub const MATERIAL_DELETED: &'static str = "Material excluído com sucesso!";
    pub const MOVEMENT_REGISTERED: &'static str = "Movimentação registrada com sucesso!";
    pub const HISTORY_CLEARED: &'static str = "Histórico de movimentações limpo";

    /// Shown after the reference dataset was seeded
    pub const DATA_SEEDED: &'static str = "Dados migrados com sucesso para o banco de dados local!";
    pub const ALREADY_SEEDED: &'static str = "Dados já migrados anteriormente";

    pub const BACKUP_CREATED: &'static str = "Backup criado com sucesso";
    pub const BACKUP_RESTORED: &'static str = "Backup restaurado com sucesso";
    pub const BACKUP_DELETED: &'static str = "Backup excluído";
    pub const BACKUPS_CLEARED: &'static str = "Todos os backups foram removidos";
    pub const BACKUP_EXPORTED: &'static str = "Backup exportado com sucesso";
    pub const BACKUP_IMPORTED: &'static str = "Backup importado com sucesso";
    pub const INTEGRITY_OK: &'static str = "Integridade dos dados verificada: nenhum problema";
    pub const INTEGRITY_ISSUES: &'static str = "Problemas de integridade encontrados";

    pub const NOT_FOUND: &'static str = "Registro não encontrado";
    pub const MATERIAL_NOT_FOUND: &'static str = "Material não encontrado";
    pub const BACKUP_NOT_FOUND: &'static str = "Backup não encontrado";
    pub const NO_BACKUPS: &'static str = "Nenhum backup encontrado";
    pub const DUPLICATE_NAME: &'static str = "Já existe um registro com este nome";
    pub const INVALID_BACKUP_FORMAT: &'static str = "Formato de backup inválido";
    pub const FILE_READ_FAILED: &'static str = "Erro ao ler arquivo de backup";
    pub const FILE_WRITE_FAILED: &'static str = "Erro ao gravar arquivo de backup";
    pub const INVALID_DATA: &'static str = "Dados inválidos";
    pub const STORAGE_FAILURE: &'static str = "Erro no banco de dados local";

    /// Operator message for a storage error.
    pub fn for_error(err: &StorageError) -> &'static str {
        match err {
            StorageError::NotFound { entity_type, .. } => match entity_type.as_str() {
                "Material" => Self::MATERIAL_NOT_FOUND,
                "Snapshot" => Self::BACKUP_NOT_FOUND,
                _ => Self::NOT_FOUND,
            },
            StorageError::DuplicateKey { .. } => Self::DUPLICATE_NAME,
            StorageError::InvalidFormat(_) => Self::INVALID_BACKUP_FORMAT,
            StorageError::FileReadError { .. } => Self::FILE_READ_FAILED,
            StorageError::FileWriteError { .. } => Self::FILE_WRITE_FAILED,
            StorageError::EmptyBackupSet => Self::NO_BACKUPS,
            StorageError::Validation(_) => Self::INVALID_DATA,
            StorageError::Database(_)
            | StorageError::Migration(_)
            | StorageError::Serialization(_)
            | StorageError::Configuration(_) => Self::STORAGE_FAILURE,
        }
    }
}
