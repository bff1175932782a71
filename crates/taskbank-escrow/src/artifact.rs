//! Compiled escrow programs used to create new pools.
//!
//! The approval and clear programs are opaque bytecode supplied by the
//! operator. Pools keep balances in boxes, so the default state schemas are
//! empty.

use std::path::{Path, PathBuf};

use taskbank_algo_client::txn::StateSchema;

/// Failure to load a program file.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{} is empty", path.display())]
    Empty { path: PathBuf },
    #[error("{} is TEAL source; compile it to bytecode first", path.display())]
    NotCompiled { path: PathBuf },
}

/// Approval and clear programs plus the schema a pool is created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractArtifact {
    pub approval_program: Vec<u8>,
    pub clear_program: Vec<u8>,
    pub global_schema: StateSchema,
    pub local_schema: StateSchema,
    pub extra_pages: u64,
}

impl ContractArtifact {
    /// Wrap already-loaded bytecode with empty schemas.
    pub fn new(approval_program: Vec<u8>, clear_program: Vec<u8>) -> Self {
        Self {
            approval_program,
            clear_program,
            global_schema: StateSchema::default(),
            local_schema: StateSchema::default(),
            extra_pages: 0,
        }
    }

    /// Load bytecode from two files.
    pub fn from_files(approval: &Path, clear: &Path) -> Result<Self, ArtifactError> {
        Ok(Self::new(read_program(approval)?, read_program(clear)?))
    }

    /// Override the global state schema.
    pub fn with_global_schema(mut self, num_uints: u64, num_byte_slices: u64) -> Self {
        self.global_schema = StateSchema {
            num_uints,
            num_byte_slices,
        };
        self
    }
}

fn read_program(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    let bytes = std::fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if bytes.is_empty() {
        return Err(ArtifactError::Empty {
            path: path.to_path_buf(),
        });
    }
    if bytes.starts_with(b"#pragma") {
        return Err(ArtifactError::NotCompiled {
            path: path.to_path_buf(),
        });
    }
    Ok(bytes)
}
