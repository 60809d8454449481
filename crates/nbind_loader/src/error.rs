use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("library `{name}` not found ({} candidates searched)", tried.len())]
    NotFound { name: String, tried: Vec<PathBuf> },

    #[error("failed to load library {}: {detail}", path.display())]
    Open {
        path: PathBuf,
        detail: String,
        code: Option<i32>,
    },

    #[error("failed to resolve symbol `{symbol}`: {detail}")]
    Symbol {
        symbol: String,
        detail: String,
        code: Option<i32>,
    },

    #[error("symbol `{symbol}` resolved to a null address")]
    NullSymbol { symbol: String },
}

impl LoaderError {
    pub(crate) fn open(path: &std::path::Path, err: &libloading::Error) -> Self {
        LoaderError::Open {
            path: path.to_path_buf(),
            detail: err.to_string(),
            code: os_error_code(err),
        }
    }

    pub(crate) fn symbol(symbol: &str, err: &libloading::Error) -> Self {
        LoaderError::Symbol {
            symbol: symbol.to_string(),
            detail: err.to_string(),
            code: os_error_code(err),
        }
    }

    /// OS error code carried by the failure, when the platform reports one.
    pub fn code(&self) -> Option<i32> {
        match self {
            LoaderError::Open { code, .. } | LoaderError::Symbol { code, .. } => *code,
            LoaderError::NotFound { .. } | LoaderError::NullSymbol { .. } => None,
        }
    }
}

/// `dlerror` only yields text; the Windows loader reports through `io::Error`.
fn os_error_code(err: &libloading::Error) -> Option<i32> {
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        if let Some(io) = inner.downcast_ref::<std::io::Error>() {
            return io.raw_os_error();
        }
        source = inner.source();
    }
    None
}
