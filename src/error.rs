use std::error::Error;
use std::path::PathBuf;

use nbind_loader::LoaderError;
use thiserror::Error;

type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Every failure a resolution or an invocation can report.
#[derive(Error, Debug)]
pub enum BindingError {
    /// The interface or configuration cannot be bound. Raised before any I/O.
    #[error("interface `{interface}` is not bindable: {reason}")]
    Configuration { interface: String, reason: String },

    #[error("library `{name}` not found ({} candidates searched)", tried.len())]
    LibraryNotFound { name: String, tried: Vec<PathBuf> },

    #[error("failed to load library {}: {detail}", path.display())]
    LibraryLoad {
        path: PathBuf,
        detail: String,
        code: Option<i32>,
    },

    #[error("symbol `{symbol}` could not be loaded: {detail}")]
    SymbolLoad {
        symbol: String,
        detail: String,
        code: Option<i32>,
    },

    /// Any other failure while assembling an instance. Build through
    /// [`BindingError::construction`] so the root cause is never hidden.
    #[error("failed to construct binding: {source}")]
    Construction { source: BoxError },

    #[error("binding for `{interface}` has been disposed")]
    Disposed { interface: String },

    #[error("interface `{interface}` has no member `{member}`")]
    UnknownMember { interface: String, member: String },

    #[error("`{member}` expects {expected}, got {found}")]
    ArgumentMismatch {
        member: String,
        expected: String,
        found: String,
    },

    #[error("`{member}` returned a null string")]
    NullString { member: String },
}

impl BindingError {
    pub(crate) fn configuration(interface: &str, reason: impl Into<String>) -> Self {
        BindingError::Configuration {
            interface: interface.to_string(),
            reason: reason.into(),
        }
    }

    /// Wrap a construction failure, peeling nested binding errors so the
    /// caller sees the original cause: a `SymbolLoad` stays a `SymbolLoad`,
    /// and `Construction(Construction(e))` collapses to `Construction(e)`.
    pub fn construction<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        let mut boxed: BoxError = err.into();
        loop {
            match boxed.downcast::<BindingError>() {
                Ok(inner) => match *inner {
                    BindingError::Construction { source } => boxed = source,
                    other => return other,
                },
                Err(original) => return BindingError::Construction { source: original },
            }
        }
    }

    /// Native error code, when the OS reported one.
    pub fn code(&self) -> Option<i32> {
        match self {
            BindingError::LibraryLoad { code, .. } | BindingError::SymbolLoad { code, .. } => *code,
            _ => None,
        }
    }
}

impl From<LoaderError> for BindingError {
    fn from(err: LoaderError) -> Self {
        match err {
            LoaderError::NotFound { name, tried } => BindingError::LibraryNotFound { name, tried },
            LoaderError::Open { path, detail, code } => {
                BindingError::LibraryLoad { path, detail, code }
            }
            LoaderError::Symbol {
                symbol,
                detail,
                code,
            } => BindingError::SymbolLoad {
                symbol,
                detail,
                code,
            },
            err @ LoaderError::NullSymbol { .. } => BindingError::Construction {
                source: Box::new(err),
            },
        }
    }
}
