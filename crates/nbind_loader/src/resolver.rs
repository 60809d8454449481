//! Turns a requested library path or bare name into one existing, absolute
//! file path. Pure filesystem work: no loader is invoked here.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use nbind_config::{SearchConfig, SearchLocation};
use tracing::{debug, trace};

use crate::LoaderError;

#[derive(Debug, Clone, Default)]
pub struct LibraryResolver {
    config: SearchConfig,
}

impl LibraryResolver {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// First candidate that exists on disk, canonicalized.
    pub fn resolve(&self, requested: &Path) -> Result<PathBuf, LoaderError> {
        let mut tried = Vec::new();
        let name = requested.display().to_string();

        let Some(file_name) = requested.file_name().and_then(|name| name.to_str()) else {
            return Err(LoaderError::NotFound { name, tried });
        };
        let parent = requested.parent().unwrap_or_else(|| Path::new(""));
        let relatives: Vec<PathBuf> = self
            .config
            .decoration
            .candidates(file_name)
            .into_iter()
            .map(|candidate| parent.join(candidate))
            .collect();

        let roots = if requested.is_absolute() {
            vec![PathBuf::new()]
        } else {
            self.search_roots()
        };

        for root in &roots {
            for relative in &relatives {
                let candidate = root.join(relative);
                trace!(candidate = %candidate.display(), "probing library candidate");
                if candidate.is_file() && !is_linker_script(&candidate) {
                    if let Ok(resolved) = std::fs::canonicalize(&candidate) {
                        debug!(requested = %name, resolved = %resolved.display(), "resolved library path");
                        return Ok(resolved);
                    }
                }
                tried.push(candidate);
            }
        }

        Err(LoaderError::NotFound { name, tried })
    }

    fn search_roots(&self) -> Vec<PathBuf> {
        let mut roots = Vec::new();
        for location in &self.config.locations {
            match location {
                SearchLocation::WorkingDirectory => {
                    roots.extend(std::env::current_dir().ok());
                }
                SearchLocation::ExecutableDirectory => {
                    roots.extend(
                        std::env::current_exe()
                            .ok()
                            .and_then(|exe| exe.parent().map(Path::to_path_buf)),
                    );
                }
                SearchLocation::Directory(dir) => roots.push(dir.clone()),
                SearchLocation::PlatformDefaults => roots.extend(platform_default_dirs()),
            }
        }
        roots
    }
}

const LINKER_SCRIPT_MAGIC: &[u8] = b"/* GNU ld script";

/// Development `.so` files on glibc systems are often linker scripts pointing
/// at the real versioned library; the OS loader cannot map them.
fn is_linker_script(path: &Path) -> bool {
    let mut head = [0u8; LINKER_SCRIPT_MAGIC.len()];
    let is_script = File::open(path)
        .and_then(|mut file| file.read_exact(&mut head))
        .is_ok_and(|()| head == LINKER_SCRIPT_MAGIC);
    if is_script {
        trace!(candidate = %path.display(), "skipping linker script");
    }
    is_script
}

/// Loader path variable entries followed by the conventional system dirs.
fn platform_default_dirs() -> Vec<PathBuf> {
    let var = if cfg!(windows) {
        "PATH"
    } else if cfg!(target_os = "macos") {
        "DYLD_LIBRARY_PATH"
    } else {
        "LD_LIBRARY_PATH"
    };

    let mut dirs: Vec<PathBuf> = std::env::var_os(var)
        .map(|paths| std::env::split_paths(&paths).collect())
        .unwrap_or_default();

    if cfg!(windows) {
        if let Some(root) = std::env::var_os("SystemRoot") {
            dirs.push(PathBuf::from(root).join("System32"));
        }
    } else {
        let arch = std::env::consts::ARCH;
        dirs.extend(
            [
                "/usr/local/lib".to_string(),
                format!("/usr/lib/{arch}-linux-gnu"),
                format!("/lib/{arch}-linux-gnu"),
                "/usr/lib64".to_string(),
                "/usr/lib".to_string(),
                "/lib".to_string(),
            ]
            .map(PathBuf::from),
        );
    }
    dirs
}

#[cfg(test)]
mod tests {
    use nbind_config::NameDecoration;

    use super::*;

    fn decoration() -> NameDecoration {
        NameDecoration {
            prefix: "lib".to_string(),
            suffixes: vec![".so".to_string()],
        }
    }

    #[test]
    fn test_bare_name_is_decorated() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("libdemo.so")).unwrap();

        let resolver = LibraryResolver::new(
            SearchConfig::directories([dir.path()]).with_decoration(decoration()),
        );
        let resolved = resolver.resolve(Path::new("demo")).unwrap();
        assert!(resolved.is_absolute());
        assert_eq!(resolved, std::fs::canonicalize(dir.path().join("libdemo.so")).unwrap());
    }

    #[test]
    fn test_first_location_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        File::create(first.path().join("libdemo.so")).unwrap();
        File::create(second.path().join("libdemo.so")).unwrap();

        let resolver = LibraryResolver::new(
            SearchConfig::directories([first.path(), second.path()]).with_decoration(decoration()),
        );
        let resolved = resolver.resolve(Path::new("libdemo.so")).unwrap();
        assert!(resolved.starts_with(std::fs::canonicalize(first.path()).unwrap()));
    }

    #[test]
    fn test_absolute_path_skips_search() {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join("libabs.so");
        File::create(&lib).unwrap();

        let resolver = LibraryResolver::new(SearchConfig::directories(Vec::<PathBuf>::new()));
        assert_eq!(resolver.resolve(&lib).unwrap(), std::fs::canonicalize(&lib).unwrap());
    }

    #[test]
    fn test_missing_library_lists_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = LibraryResolver::new(
            SearchConfig::directories([dir.path()]).with_decoration(decoration()),
        );
        match resolver.resolve(Path::new("nowhere")) {
            Err(LoaderError::NotFound { name, tried }) => {
                assert_eq!(name, "nowhere");
                assert_eq!(tried.len(), 3);
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_linker_scripts_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("libdemo.so"),
            "/* GNU ld script\n   Use the shared library. */\nGROUP ( /lib/libdemo.so.1 )\n",
        )
        .unwrap();
        File::create(dir.path().join("demo.so")).unwrap();

        let resolver = LibraryResolver::new(
            SearchConfig::directories([dir.path()]).with_decoration(decoration()),
        );
        let resolved = resolver.resolve(Path::new("demo")).unwrap();
        assert_eq!(resolved, std::fs::canonicalize(dir.path().join("demo.so")).unwrap());
    }

    #[test]
    fn test_directories_are_not_libraries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("libdir.so")).unwrap();
        let resolver = LibraryResolver::new(
            SearchConfig::directories([dir.path()]).with_decoration(decoration()),
        );
        assert!(resolver.resolve(Path::new("dir")).is_err());
    }
}
