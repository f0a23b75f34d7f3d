//! Suite generator - writes one pytest stub module per vendor `.tcl` file
//!
//! Resolves `<vendor root>/tests/unit/type`, discovers `.tcl` sources and writes `test_<stem>.py` for each into
//! the output directory. Existing files are overwritten; generated modules are never edited in place.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use conformkit_syntax::{ExtractError, ScanOptions, extract_file};
use thiserror::Error;

use super::stubgen::{StubGenerator, TestStub};

/// Location of the type-level unit tests inside the vendor tree.
pub const TYPE_TESTS_SUBPATH: &str = "tests/unit/type";

/// Errors from batch generation.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("vendor test directory '{}' does not exist", .0.display())]
    MissingSuiteDir(PathBuf),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("cannot write '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One written module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedModule {
    pub source: PathBuf,
    pub output: PathBuf,
    pub stubs: usize,
}

/// Batch generator for a vendor test tree.
pub struct SuiteGenerator {
    /// Output directory for generated modules
    output_dir: PathBuf,
    generator: StubGenerator,
    options: ScanOptions,
}

impl SuiteGenerator {
    pub fn new(output_dir: impl AsRef<Path>, generator: StubGenerator, options: ScanOptions) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            generator,
            options,
        }
    }

    /// Resolve the type-test directory under a vendor root.
    pub fn suite_dir(vendor_root: &Path) -> PathBuf {
        vendor_root.join(TYPE_TESTS_SUBPATH)
    }

    /// Generate modules for every `.tcl` file under `<vendor_root>/tests/unit/type`.
    pub fn generate_from_root(&self, vendor_root: &Path) -> Result<Vec<GeneratedModule>, GenerateError> {
        let suite_dir = Self::suite_dir(vendor_root);
        if !suite_dir.is_dir() {
            return Err(GenerateError::MissingSuiteDir(suite_dir));
        }

        let sources = discover_tcl_files(&suite_dir);
        tracing::info!(dir = %suite_dir.display(), files = sources.len(), "discovered DSL sources");

        fs::create_dir_all(&self.output_dir).map_err(|source| GenerateError::Write {
            path: self.output_dir.clone(),
            source,
        })?;

        let mut written = Vec::with_capacity(sources.len());
        for source in sources {
            let module_name = module_name_for(&suite_dir, &source);
            written.push(self.generate_file(&source, &module_name)?);
        }

        let total: usize = written.iter().map(|m| m.stubs).sum();
        tracing::info!(modules = written.len(), stubs = total, out = %self.output_dir.display(), "generated stub modules");
        Ok(written)
    }

    /// Generate one module from one DSL file.
    pub fn generate_file(&self, source: &Path, module_name: &str) -> Result<GeneratedModule, GenerateError> {
        let decls = extract_file(source, &self.options)?;
        let stubs: Vec<TestStub> = decls.iter().map(TestStub::from).collect();
        let text = self.generator.render(&stubs);

        let output = self.output_dir.join(format!("{}.py", module_name));
        fs::write(&output, text).map_err(|source| GenerateError::Write {
            path: output.clone(),
            source,
        })?;
        tracing::debug!(source = %source.display(), output = %output.display(), stubs = stubs.len(), "wrote module");

        Ok(GeneratedModule {
            source: source.to_path_buf(),
            output,
            stubs: stubs.len(),
        })
    }
}

/// Discover `.tcl` files in a directory, recursively and sorted.
pub fn discover_tcl_files(path: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    if path.is_file() {
        if path.extension().is_some_and(|ext| ext == "tcl") {
            files.push(path.to_path_buf());
        }
    } else if path.is_dir() {
        if let Ok(entries) = fs::read_dir(path) {
            for entry in entries.flatten() {
                let entry_path = entry.path();
                let name = entry_path.file_name().and_then(|n| n.to_str()).unwrap_or("");
                if name.starts_with('.') {
                    continue;
                }
                files.extend(discover_tcl_files(&entry_path));
            }
        }
    }

    files.sort();
    files
}

/// Python module name for a source: `test_` + path below the suite dir, components joined with `_`.
fn module_name_for(suite_dir: &Path, source: &Path) -> String {
    let relative = source.strip_prefix(suite_dir).unwrap_or(source).with_extension("");
    let joined: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().replace(['-', '.', ' '], "_"))
        .collect();
    format!("test_{}", joined.join("_"))
}
