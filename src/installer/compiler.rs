//! Compiler side of the build/install seam

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::core::{NccError, NccResult};
use crate::package::{
    Assembly, CompilerExtension, Component, ComponentDataType, ExecutionPolicy, ExecutionUnit,
    Metadata, Package, Resource,
};

/// Produces a [`Package`] from some build input
pub trait PackageCompiler {
    fn prepare(&mut self) -> NccResult<()>;
    fn compile_components(&mut self) -> NccResult<()>;
    fn compile_resources(&mut self) -> NccResult<()>;
    fn compile_execution_policies(&mut self) -> NccResult<()>;

    /// The package built so far
    fn package(&self) -> &Package;

    /// Run every stage in order and return the finished package
    fn build(&mut self) -> NccResult<Package> {
        self.prepare()?;
        self.compile_components()?;
        self.compile_resources()?;
        self.compile_execution_policies()?;
        Ok(self.package().clone())
    }
}

/// Compiles a directory tree: files with a component extension become plain
/// components, everything else becomes a resource
pub struct DirectoryCompiler {
    source_dir: PathBuf,
    component_extensions: Vec<String>,
    policies: Vec<ExecutionPolicy>,
    files: Vec<PathBuf>,
    package: Package,
}

impl DirectoryCompiler {
    pub fn new(source_dir: impl Into<PathBuf>, assembly: Assembly, compiler: CompilerExtension) -> Self {
        let component_extensions = vec![compiler.extension.clone()];
        Self {
            source_dir: source_dir.into(),
            component_extensions,
            policies: Vec::new(),
            files: Vec::new(),
            package: Package::new(assembly, Metadata::new(compiler)),
        }
    }

    /// File extensions compiled as components
    pub fn with_component_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.component_extensions = extensions
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    /// Bundle an execution policy; its target is read from the source directory
    pub fn with_execution_policy(mut self, policy: ExecutionPolicy) -> Self {
        self.policies.push(policy);
        self
    }

    /// Mutable access to the package, e.g. to set magic flags or metadata
    pub fn package_mut(&mut self) -> &mut Package {
        &mut self.package
    }

    fn is_component(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                self.component_extensions
                    .iter()
                    .any(|c| c.eq_ignore_ascii_case(e))
            })
            .unwrap_or(false)
    }

    fn entry_name(path: &Path) -> String {
        path.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn read(&self, relative: &Path) -> NccResult<Vec<u8>> {
        let path = self.source_dir.join(relative);
        fs::read(&path).map_err(|e| {
            NccError::operation(format!("Failed to read {}: {}", path.display(), e))
        })
    }
}

impl PackageCompiler for DirectoryCompiler {
    fn prepare(&mut self) -> NccResult<()> {
        if !self.source_dir.is_dir() {
            return Err(NccError::operation(format!(
                "Source directory not found: {}",
                self.source_dir.display()
            )));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.source_dir).sort_by_file_name() {
            let entry = entry.map_err(|e| NccError::operation(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(&self.source_dir) {
                files.push(relative.to_path_buf());
            }
        }

        info!(
            "Compiling {} files from {}",
            files.len(),
            self.source_dir.display()
        );
        self.files = files;
        Ok(())
    }

    fn compile_components(&mut self) -> NccResult<()> {
        let files: Vec<PathBuf> = self
            .files
            .iter()
            .filter(|f| self.is_component(f))
            .cloned()
            .collect();

        for relative in files {
            let data = self.read(&relative)?;
            let data_type = if std::str::from_utf8(&data).is_ok() {
                ComponentDataType::Plain
            } else {
                ComponentDataType::Binary
            };
            let name = Self::entry_name(&relative);
            debug!("Component {}", name);
            self.package.add_component(Component::new(name, data_type, data));
        }
        Ok(())
    }

    fn compile_resources(&mut self) -> NccResult<()> {
        let files: Vec<PathBuf> = self
            .files
            .iter()
            .filter(|f| !self.is_component(f))
            .cloned()
            .collect();

        for relative in files {
            let data = self.read(&relative)?;
            let name = Self::entry_name(&relative);
            debug!("Resource {}", name);
            self.package.add_resource(Resource::new(name, data));
        }
        Ok(())
    }

    fn compile_execution_policies(&mut self) -> NccResult<()> {
        for policy in std::mem::take(&mut self.policies) {
            let data = self.read(Path::new(&policy.target))?;
            self.package
                .add_execution_unit(ExecutionUnit::new(policy, data));
        }

        self.package.magic.executable = self.package.metadata.main_execution_policy.is_some()
            && !self.package.execution_units.is_empty();
        Ok(())
    }

    fn package(&self) -> &Package {
        &self.package
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn source_tree() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/Lib")).unwrap();
        fs::write(dir.path().join("src/Lib/Main.php"), "<?php class Main {}").unwrap();
        fs::write(dir.path().join("src/logo.png"), [0x89, 0x50, 0x4e, 0x47]).unwrap();
        fs::write(dir.path().join("main.php"), "<?php echo 1;").unwrap();
        dir
    }

    #[test]
    fn test_build_directory() {
        let dir = source_tree();
        let mut compiler = DirectoryCompiler::new(
            dir.path(),
            Assembly::new("Lib", "com.example.lib", "1.0.0"),
            CompilerExtension::new("php"),
        )
        .with_execution_policy(ExecutionPolicy::new("main", "php", "main.php"));
        compiler.package_mut().metadata.main_execution_policy = Some("main".to_string());

        let package = compiler.build().unwrap();

        assert_eq!(package.components.len(), 2);
        assert!(package.component("src/Lib/Main.php").is_some());
        assert!(package.component("main.php").is_some());
        assert_eq!(package.resources.len(), 1);
        assert_eq!(package.resource("src/logo.png").unwrap().data, vec![0x89, 0x50, 0x4e, 0x47]);
        assert_eq!(package.execution_units.len(), 1);
        assert!(package.magic.executable);
        assert!(package.verify_integrity().is_ok());
    }

    #[test]
    fn test_missing_policy_target_fails() {
        let dir = source_tree();
        let mut compiler = DirectoryCompiler::new(
            dir.path(),
            Assembly::new("Lib", "com.example.lib", "1.0.0"),
            CompilerExtension::new("php"),
        )
        .with_execution_policy(ExecutionPolicy::new("cli", "php", "bin/cli.php"));

        assert!(matches!(compiler.build(), Err(NccError::Operation(_))));
    }

    #[test]
    fn test_missing_source_dir() {
        let dir = tempdir().unwrap();
        let mut compiler = DirectoryCompiler::new(
            dir.path().join("missing"),
            Assembly::new("Lib", "com.example.lib", "1.0.0"),
            CompilerExtension::new("php"),
        );
        assert!(compiler.prepare().is_err());
    }
}
