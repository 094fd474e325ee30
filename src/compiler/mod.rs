//! Turning generated module source into publishable bytecode.
//!
//! [`PackageCompiler`] is the seam between the dispatcher and whatever
//! toolchain is available: the `sui` CLI on native targets, a host callback
//! under WASM, or a fake in tests.

#[cfg(not(target_arch = "wasm32"))]
mod sui_cli;

#[cfg(not(target_arch = "wasm32"))]
pub use sui_cli::SuiCliCompiler;

use crate::address::SuiAddress;
use crate::codegen::PackageSource;
use crate::error::BuildError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use tracing::info;

/// Bytecode and dependency ids of a built package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPackage {
    pub modules: Vec<Vec<u8>>,
    pub dependencies: Vec<SuiAddress>,
}

#[derive(Deserialize)]
struct BytecodeDump {
    modules: Vec<String>,
    dependencies: Vec<String>,
}

impl CompiledPackage {
    /// Parse the `--dump-bytecode-as-base64` output.
    ///
    /// Anything printed before the JSON object is ignored.
    pub fn from_dump(output: &str) -> Result<Self, BuildError> {
        let start = output
            .find('{')
            .ok_or_else(|| BuildError::MalformedOutput("no JSON object in output".to_string()))?;
        let dump: BytecodeDump = serde_json::from_str(output[start..].trim_end())
            .map_err(|e| BuildError::MalformedOutput(e.to_string()))?;
        Self::from_encoded(&dump.modules, &dump.dependencies)
    }

    /// Decode base64 modules and hex dependency ids
    pub fn from_encoded(modules: &[String], dependencies: &[String]) -> Result<Self, BuildError> {
        if modules.is_empty() {
            return Err(BuildError::MalformedOutput(
                "package has no modules".to_string(),
            ));
        }
        let modules = modules
            .iter()
            .map(|m| {
                STANDARD
                    .decode(m)
                    .map_err(|e| BuildError::MalformedOutput(format!("module is not base64: {}", e)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let dependencies = dependencies
            .iter()
            .map(|d| {
                d.parse::<SuiAddress>()
                    .map_err(|_| BuildError::MalformedOutput(format!("bad dependency id: {}", d)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CompiledPackage {
            modules,
            dependencies,
        })
    }
}

/// Builds a rendered package.
pub trait PackageCompiler {
    fn compile(&self, source: &PackageSource) -> Result<CompiledPackage, BuildError>;
}

impl<C: PackageCompiler + ?Sized> PackageCompiler for &C {
    fn compile(&self, source: &PackageSource) -> Result<CompiledPackage, BuildError> {
        (**self).compile(source)
    }
}

/// Source of one publish intent together with its build output. Consumed by
/// the publish command and then dropped.
#[derive(Debug, Clone)]
pub struct GeneratedContractArtifact {
    pub source: PackageSource,
    pub package: CompiledPackage,
}

impl GeneratedContractArtifact {
    pub fn build(
        compiler: &dyn PackageCompiler,
        source: PackageSource,
    ) -> Result<Self, BuildError> {
        let package = compiler.compile(&source)?;
        info!(
            package = source.package,
            modules = package.modules.len(),
            dependencies = package.dependencies.len(),
            "Contract built"
        );
        Ok(GeneratedContractArtifact { source, package })
    }
}
