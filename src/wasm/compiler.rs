//! Host-provided package compiler.

use crate::codegen::PackageSource;
use crate::compiler::{CompiledPackage, PackageCompiler};
use crate::error::BuildError;
use serde::{Deserialize, Serialize};
use wasm_bindgen::{JsCast, JsValue};

#[derive(Serialize)]
struct CompileRequest<'a> {
    package: &'a str,
    module: &'a str,
    source: &'a str,
}

#[derive(Deserialize)]
struct CompileResponse {
    modules: Vec<String>,
    dependencies: Vec<String>,
}

/// Delegates builds to a synchronous JavaScript callback:
/// `({ package, module, source }) => ({ modules: string[], dependencies: string[] })`
/// with base64 modules and hex dependency ids.
pub(crate) struct JsPackageCompiler {
    callback: js_sys::Function,
}

impl JsPackageCompiler {
    pub(crate) fn new(callback: js_sys::Function) -> Self {
        JsPackageCompiler { callback }
    }
}

impl PackageCompiler for JsPackageCompiler {
    fn compile(&self, source: &PackageSource) -> Result<CompiledPackage, BuildError> {
        let request = serde_wasm_bindgen::to_value(&CompileRequest {
            package: source.package,
            module: source.module,
            source: &source.source,
        })
        .map_err(|e| BuildError::Callback(format!("Failed to serialize request: {}", e)))?;

        let result = self
            .callback
            .call1(&JsValue::NULL, &request)
            .map_err(|e| BuildError::Callback(error_message(&e)))?;
        if result.is_instance_of::<js_sys::Promise>() {
            return Err(BuildError::Callback(
                "compiler callback must return synchronously".to_string(),
            ));
        }

        let response: CompileResponse = serde_wasm_bindgen::from_value(result)
            .map_err(|e| BuildError::MalformedOutput(e.to_string()))?;
        CompiledPackage::from_encoded(&response.modules, &response.dependencies)
    }
}

/// Used when the host passes no compiler; publish intents fail.
pub(crate) struct MissingCompiler;

impl PackageCompiler for MissingCompiler {
    fn compile(&self, source: &PackageSource) -> Result<CompiledPackage, BuildError> {
        Err(BuildError::Callback(format!(
            "no compiler provided to build {}",
            source.package
        )))
    }
}

fn error_message(err: &JsValue) -> String {
    if let Some(e) = err.dyn_ref::<js_sys::Error>() {
        return String::from(e.message());
    }
    err.as_string().unwrap_or_else(|| format!("{:?}", err))
}
