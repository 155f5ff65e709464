// src/runner.rs

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::AppError;

/// Maps an authored language name to the execution API's language code.
pub fn api_language(language: &str) -> Option<&'static str> {
    match language {
        "C" => Some("c"),
        "C++" => Some("cpp"),
        "Java" => Some("java"),
        _ => None,
    }
}

#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    language: &'a str,
    stdin: &'a str,
    code: &'a str,
}

/// What the judge returned for one run. `output` is compared byte-for-byte
/// against the expected test-case output.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunOutput {
    pub output: Option<String>,
    pub error: Option<String>,
}

/// External code-execution judge. Untrusted and best-effort: a transport
/// failure is an error, a compile error is a normal `RunOutput` with the
/// `error` field set.
#[async_trait]
pub trait CodeRunner: Send + Sync {
    async fn run(&self, language: &str, stdin: &str, code: &str) -> Result<RunOutput, AppError>;
}

/// OneCompiler-style client (RapidAPI header scheme).
pub struct OneCompilerClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    api_host: String,
}

impl OneCompilerClient {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        OneCompilerClient {
            client,
            base_url: config.compiler_api_url.clone(),
            api_key: config.compiler_api_key.clone(),
            api_host: config.compiler_api_host.clone(),
        }
    }
}

#[async_trait]
impl CodeRunner for OneCompilerClient {
    async fn run(&self, language: &str, stdin: &str, code: &str) -> Result<RunOutput, AppError> {
        let api_lang = api_language(language).ok_or_else(|| {
            AppError::BadRequest(format!("Unsupported language: {}", language))
        })?;

        let response = self
            .client
            .post(&self.base_url)
            .header("X-RapidAPI-Host", &self.api_host)
            .header("X-RapidAPI-Key", &self.api_key)
            .json(&RunRequest {
                language: api_lang,
                stdin,
                code,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::InternalServerError(format!(
                "Compiler API returned status {}",
                response.status()
            )));
        }

        let output = response.json::<RunOutput>().await?;
        Ok(output)
    }
}
