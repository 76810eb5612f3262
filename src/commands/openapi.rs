//! OpenAPI command - Writes the API document to disk.

use utoipa::OpenApi;

use crate::api::ApiDoc;
use crate::cli::args::OpenapiArgs;
use crate::errors::{AppError, AppResult};

/// Execute the openapi command
pub async fn execute(args: OpenapiArgs) -> AppResult<()> {
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .map_err(|e| AppError::internal(format!("Failed to serialize OpenAPI document: {}", e)))?;

    tokio::fs::write(&args.output, format!("{}\n", json))
        .await
        .map_err(|e| {
            AppError::internal(format!("Failed to write {}: {}", args.output.display(), e))
        })?;

    tracing::info!("OpenAPI schema written to {}", args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_writes_document_to_output() {
        let output = std::env::temp_dir().join(format!("users-api-{}.json", uuid::Uuid::new_v4()));

        execute(OpenapiArgs {
            output: output.clone(),
        })
        .await
        .unwrap();

        let written = tokio::fs::read_to_string(&output).await.unwrap();
        let doc: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert!(doc["paths"]["/users/{id}"].is_object());

        tokio::fs::remove_file(&output).await.unwrap();
    }
}
