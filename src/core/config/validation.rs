use serde_json::{Map, Value};
use crate::core::errors::ApiError;

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, 65535)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
    }

    if let Some(store) = expect_optional_object(root, "store")? {
        validate_required_string_field(store, "store.directory", "directory")?;
    }

    if let Some(indexer) = expect_optional_object(root, "indexer")? {
        validate_optional_string_field(indexer, "indexer.documents_dir", "documents_dir")?;
        validate_u64_field(indexer, "indexer.chunk_size", "chunk_size", 1, 1_000_000)?;
        validate_u64_field(indexer, "indexer.chunk_overlap", "chunk_overlap", 0, 1_000_000)?;
        validate_u64_field(
            indexer,
            "indexer.embed_batch_size",
            "embed_batch_size",
            1,
            100,
        )?;

        let size = indexer.get("chunk_size").and_then(Value::as_u64);
        let overlap = indexer.get("chunk_overlap").and_then(Value::as_u64);
        if let (Some(size), Some(overlap)) = (size, overlap) {
            if overlap >= size {
                return Err(ApiError::BadRequest(format!(
                    "Invalid config at 'indexer.chunk_overlap': must be smaller than chunk_size ({})",
                    size
                )));
            }
        }
    }

    if let Some(entities) = expect_optional_object(root, "entities")? {
        for (label, value) in entities {
            let path = format!("entities.{}", label);
            if label.trim().is_empty() {
                return Err(ApiError::BadRequest(
                    "Invalid config at 'entities': labels cannot be empty".to_string(),
                ));
            }
            let Some(file_name) = value.as_str() else {
                return Err(config_type_error(&path, "string"));
            };
            if file_name.trim().is_empty() {
                return Err(ApiError::BadRequest(format!(
                    "Invalid config at '{}': value cannot be empty",
                    path
                )));
            }
        }
    }

    if let Some(embeddings) = expect_optional_object(root, "embeddings")? {
        validate_required_string_field(embeddings, "embeddings.model", "model")?;
        validate_required_string_field(embeddings, "embeddings.base_url", "base_url")?;
        validate_u64_field(embeddings, "embeddings.timeout_secs", "timeout_secs", 1, 3_600)?;
    }

    if let Some(generation) = expect_optional_object(root, "generation")? {
        validate_required_string_field(generation, "generation.model", "model")?;
        validate_required_string_field(generation, "generation.base_url", "base_url")?;
        validate_f64_field(generation, "generation.temperature", "temperature", 0.0, 2.0)?;
        validate_u64_field(generation, "generation.timeout_secs", "timeout_secs", 1, 3_600)?;
    }

    if let Some(retrieval) = expect_optional_object(root, "retrieval")? {
        validate_u64_field(retrieval, "retrieval.top_k", "top_k", 1, 100)?;
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_f64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_required_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let value = section.get(key).ok_or_else(|| {
        ApiError::BadRequest(format!("Invalid config at '{}': value is required", path))
    })?;
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if text.trim().is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': value cannot be empty",
            path
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.as_str().is_none() {
        return Err(config_type_error(path, "string"));
    }
    Ok(())
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::BadRequest(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::defaults::default_config;
    use serde_json::json;

    #[test]
    fn defaults_are_valid() {
        validate_config(&default_config()).unwrap();
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        let config = json!({"indexer": {"chunk_size": 200, "chunk_overlap": 200}});
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("indexer.chunk_overlap"));
    }

    #[test]
    fn rejects_wrong_types_with_field_path() {
        let err = validate_config(&json!({"retrieval": {"top_k": "ten"}})).unwrap_err();
        assert!(err.to_string().contains("retrieval.top_k"));

        let err = validate_config(&json!({"entities": {"paltas": 3}})).unwrap_err();
        assert!(err.to_string().contains("entities.paltas"));

        let err = validate_config(&json!({"generation": {"model": "gpt-4o", "base_url": "x", "temperature": 3.5}}))
            .unwrap_err();
        assert!(err.to_string().contains("generation.temperature"));
    }

    #[test]
    fn root_must_be_an_object() {
        assert!(validate_config(&json!([1, 2])).is_err());
    }
}
