use serde_json::{Map, Value};

use crate::core::errors::ApiError;

const LLM_PROVIDERS: [&str; 2] = ["gemini", "openai_compatible"];
const AUDIT_BACKENDS: [&str; 3] = ["sqlite", "supabase", "disabled"];
const PERSONAS: [&str; 2] = ["standard", "brainrot"];

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 1, 65_535)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
    }

    if let Some(corpus) = expect_optional_object(root, "corpus")? {
        for key in ["text_path", "precomputed_path", "chunks_path", "embeddings_path"] {
            validate_optional_string_field(corpus, &format!("corpus.{}", key), key)?;
        }
        validate_u64_field(corpus, "corpus.max_words", "max_words", 1, 100_000)?;

        let has_chunks = corpus.get("chunks_path").is_some_and(|v| !v.is_null());
        let has_embeddings = corpus.get("embeddings_path").is_some_and(|v| !v.is_null());
        if has_chunks != has_embeddings {
            return Err(ApiError::BadRequest(
                "Invalid config at 'corpus': chunks_path and embeddings_path must be set together"
                    .to_string(),
            ));
        }
    }

    if let Some(retrieval) = expect_optional_object(root, "retrieval")? {
        validate_u64_field(retrieval, "retrieval.top_k", "top_k", 1, 1_000)?;
    }

    if let Some(history) = expect_optional_object(root, "history")? {
        validate_bool_field(history, "history.enabled", "enabled")?;
        validate_u64_field(history, "history.max_turns", "max_turns", 1, 1_000)?;
    }

    if let Some(embedding) = expect_optional_object(root, "embedding")? {
        validate_optional_string_field(embedding, "embedding.base_url", "base_url")?;
        validate_optional_string_field(embedding, "embedding.model", "model")?;
        validate_bool_field(embedding, "embedding.normalize", "normalize")?;
        validate_u64_field(embedding, "embedding.timeout_secs", "timeout_secs", 1, 86_400)?;
    }

    if let Some(llm) = expect_optional_object(root, "llm")? {
        validate_enum_field(llm, "llm.provider", "provider", &LLM_PROVIDERS)?;
        validate_optional_string_field(llm, "llm.base_url", "base_url")?;
        validate_optional_string_field(llm, "llm.model", "model")?;
        validate_u64_field(llm, "llm.timeout_secs", "timeout_secs", 1, 86_400)?;
    }

    if let Some(audit) = expect_optional_object(root, "audit")? {
        validate_bool_field(audit, "audit.enabled", "enabled")?;
        validate_enum_field(audit, "audit.backend", "backend", &AUDIT_BACKENDS)?;
        validate_optional_string_field(audit, "audit.table", "table")?;
        validate_optional_string_field(audit, "audit.source_label", "source_label")?;
    }

    if let Some(persona) = expect_optional_object(root, "persona")? {
        validate_enum_field(persona, "persona.default", "default", &PERSONAS)?;
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(Value::Null) | None => Ok(None),
        Some(_) => Err(config_type_error(key, "object")),
    }
}

fn validate_bool_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.as_bool().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "boolean"))
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

fn validate_enum_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    allowed: &[&str],
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if !allowed.contains(&text) {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': expected one of {}",
            path,
            allowed.join(", ")
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
    if value.is_null() || value.as_str().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "string"))
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
