use serde_json::{json, Map, Value};

pub fn default_entities() -> Map<String, Value> {
    let mut entities = Map::new();
    entities.insert("paltas".to_string(), json!("PDOT_Paltas.pdf"));
    entities.insert("pindal".to_string(), json!("PDOT_Pindal.pdf"));
    entities.insert("catamayo".to_string(), json!("PDyOT_Catamayo.pdf"));
    entities.insert("chaguarpamba".to_string(), json!("PDyOT_Chaguarpamba.pdf"));
    entities
}

pub fn default_config() -> Value {
    json!({
        "server": {
            "host": "127.0.0.1",
            "port": 8000,
            "cors_allowed_origins": []
        },
        "store": {
            "directory": "db_pdot"
        },
        "indexer": {
            "documents_dir": ".",
            "chunk_size": 1500,
            "chunk_overlap": 200,
            "embed_batch_size": 100
        },
        "entities": Value::Object(default_entities()),
        "embeddings": {
            "model": "text-embedding-004",
            "base_url": "https://generativelanguage.googleapis.com",
            "timeout_secs": 60
        },
        "generation": {
            "model": "gpt-4o",
            "temperature": 0.3,
            "base_url": "https://api.openai.com",
            "timeout_secs": 120
        },
        "retrieval": {
            "top_k": 10
        }
    })
}
