//! Response-shape tests — validates that the JSON bodies handed to callers
//! keep the field names and types the endpoint contract promises.

/// Verify the chat response shape:
/// { session_id, message, answer, sources[] }
#[test]
fn test_chat_response_shape() {
    let response = serde_json::json!({
        "session_id": "abc-123",
        "message": "How do I enable Managed Checkout in a D2C store?",
        "answer": "Open the commerce settings and enable Managed Checkout [1].",
        "sources": [
            {
                "source_type": "document",
                "chunk_id": 42,
                "doc_id": "commerce_guide",
                "doc_title": "Commerce Setup Guide",
                "section_title": "Managed Checkout",
                "page_start": 3,
                "page_end": 4,
                "score": 0.87,
            }
        ],
    });

    assert!(response["session_id"].is_string());
    assert!(response["message"].is_string());
    assert!(response["answer"].is_string());
    assert!(response["sources"].is_array());

    let source = &response["sources"][0];
    assert!(source["source_type"].is_string());
    assert!(source["doc_title"].is_string());
    assert!(source["section_title"].is_string());
    assert!(source["page_start"].is_number());
    assert!(source["page_end"].is_number());
    assert!(source["score"].is_number());
}

/// Verify the debug search response shape:
/// { query, total, results[] } where each result carries both raw leg
/// scores and the blended score.
#[test]
fn test_search_response_shape() {
    let response = serde_json::json!({
        "query": "managed checkout",
        "total": 1,
        "results": [
            {
                "id": 42,
                "doc_id": "commerce_guide",
                "chunk_local_id": 0,
                "doc_title": "Commerce Setup Guide",
                "section_title": "Managed Checkout",
                "section_level": 1,
                "page_start": 3,
                "page_end": 4,
                "content": "Enable managed checkout...",
                "product": "commerce",
                "vector_score": 0.81,
                "fts_score": 5.2,
                "vector_norm": 1.0,
                "fts_norm": 1.0,
                "blended_score": 1.0,
                "boost": 0.0,
            }
        ],
    });

    assert!(response["query"].is_string());
    assert!(response["total"].is_number());
    assert!(response["results"].is_array());

    let result = &response["results"][0];
    assert!(result["doc_id"].is_string());
    assert!(result["chunk_local_id"].is_number());
    assert!(result["blended_score"].is_number());
    assert!(result["boost"].is_number());
}

/// Verify the products response shape: { products: [string] }
#[test]
fn test_products_response_shape() {
    let response = serde_json::json!({
        "products": ["analytics", "commerce", "sales"],
    });
    assert!(response["products"].is_array());
    assert!(response["products"][0].is_string());
}

/// Verify the stats response shape.
#[test]
fn test_stats_response_shape() {
    let response = serde_json::json!({
        "documents": 30,
        "chunks": 480,
        "embeddings": 480,
        "embedding_dimension": 1536,
        "sessions": 12,
        "turns": 87,
        "db_size_mb": 14.2,
        "matrix_loaded": true,
        "matrix_rows": 480,
    });

    assert!(response["documents"].is_number());
    assert!(response["chunks"].is_number());
    assert!(response["embeddings"].is_number());
    assert!(response["embedding_dimension"].is_number());
    assert!(response["sessions"].is_number());
    assert!(response["turns"].is_number());
    assert!(response["db_size_mb"].is_number());
}

/// Verify the error body shape: { error: string }
#[test]
fn test_error_response_shape() {
    let response = serde_json::json!({
        "error": "Invalid input: message must not be empty",
    });
    assert!(response["error"].is_string());
}
