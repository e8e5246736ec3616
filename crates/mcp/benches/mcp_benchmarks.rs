//! MCP performance benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

fn benchmark_json_parsing(c: &mut Criterion) {
    let tool_response = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": {
            "tools": [
                {
                    "name": "test_tool",
                    "description": "A test tool for benchmarking",
                    "input_schema": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "count": { "type": "integer" }
                        },
                        "required": ["name"]
                    }
                }
            ]
        }
    });

    let json_str = tool_response.to_string();

    c.bench_function("json_parse_tool_response", |b| {
        b.iter(|| {
            let _: serde_json::Value = serde_json::from_str(black_box(&json_str)).unwrap();
        })
    });

    c.bench_function("json_serialize_tool_response", |b| {
        b.iter(|| {
            let _ = black_box(&tool_response).to_string();
        })
    });
}

fn benchmark_rate_limiter(c: &mut Criterion) {
    use agentic_mcp::{RateLimitConfig, RateLimiter};

    let limiter = RateLimiter::new(RateLimitConfig::permissive());

    c.bench_function("rate_limiter_check", |b| {
        b.iter(|| {
            let _ = black_box(&limiter).check();
        })
    });
}

fn benchmark_tool_definition_serialization(c: &mut Criterion) {
    use agentic_mcp::ToolDefinition;

    let definition = ToolDefinition::new(
        "test_tool",
        Some("A test tool for benchmarking JSON serialization performance".to_string()),
        json!({
            "type": "object",
            "properties": {
                "input": { "type": "string" },
                "options": {
                    "type": "object",
                    "properties": {
                        "verbose": { "type": "boolean" },
                        "limit": { "type": "integer" }
                    }
                }
            },
            "required": ["input"]
        }),
    );

    c.bench_function("tool_definition_serialize", |b| {
        b.iter(|| {
            let _ = serde_json::to_string(black_box(&definition)).unwrap();
        })
    });

    let json_str = serde_json::to_string(&definition).unwrap();
    c.bench_function("tool_definition_deserialize", |b| {
        b.iter(|| {
            let _: ToolDefinition = serde_json::from_str(black_box(&json_str)).unwrap();
        })
    });
}

fn benchmark_registry_parsing(c: &mut Criterion) {
    use agentic_mcp::McpConfig;

    let raw = json!({
        "mcpServers": {
            "clock": { "command": "clock-server", "args": ["--utc"] },
            "search": { "command": "https://tools.example.com/mcp", "transport": "sse", "enabled": false }
        }
    })
    .to_string();

    c.bench_function("mcp_config_parse", |b| {
        b.iter(|| {
            let _ = McpConfig::parse(black_box(&raw)).unwrap();
        })
    });
}

criterion_group!(
    benches,
    benchmark_json_parsing,
    benchmark_rate_limiter,
    benchmark_tool_definition_serialization,
    benchmark_registry_parsing
);
criterion_main!(benches);
