//! WebAssembly bindings for Listwright
//!
//! Thin wrappers over `lw-rules`. Each export has a plain Rust twin that
//! returns `Result<_, String>` so it can be tested off the wasm target.

use wasm_bindgen::prelude::*;

use lw_rules::{
    convert, deserialize_rules, generate, generate_filter_list, parse_filter_list, parse_rule as parse_line,
    serialize_rules, ConversionTarget, ListItem, ParserOptions, RuleNode,
};

fn options_from_json(options: Option<String>) -> Result<ParserOptions, String> {
    match options {
        Some(json) if !json.trim().is_empty() => {
            serde_json::from_str(&json).map_err(|e| format!("Invalid parser options: {}", e))
        }
        _ => Ok(ParserOptions::default()),
    }
}

fn to_js(json: &str) -> Result<JsValue, JsValue> {
    js_sys::JSON::parse(json)
}

fn warn_invalid(items: &[ListItem]) {
    for item in items {
        if let RuleNode::Invalid(invalid) = &item.node {
            web_sys::console::warn_1(&JsValue::from_str(&format!(
                "line {}: {}",
                item.line, invalid.error.message
            )));
        }
    }
}

// =============================================================================
// Plain Rust API
// =============================================================================

/// Parse one line to its JSON AST.
pub fn parse_rule_json(line: &str, options: Option<String>) -> Result<String, String> {
    let options = options_from_json(options)?;
    let node = parse_line(line, &options).map_err(|e| e.to_string())?;
    serde_json::to_string(&node).map_err(|e| e.to_string())
}

/// Convert one line, returning the generated replacement lines.
pub fn convert_line(line: &str, target: &str) -> Result<Vec<String>, String> {
    let target: ConversionTarget = target.parse().map_err(|e: lw_rules::RuleConversionError| e.to_string())?;
    let node = parse_line(line, &ParserOptions::default()).map_err(|e| e.to_string())?;
    let converted = convert(&node, target).map_err(|e| e.to_string())?;
    Ok(converted.into_nodes().iter().map(generate).collect())
}

/// Encode a whole list. Returns the bytes and the lines that failed to parse.
pub fn serialize_text(text: &str, options: Option<String>) -> Result<(Vec<u8>, Vec<ListItem>), String> {
    let options = options_from_json(options)?;
    let list = parse_filter_list(text, &options);
    let invalid: Vec<ListItem> = list.invalid().cloned().collect();
    let nodes = list.into_nodes();
    let bytes = serialize_rules(&nodes).map_err(|e| e.to_string())?;
    Ok((bytes, invalid))
}

/// Decode bytes back to list text.
pub fn deserialize_bytes(bytes: &[u8]) -> Result<String, String> {
    let nodes = deserialize_rules(bytes).map_err(|e| e.to_string())?;
    Ok(generate_filter_list(&nodes, true))
}

// =============================================================================
// Exports
// =============================================================================

#[wasm_bindgen]
pub fn parse_rule(line: &str, options: Option<String>) -> Result<JsValue, JsValue> {
    let json = parse_rule_json(line, options).map_err(|e| JsValue::from_str(&e))?;
    to_js(&json)
}

#[wasm_bindgen]
pub fn convert_rule(line: &str, target: &str) -> Result<js_sys::Array, JsValue> {
    let lines = convert_line(line, target).map_err(|e| JsValue::from_str(&e))?;
    let array = js_sys::Array::new();
    for line in lines {
        array.push(&JsValue::from_str(&line));
    }
    Ok(array)
}

#[wasm_bindgen]
pub fn serialize_list(text: &str, options: Option<String>) -> Result<Vec<u8>, JsValue> {
    let (bytes, invalid) = serialize_text(text, options).map_err(|e| JsValue::from_str(&e))?;
    warn_invalid(&invalid);
    Ok(bytes)
}

#[wasm_bindgen]
pub fn deserialize_list(bytes: &[u8]) -> Result<String, JsValue> {
    deserialize_bytes(bytes).map_err(|e| JsValue::from_str(&e))
}

#[wasm_bindgen]
pub fn list_stats(text: &str) -> Result<JsValue, JsValue> {
    let stats = parse_filter_list(text, &ParserOptions::default()).stats();
    let json = serde_json::to_string(&stats).map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_to_json() {
        let json = parse_rule_json("example.org##.banner", None).expect("parse");
        let value: serde_json::Value = serde_json::from_str(&json).expect("json");
        assert!(value.is_object());
        assert!(json.contains("example.org"));

        let err = parse_rule_json("x", Some("{\"tolerant\": 1}".into())).expect_err("bad options");
        assert!(err.starts_with("Invalid parser options"));
    }

    #[test]
    fn converts_lines() {
        assert_eq!(
            convert_line("example.com##p:matches-path(/foo)", "adg").expect("convert"),
            vec!["[$path=/foo]example.com##p"]
        );
        assert!(convert_line("example.com##p", "abp").is_err());
    }

    #[test]
    fn list_round_trip_reports_invalid_lines() {
        let text = "||ads.example.com^\nexample.org##\nexample.org##.banner";
        let (bytes, invalid) = serialize_text(text, None).expect("serialize");
        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].line, 2);
        assert_eq!(deserialize_bytes(&bytes).expect("deserialize"), text);
    }

    #[test]
    fn rejects_garbage_bytes() {
        assert!(deserialize_bytes(&[1, 2, 3]).is_err());
    }
}
