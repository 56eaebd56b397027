//! WASM bindings for purchase-order table recovery.
//!
//! This crate provides WebAssembly bindings for use in browsers and Node.js.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use ordex_core::models::config::ExportConfig;
use ordex_core::{
    Consistency, Converter, DocumentSession, Grammar, Record, RecordStats, XlsxExporter,
};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// What the browser shows before the user downloads the spreadsheet.
#[derive(Debug, Serialize)]
pub struct Preview {
    pub grammar: Grammar,
    pub detected: bool,
    pub records: Vec<Record>,
    pub stats: RecordStats,
    pub consistency: Consistency,
    pub warnings: Vec<String>,
}

impl From<DocumentSession> for Preview {
    fn from(session: DocumentSession) -> Self {
        let consistency = session.consistency();
        Self {
            grammar: session.grammar(),
            detected: session.classification.detected,
            records: session.records,
            stats: session.stats,
            consistency,
            warnings: session.warnings,
        }
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn preview_text(converter: &Converter, text: &str) -> Result<Preview, String> {
    converter
        .convert_text(text)
        .map(Preview::from)
        .map_err(|e| e.to_string())
}

fn preview_pdf(converter: &Converter, data: &[u8]) -> Result<Preview, String> {
    converter
        .convert_pdf(data)
        .map(Preview::from)
        .map_err(|e| e.to_string())
}

fn spreadsheet(records: &[Record]) -> Result<Vec<u8>, String> {
    XlsxExporter::from_config(&ExportConfig::default())
        .export(records)
        .map_err(|e| e.to_string())
}

/// Convert already extracted order text.
#[wasm_bindgen]
pub fn convert_text(text: &str) -> Result<JsValue, JsValue> {
    let preview = preview_text(&Converter::new(), text).map_err(|e| JsValue::from_str(&e))?;
    to_js(&preview)
}

/// Convert the bytes of a PDF order.
#[wasm_bindgen]
pub fn convert_pdf(data: &[u8]) -> Result<JsValue, JsValue> {
    let preview = preview_pdf(&Converter::new(), data).map_err(|e| JsValue::from_str(&e))?;
    to_js(&preview)
}

/// Build an XLSX workbook from an array of `{position, code, quantity}`.
#[wasm_bindgen]
pub fn export_xlsx(records: JsValue) -> Result<Vec<u8>, JsValue> {
    let records: Vec<Record> = serde_wasm_bindgen::from_value(records)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    spreadsheet(&records).map_err(|e| JsValue::from_str(&e))
}

/// List the grammar names in classification priority order.
#[wasm_bindgen]
pub fn grammars() -> Vec<String> {
    Grammar::PRIORITY.iter().map(|g| g.name().to_string()).collect()
}

/// Order converter class for browser use.
#[wasm_bindgen(js_name = Converter)]
pub struct WasmConverter {
    converter: Converter,
}

#[wasm_bindgen(js_class = Converter)]
impl WasmConverter {
    /// Create a converter that detects the layout itself.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            converter: Converter::new(),
        }
    }

    /// Force a layout grammar by name, or pass `undefined` to detect again.
    #[wasm_bindgen]
    pub fn set_grammar(&mut self, name: Option<String>) -> Result<(), JsValue> {
        let grammar = name
            .map(|n| n.parse::<Grammar>())
            .transpose()
            .map_err(|e| JsValue::from_str(&e))?;
        self.force(grammar);
        Ok(())
    }

    /// Convert already extracted order text.
    #[wasm_bindgen]
    pub fn convert_text(&self, text: &str) -> Result<JsValue, JsValue> {
        let preview = preview_text(&self.converter, text).map_err(|e| JsValue::from_str(&e))?;
        to_js(&preview)
    }

    /// Convert the bytes of a PDF order.
    #[wasm_bindgen]
    pub fn convert_pdf(&self, data: &[u8]) -> Result<JsValue, JsValue> {
        let preview = preview_pdf(&self.converter, data).map_err(|e| JsValue::from_str(&e))?;
        to_js(&preview)
    }
}

impl WasmConverter {
    fn force(&mut self, grammar: Option<Grammar>) {
        let converter = std::mem::take(&mut self.converter);
        self.converter = converter.with_forced_grammar(grammar);
    }
}

impl Default for WasmConverter {
    fn default() -> Self {
        Self::new()
    }
}
