// Rendering of server responses. Two strategies: typed table printing
// (comfy-table) and pretty-printed JSON. Every function returns the text
// so the shell decides where it goes.

use crate::api::Product;
use comfy_table::{CellAlignment, Table};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt::Write as _;

pub const RESPONSE_BANNER: &str = "<- Server Response:";
pub const EMPTY_INVENTORY: &str = "No products found in inventory.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Typed tables and messages
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

fn money(value: f64) -> String {
    format!("${:.2}", value)
}

/// Table of products with ID, NAME, PRICE and QUANTITY columns.
pub fn products_table(products: &[Product]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "NAME", "PRICE", "QUANTITY"]);
    for p in products {
        table.add_row(vec![
            p.id.clone(),
            p.name.clone(),
            money(p.price),
            p.quantity.to_string(),
        ]);
    }
    for index in [2, 3] {
        if let Some(column) = table.column_mut(index) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }
    table
}

#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    format: OutputFormat,
}

impl Renderer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    fn framed(body: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{RESPONSE_BANNER}");
        for line in body.lines() {
            let _ = writeln!(out, "   {line}");
        }
        out
    }

    /// A single product, preceded by `success` when the action has one.
    pub fn product(&self, success: Option<&str>, product: &Product) -> serde_json::Result<String> {
        let mut body = String::new();
        if let Some(message) = success {
            let _ = writeln!(body, "{message}");
        }
        match self.format {
            OutputFormat::Table => {
                let _ = write!(body, "{}", products_table(std::slice::from_ref(product)));
            }
            OutputFormat::Json => body.push_str(&serde_json::to_string_pretty(product)?),
        }
        Ok(Self::framed(&body))
    }

    pub fn products(&self, products: &[Product]) -> serde_json::Result<String> {
        let body = match self.format {
            OutputFormat::Table if products.is_empty() => EMPTY_INVENTORY.to_string(),
            OutputFormat::Table => products_table(products).to_string(),
            OutputFormat::Json => serde_json::to_string_pretty(products)?,
        };
        Ok(Self::framed(&body))
    }

    pub fn message(&self, message: &str) -> serde_json::Result<String> {
        let body = match self.format {
            OutputFormat::Table => message.to_string(),
            OutputFormat::Json => serde_json::to_string_pretty(&json!({ "message": message }))?,
        };
        Ok(Self::framed(&body))
    }

    pub fn inventory_value(&self, value: f64) -> serde_json::Result<String> {
        let body = match self.format {
            OutputFormat::Table => format!("Total Inventory Value: {}", money(value)),
            OutputFormat::Json => {
                serde_json::to_string_pretty(&json!({ "inventory_value": value }))?
            }
        };
        Ok(Self::framed(&body))
    }
}
