//! Tool declarations and registry
//!
//! The registry only describes what the oracle may call. Execution lives in
//! the orchestrator, which dispatches on [`ToolName`].

use crate::models::ToolName;
use serde::Serialize;
use serde_json::{json, Value};

/// A capability advertised to the oracle: name, description, JSON schema.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ToolDeclaration {
    pub name: ToolName,
    pub description: &'static str,
    pub parameters: Value,
}

impl ToolDeclaration {
    pub fn search_products() -> Self {
        Self {
            name: ToolName::SearchProducts,
            description: "Search for products in the store catalog. Returns up to 2 most relevant products based on the search query.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query to find relevant products (e.g., \"phone\", \"watch\", \"present for dad\")"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    pub fn convert_currencies() -> Self {
        Self {
            name: ToolName::ConvertCurrencies,
            description: "Convert an amount from one currency to another using current exchange rates.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "amount": {
                        "type": "number",
                        "description": "The amount to convert (must be a positive number)"
                    },
                    "fromCurrency": {
                        "type": "string",
                        "description": "The source currency code (e.g., \"USD\", \"EUR\", \"CAD\")"
                    },
                    "toCurrency": {
                        "type": "string",
                        "description": "The target currency code (e.g., \"USD\", \"EUR\", \"CAD\")"
                    }
                },
                "required": ["amount", "fromCurrency", "toCurrency"]
            }),
        }
    }
}

/// Ordered set of tool declarations
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolDeclaration>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registering a name twice replaces the earlier declaration.
    pub fn register(&mut self, tool: ToolDeclaration) {
        match self.tools.iter_mut().find(|t| t.name == tool.name) {
            Some(existing) => *existing = tool,
            None => self.tools.push(tool),
        }
    }

    pub fn get(&self, name: ToolName) -> Option<&ToolDeclaration> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn declarations(&self) -> &[ToolDeclaration] {
        &self.tools
    }

    pub fn list(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry with the product search and currency conversion tools.
pub fn create_default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(ToolDeclaration::search_products());
    registry.register(ToolDeclaration::convert_currencies());
    registry
}
