use serde_json::{json, Value};

use crate::models::tool::Tool;

/// Mapping from a tool name to one Alpha Vantage `query` request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketEndpoint {
    pub name: &'static str,
    pub description: &'static str,
    /// Value of the `function` query parameter
    pub function: &'static str,
    /// Query parameter that receives the model's `searchQuery`
    pub query_param: &'static str,
    /// Extra parameters sent verbatim with every call
    pub fixed_params: &'static [(&'static str, &'static str)],
}

pub const CATALOG: &[MarketEndpoint] = &[
    MarketEndpoint {
        name: "stock_quote",
        description: "Provides the latest stock quote for a ticker symbol: price, volume, \
            day high and low, open and previous close. Use this for the current market snapshot.",
        function: "GLOBAL_QUOTE",
        query_param: "symbol",
        fixed_params: &[],
    },
    MarketEndpoint {
        name: "stock_trend_monthly",
        description: "Provides monthly market trends for a ticker symbol: monthly open, high, \
            low, close and volume. Use this for long-term trends and historical performance.",
        function: "TIME_SERIES_MONTHLY",
        query_param: "symbol",
        fixed_params: &[],
    },
    MarketEndpoint {
        name: "stock_trend",
        description: "Provides monthly market trends for a ticker symbol. Use this to find \
            information about market trends, stock prices and other financial data.",
        function: "TIME_SERIES_MONTHLY",
        query_param: "symbol",
        fixed_params: &[],
    },
    MarketEndpoint {
        name: "stock_trend_intraday",
        description: "Provides intraday market trends for a ticker symbol at 5-minute \
            intervals. Use this for price movements during the trading day.",
        function: "TIME_SERIES_INTRADAY",
        query_param: "symbol",
        fixed_params: &[("interval", "5min")],
    },
    MarketEndpoint {
        name: "market_sentiment",
        description: "Provides news-derived market sentiment for a ticker symbol. Use this to \
            gauge how the market currently perceives a company.",
        function: "NEWS_SENTIMENT",
        query_param: "tickers",
        fixed_params: &[],
    },
    MarketEndpoint {
        name: "company_overview",
        description: "Provides a company overview for a ticker symbol: sector, market \
            capitalization, P/E ratio, earnings and other fundamentals.",
        function: "OVERVIEW",
        query_param: "symbol",
        fixed_params: &[],
    },
    MarketEndpoint {
        name: "web_search",
        description: "Looks up securities matching free-form keywords, such as a company \
            name, and returns candidate ticker symbols.",
        function: "SYMBOL_SEARCH",
        query_param: "keywords",
        fixed_params: &[],
    },
];

/// Tools registered when the configuration does not name any
pub const DEFAULT_TOOLS: &[&str] = &[
    "stock_trend_monthly",
    "stock_quote",
    "stock_trend_intraday",
    "market_sentiment",
    "company_overview",
];

/// Find a catalog row by tool name
pub fn lookup(name: &str) -> Option<&'static MarketEndpoint> {
    CATALOG.iter().find(|endpoint| endpoint.name == name)
}

/// Argument schema shared by every market tool: one required `searchQuery`.
pub fn search_query_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "searchQuery": {
                "type": "string",
                "description": "search query"
            }
        },
        "required": ["searchQuery"],
        "additionalProperties": false
    })
}

impl MarketEndpoint {
    /// Declaration sent to the completion service
    pub fn to_tool(&self) -> Tool {
        Tool::new(self.name, self.description, search_query_schema())
    }

    /// Query pairs for one call, without the API key
    pub fn query_pairs<'a>(&'a self, search_query: &'a str) -> Vec<(&'a str, &'a str)> {
        let mut pairs = vec![("function", self.function), (self.query_param, search_query)];
        pairs.extend(self.fixed_params.iter().copied());
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_names_are_unique() {
        let names: HashSet<_> = CATALOG.iter().map(|endpoint| endpoint.name).collect();
        assert_eq!(names.len(), CATALOG.len());
    }

    #[test]
    fn test_defaults_exist_in_catalog() {
        for name in DEFAULT_TOOLS {
            assert!(lookup(name).is_some(), "{} missing from catalog", name);
        }
    }

    #[test]
    fn test_query_pairs() {
        let intraday = lookup("stock_trend_intraday").unwrap();
        assert_eq!(
            intraday.query_pairs("IBM"),
            vec![
                ("function", "TIME_SERIES_INTRADAY"),
                ("symbol", "IBM"),
                ("interval", "5min")
            ]
        );

        let sentiment = lookup("market_sentiment").unwrap();
        assert_eq!(
            sentiment.query_pairs("AAPL"),
            vec![("function", "NEWS_SENTIMENT"), ("tickers", "AAPL")]
        );
    }

    #[test]
    fn test_tool_declaration_schema() {
        let tool = lookup("stock_quote").unwrap().to_tool();
        assert_eq!(tool.name, "stock_quote");
        assert_eq!(tool.parameters["required"], json!(["searchQuery"]));
        assert_eq!(tool.parameters["properties"]["searchQuery"]["type"], "string");
        assert_eq!(tool.parameters["additionalProperties"], json!(false));
    }
}
