use indoc::indoc;
use serde::Deserialize;
use strum_macros::{Display, EnumIter, EnumString};

const ANALYST_PERSONA: &str = indoc! {"
    You are a stock market analyst. Answer the user's questions using the data returned by the tools.
    Call tools according to what the user asks and only when they are needed. Several tools can be used in a single request.
    Always pass a ticker symbol as the input to a tool.
    Use the tools to find information about market trends, stock prices and other financial data.
"};

const CHARTS_REQUIREMENT: &str = indoc! {"
    Rendering interactive charts and graphs in your response is mandatory.
"};

const DISCLOSURES_REQUIREMENT: &str = indoc! {"
    Every response must also contain two collapsible sections, titled exactly \"Company Overview\" and \"Sentiment Analysis\".
    Fill \"Company Overview\" from the company_overview tool and \"Sentiment Analysis\" from the market_sentiment tool.
"};

/// Which set of mandatory output behaviours the system instruction asks for
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PromptVariant {
    /// Interactive charts only
    #[default]
    Charts,
    /// Charts plus the "Company Overview" and "Sentiment Analysis" sections
    Disclosures,
}

/// Build the fixed system instruction for the given variant.
pub fn system_instruction(variant: PromptVariant) -> String {
    let mut instruction = String::from(ANALYST_PERSONA);
    instruction.push_str(CHARTS_REQUIREMENT);
    if variant == PromptVariant::Disclosures {
        instruction.push_str(DISCLOSURES_REQUIREMENT);
    }
    instruction
}
