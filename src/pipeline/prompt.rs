//! Prompt construction for query drafting and correction
//!
//! Prompts are deterministic string templates; the table description and
//! field list are interpolated verbatim, with no truncation.

use crate::schema::TableDefinition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A system/user message pair sent to the completion service
#[derive(Debug, Clone, PartialEq)]
pub struct ChatPrompt {
    pub system: String,
    pub user: String,
}

/// Sampling parameters attached to one prompt mode
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    /// Fixed seed for reproducible output; `None` leaves sampling free
    #[serde(default)]
    pub seed: Option<u64>,
}

const SPECIAL_POLICY: &str = "You are an AI assistant designed to identify the appropriate table from a given set of table schemas and generate SQL Server (MSSQL) queries to fetch data. Your focus should be on:

- Understanding the intent from the 'table_description' within each table schema.
- Aggregating data only over quarters, never over a complete year.
- Restricting any aggregate calculations to the last quarter available in that year, unless the user specifies a particular quarter.
- Producing a single query which can be executed directly from the output without making any changes.
- If the user is looking for AUM, always show the sum of Values for the period of interest. Do not show the Values of Total Categories separately.
An example query and result is given here to understand the complexity of the query expected.
query: What is the worst and best deals of mandate 37007 in 2024
answer: SELECT * FROM (SELECT TOP 1 scp.MandateId, scp.MarketValue, dpu.DealId, di.DealName, DealStatus='Best'
        FROM ShareClassPerformance scp
        JOIN DealPriceUpdate dpu ON dpu.ISIN = scp.ISIN
        JOIN DealInformation di ON di.DealId = dpu.DealId
        WHERE scp.MandateId = 37007 AND Year = 2024 AND Quarter = (
                                                                    SELECT MAX(Quarter)
                                                                    FROM Holdings
                                                                    WHERE MandateId = 37007 AND Year = 2023
                                                                )
        ORDER BY MarketValue DESC) a
        UNION
        SELECT * FROM (SELECT TOP 1 scp.MandateId, scp.MarketValue, dpu.DealId, di.DealName, DealStatus='Worst'
        FROM ShareClassPerformance scp
        JOIN DealPriceUpdate dpu ON dpu.ISIN = scp.ISIN
        JOIN DealInformation di ON di.DealId = dpu.DealId
        WHERE scp.MandateId = 37007 AND Year = 2024 AND Quarter = (
                                                                    SELECT MAX(Quarter)
                                                                    FROM Holdings
                                                                    WHERE MandateId = 37007 AND Year = 2023
                                                                )
        ORDER BY MarketValue ASC) b";

/// Prompt builder for query drafting and correction
pub struct PromptBuilder;

impl PromptBuilder {
    /// Draft prompt for the per-intent flow, grounded on a single table
    pub fn draft(
        user_query: &str,
        user_id: &str,
        table: &str,
        definition: &TableDefinition,
    ) -> ChatPrompt {
        let system = format!(
            "You are an AI assistant who can write MySQL queries to fetch data from the following table '{table}'. \
             The table stores the {description}. The fields are {fields}. \
             Just produce the SQL query alone. Do not add any strings like ```sql```; the output must be directly executable.",
            table = table,
            description = definition.description,
            fields = render_fields(definition),
        );
        let user = format!("user query: {user_query}, user_id: {user_id}");
        ChatPrompt { system, user }
    }

    /// Policy-constrained prompt over the entire schema; the model picks
    /// the table(s) and joins itself
    pub fn special(user_query: &str, tables: &BTreeMap<String, TableDefinition>) -> ChatPrompt {
        let system = format!(
            "{SPECIAL_POLICY}\n\
             Generate only a SQL Server query based on the provided table schema:\n{schema}\n\
             The result should not contain any strings like ```sql``` or any system messages or instructions. \
             The query should be directly executable in SQL Server.",
            schema = render_schema(tables),
        );
        let user = format!("user query: {user_query}");
        ChatPrompt { system, user }
    }

    /// Correction prompt for a draft that tripped the row-limiting marker
    pub fn correction(draft_sql: &str) -> ChatPrompt {
        let system = "You are a helpful assistant who can identify the errors in the given SQL query \
                      and convert it into a fully functional SQL Server query (MSSQL query). \
                      The response should be a MSSQL query that should not contain any strings like ```sql``` \
                      or any system messages or instructions. The output text should be directly executable."
            .to_string();
        let user = format!("user query: {draft_sql}");
        ChatPrompt { system, user }
    }
}

/// Render a field map as `{Column: type, ...}`, preserving names and
/// declared types verbatim
fn render_fields(definition: &TableDefinition) -> String {
    let pairs: Vec<String> = definition
        .fields
        .iter()
        .map(|(column, declared_type)| format!("{column}: {declared_type}"))
        .collect();
    format!("{{{}}}", pairs.join(", "))
}

/// Render every table definition for the full-schema prompt
fn render_schema(tables: &BTreeMap<String, TableDefinition>) -> String {
    let mut out = String::new();
    for (name, definition) in tables {
        out.push_str(&format!(
            "table: {name}\ntable_description: {description}\nfields: {fields}\n\n",
            description = definition.description,
            fields = render_fields(definition),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn holdings() -> TableDefinition {
        TableDefinition {
            description: "current holdings of each mandate per quarter".to_string(),
            fields: BTreeMap::from([
                ("MandateId".to_string(), "int".to_string()),
                ("Year".to_string(), "int".to_string()),
                ("Quarter".to_string(), "int".to_string()),
                ("MarketValue".to_string(), "decimal".to_string()),
            ]),
        }
    }

    #[test]
    fn draft_embeds_table_description_and_fields_verbatim() {
        let prompt = PromptBuilder::draft("show my current positions", "37007", "Holdings", &holdings());

        assert!(prompt.system.contains("'Holdings'"));
        assert!(prompt
            .system
            .contains("current holdings of each mandate per quarter"));
        for field in ["MandateId: int", "Year: int", "Quarter: int", "MarketValue: decimal"] {
            assert!(prompt.system.contains(field), "missing field: {field}");
        }
        assert_eq!(
            prompt.user,
            "user query: show my current positions, user_id: 37007"
        );
    }

    #[rstest]
    #[case("never over a complete year")]
    #[case("last quarter available in that year")]
    #[case("sum of Values for the period of interest")]
    #[case("directly executable in SQL Server")]
    fn special_carries_aggregation_policy(#[case] needle: &str) {
        let tables = BTreeMap::from([("Holdings".to_string(), holdings())]);
        let prompt = PromptBuilder::special("what is my AUM in 2024", &tables);
        assert!(prompt.system.contains(needle), "missing: {needle}");
    }

    #[test]
    fn special_embeds_every_table() {
        let tables = BTreeMap::from([
            ("Holdings".to_string(), holdings()),
            (
                "DealInformation".to_string(),
                TableDefinition {
                    description: "static deal reference data".to_string(),
                    fields: BTreeMap::from([("DealId".to_string(), "int".to_string())]),
                },
            ),
        ]);
        let prompt = PromptBuilder::special("best deals", &tables);

        assert!(prompt.system.contains("table: Holdings"));
        assert!(prompt.system.contains("table: DealInformation"));
        assert!(prompt.system.contains("static deal reference data"));
        assert_eq!(prompt.user, "user query: best deals");
    }

    #[test]
    fn correction_wraps_the_draft() {
        let prompt = PromptBuilder::correction("SELECT * FROM Holdings LIMIT 5");
        assert_eq!(prompt.user, "user query: SELECT * FROM Holdings LIMIT 5");
        assert!(prompt.system.contains("fully functional SQL Server query"));
    }

    #[test]
    fn render_fields_preserves_declared_types() {
        let rendered = render_fields(&holdings());
        assert!(rendered.starts_with('{'));
        assert!(rendered.ends_with('}'));
        assert!(rendered.contains("MarketValue: decimal"));
    }
}
