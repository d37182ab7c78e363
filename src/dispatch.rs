//! Chat dispatcher
//!
//! Declares the three weather tools to Gemini and runs the bounded
//! tool-execution loop: the model decides which tool to call and with what
//! arguments, the dispatcher executes it locally and feeds the structured
//! result back, and a plain text reply ends the exchange. The dispatcher
//! performs no business logic of its own.
//!
//! The tool docstrings deliberately spell out the supported cities, each
//! city's historical coverage range, and the date conventions — the model
//! reads them to pick tools and fill arguments, so they are part of the
//! functional contract.

use crate::forecast::ForecastService;
use crate::gemini::{
    Content, FunctionCall, FunctionDeclaration, FunctionResponse, GeminiClient, Tool,
};
use anyhow::Result;
use serde_json::json;
use tracing::{info, warn};

/// Maximum number of tool round-trips before forcing a text reply
const MAX_TOOL_ITERATIONS: usize = 10;

const SUPPORTED_CITIES: &str = r#"Only the following cities are supported: "Abidjan", "Berlin", "Toronto", "Kazan". Providing any other city will result in an error response."#;

const COVERAGE_RANGES: &str = "Historical data availability varies by city. Supported ranges: \
Abidjan 1973-06-01 to 2023-09-05; Kazan 1881-01-01 to 2023-09-05; \
Toronto 2002-06-04 to 2023-08-28; Berlin 1931-01-01 to 2023-09-03.";

const DATE_CONVENTIONS: &str = "Dates use YYYY-MM-DD format. Relative dates (\"tomorrow\", \
\"yesterday\") and dates without a year (\"March 29\") are resolved against today's date at \
call time.";

/// A chat session: one configured client, the tool registry, and the
/// conversation history accumulated across exchanges
pub struct ChatSession {
    client: GeminiClient,
    service: ForecastService,
    tools: Vec<Tool>,
    history: Vec<Content>,
}

impl ChatSession {
    #[must_use]
    pub fn new(client: GeminiClient, service: ForecastService) -> Self {
        Self {
            client,
            service,
            tools: vec![Tool {
                function_declarations: tool_declarations(),
            }],
            history: Vec::new(),
        }
    }

    /// Run one exchange: user text in, final natural-language reply out
    ///
    /// Tool calls requested by the model are executed between the request
    /// and the final reply; the full exchange, tool turns included, is kept
    /// in the session history.
    pub async fn send(&mut self, message: &str) -> Result<String> {
        self.history.push(Content::user_text(message));

        for iteration in 0..MAX_TOOL_ITERATIONS {
            let reply = self.client.generate(&self.history, &self.tools).await?;
            let calls: Vec<FunctionCall> =
                reply.function_calls().into_iter().cloned().collect();

            if calls.is_empty() {
                let text = reply.text();
                self.history.push(reply);
                return Ok(text);
            }

            info!("Iteration {iteration}: executing {} tool call(s)", calls.len());
            self.history.push(reply);

            let mut responses = Vec::with_capacity(calls.len());
            for call in &calls {
                responses.push(self.execute_tool(call)?);
            }
            self.history.push(Content::function_responses(responses));
        }

        warn!("Tool loop hit the iteration cap without a text reply");
        Ok(String::new())
    }

    /// Execute one requested tool call
    ///
    /// Refusals travel back to the model as `{"error": ...}` payloads so it
    /// can narrate them; only genuinely fatal failures propagate.
    fn execute_tool(&self, call: &FunctionCall) -> Result<FunctionResponse> {
        let city = string_arg(call, "city");
        let date = string_arg(call, "date");

        info!("Executing tool: {}", call.name);
        let response = match call.name.as_str() {
            "next_day_weather_forecast" => self.service.next_day_forecast(&city)?.to_json()?,
            "retrieve_data_from_historical_date" => {
                self.service.historical_lookup(&city, &date)?.to_json()?
            }
            "forecast_data_for_future_date" => {
                self.service.future_date_forecast(&city, &date)?.to_json()?
            }
            other => {
                warn!("Model requested unknown tool '{other}'");
                json!({ "error": format!("Unknown tool: {other}") })
            }
        };

        Ok(FunctionResponse {
            name: call.name.clone(),
            response,
        })
    }
}

fn string_arg(call: &FunctionCall, key: &str) -> String {
    call.args
        .get(key)
        .and_then(|value| value.as_str())
        .unwrap_or_default()
        .to_string()
}

/// The three tool declarations, docstrings included
fn tool_declarations() -> Vec<FunctionDeclaration> {
    vec![
        FunctionDeclaration {
            name: "next_day_weather_forecast".to_string(),
            description: format!(
                "Provides a weather forecast for a specific city for the day after the last \
                 known data. The forecast includes average temperature and precipitation in mm, \
                 each with a 95% prediction interval (lower and upper bounds). {SUPPORTED_CITIES}"
            ),
            parameters: json!({
                "type": "object",
                "properties": {
                    "city": {
                        "type": "string",
                        "description": "The name of the city to forecast for."
                    }
                },
                "required": ["city"]
            }),
        },
        FunctionDeclaration {
            name: "retrieve_data_from_historical_date".to_string(),
            description: format!(
                "Retrieves historical weather data (average temperature and precipitation in \
                 mm) for a specific city on a given date. {SUPPORTED_CITIES} {COVERAGE_RANGES} \
                 {DATE_CONVENTIONS}"
            ),
            parameters: json!({
                "type": "object",
                "properties": {
                    "city": {
                        "type": "string",
                        "description": "The name of the city to retrieve historical weather data for."
                    },
                    "date": {
                        "type": "string",
                        "description": "The date of interest in YYYY-MM-DD format."
                    }
                },
                "required": ["city", "date"]
            }),
        },
        FunctionDeclaration {
            name: "forecast_data_for_future_date".to_string(),
            description: format!(
                "Generates a weather forecast for a future date beyond the available \
                 historical data, with a 95% prediction interval for each value. \
                 {SUPPORTED_CITIES} {COVERAGE_RANGES} {DATE_CONVENTIONS}"
            ),
            parameters: json!({
                "type": "object",
                "properties": {
                    "city": {
                        "type": "string",
                        "description": "The name of the city to generate the forecast for."
                    },
                    "date": {
                        "type": "string",
                        "description": "The target date for the forecast in YYYY-MM-DD format."
                    }
                },
                "required": ["city", "date"]
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declarations_cover_all_three_tools() {
        let declarations = tool_declarations();
        let names: Vec<&str> = declarations.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "next_day_weather_forecast",
                "retrieve_data_from_historical_date",
                "forecast_data_for_future_date"
            ]
        );
    }

    #[test]
    fn test_declarations_state_the_contract() {
        for declaration in tool_declarations() {
            assert!(declaration.description.contains("Abidjan"));
            assert!(declaration.parameters["properties"]["city"].is_object());
        }

        // Date-taking tools document ranges and date conventions
        let historical = &tool_declarations()[1];
        assert!(historical.description.contains("1973-06-01"));
        assert!(historical.description.contains("YYYY-MM-DD"));
        assert_eq!(historical.parameters["required"], json!(["city", "date"]));
    }

    #[test]
    fn test_string_arg_extraction() {
        let call = FunctionCall {
            name: "retrieve_data_from_historical_date".to_string(),
            args: json!({"city": "Berlin", "date": "2020-01-01"}),
        };
        assert_eq!(string_arg(&call, "city"), "Berlin");
        assert_eq!(string_arg(&call, "date"), "2020-01-01");
        assert_eq!(string_arg(&call, "missing"), "");
    }
}
