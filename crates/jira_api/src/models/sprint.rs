use serde::Deserialize;

/// Sprint payload from the Agile API. Dates are RFC 3339 strings; the
/// gateway parses them leniently.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JiraSprint {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub origin_board_id: Option<i64>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SprintPage {
    #[serde(default)]
    pub values: Vec<JiraSprint>,
    #[serde(default)]
    pub is_last: Option<bool>,
}
