use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct JiraBoard {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub board_type: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BoardPage {
    #[serde(default)]
    pub values: Vec<JiraBoard>,
    #[serde(default)]
    pub is_last: Option<bool>,
}
