use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRecord {
    pub kind: String,
    pub slug: String,
    pub title: String,
    pub date: String,
    pub file: String,
    pub url: String,
}
