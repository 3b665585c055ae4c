use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn default_position() -> u32 {
    1
}

fn default_position_length() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub code: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectResponse {
    pub response: SelectBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectBody {
    #[serde(rename = "numFound")]
    pub num_found: u64,
    #[serde(default)]
    pub docs: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub analysis: AnalysisBody,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisBody {
    #[serde(default)]
    pub field_types: HashMap<String, FieldTypeAnalysis>,
}

/// Index-time analysis chain for one field type. With `json.nl=arrmap` every
/// stage is rendered as a single-key object, in chain order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldTypeAnalysis {
    #[serde(default)]
    pub index: Vec<HashMap<String, StageOutput>>,
}

/// Output of one analysis stage: char filters emit plain text, tokenizers
/// and token filters emit token lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StageOutput {
    Tokens(Vec<AnalysisToken>),
    Text(String),
}

impl StageOutput {
    pub fn texts(&self) -> Vec<String> {
        match self {
            StageOutput::Tokens(tokens) => tokens.iter().map(|t| t.text.clone()).collect(),
            StageOutput::Text(text) => vec![text.clone()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisToken {
    pub text: String,
    #[serde(default = "default_position")]
    pub position: u32,
    #[serde(rename = "org.apache.lucene.analysis.tokenattributes.PositionLengthAttribute#positionLength")]
    #[serde(default = "default_position_length")]
    pub position_length: u32,
    #[serde(default)]
    pub start: Option<u32>,
    #[serde(default)]
    pub end: Option<u32>,
}

/// A named stage of an analysis chain, with the class name reduced to its
/// last `.` segment (`solr.PorterStemFilter` -> `PorterStemFilter`).
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisStage {
    pub name: String,
    pub output: StageOutput,
}

impl AnalysisStage {
    pub fn from_qualified(qualified: &str, output: StageOutput) -> Self {
        let name = qualified.rsplit('.').next().unwrap_or(qualified).to_string();
        AnalysisStage { name, output }
    }
}
