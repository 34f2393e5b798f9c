// Analysis result model.
//
// The assembler embeds a summary and a transcript; where they come from is
// behind the `Analyzer` trait. Results travel as JSON with camelCase keys
// (`keyPoints`), the shape a structured-output model call returns.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Instruction given to a structured-output analysis model.
pub const SYSTEM_INSTRUCTION: &str = "You are an expert video analyst and transcriptionist. \
Your task is to process the provided video file and generate a structured analysis.\n\
1. Transcribe the spoken audio verbatim.\n\
2. Provide a high-quality abstractive summary of the content.\n\
3. Extract 3-5 key bullet points.\n\
4. Determine the overall sentiment.\n\n\
Return the response in strictly valid JSON format.";

/// User prompt sent alongside the media.
pub const ANALYZE_PROMPT: &str =
    "Analyze this video. Generate a transcript, summary, key points, and sentiment.";

/// Expected number of key points (inclusive).
pub const KEY_POINTS_RANGE: (usize, usize) = (3, 5);

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Positive => "Positive",
            Self::Neutral => "Neutral",
            Self::Negative => "Negative",
        })
    }
}

/// Structured analysis of a media file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub transcript: String,
    pub summary: String,
    pub key_points: Vec<String>,
    pub sentiment: Sentiment,
}

impl AnalysisResult {
    /// Decode a model response.
    ///
    /// Surrounding whitespace and a Markdown code fence (` ```json ... ``` `)
    /// are tolerated. A key-point count outside 3-5 is logged, not rejected.
    pub fn from_json(text: &str) -> Result<Self, AnalysisError> {
        let body = strip_code_fence(text.trim());
        if body.is_empty() {
            return Err(AnalysisError::EmptyResponse);
        }
        let result: Self = serde_json::from_str(body)?;
        let (min, max) = KEY_POINTS_RANGE;
        if !(min..=max).contains(&result.key_points.len()) {
            log::warn!(
                "analysis has {} key points, expected {min}-{max}",
                result.key_points.len()
            );
        }
        Ok(result)
    }

    pub fn to_json(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// JSON schema describing [`AnalysisResult`] for structured-output requests.
pub fn response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "transcript": {
                "type": "string",
                "description": "The full verbatim transcript of the video audio."
            },
            "summary": {
                "type": "string",
                "description": "A concise, abstractive summary of the video content."
            },
            "keyPoints": {
                "type": "array",
                "items": { "type": "string" },
                "description": "3 to 5 key takeaways or points from the video."
            },
            "sentiment": {
                "type": "string",
                "enum": ["Positive", "Neutral", "Negative"],
                "description": "The overall sentiment of the content."
            }
        },
        "required": ["transcript", "summary", "keyPoints", "sentiment"]
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (`json`) on the opening fence line.
    let rest = match rest.find('\n') {
        Some(nl) => &rest[nl + 1..],
        None => return "",
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

// ---------------------------------------------------------------------------
// Analyzer seam
// ---------------------------------------------------------------------------

/// Produces an analysis for a media buffer.
pub trait Analyzer {
    fn analyze(&self, media: &[u8], mime_type: &str) -> Result<AnalysisResult, AnalysisError>;
}

/// A fixed result, e.g. one decoded earlier.
impl Analyzer for AnalysisResult {
    fn analyze(&self, _media: &[u8], _mime_type: &str) -> Result<AnalysisResult, AnalysisError> {
        Ok(self.clone())
    }
}

/// Reads a previously produced analysis from a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileAnalyzer {
    path: PathBuf,
}

impl JsonFileAnalyzer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Analyzer for JsonFileAnalyzer {
    fn analyze(&self, media: &[u8], mime_type: &str) -> Result<AnalysisResult, AnalysisError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| AnalysisError::Io {
            path: self.path.clone(),
            source,
        })?;
        log::debug!(
            "analysis for {} bytes of {mime_type} loaded from {}",
            media.len(),
            self.path.display()
        );
        AnalysisResult::from_json(&text)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no response received from the analyzer")]
    EmptyResponse,
    #[error("malformed analysis JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
