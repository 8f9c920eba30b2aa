//! Backend processing interface (consumed)
//!
//! One request per pipeline invocation: a JSON body carrying the encoded
//! artifact under a modality-specific key plus a flat options object. The
//! response is either a preprocessing result (`preprocessing_steps` +
//! `processed_<modality>`) or an augmentation result (`augmentation_steps` +
//! `augmented_<modality>`). Transport is an external collaborator; this
//! module only owns the wire shapes and their conversion into engine types.
//!
//! The engine trusts whatever step graph it receives; no validation of
//! step semantics happens here.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use stepscope_core::{EditRecord, Error, Modality, Result, TextStep};

/// Padding token emitted by text preprocessing
pub const PAD_TOKEN: &str = "<PAD>";

/// Text preprocessing options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextPreprocessOptions {
    pub case_normalization: bool,
    pub punctuation_removal: bool,
    pub stopword_removal: bool,
    pub padding: bool,
    pub padding_length: usize,
}

impl Default for TextPreprocessOptions {
    fn default() -> Self {
        Self {
            case_normalization: false,
            punctuation_removal: false,
            stopword_removal: false,
            padding: false,
            padding_length: 20,
        }
    }
}

/// An augmentation toggle with a word budget
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WordCountOption {
    pub enabled: bool,
    pub n_words: usize,
}

impl Default for WordCountOption {
    fn default() -> Self {
        Self {
            enabled: false,
            n_words: 3,
        }
    }
}

/// Text augmentation options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextAugmentOptions {
    pub synonym_replacement: WordCountOption,
    pub mlm_replacement: WordCountOption,
    pub random_insertion: WordCountOption,
    pub random_deletion: WordCountOption,
}

/// Image preprocessing options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagePreprocessOptions {
    pub resize: bool,
    pub resize_width: u32,
    pub resize_height: u32,
    pub normalize: bool,
    pub grayscale: bool,
    pub blur: bool,
    pub blur_kernel: u32,
}

impl Default for ImagePreprocessOptions {
    fn default() -> Self {
        Self {
            resize: false,
            resize_width: 224,
            resize_height: 224,
            normalize: false,
            grayscale: false,
            blur: false,
            blur_kernel: 3,
        }
    }
}

/// Image augmentation options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageAugmentOptions {
    pub rotation: bool,
    pub flip: bool,
    pub brightness: bool,
    pub noise: bool,
}

/// Audio preprocessing options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioPreprocessOptions {
    pub resample: bool,
    pub target_sample_rate: u32,
    pub normalize: bool,
    pub noise_reduction: bool,
    pub mfcc: bool,
    pub n_mfcc: usize,
}

impl Default for AudioPreprocessOptions {
    fn default() -> Self {
        Self {
            resample: false,
            target_sample_rate: 16_000,
            normalize: false,
            noise_reduction: false,
            mfcc: false,
            n_mfcc: 13,
        }
    }
}

/// Audio augmentation options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioAugmentOptions {
    pub time_stretch: bool,
    pub pitch_shift: bool,
    pub noise: bool,
    pub time_mask: bool,
    pub frequency_mask: bool,
}

/// 3D preprocessing options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreeDPreprocessOptions {
    pub normalize: bool,
    pub center: bool,
    pub simplify: bool,
    pub simplify_ratio: f32,
    pub smooth: bool,
    pub smooth_iterations: u32,
}

impl Default for ThreeDPreprocessOptions {
    fn default() -> Self {
        Self {
            normalize: false,
            center: false,
            simplify: false,
            simplify_ratio: 0.5,
            smooth: false,
            smooth_iterations: 1,
        }
    }
}

/// A bare augmentation toggle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Toggle {
    pub enabled: bool,
}

/// A toggle with a scalar parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaledToggle {
    pub enabled: bool,
    pub factor: f32,
}

impl Default for ScaledToggle {
    fn default() -> Self {
        Self {
            enabled: false,
            factor: 1.0,
        }
    }
}

/// 3D augmentation options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreeDAugmentOptions {
    pub rotation: Toggle,
    pub scale: ScaledToggle,
    pub noise: ScaledToggle,
    pub deform: ScaledToggle,
}

/// Terminal token listing produced by text preprocessing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenListing {
    pub tokens: Vec<String>,
    pub token_ids: Vec<i64>,
}

impl TokenListing {
    /// Whether the token at `index` is a padding token
    pub fn is_padding(&self, index: usize) -> bool {
        self.tokens.get(index).map(String::as_str) == Some(PAD_TOKEN)
    }
}

/// One parsed pipeline run with opaque step payloads
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRun {
    pub steps: HashMap<String, String>,
    pub final_payload: String,
    pub tokens: Option<TokenListing>,
}

/// One parsed text augmentation run with per-step edit records
#[derive(Debug, Clone, PartialEq)]
pub struct TextAugmentationRun {
    pub steps: HashMap<String, TextStep>,
    pub final_text: String,
    pub tokens: Option<TokenListing>,
}

/// Build the JSON request body for one pipeline invocation
pub fn request_body<O: Serialize>(modality: Modality, artifact: &str, options: &O) -> Result<Value> {
    let options = serde_json::to_value(options)
        .map_err(|e| Error::Format(format!("unserializable options: {}", e)))?;
    Ok(json!({ modality.payload_key(): artifact, "options": options }))
}

/// Parse a preprocessing response for any modality
///
/// Text responses carry no `processed_text` key; the token listing serves
/// as the final payload, joined on spaces for sequencing.
pub fn parse_preprocessing(modality: Modality, response: &Value) -> Result<PipelineRun> {
    surface_error(response)?;
    let steps = string_map(response.get("preprocessing_steps"));
    let tokens = parse_tokens(response);

    let final_payload = match response.get(modality.processed_key()).and_then(Value::as_str) {
        Some(payload) => payload.to_string(),
        None => match (&tokens, modality) {
            (Some(listing), Modality::Text) => listing.tokens.join(" "),
            _ => {
                return Err(Error::Backend(format!(
                    "response missing {}",
                    modality.processed_key()
                )))
            }
        },
    };

    Ok(PipelineRun {
        steps,
        final_payload,
        tokens,
    })
}

/// Parse an augmentation response whose step payloads are opaque (image,
/// audio, 3D)
pub fn parse_augmentation(modality: Modality, response: &Value) -> Result<PipelineRun> {
    surface_error(response)?;
    let steps = string_map(response.get("augmentation_steps"));
    let final_payload = response
        .get(modality.augmented_key())
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Backend(format!("response missing {}", modality.augmented_key())))?
        .to_string();

    Ok(PipelineRun {
        steps,
        final_payload,
        tokens: parse_tokens(response),
    })
}

/// Parse a text augmentation response, converting each step's changes
/// object into positional edit records
pub fn parse_text_augmentation(response: &Value) -> Result<TextAugmentationRun> {
    surface_error(response)?;

    let mut steps = HashMap::new();
    if let Some(raw_steps) = response.get("augmentation_steps").and_then(Value::as_object) {
        for (name, raw) in raw_steps {
            let text = raw
                .get("text")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::Backend(format!("step {:?} missing text", name)))?
                .to_string();
            let edits = raw.get("changes").map(parse_changes).unwrap_or_default();
            steps.insert(name.clone(), TextStep { text, edits });
        }
    }

    let final_text = response
        .get("augmented_text")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Backend("response missing augmented_text".to_string()))?
        .to_string();

    Ok(TextAugmentationRun {
        steps,
        final_text,
        tokens: parse_tokens(response),
    })
}

/// Convert a changes object (parallel `positions` / word arrays) into
/// tagged edit records
fn parse_changes(changes: &Value) -> Vec<EditRecord> {
    let positions = match usize_vec(changes.get("positions")) {
        Some(positions) => positions,
        None => return Vec::new(),
    };
    let old_words = string_vec(changes.get("old_words"));
    let new_words = string_vec(changes.get("new_words"));
    let deleted_words = string_vec(changes.get("deleted_words"));

    match (old_words, new_words, deleted_words) {
        (Some(old), Some(new), _) => positions
            .into_iter()
            .zip(old)
            .zip(new)
            .map(|((position, old_word), new_word)| EditRecord::Replace {
                position,
                old_word,
                new_word,
            })
            .collect(),
        (None, Some(new), _) => positions
            .into_iter()
            .zip(new)
            .map(|(position, word)| EditRecord::Insert { position, word })
            .collect(),
        (None, None, Some(deleted)) => positions
            .into_iter()
            .zip(deleted)
            .map(|(position, word)| EditRecord::Delete { position, word })
            .collect(),
        _ => {
            log::warn!("changes object carries positions but no word arrays");
            Vec::new()
        }
    }
}

/// Surface `{ "error": ... }` payloads verbatim
fn surface_error(response: &Value) -> Result<()> {
    match response.get("error").and_then(Value::as_str) {
        Some(message) => Err(Error::Backend(message.to_string())),
        None => Ok(()),
    }
}

fn parse_tokens(response: &Value) -> Option<TokenListing> {
    let tokens = string_vec(response.get("tokens"))?;
    let ids = response.get("token_ids")?.as_array()?;
    let mut token_ids = Vec::with_capacity(ids.len());
    for id in ids {
        match id.as_i64() {
            Some(id) => token_ids.push(id),
            None => {
                log::warn!("non-integer token id {}; dropping token listing", id);
                return None;
            }
        }
    }
    Some(TokenListing { tokens, token_ids })
}

fn string_map(value: Option<&Value>) -> HashMap<String, String> {
    value
        .and_then(Value::as_object)
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| Some((k.clone(), v.as_str()?.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

fn string_vec(value: Option<&Value>) -> Option<Vec<String>> {
    Some(
        value?
            .as_array()?
            .iter()
            .filter_map(|v| Some(v.as_str()?.to_string()))
            .collect(),
    )
}

fn usize_vec(value: Option<&Value>) -> Option<Vec<usize>> {
    Some(
        value?
            .as_array()?
            .iter()
            .filter_map(|v| v.as_u64().map(|n| n as usize))
            .collect(),
    )
}
