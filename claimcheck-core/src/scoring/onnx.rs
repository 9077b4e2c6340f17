//! Local ONNX scoring backends
//!
//! Uses the `ort` crate for ONNX Runtime and `tokenizers` for preprocessing.
//! Four model heads share the same session plumbing:
//! - `OnnxEmbedder` — bi-encoder, masked mean-pooling + L2 norm
//! - `OnnxCrossEncoder` — relevance head, single logit
//! - `OnnxEntailmentModel` — NLI head, 3 logits + softmax
//! - `OnnxClaimClassifier` — claim-only factuality head, 3 logits + softmax
//!
//! Inference is CPU-bound and runs on the blocking thread pool; the session
//! mutex serializes concurrent calls to one model instance.

use async_trait::async_trait;
use ndarray::{Array1, ArrayView2};
use ort::session::Session;
use ort::value::Tensor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokenizers::Tokenizer;

use super::{
    ClaimClassifier, CrossEncoderBackend, EmbeddingBackend, EntailmentBackend, ScoringError,
};

/// Tokenizer file shipped next to each ONNX model: `<stem>-tokenizer.json`.
pub fn sibling_tokenizer(model_path: &Path) -> PathBuf {
    let stem = model_path
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    model_path.with_file_name(format!("{stem}-tokenizer.json"))
}

/// Shared session + tokenizer state for one loaded model.
struct OnnxModel {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
}

impl OnnxModel {
    fn load(model_path: &str) -> Result<Self, ScoringError> {
        let model_path = PathBuf::from(shellexpand::tilde(model_path).into_owned());
        let tokenizer_path = sibling_tokenizer(&model_path);

        if !model_path.exists() {
            return Err(ScoringError::ModelNotFound {
                path: model_path.display().to_string(),
            });
        }
        if !tokenizer_path.exists() {
            return Err(ScoringError::ModelNotFound {
                path: tokenizer_path.display().to_string(),
            });
        }

        let session = Session::builder()
            .and_then(|b| Ok(b.with_intra_threads(1)?))
            .and_then(|mut b| b.commit_from_file(&model_path))
            .map_err(|e| ScoringError::OnnxInference(e.to_string()))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| ScoringError::Tokenizer(e.to_string()))?;

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
        })
    }
}

/// Token-id buffers for one encoded input.
struct Encoded {
    input_ids: Vec<i64>,
    attention_mask: Vec<i64>,
    token_type_ids: Vec<i64>,
}

fn encode_single(tokenizer: &Tokenizer, text: &str) -> Result<Encoded, ScoringError> {
    let encoding = tokenizer
        .encode(text, true)
        .map_err(|e| ScoringError::Tokenizer(e.to_string()))?;
    Ok(to_buffers(&encoding))
}

fn encode_pair(tokenizer: &Tokenizer, a: &str, b: &str) -> Result<Encoded, ScoringError> {
    let encoding = tokenizer
        .encode((a, b), true)
        .map_err(|e| ScoringError::Tokenizer(e.to_string()))?;
    Ok(to_buffers(&encoding))
}

fn to_buffers(encoding: &tokenizers::Encoding) -> Encoded {
    Encoded {
        input_ids: encoding.get_ids().iter().map(|&id| id as i64).collect(),
        attention_mask: encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect(),
        token_type_ids: encoding.get_type_ids().iter().map(|&t| t as i64).collect(),
    }
}

/// Run one forward pass and return the flattened output with its shape.
fn run_forward(session: &mut Session, encoded: &Encoded) -> Result<(Vec<i64>, Vec<f32>), ScoringError> {
    let seq_len = encoded.input_ids.len();
    let shape = vec![1i64, seq_len as i64];

    let input_ids_tensor = Tensor::from_array((shape.clone(), encoded.input_ids.clone()))
        .map_err(|e| ScoringError::OnnxInference(e.to_string()))?;
    let attention_mask_tensor = Tensor::from_array((shape.clone(), encoded.attention_mask.clone()))
        .map_err(|e| ScoringError::OnnxInference(e.to_string()))?;
    let token_type_ids_tensor = Tensor::from_array((shape, encoded.token_type_ids.clone()))
        .map_err(|e| ScoringError::OnnxInference(e.to_string()))?;

    let inputs = ort::inputs! {
        "input_ids" => input_ids_tensor,
        "attention_mask" => attention_mask_tensor,
        "token_type_ids" => token_type_ids_tensor,
    };

    let outputs = session
        .run(inputs)
        .map_err(|e| ScoringError::OnnxInference(e.to_string()))?;

    let (out_shape, data) = outputs[0]
        .try_extract_tensor::<f32>()
        .map_err(|e| ScoringError::OnnxInference(e.to_string()))?;

    Ok((out_shape.to_vec(), data.to_vec()))
}

/// Numerically stable softmax over a logit slice.
fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn three_way(probs: Vec<f32>) -> Result<[f32; 3], ScoringError> {
    if probs.len() != 3 {
        return Err(ScoringError::InvalidDimensions {
            expected: 3,
            actual: probs.len(),
        });
    }
    Ok([probs[0], probs[1], probs[2]])
}

// ============================================================================
// OnnxEmbedder
// ============================================================================

/// Local bi-encoder (e.g. `all-mpnet-base-v2` exported to ONNX).
pub struct OnnxEmbedder {
    model: OnnxModel,
    dimensions: usize,
}

impl std::fmt::Debug for OnnxEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbedder")
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

impl OnnxEmbedder {
    pub fn from_model_path(model_path: &str, dimensions: usize) -> Result<Self, ScoringError> {
        Ok(Self {
            model: OnnxModel::load(model_path)?,
            dimensions,
        })
    }
}

#[async_trait]
impl EmbeddingBackend for OnnxEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ScoringError> {
        let session = Arc::clone(&self.model.session);
        let tokenizer = Arc::clone(&self.model.tokenizer);
        let dimensions = self.dimensions;
        let text = text.to_string();

        tokio::task::spawn_blocking(move || {
            let mut guard = session
                .lock()
                .map_err(|e| ScoringError::OnnxInference(format!("session lock poisoned: {e}")))?;
            embed_sync(&mut guard, &tokenizer, &text, dimensions)
        })
        .await
        .map_err(|e| ScoringError::OnnxInference(format!("spawn_blocking join error: {e}")))?
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "onnx-embedder"
    }
}

fn embed_sync(
    session: &mut Session,
    tokenizer: &Tokenizer,
    text: &str,
    expected_dims: usize,
) -> Result<Vec<f32>, ScoringError> {
    let encoded = encode_single(tokenizer, text)?;
    let (out_shape, data) = run_forward(session, &encoded)?;

    // Expected shape: [1, seq_len, hidden_dim]
    if out_shape.len() != 3 {
        return Err(ScoringError::OnnxInference(format!(
            "Expected 3D output, got {}D",
            out_shape.len()
        )));
    }
    let out_seq_len = out_shape[1] as usize;
    let hidden_dim = out_shape[2] as usize;

    let hidden = ArrayView2::from_shape((out_seq_len, hidden_dim), &data)
        .map_err(|e| ScoringError::OnnxInference(e.to_string()))?;

    // Masked mean-pooling over the sequence dimension.
    let mask: Array1<f32> = encoded
        .attention_mask
        .iter()
        .map(|&m| m as f32)
        .chain(std::iter::repeat(0.0))
        .take(out_seq_len)
        .collect();
    let mask_sum = mask.sum();

    let mut pooled = Array1::<f32>::zeros(hidden_dim);
    for (row, &weight) in hidden.outer_iter().zip(mask.iter()) {
        if weight > 0.0 {
            pooled.scaled_add(weight, &row);
        }
    }
    if mask_sum > 0.0 {
        pooled.mapv_inplace(|v| v / mask_sum);
    }

    // L2 normalize so cosine similarity reduces to a dot product.
    let norm = pooled.dot(&pooled).sqrt();
    if norm > 0.0 {
        pooled.mapv_inplace(|v| v / norm);
    }

    let vector = pooled.to_vec();
    if vector.len() != expected_dims {
        return Err(ScoringError::InvalidDimensions {
            expected: expected_dims,
            actual: vector.len(),
        });
    }

    Ok(vector)
}

// ============================================================================
// OnnxCrossEncoder
// ============================================================================

/// Local relevance cross-encoder (e.g. `ms-marco-MiniLM-L-6-v2`).
pub struct OnnxCrossEncoder {
    model: OnnxModel,
}

impl OnnxCrossEncoder {
    pub fn from_model_path(model_path: &str) -> Result<Self, ScoringError> {
        Ok(Self {
            model: OnnxModel::load(model_path)?,
        })
    }
}

#[async_trait]
impl CrossEncoderBackend for OnnxCrossEncoder {
    async fn score(&self, query: &str, document: &str) -> Result<f32, ScoringError> {
        let session = Arc::clone(&self.model.session);
        let tokenizer = Arc::clone(&self.model.tokenizer);
        let query = query.to_string();
        let document = document.to_string();

        tokio::task::spawn_blocking(move || {
            let mut guard = session
                .lock()
                .map_err(|e| ScoringError::OnnxInference(format!("session lock poisoned: {e}")))?;
            let encoded = encode_pair(&tokenizer, &query, &document)?;
            let (out_shape, data) = run_forward(&mut guard, &encoded)?;
            // Expected shape: [1, 1] — the raw relevance logit.
            data.first().copied().ok_or_else(|| {
                ScoringError::OnnxInference(format!("Empty relevance output, shape {out_shape:?}"))
            })
        })
        .await
        .map_err(|e| ScoringError::OnnxInference(format!("spawn_blocking join error: {e}")))?
    }

    fn name(&self) -> &str {
        "onnx-cross-encoder"
    }
}

// ============================================================================
// OnnxEntailmentModel
// ============================================================================

/// Local NLI cross-encoder (e.g. `nli-deberta-base`). Output head order is
/// [contradict, neutral, support].
pub struct OnnxEntailmentModel {
    model: OnnxModel,
}

impl OnnxEntailmentModel {
    pub fn from_model_path(model_path: &str) -> Result<Self, ScoringError> {
        Ok(Self {
            model: OnnxModel::load(model_path)?,
        })
    }
}

#[async_trait]
impl EntailmentBackend for OnnxEntailmentModel {
    async fn entail(&self, claim: &str, sentence: &str) -> Result<[f32; 3], ScoringError> {
        let session = Arc::clone(&self.model.session);
        let tokenizer = Arc::clone(&self.model.tokenizer);
        let claim = claim.to_string();
        let sentence = sentence.to_string();

        tokio::task::spawn_blocking(move || {
            let mut guard = session
                .lock()
                .map_err(|e| ScoringError::OnnxInference(format!("session lock poisoned: {e}")))?;
            let encoded = encode_pair(&tokenizer, &claim, &sentence)?;
            let (_, logits) = run_forward(&mut guard, &encoded)?;
            three_way(softmax(&logits))
        })
        .await
        .map_err(|e| ScoringError::OnnxInference(format!("spawn_blocking join error: {e}")))?
    }

    fn name(&self) -> &str {
        "onnx-entailment"
    }
}

// ============================================================================
// OnnxClaimClassifier
// ============================================================================

/// Claim-only factuality classifier (e.g. `DeBERTa-v3-base-mnli-fever-anli`).
/// Output head order is [contradiction, neutral, entailment].
pub struct OnnxClaimClassifier {
    model: OnnxModel,
}

impl OnnxClaimClassifier {
    pub fn from_model_path(model_path: &str) -> Result<Self, ScoringError> {
        Ok(Self {
            model: OnnxModel::load(model_path)?,
        })
    }
}

#[async_trait]
impl ClaimClassifier for OnnxClaimClassifier {
    async fn classify(&self, claim: &str) -> Result<[f32; 3], ScoringError> {
        let session = Arc::clone(&self.model.session);
        let tokenizer = Arc::clone(&self.model.tokenizer);
        let claim = claim.to_string();

        tokio::task::spawn_blocking(move || {
            let mut guard = session
                .lock()
                .map_err(|e| ScoringError::OnnxInference(format!("session lock poisoned: {e}")))?;
            let encoded = encode_single(&tokenizer, &claim)?;
            let (_, logits) = run_forward(&mut guard, &encoded)?;
            three_way(softmax(&logits))
        })
        .await
        .map_err(|e| ScoringError::OnnxInference(format!("spawn_blocking join error: {e}")))?
    }

    fn name(&self) -> &str {
        "onnx-claim-classifier"
    }
}

// ============================================================================
// TESTS
// ============================================================================
