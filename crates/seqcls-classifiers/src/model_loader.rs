//! Candle-backed encoder and scorer for BERT sequence classifiers

use crate::capability::{Encoder, EncodingBatch, Scorer};
use candle_core::{DType, Device, IndexOp, Tensor};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use hf_hub::{api::sync::Api, Repo, RepoType};
use seqcls_core::{Error, RawScoreVector, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokenizers::{PaddingDirection, PostProcessor, Tokenizer, TruncationDirection};

/// Device type for inference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DeviceType {
    /// CPU inference (always available)
    #[default]
    Cpu,
    /// CUDA GPU inference (if available)
    Cuda(usize), // GPU index
    /// Metal (Apple Silicon)
    Metal(usize),
}

impl DeviceType {
    /// Create the candle device
    pub fn create(self) -> Result<Device> {
        match self {
            Self::Cpu => Ok(Device::Cpu),
            Self::Cuda(idx) => Device::new_cuda(idx)
                .map_err(|e| Error::model(format!("Failed to create CUDA device {}: {}", idx, e))),
            Self::Metal(idx) => Device::new_metal(idx)
                .map_err(|e| Error::model(format!("Failed to create Metal device {}: {}", idx, e))),
        }
    }
}

impl FromStr for DeviceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_ascii_lowercase();
        let (kind, index) = match lowered.split_once(':') {
            Some((kind, index)) => {
                let index = index
                    .parse()
                    .map_err(|_| Error::config(format!("Invalid device index in '{}'", s)))?;
                (kind, index)
            }
            None => (lowered.as_str(), 0),
        };

        match kind {
            "cpu" => Ok(Self::Cpu),
            "cuda" | "gpu" => Ok(Self::Cuda(index)),
            "metal" | "mps" => Ok(Self::Metal(index)),
            _ => Err(Error::config(format!(
                "Unknown device '{}' (expected cpu, cuda[:N], metal[:N])",
                s
            ))),
        }
    }
}

impl TryFrom<String> for DeviceType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DeviceType> for String {
    fn from(device: DeviceType) -> Self {
        device.to_string()
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => f.write_str("cpu"),
            Self::Cuda(idx) => write!(f, "cuda:{}", idx),
            Self::Metal(idx) => write!(f, "metal:{}", idx),
        }
    }
}

/// Where the model directory comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ModelSource {
    /// Load from local filesystem
    Local { path: PathBuf },

    /// Download from HuggingFace Hub
    HuggingFace {
        repo: String,
        #[serde(default = "default_revision")]
        revision: String,
    },
}

fn default_revision() -> String {
    "main".to_string()
}

const WEIGHTS_FILE: &str = "model.safetensors";
const CONFIG_FILE: &str = "config.json";

/// Weight prefixes probed for the BERT encoder, `""` meaning the root
const BACKBONE_PREFIXES: [&str; 2] = ["bert", ""];

impl ModelSource {
    /// Resolve to a local directory holding config, tokenizer and weights
    pub fn resolve(&self) -> Result<PathBuf> {
        match self {
            Self::Local { path } => {
                if !path.is_dir() {
                    return Err(Error::model(format!(
                        "Model path does not exist: {}",
                        path.display()
                    )));
                }
                Ok(path.clone())
            }
            Self::HuggingFace { repo, revision } => download_from_huggingface(repo, revision),
        }
    }
}

fn download_from_huggingface(repo: &str, revision: &str) -> Result<PathBuf> {
    tracing::info!("Downloading model from HuggingFace: {} @ {}", repo, revision);

    let api = Api::new()
        .map_err(|e| Error::model(format!("Failed to initialize HuggingFace API: {}", e)))?;
    let repo_obj = api.repo(Repo::with_revision(
        repo.to_string(),
        RepoType::Model,
        revision.to_string(),
    ));

    for file in [CONFIG_FILE, WEIGHTS_FILE] {
        tracing::debug!("Downloading {}", file);
        repo_obj
            .get(file)
            .map_err(|e| Error::model(format!("Failed to download {}: {}", file, e)))?;
    }

    let found_tokenizer = ["tokenizer.json", "vocab.txt"]
        .iter()
        .any(|file| repo_obj.get(file).is_ok());
    if !found_tokenizer {
        return Err(Error::model(
            "No tokenizer found (tried tokenizer.json, vocab.txt)",
        ));
    }

    let config_path = repo_obj
        .get(CONFIG_FILE)
        .map_err(|e| Error::model(format!("Failed to locate model cache: {}", e)))?;
    let model_dir = config_path
        .parent()
        .ok_or_else(|| Error::model("Invalid cache path"))?;

    tracing::info!("Model available at: {}", model_dir.display());
    Ok(model_dir.to_path_buf())
}

/// Tokenizer-backed [`Encoder`] producing fixed-length rows
pub struct TokenizerEncoder {
    tokenizer: Tokenizer,
    pad_id: u32,
    pad_type_id: u32,
    pad_token: String,
}

impl TokenizerEncoder {
    /// Wrap a tokenizer; its own padding and truncation settings are
    /// replaced by the per-call `max_length`
    pub fn new(mut tokenizer: Tokenizer) -> Result<Self> {
        let (pad_id, pad_type_id, pad_token) = match tokenizer.get_padding() {
            Some(params) => (params.pad_id, params.pad_type_id, params.pad_token.clone()),
            None => (
                tokenizer.token_to_id("[PAD]").unwrap_or(0),
                0,
                "[PAD]".to_string(),
            ),
        };

        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(None)
            .map_err(|e| Error::model(format!("Failed to reset truncation: {}", e)))?;

        Ok(Self {
            tokenizer,
            pad_id,
            pad_type_id,
            pad_token,
        })
    }

    /// Load from `tokenizer.json`, or build a BERT WordPiece tokenizer
    /// from `vocab.txt`
    pub fn from_dir(model_dir: &Path) -> Result<Self> {
        load_tokenizer(model_dir).and_then(Self::new)
    }
}

impl Encoder for TokenizerEncoder {
    fn encode(&self, texts: &[&str], max_length: usize) -> Result<EncodingBatch> {
        // Truncate content before adding special tokens so [SEP] survives
        let special = self
            .tokenizer
            .get_post_processor()
            .map_or(0, |processor| processor.added_tokens(false));
        let content_length = max_length.saturating_sub(special);

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), false)
            .map_err(|e| Error::encoding(format!("Tokenization failed: {}", e)))?;

        let mut input_ids = Vec::with_capacity(encodings.len());
        let mut token_type_ids = Vec::with_capacity(encodings.len());
        let mut attention_mask = Vec::with_capacity(encodings.len());

        for mut encoding in encodings {
            encoding.truncate(content_length, 0, TruncationDirection::Right);
            let mut encoding = self
                .tokenizer
                .post_process(encoding, None, true)
                .map_err(|e| Error::encoding(format!("Post-processing failed: {}", e)))?;
            encoding.truncate(max_length, 0, TruncationDirection::Right);
            encoding.pad(
                max_length,
                self.pad_id,
                self.pad_type_id,
                &self.pad_token,
                PaddingDirection::Right,
            );
            input_ids.push(encoding.get_ids().to_vec());
            token_type_ids.push(encoding.get_type_ids().to_vec());
            attention_mask.push(encoding.get_attention_mask().to_vec());
        }

        EncodingBatch::from_rows(input_ids, token_type_ids, attention_mask)
    }
}

fn load_tokenizer(model_path: &Path) -> Result<Tokenizer> {
    let tokenizer_json_path = model_path.join("tokenizer.json");
    if tokenizer_json_path.exists() {
        tracing::debug!("Loading tokenizer from tokenizer.json");
        return Tokenizer::from_file(&tokenizer_json_path)
            .map_err(|e| Error::model(format!("Failed to load tokenizer.json: {}", e)));
    }

    let vocab_path = model_path.join("vocab.txt");
    if vocab_path.exists() {
        tracing::debug!("Building tokenizer from vocab.txt");

        use tokenizers::models::wordpiece::WordPiece;
        use tokenizers::normalizers::BertNormalizer;
        use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
        use tokenizers::processors::bert::BertProcessing;
        use tokenizers::Model;

        let wordpiece = WordPiece::from_file(vocab_path.to_string_lossy().as_ref())
            .unk_token("[UNK]".to_string())
            .build()
            .map_err(|e| Error::model(format!("Failed to build WordPiece model: {}", e)))?;

        let cls_id = wordpiece.token_to_id("[CLS]").unwrap_or(101);
        let sep_id = wordpiece.token_to_id("[SEP]").unwrap_or(102);

        let mut tokenizer = Tokenizer::new(wordpiece);
        tokenizer.with_normalizer(Some(BertNormalizer::default()));
        tokenizer.with_pre_tokenizer(Some(BertPreTokenizer));
        tokenizer.with_post_processor(Some(BertProcessing::new(
            ("[SEP]".to_string(), sep_id),
            ("[CLS]".to_string(), cls_id),
        )));

        return Ok(tokenizer);
    }

    Err(Error::model(format!(
        "No tokenizer found in {} (tried tokenizer.json, vocab.txt)",
        model_path.display()
    )))
}

/// BERT backbone plus classification head, producing logits per row
pub struct BertScorer {
    name: String,
    model: BertModel,
    pooler: Option<Linear>,
    classifier: Linear,
    device: Device,
    num_labels: usize,
}

impl BertScorer {
    /// Load `config.json` and `model.safetensors` from `model_dir`
    pub fn load(model_dir: &Path, num_labels: usize, device: DeviceType) -> Result<Self> {
        let bert_config: BertConfig = parse_json_config(&model_dir.join(CONFIG_FILE))?;
        let device = device.create()?;
        let vb = load_var_builder(model_dir, &device)?;

        let model = load_bert_backbone(&vb, &bert_config, &BACKBONE_PREFIXES)?;
        let hidden_size = bert_config.hidden_size;

        let pooler = ["bert.pooler.dense", "pooler.dense"]
            .iter()
            .find_map(|prefix| candle_nn::linear(hidden_size, hidden_size, vb.pp(prefix)).ok());
        if pooler.is_some() {
            tracing::info!("Loaded pooler layer (hidden_size={})", hidden_size);
        }

        let classifier = load_classification_head(&vb, hidden_size, num_labels)?;

        let name = model_dir
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("bert")
            .to_string();

        tracing::info!(
            "Successfully loaded BERT classifier '{}' with {} labels",
            name,
            num_labels
        );

        Ok(Self {
            name,
            model,
            pooler,
            classifier,
            device,
            num_labels,
        })
    }

    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    fn forward(&self, batch: &EncodingBatch) -> candle_core::Result<Vec<Vec<f32>>> {
        let shape = (batch.batch_size, batch.seq_len);
        let input_ids = Tensor::from_slice(&batch.input_ids, shape, &self.device)?;
        let token_type_ids = Tensor::from_slice(&batch.token_type_ids, shape, &self.device)?;
        let attention_mask = Tensor::from_slice(&batch.attention_mask, shape, &self.device)?;

        let hidden_states = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        // [CLS] token of every row
        let cls = hidden_states.i((.., 0, ..))?;
        let pooled = match &self.pooler {
            Some(pooler) => pooler.forward(&cls)?.tanh()?,
            None => cls,
        };

        self.classifier.forward(&pooled)?.to_vec2::<f32>()
    }
}

impl Scorer for BertScorer {
    fn score(&self, batch: &EncodingBatch) -> Result<Vec<RawScoreVector>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        self.forward(batch)
            .map_err(|e| Error::scoring(format!("Model forward pass failed: {}", e)))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn parse_json_config<T: serde::de::DeserializeOwned>(config_path: &Path) -> Result<T> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        Error::model(format!(
            "Failed to read config {}: {}",
            config_path.display(),
            e
        ))
    })?;

    serde_json::from_str(&config_str).map_err(|e| {
        Error::model(format!(
            "Failed to parse config {}: {}",
            config_path.display(),
            e
        ))
    })
}

fn load_var_builder(model_path: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let weights_path = model_path.join(WEIGHTS_FILE);
    if !weights_path.exists() {
        return Err(Error::model(format!(
            "{} not found in {}",
            WEIGHTS_FILE,
            model_path.display()
        )));
    }

    // SAFETY: the safetensors file must not be modified while mapped.
    let vb = unsafe {
        VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)
            .map_err(|e| Error::model(format!("Failed to load weights: {}", e)))?
    };

    Ok(vb)
}

fn load_bert_backbone(vb: &VarBuilder, config: &BertConfig, prefixes: &[&str]) -> Result<BertModel> {
    let mut errors = Vec::new();

    for prefix in prefixes {
        let prefix_label = if prefix.is_empty() { "<root>" } else { prefix };
        let vb_prefix = if prefix.is_empty() {
            vb.clone()
        } else {
            vb.pp(prefix)
        };

        match BertModel::load(vb_prefix, config) {
            Ok(model) => {
                tracing::info!("Loaded BERT backbone from '{}'", prefix_label);
                return Ok(model);
            }
            Err(e) => errors.push(format!("{}: {}", prefix_label, e)),
        }
    }

    Err(Error::model(format!(
        "Failed to load BERT backbone with tried prefixes [{}]",
        errors.join(" | ")
    )))
}

// Missing head weights are an error; the head is never initialised randomly.
fn load_classification_head(vb: &VarBuilder, hidden_size: usize, num_labels: usize) -> Result<Linear> {
    for prefix in ["classifier", "score"] {
        if let Ok(linear) = candle_nn::linear(hidden_size, num_labels, vb.pp(prefix)) {
            tracing::info!(
                "Loaded classification head from '{}' (hidden_size={}, num_labels={})",
                prefix,
                hidden_size,
                num_labels
            );
            return Ok(linear);
        }
    }

    Err(Error::model(format!(
        "No classification head with {} outputs found (tried 'classifier', 'score')",
        num_labels
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_device() {
        assert_eq!("cpu".parse::<DeviceType>().unwrap(), DeviceType::Cpu);
        assert_eq!("CUDA".parse::<DeviceType>().unwrap(), DeviceType::Cuda(0));
        assert_eq!("cuda:1".parse::<DeviceType>().unwrap(), DeviceType::Cuda(1));
        assert_eq!("mps".parse::<DeviceType>().unwrap(), DeviceType::Metal(0));
        assert!("tpu".parse::<DeviceType>().is_err());
        assert!("cuda:x".parse::<DeviceType>().is_err());
    }

    #[test]
    fn test_device_display_round_trip() {
        for device in [DeviceType::Cpu, DeviceType::Cuda(2), DeviceType::Metal(0)] {
            assert_eq!(device.to_string().parse::<DeviceType>().unwrap(), device);
        }
    }

    #[test]
    fn test_parse_model_source() {
        let local: ModelSource = serde_yaml::from_str("type: local\npath: ./models/bert").unwrap();
        assert_eq!(
            local,
            ModelSource::Local {
                path: PathBuf::from("./models/bert")
            }
        );

        let hub: ModelSource =
            serde_yaml::from_str("type: huggingface\nrepo: bert-base-uncased").unwrap();
        match hub {
            ModelSource::HuggingFace { repo, revision } => {
                assert_eq!(repo, "bert-base-uncased");
                assert_eq!(revision, "main");
            }
            _ => panic!("Expected huggingface source"),
        }
    }

    #[test]
    fn test_backbone_prefixes_are_bert_only() {
        assert_eq!(BACKBONE_PREFIXES, ["bert", ""]);
        assert!(!BACKBONE_PREFIXES.contains(&"roberta"));
    }

    #[test]
    fn test_missing_local_model_dir() {
        let source = ModelSource::Local {
            path: PathBuf::from("./definitely/not/here"),
        };
        assert!(matches!(source.resolve(), Err(Error::Model(_))));
    }

    #[test]
    fn test_encoder_from_vocab_pads_and_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let vocab = ["[PAD]", "[UNK]", "[CLS]", "[SEP]", "hello", "world"];
        std::fs::write(dir.path().join("vocab.txt"), vocab.join("\n")).unwrap();

        let encoder = TokenizerEncoder::from_dir(dir.path()).unwrap();
        let batch = encoder.encode(&["hello", "hello world hello world"], 5).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.seq_len, 5);
        // [CLS] hello [SEP] [PAD] [PAD]
        assert_eq!(batch.row_ids(0), &[2, 4, 3, 0, 0]);
        // [CLS] hello world hello [SEP]
        assert_eq!(batch.row_ids(1), &[2, 4, 5, 4, 3]);
        assert_eq!(&batch.attention_mask[..5], &[1, 1, 1, 0, 0]);
        assert_eq!(&batch.attention_mask[5..], &[1, 1, 1, 1, 1]);
    }
}
