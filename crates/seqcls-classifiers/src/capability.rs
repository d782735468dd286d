//! Encoder and scorer traits and the encoded batch they exchange

use seqcls_core::{Error, RawScoreVector, Result};

/// Fixed-length token encodings for a batch of texts
///
/// All three matrices are row-major `batch_size × seq_len`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingBatch {
    pub input_ids: Vec<u32>,
    pub token_type_ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub batch_size: usize,
    pub seq_len: usize,
}

impl EncodingBatch {
    /// Build a batch from per-row token vectors, validating shape
    pub fn from_rows(
        input_ids: Vec<Vec<u32>>,
        token_type_ids: Vec<Vec<u32>>,
        attention_mask: Vec<Vec<u32>>,
    ) -> Result<Self> {
        let batch_size = input_ids.len();
        let seq_len = input_ids.first().map(Vec::len).unwrap_or(0);

        if token_type_ids.len() != batch_size || attention_mask.len() != batch_size {
            return Err(Error::encoding(format!(
                "row count mismatch: {} input_ids, {} token_type_ids, {} attention_mask",
                batch_size,
                token_type_ids.len(),
                attention_mask.len()
            )));
        }

        let all_rows = input_ids
            .iter()
            .chain(token_type_ids.iter())
            .chain(attention_mask.iter());
        for row in all_rows {
            if row.len() != seq_len {
                return Err(Error::encoding(format!(
                    "ragged encoding: expected rows of length {}, found {}",
                    seq_len,
                    row.len()
                )));
            }
        }

        Ok(Self {
            input_ids: input_ids.into_iter().flatten().collect(),
            token_type_ids: token_type_ids.into_iter().flatten().collect(),
            attention_mask: attention_mask.into_iter().flatten().collect(),
            batch_size,
            seq_len,
        })
    }

    /// Number of encoded texts
    pub fn len(&self) -> usize {
        self.batch_size
    }

    pub fn is_empty(&self) -> bool {
        self.batch_size == 0
    }

    /// Token ids of one row
    pub fn row_ids(&self, row: usize) -> &[u32] {
        &self.input_ids[row * self.seq_len..(row + 1) * self.seq_len]
    }
}

/// Turns texts into fixed-length token encodings
pub trait Encoder: Send + Sync {
    /// Encode `texts`, padding and truncating every row to `max_length`
    fn encode(&self, texts: &[&str], max_length: usize) -> Result<EncodingBatch>;
}

/// Runs the model over an encoded batch
pub trait Scorer: Send + Sync {
    /// One raw score vector per encoded row, in row order
    fn score(&self, batch: &EncodingBatch) -> Result<Vec<RawScoreVector>>;

    /// Name used in logs
    fn name(&self) -> &str {
        "scorer"
    }
}

impl<T: Encoder + ?Sized> Encoder for Box<T> {
    fn encode(&self, texts: &[&str], max_length: usize) -> Result<EncodingBatch> {
        (**self).encode(texts, max_length)
    }
}

impl<T: Scorer + ?Sized> Scorer for Box<T> {
    fn score(&self, batch: &EncodingBatch) -> Result<Vec<RawScoreVector>> {
        (**self).score(batch)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_flattens_row_major() {
        let batch = EncodingBatch::from_rows(
            vec![vec![101, 7, 102], vec![101, 102, 0]],
            vec![vec![0; 3], vec![0; 3]],
            vec![vec![1, 1, 1], vec![1, 1, 0]],
        )
        .unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.seq_len, 3);
        assert_eq!(batch.row_ids(1), &[101, 102, 0]);
        assert_eq!(batch.attention_mask, vec![1, 1, 1, 1, 1, 0]);
    }

    #[test]
    fn test_from_rows_rejects_ragged_rows() {
        let err = EncodingBatch::from_rows(
            vec![vec![1, 2], vec![1]],
            vec![vec![0, 0], vec![0]],
            vec![vec![1, 1], vec![1]],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
    }

    #[test]
    fn test_from_rows_rejects_row_count_mismatch() {
        let err = EncodingBatch::from_rows(vec![vec![1]], vec![], vec![vec![1]]).unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
    }
}
