//! # Pipeline
//!
//! Sequential composition of tokenizer stages. `encode` runs stages
//! left-to-right, `decode` runs them right-to-left, and `learn` trains
//! each stage on the output of the preceding stage.

use std::collections::{BTreeSet, HashSet};

use crate::errors::WCResult;
use crate::stage::TokenizerStage;
use crate::types::Symbol;

/// Accumulates boxed stages and finalizes into a [`Pipeline`], following the
/// options-struct two-phase construction pattern used elsewhere in this
/// crate.
pub struct PipelineBuilder<S: Symbol> {
    stages: Vec<Box<dyn TokenizerStage<S>>>,
}

impl<S: Symbol> Default for PipelineBuilder<S> {
    fn default() -> Self {
        Self { stages: Vec::new() }
    }
}

impl<S: Symbol> PipelineBuilder<S> {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage to the pipeline under construction.
    ///
    /// ## Arguments
    /// * `stage` - The stage to append.
    pub fn with_stage(
        mut self,
        stage: Box<dyn TokenizerStage<S>>,
    ) -> Self {
        self.stages.push(stage);
        self
    }

    /// Finalize the builder into a [`Pipeline`].
    pub fn init(self) -> WCResult<Pipeline<S>> {
        Ok(Pipeline {
            stages: self.stages,
        })
    }
}

/// An ordered composition of tokenizer stages.
///
/// An empty pipeline is the identity tokenizer: `learn` is a no-op,
/// `encode`/`decode` return their input unchanged.
pub struct Pipeline<S: Symbol> {
    stages: Vec<Box<dyn TokenizerStage<S>>>,
}

impl<S: Symbol> Pipeline<S> {
    /// Train stage 0 on `(tokens, input_vocab)`, encode, then train each
    /// subsequent stage on the running output and the previous stage's
    /// output vocabulary (sorted ascending for deterministic iteration).
    ///
    /// ## Arguments
    /// * `tokens` - The training sequence.
    /// * `input_vocab` - An optional explicit vocabulary for stage 0.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, tokens)))]
    pub fn learn(
        &mut self,
        tokens: &[S],
        input_vocab: Option<&[S]>,
    ) -> WCResult<()> {
        if self.stages.is_empty() {
            return Ok(());
        }

        let mut running = tokens.to_vec();
        self.stages[0].learn(&running, input_vocab)?;
        running = self.stages[0].encode(&running)?;
        log::debug!("pipeline stage 0 trained, output length {}", running.len());

        for k in 1..self.stages.len() {
            let prev_vocab: Vec<S> = self.stages[k - 1].output_vocab().into_iter().collect::<BTreeSet<_>>().into_iter().collect();
            self.stages[k].learn(&running, Some(&prev_vocab))?;
            running = self.stages[k].encode(&running)?;
            log::debug!("pipeline stage {} trained, output length {}", k, running.len());
        }

        Ok(())
    }

    /// Encode `seq` by folding `stage.encode` left-to-right.
    ///
    /// ## Arguments
    /// * `seq` - The sequence to encode.
    pub fn encode(
        &self,
        seq: &[S],
    ) -> WCResult<Vec<S>> {
        let mut running = seq.to_vec();
        for stage in &self.stages {
            running = stage.encode(&running)?;
        }
        Ok(running)
    }

    /// Decode `seq` by folding `stage.decode` right-to-left.
    ///
    /// ## Arguments
    /// * `seq` - The sequence to decode.
    pub fn decode(
        &self,
        seq: &[S],
    ) -> WCResult<Vec<S>> {
        let mut running = seq.to_vec();
        for stage in self.stages.iter().rev() {
            running = stage.decode(&running)?;
        }
        Ok(running)
    }

    /// The number of stages in this pipeline.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// `true` iff this pipeline has no stages (the identity tokenizer).
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl<S: Symbol> TokenizerStage<S> for Pipeline<S> {
    fn learn(
        &mut self,
        tokens: &[S],
        input_vocab: Option<&[S]>,
    ) -> WCResult<()> {
        Pipeline::learn(self, tokens, input_vocab)
    }

    fn encode(
        &self,
        tokens: &[S],
    ) -> WCResult<Vec<S>> {
        Pipeline::encode(self, tokens)
    }

    fn decode(
        &self,
        tokens: &[S],
    ) -> WCResult<Vec<S>> {
        Pipeline::decode(self, tokens)
    }

    fn input_vocab(&self) -> HashSet<S> {
        self.stages.first().map(|s| s.input_vocab()).unwrap_or_default()
    }

    fn output_vocab(&self) -> HashSet<S> {
        self.stages.last().map(|s| s.output_vocab()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bpe::BpeOptions;
    use crate::lz::LzOptions;

    #[test]
    fn test_empty_pipeline_is_identity() {
        let pipeline: Pipeline<i32> = PipelineBuilder::new().init().unwrap();
        let seq = vec![1, 2, 3];
        assert_eq!(pipeline.encode(&seq).unwrap(), seq);
        assert_eq!(pipeline.decode(&seq).unwrap(), seq);
    }

    #[test]
    fn test_two_stage_pipeline_round_trips() {
        let tokens: Vec<i32> = (0..1000).map(|i| 1 + (i * 7 % 4)).collect();

        let bpe = BpeOptions::new().with_max_output_vocab(8).init::<i32>().unwrap();
        let lz = LzOptions::<i32>::new(32).init().unwrap();
        let mut pipeline = PipelineBuilder::new()
            .with_stage(Box::new(bpe))
            .with_stage(Box::new(lz))
            .init()
            .unwrap();

        pipeline.learn(&tokens, Some(&[1, 2, 3, 4])).unwrap();
        let encoded = pipeline.encode(&tokens).unwrap();
        let decoded = pipeline.decode(&encoded).unwrap();
        assert_eq!(decoded, tokens);
    }

    #[test]
    fn test_pipeline_law_matches_manual_fold() {
        let tokens: Vec<i32> = vec![1, 2, 1, 2, 3, 1, 2, 1, 2, 3, 3, 1];

        let mut bpe = BpeOptions::new().with_max_output_vocab(8).init::<i32>().unwrap();
        let mut lz = LzOptions::<i32>::new(32).init().unwrap();

        bpe.learn(&tokens, Some(&[1, 2, 3])).unwrap();
        let after_bpe = bpe.encode(&tokens).unwrap();
        let prev_vocab: Vec<i32> = bpe.output_vocab().into_iter().collect::<BTreeSet<_>>().into_iter().collect();
        lz.learn(&after_bpe, Some(&prev_vocab)).unwrap();

        let manual_encoded = lz.encode(&after_bpe, false).unwrap();

        let mut pipeline = PipelineBuilder::new()
            .with_stage(Box::new(bpe))
            .with_stage(Box::new(lz))
            .init()
            .unwrap();
        let pipeline_encoded = pipeline.encode(&tokens).unwrap();

        assert_eq!(pipeline_encoded, manual_encoded);
    }
}
