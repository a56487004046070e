//! Property-based tests for the universal tokenizer laws: round-trip
//! (`decode(encode(x)) == x`) and vocabulary containment, across every
//! tokenizer kind and 2-stage pipelines.

use proptest::prelude::*;
use wordchipper::bpe::BpeOptions;
use wordchipper::contextual::ContextualOptions;
use wordchipper::hlz::HierarchicalLzOptions;
use wordchipper::lz::LzOptions;
use wordchipper::pipeline::PipelineBuilder;
use wordchipper::stage::TokenizerStage;

/// A small alphabet so learned models see realistic repetition.
fn small_alphabet_seq() -> impl Strategy<Value = Vec<i32>> {
    prop::collection::vec(1i32..=4, 1..200)
}

proptest! {
    #[test]
    fn bpe_round_trips(tokens in small_alphabet_seq()) {
        let mut bpe = BpeOptions::new().with_max_output_vocab(16).init::<i32>().unwrap();
        bpe.learn(&tokens, None).unwrap();

        let encoded = bpe.encode(&tokens).unwrap();
        for id in &encoded {
            prop_assert!(bpe.output_vocab().contains(id));
        }
        let decoded = bpe.decode(&encoded).unwrap();
        prop_assert_eq!(decoded, tokens);
    }

    #[test]
    fn lz_round_trips(tokens in small_alphabet_seq()) {
        let mut lz = LzOptions::<i32>::new(64).init().unwrap();
        lz.learn(&tokens, None).unwrap();

        let encoded = lz.encode(&tokens, false).unwrap();
        let decoded = lz.decode(&encoded).unwrap();
        prop_assert_eq!(decoded, tokens);
    }

    #[test]
    fn hlz_round_trips(tokens in small_alphabet_seq()) {
        let mut hlz = HierarchicalLzOptions::<i32>::new(64).init().unwrap();
        hlz.learn(&tokens, None).unwrap();

        let encoded = hlz.encode(&tokens, false).unwrap();
        let decoded = hlz.decode(&encoded).unwrap();
        prop_assert_eq!(decoded, tokens);
    }

    #[test]
    fn contextual_round_trips(tokens in small_alphabet_seq()) {
        let mut ce = ContextualOptions::<i32>::new().init().unwrap();
        ce.learn(&tokens, None).unwrap();

        let encoded = ce.encode(&tokens).unwrap();
        let decoded = ce.decode(&encoded).unwrap();
        prop_assert_eq!(decoded, tokens);
    }

    #[test]
    fn two_stage_pipeline_round_trips(tokens in small_alphabet_seq()) {
        let bpe = BpeOptions::new().with_max_output_vocab(16).init::<i32>().unwrap();
        let lz = LzOptions::<i32>::new(64).init().unwrap();
        let mut pipeline = PipelineBuilder::new()
            .with_stage(Box::new(bpe))
            .with_stage(Box::new(lz))
            .init()
            .unwrap();

        pipeline.learn(&tokens, None).unwrap();
        let encoded = pipeline.encode(&tokens).unwrap();
        for id in &encoded {
            prop_assert!(pipeline.output_vocab().contains(id));
        }
        let decoded = pipeline.decode(&encoded).unwrap();
        prop_assert_eq!(decoded, tokens);
    }
}
