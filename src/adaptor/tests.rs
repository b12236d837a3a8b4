//! Tests for adaptor output normalization

use super::*;
use crate::Error;
use ndarray::{array, ArrayD};

fn logits_2x3() -> ArrayD<f32> {
    array![[0.1f32, 0.7, 0.2], [0.3, 0.3, 0.4]].into_dyn()
}

#[test]
fn test_normalize_wraps_bare_logits() {
    let mut out = AdaptorOutput {
        logits: Some(OneOrMany::One(logits_2x3())),
        ..Default::default()
    };

    out.normalize();

    match out.logits.as_ref().unwrap() {
        OneOrMany::Many(list) => {
            assert_eq!(list.len(), 1);
            assert_eq!(list[0], logits_2x3());
        }
        OneOrMany::One(_) => panic!("normalize left a bare value"),
    }
}

#[test]
fn test_normalize_leaves_sequences_untouched() {
    let mut out = AdaptorOutput {
        logits: Some(OneOrMany::Many(vec![logits_2x3(), logits_2x3()])),
        ..Default::default()
    };

    out.normalize();

    assert_eq!(out.logits().unwrap().len(), 2);
}

#[test]
fn test_normalize_covers_all_single_valued_fields() {
    let mut out = AdaptorOutput {
        logits: Some(OneOrMany::One(logits_2x3())),
        logits_mask: Some(OneOrMany::One(array![[true, false]])),
        losses: Some(OneOrMany::One(0.25)),
        labels: Some(OneOrMany::One(array![1i64, 2].into_dyn())),
        ..Default::default()
    };

    out.normalize();

    assert_eq!(out.logits().unwrap().len(), 1);
    assert_eq!(out.logits_mask().unwrap().len(), 1);
    assert_eq!(out.losses().unwrap(), &[0.25]);
    assert_eq!(out.labels().unwrap().len(), 1);
}

#[test]
fn test_missing_field_error_names_the_field() {
    let out = AdaptorOutput::default();

    match out.logits() {
        Err(Error::MissingField(field)) => assert_eq!(field, "logits"),
        other => panic!("expected MissingField, got {other:?}"),
    }
    assert!(matches!(out.labels(), Err(Error::MissingField("labels"))));
    assert!(matches!(out.hidden(), Err(Error::MissingField("hidden"))));
}

#[test]
fn test_as_slice_is_uniform_across_forms() {
    let one: OneOrMany<f32> = 1.5.into();
    let many: OneOrMany<f32> = vec![1.5, 2.5].into();

    assert_eq!(one.as_slice(), &[1.5]);
    assert_eq!(many.as_slice(), &[1.5, 2.5]);
    assert_eq!(one.len(), 1);
    assert_eq!(many.len(), 2);
    assert!(!one.is_empty());
}

#[test]
fn test_normalize_is_idempotent() {
    let mut out = AdaptorOutput {
        losses: Some(OneOrMany::One(0.5)),
        ..Default::default()
    };

    out.normalize();
    out.normalize();

    assert_eq!(out.losses().unwrap(), &[0.5]);
}

#[test]
fn test_adaptor_trait_is_object_safe() {
    struct PassThrough;

    impl Adaptor for PassThrough {
        fn adapt(
            &self,
            _batch: &crate::Batch,
            model_outputs: &[ArrayD<f32>],
        ) -> crate::Result<AdaptorOutput> {
            Ok(AdaptorOutput {
                logits: Some(OneOrMany::Many(model_outputs.to_vec())),
                ..Default::default()
            })
        }
    }

    let adaptor: Box<dyn Adaptor> = Box::new(PassThrough);
    let out = adaptor.adapt(&crate::Batch::new(), &[logits_2x3()]).unwrap();
    assert_eq!(out.logits().unwrap().len(), 1);
}
