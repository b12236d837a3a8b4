//! End-to-end distillation step over the full utility surface
//!
//! Wires one synthetic batch through adaptor normalization, masked logit
//! selection, the probability shift, and the distillation loss, inside the
//! training-mode scope, reporting scalars to an in-memory sink.

use destilar::config::{DistillationConfig, TrainingConfig};
use destilar::distill::{probability_shift_, select_logits_with_mask, DistillationLoss};
use destilar::monitor::{write_scalars, InMemoryWriter, ScalarWriter};
use destilar::{
    with_distillation_modes, Adaptor, AdaptorOutput, Batch, BatchValue, OneOrMany, TeacherGroup,
    TrainMode,
};
use ndarray::{array, Array1, ArrayD};
use std::collections::BTreeMap;

struct SequenceTagger {
    training: bool,
}

impl TrainMode for SequenceTagger {
    fn is_training(&self) -> bool {
        self.training
    }

    fn set_training(&mut self, training: bool) {
        self.training = training;
    }
}

/// Adaptor for a single-head sequence tagger: bare tensor outputs, so
/// normalization has real work to do.
struct TaggerAdaptor;

impl Adaptor for TaggerAdaptor {
    fn adapt(&self, batch: &Batch, model_outputs: &[ArrayD<f32>]) -> destilar::Result<AdaptorOutput> {
        let mask = batch
            .get("attention_mask")
            .and_then(BatchValue::as_bool)
            .expect("batch provides attention_mask");
        let labels = batch
            .get("labels")
            .and_then(BatchValue::as_int)
            .expect("batch provides labels");

        let mask2 = mask
            .view()
            .into_dimensionality::<ndarray::Ix2>()
            .expect("attention_mask is rank 2")
            .to_owned();

        Ok(AdaptorOutput {
            logits: Some(OneOrMany::One(model_outputs[0].clone())),
            logits_mask: Some(OneOrMany::One(mask2)),
            labels: Some(OneOrMany::One(labels.clone())),
            ..Default::default()
        })
    }
}

fn make_batch() -> Batch {
    let mut batch = Batch::new();
    batch.insert(
        "attention_mask".to_string(),
        BatchValue::Bool(array![[true, true], [true, false]].into_dyn()),
    );
    batch.insert(
        "labels".to_string(),
        BatchValue::Int(array![[0i64, 2], [1, -1]].into_dyn()),
    );
    batch
}

/// Labels at mask-true positions, flattened like the selected logits.
fn select_labels(labels: &ArrayD<i64>, mask: &ndarray::Array2<bool>) -> ArrayD<i64> {
    let mut selected = Vec::new();
    for (i, row) in mask.outer_iter().enumerate() {
        for (j, &keep) in row.iter().enumerate() {
            if keep {
                selected.push(labels[[i, j]]);
            }
        }
    }
    Array1::from(selected).into_dyn()
}

#[test]
fn full_distillation_step() {
    let train_config = TrainingConfig::default();
    let distill_config = DistillationConfig {
        probability_shift: true,
        ..Default::default()
    };
    train_config.validate().unwrap();
    distill_config.validate().unwrap();

    let mut teachers = TeacherGroup::Single(SequenceTagger { training: false });
    let mut student = SequenceTagger { training: false };
    let mut writer = InMemoryWriter::new();

    let batch = make_batch();
    // (batch=2, len=2, classes=3); the teacher's argmax disagrees with the
    // label at position (0, 0).
    let teacher_forward = array![
        [[0.1f32, 0.7, 0.2], [0.2, 0.2, 0.6]],
        [[0.5, 0.3, 0.2], [0.3, 0.3, 0.4]]
    ]
    .into_dyn();
    let student_forward = array![
        [[0.3f32, 0.4, 0.3], [0.1, 0.3, 0.6]],
        [[0.6, 0.2, 0.2], [0.2, 0.5, 0.3]]
    ]
    .into_dyn();

    let loss_fn = DistillationLoss::from_config(&distill_config);
    let adaptor = TaggerAdaptor;

    let loss = with_distillation_modes(&mut teachers, &mut student, |teachers, student| {
        assert!(student.is_training());
        assert!(matches!(teachers, TeacherGroup::Single(t) if !t.is_training()));

        let mut teacher_out = adaptor.adapt(&batch, std::slice::from_ref(&teacher_forward))?;
        let mut student_out = adaptor.adapt(&batch, std::slice::from_ref(&student_forward))?;
        teacher_out.normalize();
        student_out.normalize();

        let masks = teacher_out.logits_mask()?.to_vec();
        let labels = teacher_out.labels()?[0].clone();

        let mut teacher_logits = teacher_out.logits()?.to_vec();
        if distill_config.probability_shift {
            for logits in &mut teacher_logits {
                probability_shift_(logits, &labels)?;
            }
        }

        let teacher_selected = select_logits_with_mask(&teacher_logits, &masks)?;
        let student_selected = select_logits_with_mask(student_out.logits()?, &masks)?;
        let selected_labels = select_labels(&labels, &masks[0]);

        loss_fn.forward(&student_selected[0], &teacher_selected[0], &selected_labels)
    })
    .unwrap();

    assert!(loss.is_finite());
    assert!(loss > 0.0);

    // Modes restored after the scope.
    assert!(matches!(&teachers, TeacherGroup::Single(t) if !t.is_training()));
    assert!(!student.is_training());

    // Report the step's scalars.
    let mut scalars = BTreeMap::new();
    scalars.insert("scalar/total_loss".to_string(), loss);
    write_scalars(&mut writer, &scalars, 1);
    writer.flush().unwrap();

    let recorded = writer.records_for("scalar/total_loss");
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].value, loss);
}

#[test]
fn shift_respects_ignored_positions_through_the_pipeline() {
    // Position (1, 1) is padding with a -1 label; the shift must leave it
    // unchanged even before selection drops it.
    let mut teacher_logits = array![
        [[0.1f32, 0.7, 0.2], [0.2, 0.2, 0.6]],
        [[0.5, 0.3, 0.2], [0.3, 0.3, 0.4]]
    ]
    .into_dyn();
    let labels = array![[0i64, 2], [1, -1]].into_dyn();
    let untouched = teacher_logits.clone();

    probability_shift_(&mut teacher_logits, &labels).unwrap();

    // (0, 0): argmax 1 swapped with label 0.
    assert_eq!(teacher_logits[[0, 0, 0]], 0.7);
    assert_eq!(teacher_logits[[0, 0, 1]], 0.1);
    // (0, 1): argmax 2 equals label 2, untouched.
    assert_eq!(teacher_logits[[0, 1, 2]], 0.6);
    // (1, 0): argmax 0 swapped with label 1.
    assert_eq!(teacher_logits[[1, 0, 0]], 0.3);
    assert_eq!(teacher_logits[[1, 0, 1]], 0.5);
    // (1, 1): ignore sentinel, identical to the input.
    for k in 0..3 {
        assert_eq!(teacher_logits[[1, 1, k]], untouched[[1, 1, k]]);
    }
}
