//! Train/eval mode scoping for distillation steps
//!
//! A distillation step must run with every teacher in eval mode and the
//! student in train mode, then put all of them back the way they were.
//! [`with_distillation_modes`] wraps the step body and restores the recorded
//! flags through a drop guard, so restoration happens on normal return, on
//! `?`-propagated errors, and on panics alike.


use crate::Result;
use std::collections::BTreeMap;

/// The train/eval surface a model exposes to this layer.
///
/// Models are otherwise opaque; the distiller only ever flips and reads this
/// one flag.
pub trait TrainMode {
    /// Whether the model is currently in training mode.
    fn is_training(&self) -> bool;

    /// Put the model in training (`true`) or evaluation (`false`) mode.
    fn set_training(&mut self, training: bool);

    /// Switch to training mode.
    fn train(&mut self) {
        self.set_training(true);
    }

    /// Switch to evaluation mode.
    fn eval(&mut self) {
        self.set_training(false);
    }
}

/// The teacher side of a distillation setup.
///
/// Single-teacher distillation uses `Single`; multi-teacher setups pass the
/// teachers positionally or by name.
#[derive(Debug)]
pub enum TeacherGroup<T> {
    /// One teacher model
    Single(T),
    /// Positional collection of teachers
    Listed(Vec<T>),
    /// Named collection of teachers
    Named(BTreeMap<String, T>),
}

/// Recorded train/eval flags of a [`TeacherGroup`], one per teacher.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ModeSnapshot {
    Single(bool),
    Listed(Vec<bool>),
    Named(BTreeMap<String, bool>),
}

impl<T: TrainMode> TeacherGroup<T> {
    /// Number of teachers in the group.
    pub fn len(&self) -> usize {
        match self {
            TeacherGroup::Single(_) => 1,
            TeacherGroup::Listed(models) => models.len(),
            TeacherGroup::Named(models) => models.len(),
        }
    }

    /// True for an empty positional or named collection.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> ModeSnapshot {
        match self {
            TeacherGroup::Single(model) => ModeSnapshot::Single(model.is_training()),
            TeacherGroup::Listed(models) => {
                ModeSnapshot::Listed(models.iter().map(TrainMode::is_training).collect())
            }
            TeacherGroup::Named(models) => ModeSnapshot::Named(
                models
                    .iter()
                    .map(|(name, model)| (name.clone(), model.is_training()))
                    .collect(),
            ),
        }
    }

    fn set_all(&mut self, training: bool) {
        match self {
            TeacherGroup::Single(model) => model.set_training(training),
            TeacherGroup::Listed(models) => {
                for model in models {
                    model.set_training(training);
                }
            }
            TeacherGroup::Named(models) => {
                for model in models.values_mut() {
                    model.set_training(training);
                }
            }
        }
    }

    fn restore(&mut self, snapshot: &ModeSnapshot) {
        match (self, snapshot) {
            (TeacherGroup::Single(model), ModeSnapshot::Single(was_training)) => {
                model.set_training(*was_training);
            }
            (TeacherGroup::Listed(models), ModeSnapshot::Listed(flags)) => {
                for (model, &was_training) in models.iter_mut().zip(flags) {
                    model.set_training(was_training);
                }
            }
            (TeacherGroup::Named(models), ModeSnapshot::Named(flags)) => {
                for (name, model) in models.iter_mut() {
                    if let Some(&was_training) = flags.get(name) {
                        model.set_training(was_training);
                    }
                }
            }
            // A snapshot is only ever taken from the group it restores.
            _ => unreachable!("mode snapshot does not match teacher group shape"),
        }
    }
}

/// Restores recorded modes when dropped, on every exit path.
struct ModeGuard<'a, T: TrainMode, S: TrainMode + ?Sized> {
    teachers: &'a mut TeacherGroup<T>,
    student: &'a mut S,
    teacher_modes: ModeSnapshot,
    student_was_training: bool,
}

impl<T: TrainMode, S: TrainMode + ?Sized> Drop for ModeGuard<'_, T, S> {
    fn drop(&mut self) {
        self.teachers.restore(&self.teacher_modes);
        self.student.set_training(self.student_was_training);
    }
}

/// Run one distillation step body with forced train/eval modes.
///
/// Records every teacher's and the student's current flag, forces all
/// teachers into eval mode and the student into train mode, and runs `body`.
/// The recorded flags are restored unconditionally afterwards, including
/// when `body` returns an error or panics.
///
/// # Example
///
/// ```
/// use destilar::{with_distillation_modes, TeacherGroup, TrainMode};
///
/// struct Model { training: bool }
/// impl TrainMode for Model {
///     fn is_training(&self) -> bool { self.training }
///     fn set_training(&mut self, training: bool) { self.training = training; }
/// }
///
/// let mut teachers = TeacherGroup::Single(Model { training: true });
/// let mut student = Model { training: false };
///
/// let loss = with_distillation_modes(&mut teachers, &mut student, |teachers, student| {
///     assert!(!matches!(teachers, TeacherGroup::Single(t) if t.is_training()));
///     assert!(student.is_training());
///     Ok(0.5f32)
/// }).unwrap();
///
/// assert_eq!(loss, 0.5);
/// // Original modes are back.
/// assert!(matches!(&teachers, TeacherGroup::Single(t) if t.is_training()));
/// assert!(!student.is_training());
/// ```
pub fn with_distillation_modes<T, S, R, F>(
    teachers: &mut TeacherGroup<T>,
    student: &mut S,
    body: F,
) -> Result<R>
where
    T: TrainMode,
    S: TrainMode + ?Sized,
    F: FnOnce(&mut TeacherGroup<T>, &mut S) -> Result<R>,
{
    let teacher_modes = teachers.snapshot();
    let student_was_training = student.is_training();
    let mut guard = ModeGuard {
        teachers,
        student,
        teacher_modes,
        student_was_training,
    };

    guard.teachers.set_all(false);
    guard.student.set_training(true);

    body(&mut *guard.teachers, &mut *guard.student)
}
