//! Contact notifier: decide which instrument a first contact rings
//!
//! Classification is pure; the notifier only produces `SoundIntent`s and
//! leaves playing them to whoever holds the audio conductor.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::physics::Contact;
use crate::audio::Conductor;
use crate::category;

/// Which preset voice a contact triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    /// Tree against anything but the ball/snow field category
    Bells,
    /// Tree against the ball (or the snow field)
    MetalBar,
}

impl SoundCue {
    pub fn amplitude(&self) -> f32 {
        match self {
            SoundCue::Bells => 0.025,
            SoundCue::MetalBar => 0.05,
        }
    }

    /// The conductor's secondary voice is the metal bar
    pub fn uses_secondary_voice(&self) -> bool {
        matches!(self, SoundCue::MetalBar)
    }

    /// Scale the cue draws its pitch from (Hz)
    fn scale(&self) -> &'static [f32] {
        match self {
            // C major pentatonic, two octaves up from C5
            SoundCue::Bells => &[
                523.25, 587.33, 659.25, 783.99, 880.0, 1046.5, 1174.66, 1318.51,
            ],
            // Same scale an octave lower
            SoundCue::MetalBar => &[
                261.63, 293.66, 329.63, 392.0, 440.0, 523.25, 587.33, 659.25,
            ],
        }
    }
}

/// Classify an unordered pair of contact categories.
/// Untagged bodies never make a sound.
pub fn classify(a: Option<u32>, b: Option<u32>) -> Option<SoundCue> {
    let (a, b) = (a?, b?);
    match (a, b) {
        (category::TREE, category::BALL) | (category::BALL, category::TREE) => {
            Some(SoundCue::MetalBar)
        }
        (category::TREE, _) | (_, category::TREE) => Some(SoundCue::Bells),
        _ => None,
    }
}

/// A request to play one note
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoundIntent {
    pub cue: SoundCue,
    pub frequency: f32,
    pub amplitude: f32,
}

/// Turns begin-contact events into sound intents
#[derive(Debug, Clone)]
pub struct ContactNotifier {
    rng: Pcg32,
}

impl ContactNotifier {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn notify(&mut self, contact: &Contact) -> Option<SoundIntent> {
        let cue = classify(contact.category_a, contact.category_b)?;
        let scale = cue.scale();
        let frequency = scale[self.rng.random_range(0..scale.len())];
        log::debug!(
            "{:?} for contact {:?}/{:?} at {} (impulse {:.3})",
            cue,
            contact.a,
            contact.b,
            contact.point,
            contact.impulse
        );
        Some(SoundIntent {
            cue,
            frequency,
            amplitude: cue.amplitude(),
        })
    }
}

/// Play every intent on the injected conductor
pub fn dispatch(intents: impl IntoIterator<Item = SoundIntent>, conductor: &mut Conductor) {
    for intent in intents {
        conductor.play(
            intent.frequency,
            intent.amplitude,
            intent.cue.uses_secondary_voice(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{Instrument, Note, NoteSink};
    use crate::sim::physics::BodyHandle;
    use glam::Vec3;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn contact(a: Option<u32>, b: Option<u32>) -> Contact {
        Contact {
            a: BodyHandle(1),
            b: BodyHandle(2),
            category_a: a,
            category_b: b,
            point: Vec3::ZERO,
            impulse: 1.0,
        }
    }

    #[test]
    fn test_decision_table() {
        let tags = [None, Some(1), Some(2)];
        let expect = |a: Option<u32>, b: Option<u32>| match (a, b) {
            (Some(1), Some(2)) | (Some(2), Some(1)) => Some(SoundCue::MetalBar),
            (Some(1), Some(1)) => Some(SoundCue::Bells),
            _ => None,
        };
        for a in tags {
            for b in tags {
                assert_eq!(classify(a, b), expect(a, b), "pair {a:?}/{b:?}");
            }
        }
    }

    #[test]
    fn test_tree_against_other_tag_rings_bells() {
        assert_eq!(classify(Some(1), Some(7)), Some(SoundCue::Bells));
        assert_eq!(classify(Some(7), Some(1)), Some(SoundCue::Bells));
        assert_eq!(classify(Some(7), Some(2)), None);
    }

    #[test]
    fn test_amplitudes() {
        let mut notifier = ContactNotifier::new(1);
        let bells = notifier.notify(&contact(Some(1), Some(1))).unwrap();
        assert_eq!(bells.amplitude, 0.025);
        let bar = notifier.notify(&contact(Some(2), Some(1))).unwrap();
        assert_eq!(bar.amplitude, 0.05);
        assert!(notifier.notify(&contact(None, Some(1))).is_none());
    }

    #[test]
    fn test_frequencies_deterministic_per_seed() {
        let mut a = ContactNotifier::new(42);
        let mut b = ContactNotifier::new(42);
        for _ in 0..16 {
            let c = contact(Some(1), Some(2));
            assert_eq!(a.notify(&c), b.notify(&c));
        }
    }

    #[derive(Default)]
    struct Recorder(Rc<RefCell<Vec<(String, Note)>>>);

    impl NoteSink for Recorder {
        fn play(&mut self, instrument: &Instrument, note: Note) {
            self.0.borrow_mut().push((instrument.name.clone(), note));
        }
    }

    #[test]
    fn test_dispatch_selects_voice() {
        let played = Rc::new(RefCell::new(Vec::new()));
        let mut conductor = Conductor::new(Box::new(Recorder(played.clone())));
        let mut notifier = ContactNotifier::new(3);
        let intents = [
            notifier.notify(&contact(Some(1), Some(1))),
            notifier.notify(&contact(Some(1), Some(2))),
        ];

        dispatch(intents.into_iter().flatten(), &mut conductor);

        let played = played.borrow();
        assert_eq!(played.len(), 2);
        assert_eq!(played[0].0, "bells");
        assert_eq!(played[1].0, "metal bar");
        assert_eq!(played[1].1.duration, 1.0);
    }

    proptest! {
        #[test]
        fn prop_classify_is_symmetric(
            a in proptest::option::of(0u32..4),
            b in proptest::option::of(0u32..4),
        ) {
            prop_assert_eq!(classify(a, b), classify(b, a));
        }
    }
}
