//! In-flight tracking per effect kind.

use std::collections::HashMap;

use crate::tasks::EffectKind;

/// Counts outstanding effects per kind.
///
/// A counter rather than a boolean, so two overlapping fetches of the same
/// kind keep the flag raised until both have answered.
#[derive(Debug, Default, Clone)]
pub struct LoadingFlags {
    in_flight: HashMap<EffectKind, usize>,
}

impl LoadingFlags {
    /// Mark an effect of `kind` as issued.
    pub fn begin(&mut self, kind: EffectKind) {
        *self.in_flight.entry(kind).or_insert(0) += 1;
    }

    /// Mark a result (success or failure) of `kind` as applied.
    pub fn finish(&mut self, kind: EffectKind) {
        if let Some(count) = self.in_flight.get_mut(&kind) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.in_flight.remove(&kind);
            }
        }
    }

    pub fn is_loading(&self, kind: EffectKind) -> bool {
        self.in_flight.contains_key(&kind)
    }

    pub fn any(&self) -> bool {
        !self.in_flight.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_and_finish() {
        let mut flags = LoadingFlags::default();
        assert!(!flags.any());

        flags.begin(EffectKind::Detail);
        assert!(flags.is_loading(EffectKind::Detail));
        assert!(!flags.is_loading(EffectKind::Issues));

        flags.finish(EffectKind::Detail);
        assert!(!flags.is_loading(EffectKind::Detail));
        assert!(!flags.any());
    }

    #[test]
    fn test_overlapping_effects_keep_flag_raised() {
        let mut flags = LoadingFlags::default();
        flags.begin(EffectKind::Issues);
        flags.begin(EffectKind::Issues);

        flags.finish(EffectKind::Issues);
        assert!(flags.is_loading(EffectKind::Issues));

        flags.finish(EffectKind::Issues);
        assert!(!flags.is_loading(EffectKind::Issues));
    }

    #[test]
    fn test_unmatched_finish_is_harmless() {
        let mut flags = LoadingFlags::default();
        flags.finish(EffectKind::Users);
        assert!(!flags.any());
    }
}
