//! Hero entrance sequence

use std::time::Duration;

use tracing::debug;

use crate::config::EntranceConfig;
use crate::dom::Dom;
use crate::motion::{Animator, Position, Timeline, Tween, TweenFrom};
use crate::Result;

pub struct EntranceSequencer {
    config: EntranceConfig,
    played: bool,
}

impl EntranceSequencer {
    pub fn new(config: EntranceConfig) -> Self {
        Self {
            config,
            played: false,
        }
    }

    /// The overlapping fade/slide-in timeline for the configured steps
    pub fn timeline(&self) -> Result<Timeline> {
        let overlap: Position = self.config.position.parse()?;
        let timeline = self
            .config
            .steps
            .iter()
            .enumerate()
            .fold(Timeline::new(self.config.delay_secs), |timeline, (i, step)| {
                timeline.from(Tween {
                    target: step.selector.clone(),
                    from: TweenFrom {
                        y: step.y,
                        opacity: 0.0,
                    },
                    duration: self.config.duration_secs,
                    ease: self.config.ease,
                    position: if i == 0 { Position::Sequential } else { overlap },
                })
            });
        Ok(timeline)
    }

    /// Play once when motion is allowed and an animator is present.
    /// Returns whether the sequence started.
    pub fn run(
        &mut self,
        dom: &mut dyn Dom,
        animator: Option<&mut dyn Animator>,
        now: Duration,
    ) -> Result<bool> {
        if self.played || !self.config.enabled {
            return Ok(false);
        }
        if dom.prefers_reduced_motion() {
            debug!("Reduced motion requested, skipping entrance");
            return Ok(false);
        }
        let Some(animator) = animator else {
            debug!("No animation capability, skipping entrance");
            return Ok(false);
        };

        let timeline = self.timeline()?;
        animator.play(dom, &timeline, now);
        self.played = true;
        debug!(
            "Entrance playing {} tweens over {:.2}s",
            timeline.tweens.len(),
            timeline.total_duration()
        );
        Ok(true)
    }

    pub fn played(&self) -> bool {
        self.played
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::ElementSpec;
    use crate::dom::MemoryDom;
    use crate::motion::{EasingType, TweenAnimator};

    fn hero() -> MemoryDom {
        let mut dom = MemoryDom::new(1280.0, 800.0);
        let root = dom.root();
        for class in ["hero-badge", "hero-title", "hero-lead", "hero-cta"] {
            dom.append(root, ElementSpec::new("div").class(class)).unwrap();
        }
        dom
    }

    #[test]
    fn test_default_timeline_shape() {
        let timeline = EntranceSequencer::new(EntranceConfig::default())
            .timeline()
            .unwrap();
        assert_eq!(timeline.delay, 0.2);
        assert_eq!(timeline.tweens.len(), 4);
        assert_eq!(timeline.tweens[0].position, Position::Sequential);
        assert_eq!(timeline.tweens[1].position, Position::Offset(-0.8));
        assert_eq!(timeline.tweens[1].from.y, 50.0);
        assert!(timeline
            .tweens
            .iter()
            .all(|t| t.ease == EasingType::ExpoOut && t.from.opacity == 0.0));
    }

    #[test]
    fn test_runs_once_with_animator() {
        let mut dom = hero();
        let mut animator = TweenAnimator::new();
        let mut entrance = EntranceSequencer::new(EntranceConfig::default());

        assert!(entrance.run(&mut dom, Some(&mut animator), Duration::ZERO).unwrap());
        assert!(!entrance.run(&mut dom, Some(&mut animator), Duration::ZERO).unwrap());
        assert_eq!(animator.played(), 1);
        assert!(entrance.played());
    }

    #[test]
    fn test_reduced_motion_never_runs() {
        let mut dom = hero();
        dom.set_reduced_motion(true);
        let mut animator = TweenAnimator::new();
        let mut entrance = EntranceSequencer::new(EntranceConfig::default());

        assert!(!entrance.run(&mut dom, Some(&mut animator), Duration::ZERO).unwrap());
        assert_eq!(animator.played(), 0);
        let badge = dom.query(".hero-badge").unwrap().unwrap();
        assert!(dom.style(badge, "opacity").is_none());
    }

    #[test]
    fn test_missing_animator_is_a_noop() {
        let mut dom = hero();
        let mut entrance = EntranceSequencer::new(EntranceConfig::default());
        assert!(!entrance.run(&mut dom, None, Duration::ZERO).unwrap());
        assert!(!entrance.played());
    }

    #[test]
    fn test_bad_position_is_an_error() {
        let config = EntranceConfig {
            position: "soon".to_string(),
            ..Default::default()
        };
        let mut dom = hero();
        let mut animator = TweenAnimator::new();
        let mut entrance = EntranceSequencer::new(config);
        assert!(entrance.run(&mut dom, Some(&mut animator), Duration::ZERO).is_err());
    }
}
