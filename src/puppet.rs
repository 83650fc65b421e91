use tracing::{debug, info};

use crate::artwork::ArtworkItem;
use crate::config::RigConfig;
use crate::error::Result;
use crate::observation::{FaceObservation, PoseFrame, PoseObservation};
use crate::skeleton::{RestPose, Skeleton};
use crate::skinning::{BindArtwork, EvaluatedCurve, SkinnedCurve};

/// A skeleton together with the artwork bound to it.
///
/// ```no_run
/// # use marionette::{Puppet, RestPose, RigConfig, ArtworkItem, PoseObservation};
/// # fn run(rest: RestPose, artwork: Vec<ArtworkItem>, frames: Vec<PoseObservation>) -> marionette::Result<()> {
/// let mut puppet = Puppet::new(&rest, RigConfig::default())?;
/// puppet.bind(&artwork)?;
/// for pose in &frames {
///     if puppet.update(pose, None) {
///         for curve in puppet.evaluate().iter().filter(|c| !c.suppressed) {
///             // draw curve
///         }
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Puppet {
    skeleton: Skeleton,
    curves: Vec<SkinnedCurve>,
    config: RigConfig,
}

impl Puppet {
    /// Builds the puppet's skeleton from rest positions. No artwork is bound yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the rest pose is incomplete or `config` is invalid.
    pub fn new(rest: &RestPose, config: RigConfig) -> Result<Self> {
        Ok(Self {
            skeleton: Skeleton::new(rest, config)?,
            curves: Vec::new(),
            config,
        })
    }

    /// Binds artwork, replacing any earlier binding.
    ///
    /// # Errors
    ///
    /// Returns a `BindError` for malformed curves. The previous binding is
    /// discarded either way, and a failed bind leaves no curves and no
    /// secondary bones behind.
    pub fn bind(&mut self, items: &[ArtworkItem]) -> Result<()> {
        self.curves.clear();
        self.curves = BindArtwork::new(items, self.config).execute(&mut self.skeleton)?;
        info!(curves = self.curves.len(), "puppet bound");
        Ok(())
    }

    /// Feeds one frame of detector output and re-poses the artwork.
    ///
    /// Returns whether the frame was valid. Invalid frames leave the artwork
    /// where the last valid frame put it.
    pub fn update(&mut self, pose: &PoseObservation, face: Option<&FaceObservation>) -> bool {
        if !self.skeleton.update(pose, face) {
            return false;
        }
        for curve in &mut self.curves {
            curve.deform(&self.skeleton);
        }
        true
    }

    /// Convenience for recorded clips.
    pub fn update_frame(&mut self, frame: &PoseFrame) -> bool {
        self.update(&frame.pose, frame.face.as_ref())
    }

    /// Returns every bound curve as of the last valid frame.
    ///
    /// Curves below the configured confidence are included but flagged
    /// `suppressed`.
    #[must_use]
    pub fn evaluate(&self) -> Vec<EvaluatedCurve> {
        let curves: Vec<_> = self
            .curves
            .iter()
            .map(|c| c.evaluate(self.config.min_curve_confidence))
            .collect();
        debug!(
            visible = curves.iter().filter(|c| !c.suppressed).count(),
            total = curves.len(),
            "evaluated"
        );
        curves
    }

    /// Forgets tracking state, e.g. between unrelated still images.
    pub fn reset(&mut self) {
        self.skeleton.reset();
    }

    #[must_use]
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    #[must_use]
    pub fn curves(&self) -> &[SkinnedCurve] {
        &self.curves
    }

    #[must_use]
    pub fn config(&self) -> &RigConfig {
        &self.config
    }
}
