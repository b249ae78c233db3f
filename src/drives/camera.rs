//! Camera follow

use crate::error::{Result, SimError};
use crate::geometry::{Point, Rect, Size};
use crate::sim::drive::{DrawContext, Drive};
use crate::sim::gameobj::GameObj;

/// Keeps the camera on the object without showing anything outside the
/// bound regions.
///
/// Only one camera drive should be active at a time.
#[derive(Debug, Clone)]
pub struct DCameraFollow {
    /// Where the camera center may go: each bound region shrunk by half a
    /// viewport on every side. Empty means anywhere.
    centers: Vec<Rect>,
    /// Fraction of the remaining distance covered per second; `None` snaps
    pub rate: Option<f64>,
}

impl DCameraFollow {
    /// Follow with no bounds
    pub fn free(rate: Option<f64>) -> Self {
        Self {
            centers: Vec::new(),
            rate,
        }
    }

    /// Follow within `bounds`. Fails if any region cannot hold the viewport.
    pub fn bounded(bounds: &[Rect], viewport: Size, rate: Option<f64>) -> Result<Self> {
        let mut centers = Vec::with_capacity(bounds.len());
        for bound in bounds {
            if !bound.size.fits(viewport) {
                log::error!("Camera bound {bound:?} is smaller than the {viewport:?} viewport");
                return Err(SimError::CameraBoundsTooSmall {
                    bounds: *bound,
                    viewport,
                });
            }
            centers.push(Rect::rotated(bound.cen, bound.size - viewport, bound.ang));
        }
        Ok(Self { centers, rate })
    }

    /// Where the camera should end up for an object at `pos`
    pub fn destination(&self, pos: Point) -> Point {
        self.centers
            .iter()
            .map(|r| r.nearest_pt_to(pos))
            .min_by(|a, b| a.dist_to(pos).total_cmp(&b.dist_to(pos)))
            .unwrap_or(pos)
    }
}

impl Drive for DCameraFollow {
    fn predraw(&mut self, obj: &mut GameObj, ctx: &mut DrawContext<'_>) {
        let dest = self.destination(obj.pos());
        ctx.camera.center = match self.rate {
            None => dest,
            Some(rate) => {
                let cur = ctx.camera.center;
                cur + (dest - cur) * (rate * ctx.frame_secs).min(1.0)
            }
        };
    }
}
