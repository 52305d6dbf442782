//! Region synchronization engine
//!
//! Keeps the overlay for one staged step in line with the document. Removal
//! regions live in a region set on the surface; insertion placeholders are
//! floating zones. Transitions never get cancelled, so every callback first
//! checks that what it animates still exists: regions through
//! [`TextSurface::has_region`], zones through their [`ZoneHandle`] phase.

use crate::marker::{Marker, MarkerSet};
use crate::patch::{Direction, Hunk};
use crate::remap::{LineEdit, LineRange};
use crate::surface::{OverlayConfig, Region, RegionId, RegionSetId, TextSurface, ZoneId, ZoneSpec};
use crate::transition::{Scheduler, Tick};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZonePhase {
    Growing,
    Shrinking,
    Disposed,
}

/// Shared between the engine and the transition driving a zone
#[derive(Debug)]
struct ZoneHandle {
    id: ZoneId,
    phase: Cell<ZonePhase>,
    height: Cell<f32>,
}

impl ZoneHandle {
    fn new(id: ZoneId, phase: ZonePhase, height: f32) -> Rc<Self> {
        Rc::new(Self {
            id,
            phase: Cell::new(phase),
            height: Cell::new(height),
        })
    }

    fn is_in(&self, phase: ZonePhase) -> bool {
        self.phase.get() == phase
    }

    fn relayout<S: TextSurface>(&self, surface: &mut S, height: f32) {
        self.height.set(height);
        surface.relayout_zone(self.id, height);
    }

    fn dispose<S: TextSurface>(&self, surface: &mut S) {
        if !self.is_in(ZonePhase::Disposed) {
            surface.destroy_zone(self.id);
            self.phase.set(ZonePhase::Disposed);
        }
    }
}

/// State the transition callbacks work on
struct Overlay<S> {
    surface: S,
    /// Zones no longer owned by a staged step but still animating out
    transient: Vec<Rc<ZoneHandle>>,
}

struct Staged {
    markers: MarkerSet,
    regions: Vec<(RegionId, Marker)>,
    zones: Vec<(Rc<ZoneHandle>, Marker)>,
}

pub struct RegionSync<S: TextSurface> {
    overlay: Overlay<S>,
    scheduler: Scheduler<Overlay<S>>,
    config: OverlayConfig,
    staged_set: RegionSetId,
    fading_set: RegionSetId,
    staged: Option<Staged>,
}

impl<S: TextSurface + 'static> RegionSync<S> {
    pub fn new(mut surface: S, config: OverlayConfig) -> Self {
        let staged_set = surface.create_region_set();
        let fading_set = surface.create_region_set();
        Self {
            overlay: Overlay {
                surface,
                transient: Vec::new(),
            },
            scheduler: Scheduler::new(),
            config,
            staged_set,
            fading_set,
            staged: None,
        }
    }

    pub fn surface(&self) -> &S {
        &self.overlay.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.overlay.surface
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn is_staged(&self) -> bool {
        self.staged.is_some()
    }

    pub fn staged_direction(&self) -> Option<Direction> {
        self.staged.as_ref().map(|staged| staged.markers.direction)
    }

    pub fn staged_markers(&self) -> Option<&MarkerSet> {
        self.staged.as_ref().map(|staged| &staged.markers)
    }

    /// Regions still fading out after a commit or discard
    pub fn fading_regions(&self) -> Vec<(RegionId, Region)> {
        self.overlay.surface.regions(self.fading_set)
    }

    pub fn is_animating(&self) -> bool {
        !self.scheduler.is_idle()
    }

    /// Advance every running transition to `now`
    pub fn tick(&mut self, now: Instant) {
        self.scheduler.tick(now, &mut self.overlay);
        self.overlay
            .transient
            .retain(|zone| !zone.is_in(ZonePhase::Disposed));
    }

    /// Show `hunks` as a preview: regions fade in, placeholders grow in.
    pub fn stage(&mut self, hunks: &[Hunk], direction: Direction, now: Instant) {
        self.discard(now);

        let markers = MarkerSet::from_hunks(hunks, direction);
        self.drop_fading_under(&markers);

        let mut regions = Vec::new();
        for marker in markers.regions() {
            let region = Region {
                lines: marker.lines(),
                class: marker.class,
                opacity: 0.0,
            };
            let id = self
                .overlay
                .surface
                .add_region(self.staged_set, region, &self.config);
            regions.push((id, marker.clone()));
        }

        let mut zones = Vec::new();
        for marker in markers.placeholders() {
            let spec = ZoneSpec {
                after_line: marker.anchor,
                height: 0.0,
                text: marker.display_text().to_string(),
                class: marker.class,
            };
            let id = self.overlay.surface.create_zone(spec, &self.config);
            zones.push((ZoneHandle::new(id, ZonePhase::Growing, 0.0), marker.clone()));
        }

        log::debug!(
            "staged {:?} step: {} regions, {} placeholders",
            direction,
            regions.len(),
            zones.len()
        );

        self.fade_in(now, regions.iter().map(|(id, _)| *id).collect());
        self.grow(
            now,
            zones
                .iter()
                .map(|(zone, marker)| (Rc::clone(zone), marker.height as f32))
                .collect(),
        );

        self.staged = Some(Staged {
            markers,
            regions,
            zones,
        });
    }

    /// Animate the staged preview away without touching the document
    pub fn discard(&mut self, now: Instant) {
        let Some(staged) = self.staged.take() else {
            return;
        };

        let mut fading = Vec::new();
        for (id, _) in &staged.regions {
            if let Some(region) = self.overlay.surface.region(*id) {
                let from = region.opacity;
                let moved = self
                    .overlay
                    .surface
                    .add_region(self.fading_set, region, &self.config);
                fading.push((moved, from));
            }
        }
        self.overlay.surface.clear_regions(self.staged_set);

        let mut shrinking = Vec::new();
        for (zone, _) in staged.zones {
            zone.phase.set(ZonePhase::Shrinking);
            shrinking.push((Rc::clone(&zone), zone.height.get()));
            self.overlay.transient.push(zone);
        }

        log::debug!(
            "discarded {:?} step: {} regions, {} placeholders",
            staged.markers.direction,
            fading.len(),
            shrinking.len()
        );

        self.fade_out(now, fading);
        self.shrink(now, shrinking);
    }

    /// Write the staged step into the document as one edit batch.
    ///
    /// Panics when nothing is staged.
    pub fn commit(&mut self, now: Instant) {
        let Some(staged) = self.staged.take() else {
            panic!("commit called with no staged step");
        };
        let surface = &mut self.overlay.surface;

        let mut edits = Vec::new();
        let mut quarantined = Vec::new();

        for (id, marker) in &staged.regions {
            let span = surface
                .region(*id)
                .map(|region| region.lines)
                .unwrap_or_else(|| marker.lines());
            let text = surface.text_in_range(span);
            edits.push(LineEdit::delete(span));
            quarantined.push(Marker::region(span.start, text, marker.class));
        }

        for (zone, marker) in &staged.zones {
            let mut text = surface
                .zone_text(zone.id)
                .unwrap_or_else(|| marker.display_text().to_string());
            if marker.is_terminated() {
                text.push('\n');
            }
            edits.push(LineEdit::insert(marker.anchor + 1, text.clone()));
            quarantined.push(Marker::placeholder(marker.anchor, text, marker.class));
            zone.dispose(surface);
        }

        surface.clear_regions(self.staged_set);
        surface.apply_edits(&edits);
        surface.reset_undo_history();

        let ghosts = MarkerSet::new(staged.markers.direction, quarantined)
            .swap_direction()
            .relocate(&edits);

        log::debug!(
            "committed {:?} step: {} edits, document now {} lines",
            staged.markers.direction,
            edits.len(),
            surface.line_count()
        );

        self.show_ghosts(&ghosts, now);
    }

    /// Replace the document, dropping every marker
    pub fn set_contents(&mut self, text: &str) {
        if let Some(staged) = self.staged.take() {
            for (zone, _) in &staged.zones {
                zone.dispose(&mut self.overlay.surface);
            }
        }
        for zone in self.overlay.transient.drain(..) {
            zone.dispose(&mut self.overlay.surface);
        }
        self.overlay.surface.clear_regions(self.staged_set);
        self.overlay.surface.clear_regions(self.fading_set);
        self.overlay.surface.set_full_text(text);
    }

    /// Briefly show what a commit changed: new text fades, removed text shrinks.
    fn show_ghosts(&mut self, ghosts: &MarkerSet, now: Instant) {
        let mut fading = Vec::new();
        for marker in ghosts.regions() {
            let region = Region {
                lines: marker.lines(),
                class: marker.class,
                opacity: 1.0,
            };
            let id = self
                .overlay
                .surface
                .add_region(self.fading_set, region, &self.config);
            fading.push((id, 1.0));
        }

        let mut shrinking = Vec::new();
        for marker in ghosts.placeholders() {
            let height = marker.height as f32;
            let spec = ZoneSpec {
                after_line: marker.anchor,
                height,
                text: marker.display_text().to_string(),
                class: marker.class,
            };
            let id = self.overlay.surface.create_zone(spec, &self.config);
            let zone = ZoneHandle::new(id, ZonePhase::Shrinking, height);
            shrinking.push((Rc::clone(&zone), height));
            self.overlay.transient.push(zone);
        }

        self.fade_out(now, fading);
        self.shrink(now, shrinking);
    }

    fn drop_fading_under(&mut self, markers: &MarkerSet) {
        let incoming: Vec<LineRange> = markers.regions().map(Marker::lines).collect();
        for (id, region) in self.overlay.surface.regions(self.fading_set) {
            if incoming.iter().any(|lines| lines.intersects(&region.lines)) {
                self.overlay.surface.remove_region(id);
            }
        }
    }

    fn animate<F>(&mut self, now: Instant, callback: F)
    where
        F: FnMut(Tick, &mut Overlay<S>) + 'static,
    {
        self.scheduler.transition(
            &mut self.overlay,
            now,
            self.config.frames_per_second,
            self.config.transition,
            callback,
        );
    }

    fn fade_in(&mut self, now: Instant, ids: Vec<RegionId>) {
        if ids.is_empty() {
            return;
        }
        self.animate(now, move |tick, overlay| {
            for id in &ids {
                if overlay.surface.has_region(*id) {
                    overlay.surface.set_region_opacity(*id, tick.eased());
                }
            }
        });
    }

    fn fade_out(&mut self, now: Instant, regions: Vec<(RegionId, f32)>) {
        if regions.is_empty() {
            return;
        }
        self.animate(now, move |tick, overlay| {
            for (id, from) in &regions {
                if !overlay.surface.has_region(*id) {
                    continue;
                }
                if tick.is_last() {
                    overlay.surface.remove_region(*id);
                } else {
                    overlay
                        .surface
                        .set_region_opacity(*id, from * (1.0 - tick.eased()));
                }
            }
        });
    }

    fn grow(&mut self, now: Instant, zones: Vec<(Rc<ZoneHandle>, f32)>) {
        if zones.is_empty() {
            return;
        }
        self.animate(now, move |tick, overlay| {
            for (zone, full) in &zones {
                if zone.is_in(ZonePhase::Growing) {
                    zone.relayout(&mut overlay.surface, full * tick.eased());
                }
            }
        });
    }

    fn shrink(&mut self, now: Instant, zones: Vec<(Rc<ZoneHandle>, f32)>) {
        if zones.is_empty() {
            return;
        }
        self.animate(now, move |tick, overlay| {
            for (zone, from) in &zones {
                if !zone.is_in(ZonePhase::Shrinking) {
                    continue;
                }
                if tick.is_last() {
                    zone.dispose(&mut overlay.surface);
                } else {
                    zone.relayout(&mut overlay.surface, from * (1.0 - tick.eased()));
                }
            }
        });
    }
}
